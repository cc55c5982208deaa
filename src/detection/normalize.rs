/// Normalizes an identity field for exact-equality comparison: Unicode
/// lowercasing plus whitespace collapse. OCR output for the same printed
/// value routinely differs in case and spacing; nothing fuzzier than this is
/// applied.
pub fn normalize_field(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compares two optional fields after normalization. Returns None when either
/// side is absent (the comparison cannot be evaluated).
pub fn normalized_eq(a: Option<&str>, b: Option<&str>) -> Option<bool> {
    match (a, b) {
        (Some(a), Some(b)) => Some(normalize_field(a) == normalize_field(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_interior_whitespace() {
        assert_eq!(normalize_field("Ramesh   Kumar "), "ramesh kumar");
        assert_eq!(normalize_field("\tRamesh\nKumar"), "ramesh kumar");
    }

    #[test]
    fn case_folds_latin_and_passes_devanagari_through() {
        assert_eq!(normalize_field("RAMESH Kumar"), "ramesh kumar");
        assert_eq!(normalize_field("रमेश कुमार"), "रमेश कुमार");
    }

    #[test]
    fn optional_comparison_requires_both_sides() {
        assert_eq!(normalized_eq(Some("A  B"), Some("a b")), Some(true));
        assert_eq!(normalized_eq(Some("a"), Some("b")), Some(false));
        assert_eq!(normalized_eq(Some("a"), None), None);
        assert_eq!(normalized_eq(None, None), None);
    }
}
