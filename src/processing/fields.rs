use crate::models::Gender;
use lazy_static::lazy_static;
use regex::Regex;

/// Structured fields parsed from one card's OCR text. Absent fields stay
/// `None`; the detector degrades instead of failing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFields {
    pub name: Option<String>,
    pub father_husband_name: Option<String>,
    pub house_number: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
}

lazy_static! {
    // Hindi labels as they come out of OCR, including the common confusions
    // (निर्बाचक for निर्वाचक, प्रति/पत्ति for पिता/पति, मंख्या for संख्या).
    static ref NAME_LABEL: Regex = Regex::new(r"निर्[वब]ाचक.*नाम").unwrap();
    static ref FATHER_LABEL: Regex = Regex::new(r"(पिता|प्रति|पत्ति|पति).*नाम").unwrap();
    static ref HOUSE_LABEL: Regex = Regex::new(r"(मकान|ग्रकान).*(संख्या|मंख्या)").unwrap();
    static ref AGE_LABEL: Regex = Regex::new(r"(उम्र|उप्र)").unwrap();
    static ref GENDER_LABEL: Regex = Regex::new(r"लिंग").unwrap();

    static ref VALUE_AFTER_NAAM: Regex = Regex::new(r"नाम\s*[:;!]\s*(.+)").unwrap();
    static ref HOUSE_VALUE: Regex = Regex::new(r"[:;!*]\s*([०-९0-9]+)").unwrap();
    static ref ANY_DIGITS: Regex = Regex::new(r"([०-९0-9]+)").unwrap();
    static ref AGE_VALUE: Regex = Regex::new(r"[:;]\s*([०-९0-9]{2,3})").unwrap();
    static ref FEMALE_MARK: Regex = Regex::new(r"महिला|लिंग\s*[:;]\s*म").unwrap();
    static ref MALE_MARK: Regex = Regex::new(r"पुरुष|लिंग\s*[:;]\s*पु").unwrap();

    // Guards against a label line's value bleeding into the wrong field.
    static ref NOT_A_NAME: Regex = Regex::new(r"पिता|पति|मकान|उम्र").unwrap();
    static ref NOT_A_FATHER: Regex = Regex::new(r"मकान|उम्र").unwrap();

    // English label fallbacks for English-language rolls.
    static ref EN_NAME: Regex =
        Regex::new(r"(?i)^\s*(?:elector'?s?\s+|voter'?s?\s+)?name\s*[:;]\s*(.+)").unwrap();
    static ref EN_FATHER: Regex =
        Regex::new(r"(?i)(?:father|husband)'?s?\s+name\s*[:;]\s*(.+)").unwrap();
    static ref EN_HOUSE: Regex =
        Regex::new(r"(?i)house\s+(?:number|no\.?)\s*[:;]?\s*([0-9]+)").unwrap();
    static ref EN_AGE: Regex = Regex::new(r"(?i)\bage\s*[:;]\s*([0-9]{1,3})").unwrap();
    static ref EN_GENDER: Regex =
        Regex::new(r"(?i)\b(?:gender|sex)\s*[:;]\s*(male|female|m|f)\b").unwrap();
}

const MIN_AGE: u32 = 18;
const MAX_AGE: u32 = 120;

/// Pulls the five card fields out of free-form OCR text. Labels vary with
/// OCR quality, and values sometimes land on the line after their label, so
/// parsing is line-oriented with a one-line lookahead.
pub struct FieldParser;

impl FieldParser {
    pub fn parse(text: &str) -> ParsedFields {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let mut fields = ParsedFields::default();

        for (i, line) in lines.iter().enumerate() {
            let next = lines.get(i + 1).copied();

            if fields.name.is_none() {
                fields.name = Self::parse_name(line, next);
            }
            if fields.father_husband_name.is_none() {
                fields.father_husband_name = Self::parse_father(line, next);
            }
            if fields.house_number.is_none() {
                fields.house_number = Self::parse_house(line, next);
            }
            if fields.age.is_none() {
                fields.age = Self::parse_age(line);
            }
            if fields.gender.is_none() {
                fields.gender = Self::parse_gender(line);
            }
        }

        fields
    }

    fn parse_name(line: &str, next: Option<&str>) -> Option<String> {
        if NAME_LABEL.is_match(line) {
            if let Some(captures) = VALUE_AFTER_NAAM.captures(line) {
                let value = captures[1].trim();
                if value.chars().count() > 2 && !NOT_A_NAME.is_match(value) {
                    return Some(value.to_string());
                }
            } else if let Some(next) = next {
                if !NOT_A_NAME.is_match(next) {
                    return Some(next.to_string());
                }
            }
            return None;
        }
        if let Some(captures) = EN_NAME.captures(line) {
            let value = captures[1].trim();
            if value.chars().count() > 2 {
                return Some(value.to_string());
            }
        }
        None
    }

    fn parse_father(line: &str, next: Option<&str>) -> Option<String> {
        // English first: "Father's Name" would otherwise be eaten by the
        // generic Hindi "value after नाम" capture on mixed-language cards.
        if let Some(captures) = EN_FATHER.captures(line) {
            let value = captures[1].trim();
            if value.chars().count() > 2 {
                return Some(value.to_string());
            }
            return None;
        }
        if FATHER_LABEL.is_match(line) {
            if let Some(captures) = VALUE_AFTER_NAAM.captures(line) {
                let value = captures[1].trim();
                if value.chars().count() > 2 && !NOT_A_FATHER.is_match(value) {
                    return Some(value.to_string());
                }
            } else if let Some(next) = next {
                if !NOT_A_FATHER.is_match(next) {
                    return Some(next.to_string());
                }
            }
        }
        None
    }

    fn parse_house(line: &str, next: Option<&str>) -> Option<String> {
        if HOUSE_LABEL.is_match(line) {
            if let Some(captures) = HOUSE_VALUE.captures(line) {
                return Some(to_arabic_digits(&captures[1]));
            }
            if let Some(next) = next {
                if let Some(captures) = ANY_DIGITS.captures(next) {
                    return Some(to_arabic_digits(&captures[1]));
                }
            }
            return None;
        }
        EN_HOUSE
            .captures(line)
            .map(|captures| captures[1].to_string())
    }

    fn parse_age(line: &str) -> Option<u32> {
        let raw = if AGE_LABEL.is_match(line) {
            AGE_VALUE.captures(line).map(|c| to_arabic_digits(&c[1]))
        } else {
            EN_AGE.captures(line).map(|c| c[1].to_string())
        }?;
        let age: u32 = raw.parse().ok()?;
        (MIN_AGE..=MAX_AGE).contains(&age).then_some(age)
    }

    fn parse_gender(line: &str) -> Option<Gender> {
        if GENDER_LABEL.is_match(line) {
            if FEMALE_MARK.is_match(line) {
                return Some(Gender::Female);
            }
            if MALE_MARK.is_match(line) {
                return Some(Gender::Male);
            }
            return None;
        }
        EN_GENDER.captures(line).and_then(|captures| {
            match captures[1].to_lowercase().as_str() {
                "f" | "female" => Some(Gender::Female),
                "m" | "male" => Some(Gender::Male),
                _ => None,
            }
        })
    }
}

/// Converts Devanagari numerals to their Arabic counterparts.
pub fn to_arabic_digits(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '०' => '0',
            '१' => '1',
            '२' => '2',
            '३' => '3',
            '४' => '4',
            '५' => '5',
            '६' => '6',
            '७' => '7',
            '८' => '8',
            '९' => '9',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hindi_card_with_inline_values() {
        let text = "निर्वाचक का नाम : रमेश कुमार\n\
                    पिता का नाम : सुरेश कुमार\n\
                    मकान संख्या : १२३\n\
                    उम्र : ३५ लिंग : पुरुष";
        let fields = FieldParser::parse(text);
        assert_eq!(fields.name.as_deref(), Some("रमेश कुमार"));
        assert_eq!(fields.father_husband_name.as_deref(), Some("सुरेश कुमार"));
        assert_eq!(fields.house_number.as_deref(), Some("123"));
        assert_eq!(fields.age, Some(35));
        assert_eq!(fields.gender, Some(Gender::Male));
    }

    #[test]
    fn parses_values_on_the_following_line() {
        let text = "निर्वाचक का नाम\n\
                    सीता देवी\n\
                    पति का नाम\n\
                    राम प्रसाद\n\
                    मकान संख्या\n\
                    ४५\n\
                    उम्र : ४२ लिंग : महिला";
        let fields = FieldParser::parse(text);
        assert_eq!(fields.name.as_deref(), Some("सीता देवी"));
        assert_eq!(fields.father_husband_name.as_deref(), Some("राम प्रसाद"));
        assert_eq!(fields.house_number.as_deref(), Some("45"));
        assert_eq!(fields.age, Some(42));
        assert_eq!(fields.gender, Some(Gender::Female));
    }

    #[test]
    fn tolerates_common_ocr_label_confusions() {
        let text = "निर्बाचक का नाम ; मोहन लाल\n\
                    प्रति का नाम : हरी राम\n\
                    ग्रकान मंख्या : ७";
        let fields = FieldParser::parse(text);
        assert_eq!(fields.name.as_deref(), Some("मोहन लाल"));
        assert_eq!(fields.father_husband_name.as_deref(), Some("हरी राम"));
        assert_eq!(fields.house_number.as_deref(), Some("7"));
    }

    #[test]
    fn parses_english_card() {
        let text = "Elector's Name: Ramesh Kumar\n\
                    Father's Name: Suresh Kumar\n\
                    House Number: 123\n\
                    Age: 35 Gender: Male";
        let fields = FieldParser::parse(text);
        assert_eq!(fields.name.as_deref(), Some("Ramesh Kumar"));
        assert_eq!(fields.father_husband_name.as_deref(), Some("Suresh Kumar"));
        assert_eq!(fields.house_number.as_deref(), Some("123"));
        assert_eq!(fields.age, Some(35));
        assert_eq!(fields.gender, Some(Gender::Male));
    }

    #[test]
    fn implausible_ages_are_discarded() {
        assert_eq!(FieldParser::parse("उम्र : १५").age, None);
        assert_eq!(FieldParser::parse("Age: 150").age, None);
        assert_eq!(FieldParser::parse("उम्र : ९९").age, Some(99));
    }

    #[test]
    fn a_label_with_a_bleeding_value_is_rejected() {
        // OCR merged two label lines; the "name" value contains the father
        // label and must not be taken.
        let fields = FieldParser::parse("निर्वाचक का नाम : पिता का नाम");
        assert_eq!(fields.name, None);
    }

    #[test]
    fn empty_text_parses_to_all_absent() {
        assert_eq!(FieldParser::parse(""), ParsedFields::default());
        assert_eq!(FieldParser::parse("\n \n"), ParsedFields::default());
    }

    #[test]
    fn devanagari_digits_convert() {
        assert_eq!(to_arabic_digits("१२३४५६७८९०"), "1234567890");
        assert_eq!(to_arabic_digits("12a"), "12a");
    }
}
