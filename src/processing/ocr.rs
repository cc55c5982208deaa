use crate::utils::RollScanError;
use log::warn;
use std::io::Write;
use tempfile::Builder;
use tesseract::Tesseract;

/// Narrow OCR capability: one card's text panel in, recognized text out.
/// The pipeline only ever talks to this trait, so the engine can be swapped
/// for a hosted vision API or a test double without touching the extractor.
pub trait OcrEngine {
    fn recognize(&self, png_bytes: &[u8]) -> Result<String, RollScanError>;
}

/// Tesseract-backed engine. Electoral rolls in scope are printed in Hindi
/// with occasional English headers, so the default language pack is both.
pub struct TesseractOcr {
    languages: String,
}

impl TesseractOcr {
    pub fn new(languages: impl Into<String>) -> Self {
        TesseractOcr {
            languages: languages.into(),
        }
    }

    pub fn hindi_english() -> Self {
        Self::new("hin+eng")
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, png_bytes: &[u8]) -> Result<String, RollScanError> {
        // Tesseract wants a file path, so stage the panel in a temp file.
        let mut temp_file = Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|e| RollScanError::Ocr(format!("Failed to create temp file: {}", e)))?;

        temp_file
            .write_all(png_bytes)
            .map_err(|e| RollScanError::Ocr(format!("Failed to write to temp file: {}", e)))?;

        let image_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| RollScanError::Ocr("Failed to convert path to string".to_string()))?;

        let mut tess = Tesseract::new(None, Some(&self.languages))
            .map_err(|e| RollScanError::Ocr(format!("Tesseract init error: {}", e)))?
            .set_image(image_path)
            .map_err(|e| RollScanError::Ocr(format!("Tesseract set image error: {}", e)))?;

        tess.get_text()
            .map_err(|e| RollScanError::Ocr(format!("Tesseract error: {}", e)))
    }
}

/// Sanity check on recognized text: the rolls in scope are Hindi/English, so
/// text that reliably detects as another language usually means the wrong
/// panel was cropped or the language packs are misconfigured.
pub fn warn_on_unexpected_language(card_id: &str, text: &str) {
    if text.trim().len() < 20 {
        return;
    }
    if let Some(info) = whatlang::detect(text) {
        if info.is_reliable() && !matches!(info.lang(), whatlang::Lang::Hin | whatlang::Lang::Eng) {
            warn!(
                "{}: OCR text detected as {:?}, expected Hindi or English",
                card_id,
                info.lang()
            );
        }
    }
}
