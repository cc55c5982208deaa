use crate::models::VoterRecord;
use crate::processing::face::FaceEncoder;
use crate::processing::fields::FieldParser;
use crate::processing::ocr::{warn_on_unexpected_language, OcrEngine};
use crate::utils::RollScanError;
use image::RgbImage;
use log::{debug, warn};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Fraction of the card width holding the printed field text; the photo
/// panel occupies the rest.
const TEXT_PANEL_FRACTION: f32 = 0.6;

/// Turns one segmented card image into a `VoterRecord` by composing the OCR
/// and face-encoding capabilities. Extraction never aborts the batch: a card
/// that defeats OCR or face encoding yields a record with absent fields.
pub struct CardExtractor {
    ocr: Box<dyn OcrEngine>,
    faces: Box<dyn FaceEncoder>,
    photos_dir: PathBuf,
}

impl CardExtractor {
    pub fn new(
        ocr: Box<dyn OcrEngine>,
        faces: Box<dyn FaceEncoder>,
        photos_dir: &Path,
    ) -> Result<Self, RollScanError> {
        std::fs::create_dir_all(photos_dir)?;
        Ok(CardExtractor {
            ocr,
            faces,
            photos_dir: photos_dir.to_path_buf(),
        })
    }

    pub fn extract(&self, card_id: &str, card: &RgbImage) -> VoterRecord {
        let mut record = VoterRecord::new(card_id);

        match self.recognize_text(card) {
            Ok(text) if !text.trim().is_empty() => {
                warn_on_unexpected_language(card_id, &text);
                let fields = FieldParser::parse(&text);
                debug!("{}: parsed {:?}", card_id, fields);
                record.name = fields.name;
                record.father_husband_name = fields.father_husband_name;
                record.house_number = fields.house_number;
                record.age = fields.age;
                record.gender = fields.gender;
            }
            Ok(_) => warn!("{}: OCR produced no text", card_id),
            Err(e) => warn!("{}: OCR failed, keeping fields empty: {}", card_id, e),
        }

        match self.faces.encode(card) {
            Ok(Some(observation)) => {
                let face_path = self.photos_dir.join(format!("{}_face.png", card_id));
                match observation.crop.save(&face_path) {
                    Ok(()) => record.face_path = Some(face_path),
                    Err(e) => warn!("{}: failed to save face crop: {}", card_id, e),
                }
                record.face_embedding = Some(observation.embedding);
                record.photo_hash = Some(observation.photo_hash);
            }
            Ok(None) => debug!("{}: no usable photo panel", card_id),
            Err(e) => warn!("{}: face encoding failed: {}", card_id, e),
        }

        record
    }

    fn recognize_text(&self, card: &RgbImage) -> Result<String, RollScanError> {
        let panel = text_panel(card);
        let png = encode_png(&panel)?;
        self.ocr.recognize(&png)
    }
}

/// Left portion of the card where the printed fields live; cropping away the
/// photo panel keeps the OCR engine off the photograph.
fn text_panel(card: &RgbImage) -> RgbImage {
    let width = ((card.width() as f32) * TEXT_PANEL_FRACTION) as u32;
    image::imageops::crop_imm(card, 0, 0, width.max(1), card.height()).to_image()
}

fn encode_png(image: &RgbImage) -> Result<Vec<u8>, RollScanError> {
    let mut buffer = Vec::new();
    image::DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut buffer), image::ImageOutputFormat::Png)
        .map_err(|e| RollScanError::ImageProcessing(format!("PNG encode failed: {}", e)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FaceEmbedding, Gender, FACE_EMBEDDING_LEN};
    use crate::processing::face::FaceObservation;
    use image::Rgb;

    struct FixedOcr(Result<String, ()>);

    impl OcrEngine for FixedOcr {
        fn recognize(&self, _png_bytes: &[u8]) -> Result<String, RollScanError> {
            self.0
                .clone()
                .map_err(|_| RollScanError::Ocr("stub failure".to_string()))
        }
    }

    struct FixedFaces(Option<FaceObservation>);

    impl FaceEncoder for FixedFaces {
        fn encode(&self, _card: &RgbImage) -> Result<Option<FaceObservation>, RollScanError> {
            Ok(self.0.clone())
        }
    }

    fn observation() -> FaceObservation {
        FaceObservation {
            crop: RgbImage::from_pixel(40, 50, Rgb([128, 128, 128])),
            embedding: FaceEmbedding(vec![0.1; FACE_EMBEDDING_LEN]),
            photo_hash: 0x1234_5678,
        }
    }

    fn card() -> RgbImage {
        RgbImage::from_pixel(300, 200, Rgb([255, 255, 255]))
    }

    #[test]
    fn extraction_joins_ocr_fields_and_face_observation() {
        let dir = tempfile::tempdir().unwrap();
        let ocr = FixedOcr(Ok("Elector's Name: Ramesh Kumar\n\
                               Father's Name: Suresh Kumar\n\
                               House Number: 12\n\
                               Age: 35 Gender: Male"
            .to_string()));
        let extractor = CardExtractor::new(
            Box::new(ocr),
            Box::new(FixedFaces(Some(observation()))),
            dir.path(),
        )
        .unwrap();

        let record = extractor.extract("page_3_card_1", &card());
        assert_eq!(record.card_id, "page_3_card_1");
        assert_eq!(record.name.as_deref(), Some("Ramesh Kumar"));
        assert_eq!(record.father_husband_name.as_deref(), Some("Suresh Kumar"));
        assert_eq!(record.house_number.as_deref(), Some("12"));
        assert_eq!(record.age, Some(35));
        assert_eq!(record.gender, Some(Gender::Male));
        assert_eq!(record.photo_hash, Some(0x1234_5678));
        let face_path = record.face_path.expect("face crop saved");
        assert!(face_path.exists());
    }

    #[test]
    fn ocr_failure_degrades_to_an_empty_record() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = CardExtractor::new(
            Box::new(FixedOcr(Err(()))),
            Box::new(FixedFaces(None)),
            dir.path(),
        )
        .unwrap();

        let record = extractor.extract("page_3_card_2", &card());
        assert_eq!(record.card_id, "page_3_card_2");
        assert_eq!(record.name, None);
        assert_eq!(record.face_embedding, None);
        assert_eq!(record.photo_hash, None);
    }

    #[test]
    fn missing_photo_panel_leaves_face_fields_absent() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = CardExtractor::new(
            Box::new(FixedOcr(Ok("Elector's Name: Sita Devi".to_string()))),
            Box::new(FixedFaces(None)),
            dir.path(),
        )
        .unwrap();

        let record = extractor.extract("page_4_card_1", &card());
        assert_eq!(record.name.as_deref(), Some("Sita Devi"));
        assert_eq!(record.face_path, None);
        assert_eq!(record.face_embedding, None);
    }
}
