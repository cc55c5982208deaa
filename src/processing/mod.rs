pub mod extractor;
pub mod face;
pub mod fields;
pub mod ocr;
pub mod pdf;
pub mod segmenter;

pub use extractor::CardExtractor;
pub use face::{average_hash, FaceEncoder, FaceObservation, PhotoRegionEncoder};
pub use fields::{FieldParser, ParsedFields};
pub use ocr::{OcrEngine, TesseractOcr};
pub use pdf::{PdfRasterizer, DEFAULT_ZOOM};
pub use segmenter::{CardImage, CardSegmenter};
