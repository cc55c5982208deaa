use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollScanError {
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("Image processing error: {0}")]
    ImageProcessing(String),
    #[error("OCR error: {0}")]
    Ocr(String),
    #[error("Face encoding error: {0}")]
    FaceEncoding(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Report error: {0}")]
    Report(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
