pub mod detection;
pub mod models;
pub mod pipeline;
pub mod processing;
pub mod reporting;
pub mod storage;
pub mod utils;

pub use pipeline::FraudPipeline;
pub use utils::RollScanError;
