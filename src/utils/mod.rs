pub mod error;

pub use error::RollScanError;
