pub mod report;
pub mod review;

pub use report::{print_findings, ReportWriter};
pub use review::{ReviewPaths, ReviewReport};
