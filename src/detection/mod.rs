pub mod address;
pub mod details;
pub mod face;
pub mod normalize;
pub mod photo;

pub use address::AddressRule;
pub use details::DetailsRule;
pub use face::FaceRule;
pub use photo::PhotoRule;

use crate::models::{AddressAnomaly, DetectionRules, FraudCandidate, VoterRecord};
use log::info;

/// Aggregates every detection rule over one immutable snapshot of records.
/// The scans are O(N²) pairwise comparisons with canonical i < j ordering,
/// which is acceptable at the dataset sizes this tool targets (low thousands
/// of records per roll).
pub struct DuplicateDetector;

/// Everything the detection stage found in one pass.
#[derive(Debug, Clone, Default)]
pub struct DetectionOutcome {
    pub candidates: Vec<FraudCandidate>,
    pub anomalies: Vec<AddressAnomaly>,
}

impl DuplicateDetector {
    /// Runs all pairwise rules plus the address scan and returns a
    /// deterministic, stably ordered result: candidates sorted by
    /// (card_1, card_2, kind). Running twice over the same snapshot yields an
    /// identical outcome.
    pub fn detect_all(records: &[VoterRecord], rules: &DetectionRules) -> DetectionOutcome {
        info!("running duplicate detection over {} records", records.len());

        let mut candidates = DetailsRule::detect(records, rules);
        candidates.extend(FaceRule::detect(records, rules));
        candidates.extend(PhotoRule::detect(records, rules));

        candidates.sort_by(|a, b| {
            a.card_1
                .cmp(&b.card_1)
                .then_with(|| a.card_2.cmp(&b.card_2))
                .then_with(|| a.kind.cmp(&b.kind))
        });

        let anomalies = AddressRule::detect(records, rules);

        info!(
            "detection complete: {} candidates, {} address anomalies",
            candidates.len(),
            anomalies.len()
        );

        DetectionOutcome {
            candidates,
            anomalies,
        }
    }
}
