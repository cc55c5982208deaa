use crate::utils::RollScanError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable thresholds for the duplicate detection rules. All percentages are
/// expressed in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionRules {
    /// Minimum face similarity (inclusive) for a duplicate-face candidate.
    pub face_similarity_threshold: f32,
    /// Confidence bonus applied when a face match carries divergent names.
    pub name_mismatch_bonus: f32,
    /// Require matching ages when both records carry one.
    pub require_age_match: bool,
    /// Require matching genders when both records carry one.
    pub require_gender_match: bool,
    /// Maximum Hamming distance (of 64 bits) for a duplicate-photo candidate.
    pub photo_hash_max_distance: u32,
    /// Minimum registrations at one house number before it is flagged.
    pub address_anomaly_threshold: usize,
}

impl Default for DetectionRules {
    fn default() -> Self {
        DetectionRules {
            face_similarity_threshold: 90.0,
            name_mismatch_bonus: 5.0,
            require_age_match: true,
            require_gender_match: true,
            photo_hash_max_distance: 10,
            address_anomaly_threshold: 30,
        }
    }
}

impl DetectionRules {
    pub fn from_file(path: &Path) -> Result<Self, RollScanError> {
        let contents = std::fs::read_to_string(path)?;
        let rules: DetectionRules = serde_json::from_str(&contents)
            .map_err(|e| RollScanError::Config(format!("invalid rules file {}: {}", path.display(), e)))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), RollScanError> {
        if !(0.0..=100.0).contains(&self.face_similarity_threshold) {
            return Err(RollScanError::Config(format!(
                "face similarity threshold must be within 0-100, got {}",
                self.face_similarity_threshold
            )));
        }
        if !(0.0..=100.0).contains(&self.name_mismatch_bonus) {
            return Err(RollScanError::Config(format!(
                "name mismatch bonus must be within 0-100, got {}",
                self.name_mismatch_bonus
            )));
        }
        if self.photo_hash_max_distance > 64 {
            return Err(RollScanError::Config(format!(
                "photo hash distance is measured over 64 bits, got {}",
                self.photo_hash_max_distance
            )));
        }
        Ok(())
    }
}
