use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const FACE_EMBEDDING_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Gender::Male => write!(f, "M"),
            Gender::Female => write!(f, "F"),
        }
    }
}

/// Fixed-length face descriptor owned by exactly one voter record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceEmbedding(pub Vec<f32>);

impl FaceEmbedding {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Euclidean distance between two embeddings. Mismatched lengths are
    /// treated as maximally distant rather than an error.
    pub fn distance(&self, other: &FaceEmbedding) -> f32 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return f32::MAX;
        }
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }

    /// Similarity as a percentage: (1 - distance) * 100, clamped to [0, 100].
    pub fn similarity_percent(&self, other: &FaceEmbedding) -> f32 {
        let distance = self.distance(other);
        ((1.0 - distance) * 100.0).clamp(0.0, 100.0)
    }
}

/// One extracted card's structured data. Created once per segmented card and
/// immutable after extraction; absent fields reduce what the detector can
/// compare but never make it fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterRecord {
    pub card_id: String,
    pub name: Option<String>,
    pub father_husband_name: Option<String>,
    pub house_number: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub face_path: Option<PathBuf>,
    /// Persisted separately in the embedding store; rejoined on load.
    #[serde(skip)]
    pub face_embedding: Option<FaceEmbedding>,
    /// 64-bit average hash of the card's photo panel.
    pub photo_hash: Option<u64>,
}

impl VoterRecord {
    pub fn new(card_id: impl Into<String>) -> Self {
        VoterRecord {
            card_id: card_id.into(),
            name: None,
            father_husband_name: None,
            house_number: None,
            age: None,
            gender: None,
            face_path: None,
            face_embedding: None,
            photo_hash: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FraudKind {
    DuplicateDetails,
    DuplicateFace,
    DuplicatePhoto,
}

impl FraudKind {
    pub fn label(&self) -> &'static str {
        match self {
            FraudKind::DuplicateDetails => "DUPLICATE_DETAILS",
            FraudKind::DuplicateFace => "DUPLICATE_FACE",
            FraudKind::DuplicatePhoto => "DUPLICATE_PHOTO",
        }
    }
}

impl std::fmt::Display for FraudKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Evidence that triggered a candidate. The detection kind determines which
/// variant is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Evidence {
    Details {
        name: String,
        father_husband_name: String,
        matched_fields: Vec<String>,
    },
    Face {
        similarity_percent: f32,
        name_1: Option<String>,
        name_2: Option<String>,
    },
    Photo {
        hash_distance: u32,
        similarity_percent: f32,
    },
}

/// A flagged pair of voter records. Card ids are canonically ordered
/// (card_1 < card_2 by record position) so a pair is reported once per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudCandidate {
    pub card_1: String,
    pub card_2: String,
    pub kind: FraudKind,
    /// Percentage in [0, 100].
    pub confidence: f32,
    pub evidence: Evidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A house number with an implausible number of registrations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressAnomaly {
    pub house_number: String,
    pub voter_count: usize,
    pub unique_names: usize,
    pub unique_fathers: usize,
    pub risk_level: RiskLevel,
    pub sample_cards: Vec<String>,
}

/// Counters reported at the end of a full pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineSummary {
    pub documents: usize,
    pub pages: usize,
    pub cards: usize,
    pub records: usize,
    pub faces_detected: usize,
    pub duplicate_details: usize,
    pub duplicate_faces: usize,
    pub duplicate_photos: usize,
    pub address_anomalies: usize,
}

impl PipelineSummary {
    pub fn total_candidates(&self) -> usize {
        self.duplicate_details + self.duplicate_faces + self.duplicate_photos
    }

    pub fn fraud_rate_percent(&self) -> f32 {
        if self.records == 0 {
            0.0
        } else {
            (self.total_candidates() as f32 / self.records as f32) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_distance_is_zero_for_identical_vectors() {
        let a = FaceEmbedding(vec![0.25; FACE_EMBEDDING_LEN]);
        let b = a.clone();
        assert_eq!(a.distance(&b), 0.0);
        assert_eq!(a.similarity_percent(&b), 100.0);
    }

    #[test]
    fn embedding_similarity_clamps_to_zero() {
        let a = FaceEmbedding(vec![1.0, 0.0, 0.0]);
        let b = FaceEmbedding(vec![-1.0, 0.0, 0.0]);
        // Distance 2.0 would give -100 unclamped.
        assert_eq!(a.similarity_percent(&b), 0.0);
    }

    #[test]
    fn mismatched_embedding_lengths_are_maximally_distant() {
        let a = FaceEmbedding(vec![0.5; 4]);
        let b = FaceEmbedding(vec![0.5; 8]);
        assert_eq!(a.similarity_percent(&b), 0.0);
    }

    #[test]
    fn gender_serializes_as_single_letter() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"F\"");
        let parsed: Gender = serde_json::from_str("\"M\"").unwrap();
        assert_eq!(parsed, Gender::Male);
    }

    #[test]
    fn fraud_rate_handles_empty_runs() {
        let summary = PipelineSummary::default();
        assert_eq!(summary.fraud_rate_percent(), 0.0);
    }
}
