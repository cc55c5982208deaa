pub mod data;
pub mod rules;

pub use data::{
    AddressAnomaly, Evidence, FaceEmbedding, FraudCandidate, FraudKind, Gender, PipelineSummary,
    RiskLevel, VoterRecord, FACE_EMBEDDING_LEN,
};
pub use rules::DetectionRules;
