use crate::detection::normalize::normalized_eq;
use crate::models::{DetectionRules, Evidence, FraudCandidate, FraudKind, VoterRecord};

/// Duplicate-face rule: two registrations whose face descriptors meet the
/// similarity threshold (inclusive) were produced from the same person's
/// photograph. A matching face under divergent names is the stronger fraud
/// signal, so it earns a confidence bonus.
pub struct FaceRule;

impl FaceRule {
    pub fn detect(records: &[VoterRecord], rules: &DetectionRules) -> Vec<FraudCandidate> {
        let mut candidates = Vec::new();

        for i in 0..records.len() {
            for j in (i + 1)..records.len() {
                if let Some(candidate) = Self::compare(&records[i], &records[j], rules) {
                    candidates.push(candidate);
                }
            }
        }

        candidates
    }

    fn compare(
        first: &VoterRecord,
        second: &VoterRecord,
        rules: &DetectionRules,
    ) -> Option<FraudCandidate> {
        let embedding_1 = first.face_embedding.as_ref()?;
        let embedding_2 = second.face_embedding.as_ref()?;

        let similarity = embedding_1.similarity_percent(embedding_2);
        if similarity < rules.face_similarity_threshold {
            return None;
        }

        // Confidence starts at the threshold; divergent identities on a
        // matching face add the configured bonus. Names missing on either
        // side cannot demonstrate divergence.
        let names_differ = matches!(
            normalized_eq(first.name.as_deref(), second.name.as_deref()),
            Some(false)
        );
        let confidence = if names_differ {
            (rules.face_similarity_threshold + rules.name_mismatch_bonus).min(100.0)
        } else {
            rules.face_similarity_threshold
        };

        Some(FraudCandidate {
            card_1: first.card_id.clone(),
            card_2: second.card_id.clone(),
            kind: FraudKind::DuplicateFace,
            confidence,
            evidence: Evidence::Face {
                similarity_percent: similarity,
                name_1: first.name.clone(),
                name_2: second.name.clone(),
            },
        })
    }
}
