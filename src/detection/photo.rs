use crate::models::{DetectionRules, Evidence, FraudCandidate, FraudKind, VoterRecord};

/// Duplicate-photo rule: two cards printed from the same photograph. Works off
/// the 64-bit average hash computed at extraction time, so it catches reused
/// photos even when the face descriptor is unavailable, and tolerates the
/// brightness and crop jitter of rescanned pages.
pub struct PhotoRule;

impl PhotoRule {
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
        let hash_1 = first.photo_hash?;
        let hash_2 = second.photo_hash?;

        let distance = (hash_1 ^ hash_2).count_ones();
        if distance > rules.photo_hash_max_distance {
            return None;
        }

        let similarity = (1.0 - distance as f32 / 64.0) * 100.0;

        Some(FraudCandidate {
            card_1: first.card_id.clone(),
            card_2: second.card_id.clone(),
            kind: FraudKind::DuplicatePhoto,
            confidence: similarity,
            evidence: Evidence::Photo {
                hash_distance: distance,
                similarity_percent: similarity,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(card_id: &str, photo_hash: Option<u64>) -> VoterRecord {
        VoterRecord {
            photo_hash,
            ..VoterRecord::new(card_id)
        }
    }

    #[test]
    fn identical_hashes_are_a_full_confidence_match() {
        let records = vec![
            record("a", Some(0xDEAD_BEEF_0123_4567)),
            record("b", Some(0xDEAD_BEEF_0123_4567)),
        ];
        let found = PhotoRule::detect(&records, &DetectionRules::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].confidence, 100.0);
        match &found[0].evidence {
            Evidence::Photo { hash_distance, .. } => assert_eq!(*hash_distance, 0),
            other => panic!("unexpected evidence: {:?}", other),
        }
    }

    #[test]
    fn near_hashes_within_the_distance_limit_match() {
        // Flip 10 bits: right at the default limit.
        let base: u64 = 0xFFFF_0000_FFFF_0000;
        let near = base ^ 0x3FF;
        let records = vec![record("a", Some(base)), record("b", Some(near))];
        let found = PhotoRule::detect(&records, &DetectionRules::default());
        assert_eq!(found.len(), 1);
        let expected = (1.0 - 10.0 / 64.0) * 100.0;
        assert!((found[0].confidence - expected).abs() < 1e-4);
    }

    #[test]
    fn distant_hashes_do_not_match() {
        let base: u64 = 0;
        let far = 0x7FF; // 11 bits differ.
        let records = vec![record("a", Some(base)), record("b", Some(far))];
        assert!(PhotoRule::detect(&records, &DetectionRules::default()).is_empty());
    }

    #[test]
    fn records_without_hashes_are_skipped() {
        let records = vec![record("a", Some(1)), record("b", None)];
        assert!(PhotoRule::detect(&records, &DetectionRules::default()).is_empty());
    }
}
