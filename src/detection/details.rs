use crate::detection::normalize::normalize_field;
use crate::models::{DetectionRules, Evidence, FraudCandidate, FraudKind, VoterRecord};

/// Duplicate-details rule: two registrations carrying the same name and
/// father/husband name describe the same household entry. Age and gender are
/// additional gates only when present on both sides; a record missing them is
/// not penalized.
pub struct DetailsRule;

impl DetailsRule {
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
        // Both sides must carry the two anchor fields.
        let name_1 = first.name.as_deref()?;
        let name_2 = second.name.as_deref()?;
        let father_1 = first.father_husband_name.as_deref()?;
        let father_2 = second.father_husband_name.as_deref()?;

        if normalize_field(name_1) != normalize_field(name_2) {
            return None;
        }
        if normalize_field(father_1) != normalize_field(father_2) {
            return None;
        }

        let mut matched_fields = vec!["name".to_string(), "father/husband".to_string()];

        if rules.require_age_match {
            if let (Some(age_1), Some(age_2)) = (first.age, second.age) {
                if age_1 != age_2 {
                    // Different ages, probably different people.
                    return None;
                }
                matched_fields.push("age".to_string());
            }
        }

        if rules.require_gender_match {
            if let (Some(gender_1), Some(gender_2)) = (first.gender, second.gender) {
                if gender_1 != gender_2 {
                    return None;
                }
                matched_fields.push("gender".to_string());
            }
        }

        Some(FraudCandidate {
            card_1: first.card_id.clone(),
            card_2: second.card_id.clone(),
            kind: FraudKind::DuplicateDetails,
            confidence: 100.0,
            evidence: Evidence::Details {
                name: name_1.to_string(),
                father_husband_name: father_1.to_string(),
                matched_fields,
            },
        })
    }
}
