use crate::detection::normalize::normalize_field;
use crate::models::{AddressAnomaly, DetectionRules, RiskLevel, VoterRecord};
use std::collections::{BTreeMap, BTreeSet};

const SAMPLE_CARD_LIMIT: usize = 10;

/// Address-anomaly rule: a joint family explains a dozen registrations at one
/// house number, not several dozen. Flags houses at or above the configured
/// count with a risk band for reviewer triage.
pub struct AddressRule;

impl AddressRule {
    pub fn detect(records: &[VoterRecord], rules: &DetectionRules) -> Vec<AddressAnomaly> {
        // BTreeMap keeps the anomaly list deterministic across runs.
        let mut by_house: BTreeMap<String, Vec<&VoterRecord>> = BTreeMap::new();
        for record in records {
            if let Some(house) = record.house_number.as_deref() {
                by_house
                    .entry(normalize_field(house))
                    .or_default()
                    .push(record);
            }
        }

        let mut anomalies = Vec::new();
        for (house_number, members) in by_house {
            if members.len() < rules.address_anomaly_threshold {
                continue;
            }

            let unique_names: BTreeSet<String> = members
                .iter()
                .filter_map(|r| r.name.as_deref())
                .map(normalize_field)
                .collect();
            let unique_fathers: BTreeSet<String> = members
                .iter()
                .filter_map(|r| r.father_husband_name.as_deref())
                .map(normalize_field)
                .collect();

            anomalies.push(AddressAnomaly {
                house_number,
                voter_count: members.len(),
                unique_names: unique_names.len(),
                unique_fathers: unique_fathers.len(),
                risk_level: Self::risk_level(members.len()),
                sample_cards: members
                    .iter()
                    .take(SAMPLE_CARD_LIMIT)
                    .map(|r| r.card_id.clone())
                    .collect(),
            });
        }

        anomalies
    }

    fn risk_level(voter_count: usize) -> RiskLevel {
        if voter_count >= 50 {
            RiskLevel::Critical
        } else if voter_count >= 40 {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records_at(house: &str, count: usize) -> Vec<VoterRecord> {
        (0..count)
            .map(|i| VoterRecord {
                house_number: Some(house.to_string()),
                name: Some(format!("Voter {}", i)),
                father_husband_name: Some("Shared Father".to_string()),
                ..VoterRecord::new(format!("page_1_card_{}", i + 1))
            })
            .collect()
    }

    #[test]
    fn houses_below_the_threshold_are_not_flagged() {
        let records = records_at("12", 29);
        assert!(AddressRule::detect(&records, &DetectionRules::default()).is_empty());
    }

    #[test]
    fn threshold_count_is_flagged_with_medium_risk() {
        let records = records_at("12", 30);
        let anomalies = AddressRule::detect(&records, &DetectionRules::default());
        assert_eq!(anomalies.len(), 1);
        let anomaly = &anomalies[0];
        assert_eq!(anomaly.voter_count, 30);
        assert_eq!(anomaly.risk_level, RiskLevel::Medium);
        assert_eq!(anomaly.unique_names, 30);
        assert_eq!(anomaly.unique_fathers, 1);
        assert_eq!(anomaly.sample_cards.len(), 10);
    }

    #[test]
    fn risk_bands_follow_voter_count() {
        assert_eq!(AddressRule::risk_level(39), RiskLevel::Medium);
        assert_eq!(AddressRule::risk_level(40), RiskLevel::High);
        assert_eq!(AddressRule::risk_level(50), RiskLevel::Critical);
    }

    #[test]
    fn records_without_house_numbers_are_ignored() {
        let mut records = records_at("12", 29);
        records.push(VoterRecord::new("page_9_card_1"));
        assert!(AddressRule::detect(&records, &DetectionRules::default()).is_empty());
    }
}
