use crate::models::{
    AddressAnomaly, Evidence, FraudCandidate, FraudKind, PipelineSummary,
};
use crate::utils::RollScanError;
use chrono::Local;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const CANDIDATES_FILE: &str = "fraud_report.csv";
const ANOMALIES_FILE: &str = "address_anomalies.csv";

/// Quotes a CSV field when it contains a delimiter, quote, or newline.
pub(crate) fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Writes the tabular fraud reports and renders the console summary.
pub struct ReportWriter {
    out_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(out_dir: &Path) -> Self {
        ReportWriter {
            out_dir: out_dir.to_path_buf(),
        }
    }

    pub fn candidates_path(&self) -> PathBuf {
        self.out_dir.join(CANDIDATES_FILE)
    }

    pub fn anomalies_path(&self) -> PathBuf {
        self.out_dir.join(ANOMALIES_FILE)
    }

    /// One row per candidate. Columns are the union over all evidence kinds;
    /// a column irrelevant to a row's kind stays empty, so one file covers
    /// every detection rule.
    pub fn write_candidates(&self, candidates: &[FraudCandidate]) -> Result<PathBuf, RollScanError> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.candidates_path();
        let mut out = BufWriter::new(File::create(&path)?);

        writeln!(
            out,
            "fraud_number,fraud_type,card_1,card_2,confidence_percent,\
             matched_fields,face_similarity_percent,name_1,name_2,\
             hash_distance,photo_similarity_percent"
        )?;

        for (number, candidate) in candidates.iter().enumerate() {
            let mut row = vec![
                (number + 1).to_string(),
                candidate.kind.label().to_string(),
                csv_field(&candidate.card_1),
                csv_field(&candidate.card_2),
                format!("{:.1}", candidate.confidence),
            ];
            match &candidate.evidence {
                Evidence::Details { matched_fields, .. } => {
                    row.push(csv_field(&matched_fields.join("+")));
                    row.extend(std::iter::repeat(String::new()).take(5));
                }
                Evidence::Face {
                    similarity_percent,
                    name_1,
                    name_2,
                } => {
                    row.push(String::new());
                    row.push(format!("{:.2}", similarity_percent));
                    row.push(csv_field(name_1.as_deref().unwrap_or("")));
                    row.push(csv_field(name_2.as_deref().unwrap_or("")));
                    row.extend(std::iter::repeat(String::new()).take(2));
                }
                Evidence::Photo {
                    hash_distance,
                    similarity_percent,
                } => {
                    row.extend(std::iter::repeat(String::new()).take(4));
                    row.push(hash_distance.to_string());
                    row.push(format!("{:.2}", similarity_percent));
                }
            }
            writeln!(out, "{}", row.join(","))?;
        }

        out.flush()?;
        info!(
            "wrote {} fraud candidates to {}",
            candidates.len(),
            path.display()
        );
        Ok(path)
    }

    pub fn write_anomalies(&self, anomalies: &[AddressAnomaly]) -> Result<PathBuf, RollScanError> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.anomalies_path();
        let mut out = BufWriter::new(File::create(&path)?);

        writeln!(
            out,
            "house_number,voter_count,unique_names,unique_fathers,risk_level,sample_cards"
        )?;
        for anomaly in anomalies {
            writeln!(
                out,
                "{},{},{},{},{},{}",
                csv_field(&anomaly.house_number),
                anomaly.voter_count,
                anomaly.unique_names,
                anomaly.unique_fathers,
                anomaly.risk_level,
                csv_field(&anomaly.sample_cards.join("|"))
            )?;
        }

        out.flush()?;
        info!(
            "wrote {} address anomalies to {}",
            anomalies.len(),
            path.display()
        );
        Ok(path)
    }
}

/// Console rendering of the run's findings, sectioned by detection rule.
pub fn print_findings(
    candidates: &[FraudCandidate],
    anomalies: &[AddressAnomaly],
    summary: &PipelineSummary,
) {
    let banner = "=".repeat(70);
    println!("\n{}", banner);
    println!("VOTER FRAUD DETECTION REPORT");
    println!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("{}\n", banner);

    if candidates.is_empty() && anomalies.is_empty() {
        println!("NO FRAUD CANDIDATES DETECTED");
        println!("All {} voter records appear legitimate.\n", summary.records);
        return;
    }

    for kind in [
        FraudKind::DuplicateDetails,
        FraudKind::DuplicateFace,
        FraudKind::DuplicatePhoto,
    ] {
        let section: Vec<&FraudCandidate> =
            candidates.iter().filter(|c| c.kind == kind).collect();
        if section.is_empty() {
            continue;
        }

        println!("{}", banner);
        println!("{} ({} pairs)", section_title(kind), section.len());
        println!("{}\n", banner);

        for candidate in section {
            println!("  {} <-> {}", candidate.card_1, candidate.card_2);
            println!("    Confidence: {:.1}%", candidate.confidence);
            match &candidate.evidence {
                Evidence::Details {
                    name,
                    father_husband_name,
                    matched_fields,
                } => {
                    println!("    Name: {}", name);
                    println!("    Father/Husband: {}", father_husband_name);
                    println!("    Matched fields: {}", matched_fields.join(", "));
                }
                Evidence::Face {
                    similarity_percent,
                    name_1,
                    name_2,
                } => {
                    println!("    Face similarity: {:.2}%", similarity_percent);
                    println!(
                        "    Names: {} / {}",
                        name_1.as_deref().unwrap_or("(missing)"),
                        name_2.as_deref().unwrap_or("(missing)")
                    );
                }
                Evidence::Photo {
                    hash_distance,
                    similarity_percent,
                } => {
                    println!(
                        "    Photo hash distance: {} ({:.2}% similar)",
                        hash_distance, similarity_percent
                    );
                }
            }
            println!();
        }
    }

    if !anomalies.is_empty() {
        println!("{}", banner);
        println!("ADDRESS ANOMALIES ({} addresses)", anomalies.len());
        println!("{}\n", banner);
        for anomaly in anomalies {
            println!(
                "  House {}: {} voters (risk: {})",
                anomaly.house_number, anomaly.voter_count, anomaly.risk_level
            );
            println!(
                "    Unique names: {}, unique fathers: {}",
                anomaly.unique_names, anomaly.unique_fathers
            );
        }
        println!();
    }

    println!("{}", banner);
    println!("SUMMARY");
    println!("{}", banner);
    println!("Duplicate details:   {}", summary.duplicate_details);
    println!("Duplicate faces:     {}", summary.duplicate_faces);
    println!("Duplicate photos:    {}", summary.duplicate_photos);
    println!("Address anomalies:   {}", summary.address_anomalies);
    println!("{}", "-".repeat(70));
    println!(
        "Total candidates:    {} across {} records ({:.2}% flagged)",
        summary.total_candidates(),
        summary.records,
        summary.fraud_rate_percent()
    );
    println!("{}\n", banner);
}

fn section_title(kind: FraudKind) -> &'static str {
    match kind {
        FraudKind::DuplicateDetails => "DUPLICATE DETAILS",
        FraudKind::DuplicateFace => "DUPLICATE FACES",
        FraudKind::DuplicatePhoto => "DUPLICATE PHOTOS",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;

    fn details_candidate() -> FraudCandidate {
        FraudCandidate {
            card_1: "roll_page_3_card_1".to_string(),
            card_2: "roll_page_4_card_2".to_string(),
            kind: FraudKind::DuplicateDetails,
            confidence: 100.0,
            evidence: Evidence::Details {
                name: "रमेश कुमार".to_string(),
                father_husband_name: "सुरेश कुमार".to_string(),
                matched_fields: vec!["name".to_string(), "father_husband_name".to_string()],
            },
        }
    }

    fn face_candidate() -> FraudCandidate {
        FraudCandidate {
            card_1: "roll_page_3_card_1".to_string(),
            card_2: "roll_page_5_card_4".to_string(),
            kind: FraudKind::DuplicateFace,
            confidence: 95.0,
            evidence: Evidence::Face {
                similarity_percent: 93.5,
                name_1: Some("रमेश कुमार".to_string()),
                name_2: Some("मोहन लाल".to_string()),
            },
        }
    }

    #[test]
    fn candidate_csv_has_one_row_per_candidate_plus_header() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        let path = writer
            .write_candidates(&[details_candidate(), face_candidate()])
            .unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("fraud_number,fraud_type,card_1"));
        assert!(lines[1].contains("DUPLICATE_DETAILS"));
        assert!(lines[1].contains("name+father_husband_name"));
        assert!(lines[2].contains("DUPLICATE_FACE"));
        assert!(lines[2].contains("93.50"));
    }

    #[test]
    fn every_row_has_the_full_column_count() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        let path = writer
            .write_candidates(&[details_candidate(), face_candidate()])
            .unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        for line in contents.lines() {
            assert_eq!(line.matches(',').count(), 10, "bad row: {}", line);
        }
    }

    #[test]
    fn anomalies_csv_round_trips_fields() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path());
        let anomaly = AddressAnomaly {
            house_number: "45".to_string(),
            voter_count: 52,
            unique_names: 48,
            unique_fathers: 31,
            risk_level: RiskLevel::Critical,
            sample_cards: vec!["a_page_3_card_1".to_string(), "a_page_3_card_2".to_string()],
        };
        let path = writer.write_anomalies(&[anomaly]).unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.contains("45,52,48,31,CRITICAL"));
        assert!(contents.contains("a_page_3_card_1|a_page_3_card_2"));
    }

    #[test]
    fn csv_fields_with_commas_and_quotes_are_quoted() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
