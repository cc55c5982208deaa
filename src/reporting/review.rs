use crate::models::{Evidence, FraudCandidate, FraudKind, VoterRecord};
use crate::reporting::report::csv_field;
use crate::utils::RollScanError;
use log::{info, warn};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const REVIEW_CSV: &str = "fraud_review_report.csv";
const REVIEW_HTML: &str = "fraud_review_report.html";

/// Where the review package landed on disk.
#[derive(Debug)]
pub struct ReviewPaths {
    pub csv: PathBuf,
    pub html: PathBuf,
}

/// One suspect pair, joined with the full record of both cards so a reviewer
/// can decide which card to keep without opening the source PDF.
struct ReviewRow<'a> {
    number: usize,
    kind: FraudKind,
    candidate: &'a FraudCandidate,
    voter_1: &'a VoterRecord,
    voter_2: &'a VoterRecord,
    similarity: String,
    recommendation: &'static str,
}

/// Builds the human review package: a CSV for tracking decisions and an HTML
/// page that puts each suspect pair side by side. Duplicate-details and
/// duplicate-face pairs need a human call on which card survives; photo pairs
/// are folded in with the face pairs since the decision is the same.
pub struct ReviewReport {
    out_dir: PathBuf,
}

impl ReviewReport {
    pub fn new(out_dir: &Path) -> Self {
        ReviewReport {
            out_dir: out_dir.to_path_buf(),
        }
    }

    pub fn write(
        &self,
        candidates: &[FraudCandidate],
        records: &[VoterRecord],
    ) -> Result<Option<ReviewPaths>, RollScanError> {
        if candidates.is_empty() {
            info!("no fraud candidates, skipping review package");
            return Ok(None);
        }

        let by_id: BTreeMap<&str, &VoterRecord> = records
            .iter()
            .map(|record| (record.card_id.as_str(), record))
            .collect();

        let mut rows = Vec::new();
        for candidate in candidates {
            let (voter_1, voter_2) = match (
                by_id.get(candidate.card_1.as_str()),
                by_id.get(candidate.card_2.as_str()),
            ) {
                (Some(a), Some(b)) => (*a, *b),
                _ => {
                    warn!(
                        "review: records missing for pair {} / {}",
                        candidate.card_1, candidate.card_2
                    );
                    continue;
                }
            };
            let (similarity, recommendation) = match &candidate.evidence {
                Evidence::Details { .. } => (
                    "100% (all details match)".to_string(),
                    "REVIEW DOCUMENT QUALITY - keep the earlier card as original",
                ),
                Evidence::Face {
                    similarity_percent, ..
                } => (
                    format!("{:.2}% face match", similarity_percent),
                    "LIKELY FRAUD - same person under different details",
                ),
                Evidence::Photo {
                    similarity_percent, ..
                } => (
                    format!("{:.2}% identical photo", similarity_percent),
                    "LIKELY FRAUD - same photograph printed twice",
                ),
            };
            rows.push(ReviewRow {
                number: rows.len() + 1,
                kind: candidate.kind,
                candidate,
                voter_1,
                voter_2,
                similarity,
                recommendation,
            });
        }

        std::fs::create_dir_all(&self.out_dir)?;
        let csv = self.write_csv(&rows)?;
        let html = self.write_html(&rows)?;
        info!(
            "review package: {} suspect pairs in {}",
            rows.len(),
            self.out_dir.display()
        );
        Ok(Some(ReviewPaths { csv, html }))
    }

    fn write_csv(&self, rows: &[ReviewRow<'_>]) -> Result<PathBuf, RollScanError> {
        let path = self.out_dir.join(REVIEW_CSV);
        let mut out = BufWriter::new(File::create(&path)?);

        writeln!(
            out,
            "fraud_number,fraud_type,\
             card_1,card_1_name,card_1_father,card_1_age,card_1_house,\
             card_2,card_2_name,card_2_father,card_2_age,card_2_house,\
             similarity,recommendation,decision"
        )?;
        for row in rows {
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                row.number,
                row.kind.label(),
                csv_field(&row.candidate.card_1),
                csv_field(field(&row.voter_1.name)),
                csv_field(field(&row.voter_1.father_husband_name)),
                age_field(row.voter_1.age),
                csv_field(field(&row.voter_1.house_number)),
                csv_field(&row.candidate.card_2),
                csv_field(field(&row.voter_2.name)),
                csv_field(field(&row.voter_2.father_husband_name)),
                age_field(row.voter_2.age),
                csv_field(field(&row.voter_2.house_number)),
                csv_field(&row.similarity),
                csv_field(row.recommendation),
                "PENDING"
            )?;
        }
        out.flush()?;
        Ok(path)
    }

    fn write_html(&self, rows: &[ReviewRow<'_>]) -> Result<PathBuf, RollScanError> {
        let path = self.out_dir.join(REVIEW_HTML);
        let mut html = String::from(HTML_HEAD);

        for row in rows {
            let (title, class) = match row.kind {
                FraudKind::DuplicateDetails => ("SAME DETAILS DETECTED", "duplicate-details"),
                FraudKind::DuplicateFace => ("SAME PERSON DETECTED", "duplicate-face"),
                FraudKind::DuplicatePhoto => ("SAME PHOTO DETECTED", "duplicate-face"),
            };
            let _ = write!(
                html,
                r#"
    <div class="fraud-card {class}">
      <h2>#{number}: {title}</h2>
      <p><strong>Evidence:</strong> {similarity}</p>
      <div class="card-pair">
{card_1}
{card_2}
      </div>
      <div class="recommendation">
        <strong>Recommendation:</strong> {recommendation}<br>
        <strong>Status:</strong> PENDING (needs human review)
      </div>
    </div>"#,
                class = class,
                number = row.number,
                title = title,
                similarity = html_escape(&row.similarity),
                card_1 = voter_panel("Card 1", row.voter_1),
                card_2 = voter_panel("Card 2", row.voter_2),
                recommendation = row.recommendation,
            );
        }

        html.push_str(HTML_FOOT);
        std::fs::write(&path, html)?;
        Ok(path)
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn age_field(age: Option<u32>) -> String {
    age.map(|a| a.to_string()).unwrap_or_default()
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn voter_panel(label: &str, voter: &VoterRecord) -> String {
    format!(
        r#"        <div class="voter-card">
          <h3>{label}: {id}</h3>
          <div class="field"><span class="label">Name:</span> {name}</div>
          <div class="field"><span class="label">Father/Husband:</span> {father}</div>
          <div class="field"><span class="label">Age:</span> {age}</div>
          <div class="field"><span class="label">House:</span> {house}</div>
        </div>"#,
        label = label,
        id = html_escape(&voter.card_id),
        name = html_escape(field(&voter.name)),
        father = html_escape(field(&voter.father_husband_name)),
        age = age_field(voter.age),
        house = html_escape(field(&voter.house_number)),
    )
}

const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Voter Fraud Review Report</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 20px; }
    h1 { color: #333; }
    .fraud-card {
      border: 2px solid #e74c3c; border-radius: 8px;
      padding: 20px; margin: 20px 0; background-color: #fdeaea;
    }
    .duplicate-details { border-color: #f39c12; background-color: #fef5e7; }
    .duplicate-face { border-color: #e74c3c; background-color: #fadbd8; }
    .card-pair {
      display: grid; grid-template-columns: 1fr 1fr;
      gap: 20px; margin: 15px 0;
    }
    .voter-card {
      border: 1px solid #bdc3c7; padding: 15px;
      border-radius: 5px; background-color: #ecf0f1;
    }
    .voter-card h3 { margin-top: 0; }
    .field { margin: 8px 0; }
    .label { font-weight: bold; color: #2c3e50; }
    .recommendation {
      background-color: #fff3cd; border: 1px solid #ffc107;
      padding: 10px; border-radius: 5px; margin-top: 15px;
    }
  </style>
</head>
<body>
  <h1>Voter Fraud Review Report</h1>
  <p>Review each suspect pair and decide which card to keep as the original voter.</p>"#;

const HTML_FOOT: &str = r#"
</body>
</html>
"#;
