use crate::detection::{DetectionOutcome, DuplicateDetector};
use crate::models::{DetectionRules, PipelineSummary, VoterRecord};
use crate::processing::{
    CardExtractor, CardSegmenter, PdfRasterizer, PhotoRegionEncoder, TesseractOcr,
};
use crate::reporting::{print_findings, ReportWriter, ReviewPaths, ReviewReport};
use crate::storage::VoterStore;
use crate::utils::RollScanError;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// First roll page carrying voter cards; earlier pages are summary sheets.
pub const DEFAULT_START_PAGE: u16 = 3;

const STORE_SUBDIR: &str = "processed";
const CARDS_SUBDIR: &str = "extracted_cards";
const PHOTOS_SUBDIR: &str = "photos";
const REPORTS_SUBDIR: &str = "reports";
const REVIEWS_SUBDIR: &str = "reviews";

/// End-to-end batch pipeline: PDF pages to card images to voter records to
/// fraud reports. Individual pages and cards degrade on failure; only setup
/// errors (missing PDF, unusable work directory) abort a run.
pub struct FraudPipeline {
    rasterizer: PdfRasterizer,
    segmenter: CardSegmenter,
    extractor: CardExtractor,
    rules: DetectionRules,
    work_dir: PathBuf,
    out_dir: PathBuf,
    /// 1-based page number processing starts from.
    start_page: u16,
}

impl FraudPipeline {
    pub fn new(
        work_dir: &Path,
        out_dir: &Path,
        start_page: u16,
        zoom: f32,
        rules: DetectionRules,
    ) -> Result<Self, RollScanError> {
        let extractor = CardExtractor::new(
            Box::new(TesseractOcr::hindi_english()),
            Box::new(PhotoRegionEncoder::new()),
            &work_dir.join(PHOTOS_SUBDIR),
        )?;
        Ok(FraudPipeline {
            rasterizer: PdfRasterizer::new(zoom)?,
            segmenter: CardSegmenter::new(),
            extractor,
            rules,
            work_dir: work_dir.to_path_buf(),
            out_dir: out_dir.to_path_buf(),
            start_page: start_page.max(1),
        })
    }

    /// Processes every document, persists the extracted records, then runs
    /// detection and writes the full report set.
    pub fn run(&self, documents: &[PathBuf]) -> Result<PipelineSummary, RollScanError> {
        let mut summary = PipelineSummary::default();
        let mut records = Vec::new();

        for document in documents {
            records.extend(self.process_document(document, &mut summary)?);
        }
        summary.records = records.len();
        summary.faces_detected = records.iter().filter(|r| r.face_embedding.is_some()).count();

        VoterStore::new(&self.work_dir.join(STORE_SUBDIR)).save(&records)?;

        let outcome = run_detection(&records, &self.rules, &self.out_dir, true, &mut summary)?;
        print_findings(&outcome.candidates, &outcome.anomalies, &summary);
        Ok(summary)
    }

    fn process_document(
        &self,
        document: &Path,
        summary: &mut PipelineSummary,
    ) -> Result<Vec<VoterRecord>, RollScanError> {
        let stem = document_stem(document);
        info!("processing {}", document.display());

        let pdf = self.rasterizer.open(document)?;
        let page_count = self.rasterizer.page_count(&pdf);
        summary.documents += 1;

        let cards_dir = self.work_dir.join(CARDS_SUBDIR);
        std::fs::create_dir_all(&cards_dir)?;

        let mut records = Vec::new();
        for page_index in (self.start_page - 1)..page_count {
            let page_number = page_index + 1;
            let page = match self.rasterizer.render_page(&pdf, page_index) {
                Ok(page) => page,
                Err(e) => {
                    warn!("{}: page {} skipped: {}", stem, page_number, e);
                    continue;
                }
            };
            summary.pages += 1;

            let cards = self.segmenter.segment_page(&page);
            if cards.is_empty() {
                info!("{}: page {} has no card grid", stem, page_number);
                continue;
            }

            for card in &cards {
                let card_id = card_identifier(&stem, page_number, card.index);
                let card_path = cards_dir.join(format!("{}.png", card_id));
                if let Err(e) = card.image.save(&card_path) {
                    warn!("{}: failed to save card image: {}", card_id, e);
                }
                records.push(self.extractor.extract(&card_id, &card.image));
                summary.cards += 1;
            }
            info!("{}: page {} yielded {} cards", stem, page_number, cards.len());
        }

        Ok(records)
    }
}

/// Re-runs detection over a previously saved store and writes the tabular
/// reports plus the console rendering.
pub fn detect_from_store(
    work_dir: &Path,
    out_dir: &Path,
    rules: &DetectionRules,
) -> Result<PipelineSummary, RollScanError> {
    let records = VoterStore::new(&work_dir.join(STORE_SUBDIR)).load()?;
    let mut summary = PipelineSummary {
        records: records.len(),
        faces_detected: records.iter().filter(|r| r.face_embedding.is_some()).count(),
        ..PipelineSummary::default()
    };
    let outcome = run_detection(&records, rules, out_dir, false, &mut summary)?;
    print_findings(&outcome.candidates, &outcome.anomalies, &summary);
    Ok(summary)
}

/// Rebuilds only the human review package from a previously saved store.
pub fn review_from_store(
    work_dir: &Path,
    out_dir: &Path,
    rules: &DetectionRules,
) -> Result<Option<ReviewPaths>, RollScanError> {
    let records = VoterStore::new(&work_dir.join(STORE_SUBDIR)).load()?;
    let outcome = DuplicateDetector::detect_all(&records, rules);
    ReviewReport::new(&out_dir.join(REVIEWS_SUBDIR)).write(&outcome.candidates, &records)
}

fn run_detection(
    records: &[VoterRecord],
    rules: &DetectionRules,
    out_dir: &Path,
    with_review: bool,
    summary: &mut PipelineSummary,
) -> Result<DetectionOutcome, RollScanError> {
    let outcome = DuplicateDetector::detect_all(records, rules);
    for candidate in &outcome.candidates {
        match candidate.kind {
            crate::models::FraudKind::DuplicateDetails => summary.duplicate_details += 1,
            crate::models::FraudKind::DuplicateFace => summary.duplicate_faces += 1,
            crate::models::FraudKind::DuplicatePhoto => summary.duplicate_photos += 1,
        }
    }
    summary.address_anomalies = outcome.anomalies.len();

    let writer = ReportWriter::new(&out_dir.join(REPORTS_SUBDIR));
    writer.write_candidates(&outcome.candidates)?;
    writer.write_anomalies(&outcome.anomalies)?;

    if with_review {
        ReviewReport::new(&out_dir.join(REVIEWS_SUBDIR))
            .write(&outcome.candidates, records)?;
    }
    Ok(outcome)
}

/// Card ids are `{document}_page_{p}_card_{n}` with 1-based page and card
/// numbers, unique across a multi-document batch.
fn card_identifier(stem: &str, page_number: u16, card_index: u32) -> String {
    format!("{}_page_{}_card_{}", stem, page_number, card_index)
}

fn document_stem(document: &Path) -> String {
    document
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}
