use crate::models::{FaceEmbedding, VoterRecord};
use crate::utils::RollScanError;
use log::info;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const RECORDS_FILE: &str = "voter_records.json";
const EMBEDDINGS_FILE: &str = "face_embeddings.json";

/// Persists extraction output so detection and reporting can run without
/// re-processing the source PDFs. Records and face embeddings are stored in
/// separate files: records stay small and human-inspectable while the
/// embedding table carries the bulk of the data.
pub struct VoterStore {
    dir: PathBuf,
}

impl VoterStore {
    pub fn new(dir: &Path) -> Self {
        VoterStore {
            dir: dir.to_path_buf(),
        }
    }

    pub fn records_path(&self) -> PathBuf {
        self.dir.join(RECORDS_FILE)
    }

    pub fn embeddings_path(&self) -> PathBuf {
        self.dir.join(EMBEDDINGS_FILE)
    }

    pub fn save(&self, records: &[VoterRecord]) -> Result<(), RollScanError> {
        std::fs::create_dir_all(&self.dir)?;

        // Embeddings go to their own table keyed by card id; the record file
        // skips them on serialization.
        let embeddings: BTreeMap<&str, &Vec<f32>> = records
            .iter()
            .filter_map(|r| {
                r.face_embedding
                    .as_ref()
                    .map(|e| (r.card_id.as_str(), &e.0))
            })
            .collect();

        let records_file = BufWriter::new(File::create(self.records_path())?);
        serde_json::to_writer_pretty(records_file, records)?;

        let embeddings_file = BufWriter::new(File::create(self.embeddings_path())?);
        serde_json::to_writer(embeddings_file, &embeddings)?;

        info!(
            "saved {} voter records ({} with embeddings) to {}",
            records.len(),
            embeddings.len(),
            self.dir.display()
        );
        Ok(())
    }

    pub fn load(&self) -> Result<Vec<VoterRecord>, RollScanError> {
        let records_file = BufReader::new(File::open(self.records_path()).map_err(|e| {
            RollScanError::Storage(format!(
                "cannot open {}: {}",
                self.records_path().display(),
                e
            ))
        })?);
        let mut records: Vec<VoterRecord> = serde_json::from_reader(records_file)?;

        let mut embeddings: BTreeMap<String, Vec<f32>> = match File::open(self.embeddings_path()) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))?,
            // A store written before any embeddings existed has no table.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(RollScanError::Storage(format!(
                    "cannot open {}: {}",
                    self.embeddings_path().display(),
                    e
                )))
            }
        };

        for record in records.iter_mut() {
            if let Some(values) = embeddings.remove(&record.card_id) {
                record.face_embedding = Some(FaceEmbedding(values));
            }
        }

        info!(
            "loaded {} voter records from {}",
            records.len(),
            self.dir.display()
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, FACE_EMBEDDING_LEN};

    fn sample_records() -> Vec<VoterRecord> {
        let mut first = VoterRecord::new("roll_page_3_card_1");
        first.name = Some("रमेश कुमार".to_string());
        first.father_husband_name = Some("सुरेश कुमार".to_string());
        first.house_number = Some("12".to_string());
        first.age = Some(35);
        first.gender = Some(Gender::Male);
        first.face_embedding = Some(FaceEmbedding(vec![0.25; FACE_EMBEDDING_LEN]));
        first.photo_hash = Some(0xDEAD_BEEF);

        let mut second = VoterRecord::new("roll_page_3_card_2");
        second.name = Some("सीता देवी".to_string());

        vec![first, second]
    }

    #[test]
    fn save_then_load_round_trips_records_and_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        let store = VoterStore::new(dir.path());
        let records = sample_records();

        store.save(&records).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].card_id, "roll_page_3_card_1");
        assert_eq!(loaded[0].name.as_deref(), Some("रमेश कुमार"));
        assert_eq!(loaded[0].age, Some(35));
        assert_eq!(loaded[0].photo_hash, Some(0xDEAD_BEEF));
        assert_eq!(
            loaded[0].face_embedding,
            Some(FaceEmbedding(vec![0.25; FACE_EMBEDDING_LEN]))
        );
        assert_eq!(loaded[1].face_embedding, None);
    }

    #[test]
    fn embeddings_are_not_in_the_record_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = VoterStore::new(dir.path());
        store.save(&sample_records()).unwrap();

        let raw = std::fs::read_to_string(store.records_path()).unwrap();
        assert!(!raw.contains("face_embedding"));
        let embeddings_raw = std::fs::read_to_string(store.embeddings_path()).unwrap();
        assert!(embeddings_raw.contains("roll_page_3_card_1"));
    }

    #[test]
    fn loading_a_missing_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = VoterStore::new(&dir.path().join("nowhere"));
        assert!(matches!(
            store.load(),
            Err(RollScanError::Storage(_))
        ));
    }

    #[test]
    fn missing_embedding_table_loads_records_without_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        let store = VoterStore::new(dir.path());
        store.save(&sample_records()).unwrap();
        std::fs::remove_file(store.embeddings_path()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|r| r.face_embedding.is_none()));
    }
}
