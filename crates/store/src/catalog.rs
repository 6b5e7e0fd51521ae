//! Generation-record catalog: one JSON file listing every experience
//! this installation has produced, newest first.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use playforge_core::compile::ModuleManifest;
use playforge_core::error::{Error, StoreError};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

const MAX_RECORDS: usize = 200;

/// One finished generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub book_id: String,
    pub title: String,
    pub summary: String,
    pub module_count: usize,
    pub modules: Vec<ModuleManifest>,
    pub skill_count: usize,
    pub entry_count: usize,
    pub question_count: usize,
    /// Directory the module artifacts were written under.
    pub artifact_dir: PathBuf,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    records: Vec<GenerationRecord>,
}

pub struct GenerationCatalog {
    path: PathBuf,
    state: Mutex<Vec<GenerationRecord>>,
}

impl GenerationCatalog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(raw) => {
                let file: CatalogFile = serde_json::from_str(&raw)
                    .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;
                file.records
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StoreError::Io(format!("{}: {e}", path.display())).into()),
        };
        debug!(path = %path.display(), count = records.len(), "generation catalog loaded");
        Ok(Self { path, state: Mutex::new(records) })
    }

    /// Prepend a record and rewrite the file atomically.
    pub async fn record(&self, record: GenerationRecord) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.retain(|existing| existing.book_id != record.book_id);
        state.insert(0, record);
        state.truncate(MAX_RECORDS);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(format!("{}: {e}", parent.display())))?;
        }
        let raw = serde_json::to_string_pretty(&CatalogFile { records: state.clone() })
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", self.path.display())))?;
        Ok(())
    }

    pub async fn records(&self) -> Vec<GenerationRecord> {
        self.state.lock().await.clone()
    }
}
