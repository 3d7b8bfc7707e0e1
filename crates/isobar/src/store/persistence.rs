//! Backing storage for the location document.
//!
//! [`JsonFilePersistence`] keeps the document as pretty-printed JSON on disk;
//! [`MemoryPersistence`] keeps it in process for tests and embedding.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

use crate::model::LocationDocument;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stored document is invalid: {0}")]
    Corrupt(String),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Load/save seam for the location document.
pub trait DocumentPersistence: Send + Sync {
    /// Returns `Ok(None)` when nothing has been written yet.
    fn load(&self) -> Result<Option<LocationDocument>, PersistenceError>;

    /// Replace the stored document. Readers never observe a partial write.
    fn save(&self, doc: &LocationDocument) -> Result<(), PersistenceError>;
}

/// Get the isobar home directory
pub fn get_isobar_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".isobar")
}

/// Default location of the document file
pub fn default_document_path() -> PathBuf {
    get_isobar_home().join("locations.json")
}

/// Stores the document as a JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl DocumentPersistence for JsonFilePersistence {
    fn load(&self) -> Result<Option<LocationDocument>, PersistenceError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        let doc: LocationDocument = serde_json::from_str(&content)?;
        Ok(Some(doc))
    }

    fn save(&self, doc: &LocationDocument) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(doc)?;
        let tmp = self.temp_path();
        {
            let mut f = fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp)?;
            f.write_all(content.as_bytes())?;
            f.write_all(b"\n")?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        log::debug!("[store] wrote {}", self.path.display());
        Ok(())
    }
}

/// In-memory document holder.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    doc: Mutex<Option<LocationDocument>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing document instead of the seed.
    pub fn with_document(doc: LocationDocument) -> Self {
        Self {
            doc: Mutex::new(Some(doc)),
        }
    }
}

impl DocumentPersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<LocationDocument>, PersistenceError> {
        Ok(self.doc.lock().map_err(|e| PersistenceError::Corrupt(e.to_string()))?.clone())
    }

    fn save(&self, doc: &LocationDocument) -> Result<(), PersistenceError> {
        *self.doc.lock().map_err(|e| PersistenceError::Corrupt(e.to_string()))? = Some(doc.clone());
        Ok(())
    }
}
