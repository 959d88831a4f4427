//! Document store
//!
//! Persists the whole document as one pretty-printed JSON file. Saves go to a
//! temporary file in the same directory which then replaces the target, so a
//! concurrent reader only ever sees the old or the new document.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::domain::document::Document;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored bytes do not parse or break the document schema
    #[error("document at {} is corrupt: {reason}", .path.display())]
    CorruptDocument { path: PathBuf, reason: String },

    #[error("failed to read document at {}: {source}", .path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write document to {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// File-backed document store
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted document
    ///
    /// A missing file is an empty board, not an error.
    ///
    /// # Errors
    /// - `CorruptDocument` when the file does not parse or breaks the schema
    /// - `ReadFailure` on I/O errors other than the file being absent
    pub fn load(&self) -> Result<Document, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No document yet, starting empty");
                return Ok(Document::default());
            }
            Err(source) => {
                return Err(StoreError::ReadFailure {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let document = decode(&bytes, &self.path)?;
        tracing::debug!(
            path = %self.path.display(),
            pipelines = document.pipeline_count(),
            issues = document.issues.len(),
            "Loaded document"
        );
        Ok(document)
    }

    /// Atomically replace the persisted document
    ///
    /// The caller is responsible for handing over a validated document.
    pub fn save(&self, document: &Document) -> Result<(), StoreError> {
        let bytes = encode(document).map_err(|err| self.write_failure(io::Error::other(err)))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|err| self.write_failure(err))?;

        let mut file = NamedTempFile::new_in(dir).map_err(|err| self.write_failure(err))?;
        file.write_all(&bytes)
            .and_then(|_| file.as_file().sync_all())
            .map_err(|err| self.write_failure(err))?;
        file.persist(&self.path)
            .map_err(|err| self.write_failure(err.error))?;

        tracing::info!(
            path = %self.path.display(),
            bytes = bytes.len(),
            "Saved document"
        );
        Ok(())
    }

    /// Byte-exact copy of the persisted document for backup or download
    ///
    /// Goes through `load`, so a corrupt store is reported instead of exported.
    pub fn export_snapshot(&self) -> Result<Vec<u8>, StoreError> {
        let document = self.load()?;
        encode(&document).map_err(|err| StoreError::CorruptDocument {
            path: self.path.clone(),
            reason: err.to_string(),
        })
    }

    fn write_failure(&self, source: io::Error) -> StoreError {
        StoreError::WriteFailure {
            path: self.path.clone(),
            source,
        }
    }
}

/// Serialize a document in its persisted form
pub fn encode(document: &Document) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec_pretty(document)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse persisted bytes, applying the structural schema checks
///
/// `origin` only labels errors.
pub fn decode(bytes: &[u8], origin: &Path) -> Result<Document, StoreError> {
    let corrupt = |reason: String| StoreError::CorruptDocument {
        path: origin.to_path_buf(),
        reason,
    };

    let mut document: Document =
        serde_json::from_slice(bytes).map_err(|err| corrupt(err.to_string()))?;
    document
        .check_structure()
        .map_err(|err| corrupt(err.to_string()))?;
    document.assign_missing_issue_ids();
    Ok(document)
}
