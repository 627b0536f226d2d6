//! Record table — durable append/read of fixed-schema rows.
//!
//! One JSON object per line in `table.jsonl`. Append order is display
//! order; rows are never updated or deleted. Writers are expected to be
//! serialized by the caller — this store does no cross-process locking,
//! and interleaved appends from multiple writers would corrupt lines.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;

/// Placeholder stored for any field the user skipped or left blank.
/// User-facing, shown verbatim in table output.
pub const MISSING: &str = "Отсутствует";

/// One completed dialogue row. All four fields are always present; a
/// skipped field holds [`MISSING`] rather than an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub address: String,
    pub password: String,
    pub note: String,
}

/// File-backed append-only record table.
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file (and parent directory) on
    /// first write.
    pub fn append(&self, record: &Record) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Storage(format!("cannot create {}: {e}", parent.display())))?;
        }
        let line = serde_json::to_string(record)
            .map_err(|e| AppError::Storage(format!("serialise record: {e}")))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::Storage(format!("cannot open {}: {e}", self.path.display())))?;
        writeln!(file, "{line}")
            .map_err(|e| AppError::Storage(format!("cannot write {}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), "record appended");
        Ok(())
    }

    /// All records in append order. A missing file is an empty table,
    /// not an error.
    pub fn load_all(&self) -> Result<Vec<Record>, AppError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };
        data.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| {
                serde_json::from_str(l)
                    .map_err(|e| AppError::Storage(format!("malformed row in {}: {e}", self.path.display())))
            })
            .collect()
    }
}
