//! Append-only JSON audit trail of ingested batches.
//!
//! The file holds a single JSON array; each append reloads it, pushes one
//! `{log_timestamp, batch}` record and atomically replaces the file. Records
//! already present are carried over as-is.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::MetalsError;
use crate::scrapers::PriceObservation;

#[derive(Debug, Serialize)]
struct AuditEntry<'a> {
    log_timestamp: DateTime<Utc>,
    batch: &'a [PriceObservation],
}

pub struct AuditLog {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, batch: &[PriceObservation]) -> Result<(), MetalsError> {
        let _guard = self.lock.lock().await;

        let mut entries = self.load().await?;
        let entry = AuditEntry {
            log_timestamp: Utc::now(),
            batch,
        };
        entries.push(serde_json::to_value(&entry).map_err(|e| MetalsError::Audit(e.to_string()))?);

        let serialized =
            serde_json::to_vec_pretty(&entries).map_err(|e| MetalsError::Audit(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, serialized)
            .await
            .map_err(|e| MetalsError::Audit(format!("write {}: {}", tmp_path.display(), e)))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| MetalsError::Audit(format!("replace {}: {}", self.path.display(), e)))?;

        tracing::debug!(
            path = %self.path.display(),
            records = entries.len(),
            "Appended batch of {} observations to audit log",
            batch.len()
        );
        Ok(())
    }

    /// Existing records; a missing or blank file is an empty log. Anything
    /// that is not a JSON array is refused rather than overwritten.
    async fn load(&self) -> Result<Vec<Value>, MetalsError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => serde_json::from_slice::<Vec<Value>>(&bytes).map_err(|e| {
                MetalsError::Audit(format!(
                    "{} is not a JSON array, refusing to overwrite: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(MetalsError::Audit(format!("read {}: {}", self.path.display(), e))),
        }
    }
}
