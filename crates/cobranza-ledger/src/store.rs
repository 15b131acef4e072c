//! File-based ledger store — JSON array on disk, human-readable.
//! Only written on mutations, never on reads.

use std::path::{Path, PathBuf};

use crate::record::NotificationRecord;
use cobranza_core::{CobranzaError, Result};

/// Persists the full record collection as `notifications.json`.
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    /// Create a store under the given directory.
    pub fn new(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        Self {
            path: dir.join("notifications.json"),
        }
    }

    /// Default store directory (~/.cobranza/logs).
    pub fn default_dir() -> PathBuf {
        cobranza_core::CobranzaConfig::home_dir().join("logs")
    }

    /// Write the whole collection, newest-first as held in memory.
    pub fn save(&self, records: &[NotificationRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| CobranzaError::Ledger(format!("serialize: {e}")))?;
        std::fs::write(&self.path, &json)
            .map_err(|e| CobranzaError::Ledger(format!("write {}: {e}", self.path.display())))?;
        tracing::debug!("Saved {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Load the collection; missing or corrupt files yield an empty log.
    pub fn load(&self) -> Vec<NotificationRecord> {
        if !self.path.exists() {
            return Vec::new();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse notifications.json: {e}");
                Vec::new()
            }),
            Err(e) => {
                tracing::warn!("Failed to read notifications.json: {e}");
                Vec::new()
            }
        }
    }
}
