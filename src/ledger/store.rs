//! Storage port for the transaction ledger
//!
//! The ledger persists one JSON document holding the full ordered entry
//! sequence. Adapters only load and persist that whole document; all
//! ordering, bounding, and mutation logic lives in the ledger itself.

use crate::error::{OmniPayError, OmniPayResult};
use crate::model::LedgerEntry;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::warn;

/// Whole-document storage adapter for the ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the full entry sequence. Absent or corrupt storage reads as
    /// empty, never as an error.
    async fn load(&self) -> OmniPayResult<Vec<LedgerEntry>>;

    /// Replace the full entry sequence
    async fn persist(&self, entries: &[LedgerEntry]) -> OmniPayResult<()>;
}

/// File-backed adapter: one JSON document on disk
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl LedgerStore for FileStore {
    async fn load(&self) -> OmniPayResult<Vec<LedgerEntry>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(OmniPayError::Storage(format!(
                    "Failed to read ledger file {:?}: {}",
                    self.path, e
                )))
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // Corrupt history is dropped, not surfaced: the ledger is
                // advisory and the next write overwrites the document.
                warn!(path = ?self.path, error = %e, "Ledger document corrupt, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn persist(&self, entries: &[LedgerEntry]) -> OmniPayResult<()> {
        let encoded = serde_json::to_vec(entries)
            .map_err(|e| OmniPayError::Storage(format!("Failed to encode ledger: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    OmniPayError::Storage(format!("Failed to create ledger dir: {}", e))
                })?;
            }
        }

        tokio::fs::write(&self.path, encoded).await.map_err(|e| {
            OmniPayError::Storage(format!("Failed to write ledger file {:?}: {}", self.path, e))
        })
    }
}

/// In-memory adapter for tests and demo deployments
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<Vec<LedgerEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load(&self) -> OmniPayResult<Vec<LedgerEntry>> {
        Ok(self.entries.read().await.clone())
    }

    async fn persist(&self, entries: &[LedgerEntry]) -> OmniPayResult<()> {
        *self.entries.write().await = entries.to_vec();
        Ok(())
    }
}

/// Adapter that rejects every write; used to test the silent-failure policy
#[cfg(test)]
pub struct FailingStore;

#[cfg(test)]
#[async_trait]
impl LedgerStore for FailingStore {
    async fn load(&self) -> OmniPayResult<Vec<LedgerEntry>> {
        Ok(Vec::new())
    }

    async fn persist(&self, _entries: &[LedgerEntry]) -> OmniPayResult<()> {
        Err(OmniPayError::Storage("write rejected".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LedgerStatus, PENDING_HASH};
    use chrono::Utc;

    fn entry(id: &str) -> LedgerEntry {
        LedgerEntry {
            id: id.to_string(),
            kind: "send".to_string(),
            status: LedgerStatus::Processing,
            amount: 5.0,
            token: "USDC".to_string(),
            usd_value: 5.0,
            from_address: "0xA".to_string(),
            to_address: "0xB".to_string(),
            chain: "ethereum".to_string(),
            transaction_hash: PENDING_HASH.to_string(),
            details: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("ledger.json"));

        assert!(store.load().await.unwrap().is_empty());

        store.persist(&[entry("a"), entry("b")]).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "a");
    }

    #[tokio::test]
    async fn test_file_store_corrupt_document_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        tokio::fs::write(&path, b"{not json]").await.unwrap();

        let store = FileStore::new(&path);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().await.unwrap().is_empty());
        store.persist(&[entry("x")]).await.unwrap();
        assert_eq!(store.load().await.unwrap()[0].id, "x");
    }
}
