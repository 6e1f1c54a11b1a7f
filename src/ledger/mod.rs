//! Local transaction ledger
//!
//! Best-effort, bounded history of initiated transactions. Storage is the
//! single source of truth: every read re-derives from the store and every
//! write rewrites the whole document. Write failures degrade to a logged
//! no-op, never to a caller-facing error, because the ledger must not be
//! able to block a payment.

mod store;

pub use store::{FileStore, LedgerStore, MemoryStore};

use crate::metrics;
use crate::model::{LedgerEntry, LedgerEntryInput, LedgerStatus, PENDING_HASH};

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

/// Change notification emitted after every successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Recorded { id: String },
    Updated { id: String },
}

pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    capacity: usize,
    /// Serializes read-modify-write cycles so queued writes cannot lose
    /// updates against each other
    write_lock: Mutex<()>,
    events: broadcast::Sender<LedgerEvent>,
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            store,
            capacity,
            write_lock: Mutex::new(()),
            events,
        }
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Record a new entry in `Processing` state with the placeholder hash.
    ///
    /// Returns the generated id, or `None` if persistence failed.
    pub async fn record(&self, input: LedgerEntryInput) -> Option<String> {
        let id = generate_id();
        let entry = LedgerEntry {
            id: id.clone(),
            kind: input.kind,
            status: LedgerStatus::Processing,
            amount: input.amount,
            token: input.token,
            usd_value: input.usd_value,
            from_address: input.from_address,
            to_address: input.to_address,
            chain: input.chain,
            transaction_hash: PENDING_HASH.to_string(),
            details: input.details,
            created_at: Utc::now(),
        };

        let _guard = self.write_lock.lock().await;

        let mut entries = match self.store.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Ledger read failed, dropping record");
                metrics::record_ledger_write("error");
                return None;
            }
        };

        entries.insert(0, entry);
        entries.truncate(self.capacity);

        match self.store.persist(&entries).await {
            Ok(()) => {
                metrics::record_ledger_write("ok");
                let _ = self.events.send(LedgerEvent::Recorded { id: id.clone() });
                debug!(%id, "Ledger entry recorded");
                Some(id)
            }
            Err(e) => {
                warn!(error = %e, "Ledger write failed, entry dropped");
                metrics::record_ledger_write("error");
                None
            }
        }
    }

    /// Replace the status (and hash, when given) of an entry in place.
    ///
    /// An unknown id is a no-op: the entry may simply have been evicted by
    /// the capacity bound.
    pub async fn update_status(
        &self,
        id: &str,
        status: LedgerStatus,
        transaction_hash: Option<&str>,
    ) {
        let _guard = self.write_lock.lock().await;

        let mut entries = match self.store.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Ledger read failed, dropping status update");
                metrics::record_ledger_write("error");
                return;
            }
        };

        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            debug!(%id, "Ledger entry not found for status update (evicted?)");
            return;
        };

        entry.status = status;
        if let Some(hash) = transaction_hash {
            entry.transaction_hash = hash.to_string();
        }

        match self.store.persist(&entries).await {
            Ok(()) => {
                metrics::record_ledger_write("ok");
                let _ = self.events.send(LedgerEvent::Updated { id: id.to_string() });
                debug!(%id, ?status, "Ledger entry updated");
            }
            Err(e) => {
                warn!(error = %e, "Ledger write failed, status update dropped");
                metrics::record_ledger_write("error");
            }
        }
    }

    /// Health check: verifies the backing store is readable
    pub async fn health_check(&self) -> bool {
        self.store.load().await.is_ok()
    }

    /// Current history, newest first. Pure read of the store.
    pub async fn list(&self) -> Vec<LedgerEntry> {
        match self.store.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Ledger read failed, returning empty history");
                Vec::new()
            }
        }
    }
}

/// Millisecond timestamp plus a random suffix: sortable, and collisions are
/// negligible within a 100-entry window
fn generate_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::store::FailingStore;
    use super::*;
    use crate::model::LedgerEntryInput;

    fn input(kind: &str, amount: f64) -> LedgerEntryInput {
        LedgerEntryInput {
            kind: kind.to_string(),
            amount,
            token: "USDC".to_string(),
            usd_value: amount,
            from_address: "0xA".to_string(),
            to_address: "0xB".to_string(),
            chain: "ethereum".to_string(),
            details: None,
        }
    }

    fn memory_ledger() -> Ledger {
        Ledger::new(Arc::new(MemoryStore::new()), 100)
    }

    #[tokio::test]
    async fn test_record_then_list_newest_first() {
        let ledger = memory_ledger();
        ledger.record(input("send", 1.0)).await.unwrap();
        let id = ledger.record(input("send", 2.0)).await.unwrap();

        let entries = ledger.list().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, id);
        assert_eq!(entries[0].amount, 2.0);
        assert_eq!(entries[0].status, LedgerStatus::Processing);
        assert_eq!(entries[0].transaction_hash, PENDING_HASH);
    }

    #[tokio::test]
    async fn test_capacity_bound_evicts_oldest() {
        let ledger = memory_ledger();
        let first = ledger.record(input("send", 0.0)).await.unwrap();
        for i in 1..=100 {
            ledger.record(input("send", i as f64)).await.unwrap();
        }

        let entries = ledger.list().await;
        assert_eq!(entries.len(), 100);
        assert_eq!(entries[0].amount, 100.0);
        assert!(entries.iter().all(|e| e.id != first));
        // Newest-first order preserved across the eviction
        assert_eq!(entries[99].amount, 1.0);
    }

    #[tokio::test]
    async fn test_update_status_in_place() {
        let ledger = memory_ledger();
        ledger.record(input("send", 1.0)).await.unwrap();
        let id = ledger.record(input("bridge", 2.0)).await.unwrap();

        ledger
            .update_status(&id, LedgerStatus::Completed, Some("0xdeadbeef"))
            .await;

        let entries = ledger.list().await;
        assert_eq!(entries[0].status, LedgerStatus::Completed);
        assert_eq!(entries[0].transaction_hash, "0xdeadbeef");
        // All other fields untouched
        assert_eq!(entries[0].kind, "bridge");
        assert_eq!(entries[0].amount, 2.0);
        // The other entry untouched
        assert_eq!(entries[1].status, LedgerStatus::Processing);
    }

    #[tokio::test]
    async fn test_update_status_without_hash_keeps_placeholder() {
        let ledger = memory_ledger();
        let id = ledger.record(input("send", 1.0)).await.unwrap();
        ledger.update_status(&id, LedgerStatus::Failed, None).await;

        let entries = ledger.list().await;
        assert_eq!(entries[0].status, LedgerStatus::Failed);
        assert_eq!(entries[0].transaction_hash, PENDING_HASH);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_noop() {
        let ledger = memory_ledger();
        ledger.record(input("send", 1.0)).await.unwrap();
        let before = ledger.list().await;

        ledger
            .update_status("0-missing", LedgerStatus::Completed, Some("0x1"))
            .await;

        let after = ledger.list().await;
        assert_eq!(before.len(), after.len());
        assert_eq!(after[0].status, LedgerStatus::Processing);
    }

    #[tokio::test]
    async fn test_write_failure_is_silent() {
        let ledger = Ledger::new(Arc::new(FailingStore), 100);
        assert!(ledger.record(input("send", 1.0)).await.is_none());
        assert!(ledger.list().await.is_empty());
        // update_status on a failing store must not panic either
        ledger.update_status("any", LedgerStatus::Failed, None).await;
    }

    #[tokio::test]
    async fn test_notifications_per_write() {
        let ledger = memory_ledger();
        let mut events = ledger.subscribe();

        let id = ledger.record(input("send", 1.0)).await.unwrap();
        ledger
            .update_status(&id, LedgerStatus::Completed, Some("0x1"))
            .await;

        assert_eq!(events.recv().await.unwrap(), LedgerEvent::Recorded { id: id.clone() });
        assert_eq!(events.recv().await.unwrap(), LedgerEvent::Updated { id });
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_write_emits_no_notification() {
        let ledger = Ledger::new(Arc::new(FailingStore), 100);
        let mut events = ledger.subscribe();
        ledger.record(input("send", 1.0)).await;
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_generated_ids_unique() {
        let ids: std::collections::HashSet<String> = (0..1000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
