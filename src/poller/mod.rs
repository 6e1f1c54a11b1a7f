//! On-demand transfer status polling
//!
//! There is no background scheduler: polls happen when the UI asks (page
//! load, explicit refresh, a UI-side timer). Each poll is one provider
//! status call. Cadence, dedup, and backoff are the caller's problem; this
//! component guarantees only that repeated polls are safe and that terminal
//! results stay terminal.

use crate::error::OmniPayResult;
use crate::ledger::Ledger;
use crate::model::{LedgerStatus, TransferState, TransferStatus, TransferStatusQuery};
use crate::quote::RouteClient;

use std::sync::Arc;
use tracing::debug;

pub struct StatusPoller {
    client: Arc<RouteClient>,
}

impl StatusPoller {
    pub fn new(client: Arc<RouteClient>) -> Self {
        Self { client }
    }

    /// One status check. Idempotent; callers should stop polling once the
    /// returned status `is_terminal()`.
    pub async fn poll_once(&self, query: &TransferStatusQuery) -> OmniPayResult<TransferStatus> {
        self.client.get_transfer_status(query).await
    }

    /// Poll once and, if the result is terminal, fold it into the ledger
    /// entry. Non-terminal results leave the ledger untouched.
    pub async fn reconcile(
        &self,
        ledger: &Ledger,
        ledger_id: &str,
        query: &TransferStatusQuery,
    ) -> OmniPayResult<TransferStatus> {
        let status = self.poll_once(query).await?;

        if status.is_terminal() {
            let ledger_status = match status.state {
                TransferState::Completed => LedgerStatus::Completed,
                _ => LedgerStatus::Failed,
            };
            let hash = status
                .receiving_tx_hash
                .as_deref()
                .or(status.sending_tx_hash.as_deref());
            ledger.update_status(ledger_id, ledger_status, hash).await;
        } else {
            debug!(ledger_id, state = ?status.state, "Transfer not terminal yet");
        }

        Ok(status)
    }
}
