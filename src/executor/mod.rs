//! Transfer executor capability
//!
//! One trait, two variants selected by configuration at construction time:
//! live transfers quote through the routing provider and record a pending
//! ledger entry for the poller to resolve; demo transfers run entirely
//! through the simulator. Call sites never branch on the mode.

use crate::error::{OmniPayError, OmniPayResult};
use crate::ledger::Ledger;
use crate::model::{LedgerEntryInput, LedgerStatus, PaymentIntent, Route, PENDING_HASH};
use crate::quote::RouteClient;
use crate::simulator::{SimulationRequest, TransactionSimulator};

use async_trait::async_trait;
use std::sync::Arc;

/// A transfer the UI wants executed
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub amount: f64,
    pub token: String,
    pub source_chain: String,
    pub dest_chain: String,
    pub source_address: String,
    pub dest_address: String,
    pub usd_value: Option<f64>,
}

fn default_kind() -> String {
    "send".to_string()
}

/// Outcome handed back to the UI after the executor has done its part
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    pub id: Option<String>,
    pub status: LedgerStatus,
    pub transaction_hash: String,
}

#[async_trait]
pub trait TransferExecutor: Send + Sync {
    /// Price a payment intent
    async fn quote_route(&self, intent: &PaymentIntent) -> OmniPayResult<Route>;

    /// Execute a transfer and record its outcome in the ledger
    async fn execute_transfer(&self, request: TransferRequest) -> OmniPayResult<TransferOutcome>;
}

/// Live variant: real quotes, pending ledger record; resolution is the
/// status poller's job once the wallet has broadcast the transaction.
pub struct LiveExecutor {
    client: Arc<RouteClient>,
    ledger: Arc<Ledger>,
}

impl LiveExecutor {
    pub fn new(client: Arc<RouteClient>, ledger: Arc<Ledger>) -> Self {
        Self { client, ledger }
    }
}

#[async_trait]
impl TransferExecutor for LiveExecutor {
    async fn quote_route(&self, intent: &PaymentIntent) -> OmniPayResult<Route> {
        self.client.get_quote(intent).await
    }

    async fn execute_transfer(&self, request: TransferRequest) -> OmniPayResult<TransferOutcome> {
        if request.amount <= 0.0 {
            return Err(OmniPayError::InvalidRequest(
                "amount must be positive".to_string(),
            ));
        }

        let chain = if request.source_chain == request.dest_chain {
            request.source_chain.clone()
        } else {
            format!("{} -> {}", request.source_chain, request.dest_chain)
        };

        let id = self
            .ledger
            .record(LedgerEntryInput {
                kind: request.kind,
                amount: request.amount,
                token: request.token,
                usd_value: request.usd_value.unwrap_or(request.amount),
                from_address: request.source_address,
                to_address: request.dest_address,
                chain,
                details: None,
            })
            .await;

        Ok(TransferOutcome {
            id,
            status: LedgerStatus::Processing,
            transaction_hash: PENDING_HASH.to_string(),
        })
    }
}

/// Demo variant: quotes still come from the provider; execution is fully
/// simulated, terminal status included.
pub struct DemoExecutor {
    client: Arc<RouteClient>,
    simulator: TransactionSimulator,
}

impl DemoExecutor {
    pub fn new(client: Arc<RouteClient>, simulator: TransactionSimulator) -> Self {
        Self { client, simulator }
    }
}

#[async_trait]
impl TransferExecutor for DemoExecutor {
    async fn quote_route(&self, intent: &PaymentIntent) -> OmniPayResult<Route> {
        self.client.get_quote(intent).await
    }

    async fn execute_transfer(&self, request: TransferRequest) -> OmniPayResult<TransferOutcome> {
        if request.amount <= 0.0 {
            return Err(OmniPayError::InvalidRequest(
                "amount must be positive".to_string(),
            ));
        }

        let outcome = self
            .simulator
            .simulate(SimulationRequest {
                kind: request.kind,
                amount: request.amount,
                token: request.token,
                source_chain: request.source_chain,
                dest_chain: request.dest_chain,
                source_address: request.source_address,
                dest_address: request.dest_address,
            })
            .await;

        Ok(TransferOutcome {
            id: outcome.id,
            status: outcome.status,
            transaction_hash: outcome.transaction_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderConfig, SimulatorConfig};
    use crate::ledger::MemoryStore;

    fn ledger() -> Arc<Ledger> {
        Arc::new(Ledger::new(Arc::new(MemoryStore::new()), 100))
    }

    fn client() -> Arc<RouteClient> {
        Arc::new(RouteClient::new(
            ProviderConfig {
                base_url: "https://li.quest/v1".to_string(),
                integrator: "omnipay".to_string(),
                api_key: None,
                request_timeout_ms: 1_000,
            },
            true,
        ))
    }

    fn request() -> TransferRequest {
        TransferRequest {
            kind: "send".to_string(),
            amount: 5.0,
            token: "USDC".to_string(),
            source_chain: "ethereum".to_string(),
            dest_chain: "ethereum".to_string(),
            source_address: "0xA".to_string(),
            dest_address: "0xB".to_string(),
            usd_value: None,
        }
    }

    #[tokio::test]
    async fn test_live_executor_records_pending_entry() {
        let ledger = ledger();
        let exec = LiveExecutor::new(client(), ledger.clone());

        let outcome = exec.execute_transfer(request()).await.unwrap();
        assert_eq!(outcome.status, LedgerStatus::Processing);
        assert_eq!(outcome.transaction_hash, PENDING_HASH);

        let entries = ledger.list().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, outcome.id.unwrap());
        assert_eq!(entries[0].chain, "ethereum");
    }

    #[tokio::test]
    async fn test_demo_executor_resolves_terminally() {
        let ledger = ledger();
        let sim = TransactionSimulator::new(
            ledger.clone(),
            SimulatorConfig {
                min_delay_ms: 1,
                max_delay_ms: 2,
                success_ratio: 1.0,
            },
        );
        let exec = DemoExecutor::new(client(), sim);

        let outcome = exec.execute_transfer(request()).await.unwrap();
        assert_eq!(outcome.status, LedgerStatus::Completed);
        assert_eq!(ledger.list().await[0].status, LedgerStatus::Completed);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount() {
        let exec = LiveExecutor::new(client(), ledger());
        let mut bad = request();
        bad.amount = 0.0;
        assert!(matches!(
            exec.execute_transfer(bad).await,
            Err(OmniPayError::InvalidRequest(_))
        ));
    }
}
