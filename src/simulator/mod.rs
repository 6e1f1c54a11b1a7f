//! Transaction simulator for demo mode
//!
//! When no real chain is reachable the simulator manufactures plausible
//! transactions through the same ledger interface real transfers use. The
//! latency window, success ratio, and USD price table are demo heuristics,
//! not production modelling.

use crate::config::SimulatorConfig;
use crate::ledger::Ledger;
use crate::metrics;
use crate::model::{LedgerEntryInput, LedgerStatus, FAILED_HASH};

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Static USD approximation for display purposes only
fn usd_price(token: &str) -> f64 {
    match token.to_ascii_uppercase().as_str() {
        "USDC" => 1.0,
        "ETH" => 3500.0,
        "MATIC" => 0.9,
        _ => 1.0,
    }
}

/// Parameters of a simulated transfer
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub kind: String,
    pub amount: f64,
    pub token: String,
    pub source_chain: String,
    pub dest_chain: String,
    pub source_address: String,
    pub dest_address: String,
}

/// Result of a simulated transfer. Failure is a modeled business outcome,
/// not an error path.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    /// Ledger id, absent when the advisory ledger write failed
    pub id: Option<String>,
    pub status: LedgerStatus,
    pub transaction_hash: String,
}

pub struct TransactionSimulator {
    ledger: Arc<Ledger>,
    config: SimulatorConfig,
}

impl TransactionSimulator {
    pub fn new(ledger: Arc<Ledger>, config: SimulatorConfig) -> Self {
        Self { ledger, config }
    }

    /// Run one simulated transfer end to end: record a pending entry, wait
    /// out a randomized confirmation latency, then resolve to a terminal
    /// status. Never returns an error.
    pub async fn simulate(&self, request: SimulationRequest) -> SimulationOutcome {
        let usd_value = request.amount * usd_price(&request.token);
        let chain = if request.source_chain == request.dest_chain {
            request.source_chain.clone()
        } else {
            format!("{} -> {}", request.source_chain, request.dest_chain)
        };

        let id = self
            .ledger
            .record(LedgerEntryInput {
                kind: request.kind.clone(),
                amount: request.amount,
                token: request.token.clone(),
                usd_value,
                from_address: request.source_address.clone(),
                to_address: request.dest_address.clone(),
                chain,
                details: Some(format!(
                    "Simulated {} of {} {}",
                    request.kind, request.amount, request.token
                )),
            })
            .await;

        let (delay, succeeded, hash) = {
            let mut rng = rand::rng();
            let delay = rng.random_range(self.config.min_delay_ms..self.config.max_delay_ms);
            let succeeded = rng.random::<f64>() < self.config.success_ratio;
            let hash = if succeeded {
                let mut bytes = [0u8; 32];
                rng.fill(&mut bytes[..]);
                format!("0x{}", hex::encode(bytes))
            } else {
                FAILED_HASH.to_string()
            };
            (delay, succeeded, hash)
        };

        debug!(delay_ms = delay, "Simulating confirmation latency");
        tokio::time::sleep(Duration::from_millis(delay)).await;

        let status = if succeeded {
            LedgerStatus::Completed
        } else {
            LedgerStatus::Failed
        };

        if let Some(id) = &id {
            self.ledger.update_status(id, status, Some(&hash)).await;
        }

        metrics::record_simulation(if succeeded { "completed" } else { "failed" });
        info!(?status, tx_hash = %hash, "Simulated transfer resolved");

        SimulationOutcome {
            id,
            status,
            transaction_hash: hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryStore;

    fn fast_config(success_ratio: f64) -> SimulatorConfig {
        SimulatorConfig {
            min_delay_ms: 1,
            max_delay_ms: 2,
            success_ratio,
        }
    }

    fn request() -> SimulationRequest {
        SimulationRequest {
            kind: "send".to_string(),
            amount: 2.0,
            token: "ETH".to_string(),
            source_chain: "ethereum".to_string(),
            dest_chain: "polygon".to_string(),
            source_address: "0xA".to_string(),
            dest_address: "0xB".to_string(),
        }
    }

    fn simulator(success_ratio: f64) -> (TransactionSimulator, Arc<Ledger>) {
        let ledger = Arc::new(Ledger::new(Arc::new(MemoryStore::new()), 100));
        (
            TransactionSimulator::new(ledger.clone(), fast_config(success_ratio)),
            ledger,
        )
    }

    #[test]
    fn test_usd_price_table() {
        assert_eq!(usd_price("USDC"), 1.0);
        assert_eq!(usd_price("eth"), 3500.0);
        assert_eq!(usd_price("MATIC"), 0.9);
        assert_eq!(usd_price("SOMETOKEN"), 1.0);
    }

    #[tokio::test]
    async fn test_always_successful_run() {
        let (sim, ledger) = simulator(1.0);
        let outcome = sim.simulate(request()).await;

        assert_eq!(outcome.status, LedgerStatus::Completed);
        assert!(outcome.transaction_hash.starts_with("0x"));
        assert_eq!(outcome.transaction_hash.len(), 66);

        let entries = ledger.list().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, outcome.id.unwrap());
        assert_eq!(entries[0].status, LedgerStatus::Completed);
        assert_eq!(entries[0].transaction_hash, outcome.transaction_hash);
        assert_eq!(entries[0].usd_value, 7000.0);
        assert_eq!(entries[0].chain, "ethereum -> polygon");
    }

    #[tokio::test]
    async fn test_always_failing_run() {
        let (sim, ledger) = simulator(0.0);
        let outcome = sim.simulate(request()).await;

        assert_eq!(outcome.status, LedgerStatus::Failed);
        assert_eq!(outcome.transaction_hash, FAILED_HASH);

        let entries = ledger.list().await;
        assert_eq!(entries[0].status, LedgerStatus::Failed);
        assert_eq!(entries[0].transaction_hash, FAILED_HASH);
    }

    #[tokio::test]
    async fn test_entry_never_left_processing() {
        let (sim, ledger) = simulator(0.5);
        for _ in 0..10 {
            sim.simulate(request()).await;
        }
        assert!(ledger
            .list()
            .await
            .iter()
            .all(|e| e.status != LedgerStatus::Processing));
    }
}
