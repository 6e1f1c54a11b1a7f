//! Core data model for the payment flow
//!
//! These types cross three boundaries: the UI-facing HTTP API, the routing
//! provider wire format (translated in `quote::wire`), and the persisted
//! ledger document. Serialized field names use camelCase to match the
//! JSON shapes the front-end consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accept chain ids as JSON numbers or numeric strings; anything that does
/// not parse to an integer reads as absent and fails request validation.
fn de_chain_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse::<u64>().ok(),
    })
}

/// A payment the UI wants routed. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    #[serde(default, deserialize_with = "de_chain_id")]
    pub source_chain_id: Option<u64>,
    #[serde(default, deserialize_with = "de_chain_id")]
    pub dest_chain_id: Option<u64>,
    pub source_token: Option<String>,
    pub dest_token: Option<String>,
    pub source_address: Option<String>,
    /// Defaults to the source address when unspecified
    pub dest_address: Option<String>,
    pub source_amount: Option<String>,
    /// Fractional tolerance, defaults to 0.03
    pub slippage_tolerance: Option<f64>,
}

/// A priced route returned by the routing provider. Read-only after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub source_chain_id: u64,
    pub dest_chain_id: u64,
    pub source_token: String,
    pub dest_token: String,
    pub source_amount: String,
    pub dest_amount: String,
    pub estimated_gas: String,
    pub estimated_duration_seconds: u64,
    pub gas_fee: f64,
    pub bridge_fee: f64,
    pub total_fee: f64,
    pub exchange_rate: f64,
    pub steps: Vec<RouteStep>,
    pub provider: String,
    /// Raw provider route, passed back opaquely for execution
    pub provider_payload: serde_json::Value,
}

impl Route {
    /// Step continuity is a provider contract: each step's destination token
    /// should feed the next step's source token. Not enforced, only checked.
    pub fn steps_contiguous(&self) -> bool {
        self.steps
            .windows(2)
            .all(|pair| pair[0].dest_token == pair[1].source_token)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    pub id: String,
    pub kind: StepKind,
    pub source_token: String,
    pub dest_token: String,
    pub source_amount: String,
    pub dest_amount: String,
    pub protocol_name: String,
    pub estimated_duration_seconds: u64,
    pub gas_fee: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Swap,
    Bridge,
    Transfer,
}

/// Parameters for a transfer status check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferStatusQuery {
    #[serde(default, deserialize_with = "de_chain_id")]
    pub source_chain_id: Option<u64>,
    #[serde(default, deserialize_with = "de_chain_id")]
    pub dest_chain_id: Option<u64>,
    pub transaction_hash: Option<String>,
    pub bridge: Option<String>,
}

/// Resolved transfer state as reported by the routing provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferStatus {
    pub state: TransferState,
    pub substatus: Option<String>,
    pub sending_tx_hash: Option<String>,
    pub receiving_tx_hash: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferState {
    Pending,
    Bridging,
    Completed,
    Failed,
    Unknown,
}

impl TransferStatus {
    /// Terminal statuses end the polling loop
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, TransferState::Completed | TransferState::Failed)
    }
}

/// Lifecycle status of a local ledger entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LedgerStatus {
    Processing,
    Completed,
    Failed,
}

/// Placeholder hash a ledger entry carries until resolution
pub const PENDING_HASH: &str = "pending...";

/// Hash literal recorded for a failed simulated transfer
pub const FAILED_HASH: &str = "failed";

/// One recorded transaction in the local history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: LedgerStatus,
    pub amount: f64,
    pub token: String,
    pub usd_value: f64,
    pub from_address: String,
    pub to_address: String,
    pub chain: String,
    pub transaction_hash: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new ledger entry; id, status, placeholder
/// hash, and creation time are assigned by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryInput {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    pub token: String,
    pub usd_value: f64,
    pub from_address: String,
    pub to_address: String,
    pub chain: String,
    pub details: Option<String>,
}
