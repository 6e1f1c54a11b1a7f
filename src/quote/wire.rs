//! Routing provider wire format
//!
//! Shapes mirror the LI.FI-style REST API. The provider versions these
//! responses additively, so every struct derives `Deserialize` with
//! defaults and ignores unknown fields.

use crate::error::{OmniPayError, OmniPayResult};
use crate::model::{Route, RouteStep, StepKind, TransferState, TransferStatus};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of the route request sent to the provider
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutesRequest {
    pub from_chain_id: u64,
    pub to_chain_id: u64,
    pub from_token_address: String,
    pub to_token_address: String,
    pub from_amount: String,
    pub from_address: String,
    pub to_address: String,
    pub options: RouteOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptions {
    pub slippage: f64,
    pub integrator: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoutesResponse {
    #[serde(default)]
    pub routes: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireRoute {
    pub id: String,
    pub from_amount: String,
    pub to_amount: String,
    #[serde(rename = "gasCostUSD")]
    pub gas_cost_usd: Option<String>,
    pub steps: Vec<WireStep>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireStep {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: Option<String>,
    pub tool: Option<String>,
    pub tool_details: Option<WireToolDetails>,
    pub action: WireAction,
    pub estimate: WireEstimate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireToolDetails {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireAction {
    pub from_chain_id: Option<u64>,
    pub to_chain_id: Option<u64>,
    pub from_token: WireToken,
    pub to_token: WireToken,
    pub from_amount: Option<String>,
    pub to_amount: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireToken {
    pub symbol: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireEstimate {
    pub execution_duration: Option<f64>,
    pub gas_costs: Vec<WireCost>,
    pub fee_costs: Vec<WireCost>,
    pub to_amount: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireCost {
    #[serde(rename = "amountUSD")]
    pub amount_usd: Option<String>,
    pub estimate: Option<String>,
}

/// Provider status-check response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusResponse {
    pub status: Option<String>,
    pub substatus: Option<String>,
    pub sending: Option<WireTxInfo>,
    pub receiving: Option<WireTxInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireTxInfo {
    pub tx_hash: Option<String>,
    pub timestamp: Option<i64>,
}

fn parse_usd(value: &Option<String>) -> f64 {
    value
        .as_deref()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn step_kind(step: &WireStep) -> StepKind {
    // Cross-chain action means a bridge regardless of the declared type
    if let (Some(from), Some(to)) = (step.action.from_chain_id, step.action.to_chain_id) {
        if from != to {
            return StepKind::Bridge;
        }
    }
    match step.step_type.as_deref() {
        Some("swap") => StepKind::Swap,
        Some("cross") | Some("lifi") => StepKind::Bridge,
        _ => StepKind::Transfer,
    }
}

/// Fields of the validated intent the wire route does not echo back
pub struct RouteContext<'a> {
    pub source_chain_id: u64,
    pub dest_chain_id: u64,
    pub source_token: &'a str,
    pub dest_token: &'a str,
}

/// Translate a raw provider route into the internal model.
///
/// `payload` is retained opaquely so the UI can hand the provider's own
/// route object back for execution.
pub fn route_from_wire(payload: serde_json::Value, ctx: &RouteContext<'_>) -> OmniPayResult<Route> {
    let wire: WireRoute = serde_json::from_value(payload.clone())
        .map_err(|e| OmniPayError::Provider(format!("Malformed provider route: {}", e)))?;

    if wire.steps.is_empty() {
        return Err(OmniPayError::Provider(
            "Provider returned a route with no steps".to_string(),
        ));
    }

    let steps: Vec<RouteStep> = wire
        .steps
        .iter()
        .map(|s| RouteStep {
            id: s.id.clone(),
            kind: step_kind(s),
            source_token: s
                .action
                .from_token
                .symbol
                .clone()
                .unwrap_or_else(|| ctx.source_token.to_string()),
            dest_token: s
                .action
                .to_token
                .symbol
                .clone()
                .unwrap_or_else(|| ctx.dest_token.to_string()),
            source_amount: s.action.from_amount.clone().unwrap_or_default(),
            dest_amount: s
                .estimate
                .to_amount
                .clone()
                .or_else(|| s.action.to_amount.clone())
                .unwrap_or_default(),
            protocol_name: s
                .tool_details
                .as_ref()
                .and_then(|d| d.name.clone())
                .or_else(|| s.tool.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            estimated_duration_seconds: s.estimate.execution_duration.unwrap_or(0.0) as u64,
            gas_fee: s.estimate.gas_costs.iter().map(|c| parse_usd(&c.amount_usd)).sum(),
        })
        .collect();

    let gas_fee: f64 = steps.iter().map(|s| s.gas_fee).sum();
    let bridge_fee: f64 = wire
        .steps
        .iter()
        .flat_map(|s| s.estimate.fee_costs.iter())
        .map(|c| parse_usd(&c.amount_usd))
        .sum();
    let duration: u64 = steps.iter().map(|s| s.estimated_duration_seconds).sum();

    let from_amount = wire.from_amount.parse::<f64>().unwrap_or(0.0);
    let to_amount = wire.to_amount.parse::<f64>().unwrap_or(0.0);
    let exchange_rate = if from_amount > 0.0 {
        to_amount / from_amount
    } else {
        0.0
    };

    let estimated_gas = wire
        .steps
        .iter()
        .flat_map(|s| s.estimate.gas_costs.iter())
        .find_map(|c| c.estimate.clone())
        .unwrap_or_else(|| "0".to_string());

    Ok(Route {
        id: wire.id,
        source_chain_id: ctx.source_chain_id,
        dest_chain_id: ctx.dest_chain_id,
        source_token: ctx.source_token.to_string(),
        dest_token: ctx.dest_token.to_string(),
        source_amount: wire.from_amount,
        dest_amount: wire.to_amount,
        estimated_gas,
        estimated_duration_seconds: duration,
        gas_fee,
        bridge_fee,
        total_fee: gas_fee + bridge_fee,
        exchange_rate,
        steps,
        provider: "lifi".to_string(),
        provider_payload: payload,
    })
}

/// Translate a provider status response into the internal model
pub fn status_from_wire(resp: StatusResponse) -> TransferStatus {
    let state = match resp.status.as_deref() {
        Some("DONE") => TransferState::Completed,
        Some("FAILED") | Some("INVALID") => TransferState::Failed,
        Some("PENDING") => match resp.substatus.as_deref() {
            Some("WAIT_SOURCE_CONFIRMATIONS") => TransferState::Pending,
            _ => TransferState::Bridging,
        },
        Some("NOT_FOUND") | None => TransferState::Unknown,
        Some(_) => TransferState::Unknown,
    };

    let updated_at = resp
        .receiving
        .as_ref()
        .and_then(|r| r.timestamp)
        .or_else(|| resp.sending.as_ref().and_then(|s| s.timestamp))
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));

    TransferStatus {
        state,
        substatus: resp.substatus,
        sending_tx_hash: resp.sending.and_then(|s| s.tx_hash),
        receiving_tx_hash: resp.receiving.and_then(|r| r.tx_hash),
        updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE_FIXTURE: &str = r#"{
        "id": "0xroute1",
        "fromChainId": 1,
        "toChainId": 137,
        "fromAmount": "1000000000000000000",
        "toAmount": "3492110000",
        "gasCostUSD": "4.21",
        "unknownFutureField": {"nested": true},
        "steps": [
            {
                "id": "step-1",
                "type": "swap",
                "tool": "1inch",
                "toolDetails": {"name": "1inch", "logoURI": "https://x"},
                "action": {
                    "fromChainId": 1,
                    "toChainId": 1,
                    "fromToken": {"symbol": "ETH"},
                    "toToken": {"symbol": "USDC"},
                    "fromAmount": "1000000000000000000"
                },
                "estimate": {
                    "executionDuration": 30,
                    "toAmount": "3495000000",
                    "gasCosts": [{"amountUSD": "2.50", "estimate": "210000"}],
                    "feeCosts": []
                }
            },
            {
                "id": "step-2",
                "type": "cross",
                "toolDetails": {"name": "stargate"},
                "action": {
                    "fromChainId": 1,
                    "toChainId": 137,
                    "fromToken": {"symbol": "USDC"},
                    "toToken": {"symbol": "USDC"},
                    "fromAmount": "3495000000"
                },
                "estimate": {
                    "executionDuration": 90,
                    "toAmount": "3492110000",
                    "gasCosts": [{"amountUSD": "1.71"}],
                    "feeCosts": [{"amountUSD": "0.35", "name": "LP fee"}]
                }
            }
        ]
    }"#;

    fn ctx() -> RouteContext<'static> {
        RouteContext {
            source_chain_id: 1,
            dest_chain_id: 137,
            source_token: "ETH",
            dest_token: "USDC",
        }
    }

    #[test]
    fn test_route_translation() {
        let payload: serde_json::Value = serde_json::from_str(ROUTE_FIXTURE).unwrap();
        let route = route_from_wire(payload, &ctx()).unwrap();

        assert_eq!(route.id, "0xroute1");
        assert_eq!(route.provider, "lifi");
        assert_eq!(route.dest_token, "USDC");
        assert_eq!(route.steps.len(), 2);
        assert_eq!(route.steps[0].kind, StepKind::Swap);
        assert_eq!(route.steps[1].kind, StepKind::Bridge);
        assert_eq!(route.steps[1].protocol_name, "stargate");
        assert_eq!(route.estimated_duration_seconds, 120);
        assert!((route.gas_fee - 4.21).abs() < 1e-9);
        assert!((route.bridge_fee - 0.35).abs() < 1e-9);
        assert!((route.total_fee - 4.56).abs() < 1e-9);
        assert_eq!(route.estimated_gas, "210000");
        assert!(route.exchange_rate > 0.0);
        assert!(route.steps_contiguous());
        // Raw provider route survives untouched for execution
        assert_eq!(route.provider_payload["id"], "0xroute1");
    }

    #[test]
    fn test_route_with_no_steps_is_rejected() {
        let payload = serde_json::json!({"id": "empty", "fromAmount": "1", "toAmount": "1", "steps": []});
        let err = route_from_wire(payload, &ctx()).unwrap_err();
        assert!(matches!(err, OmniPayError::Provider(_)));
    }

    #[test]
    fn test_status_translation() {
        let resp: StatusResponse = serde_json::from_str(
            r#"{
                "status": "DONE",
                "substatus": "COMPLETED",
                "newProviderField": 1,
                "sending": {"txHash": "0xaaa", "timestamp": 1700000000},
                "receiving": {"txHash": "0xbbb", "timestamp": 1700000300}
            }"#,
        )
        .unwrap();
        let status = status_from_wire(resp);
        assert_eq!(status.state, TransferState::Completed);
        assert!(status.is_terminal());
        assert_eq!(status.receiving_tx_hash.as_deref(), Some("0xbbb"));
        assert!(status.updated_at.is_some());
    }

    #[test]
    fn test_status_pending_and_unknown_mapping() {
        let pending = status_from_wire(StatusResponse {
            status: Some("PENDING".to_string()),
            substatus: Some("WAIT_SOURCE_CONFIRMATIONS".to_string()),
            ..Default::default()
        });
        assert_eq!(pending.state, TransferState::Pending);

        let bridging = status_from_wire(StatusResponse {
            status: Some("PENDING".to_string()),
            substatus: Some("WAIT_DESTINATION_TRANSACTION".to_string()),
            ..Default::default()
        });
        assert_eq!(bridging.state, TransferState::Bridging);

        let unknown = status_from_wire(StatusResponse::default());
        assert_eq!(unknown.state, TransferState::Unknown);
        assert!(!unknown.is_terminal());
    }
}
