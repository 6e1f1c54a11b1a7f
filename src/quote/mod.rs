//! Route quote client for the external routing provider
//!
//! One outbound request per call, no internal retries: provider failures
//! surface to the caller, which owns any retry or cadence policy.

pub mod wire;

use crate::config::ProviderConfig;
use crate::error::{OmniPayError, OmniPayResult};
use crate::metrics;
use crate::model::{PaymentIntent, Route, TransferStatus, TransferStatusQuery};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const DEFAULT_SLIPPAGE: f64 = 0.03;

/// Client for the routing provider's quote and status endpoints
pub struct RouteClient {
    config: ProviderConfig,
    expose_diagnostics: bool,
    /// Initialized on first use, once per process, keyed by the integrator
    /// identity baked into its default headers
    http: OnceLock<Arc<reqwest::Client>>,
}

/// A payment intent with defaults applied and required fields proven present
#[derive(Debug, Clone)]
pub struct ValidatedIntent {
    pub source_chain_id: u64,
    pub dest_chain_id: u64,
    pub source_token: String,
    pub dest_token: String,
    pub source_address: String,
    pub dest_address: String,
    pub source_amount: String,
    pub slippage: f64,
}

/// Validate a payment intent and apply defaults.
///
/// Runs before any network I/O so malformed intents never reach the provider.
pub fn validate_intent(intent: &PaymentIntent) -> OmniPayResult<ValidatedIntent> {
    let source_chain_id = intent
        .source_chain_id
        .ok_or_else(|| invalid("sourceChainId is missing or not an integer"))?;
    let dest_chain_id = intent
        .dest_chain_id
        .ok_or_else(|| invalid("destChainId is missing or not an integer"))?;
    let source_token = require(&intent.source_token, "sourceToken")?;
    let dest_token = require(&intent.dest_token, "destToken")?;
    let source_address = require(&intent.source_address, "sourceAddress")?;
    let source_amount = require(&intent.source_amount, "sourceAmount")?;

    let dest_address = match &intent.dest_address {
        Some(addr) if !addr.trim().is_empty() => addr.clone(),
        _ => source_address.clone(),
    };

    Ok(ValidatedIntent {
        source_chain_id,
        dest_chain_id,
        source_token,
        dest_token,
        source_address,
        dest_address,
        source_amount,
        slippage: intent.slippage_tolerance.unwrap_or(DEFAULT_SLIPPAGE),
    })
}

/// Validate status query parameters
pub fn validate_status_query(
    query: &TransferStatusQuery,
) -> OmniPayResult<(u64, u64, String, Option<String>)> {
    let tx_hash = require(&query.transaction_hash, "txHash")?;
    let from_chain = query
        .source_chain_id
        .ok_or_else(|| invalid("fromChain is missing or not an integer"))?;
    let to_chain = query
        .dest_chain_id
        .ok_or_else(|| invalid("toChain is missing or not an integer"))?;
    Ok((from_chain, to_chain, tx_hash, query.bridge.clone()))
}

fn invalid(msg: &str) -> OmniPayError {
    OmniPayError::InvalidRequest(msg.to_string())
}

fn require(field: &Option<String>, name: &str) -> OmniPayResult<String> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value.clone()),
        _ => Err(invalid(&format!("{} is required", name))),
    }
}

impl RouteClient {
    pub fn new(config: ProviderConfig, expose_diagnostics: bool) -> Self {
        Self {
            config,
            expose_diagnostics,
            http: OnceLock::new(),
        }
    }

    /// Get the shared HTTP client, building it on first call.
    ///
    /// Idempotent: a racing second build is discarded in favor of whichever
    /// client landed in the cell first.
    fn http(&self) -> OmniPayResult<Arc<reqwest::Client>> {
        if let Some(client) = self.http.get() {
            return Ok(client.clone());
        }
        let built = Arc::new(self.build_http()?);
        Ok(self.http.get_or_init(|| built).clone())
    }

    fn build_http(&self) -> OmniPayResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let integrator = HeaderValue::from_str(&self.config.integrator)
            .map_err(|e| OmniPayError::Config(format!("Invalid integrator value: {}", e)))?;
        headers.insert("x-lifi-integrator", integrator);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            let key = HeaderValue::from_str(key)
                .map_err(|e| OmniPayError::Config(format!("Invalid API key value: {}", e)))?;
            headers.insert("x-lifi-api-key", key);
        }

        debug!(
            integrator = %self.config.integrator,
            "Initializing routing provider client"
        );

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(self.config.request_timeout_ms))
            .build()
            .map_err(|e| OmniPayError::Config(format!("Failed to build HTTP client: {}", e)))
    }

    /// Fetch the best route for a payment intent.
    ///
    /// Issues exactly one provider request; does not retry and does not
    /// touch the ledger.
    pub async fn get_quote(&self, intent: &PaymentIntent) -> OmniPayResult<Route> {
        let valid = validate_intent(intent)?;
        let url = format!("{}/advanced/routes", self.config.base_url.trim_end_matches('/'));

        let body = wire::RoutesRequest {
            from_chain_id: valid.source_chain_id,
            to_chain_id: valid.dest_chain_id,
            from_token_address: valid.source_token.clone(),
            to_token_address: valid.dest_token.clone(),
            from_amount: valid.source_amount.clone(),
            from_address: valid.source_address.clone(),
            to_address: valid.dest_address.clone(),
            options: wire::RouteOptions {
                slippage: valid.slippage,
                integrator: self.config.integrator.clone(),
            },
        };

        debug!(
            from_chain = valid.source_chain_id,
            to_chain = valid.dest_chain_id,
            from_token = %valid.source_token,
            to_token = %valid.dest_token,
            "Requesting routes"
        );

        let started = Instant::now();
        let response = self.http()?.post(&url).json(&body).send().await;
        metrics::record_quote_latency(started.elapsed().as_secs_f64());

        let response = response.map_err(|e| {
            metrics::record_quote_request("provider_error");
            OmniPayError::Provider(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            metrics::record_quote_request(if status == StatusCode::NOT_FOUND {
                "route_not_found"
            } else {
                "provider_error"
            });
            return Err(self.provider_failure("route request", status, body));
        }

        let parsed: wire::RoutesResponse = response.json().await.map_err(|e| {
            metrics::record_quote_request("provider_error");
            OmniPayError::Provider(format!("Malformed provider response: {}", e))
        })?;

        let best = parsed.routes.into_iter().next().ok_or_else(|| {
            metrics::record_quote_request("route_not_found");
            OmniPayError::RouteNotFound(format!(
                "No route from chain {} to chain {} for {} -> {}",
                valid.source_chain_id, valid.dest_chain_id, valid.source_token, valid.dest_token
            ))
        })?;

        let route = wire::route_from_wire(
            best,
            &wire::RouteContext {
                source_chain_id: valid.source_chain_id,
                dest_chain_id: valid.dest_chain_id,
                source_token: &valid.source_token,
                dest_token: &valid.dest_token,
            },
        )?;

        metrics::record_quote_request("ok");
        Ok(route)
    }

    /// Check the transfer status for a transaction hash.
    ///
    /// Pure pass-through translation; idempotent and side-effect free, safe
    /// to call repeatedly with the same hash.
    pub async fn get_transfer_status(
        &self,
        query: &TransferStatusQuery,
    ) -> OmniPayResult<TransferStatus> {
        let (from_chain, to_chain, tx_hash, bridge) = validate_status_query(query)?;
        let url = format!("{}/status", self.config.base_url.trim_end_matches('/'));

        let mut params = vec![
            ("txHash", tx_hash.clone()),
            ("fromChain", from_chain.to_string()),
            ("toChain", to_chain.to_string()),
        ];
        if let Some(bridge) = bridge {
            params.push(("bridge", bridge));
        }

        let response = self
            .http()?
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                metrics::record_status_check("provider_error");
                OmniPayError::Provider(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            metrics::record_status_check("provider_error");
            return Err(self.provider_failure("status request", status, body));
        }

        let parsed: wire::StatusResponse = response.json().await.map_err(|e| {
            metrics::record_status_check("provider_error");
            OmniPayError::Provider(format!("Malformed provider response: {}", e))
        })?;

        metrics::record_status_check("ok");
        Ok(wire::status_from_wire(parsed))
    }

    /// Wrap a non-success provider response. The raw body is always logged;
    /// it is attached to the error only in a development configuration.
    fn provider_failure(&self, operation: &str, status: StatusCode, body: String) -> OmniPayError {
        warn!(%status, operation, body = %body, "Routing provider request failed");

        let message = if self.expose_diagnostics {
            format!("Provider returned {} for {}: {}", status, operation, body)
        } else {
            format!("Provider returned {} for {}", status, operation)
        };

        if status == StatusCode::NOT_FOUND {
            OmniPayError::RouteNotFound(message)
        } else {
            OmniPayError::Provider(message)
        }
    }
}
