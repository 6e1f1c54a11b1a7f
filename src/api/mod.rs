//! HTTP API for the UI layer: quotes, status checks, transaction history
//!
//! Every response uses the `{success, ...}` envelope the front-end expects.
//! Validation failures map to 400, provider and unexpected failures to 500.

use crate::config::ApiConfig;
use crate::error::{OmniPayError, OmniPayResult};
use crate::executor::{TransferExecutor, TransferRequest};
use crate::ledger::Ledger;
use crate::model::{LedgerEntry, PaymentIntent, Route, TransferStatusQuery};
use crate::poller::StatusPoller;

use axum::{
    extract::rejection::JsonRejection,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub executor: Arc<dyn TransferExecutor>,
    pub poller: Arc<StatusPoller>,
    pub expose_diagnostics: bool,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/api/quote", post(get_quote))
        .route("/api/status", get(get_status))
        .route("/api/transactions", get(get_transactions))
        .route("/api/transfer", post(execute_transfer))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP API server
pub async fn run_server(config: ApiConfig, state: AppState) -> OmniPayResult<()> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| OmniPayError::Internal(e.to_string()))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| OmniPayError::Internal(e.to_string()))?;

    Ok(())
}

/// Health check endpoint - basic liveness
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check - verify the ledger store is usable
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let ledger_ok = state.ledger.health_check().await;
    let code = if ledger_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(ReadinessResponse {
            ready: ledger_ok,
            ledger: ledger_ok,
        }),
    )
}

/// Quote a route for a payment intent
async fn get_quote(
    State(state): State<AppState>,
    intent: Result<Json<PaymentIntent>, JsonRejection>,
) -> impl IntoResponse {
    let Json(intent) = match intent {
        Ok(intent) => intent,
        Err(rejection) => {
            return error_response(
                &state,
                &OmniPayError::InvalidRequest(format!("Malformed intent: {}", rejection)),
            )
        }
    };

    match state.executor.quote_route(&intent).await {
        Ok(route) => {
            let quote = QuoteSummary::from(&route);
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "success": true,
                    "quote": quote,
                    "route": route,
                })),
            )
        }
        Err(e) => error_response(&state, &e),
    }
}

/// Query parameters of the status endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusParams {
    tx_hash: Option<String>,
    from_chain: Option<String>,
    to_chain: Option<String>,
    bridge: Option<String>,
    /// When present, a terminal status is folded into this ledger entry
    ledger_id: Option<String>,
}

impl StatusParams {
    fn into_query(self) -> (TransferStatusQuery, Option<String>) {
        // Unparseable chain values read as absent and fail validation
        let query = TransferStatusQuery {
            source_chain_id: self.from_chain.and_then(|c| c.trim().parse().ok()),
            dest_chain_id: self.to_chain.and_then(|c| c.trim().parse().ok()),
            transaction_hash: self.tx_hash,
            bridge: self.bridge,
        };
        (query, self.ledger_id)
    }
}

/// Check bridge/transfer status for a transaction
async fn get_status(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> impl IntoResponse {
    let (query, ledger_id) = params.into_query();
    let result = match ledger_id {
        Some(id) => state.poller.reconcile(&state.ledger, &id, &query).await,
        None => state.poller.poll_once(&query).await,
    };
    match result {
        Ok(status) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "status": status,
            })),
        ),
        Err(e) => error_response(&state, &e),
    }
}

/// Local transaction history, newest first
async fn get_transactions(State(state): State<AppState>) -> impl IntoResponse {
    let transactions: Vec<LedgerEntry> = state.ledger.list().await;
    Json(serde_json::json!({
        "success": true,
        "transactions": transactions,
    }))
}

/// Execute a transfer through the configured executor
async fn execute_transfer(
    State(state): State<AppState>,
    request: Result<Json<TransferRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            return error_response(
                &state,
                &OmniPayError::InvalidRequest(format!("Malformed transfer: {}", rejection)),
            )
        }
    };

    match state.executor.execute_transfer(request).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "transaction": outcome,
            })),
        ),
        Err(e) => error_response(&state, &e),
    }
}

fn error_response(state: &AppState, err: &OmniPayError) -> (StatusCode, Json<serde_json::Value>) {
    let code = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let mut body = serde_json::json!({
        "success": false,
        "error": err.to_string(),
    });
    if state.expose_diagnostics {
        body["details"] = serde_json::Value::String(err.kind().to_string());
    }

    (code, Json(body))
}

// Response types

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    ledger: bool,
}

/// Condensed route facts the checkout widget renders directly
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummary {
    source_amount: String,
    dest_amount: String,
    exchange_rate: f64,
    gas_fee: f64,
    bridge_fee: f64,
    total_fee: f64,
    estimated_duration_seconds: u64,
    provider: String,
}

impl From<&Route> for QuoteSummary {
    fn from(route: &Route) -> Self {
        Self {
            source_amount: route.source_amount.clone(),
            dest_amount: route.dest_amount.clone(),
            exchange_rate: route.exchange_rate,
            gas_fee: route.gas_fee,
            bridge_fee: route.bridge_fee,
            total_fee: route.total_fee,
            estimated_duration_seconds: route.estimated_duration_seconds,
            provider: route.provider.clone(),
        }
    }
}
