//! OmniPay Core - Cross-chain route acquisition and transfer-status tracking
//!
//! Serves the checkout front-end: quotes routes through the external routing
//! provider, tracks bridge/transfer completion, and keeps a bounded local
//! transaction history. In demo mode transfers are simulated end to end.

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

mod api;
mod config;
mod error;
mod executor;
mod ledger;
mod metrics;
mod model;
mod poller;
mod quote;
mod simulator;

use api::AppState;
use config::{ExecutionMode, LedgerBackend, Settings};
use executor::{DemoExecutor, LiveExecutor, TransferExecutor};
use ledger::{FileStore, Ledger, LedgerStore, MemoryStore};
use metrics::MetricsServer;
use poller::StatusPoller;
use quote::RouteClient;
use simulator::TransactionSimulator;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting OmniPay Core v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!(
        instance_id = %settings.service.instance_id,
        mode = ?settings.service.mode,
        "Loaded configuration"
    );

    // Ledger storage adapter
    let store: Arc<dyn LedgerStore> = match settings.ledger.backend {
        LedgerBackend::File => {
            let path = settings
                .ledger
                .path
                .clone()
                .ok_or_else(|| anyhow::anyhow!("ledger.path is required for the file backend"))?;
            info!(%path, "Using file-backed ledger");
            Arc::new(FileStore::new(&path))
        }
        LedgerBackend::Memory => {
            info!("Using in-memory ledger");
            Arc::new(MemoryStore::new())
        }
    };
    let ledger = Arc::new(Ledger::new(store, settings.ledger.capacity));

    // Routing provider client and status poller
    let client = Arc::new(RouteClient::new(
        settings.provider.clone(),
        settings.expose_diagnostics(),
    ));
    let poller = Arc::new(StatusPoller::new(client.clone()));

    // Transfer executor, selected by configuration
    let executor: Arc<dyn TransferExecutor> = match settings.service.mode {
        ExecutionMode::Live => Arc::new(LiveExecutor::new(client.clone(), ledger.clone())),
        ExecutionMode::Demo => {
            let simulator =
                TransactionSimulator::new(ledger.clone(), settings.simulator.clone());
            Arc::new(DemoExecutor::new(client.clone(), simulator))
        }
    };

    // Start metrics server
    let metrics_handle = if settings.metrics.enabled {
        let server = MetricsServer::new(settings.metrics.port);
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    // Start API server
    let state = AppState {
        ledger: ledger.clone(),
        executor,
        poller,
        expose_diagnostics: settings.expose_diagnostics(),
    };
    let api_handle = tokio::spawn({
        let api_config = settings.api.clone();
        async move {
            if let Err(e) = api::run_server(api_config, state).await {
                error!("API server error: {}", e);
            }
        }
    });

    // Log ledger activity for operator visibility
    let ledger_log_handle = tokio::spawn({
        let mut events = ledger.subscribe();
        async move {
            while let Ok(event) = events.recv().await {
                info!(?event, "Ledger changed");
            }
        }
    });

    info!(
        "OmniPay Core is running on http://{}:{}",
        settings.api.host, settings.api.port
    );
    if settings.metrics.enabled {
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
    }

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutdown signal received, stopping...");

    api_handle.abort();
    ledger_log_handle.abort();
    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("OmniPay Core stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,omnipay_core=debug,hyper=warn,reqwest=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
