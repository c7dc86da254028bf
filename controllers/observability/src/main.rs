//! Observability Controller
//!
//! Side loop of the HyperConverged operator: keeps the mandated
//! Alertmanager silences in place so operator-managed disruption budgets
//! do not page anyone. Independent of the main reconciler; shares no state
//! with it.

mod error;
mod silence;

use std::env;
use std::sync::Arc;

use alertmanager_client::AlertmanagerClient;
use error::ObservabilityError;
use tokio::sync::watch;
use tracing::info;

const DEFAULT_ALERTMANAGER_URL: &str = "http://alertmanager-operated:9093";

#[tokio::main]
async fn main() -> Result<(), ObservabilityError> {
    tracing_subscriber::fmt::init();

    info!("Starting Observability Controller");

    // Load configuration from environment variables
    let alertmanager_url = env::var("ALERTMANAGER_URL")
        .unwrap_or_else(|_| DEFAULT_ALERTMANAGER_URL.to_string());
    let token = env::var("ALERTMANAGER_TOKEN").ok();

    info!("Configuration:");
    info!("  Alertmanager URL: {}", alertmanager_url);

    let client = AlertmanagerClient::new(alertmanager_url, token)
        .map_err(|e| ObservabilityError::InvalidConfig(e.to_string()))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let loop_handle = tokio::spawn(silence::run_loop(Arc::new(client), shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| ObservabilityError::InvalidConfig(format!("signal handler: {e}")))?;
    info!("Termination signal received");

    let _ = shutdown_tx.send(true);
    let _ = loop_handle.await;

    Ok(())
}
