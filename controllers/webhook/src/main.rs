//! HyperConverged Admission Webhook
//!
//! Serves the validating and defaulting admission endpoints for the
//! HyperConverged CR:
//! - /validate-hco: singleton naming, certificate rotation ordering,
//!   CPU-ratio compatibility and workload-blocking delete policy
//! - /mutate-hco: fills every unset spec field with its documented default

mod cluster;
mod error;
mod mutator;
mod server;
mod validator;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use cluster::KubeClusterView;
use error::WebhookError;
use kube::Client;
use server::{WebhookState, webhook_router};
use std::env;
use tracing::info;

const DEFAULT_PORT: u16 = 4343;
const DEFAULT_CERT_DIR: &str = "/etc/webhook/certs";

#[tokio::main]
async fn main() -> Result<(), WebhookError> {
    tracing_subscriber::fmt::init();

    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        info!("rustls crypto provider already installed: {:?}", e);
    }

    info!("Starting HyperConverged Admission Webhook");

    // Load configuration from environment variables
    let port = env::var("WEBHOOK_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let cert_dir = PathBuf::from(
        env::var("WEBHOOK_CERT_DIR").unwrap_or_else(|_| DEFAULT_CERT_DIR.to_string()),
    );

    info!("Configuration:");
    info!("  Port: {}", port);
    info!("  Cert dir: {}", cert_dir.display());

    let client = Client::try_default().await.map_err(WebhookError::Kube)?;

    let state = Arc::new(WebhookState {
        cluster: Box::new(KubeClusterView::new(client)),
    });

    let router = webhook_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    server::serve(router, addr, &cert_dir).await
}
