//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the Kubernetes
//! client, the reconcile engine and the HyperConverged watcher together,
//! and serves the Prometheus metrics endpoint.

use crate::env::OperatorEnv;
use crate::error::ControllerError;
use crate::metrics;
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use axum::{Router, routing::get};
use crds::v1beta1::HyperConverged;
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Default port for the Prometheus metrics endpoint.
const METRICS_PORT: u16 = 8383;

/// Main controller for the HyperConverged operator.
pub struct Controller {
    hco_watcher: JoinHandle<Result<(), ControllerError>>,
    metrics_server: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(env: OperatorEnv) -> Result<Self, ControllerError> {
        info!("Initializing HyperConverged Controller");

        let kube_client = Client::try_default()
            .await
            .map_err(ControllerError::Kube)?;

        let hco_api: Api<HyperConverged> = Api::namespaced(kube_client.clone(), &env.namespace);

        let reconciler = Arc::new(Reconciler::new(kube_client, env));

        let watcher_instance = Arc::new(Watcher::new(reconciler, hco_api));

        let hco_watcher = {
            let watcher = watcher_instance;
            tokio::spawn(async move { watcher.watch_hyperconverged().await })
        };

        let metrics_server = tokio::spawn(serve_metrics(METRICS_PORT));

        Ok(Self {
            hco_watcher,
            metrics_server,
        })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("HyperConverged Controller running");

        // Both tasks run forever; an exit from either is a fatal condition.
        tokio::select! {
            result = &mut self.hco_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("HyperConverged watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("HyperConverged watcher error: {}", e)))?;
            }
            result = &mut self.metrics_server => {
                result.map_err(|e| ControllerError::Watch(format!("Metrics server panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("Metrics server error: {}", e)))?;
            }
        }

        Ok(())
    }
}

/// Serves the Prometheus metrics endpoint on the given port.
async fn serve_metrics(port: u16) -> Result<(), ControllerError> {
    let app = Router::new()
        .route("/metrics", get(|| async { metrics::render() }))
        .route("/healthz", get(|| async { "ok" }));

    let addr = format!("0.0.0.0:{port}");
    info!("Serving metrics on {}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ControllerError::Watch(format!("Failed to bind metrics listener: {}", e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ControllerError::Watch(format!("Metrics server failed: {}", e)))?;

    Ok(())
}
