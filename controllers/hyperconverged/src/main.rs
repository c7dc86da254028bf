//! HyperConverged Controller
//!
//! Operator reconciling the singleton HyperConverged CR into the full
//! virtualization operand stack:
//! - KubeVirt, CDI, NetworkAddonsConfig and SSP CRs
//! - Console plugin, AIE webhook, Passt CNI and wasp-agent deployments
//! - Priority class, image streams and data-import-cron templates
//!
//! Each pass projects the CR into every operand, pushes drifted children
//! back to their desired shape and aggregates child conditions into a
//! single status update.

mod backoff;
mod controller;
mod env;
mod error;
mod handlers;
mod metrics;
mod nodeinfo;
mod reconciler;
mod request;
mod stream;
mod watcher;

use crate::error::ControllerError;
use controller::Controller;
use env::OperatorEnv;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt::init();

    info!("Starting HyperConverged Controller");

    // Load configuration from environment variables
    let env = OperatorEnv::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", env.namespace);
    info!("  Operator version: {}", env.operator_version);

    // Initialize and run controller
    let controller = Controller::new(env).await?;
    controller.run().await?;

    Ok(())
}
