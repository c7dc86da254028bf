//! HyperConverged resource watcher.
//!
//! Runs a `kube_runtime::Controller` over the singleton HyperConverged CR
//! and delegates every event to the reconcile engine. The controller handles
//! reconnection and retry on its own; errors from a pass are requeued by the
//! error policy below.

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crds::v1beta1::HyperConverged;
use futures::StreamExt;
use kube::Api;
use kube_runtime::{
    Controller,
    controller::{Action, Config as ControllerConfig},
    watcher,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Watches the HyperConverged CR for changes.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    hco_api: Api<HyperConverged>,
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(reconciler: Arc<Reconciler>, hco_api: Api<HyperConverged>) -> Self {
        Self {
            reconciler,
            hco_api,
        }
    }

    /// Starts watching HyperConverged resources. Runs until the watch stream
    /// is torn down.
    pub async fn watch_hyperconverged(&self) -> Result<(), ControllerError> {
        info!("Starting HyperConverged watcher");

        let error_policy = |obj: Arc<HyperConverged>, error: &ControllerError, _ctx: Arc<Reconciler>| {
            error!(
                "Reconciliation error for HyperConverged {:?}: {}",
                obj.metadata.name, error
            );
            Action::requeue(Duration::from_secs(60))
        };

        let reconcile = |obj: Arc<HyperConverged>, ctx: Arc<Reconciler>| async move {
            debug!("Reconciling HyperConverged {:?}", obj.metadata.name);
            ctx.reconcile(obj).await
        };

        // Debounce batches the status updates the pass itself writes back,
        // so a converged CR does not re-trigger immediately.
        let controller_config = ControllerConfig::default()
            .debounce(Duration::from_secs(5))
            .concurrency(3);

        Controller::new(self.hco_api.clone(), watcher::Config::default())
            .with_config(controller_config)
            .run(reconcile, error_policy, self.reconciler.clone())
            .for_each(|res| async move {
                if let Err(e) = res {
                    error!("Controller error for HyperConverged: {}", e);
                }
            })
            .await;

        Ok(())
    }
}
