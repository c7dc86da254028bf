//! HTTPS server speaking AdmissionReview.
//!
//! Routes:
//! - POST /validate-hco — validation policy for create/update/delete
//! - POST /mutate-hco   — defaulting patch
//! - GET  /readyz       — readiness probe

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use crds::v1beta1::HyperConverged;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::cluster::ClusterView;
use crate::error::WebhookError;
use crate::{mutator, validator};

/// Shared state for the admission handlers.
pub struct WebhookState {
    /// Cluster lookups behind a trait so handlers stay testable.
    pub cluster: Box<dyn ClusterView>,
}

/// Builds the admission router.
pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/validate-hco", post(validate_handler))
        .route("/mutate-hco", post(mutate_handler))
        .route("/readyz", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router over TLS until the listener fails.
pub async fn serve(
    router: Router,
    addr: SocketAddr,
    cert_dir: &Path,
) -> Result<(), WebhookError> {
    let cert = tokio::fs::read(cert_dir.join("tls.crt"))
        .await
        .map_err(|e| WebhookError::Server(format!("reading tls.crt: {e}")))?;
    let key = tokio::fs::read(cert_dir.join("tls.key"))
        .await
        .map_err(|e| WebhookError::Server(format!("reading tls.key: {e}")))?;

    let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem(cert, key)
        .await
        .map_err(|e| WebhookError::Server(format!("TLS config: {e}")))?;

    info!(%addr, "Serving admission webhook");
    axum_server::bind_rustls(addr, tls_config)
        .serve(router.into_make_service())
        .await
        .map_err(|e| WebhookError::Server(format!("webhook server failed: {e}")))?;

    Ok(())
}

/// Handles validating admission review for the HyperConverged CR.
async fn validate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(body): Json<AdmissionReview<HyperConverged>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let req: AdmissionRequest<HyperConverged> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    let response = validate(&state, &req).await;
    Json(response.into_review())
}

async fn validate(
    state: &WebhookState,
    request: &AdmissionRequest<HyperConverged>,
) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);

    match request.operation {
        Operation::Delete => {
            // Delete reviews carry the existing object in oldObject.
            let Some(hc) = &request.old_object else {
                return response;
            };
            match validator::validate_delete(hc, state.cluster.as_ref()).await {
                Ok(()) => response,
                Err(reason) => {
                    warn!(%reason, "Rejecting HyperConverged deletion");
                    response.deny(reason)
                }
            }
        }
        Operation::Create | Operation::Update => {
            let Some(hc) = &request.object else {
                return response;
            };
            match validator::validate_spec(hc) {
                Ok(warnings) => {
                    let mut response = response;
                    if !warnings.is_empty() {
                        response.warnings = Some(warnings);
                    }
                    response
                }
                Err(reason) => {
                    warn!(%reason, "Rejecting HyperConverged write");
                    response.deny(reason)
                }
            }
        }
        _ => response,
    }
}

/// Handles mutating admission review: answers with the defaulting patch.
async fn mutate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(body): Json<AdmissionReview<HyperConverged>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let req: AdmissionRequest<HyperConverged> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "Failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    let response = mutate(&state, &req).await;
    Json(response.into_review())
}

async fn mutate(
    state: &WebhookState,
    request: &AdmissionRequest<HyperConverged>,
) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);

    let Some(hc) = &request.object else {
        return response;
    };

    let single_worker = match state.cluster.single_worker_node().await {
        Ok(single_worker) => single_worker,
        Err(e) => {
            error!(error = %e, "Failed to inspect cluster topology");
            return response.deny(format!("failed to inspect cluster topology: {e}"));
        }
    };

    let patch = match mutator::default_patch(hc, single_worker) {
        Ok(patch) => patch,
        Err(e) => {
            error!(error = %e, "Failed to compute defaulting patch");
            return response.deny(format!("defaulting failed: {e}"));
        }
    };

    match response.with_patch(patch) {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Failed to serialize patch");
            AdmissionResponse::from(request).deny(format!("patch serialization error: {e}"))
        }
    }
}
