//! Webhook-specific error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that can occur while serving admission requests.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The admission review request was invalid or malformed
    #[error("invalid admission review: {0}")]
    InvalidReview(String),

    /// An error occurred while communicating with the Kubernetes API
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// An error occurred during JSON serialization/deserialization
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TLS material could not be loaded or the listener failed
    #[error("server error: {0}")]
    Server(String),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebhookError::InvalidReview(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            WebhookError::Kube(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            WebhookError::Serialization(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            WebhookError::Server(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}
