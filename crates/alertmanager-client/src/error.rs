//! Alertmanager client errors

use thiserror::Error;

/// Errors that can occur when talking to the Alertmanager API
#[derive(Debug, Error)]
pub enum AlertmanagerError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Alertmanager returned a non-success status
    #[error("Alertmanager API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
