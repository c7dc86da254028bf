//! Registry client errors

use thiserror::Error;

/// Errors that can occur when talking to a container registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Registry returned a non-success status
    #[error("Registry API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The image reference could not be parsed
    #[error("Invalid image reference: {0}")]
    InvalidReference(String),

    /// The registry demanded authentication we could not satisfy
    #[error("Authentication failed: {0}")]
    Authentication(String),
}
