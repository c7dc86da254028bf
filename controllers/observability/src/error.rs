//! Controller-specific error types.

use thiserror::Error;

/// Errors that can occur while maintaining the mandated silences.
#[derive(Debug, Error)]
pub enum ObservabilityError {
    /// Alertmanager API error
    #[error("Alertmanager error: {0}")]
    Alertmanager(#[from] alertmanager_client::AlertmanagerError),

    /// Missing or malformed configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
