//! Controller-specific error types.

use thiserror::Error;

/// Errors that can occur while reconciling the HyperConverged resource.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Optimistic-concurrency failure on a child resource: requeue, do not
    /// retry in-pass
    #[error("Update conflict on {0}: requeued")]
    Conflict(String),

    /// Semantic rejection from the admission path, surfaced verbatim
    #[error("Invalid resource: {0}")]
    Invalid(String),

    /// Missing required environment input; the pass fails and the resource
    /// goes Degraded
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A desired child object did not have the expected shape
    #[error("Malformed operand {0}: {1}")]
    MalformedOperand(&'static str, String),

    /// A JSON-patch annotation failed to parse or apply
    #[error("Invalid jsonpatch annotation {0}: {1}")]
    JsonPatch(String, String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Uninstall was attempted while workloads still exist
    #[error("Uninstall blocked: {0}")]
    UninstallBlocked(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

impl ControllerError {
    /// True when the error is an optimistic-concurrency conflict from the
    /// API server.
    pub fn is_conflict(&self) -> bool {
        match self {
            ControllerError::Conflict(_) => true,
            ControllerError::Kube(kube::Error::Api(resp)) => resp.code == 409,
            _ => false,
        }
    }
}
