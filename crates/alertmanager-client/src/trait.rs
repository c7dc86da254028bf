//! AlertmanagerClient trait for mocking
//!
//! Abstracts the Alertmanager API so the observability controller can be
//! unit-tested without a running Alertmanager.

use crate::error::AlertmanagerError;
use crate::models::{CreatedSilence, PostableSilence, Silence};

/// Trait for Alertmanager silence operations
#[async_trait::async_trait]
pub trait AlertmanagerClientTrait: Send + Sync {
    /// List all silences, including expired ones.
    async fn list_silences(&self) -> Result<Vec<Silence>, AlertmanagerError>;

    /// Create a new silence.
    async fn create_silence(
        &self,
        silence: PostableSilence,
    ) -> Result<CreatedSilence, AlertmanagerError>;
}
