//! RegistryClient trait for mocking
//!
//! Abstracts the registry so the dict-annotator pipeline can be unit-tested
//! without network access.

use crate::error::RegistryError;

/// Trait for registry manifest inspection
#[async_trait::async_trait]
pub trait RegistryClientTrait: Send + Sync {
    /// Architectures of the image's manifest list, in list order. Empty for
    /// single-image manifests.
    async fn image_architectures(&self, image_ref: &str) -> Result<Vec<String>, RegistryError>;
}
