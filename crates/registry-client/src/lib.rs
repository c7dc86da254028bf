//! Container Registry v2 Client
//!
//! A client for the Docker Registry HTTP API v2, limited to what the
//! dict-annotator needs: fetching an image's manifest and reading the
//! platform architectures out of a manifest list. Handles the anonymous
//! bearer-token handshake that public registries answer 401 with.
//!
//! # Example
//!
//! ```no_run
//! use registry_client::{RegistryClient, RegistryClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RegistryClient::new()?;
//! let arches = client
//!     .image_architectures("docker://quay.io/containerdisks/centos-stream:9")
//!     .await?;
//! // Empty for single-arch (non-list) manifests.
//! println!("{}", arches.join(","));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
pub mod reference;
#[path = "trait.rs"]
pub mod registry_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::RegistryClient;
pub use error::RegistryError;
pub use models::*;
pub use reference::ImageReference;
pub use registry_trait::RegistryClientTrait;
#[cfg(feature = "test-util")]
pub use mock::MockRegistryClient;
