//! Mock RegistryClient for unit testing
//!
//! Maps image references to canned architecture lists so the dict-annotator
//! pipeline can be tested without network access.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::RegistryError;
use crate::registry_trait::RegistryClientTrait;

/// Mock RegistryClient for testing
#[derive(Clone, Default)]
pub struct MockRegistryClient {
    images: Arc<Mutex<HashMap<String, Vec<String>>>>,
    failing: Arc<Mutex<HashMap<String, String>>>,
}

impl MockRegistryClient {
    /// Create an empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image with its architectures (for test setup). An empty
    /// list models a single-image manifest.
    pub fn add_image(&self, image_ref: impl Into<String>, arches: &[&str]) {
        self.images.lock().unwrap().insert(
            image_ref.into(),
            arches.iter().map(|a| a.to_string()).collect(),
        );
    }

    /// Make lookups of `image_ref` fail with the given message (for test setup)
    pub fn fail_image(&self, image_ref: impl Into<String>, message: impl Into<String>) {
        self.failing
            .lock()
            .unwrap()
            .insert(image_ref.into(), message.into());
    }
}

#[async_trait::async_trait]
impl RegistryClientTrait for MockRegistryClient {
    async fn image_architectures(&self, image_ref: &str) -> Result<Vec<String>, RegistryError> {
        if let Some(message) = self.failing.lock().unwrap().get(image_ref) {
            return Err(RegistryError::Api(message.clone()));
        }
        self.images
            .lock()
            .unwrap()
            .get(image_ref)
            .cloned()
            .ok_or_else(|| RegistryError::Api(format!("Failed to fetch manifest for {image_ref}: 404 - not found")))
    }
}
