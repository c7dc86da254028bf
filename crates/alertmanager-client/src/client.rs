//! Alertmanager API client
//!
//! Talks to the v2 HTTP API of an in-cluster Alertmanager, optionally with a
//! bearer token (the operator uses its service-account token through the
//! OAuth proxy in front of Alertmanager).

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::alertmanager_trait::AlertmanagerClientTrait;
use crate::error::AlertmanagerError;
use crate::models::{CreatedSilence, PostableSilence, Silence};

/// Alertmanager API client
pub struct AlertmanagerClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl AlertmanagerClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Alertmanager base URL (e.g., "http://alertmanager-operated:9093")
    /// * `token` - optional bearer token
    pub fn new(base_url: String, token: Option<String>) -> Result<Self, AlertmanagerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(AlertmanagerError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder
    }
}

#[async_trait::async_trait]
impl AlertmanagerClientTrait for AlertmanagerClient {
    async fn list_silences(&self) -> Result<Vec<Silence>, AlertmanagerError> {
        debug!("Listing Alertmanager silences");

        let response = self
            .request(reqwest::Method::GET, "/api/v2/silences")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AlertmanagerError::Api(format!(
                "Failed to list silences: {status} - {body}"
            )));
        }

        Ok(response.json().await?)
    }

    async fn create_silence(
        &self,
        silence: PostableSilence,
    ) -> Result<CreatedSilence, AlertmanagerError> {
        debug!(created_by = %silence.created_by, "Creating Alertmanager silence");

        let response = self
            .request(reqwest::Method::POST, "/api/v2/silences")
            .json(&silence)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AlertmanagerError::Api(format!(
                "Failed to create silence: {status} - {body}"
            )));
        }

        Ok(response.json().await?)
    }
}
