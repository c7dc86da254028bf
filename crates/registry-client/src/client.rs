//! Registry API client
//!
//! Implements the manifest endpoint of the Docker Registry HTTP API v2 with
//! the anonymous bearer-token handshake: a 401 carrying a `WWW-Authenticate:
//! Bearer` challenge is answered by fetching a token from the advertised
//! realm and retrying once.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::error::RegistryError;
use crate::models::{self, ManifestList, TokenResponse};
use crate::reference::ImageReference;
use crate::registry_trait::RegistryClientTrait;

const MANIFEST_ACCEPT: &str = "application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.index.v1+json, \
     application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.oci.image.manifest.v1+json";

/// Registry API client
pub struct RegistryClient {
    client: Client,
}

impl RegistryClient {
    /// Create a new anonymous registry client
    pub fn new() -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(RegistryError::Http)?;
        Ok(Self { client })
    }

    async fn get_manifest(&self, url: &str, token: Option<&str>) -> Result<Response, RegistryError> {
        let mut builder = self.client.get(url).header(ACCEPT, MANIFEST_ACCEPT);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        Ok(builder.send().await?)
    }

    /// Answers a `WWW-Authenticate: Bearer realm=...,service=...,scope=...`
    /// challenge with an anonymous token request.
    async fn fetch_token(&self, challenge: &str) -> Result<String, RegistryError> {
        let params = parse_bearer_challenge(challenge)
            .ok_or_else(|| RegistryError::Authentication(format!("unsupported challenge: {challenge}")))?;

        debug!(realm = %params.realm, "Fetching anonymous registry token");

        let mut request = self.client.get(&params.realm);
        if let Some(service) = &params.service {
            request = request.query(&[("service", service)]);
        }
        if let Some(scope) = &params.scope {
            request = request.query(&[("scope", scope)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Authentication(format!(
                "token endpoint returned {status} - {body}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        if token.value().is_empty() {
            return Err(RegistryError::Authentication(
                "token endpoint returned an empty token".to_string(),
            ));
        }
        Ok(token.value().to_string())
    }
}

#[async_trait::async_trait]
impl RegistryClientTrait for RegistryClient {
    async fn image_architectures(&self, image_ref: &str) -> Result<Vec<String>, RegistryError> {
        let reference = ImageReference::parse(image_ref)?;
        let url = reference.manifest_url();
        debug!(%url, "Fetching image manifest");

        let mut response = self.get_manifest(&url, None).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            let challenge = response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let token = self.fetch_token(&challenge).await?;
            response = self.get_manifest(&url, Some(&token)).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::Api(format!(
                "Failed to fetch manifest for {image_ref}: {status} - {body}"
            )));
        }

        let media_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !models::is_multi_image(&media_type) {
            return Ok(Vec::new());
        }

        let list: ManifestList = response.json().await?;
        Ok(list.architectures())
    }
}

struct BearerChallenge {
    realm: String,
    service: Option<String>,
    scope: Option<String>,
}

fn parse_bearer_challenge(header: &str) -> Option<BearerChallenge> {
    let rest = header.trim().strip_prefix("Bearer ")?;

    let mut realm = None;
    let mut service = None;
    let mut scope = None;
    for part in rest.split(',') {
        let (key, value) = part.trim().split_once('=')?;
        let value = value.trim_matches('"').to_string();
        match key {
            "realm" => realm = Some(value),
            "service" => service = Some(value),
            "scope" => scope = Some(value),
            _ => {}
        }
    }

    Some(BearerChallenge {
        realm: realm?,
        service,
        scope,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quay_style_challenge() {
        let challenge = parse_bearer_challenge(
            r#"Bearer realm="https://quay.io/v2/auth",service="quay.io",scope="repository:containerdisks/centos-stream:pull""#,
        )
        .unwrap();
        assert_eq!(challenge.realm, "https://quay.io/v2/auth");
        assert_eq!(challenge.service.as_deref(), Some("quay.io"));
        assert_eq!(
            challenge.scope.as_deref(),
            Some("repository:containerdisks/centos-stream:pull")
        );
    }

    #[test]
    fn rejects_basic_challenges() {
        assert!(parse_bearer_challenge(r#"Basic realm="registry""#).is_none());
    }
}
