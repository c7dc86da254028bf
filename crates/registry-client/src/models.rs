//! Registry API models (the manifest-list subset)

use serde::{Deserialize, Serialize};

/// Docker schema2 manifest list media type.
pub const MEDIA_TYPE_DOCKER_MANIFEST_LIST: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";
/// OCI image index media type.
pub const MEDIA_TYPE_OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";
/// Docker schema2 single-image manifest media type.
pub const MEDIA_TYPE_DOCKER_MANIFEST: &str =
    "application/vnd.docker.distribution.manifest.v2+json";
/// OCI single-image manifest media type.
pub const MEDIA_TYPE_OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";

/// True when `media_type` denotes a multi-image manifest.
pub fn is_multi_image(media_type: &str) -> bool {
    media_type == MEDIA_TYPE_DOCKER_MANIFEST_LIST || media_type == MEDIA_TYPE_OCI_INDEX
}

/// Target platform of one manifest-list entry.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Platform {
    /// CPU architecture (amd64, arm64, s390x, ...).
    #[serde(default)]
    pub architecture: String,

    /// Operating system.
    #[serde(default)]
    pub os: String,
}

/// One entry of a manifest list.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDescriptor {
    /// Media type of the referenced manifest.
    #[serde(default)]
    pub media_type: String,

    /// Digest of the referenced manifest.
    #[serde(default)]
    pub digest: String,

    /// Target platform, absent on attestation entries of some builders.
    #[serde(default)]
    pub platform: Option<Platform>,
}

/// A manifest list / OCI image index.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestList {
    /// Media type, also carried in the Content-Type response header.
    #[serde(default)]
    pub media_type: String,

    /// The per-platform entries.
    #[serde(default)]
    pub manifests: Vec<ManifestDescriptor>,
}

impl ManifestList {
    /// Architectures of the list entries, in list order.
    pub fn architectures(&self) -> Vec<String> {
        self.manifests
            .iter()
            .filter_map(|m| m.platform.as_ref())
            .map(|p| p.architecture.clone())
            .collect()
    }
}

/// Response of a bearer-token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// The issued token; some registries use `access_token` instead.
    #[serde(default)]
    pub token: String,

    /// OAuth2-style alias of `token`.
    #[serde(default)]
    pub access_token: String,
}

impl TokenResponse {
    /// The usable token, whichever field the registry filled.
    pub fn value(&self) -> &str {
        if self.token.is_empty() {
            &self.access_token
        } else {
            &self.token
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn architectures_skip_platformless_entries() {
        let list: ManifestList = serde_json::from_value(serde_json::json!({
            "mediaType": MEDIA_TYPE_OCI_INDEX,
            "manifests": [
                {"digest": "sha256:a", "platform": {"architecture": "amd64", "os": "linux"}},
                {"digest": "sha256:b", "platform": {"architecture": "arm64", "os": "linux"}},
                {"digest": "sha256:c"}
            ]
        }))
        .unwrap();

        assert_eq!(list.architectures(), vec!["amd64", "arm64"]);
    }

    #[test]
    fn token_response_falls_back_to_access_token() {
        let resp: TokenResponse =
            serde_json::from_value(serde_json::json!({"access_token": "abc"})).unwrap();
        assert_eq!(resp.value(), "abc");
    }
}
