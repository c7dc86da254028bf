//! Image reference parsing

use crate::error::RegistryError;

/// A parsed `docker://` image reference: registry host, repository path and
/// tag or digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry host, with optional port.
    pub registry: String,

    /// Repository path within the registry.
    pub repository: String,

    /// Tag or `sha256:` digest. Defaults to `latest`.
    pub reference: String,
}

impl ImageReference {
    /// Parses a reference in the forms accepted by the cron templates:
    /// `docker://host/repo:tag`, `docker://host/repo@sha256:...`, or the
    /// same without the `docker:` scheme.
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let s = raw.trim_start_matches("docker:");
        let s = s.trim_start_matches("//");

        let (host, rest) = s
            .split_once('/')
            .ok_or_else(|| RegistryError::InvalidReference(raw.to_string()))?;
        if host.is_empty() || rest.is_empty() {
            return Err(RegistryError::InvalidReference(raw.to_string()));
        }

        let (repository, reference) = if let Some((repo, digest)) = rest.split_once('@') {
            (repo, digest.to_string())
        } else if let Some((repo, tag)) = rest.rsplit_once(':') {
            // A colon in the last path segment is a tag separator; anywhere
            // else it would be part of the host, already split off above.
            if tag.contains('/') {
                (rest, "latest".to_string())
            } else {
                (repo, tag.to_string())
            }
        } else {
            (rest, "latest".to_string())
        };

        if repository.is_empty() || reference.is_empty() {
            return Err(RegistryError::InvalidReference(raw.to_string()));
        }

        Ok(ImageReference {
            registry: host.to_string(),
            repository: repository.to_string(),
            reference,
        })
    }

    /// The manifest endpoint URL for this reference.
    pub fn manifest_url(&self) -> String {
        format!(
            "https://{}/v2/{}/manifests/{}",
            self.registry, self.repository, self.reference
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_reference() {
        let r = ImageReference::parse("docker://quay.io/containerdisks/centos-stream:9").unwrap();
        assert_eq!(r.registry, "quay.io");
        assert_eq!(r.repository, "containerdisks/centos-stream");
        assert_eq!(r.reference, "9");
        assert_eq!(
            r.manifest_url(),
            "https://quay.io/v2/containerdisks/centos-stream/manifests/9"
        );
    }

    #[test]
    fn parses_digest_reference() {
        let r = ImageReference::parse("quay.io/containerdisks/fedora@sha256:abc123").unwrap();
        assert_eq!(r.reference, "sha256:abc123");
    }

    #[test]
    fn untagged_reference_defaults_to_latest() {
        let r = ImageReference::parse("docker://registry.example.com:5000/disks/rhel").unwrap();
        assert_eq!(r.registry, "registry.example.com:5000");
        assert_eq!(r.repository, "disks/rhel");
        assert_eq!(r.reference, "latest");
    }

    #[test]
    fn rejects_references_without_a_repository() {
        assert!(ImageReference::parse("docker://quay.io").is_err());
        assert!(ImageReference::parse("").is_err());
    }
}
