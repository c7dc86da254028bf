//! The annotation pipeline over one template file.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use crds::shared::{DataImportCronTemplate, ANNOTATION_DICT_ARCHITECTURES};
use futures::future::try_join_all;
use registry_client::RegistryClientTrait;
use tracing::info;

use crate::cleanup;

/// Parses a yaml file holding a list of data-import-cron templates.
pub fn read_templates(filename: &Path) -> anyhow::Result<Vec<DataImportCronTemplate>> {
    info!("Reading DataImportCronTemplate file {}", filename.display());

    let raw = std::fs::read_to_string(filename).with_context(|| {
        format!(
            "error reading DataImportCronTemplate file {}",
            filename.display()
        )
    })?;
    serde_yaml::from_str(&raw).with_context(|| {
        format!(
            "error parsing the DataImportCronTemplate file {}",
            filename.display()
        )
    })
}

/// Stamps the supported-architectures annotation on every template whose
/// image has a manifest list. Manifest fetches run concurrently; the first
/// failure aborts the batch. Returns whether anything changed.
pub async fn annotate(
    templates: &mut [DataImportCronTemplate],
    registry: &dyn RegistryClientTrait,
    is_map: &HashMap<String, String>,
) -> anyhow::Result<bool> {
    info!("annotating the DataImportCronTemplate objects with the supported architectures");

    let work: Vec<(usize, String, String)> = templates
        .iter()
        .enumerate()
        .filter_map(|(i, dict)| {
            image_url(dict, is_map).map(|url| (i, dict.name().to_string(), url))
        })
        .collect();

    let fetches = work.iter().map(|(i, name, url)| async move {
        info!("Reading the manifest for DataImportCronTemplate object {name}; image: {url}");
        let arches = registry
            .image_architectures(url)
            .await
            .with_context(|| format!("error getting architectures for {url}"))?;
        Ok::<_, anyhow::Error>((*i, arches.join(",")))
    });
    let results = try_join_all(fetches).await?;

    let mut changed = false;
    for (i, arches) in results {
        let dict = &mut templates[i];
        if arches.is_empty() {
            info!("The image of {} is not a multi-architecture manifest", dict.name());
            continue;
        }

        let existing = dict.metadata.annotations.get(ANNOTATION_DICT_ARCHITECTURES);
        if existing.map(String::as_str) == Some(arches.as_str()) {
            continue;
        }

        info!(
            "Annotating the DataImportCronTemplate object {} with {}={:?}",
            dict.name(),
            ANNOTATION_DICT_ARCHITECTURES,
            arches
        );
        dict.metadata
            .annotations
            .insert(ANNOTATION_DICT_ARCHITECTURES.to_string(), arches);
        changed = true;
    }

    Ok(changed)
}

/// Renders the template list back to yaml and scrubs the marshalling noise.
pub fn render(templates: &[DataImportCronTemplate]) -> anyhow::Result<String> {
    let raw = serde_yaml::to_string(templates)
        .context("failed to marshal the DataImportCronTemplate list")?;
    Ok(cleanup::clean_output(&raw))
}

/// The effective image URL of a template: explicit registry URL first, then
/// image-stream lookup.
fn image_url(dict: &DataImportCronTemplate, is_map: &HashMap<String, String>) -> Option<String> {
    let registry = dict.spec.as_ref()?.template.spec.source.as_ref()?.registry.as_ref()?;

    if let Some(url) = &registry.url {
        return Some(url.clone());
    }
    if let Some(stream) = &registry.image_stream {
        return is_map.get(stream).cloned();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::shared::{
        DataImportCronSpec, DataVolumeSource, DataVolumeSourceRegistry, DataVolumeSpec,
        DataVolumeTemplate, TemplateMetadata,
    };
    use registry_client::MockRegistryClient;

    fn template(name: &str, url: Option<&str>, stream: Option<&str>) -> DataImportCronTemplate {
        DataImportCronTemplate {
            metadata: TemplateMetadata {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: Some(DataImportCronSpec {
                schedule: Some("0 */12 * * *".to_string()),
                template: DataVolumeTemplate {
                    spec: DataVolumeSpec {
                        source: Some(DataVolumeSource {
                            registry: Some(DataVolumeSourceRegistry {
                                url: url.map(String::from),
                                image_stream: stream.map(String::from),
                                pull_method: Some("node".to_string()),
                            }),
                        }),
                        storage: None,
                    },
                },
                ..Default::default()
            }),
        }
    }

    #[tokio::test]
    async fn stamps_multi_arch_images() {
        let registry = MockRegistryClient::new();
        registry.add_image("docker://quay.io/d/centos:9", &["amd64", "arm64", "s390x"]);

        let mut templates = vec![template("centos9", Some("docker://quay.io/d/centos:9"), None)];
        let changed = annotate(&mut templates, &registry, &HashMap::new())
            .await
            .unwrap();

        assert!(changed);
        assert_eq!(
            templates[0].metadata.annotations[ANNOTATION_DICT_ARCHITECTURES],
            "amd64,arm64,s390x"
        );
    }

    #[tokio::test]
    async fn single_arch_images_are_left_alone() {
        let registry = MockRegistryClient::new();
        registry.add_image("docker://quay.io/d/old:1", &[]);

        let mut templates = vec![template("old", Some("docker://quay.io/d/old:1"), None)];
        let changed = annotate(&mut templates, &registry, &HashMap::new())
            .await
            .unwrap();

        assert!(!changed);
        assert!(templates[0].metadata.annotations.is_empty());
    }

    #[tokio::test]
    async fn unchanged_annotation_reports_no_change() {
        let registry = MockRegistryClient::new();
        registry.add_image("docker://quay.io/d/centos:9", &["amd64", "arm64"]);

        let mut templates = vec![template("centos9", Some("docker://quay.io/d/centos:9"), None)];
        templates[0].metadata.annotations.insert(
            ANNOTATION_DICT_ARCHITECTURES.to_string(),
            "amd64,arm64".to_string(),
        );

        let changed = annotate(&mut templates, &registry, &HashMap::new())
            .await
            .unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn resolves_image_stream_references() {
        let registry = MockRegistryClient::new();
        registry.add_image("quay.io/containerdisks/fedora:41", &["amd64", "arm64"]);

        let is_map = HashMap::from([(
            "fedora".to_string(),
            "quay.io/containerdisks/fedora:41".to_string(),
        )]);
        let mut templates = vec![template("fedora", None, Some("fedora"))];

        let changed = annotate(&mut templates, &registry, &is_map).await.unwrap();
        assert!(changed);
    }

    #[tokio::test]
    async fn first_fetch_error_aborts_the_batch() {
        let registry = MockRegistryClient::new();
        registry.add_image("docker://quay.io/d/good:1", &["amd64", "arm64"]);
        registry.fail_image("docker://quay.io/d/bad:1", "503 - upstream down");

        let mut templates = vec![
            template("good", Some("docker://quay.io/d/good:1"), None),
            template("bad", Some("docker://quay.io/d/bad:1"), None),
        ];

        let err = annotate(&mut templates, &registry, &HashMap::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("docker://quay.io/d/bad:1"));
        assert!(templates[0].metadata.annotations.is_empty());
    }

    #[tokio::test]
    async fn templates_without_an_image_are_skipped() {
        let registry = MockRegistryClient::new();
        let mut templates = vec![template("no-image", None, Some("unknown-stream"))];

        let changed = annotate(&mut templates, &registry, &HashMap::new())
            .await
            .unwrap();
        assert!(!changed);
    }
}
