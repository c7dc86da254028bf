//! Image-stream resolution: maps stream names to the image URL of their
//! first tag.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct ImageStream {
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    spec: ImageStreamSpec,
}

#[derive(Debug, Deserialize, Default)]
struct Metadata {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize, Default)]
struct ImageStreamSpec {
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    from: Option<TagReference>,
}

#[derive(Debug, Deserialize)]
struct TagReference {
    #[serde(default)]
    name: String,
}

/// Builds a map of image stream name to the image URL of its first tag from
/// the yaml files of `dir`.
pub fn build_image_stream_map(dir: &Path) -> anyhow::Result<HashMap<String, String>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("error reading image stream directory {}", dir.display()))?;

    let mut map = HashMap::new();
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file()
            || !matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        {
            continue;
        }

        info!("Reading ImageStream data from {}", path.display());
        let content = fs::read_to_string(&path)
            .with_context(|| format!("error reading image stream file {}", path.display()))?;
        let stream: ImageStream = serde_yaml::from_str(&content)
            .with_context(|| format!("can't parse image stream file {}", path.display()))?;

        if let Some(from) = stream.spec.tags.first().and_then(|t| t.from.as_ref()) {
            map.insert(stream.metadata.name.clone(), from.name.clone());
        }
    }

    Ok(map)
}
