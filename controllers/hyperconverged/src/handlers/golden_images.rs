//! Bootable golden images: the shipped image streams and the effective
//! data-import-cron template set, both gated on
//! `enableCommonBootImageImport`.
//!
//! The SSP handler and the status writer consume [`effective_templates`];
//! this handler itself owns the ImageStream children.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use kube::core::GroupVersionKind;
use serde_json::json;

use crds::shared::{DataImportCronStatus, DataImportCronTemplate, DataImportCronTemplateStatus};

use crate::error::ControllerError;
use crate::request::ReconcileRequest;
use crate::stream;

use super::{DesiredResource, MergePolicy, OperandHandler, managed_labels};

/// The common templates shipped with the operator.
const COMMON_TEMPLATES_YAML: &str = include_str!("data_import_cron_templates.yaml");

/// Image streams backing templates that pull through the internal registry.
const IMAGE_STREAMS: &[(&str, &str)] = &[
    ("centos8", "quay.io/containerdisks/centos:8.4"),
    ("centos-stream9", "quay.io/containerdisks/centos-stream:9"),
    ("fedora", "quay.io/containerdisks/fedora:latest"),
];

pub struct GoldenImagesHandler;

impl OperandHandler for GoldenImagesHandler {
    fn name(&self) -> &'static str {
        "GoldenImages"
    }

    fn enabled(&self, req: &ReconcileRequest) -> bool {
        req.gate_enabled("enableCommonBootImageImport")
    }

    fn desired(&self, req: &ReconcileRequest) -> Result<Vec<DesiredResource>, ControllerError> {
        let namespace = req.env.images_namespace().to_string();

        Ok(stream::map_pairs(
            IMAGE_STREAMS.iter().copied(),
            |name, image| DesiredResource {
                gvk: GroupVersionKind::gvk("image.openshift.io", "v1", "ImageStream"),
                plural: "imagestreams",
                namespace: Some(namespace.clone()),
                name: name.to_string(),
                object: json!({
                    "apiVersion": "image.openshift.io/v1",
                    "kind": "ImageStream",
                    "metadata": {
                        "name": name,
                        "namespace": namespace.as_str(),
                        "labels": managed_labels(req, "storage"),
                    },
                    "spec": {
                        "tags": [{
                            "name": "latest",
                            "from": {"kind": "DockerImage", "name": image},
                            "importPolicy": {"scheduled": true},
                        }],
                    },
                }),
                policy: MergePolicy::default(),
            })
            .collect())
    }
}

/// The shipped common templates, parsed from the bundled manifest.
pub fn common_templates() -> Result<Vec<DataImportCronTemplate>, ControllerError> {
    serde_yaml::from_str(COMMON_TEMPLATES_YAML)
        .map_err(|e| ControllerError::InvalidConfig(format!("bundled templates: {e}")))
}

/// The effective template set with provenance: the shipped common templates
/// with user entries of the same name overriding them, plus user-only
/// entries. Empty when the boot-image gate is off.
pub fn effective_templates(
    req: &ReconcileRequest,
) -> Result<Vec<DataImportCronTemplateStatus>, ControllerError> {
    if !req.gate_enabled("enableCommonBootImageImport") {
        return Ok(Vec::new());
    }

    let mut result: Vec<DataImportCronTemplateStatus> = common_templates()?
        .into_iter()
        .map(|template| DataImportCronTemplateStatus {
            template,
            status: DataImportCronStatus {
                common_template: true,
                modified: false,
            },
        })
        .collect();

    for template in &req.hc.spec.data_import_cron_templates {
        match result.iter_mut().find(|t| t.template.name() == template.name()) {
            Some(existing) => {
                existing.template = template.clone();
                existing.status.modified = true;
            }
            None => result.push(DataImportCronTemplateStatus {
                template: template.clone(),
                status: DataImportCronStatus::default(),
            }),
        }
    }

    Ok(result)
}

/// The randomized-but-stable twice-daily import schedule for this CR.
/// Derived from the CR uid so it survives operator restarts.
pub fn import_schedule(req: &ReconcileRequest) -> String {
    if let Some(existing) = req
        .hc
        .status
        .as_ref()
        .map(|s| s.data_import_schedule.as_str())
        .filter(|s| !s.is_empty())
    {
        return existing.to_string();
    }

    let mut hasher = DefaultHasher::new();
    req.hc.metadata.uid.hash(&mut hasher);
    let seed = hasher.finish();
    format!("{} {}/12 * * *", seed % 60, (seed / 60) % 12)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::request_with;

    #[test]
    fn bundled_templates_parse_with_sources() {
        let templates = common_templates().unwrap();
        assert!(!templates.is_empty());
        assert!(templates.iter().any(|t| t.name() == "centos-stream9-image-cron"));
    }

    #[test]
    fn gate_off_means_no_streams_and_no_templates() {
        let req = request_with(|hc| {
            hc.spec.feature_gates.enable_common_boot_image_import = Some(false);
        });

        assert!(!GoldenImagesHandler.enabled(&req));
        assert!(effective_templates(&req).unwrap().is_empty());
    }

    #[test]
    fn custom_template_overriding_a_common_one_is_marked_modified() {
        let common_name = common_templates().unwrap()[0].name().to_string();
        let req = request_with(move |hc| {
            let mut template = DataImportCronTemplate::default();
            template.metadata.name = Some(common_name);
            hc.spec.data_import_cron_templates = vec![template];
        });

        let templates = effective_templates(&req).unwrap();
        let overridden = templates
            .iter()
            .find(|t| t.status.modified)
            .unwrap();
        assert!(overridden.status.common_template);
    }

    #[test]
    fn custom_only_template_is_not_a_common_one() {
        let req = request_with(|hc| {
            let mut template = DataImportCronTemplate::default();
            template.metadata.name = Some("my-own-image-cron".to_string());
            hc.spec.data_import_cron_templates = vec![template];
        });

        let templates = effective_templates(&req).unwrap();
        let custom = templates
            .iter()
            .find(|t| t.template.name() == "my-own-image-cron")
            .unwrap();
        assert!(!custom.status.common_template);
    }

    #[test]
    fn schedule_is_stable_per_uid_and_sticky_once_published() {
        let req = request_with(|_| {});
        let first = import_schedule(&req);
        assert_eq!(first, import_schedule(&req));

        let published = request_with(|hc| {
            hc.status = Some(crds::shared::HyperConvergedStatus {
                data_import_schedule: "42 7/12 * * *".to_string(),
                ..Default::default()
            });
        });
        assert_eq!(import_schedule(&published), "42 7/12 * * *");
    }
}
