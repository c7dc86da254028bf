//! The data-import operand: a single cluster-scoped CDI CR.

use kube::core::GroupVersionKind;
use serde_json::json;

use crate::error::ControllerError;
use crate::request::ReconcileRequest;

use super::{DesiredResource, MergePolicy, OperandHandler, managed_labels};

pub const CDI_NAME: &str = "cdi-kubevirt-hyperconverged";

/// ConfigMap consumed by the VM import flow; carries the side-car images.
pub const IMPORT_CONFIG_MAP_NAME: &str = "v2v-vmware";

/// Marks the CDIConfig as operator-managed so CDI does not reconcile it
/// against user edits.
const CONFIG_AUTHORITY_ANNOTATION: &str = "cdi.kubevirt.io/configAuthority";

pub struct CdiHandler;

impl OperandHandler for CdiHandler {
    fn name(&self) -> &'static str {
        "CDI"
    }

    fn desired(&self, req: &ReconcileRequest) -> Result<Vec<DesiredResource>, ControllerError> {
        let spec = &req.hc.spec;

        let mut config = json!({
            "featureGates": ["HonorWaitForFirstConsumer"],
        });
        if let Some(class) = &spec.scratch_space_storage_class {
            config["scratchSpaceStorageClass"] = json!(class);
        }
        if let Some(tls) = &spec.tls_security_profile {
            config["tlsSecurityProfile"] = tls.clone();
        }
        let mut cdi_spec = json!({
            "uninstallStrategy": spec.uninstall_strategy,
            "config": config,
            "priorityClass": super::priority_class::PRIORITY_CLASS_NAME,
        });
        if let Some(cert) = &spec.cert_config {
            cdi_spec["certConfig"] = json!({
                "ca": cert.ca,
                "server": cert.server,
            });
        }
        let infra = super::infra_placement(req);
        if !infra.is_null() {
            cdi_spec["infra"] = infra;
        }
        let workloads = super::workloads_placement(req);
        if !workloads.is_null() {
            cdi_spec["workload"] = workloads;
        }

        let object = json!({
            "apiVersion": "cdi.kubevirt.io/v1beta1",
            "kind": "CDI",
            "metadata": {
                "name": CDI_NAME,
                "labels": managed_labels(req, "storage"),
                "annotations": {CONFIG_AUTHORITY_ANNOTATION: ""},
            },
            "spec": cdi_spec,
        });

        Ok(vec![
            DesiredResource {
                gvk: GroupVersionKind::gvk("cdi.kubevirt.io", "v1beta1", "CDI"),
                plural: "cdis",
                namespace: None,
                name: CDI_NAME.to_string(),
                object,
                policy: MergePolicy {
                    operator: &["/spec/uninstallStrategy", "/spec/priorityClass"],
                    ..Default::default()
                },
            },
            import_config_map(req)?,
        ])
    }

    fn user_patch<'a>(&self, req: &'a ReconcileRequest) -> Option<&'a json_patch::Patch> {
        req.patches.cdi.as_ref()
    }

    fn reports_conditions(&self) -> bool {
        true
    }
}

/// The ConfigMap the VM import flow reads the side-car images from. The
/// images come from the deployment environment; an empty value means the
/// deployment is broken and the pass must not paper over it.
fn import_config_map(req: &ReconcileRequest) -> Result<DesiredResource, ControllerError> {
    for (name, image) in [
        ("CONVERSION_CONTAINER", &req.env.conversion_container),
        ("VMWARE_CONTAINER", &req.env.vmware_container),
    ] {
        if image.is_empty() {
            return Err(ControllerError::InvalidConfig(format!(
                "{name} environment variable is required"
            )));
        }
    }

    Ok(DesiredResource {
        gvk: GroupVersionKind::gvk("", "v1", "ConfigMap"),
        plural: "configmaps",
        namespace: Some(req.namespace().to_string()),
        name: IMPORT_CONFIG_MAP_NAME.to_string(),
        object: json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": IMPORT_CONFIG_MAP_NAME,
                "namespace": req.namespace(),
                "labels": managed_labels(req, "storage"),
            },
            "data": {
                "v2v-conversion-image": req.env.conversion_container,
                "kubevirt-vmware-image": req.env.vmware_container,
            },
        }),
        policy: MergePolicy::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::request_with;

    #[test]
    fn cluster_scoped_with_config_authority() {
        let req = request_with(|_| {});
        let resources = CdiHandler.desired(&req).unwrap();
        let cdi = &resources[0];

        assert!(cdi.namespace.is_none());
        assert_eq!(
            cdi.object["metadata"]["annotations"][CONFIG_AUTHORITY_ANNOTATION],
            ""
        );
        assert_eq!(
            cdi.object["spec"]["uninstallStrategy"],
            "BlockUninstallIfWorkloadsExist"
        );
        assert_eq!(
            cdi.object["spec"]["config"]["featureGates"][0],
            "HonorWaitForFirstConsumer"
        );
    }

    #[test]
    fn scratch_space_class_propagates() {
        let req = request_with(|hc| {
            hc.spec.scratch_space_storage_class = Some("fast-ssd".to_string());
        });
        let resources = CdiHandler.desired(&req).unwrap();

        assert_eq!(
            resources[0].object["spec"]["config"]["scratchSpaceStorageClass"],
            "fast-ssd"
        );
    }

    #[test]
    fn import_config_map_carries_the_sidecar_images() {
        let req = request_with(|_| {});
        let resources = CdiHandler.desired(&req).unwrap();
        let cm = resources
            .iter()
            .find(|r| r.name == IMPORT_CONFIG_MAP_NAME)
            .unwrap();

        assert_eq!(cm.gvk.kind, "ConfigMap");
        assert_eq!(
            cm.object["data"]["v2v-conversion-image"],
            "quay.io/kubevirt/kubevirt-v2v-conversion:test"
        );
    }

    #[test]
    fn missing_sidecar_image_fails_the_pass() {
        let mut req = request_with(|_| {});
        req.env.conversion_container.clear();

        let err = CdiHandler.desired(&req).unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(_)));
    }

    #[test]
    fn cert_config_propagates_whole() {
        let req = request_with(|_| {});
        let resources = CdiHandler.desired(&req).unwrap();

        assert_eq!(
            resources[0].object["spec"]["certConfig"]["ca"]["duration"],
            "48h0m0s"
        );
    }
}
