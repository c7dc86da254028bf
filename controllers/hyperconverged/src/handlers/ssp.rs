//! The scheduling sidecar operand: a single SSP CR in the install namespace.

use kube::core::GroupVersionKind;
use serde_json::json;

use crate::error::ControllerError;
use crate::request::ReconcileRequest;

use super::{DesiredResource, MergePolicy, OperandHandler, golden_images, managed_labels, owner_reference};

pub const SSP_NAME: &str = "ssp-kubevirt-hyperconverged";

/// Default namespace of the common VM templates.
const DEFAULT_COMMON_TEMPLATES_NAMESPACE: &str = "openshift";

const TEMPLATE_VALIDATOR_REPLICAS: u32 = 2;

pub struct SspHandler;

impl OperandHandler for SspHandler {
    fn name(&self) -> &'static str {
        "SSP"
    }

    fn desired(&self, req: &ReconcileRequest) -> Result<Vec<DesiredResource>, ControllerError> {
        let spec = &req.hc.spec;

        let templates_namespace = spec
            .common_templates_namespace
            .as_deref()
            .unwrap_or(DEFAULT_COMMON_TEMPLATES_NAMESPACE);

        // Single-worker clusters cannot honor the validator's anti-affinity.
        let replicas = if req.cluster.is_single_worker() {
            1
        } else {
            TEMPLATE_VALIDATOR_REPLICAS
        };

        let dict_templates = golden_images::effective_templates(req)?
            .into_iter()
            .map(|t| serde_json::to_value(t.template))
            .collect::<Result<Vec<_>, _>>()?;

        let mut ssp_spec = json!({
            "templateValidator": {
                "replicas": replicas,
            },
            "commonTemplates": {
                "namespace": templates_namespace,
                "dataImportCronTemplates": dict_templates,
            },
        });

        if let Some(tls) = &spec.tls_security_profile {
            ssp_spec["tlsSecurityProfile"] = tls.clone();
        }
        let workloads = super::workloads_placement(req);
        if !workloads.is_null() {
            ssp_spec["templateValidator"]["placement"] = workloads;
        }
        let object = json!({
            "apiVersion": "ssp.kubevirt.io/v1beta2",
            "kind": "SSP",
            "metadata": {
                "name": SSP_NAME,
                "namespace": req.namespace(),
                "labels": managed_labels(req, "schedule"),
                "ownerReferences": owner_reference(req),
            },
            "spec": ssp_spec,
        });

        Ok(vec![DesiredResource {
            gvk: GroupVersionKind::gvk("ssp.kubevirt.io", "v1beta2", "SSP"),
            plural: "ssps",
            namespace: Some(req.namespace().to_string()),
            name: SSP_NAME.to_string(),
            object,
            policy: MergePolicy {
                operator: &["/spec/commonTemplates/dataImportCronTemplates"],
                ..Default::default()
            },
        }])
    }

    fn user_patch<'a>(&self, req: &'a ReconcileRequest) -> Option<&'a json_patch::Patch> {
        req.patches.ssp.as_ref()
    }

    fn reports_conditions(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::request_with;

    #[test]
    fn dict_list_follows_the_boot_image_gate() {
        let on = request_with(|_| {});
        let with = SspHandler.desired(&on).unwrap();
        assert!(
            !with[0].object["spec"]["commonTemplates"]["dataImportCronTemplates"]
                .as_array()
                .unwrap()
                .is_empty()
        );

        let off = request_with(|hc| {
            hc.spec.feature_gates.enable_common_boot_image_import = Some(false);
        });
        let without = SspHandler.desired(&off).unwrap();
        assert!(
            without[0].object["spec"]["commonTemplates"]["dataImportCronTemplates"]
                .as_array()
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn validator_runs_single_replica_on_single_worker() {
        let mut req = request_with(|_| {});
        req.cluster.schedulable_workers = 1;

        let resources = SspHandler.desired(&req).unwrap();
        assert_eq!(
            resources[0].object["spec"]["templateValidator"]["replicas"],
            1
        );
    }

    #[test]
    fn templates_namespace_is_overridable() {
        let req = request_with(|hc| {
            hc.spec.common_templates_namespace = Some("custom-ns".to_string());
        });
        let resources = SspHandler.desired(&req).unwrap();

        assert_eq!(
            resources[0].object["spec"]["commonTemplates"]["namespace"],
            "custom-ns"
        );
    }
}
