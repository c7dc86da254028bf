//! The network add-ons operand: a single cluster-scoped NetworkAddonsConfig
//! named `cluster`.

use kube::core::GroupVersionKind;
use serde_json::json;

use crate::error::ControllerError;
use crate::request::ReconcileRequest;

use super::{DesiredResource, MergePolicy, OperandHandler, managed_labels};

pub const NETWORK_ADDONS_NAME: &str = "cluster";

pub struct NetworkAddonsHandler;

impl OperandHandler for NetworkAddonsHandler {
    fn name(&self) -> &'static str {
        "NetworkAddonsConfig"
    }

    fn desired(&self, req: &ReconcileRequest) -> Result<Vec<DesiredResource>, ControllerError> {
        let spec = &req.hc.spec;

        let mut cnao_spec = json!({
            "multus": {},
            "linuxBridge": {},
            "kubeMacPool": {},
            // Always empty: the add-ons operator falls back to its own
            // per-image policy.
            "imagePullPolicy": "",
        });

        if req.gate_enabled("deployKubeSecondaryDNS") {
            cnao_spec["kubeSecondaryDNS"] = json!({});
        }
        if let Some(cert) = &spec.cert_config {
            cnao_spec["selfSignConfiguration"] = json!({
                "caRotateInterval": cert.ca.duration.as_ref(),
                "caOverlapInterval": cert.ca.renew_before.as_ref(),
                "certRotateInterval": cert.server.duration.as_ref(),
                "certOverlapInterval": cert.server.renew_before.as_ref(),
            });
        }
        if let Some(tls) = &spec.tls_security_profile {
            cnao_spec["tlsSecurityProfile"] = tls.clone();
        }

        let infra = super::infra_placement(req);
        let workloads = super::workloads_placement(req);
        if !infra.is_null() || !workloads.is_null() {
            let mut placement = json!({});
            if !infra.is_null() {
                placement["infra"] = infra;
            }
            if !workloads.is_null() {
                placement["workloads"] = workloads;
            }
            cnao_spec["placementConfiguration"] = placement;
        }

        let object = json!({
            "apiVersion": "networkaddonsoperator.network.kubevirt.io/v1",
            "kind": "NetworkAddonsConfig",
            "metadata": {
                "name": NETWORK_ADDONS_NAME,
                "labels": managed_labels(req, "network"),
            },
            "spec": cnao_spec,
        });

        Ok(vec![DesiredResource {
            gvk: GroupVersionKind::gvk(
                "networkaddonsoperator.network.kubevirt.io",
                "v1",
                "NetworkAddonsConfig",
            ),
            plural: "networkaddonsconfigs",
            namespace: None,
            name: NETWORK_ADDONS_NAME.to_string(),
            object,
            policy: MergePolicy {
                operator: &["/spec/imagePullPolicy"],
                ..Default::default()
            },
        }])
    }

    fn user_patch<'a>(&self, req: &'a ReconcileRequest) -> Option<&'a json_patch::Patch> {
        req.patches.network_addons.as_ref()
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
    fn pull_policy_is_always_empty() {
        let req = request_with(|_| {});
        let resources = NetworkAddonsHandler.desired(&req).unwrap();
        let cnao = &resources[0];

        assert_eq!(cnao.object["spec"]["imagePullPolicy"], "");
        assert!(cnao.policy.operator.contains(&"/spec/imagePullPolicy"));
    }

    #[test]
    fn secondary_dns_follows_its_gate() {
        let off = request_with(|_| {});
        let on = request_with(|hc| {
            hc.spec.feature_gates.deploy_kube_secondary_dns = Some(true);
        });

        let absent = NetworkAddonsHandler.desired(&off).unwrap();
        assert!(absent[0].object["spec"].get("kubeSecondaryDNS").is_none());

        let present = NetworkAddonsHandler.desired(&on).unwrap();
        assert_eq!(present[0].object["spec"]["kubeSecondaryDNS"], json!({}));
    }

    #[test]
    fn cert_config_maps_to_rotation_intervals() {
        let req = request_with(|_| {});
        let resources = NetworkAddonsHandler.desired(&req).unwrap();
        let self_sign = &resources[0].object["spec"]["selfSignConfiguration"];

        assert_eq!(self_sign["caRotateInterval"], "48h0m0s");
        assert_eq!(self_sign["certOverlapInterval"], "12h0m0s");
    }
}
