//! The wasp-agent bundle enabling higher workload density through swap,
//! gated on the swap feature gate or an overcommit percentage above 100.

use kube::core::GroupVersionKind;
use serde_json::json;

use crate::error::ControllerError;
use crate::request::ReconcileRequest;

use super::{DesiredResource, MergePolicy, OperandHandler, managed_labels, owner_reference};

pub const WASP_AGENT_NAME: &str = "wasp-agent";
const WASP_SERVICE_ACCOUNT: &str = "wasp";

const DEFAULT_WASP_IMAGE: &str = "quay.io/openshift-virtualization/wasp-agent:latest";

pub struct WaspAgentHandler;

impl OperandHandler for WaspAgentHandler {
    fn name(&self) -> &'static str {
        "WaspAgent"
    }

    fn enabled(&self, req: &ReconcileRequest) -> bool {
        req.swap_density_enabled()
    }

    fn desired(&self, req: &ReconcileRequest) -> Result<Vec<DesiredResource>, ControllerError> {
        let namespace = req.namespace().to_string();
        let labels = managed_labels(req, "compute");

        let service_account = json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {
                "name": WASP_SERVICE_ACCOUNT,
                "namespace": namespace.as_str(),
                "labels": labels,
                "ownerReferences": owner_reference(req),
            },
        });

        let scc = json!({
            "apiVersion": "security.openshift.io/v1",
            "kind": "SecurityContextConstraints",
            "metadata": {
                "name": WASP_AGENT_NAME,
                "labels": labels,
            },
            "allowPrivilegedContainer": true,
            "allowHostDirVolumePlugin": true,
            "allowHostPID": true,
            "allowHostNetwork": false,
            "allowHostPorts": false,
            "allowHostIPC": false,
            "runAsUser": {"type": "RunAsAny"},
            "seLinuxContext": {"type": "RunAsAny"},
            "users": [format!("system:serviceaccount:{namespace}:{WASP_SERVICE_ACCOUNT}")],
            "volumes": ["*"],
        });

        let mut container = json!({
            "name": WASP_AGENT_NAME,
            "image": DEFAULT_WASP_IMAGE,
            "imagePullPolicy": "IfNotPresent",
            "env": [
                {"name": "FSROOT", "value": "/host"},
                {
                    "name": "NODE_NAME",
                    "valueFrom": {"fieldRef": {"fieldPath": "spec.nodeName"}},
                },
            ],
            "resources": {
                "requests": {"cpu": "100m", "memory": "50Mi"},
            },
            "securityContext": {"privileged": true},
            "volumeMounts": [{"name": "host", "mountPath": "/host"}],
        });
        if req.wasp_dry_run() {
            if let Some(env) = container["env"].as_array_mut() {
                env.push(json!({"name": "DRY_RUN", "value": "true"}));
            }
        }

        let daemon_set = json!({
            "apiVersion": "apps/v1",
            "kind": "DaemonSet",
            "metadata": {
                "name": WASP_AGENT_NAME,
                "namespace": namespace.as_str(),
                "labels": labels,
                "ownerReferences": owner_reference(req),
            },
            "spec": {
                "selector": {"matchLabels": {"name": WASP_AGENT_NAME}},
                "updateStrategy": {
                    "type": "RollingUpdate",
                    "rollingUpdate": {"maxUnavailable": "10%"},
                },
                "template": {
                    "metadata": {"labels": {"name": WASP_AGENT_NAME, "tier": "node"}},
                    "spec": {
                        "serviceAccountName": WASP_SERVICE_ACCOUNT,
                        "hostPID": true,
                        "priorityClassName": "system-node-critical",
                        "containers": [container],
                        "volumes": [{
                            "name": "host",
                            "hostPath": {"path": "/"},
                        }],
                    },
                },
            },
        });

        Ok(vec![
            DesiredResource {
                gvk: GroupVersionKind::gvk("", "v1", "ServiceAccount"),
                plural: "serviceaccounts",
                namespace: Some(namespace.clone()),
                name: WASP_SERVICE_ACCOUNT.to_string(),
                object: service_account,
                policy: MergePolicy::default(),
            },
            DesiredResource {
                gvk: GroupVersionKind::gvk(
                    "security.openshift.io",
                    "v1",
                    "SecurityContextConstraints",
                ),
                plural: "securitycontextconstraints",
                namespace: None,
                name: WASP_AGENT_NAME.to_string(),
                object: scc,
                policy: MergePolicy::default(),
            },
            DesiredResource {
                gvk: GroupVersionKind::gvk("apps", "v1", "DaemonSet"),
                plural: "daemonsets",
                namespace: Some(namespace.clone()),
                name: WASP_AGENT_NAME.to_string(),
                object: daemon_set,
                policy: MergePolicy::default(),
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{find, request_with};

    #[test]
    fn gate_or_overcommit_enables_the_bundle() {
        let by_gate = request_with(|hc| {
            hc.spec.feature_gates.enable_higher_density_with_swap = Some(true);
        });
        assert!(WaspAgentHandler.enabled(&by_gate));

        let by_overcommit = request_with(|hc| {
            hc.spec.higher_workload_density = Some(crds::shared::HigherWorkloadDensity {
                memory_overcommit_percentage: Some(150),
            });
        });
        assert!(WaspAgentHandler.enabled(&by_overcommit));

        assert!(!WaspAgentHandler.enabled(&request_with(|_| {})));
    }

    #[test]
    fn dry_run_annotation_reaches_the_agent_environment() {
        let req = request_with(|hc| {
            hc.spec.feature_gates.enable_higher_density_with_swap = Some(true);
            hc.metadata
                .annotations
                .get_or_insert_default()
                .insert(crds::ANNOTATION_WASP_DRY_RUN.to_string(), "true".to_string());
        });

        let resources = WaspAgentHandler.desired(&req).unwrap();
        let ds = find(&resources, "DaemonSet", WASP_AGENT_NAME).unwrap();
        let env = ds.object["spec"]["template"]["spec"]["containers"][0]["env"]
            .as_array()
            .unwrap()
            .clone();

        assert!(env.iter().any(|e| e["name"] == "DRY_RUN"));
    }

    #[test]
    fn scc_grants_the_wasp_service_account() {
        let req = request_with(|hc| {
            hc.spec.feature_gates.enable_higher_density_with_swap = Some(true);
        });
        let resources = WaspAgentHandler.desired(&req).unwrap();
        let scc = find(&resources, "SecurityContextConstraints", WASP_AGENT_NAME).unwrap();

        assert_eq!(
            scc.object["users"][0],
            "system:serviceaccount:kubevirt-hyperconverged:wasp"
        );
    }
}
