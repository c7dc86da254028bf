//! The Passt network-binding bundle, gated on the
//! `hco.kubevirt.io/deployPasstNetworkBinding` annotation: a CNI installer
//! DaemonSet in the install namespace and a NetworkAttachmentDefinition in
//! `default`.

use kube::core::GroupVersionKind;
use serde_json::json;

use crate::error::ControllerError;
use crate::request::ReconcileRequest;

use super::{DesiredResource, MergePolicy, OperandHandler, managed_labels, owner_reference};

pub const PASST_CNI_NAME: &str = "passt-binding-cni";
pub const PASST_NAD_NAME: &str = "primary-udn-kubevirt-binding";

const DEFAULT_CNI_IMAGE: &str = "quay.io/kubevirt/passt-binding-cni:latest";

const NAD_CONFIG: &str = r#"{
  "cniVersion": "1.0.0",
  "name": "primary-udn-kubevirt-binding",
  "plugins": [
    {
      "type": "kubevirt-passt-binding"
    }
  ]
}"#;

pub struct PasstHandler;

impl OperandHandler for PasstHandler {
    fn name(&self) -> &'static str {
        "PasstBinding"
    }

    fn enabled(&self, req: &ReconcileRequest) -> bool {
        req.passt_enabled()
    }

    fn desired(&self, req: &ReconcileRequest) -> Result<Vec<DesiredResource>, ControllerError> {
        let namespace = req.namespace().to_string();
        let mut labels = managed_labels(req, "network");
        labels["tier"] = json!("node");

        let install_script = concat!(
            "ls -la \"/cni/kubevirt-passt-binding\"\n",
            "cp -f \"/cni/kubevirt-passt-binding\" \"/opt/cni/bin\"\n",
            "echo \"passt binding CNI plugin installation complete..sleep infinity\"\n",
            "sleep 2147483647",
        );

        let daemon_set = json!({
            "apiVersion": "apps/v1",
            "kind": "DaemonSet",
            "metadata": {
                "name": PASST_CNI_NAME,
                "namespace": namespace.as_str(),
                "labels": labels,
                "ownerReferences": owner_reference(req),
            },
            "spec": {
                "selector": {"matchLabels": {"name": PASST_CNI_NAME}},
                "updateStrategy": {
                    "type": "RollingUpdate",
                    "rollingUpdate": {"maxUnavailable": "10%"},
                },
                "template": {
                    "metadata": {
                        "labels": {
                            "name": PASST_CNI_NAME,
                            "tier": "node",
                            "app": PASST_CNI_NAME,
                        },
                    },
                    "spec": {
                        "priorityClassName": "system-cluster-critical",
                        "containers": [{
                            "name": "installer",
                            "image": DEFAULT_CNI_IMAGE,
                            "command": ["/bin/sh", "-ce"],
                            "args": [install_script],
                            "resources": {
                                "requests": {"cpu": "10m", "memory": "15Mi"},
                            },
                            "securityContext": {"privileged": true},
                            "volumeMounts": [{"name": "cnibin", "mountPath": "/opt/cni/bin"}],
                            "imagePullPolicy": "IfNotPresent",
                        }],
                        "volumes": [{
                            "name": "cnibin",
                            "hostPath": {"path": "/opt/cni/bin"},
                        }],
                    },
                },
            },
        });

        let nad = json!({
            "apiVersion": "k8s.cni.cncf.io/v1",
            "kind": "NetworkAttachmentDefinition",
            "metadata": {
                "name": PASST_NAD_NAME,
                "namespace": "default",
                "labels": managed_labels(req, "network"),
            },
            "spec": {"config": NAD_CONFIG},
        });

        Ok(vec![
            DesiredResource {
                gvk: GroupVersionKind::gvk("apps", "v1", "DaemonSet"),
                plural: "daemonsets",
                namespace: Some(namespace.clone()),
                name: PASST_CNI_NAME.to_string(),
                object: daemon_set,
                policy: MergePolicy::default(),
            },
            DesiredResource {
                gvk: GroupVersionKind::gvk("k8s.cni.cncf.io", "v1", "NetworkAttachmentDefinition"),
                plural: "network-attachment-definitions",
                namespace: Some("default".to_string()),
                name: PASST_NAD_NAME.to_string(),
                object: nad,
                policy: MergePolicy::default(),
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{find, request_with};

    fn annotated(value: &str) -> crate::request::ReconcileRequest {
        let value = value.to_string();
        request_with(move |hc| {
            hc.metadata
                .annotations
                .get_or_insert_default()
                .insert(crds::ANNOTATION_DEPLOY_PASST.to_string(), value);
        })
    }

    #[test]
    fn gated_on_the_annotation_value() {
        assert!(PasstHandler.enabled(&annotated("true")));
        assert!(!PasstHandler.enabled(&annotated("false")));
        assert!(!PasstHandler.enabled(&request_with(|_| {})));
    }

    #[test]
    fn nad_lives_in_the_default_namespace() {
        let resources = PasstHandler.desired(&annotated("true")).unwrap();
        let nad = find(&resources, "NetworkAttachmentDefinition", PASST_NAD_NAME).unwrap();

        assert_eq!(nad.namespace.as_deref(), Some("default"));
        assert!(
            nad.object["spec"]["config"]
                .as_str()
                .unwrap()
                .contains("kubevirt-passt-binding")
        );
    }

    #[test]
    fn installer_daemonset_is_privileged_and_node_tier() {
        let resources = PasstHandler.desired(&annotated("true")).unwrap();
        let ds = find(&resources, "DaemonSet", PASST_CNI_NAME).unwrap();

        let container = &ds.object["spec"]["template"]["spec"]["containers"][0];
        assert_eq!(container["securityContext"]["privileged"], true);
        assert_eq!(ds.object["metadata"]["labels"]["tier"], "node");
    }
}
