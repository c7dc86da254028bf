//! The accelerator-image-enforcement webhook bundle, gated on the
//! `deployAIEWebhook` feature gate: ServiceAccount, RBAC, launcher config
//! map, Deployment, Service and the MutatingWebhookConfiguration.

use kube::core::GroupVersionKind;
use serde_json::json;
use std::fmt::Write as _;

use crate::error::ControllerError;
use crate::request::ReconcileRequest;

use super::{DesiredResource, MergePolicy, OperandHandler, managed_labels, owner_reference};

pub const AIE_WEBHOOK_NAME: &str = "kubevirt-aie-webhook";
pub const AIE_CONFIG_MAP_NAME: &str = "kubevirt-aie-launcher-config";
const AIE_CERTIFICATE_NAME: &str = "kubevirt-aie-webhook-tls";
const WEBHOOK_PORT: u16 = 9443;

const DEFAULT_WEBHOOK_IMAGE: &str = "quay.io/kubevirt/aie-webhook:latest";

pub struct AieWebhookHandler;

impl OperandHandler for AieWebhookHandler {
    fn name(&self) -> &'static str {
        "AIEWebhook"
    }

    fn enabled(&self, req: &ReconcileRequest) -> bool {
        req.gate_enabled("deployAIEWebhook")
    }

    fn desired(&self, req: &ReconcileRequest) -> Result<Vec<DesiredResource>, ControllerError> {
        let namespace = req.namespace().to_string();
        let labels = managed_labels(req, "compute");

        let service_account = json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {
                "name": AIE_WEBHOOK_NAME,
                "namespace": namespace.as_str(),
                "labels": labels,
                "ownerReferences": owner_reference(req),
            },
        });

        let cluster_role = json!({
            "apiVersion": "rbac.authorization.k8s.io/v1",
            "kind": "ClusterRole",
            "metadata": {
                "name": AIE_WEBHOOK_NAME,
                "labels": labels,
            },
            "rules": [
                {
                    "apiGroups": [""],
                    "resources": ["pods"],
                    "verbs": ["get", "list", "watch"],
                },
                {
                    "apiGroups": ["kubevirt.io"],
                    "resources": ["virtualmachines", "virtualmachineinstances"],
                    "verbs": ["get", "list", "watch"],
                },
            ],
        });

        let cluster_role_binding = json!({
            "apiVersion": "rbac.authorization.k8s.io/v1",
            "kind": "ClusterRoleBinding",
            "metadata": {
                "name": AIE_WEBHOOK_NAME,
                "labels": labels,
            },
            "roleRef": {
                "apiGroup": "rbac.authorization.k8s.io",
                "kind": "ClusterRole",
                "name": AIE_WEBHOOK_NAME,
            },
            "subjects": [{
                "kind": "ServiceAccount",
                "name": AIE_WEBHOOK_NAME,
                "namespace": namespace.as_str(),
            }],
        });

        let config_map = json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": AIE_CONFIG_MAP_NAME,
                "namespace": namespace.as_str(),
                "labels": labels,
                "ownerReferences": owner_reference(req),
            },
            "data": {
                "config.yaml": render_launcher_config(req),
            },
        });

        let deployment = json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": AIE_WEBHOOK_NAME,
                "namespace": namespace.as_str(),
                "labels": labels,
                "ownerReferences": owner_reference(req),
            },
            "spec": {
                "replicas": 1,
                "selector": {"matchLabels": {"app.kubernetes.io/name": AIE_WEBHOOK_NAME}},
                "template": {
                    "metadata": {"labels": {"app.kubernetes.io/name": AIE_WEBHOOK_NAME}},
                    "spec": {
                        "serviceAccountName": AIE_WEBHOOK_NAME,
                        "priorityClassName": super::priority_class::PRIORITY_CLASS_NAME,
                        "containers": [{
                            "name": AIE_WEBHOOK_NAME,
                            "image": DEFAULT_WEBHOOK_IMAGE,
                            "ports": [{"containerPort": WEBHOOK_PORT, "protocol": "TCP"}],
                            "volumeMounts": [
                                {
                                    "name": "launcher-config",
                                    "mountPath": "/etc/aie-webhook",
                                    "readOnly": true,
                                },
                                {
                                    "name": "tls",
                                    "mountPath": "/var/serving-cert",
                                    "readOnly": true,
                                },
                            ],
                        }],
                        "volumes": [
                            {
                                "name": "launcher-config",
                                "configMap": {"name": AIE_CONFIG_MAP_NAME},
                            },
                            {
                                "name": "tls",
                                "secret": {"secretName": AIE_CERTIFICATE_NAME},
                            },
                        ],
                    },
                },
            },
        });

        let service = json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {
                "name": AIE_WEBHOOK_NAME,
                "namespace": namespace.as_str(),
                "labels": labels,
                "annotations": {
                    "service.beta.openshift.io/serving-cert-secret-name": AIE_CERTIFICATE_NAME,
                },
                "ownerReferences": owner_reference(req),
            },
            "spec": {
                "selector": {"app.kubernetes.io/name": AIE_WEBHOOK_NAME},
                "ports": [{"port": 443, "targetPort": WEBHOOK_PORT, "protocol": "TCP"}],
            },
        });

        let webhook_configuration = json!({
            "apiVersion": "admissionregistration.k8s.io/v1",
            "kind": "MutatingWebhookConfiguration",
            "metadata": {
                "name": AIE_WEBHOOK_NAME,
                "labels": labels,
                "annotations": {
                    "service.beta.openshift.io/inject-cabundle": "true",
                },
            },
            "webhooks": [{
                "name": "virt-launcher-mutator.kubevirt.io",
                "admissionReviewVersions": ["v1"],
                "sideEffects": "None",
                "failurePolicy": "Fail",
                "clientConfig": {
                    "service": {
                        "name": AIE_WEBHOOK_NAME,
                        "namespace": namespace.as_str(),
                        "path": "/mutate-pods",
                        "port": 443,
                    },
                },
                "objectSelector": {
                    "matchLabels": {"kubevirt.io": "virt-launcher"},
                },
                "rules": [{
                    "operations": ["CREATE"],
                    "apiGroups": [""],
                    "apiVersions": ["v1"],
                    "resources": ["pods"],
                    "scope": "Namespaced",
                }],
            }],
        });

        Ok(vec![
            resource("", "v1", "ServiceAccount", "serviceaccounts", Some(&namespace), AIE_WEBHOOK_NAME, service_account),
            resource("rbac.authorization.k8s.io", "v1", "ClusterRole", "clusterroles", None, AIE_WEBHOOK_NAME, cluster_role),
            resource("rbac.authorization.k8s.io", "v1", "ClusterRoleBinding", "clusterrolebindings", None, AIE_WEBHOOK_NAME, cluster_role_binding),
            resource("", "v1", "ConfigMap", "configmaps", Some(&namespace), AIE_CONFIG_MAP_NAME, config_map),
            resource("apps", "v1", "Deployment", "deployments", Some(&namespace), AIE_WEBHOOK_NAME, deployment),
            resource("", "v1", "Service", "services", Some(&namespace), AIE_WEBHOOK_NAME, service),
            resource("admissionregistration.k8s.io", "v1", "MutatingWebhookConfiguration", "mutatingwebhookconfigurations", None, AIE_WEBHOOK_NAME, webhook_configuration),
        ])
    }
}

fn resource(
    group: &str,
    version: &str,
    kind: &str,
    plural: &'static str,
    namespace: Option<&str>,
    name: &str,
    object: serde_json::Value,
) -> DesiredResource {
    DesiredResource {
        gvk: GroupVersionKind::gvk(group, version, kind),
        plural,
        namespace: namespace.map(str::to_string),
        name: name.to_string(),
        object,
        policy: MergePolicy::default(),
    }
}

/// Renders the launcher rule list in the fixed layout the webhook parses.
fn render_launcher_config(req: &ReconcileRequest) -> String {
    let mut out = String::from("rules:\n");

    let Some(config) = &req.hc.spec.aie_webhook_config else {
        return out;
    };

    for rule in &config.rules {
        let _ = writeln!(out, "- name: {:?}", rule.name);
        let _ = writeln!(out, "  image: {:?}", rule.image);
        out.push_str("  selector:\n");

        if !rule.selector.device_names.is_empty() {
            out.push_str("    deviceNames:\n");
            for device in &rule.selector.device_names {
                let _ = writeln!(out, "    - {device:?}");
            }
        }

        if let Some(vm_labels) = &rule.selector.vm_labels {
            if !vm_labels.match_labels.is_empty() {
                out.push_str("    vmLabels:\n");
                out.push_str("      matchLabels:\n");
                for (key, value) in &vm_labels.match_labels {
                    let _ = writeln!(out, "        {key}: {value:?}");
                }
            }
        }
    }

    out
}
