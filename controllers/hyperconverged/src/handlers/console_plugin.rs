//! The web-console UI plugin: a Deployment, its Service and the ConsolePlugin
//! registration object.

use kube::core::GroupVersionKind;
use serde_json::json;

use crate::error::ControllerError;
use crate::request::ReconcileRequest;

use super::{DesiredResource, MergePolicy, OperandHandler, managed_labels, owner_reference};

pub const PLUGIN_NAME: &str = "kubevirt-plugin";
const SERVICE_NAME: &str = "kubevirt-plugin-service";
const SERVING_CERT_NAME: &str = "plugin-serving-cert";
const PLUGIN_PORT: u16 = 9443;

const DEFAULT_PLUGIN_IMAGE: &str = "quay.io/kubevirt-ui/kubevirt-plugin:latest";

pub struct ConsolePluginHandler;

impl OperandHandler for ConsolePluginHandler {
    fn name(&self) -> &'static str {
        "ConsolePlugin"
    }

    fn desired(&self, req: &ReconcileRequest) -> Result<Vec<DesiredResource>, ControllerError> {
        let namespace = req.namespace().to_string();
        let labels = managed_labels(req, "deployment");

        let deployment = json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": PLUGIN_NAME,
                "namespace": namespace.as_str(),
                "labels": labels.clone(),
                "ownerReferences": owner_reference(req),
            },
            "spec": {
                "replicas": 1,
                "selector": {"matchLabels": {"app.kubernetes.io/name": PLUGIN_NAME}},
                "template": {
                    "metadata": {"labels": {"app.kubernetes.io/name": PLUGIN_NAME}},
                    "spec": {
                        "containers": [{
                            "name": PLUGIN_NAME,
                            "image": DEFAULT_PLUGIN_IMAGE,
                            "ports": [{"containerPort": PLUGIN_PORT, "protocol": "TCP"}],
                            "volumeMounts": [{
                                "name": SERVING_CERT_NAME,
                                "mountPath": "/var/serving-cert",
                                "readOnly": true,
                            }],
                        }],
                        "volumes": [{
                            "name": SERVING_CERT_NAME,
                            "secret": {"secretName": SERVING_CERT_NAME},
                        }],
                        "priorityClassName": super::priority_class::PRIORITY_CLASS_NAME,
                    },
                },
            },
        });

        let service = json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {
                "name": SERVICE_NAME,
                "namespace": namespace.as_str(),
                "labels": labels.clone(),
                "annotations": {
                    "service.beta.openshift.io/serving-cert-secret-name": SERVING_CERT_NAME,
                },
                "ownerReferences": owner_reference(req),
            },
            "spec": {
                "selector": {"app.kubernetes.io/name": PLUGIN_NAME},
                "ports": [{"port": PLUGIN_PORT, "targetPort": PLUGIN_PORT, "protocol": "TCP"}],
            },
        });

        let console_plugin = json!({
            "apiVersion": "console.openshift.io/v1",
            "kind": "ConsolePlugin",
            "metadata": {
                "name": PLUGIN_NAME,
                "labels": labels,
            },
            "spec": {
                "displayName": "Kubevirt Console Plugin",
                "backend": {
                    "type": "Service",
                    "service": {
                        "name": SERVICE_NAME,
                        "namespace": namespace.as_str(),
                        "port": PLUGIN_PORT,
                        "basePath": "/",
                    },
                },
            },
        });

        Ok(vec![
            DesiredResource {
                gvk: GroupVersionKind::gvk("apps", "v1", "Deployment"),
                plural: "deployments",
                namespace: Some(namespace.clone()),
                name: PLUGIN_NAME.to_string(),
                object: deployment,
                policy: MergePolicy::default(),
            },
            DesiredResource {
                gvk: GroupVersionKind::gvk("", "v1", "Service"),
                plural: "services",
                namespace: Some(namespace.clone()),
                name: SERVICE_NAME.to_string(),
                object: service,
                policy: MergePolicy {
                    // The API server assigns clusterIP; never fight it.
                    preserve: &["/spec/clusterIP", "/spec/clusterIPs"],
                    ..Default::default()
                },
            },
            DesiredResource {
                gvk: GroupVersionKind::gvk("console.openshift.io", "v1", "ConsolePlugin"),
                plural: "consoleplugins",
                namespace: None,
                name: PLUGIN_NAME.to_string(),
                object: console_plugin,
                policy: MergePolicy::default(),
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{find, request};

    #[test]
    fn plugin_bundle_has_deployment_service_and_registration() {
        let resources = ConsolePluginHandler.desired(&request()).unwrap();
        assert_eq!(resources.len(), 3);

        let service = find(&resources, "Service", SERVICE_NAME).unwrap();
        assert_eq!(
            service.object["metadata"]["annotations"]
                ["service.beta.openshift.io/serving-cert-secret-name"],
            SERVING_CERT_NAME
        );

        let registration = find(&resources, "ConsolePlugin", PLUGIN_NAME).unwrap();
        assert!(registration.namespace.is_none());
        assert_eq!(
            registration.object["spec"]["backend"]["service"]["name"],
            SERVICE_NAME
        );
    }
}
