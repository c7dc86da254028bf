//! The cluster-critical PriorityClass used by all virtualization core pods.

use kube::core::GroupVersionKind;
use serde_json::json;

use crate::error::ControllerError;
use crate::request::ReconcileRequest;

use super::{DesiredResource, MergePolicy, OperandHandler, managed_labels};

pub const PRIORITY_CLASS_NAME: &str = "kubevirt-cluster-critical";

/// 1 billion is the highest value allowed for a non-builtin class.
const PRIORITY_VALUE: i64 = 1_000_000_000;

pub struct PriorityClassHandler;

impl OperandHandler for PriorityClassHandler {
    fn name(&self) -> &'static str {
        "PriorityClass"
    }

    fn desired(&self, req: &ReconcileRequest) -> Result<Vec<DesiredResource>, ControllerError> {
        let object = json!({
            "apiVersion": "scheduling.k8s.io/v1",
            "kind": "PriorityClass",
            "metadata": {
                "name": PRIORITY_CLASS_NAME,
                "labels": managed_labels(req, "compute"),
            },
            "value": PRIORITY_VALUE,
            "globalDefault": false,
            "description": "This priority class should be used for core virtualization components only.",
        });

        Ok(vec![DesiredResource {
            gvk: GroupVersionKind::gvk("scheduling.k8s.io", "v1", "PriorityClass"),
            plural: "priorityclasses",
            namespace: None,
            name: PRIORITY_CLASS_NAME.to_string(),
            object,
            policy: MergePolicy::default(),
        }])
    }
}
