//! The managed-tenant-quota operand. The gate behind it is deprecated and
//! resolves to off, so this handler only ever removes leftovers from older
//! installations.

use kube::core::GroupVersionKind;
use serde_json::json;

use crate::error::ControllerError;
use crate::request::ReconcileRequest;

use super::{DesiredResource, MergePolicy, OperandHandler};

pub const MTQ_NAME: &str = "mtq-kubevirt-hyperconverged";

pub struct MtqHandler;

impl OperandHandler for MtqHandler {
    fn name(&self) -> &'static str {
        "MTQ"
    }

    fn enabled(&self, req: &ReconcileRequest) -> bool {
        req.gate_enabled("enableManagedTenantQuota")
    }

    fn desired(&self, _req: &ReconcileRequest) -> Result<Vec<DesiredResource>, ControllerError> {
        // Name-only: enough for the deletion path, never created since the
        // gate is final-off.
        Ok(vec![DesiredResource {
            gvk: GroupVersionKind::gvk("mtq.kubevirt.io", "v1alpha1", "MTQ"),
            plural: "mtqs",
            namespace: None,
            name: MTQ_NAME.to_string(),
            object: json!({
                "apiVersion": "mtq.kubevirt.io/v1alpha1",
                "kind": "MTQ",
                "metadata": {"name": MTQ_NAME},
            }),
            policy: MergePolicy::default(),
        }])
    }
}
