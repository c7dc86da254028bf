//! Operand handlers: pure projections from the HyperConverged CR to the
//! desired child resources, plus the merge policy the engine applies when a
//! child already exists.
//!
//! The engine iterates a fixed, ordered handler list; each handler only
//! builds JSON objects and never talks to the cluster itself.

pub mod aie_webhook;
pub mod cdi;
pub mod console_plugin;
pub mod golden_images;
pub mod kubevirt;
pub mod merge;
pub mod mtq;
pub mod network_addons;
pub mod passt;
pub mod priority_class;
pub mod ssp;
pub mod wasp_agent;

use kube::api::ApiResource;
use kube::core::GroupVersionKind;
use serde_json::{Value, json};

use crate::error::ControllerError;
use crate::request::ReconcileRequest;

/// Per-field merge policy of one child resource. Pointers are JSON pointers
/// into the object.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergePolicy {
    /// Operator-managed pointers: re-forced after a user jsonpatch was
    /// applied to the desired object.
    pub operator: &'static [&'static str],

    /// Third-party pointers preserved from the live object across passes.
    pub preserve: &'static [&'static str],

    /// Preserved pointers that are still force-refreshed in upgrade mode.
    pub force_on_upgrade: &'static [&'static str],
}

/// One child resource a handler wants to exist (or, when the handler is
/// gated off, to be absent).
#[derive(Debug, Clone)]
pub struct DesiredResource {
    /// Group/version/kind of the child.
    pub gvk: GroupVersionKind,

    /// Plural resource name for the dynamic API.
    pub plural: &'static str,

    /// Namespace; None for cluster-scoped children.
    pub namespace: Option<String>,

    /// Object name.
    pub name: String,

    /// The full desired object, including metadata.
    pub object: Value,

    /// Merge policy when the child already exists.
    pub policy: MergePolicy,
}

impl DesiredResource {
    /// The dynamic-API descriptor of the child.
    pub fn api_resource(&self) -> ApiResource {
        ApiResource::from_gvk_with_plural(&self.gvk, self.plural)
    }
}

/// Capability set of one operand.
pub trait OperandHandler: Send + Sync {
    /// Component name used in condition reasons and metrics labels.
    fn name(&self) -> &'static str;

    /// Whether the operand's resources should exist for this CR. Gated-off
    /// operands get their resources deleted instead.
    fn enabled(&self, _req: &ReconcileRequest) -> bool {
        true
    }

    /// The desired child resources, in apply order.
    fn desired(&self, req: &ReconcileRequest) -> Result<Vec<DesiredResource>, ControllerError>;

    /// The user jsonpatch targeting this operand, if any.
    fn user_patch<'a>(&self, _req: &'a ReconcileRequest) -> Option<&'a json_patch::Patch> {
        None
    }

    /// Whether the first child is a composite CR whose status conditions
    /// feed the CR-level condition aggregation.
    fn reports_conditions(&self) -> bool {
        false
    }
}

/// The fixed handler order: leaf infrastructure first, composites next,
/// gated bundles last.
pub fn handler_chain() -> Vec<Box<dyn OperandHandler>> {
    vec![
        Box::new(priority_class::PriorityClassHandler),
        Box::new(kubevirt::KubeVirtHandler),
        Box::new(cdi::CdiHandler),
        Box::new(network_addons::NetworkAddonsHandler),
        Box::new(ssp::SspHandler),
        Box::new(golden_images::GoldenImagesHandler),
        Box::new(console_plugin::ConsolePluginHandler),
        Box::new(aie_webhook::AieWebhookHandler),
        Box::new(passt::PasstHandler),
        Box::new(wasp_agent::WaspAgentHandler),
        Box::new(mtq::MtqHandler),
    ]
}

/// The labels stamped on every managed child.
pub fn managed_labels(req: &ReconcileRequest, component: &str) -> Value {
    json!({
        "app": "kubevirt-hyperconverged",
        "app.kubernetes.io/managed-by": "hco-operator",
        "app.kubernetes.io/component": component,
        "app.kubernetes.io/part-of": "hyperconverged-cluster",
        "app.kubernetes.io/version": req.env.operator_version,
    })
}

/// Owner reference to the CR for namespaced children; cluster-scoped ones
/// are adopted by labels only.
pub fn owner_reference(req: &ReconcileRequest) -> Value {
    json!([{
        "apiVersion": "hco.kubevirt.io/v1beta1",
        "kind": "HyperConverged",
        "name": req.hc.metadata.name.as_deref().unwrap_or(crds::HYPERCONVERGED_NAME),
        "uid": req.hc.metadata.uid.as_deref().unwrap_or_default(),
        "controller": true,
        "blockOwnerDeletion": false,
    }])
}

/// Node placement of the infra profile as a JSON value, or null.
pub fn infra_placement(req: &ReconcileRequest) -> Value {
    placement(req.hc.spec.infra.as_ref())
}

/// Node placement of the workloads profile as a JSON value, or null.
pub fn workloads_placement(req: &ReconcileRequest) -> Value {
    placement(req.hc.spec.workloads.as_ref())
}

fn placement(config: Option<&crds::shared::HyperConvergedConfig>) -> Value {
    config
        .and_then(|c| c.node_placement.as_ref())
        .filter(|p| !p.is_empty())
        .and_then(|p| serde_json::to_value(p).ok())
        .unwrap_or(Value::Null)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_order_is_deterministic() {
        let names: Vec<&str> = handler_chain().iter().map(|h| h.name()).collect();
        assert_eq!(
            names,
            vec![
                "PriorityClass",
                "KubeVirt",
                "CDI",
                "NetworkAddonsConfig",
                "SSP",
                "GoldenImages",
                "ConsolePlugin",
                "AIEWebhook",
                "PasstBinding",
                "WaspAgent",
                "MTQ",
            ]
        );
    }

    #[test]
    fn placement_is_null_when_unset() {
        let req = test_support::request();
        assert_eq!(infra_placement(&req), Value::Null);
    }

    #[test]
    fn placement_carries_selector_and_tolerations() {
        let req = test_support::request_with(|hc| {
            hc.spec.infra = Some(crds::shared::HyperConvergedConfig {
                node_placement: Some(crds::shared::NodePlacement {
                    node_selector: [("key1".to_string(), "value1".to_string())].into(),
                    ..Default::default()
                }),
            });
        });

        let placement = infra_placement(&req);
        assert_eq!(placement["nodeSelector"]["key1"], "value1");
    }
}
