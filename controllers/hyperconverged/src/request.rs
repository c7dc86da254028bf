//! Per-pass reconcile request: the CR snapshot plus everything derived from
//! it once, so the operand builders stay pure.

use crds::registry;
use crds::shared::{
    ANNOTATION_CDI_JSONPATCH, ANNOTATION_CNAO_JSONPATCH, ANNOTATION_DEPLOY_PASST,
    ANNOTATION_KUBEVIRT_JSONPATCH, ANNOTATION_SSP_JSONPATCH, ANNOTATION_TUNING_POLICY,
    ANNOTATION_WASP_DRY_RUN, TuningPolicy,
};
use crds::v1beta1::HyperConverged;
use json_patch::Patch;

use crate::env::OperatorEnv;
use crate::error::ControllerError;
use crate::nodeinfo::ClusterInfo;

/// JSON-patch annotations parsed once per pass.
#[derive(Debug, Default)]
pub struct ComponentPatches {
    /// Patch for the virtualization child.
    pub kubevirt: Option<Patch>,
    /// Patch for the data-import child.
    pub cdi: Option<Patch>,
    /// Patch for the network add-ons child.
    pub network_addons: Option<Patch>,
    /// Patch for the scheduling sidecar child.
    pub ssp: Option<Patch>,
}

/// State of one reconciliation pass.
#[derive(Debug)]
pub struct ReconcileRequest {
    /// The CR as observed at the start of the pass, with defaults applied.
    pub hc: HyperConverged,

    /// Operator environment.
    pub env: OperatorEnv,

    /// Cluster topology at the start of the pass.
    pub cluster: ClusterInfo,

    /// Whether the operator is mid-upgrade; forces a refresh of the
    /// enumerated virtualization config keys.
    pub upgrade_mode: bool,

    /// Parsed unsafe-modification patches.
    pub patches: ComponentPatches,
}

impl ReconcileRequest {
    /// Builds a request; applies static defaults to the spec copy and parses
    /// the jsonpatch annotations.
    pub fn new(
        mut hc: HyperConverged,
        env: OperatorEnv,
        cluster: ClusterInfo,
        upgrade_mode: bool,
    ) -> Result<Self, ControllerError> {
        crds::defaults::apply(&mut hc.spec, cluster.is_single_worker());

        let parse = |key: &str| -> Result<Option<Patch>, ControllerError> {
            match annotation(&hc, key) {
                Some(raw) => serde_json::from_str(raw)
                    .map(Some)
                    .map_err(|e| ControllerError::JsonPatch(key.to_string(), e.to_string())),
                None => Ok(None),
            }
        };

        let patches = ComponentPatches {
            kubevirt: parse(ANNOTATION_KUBEVIRT_JSONPATCH)?,
            cdi: parse(ANNOTATION_CDI_JSONPATCH)?,
            network_addons: parse(ANNOTATION_CNAO_JSONPATCH)?,
            ssp: parse(ANNOTATION_SSP_JSONPATCH)?,
        };

        Ok(Self {
            hc,
            env,
            cluster,
            upgrade_mode,
            patches,
        })
    }

    /// The CR namespace; children that are namespaced live here too.
    pub fn namespace(&self) -> &str {
        self.hc
            .metadata
            .namespace
            .as_deref()
            .unwrap_or(&self.env.namespace)
    }

    /// True when any unsafe jsonpatch annotation is present; surfaces the
    /// TaintedConfiguration condition.
    pub fn tainted(&self) -> bool {
        self.patches.kubevirt.is_some()
            || self.patches.cdi.is_some()
            || self.patches.network_addons.is_some()
            || self.patches.ssp.is_some()
    }

    /// Resolved state of a named feature gate, registry phase included.
    pub fn gate_enabled(&self, name: &str) -> bool {
        let gates = &self.hc.spec.feature_gates;
        let explicit = match name {
            "withHostPassthroughCPU" => gates.with_host_passthrough_cpu,
            "enableCommonBootImageImport" => gates.enable_common_boot_image_import,
            "deployKubeSecondaryDNS" => gates.deploy_kube_secondary_dns,
            "nonRoot" => gates.non_root,
            "deployAIEWebhook" => gates.deploy_aie_webhook,
            "enableHigherDensityWithSwap" => gates.enable_higher_density_with_swap,
            "enableManagedTenantQuota" => gates.enable_managed_tenant_quota,
            "persistentReservation" => gates.persistent_reservation,
            "disableMDevConfiguration" => gates.disable_m_dev_configuration,
            "alignCPUs" => gates.align_cpus,
            "downwardMetrics" => gates.downward_metrics,
            _ => None,
        };
        registry::resolve_phase(name, explicit)
    }

    /// True when the wasp-agent bundle must exist: the swap gate or an
    /// actual overcommit above 100%.
    pub fn swap_density_enabled(&self) -> bool {
        if self.gate_enabled("enableHigherDensityWithSwap") {
            return true;
        }
        self.hc
            .spec
            .higher_workload_density
            .as_ref()
            .and_then(|d| d.memory_overcommit_percentage)
            .is_some_and(|pct| pct > 100)
    }

    /// True when the Passt binding bundle must exist.
    pub fn passt_enabled(&self) -> bool {
        annotation(&self.hc, ANNOTATION_DEPLOY_PASST) == Some("true")
    }

    /// True when the wasp-agent should observe without evicting.
    pub fn wasp_dry_run(&self) -> bool {
        annotation(&self.hc, ANNOTATION_WASP_DRY_RUN) == Some("true")
    }

    /// Live-migration tuning profile requested via annotation, if any.
    /// Unrecognised values are ignored.
    pub fn tuning_policy(&self) -> Option<TuningPolicy> {
        let raw = annotation(&self.hc, ANNOTATION_TUNING_POLICY)?;
        serde_json::from_value(serde_json::Value::String(raw.to_string())).ok()
    }
}

fn annotation<'a>(hc: &'a HyperConverged, key: &str) -> Option<&'a str> {
    hc.metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(key))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::test_env;
    use std::collections::BTreeMap;

    fn request_with_annotations(annotations: &[(&str, &str)]) -> Result<ReconcileRequest, ControllerError> {
        let mut hc = HyperConverged::new("kubevirt-hyperconverged", Default::default());
        hc.metadata.namespace = Some("kubevirt-hyperconverged".to_string());
        hc.metadata.annotations = Some(
            annotations
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        );
        ReconcileRequest::new(hc, test_env(), ClusterInfo::default(), false)
    }

    #[test]
    fn parses_jsonpatch_annotations() {
        let req = request_with_annotations(&[(
            ANNOTATION_KUBEVIRT_JSONPATCH,
            r#"[{"op": "add", "path": "/spec/configuration/cpuRequest", "value": "500m"}]"#,
        )])
        .unwrap();

        assert!(req.patches.kubevirt.is_some());
        assert!(req.patches.cdi.is_none());
        assert!(req.tainted());
    }

    #[test]
    fn malformed_jsonpatch_fails_the_pass() {
        let err = request_with_annotations(&[(ANNOTATION_KUBEVIRT_JSONPATCH, "not json")])
            .unwrap_err();
        assert!(matches!(err, ControllerError::JsonPatch(_, _)));
    }

    #[test]
    fn defaults_are_applied_to_the_spec_copy() {
        let req = request_with_annotations(&[]).unwrap();
        assert_eq!(
            req.hc.spec.feature_gates.enable_common_boot_image_import,
            Some(true)
        );
        assert!(req.gate_enabled("enableCommonBootImageImport"));
        assert!(!req.gate_enabled("deployAIEWebhook"));
    }

    #[test]
    fn deprecated_gates_never_enable() {
        let mut hc = HyperConverged::new("kubevirt-hyperconverged", Default::default());
        hc.spec.feature_gates.enable_managed_tenant_quota = Some(true);
        let req =
            ReconcileRequest::new(hc, test_env(), ClusterInfo::default(), false).unwrap();
        assert!(!req.gate_enabled("enableManagedTenantQuota"));
    }

    #[test]
    fn overcommit_above_100_requires_wasp() {
        let mut hc = HyperConverged::new("kubevirt-hyperconverged", Default::default());
        hc.spec.higher_workload_density = Some(crds::shared::HigherWorkloadDensity {
            memory_overcommit_percentage: Some(150),
        });
        let req =
            ReconcileRequest::new(hc, test_env(), ClusterInfo::default(), false).unwrap();
        assert!(req.swap_density_enabled());
    }
}
