//! `hco.kubevirt.io/v1` — the conversion hub.
//!
//! Identical to the stored v1beta1 schema except for the feature-gate
//! representation, which is an ordered entry list here.

pub mod feature_gates;

pub use feature_gates::{Enablement, FeatureGate, FeatureGateSet};

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::shared::{
    AIEWebhookConfig, DataImportCronTemplate, EvictionStrategy, HigherWorkloadDensity,
    HyperConvergedCertConfig, HyperConvergedConfig, HyperConvergedStatus, LiveMigrationConfig,
    OperandResourceRequirements, TuningPolicy, UninstallStrategy, VirtualMachineOptions,
    WorkloadUpdateStrategy,
};

/// Desired state of the virtualization deployment, hub schema.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    kind = "HyperConverged",
    group = "hco.kubevirt.io",
    version = "v1",
    namespaced,
    status = "HyperConvergedStatus",
    shortname = "hco",
    shortname = "hcos",
    doc = "Unified entry point for deploying and configuring the virtualization stack"
)]
#[serde(rename_all = "camelCase")]
pub struct HyperConvergedSpec {
    /// Deprecated: no longer used; kept for round-trip compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_storage_class_name: Option<String>,

    /// Optional feature switches as an ordered entry list.
    #[serde(default, skip_serializing_if = "FeatureGateSet::is_empty")]
    pub feature_gates: FeatureGateSet,

    /// Placement of the infrastructure (control-plane) components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra: Option<HyperConvergedConfig>,

    /// Placement of the workload (per-node) components.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workloads: Option<HyperConvergedConfig>,

    /// Rotation policy for the internal self-signed certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_config: Option<HyperConvergedCertConfig>,

    /// Live migration limits and timeouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_migration_config: Option<LiveMigrationConfig>,

    /// Resource requirements of the operand workloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_requirements: Option<OperandResourceRequirements>,

    /// Policy for automated workload updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload_update_strategy: Option<WorkloadUpdateStrategy>,

    /// What to do on uninstall when workloads still exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstall_strategy: Option<UninstallStrategy>,

    /// Cluster-level virtual machine options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_machine_options: Option<VirtualMachineOptions>,

    /// Cluster-level eviction strategy on node drain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eviction_strategy: Option<EvictionStrategy>,

    /// Memory overcommit configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub higher_workload_density: Option<HigherWorkloadDensity>,

    /// User-defined recurring bootable-image imports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_import_cron_templates: Vec<DataImportCronTemplate>,

    /// Rules for the accelerator-image-enforcement webhook.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aie_webhook_config: Option<AIEWebhookConfig>,

    /// Rate-limit tuning mode for the virtualization child.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuning_policy: Option<TuningPolicy>,

    /// TLS security profile, propagated verbatim to all children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_security_profile: Option<serde_json::Value>,

    /// Namespace the common templates are deployed into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_templates_namespace: Option<String>,

    /// Storage class for persistent virtual machine state (for example TPM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_state_storage_class: Option<String>,

    /// Default CPU model for virtual machines with no explicit model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_cpu_model: Option<String>,

    /// Default runtime class of the virt-launcher pods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_runtime_class: Option<String>,

    /// Storage class for temporary scratch space during image import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_space_storage_class: Option<String>,
}
