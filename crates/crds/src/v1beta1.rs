//! `hco.kubevirt.io/v1beta1` — the stored HyperConverged schema.
//!
//! Feature gates are a struct of named optional booleans here; the v1 hub
//! carries them as an ordered entry list instead.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::shared::{
    AIEWebhookConfig, DataImportCronTemplate, EvictionStrategy, HigherWorkloadDensity,
    HyperConvergedCertConfig, HyperConvergedConfig, HyperConvergedStatus, LiveMigrationConfig,
    OperandResourceRequirements, TuningPolicy, UninstallStrategy, VirtualMachineOptions,
    WorkloadUpdateStrategy,
};

/// Named opt-in (and opt-out) switches for optional virtualization features.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HyperConvergedFeatureGates {
    /// Allow migrating a virtual machine with CPU host-passthrough mode.
    /// Can prevent migration when source and target nodes differ.
    #[serde(
        default,
        rename = "withHostPassthroughCPU",
        skip_serializing_if = "Option::is_none"
    )]
    pub with_host_passthrough_cpu: Option<bool>,

    /// Opt in to automatic delivery and updates of the common data import
    /// cron templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_common_boot_image_import: Option<bool>,

    /// Deploy the secondary-DNS bundle for virtual machines.
    #[serde(
        default,
        rename = "deployKubeSecondaryDNS",
        skip_serializing_if = "Option::is_none"
    )]
    pub deploy_kube_secondary_dns: Option<bool>,

    /// Deprecated: no longer has any effect; launchers always run non-root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_root: Option<bool>,

    /// Deploy the accelerator-image-enforcement webhook.
    #[serde(
        default,
        rename = "deployAIEWebhook",
        skip_serializing_if = "Option::is_none"
    )]
    pub deploy_aie_webhook: Option<bool>,

    /// Use memory overcommit backed by swap on the worker nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_higher_density_with_swap: Option<bool>,

    /// Deprecated: the managed-tenant-quota integration was removed and
    /// this gate no longer has any effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_managed_tenant_quota: Option<bool>,

    /// Enable persistent SCSI reservation of disks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_reservation: Option<bool>,

    /// Disable mediated-device configuration on the nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_m_dev_configuration: Option<bool>,

    /// Request alignment of guest vCPUs with host CPUs.
    #[serde(default, rename = "alignCPUs", skip_serializing_if = "Option::is_none")]
    pub align_cpus: Option<bool>,

    /// Enable the downward-metrics channel towards guests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downward_metrics: Option<bool>,
}

/// Desired state of the virtualization deployment. One resource of this kind,
/// named `kubevirt-hyperconverged`, drives the whole operand stack.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    kind = "HyperConverged",
    group = "hco.kubevirt.io",
    version = "v1beta1",
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

    /// Optional feature switches.
    #[serde(default)]
    pub feature_gates: HyperConvergedFeatureGates,

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

    /// Cluster-level eviction strategy on node drain. Defaulted from the
    /// cluster topology when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eviction_strategy: Option<EvictionStrategy>,

    /// Memory overcommit configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub higher_workload_density: Option<HigherWorkloadDensity>,

    /// User-defined recurring bootable-image imports, merged with the
    /// operator-provided common set.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_gates_stay_off_the_wire() {
        let spec = HyperConvergedSpec::default();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json, serde_json::json!({ "featureGates": {} }));
    }

    #[test]
    fn gate_field_names_are_camel_case() {
        let gates = HyperConvergedFeatureGates {
            deploy_aie_webhook: Some(true),
            disable_m_dev_configuration: Some(false),
            ..Default::default()
        };
        let json = serde_json::to_value(&gates).unwrap();
        assert_eq!(json["deployAIEWebhook"], true);
        assert_eq!(json["disableMDevConfiguration"], false);
    }
}
