//! Conversion between the stored v1beta1 schema and the v1 hub.
//!
//! Everything copies structurally except the feature gates, which map by
//! name between the boolean struct and the entry list.

use crate::v1;
use crate::v1beta1;

/// Converts a stored spec to the hub schema.
///
/// Only explicitly-set gates become entries, so an undefaulted spec converts
/// to an empty gate list and resolution falls back to the registry phases.
pub fn spec_to_v1(src: &v1beta1::HyperConvergedSpec) -> v1::HyperConvergedSpec {
    let mut gates = v1::FeatureGateSet::default();
    for (name, value) in gate_fields(&src.feature_gates) {
        if let Some(enabled) = value {
            gates.add(if enabled {
                v1::FeatureGate::enabled(name)
            } else {
                v1::FeatureGate::disabled(name)
            });
        }
    }

    v1::HyperConvergedSpec {
        local_storage_class_name: src.local_storage_class_name.clone(),
        feature_gates: gates,
        infra: src.infra.clone(),
        workloads: src.workloads.clone(),
        cert_config: src.cert_config.clone(),
        live_migration_config: src.live_migration_config.clone(),
        resource_requirements: src.resource_requirements.clone(),
        workload_update_strategy: src.workload_update_strategy.clone(),
        uninstall_strategy: src.uninstall_strategy,
        virtual_machine_options: src.virtual_machine_options.clone(),
        eviction_strategy: src.eviction_strategy,
        higher_workload_density: src.higher_workload_density.clone(),
        data_import_cron_templates: src.data_import_cron_templates.clone(),
        aie_webhook_config: src.aie_webhook_config.clone(),
        tuning_policy: src.tuning_policy,
        tls_security_profile: src.tls_security_profile.clone(),
        common_templates_namespace: src.common_templates_namespace.clone(),
        vm_state_storage_class: src.vm_state_storage_class.clone(),
        default_cpu_model: src.default_cpu_model.clone(),
        default_runtime_class: src.default_runtime_class.clone(),
        scratch_space_storage_class: src.scratch_space_storage_class.clone(),
    }
}

/// Converts a hub spec back to the stored schema.
///
/// Entries with no matching boolean field (GA gates and unknown names) are
/// dropped; their state is fixed by the registry anyway.
pub fn spec_from_v1(src: &v1::HyperConvergedSpec) -> v1beta1::HyperConvergedSpec {
    let mut gates = v1beta1::HyperConvergedFeatureGates::default();
    for entry in &src.feature_gates.0 {
        let value = Some(entry.enabled.is_enabled());
        match entry.name.as_str() {
            "withHostPassthroughCPU" => gates.with_host_passthrough_cpu = value,
            "enableCommonBootImageImport" => gates.enable_common_boot_image_import = value,
            "deployKubeSecondaryDNS" => gates.deploy_kube_secondary_dns = value,
            "nonRoot" => gates.non_root = value,
            "deployAIEWebhook" => gates.deploy_aie_webhook = value,
            "enableHigherDensityWithSwap" => gates.enable_higher_density_with_swap = value,
            "enableManagedTenantQuota" => gates.enable_managed_tenant_quota = value,
            "persistentReservation" => gates.persistent_reservation = value,
            "disableMDevConfiguration" => gates.disable_m_dev_configuration = value,
            "alignCPUs" => gates.align_cpus = value,
            "downwardMetrics" => gates.downward_metrics = value,
            _ => {}
        }
    }

    v1beta1::HyperConvergedSpec {
        local_storage_class_name: src.local_storage_class_name.clone(),
        feature_gates: gates,
        infra: src.infra.clone(),
        workloads: src.workloads.clone(),
        cert_config: src.cert_config.clone(),
        live_migration_config: src.live_migration_config.clone(),
        resource_requirements: src.resource_requirements.clone(),
        workload_update_strategy: src.workload_update_strategy.clone(),
        uninstall_strategy: src.uninstall_strategy,
        virtual_machine_options: src.virtual_machine_options.clone(),
        eviction_strategy: src.eviction_strategy,
        higher_workload_density: src.higher_workload_density.clone(),
        data_import_cron_templates: src.data_import_cron_templates.clone(),
        aie_webhook_config: src.aie_webhook_config.clone(),
        tuning_policy: src.tuning_policy,
        tls_security_profile: src.tls_security_profile.clone(),
        common_templates_namespace: src.common_templates_namespace.clone(),
        vm_state_storage_class: src.vm_state_storage_class.clone(),
        default_cpu_model: src.default_cpu_model.clone(),
        default_runtime_class: src.default_runtime_class.clone(),
        scratch_space_storage_class: src.scratch_space_storage_class.clone(),
    }
}

fn gate_fields(gates: &v1beta1::HyperConvergedFeatureGates) -> [(&'static str, Option<bool>); 11] {
    [
        ("withHostPassthroughCPU", gates.with_host_passthrough_cpu),
        (
            "enableCommonBootImageImport",
            gates.enable_common_boot_image_import,
        ),
        ("deployKubeSecondaryDNS", gates.deploy_kube_secondary_dns),
        ("nonRoot", gates.non_root),
        ("deployAIEWebhook", gates.deploy_aie_webhook),
        (
            "enableHigherDensityWithSwap",
            gates.enable_higher_density_with_swap,
        ),
        ("enableManagedTenantQuota", gates.enable_managed_tenant_quota),
        ("persistentReservation", gates.persistent_reservation),
        ("disableMDevConfiguration", gates.disable_m_dev_configuration),
        ("alignCPUs", gates.align_cpus),
        ("downwardMetrics", gates.downward_metrics),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;

    #[test]
    fn set_gates_become_entries() {
        let mut src = v1beta1::HyperConvergedSpec::default();
        src.feature_gates.deploy_aie_webhook = Some(true);
        src.feature_gates.persistent_reservation = Some(false);

        let hub = spec_to_v1(&src);
        assert_eq!(hub.feature_gates.0.len(), 2);
        assert!(hub.feature_gates.is_enabled("deployAIEWebhook"));
        assert!(!hub.feature_gates.is_enabled("persistentReservation"));
    }

    #[test]
    fn unknown_entries_are_dropped_on_the_way_back() {
        let mut hub = v1::HyperConvergedSpec::default();
        hub.feature_gates.enable("kubevirtSeccompProfile");
        hub.feature_gates.enable("alignCPUs");

        let stored = spec_from_v1(&hub);
        assert_eq!(stored.feature_gates.align_cpus, Some(true));

        // The GA gate left no trace in the boolean struct.
        let back = spec_to_v1(&stored);
        assert!(back.feature_gates.get("kubevirtSeccompProfile").is_none());
    }

    #[test]
    fn round_trip_preserves_resolution_for_every_registry_gate() {
        for name in registry::gate_names() {
            for explicit in [None, Some(true), Some(false)] {
                let mut hub = v1::HyperConvergedSpec::default();
                match explicit {
                    Some(true) => hub.feature_gates.enable(name),
                    Some(false) => hub.feature_gates.disable(name),
                    None => {}
                }

                let back = spec_to_v1(&spec_from_v1(&hub));
                assert_eq!(
                    back.feature_gates.is_enabled(name),
                    hub.feature_gates.is_enabled(name),
                    "gate {name} with explicit {explicit:?} changed state across conversion"
                );
            }
        }
    }

    #[test]
    fn structural_fields_copy_both_ways() {
        let mut src = v1beta1::HyperConvergedSpec::default();
        src.default_cpu_model = Some("Haswell-noTSX".to_string());
        src.uninstall_strategy = Some(crate::shared::UninstallStrategy::RemoveWorkloads);

        let hub = spec_to_v1(&src);
        assert_eq!(hub.default_cpu_model.as_deref(), Some("Haswell-noTSX"));

        let back = spec_from_v1(&hub);
        assert_eq!(back, src);
    }
}
