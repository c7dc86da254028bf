//! Static defaulting of the stored HyperConverged spec. The mutating
//! webhook runs this on every admission so the stored object is always
//! fully populated.

use crate::shared::{
    CertRotateConfig, EvictionStrategy, HigherWorkloadDensity, HyperConvergedCertConfig,
    LiveMigrationConfig, OperandResourceRequirements, UninstallStrategy, VirtualMachineOptions,
    WorkloadUpdateMethod, WorkloadUpdateStrategy,
};
use crate::v1beta1::HyperConvergedSpec;

/// Default lifetime of the self-signed CA certificate.
pub const DEFAULT_CA_DURATION: &str = "48h0m0s";
/// Default renewal point of the self-signed CA certificate.
pub const DEFAULT_CA_RENEW_BEFORE: &str = "24h0m0s";
/// Default lifetime of the server certificates.
pub const DEFAULT_SERVER_DURATION: &str = "24h0m0s";
/// Default renewal point of the server certificates.
pub const DEFAULT_SERVER_RENEW_BEFORE: &str = "12h0m0s";

/// Fills every unset spec field with its documented default.
///
/// `single_worker_node` feeds the eviction-strategy default: a cluster with
/// one schedulable worker cannot live-migrate, so eviction defaults to None
/// there and to LiveMigrate everywhere else.
pub fn apply(spec: &mut HyperConvergedSpec, single_worker_node: bool) {
    let gates = &mut spec.feature_gates;
    gates.with_host_passthrough_cpu.get_or_insert(false);
    gates.enable_common_boot_image_import.get_or_insert(true);
    gates.deploy_kube_secondary_dns.get_or_insert(false);
    gates.non_root.get_or_insert(true);
    gates.deploy_aie_webhook.get_or_insert(false);
    gates.enable_higher_density_with_swap.get_or_insert(false);
    gates.enable_managed_tenant_quota.get_or_insert(false);
    gates.persistent_reservation.get_or_insert(false);
    gates.disable_m_dev_configuration.get_or_insert(false);
    gates.align_cpus.get_or_insert(false);
    gates.downward_metrics.get_or_insert(false);

    let cert = spec
        .cert_config
        .get_or_insert_with(HyperConvergedCertConfig::default);
    fill_cert(&mut cert.ca, DEFAULT_CA_DURATION, DEFAULT_CA_RENEW_BEFORE);
    fill_cert(
        &mut cert.server,
        DEFAULT_SERVER_DURATION,
        DEFAULT_SERVER_RENEW_BEFORE,
    );

    let lm = spec
        .live_migration_config
        .get_or_insert_with(LiveMigrationConfig::default);
    lm.completion_timeout_per_gib.get_or_insert(800);
    lm.parallel_migrations_per_cluster.get_or_insert(5);
    lm.parallel_outbound_migrations_per_node.get_or_insert(2);
    lm.progress_timeout.get_or_insert(150);
    lm.allow_auto_converge.get_or_insert(false);
    lm.allow_post_copy.get_or_insert(false);

    spec.resource_requirements
        .get_or_insert_with(OperandResourceRequirements::default)
        .vmi_cpu_allocation_ratio
        .get_or_insert(10);

    let wus = spec
        .workload_update_strategy
        .get_or_insert_with(WorkloadUpdateStrategy::default);
    if wus.workload_update_methods.is_empty() {
        wus.workload_update_methods = vec![WorkloadUpdateMethod::LiveMigrate];
    }
    wus.batch_eviction_size.get_or_insert(10);
    wus.batch_eviction_interval
        .get_or_insert_with(|| "1m0s".to_string());

    spec.uninstall_strategy
        .get_or_insert(UninstallStrategy::BlockUninstallIfWorkloadsExist);

    spec.virtual_machine_options
        .get_or_insert_with(VirtualMachineOptions::default)
        .disable_free_page_reporting
        .get_or_insert(true);

    spec.higher_workload_density
        .get_or_insert_with(HigherWorkloadDensity::default)
        .memory_overcommit_percentage
        .get_or_insert(100);

    spec.eviction_strategy.get_or_insert(if single_worker_node {
        EvictionStrategy::None
    } else {
        EvictionStrategy::LiveMigrate
    });
}

fn fill_cert(cert: &mut CertRotateConfig, duration: &str, renew_before: &str) {
    cert.duration.get_or_insert_with(|| duration.to_string());
    cert.renew_before
        .get_or_insert_with(|| renew_before.to_string());
}
