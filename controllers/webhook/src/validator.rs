//! Validation policy for HyperConverged admission.
//!
//! Create and update share the same spec checks; delete consults the
//! cluster for lingering workloads. Every rejection carries the offending
//! field path so the caller can fix the manifest directly.

use crds::HYPERCONVERGED_NAME;
use crds::registry::{FeatureGatePhase, gate_phase};
use crds::shared::{CertRotateConfig, UninstallStrategy, parse_go_duration};
use crds::v1beta1::HyperConverged;
use kube::ResourceExt;

use crate::cluster::ClusterView;

/// Outcome of a spec validation: either a list of warnings to surface to
/// the client, or the rejection reason.
pub type Verdict = Result<Vec<String>, String>;

/// Validates a created or updated HyperConverged resource.
pub fn validate_spec(hc: &HyperConverged) -> Verdict {
    let name = hc.name_any();
    if name != HYPERCONVERGED_NAME {
        return Err(format!(
            "invalid name {name}: the HyperConverged resource must be named {HYPERCONVERGED_NAME}"
        ));
    }

    if let Some(cert) = &hc.spec.cert_config {
        validate_cert_pair("certConfig.ca", &cert.ca)?;
        validate_cert_pair("certConfig.server", &cert.server)?;
    }

    if let Some(rr) = &hc.spec.resource_requirements {
        if rr.vmi_cpu_allocation_ratio == Some(1)
            && rr.auto_cpu_limit_namespace_label_selector.is_some()
        {
            return Err(
                "spec.resourceRequirements: automatic CPU limits are incompatible with a VMI CPU allocation ratio of 1"
                    .to_string(),
            );
        }
    }

    Ok(deprecation_warnings(hc))
}

/// Validates a delete request: blocked while workloads exist, unless the
/// strategy opts into cascading removal.
pub async fn validate_delete(
    hc: &HyperConverged,
    cluster: &dyn ClusterView,
) -> Result<(), String> {
    let strategy = hc
        .spec
        .uninstall_strategy
        .unwrap_or(UninstallStrategy::BlockUninstallIfWorkloadsExist);

    if strategy != UninstallStrategy::BlockUninstallIfWorkloadsExist {
        return Ok(());
    }

    let workloads = cluster
        .workloads_exist()
        .await
        .map_err(|e| format!("failed to check for existing workloads: {e}"))?;

    if workloads {
        return Err(
            "uninstall strategy is BlockUninstallIfWorkloadsExist and VirtualMachineInstances are still present"
                .to_string(),
        );
    }

    Ok(())
}

/// `duration >= renewBefore > 0`, both well-formed Go durations.
fn validate_cert_pair(path: &str, cert: &CertRotateConfig) -> Result<(), String> {
    let (Some(duration), Some(renew_before)) = (&cert.duration, &cert.renew_before) else {
        return Ok(());
    };

    let duration = parse_go_duration(duration)
        .ok_or_else(|| format!("{path}.duration: invalid duration {duration:?}"))?;
    let renew_before = parse_go_duration(renew_before)
        .ok_or_else(|| format!("{path}.renewBefore: invalid duration {renew_before:?}"))?;

    if renew_before.is_zero() {
        return Err(format!("{path}.renewBefore: must be positive"));
    }
    if duration < renew_before {
        return Err(format!(
            "{path}: duration must not be shorter than renewBefore"
        ));
    }

    Ok(())
}

/// One warning per deprecated gate carrying a non-default value. The
/// defaulting mutator fills these gates on every admission, so only a
/// value that deviates from the injected default signals user intent.
fn deprecation_warnings(hc: &HyperConverged) -> Vec<String> {
    let gates = &hc.spec.feature_gates;
    let deviating = [
        ("withHostPassthroughCPU", gates.with_host_passthrough_cpu, false),
        ("nonRoot", gates.non_root, true),
        (
            "enableManagedTenantQuota",
            gates.enable_managed_tenant_quota,
            false,
        ),
    ];

    deviating
        .iter()
        .filter(|(name, value, default)| {
            value.is_some_and(|v| v != *default)
                && gate_phase(name) == Some(FeatureGatePhase::Deprecated)
        })
        .map(|(name, _, _)| format!("featureGates.{name} is deprecated and has no effect"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::mock::MockClusterView;
    use crds::shared::{HyperConvergedCertConfig, LabelSelector, OperandResourceRequirements};
    use crds::v1beta1::HyperConvergedSpec;

    fn valid_hc() -> HyperConverged {
        let mut hc = HyperConverged::new(HYPERCONVERGED_NAME, HyperConvergedSpec::default());
        hc.metadata.namespace = Some("kubevirt-hyperconverged".to_string());
        crds::defaults::apply(&mut hc.spec, false);
        hc
    }

    #[test]
    fn default_spec_is_accepted() {
        let hc = valid_hc();
        assert!(validate_spec(&hc).is_ok());
    }

    #[test]
    fn wrong_name_is_rejected() {
        let mut hc = valid_hc();
        hc.metadata.name = Some("my-hco".to_string());
        let reason = validate_spec(&hc).unwrap_err();
        assert!(reason.contains("must be named kubevirt-hyperconverged"));
    }

    #[test]
    fn cpu_ratio_of_one_conflicts_with_auto_limits() {
        let mut hc = valid_hc();
        hc.spec.resource_requirements = Some(OperandResourceRequirements {
            vmi_cpu_allocation_ratio: Some(1),
            auto_cpu_limit_namespace_label_selector: Some(LabelSelector::default()),
        });
        let reason = validate_spec(&hc).unwrap_err();
        assert!(reason.contains("automatic CPU limits are incompatible"));
    }

    #[test]
    fn cpu_ratio_of_one_alone_is_fine() {
        let mut hc = valid_hc();
        hc.spec.resource_requirements = Some(OperandResourceRequirements {
            vmi_cpu_allocation_ratio: Some(1),
            auto_cpu_limit_namespace_label_selector: None,
        });
        assert!(validate_spec(&hc).is_ok());
    }

    #[test]
    fn renew_before_longer_than_duration_is_rejected() {
        let mut hc = valid_hc();
        hc.spec.cert_config = Some(HyperConvergedCertConfig {
            ca: CertRotateConfig {
                duration: Some("24h0m0s".to_string()),
                renew_before: Some("48h0m0s".to_string()),
            },
            server: CertRotateConfig::default(),
        });
        let reason = validate_spec(&hc).unwrap_err();
        assert!(reason.contains("certConfig.ca"));
        assert!(reason.contains("shorter than renewBefore"));
    }

    #[test]
    fn zero_renew_before_is_rejected() {
        let mut hc = valid_hc();
        hc.spec.cert_config = Some(HyperConvergedCertConfig {
            ca: CertRotateConfig::default(),
            server: CertRotateConfig {
                duration: Some("24h0m0s".to_string()),
                renew_before: Some("0h0m0s".to_string()),
            },
        });
        let reason = validate_spec(&hc).unwrap_err();
        assert!(reason.contains("certConfig.server.renewBefore"));
    }

    #[test]
    fn malformed_duration_is_rejected() {
        let mut hc = valid_hc();
        hc.spec.cert_config = Some(HyperConvergedCertConfig {
            ca: CertRotateConfig {
                duration: Some("two days".to_string()),
                renew_before: Some("24h0m0s".to_string()),
            },
            server: CertRotateConfig::default(),
        });
        let reason = validate_spec(&hc).unwrap_err();
        assert!(reason.contains("certConfig.ca.duration"));
    }

    #[test]
    fn deprecated_gates_warn_but_do_not_reject() {
        let mut hc = valid_hc();
        hc.spec.feature_gates.non_root = Some(false);
        hc.spec.feature_gates.enable_managed_tenant_quota = Some(true);
        let warnings = validate_spec(&hc).unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("nonRoot"));
        assert!(warnings[1].contains("enableManagedTenantQuota"));
    }

    #[tokio::test]
    async fn delete_blocked_while_workloads_exist() {
        let hc = valid_hc();
        let cluster = MockClusterView {
            workloads: true,
            single_worker: false,
        };
        let reason = validate_delete(&hc, &cluster).await.unwrap_err();
        assert!(reason.contains("VirtualMachineInstances are still present"));
    }

    #[tokio::test]
    async fn delete_allowed_once_workloads_gone() {
        let hc = valid_hc();
        let cluster = MockClusterView {
            workloads: false,
            single_worker: false,
        };
        assert!(validate_delete(&hc, &cluster).await.is_ok());
    }

    #[tokio::test]
    async fn remove_workloads_strategy_never_blocks() {
        let mut hc = valid_hc();
        hc.spec.uninstall_strategy = Some(UninstallStrategy::RemoveWorkloads);
        let cluster = MockClusterView {
            workloads: true,
            single_worker: false,
        };
        assert!(validate_delete(&hc, &cluster).await.is_ok());
    }
}
