//! The virtualization core operand: a single KubeVirt CR in the install
//! namespace.

use kube::core::GroupVersionKind;
use serde_json::{Value, json};

use crate::error::ControllerError;
use crate::request::ReconcileRequest;
use crate::stream;

use super::{DesiredResource, MergePolicy, OperandHandler, managed_labels, owner_reference};

pub const KUBEVIRT_NAME: &str = "kubevirt-kubevirt-hyperconverged";

/// SELinux process type the virt-launcher pods run under.
const SELINUX_LAUNCHER_TYPE: &str = "virt_launcher.process";

/// Gates the operator always turns on in the KubeVirt CR. End users cannot
/// toggle these.
const MANDATORY_KV_GATES: &[&str] = &[
    "DataVolumes",
    "SRIOV",
    "CPUManager",
    "CPUNodeDiscovery",
    "Snapshot",
    "HotplugVolumes",
    "ExpandDisks",
    "GPU",
    "HostDevices",
    "NUMA",
    "VMExport",
    "DisableCustomSELinuxPolicy",
    "KubevirtSeccompProfile",
    "HotplugNICs",
    "VMPersistentState",
    "NetworkBindingPlugins",
    "WithHostModelCPU",
    "HypervStrictCheck",
];

const OBSOLETE_CPU_MODELS: &[&str] = &[
    "486", "pentium", "pentium2", "pentium3", "pentiumpro", "coreduo", "n270", "core2duo",
    "Conroe", "athlon", "phenom", "qemu64", "qemu32", "kvm64", "kvm32",
];

pub struct KubeVirtHandler;

impl OperandHandler for KubeVirtHandler {
    fn name(&self) -> &'static str {
        "KubeVirt"
    }

    fn desired(&self, req: &ReconcileRequest) -> Result<Vec<DesiredResource>, ControllerError> {
        let spec = &req.hc.spec;

        let mut configuration = json!({
            "developerConfiguration": {
                "featureGates": gate_list(req),
            },
            "obsoleteCPUModels": obsolete_cpu_models(),
            "selinuxLauncherType": SELINUX_LAUNCHER_TYPE,
            "evictionStrategy": spec.eviction_strategy,
            "vmStateStorageClass": spec.vm_state_storage_class,
            "ksmConfiguration": {"nodeLabelSelector": {}},
        });

        if let Some(machine_type) = &req.env.machinetype {
            configuration["machineType"] = json!(machine_type);
        }
        if let Some(smbios) = &req.env.smbios {
            configuration["smbios"] = serde_yaml::from_str(smbios)
                .map_err(|e| ControllerError::InvalidConfig(format!("SMBIOS: {e}")))?;
        }
        if let Some(cpu_model) = &spec.default_cpu_model {
            configuration["cpuModel"] = json!(cpu_model);
        }
        if let Some(runtime_class) = &spec.default_runtime_class {
            configuration["defaultRuntimeClass"] = json!(runtime_class);
        }
        if let Some(ratio) = spec
            .resource_requirements
            .as_ref()
            .and_then(|r| r.vmi_cpu_allocation_ratio)
        {
            configuration["developerConfiguration"]["cpuAllocationRatio"] = json!(ratio);
        }
        if let Some(tls) = &spec.tls_security_profile {
            configuration["tlsConfiguration"] = tls.clone();
        }
        configuration["migrations"] = migrations(req);
        if let Some(options) = &spec.virtual_machine_options {
            if options.disable_free_page_reporting == Some(true) {
                configuration["virtualMachineOptions"] =
                    json!({"disableFreePageReporting": {}});
            }
        }

        let object = json!({
            "apiVersion": "kubevirt.io/v1",
            "kind": "KubeVirt",
            "metadata": {
                "name": KUBEVIRT_NAME,
                "namespace": req.namespace(),
                "labels": managed_labels(req, "compute"),
                "ownerReferences": owner_reference(req),
            },
            "spec": {
                "uninstallStrategy": spec.uninstall_strategy,
                "certificateRotateStrategy": certificate_rotate_strategy(req),
                "workloadUpdateStrategy": spec.workload_update_strategy,
                "infra": profile(super::infra_placement(req)),
                "workloads": profile(super::workloads_placement(req)),
                "configuration": configuration,
            },
        });

        Ok(vec![DesiredResource {
            gvk: GroupVersionKind::gvk("kubevirt.io", "v1", "KubeVirt"),
            plural: "kubevirts",
            namespace: Some(req.namespace().to_string()),
            name: KUBEVIRT_NAME.to_string(),
            object,
            policy: MergePolicy {
                operator: &[
                    "/spec/uninstallStrategy",
                    "/spec/configuration/developerConfiguration/featureGates",
                ],
                preserve: &[
                    "/spec/configuration/machineType",
                    "/spec/configuration/smbios",
                    "/spec/configuration/selinuxLauncherType",
                    "/spec/configuration/developerConfiguration/featureGates",
                ],
                force_on_upgrade: &[
                    "/spec/configuration/machineType",
                    "/spec/configuration/smbios",
                    "/spec/configuration/selinuxLauncherType",
                    "/spec/configuration/developerConfiguration/featureGates",
                ],
            },
        }])
    }

    fn user_patch<'a>(&self, req: &'a ReconcileRequest) -> Option<&'a json_patch::Patch> {
        req.patches.kubevirt.as_ref()
    }

    fn reports_conditions(&self) -> bool {
        true
    }
}

/// Exposed gate name on the HyperConverged CR paired with the KubeVirt
/// gate it switches on.
const EXPOSED_KV_GATES: &[(&str, &str)] = &[
    ("downwardMetrics", "DownwardMetrics"),
    ("withHostPassthroughCPU", "WithHostPassthroughCPU"),
    ("disableMDevConfiguration", "DisableMDEVConfiguration"),
    ("persistentReservation", "PersistentReservation"),
    ("alignCPUs", "AlignCPUs"),
];

/// The KubeVirt feature gate list: the mandatory set plus gates derived from
/// the CR.
fn gate_list(req: &ReconcileRequest) -> Vec<&str> {
    let exposed = stream::pair_values(stream::filter(
        EXPOSED_KV_GATES.iter().copied(),
        |pair| req.gate_enabled(pair.0),
    ));
    MANDATORY_KV_GATES.iter().copied().chain(exposed).collect()
}

fn obsolete_cpu_models() -> Value {
    Value::Object(
        stream::map_one(OBSOLETE_CPU_MODELS.iter(), |m| {
            (m.to_string(), Value::Bool(true))
        })
        .collect(),
    )
}

fn certificate_rotate_strategy(req: &ReconcileRequest) -> Value {
    let Some(cert) = &req.hc.spec.cert_config else {
        return json!({});
    };
    json!({
        "selfSigned": {
            "ca": {
                "duration": cert.ca.duration.as_ref(),
                "renewBefore": cert.ca.renew_before.as_ref(),
            },
            "server": {
                "duration": cert.server.duration.as_ref(),
                "renewBefore": cert.server.renew_before.as_ref(),
            },
        },
    })
}

fn migrations(req: &ReconcileRequest) -> Value {
    let mut migrations = req
        .hc
        .spec
        .live_migration_config
        .as_ref()
        .and_then(|c| serde_json::to_value(c).ok())
        .unwrap_or_else(|| json!({}));

    // The tuning-policy annotation overrides the migration rate limits.
    if let Some(crds::TuningPolicy::HighBurst) = req.tuning_policy() {
        migrations["bandwidthPerMigration"] = Value::Null;
        migrations["burst"] = json!(400);
        migrations["qps"] = json!(200);
    }

    migrations
}

fn profile(placement: Value) -> Value {
    if placement.is_null() {
        json!({})
    } else {
        json!({"nodePlacement": placement})
    }
}
