//! Sub-types shared between the `v1beta1` and `v1` HyperConverged schemas.
//!
//! Everything here has the same wire shape in both API versions; only the
//! feature-gate representation differs between them.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type: the operand stack is fully deployed and usable.
pub const CONDITION_AVAILABLE: &str = "Available";
/// Condition type: the operator is actively making changes to managed resources.
pub const CONDITION_PROGRESSING: &str = "Progressing";
/// Condition type: managed resources are not functioning completely.
pub const CONDITION_DEGRADED: &str = "Degraded";
/// Condition type: managed resources are in a state that is safe to upgrade.
pub const CONDITION_UPGRADEABLE: &str = "Upgradeable";
/// Condition type: the reconcile pass ran to completion.
pub const CONDITION_RECONCILE_COMPLETE: &str = "ReconcileComplete";
/// Condition type: a debug configuration was applied via a jsonpatch annotation.
pub const CONDITION_TAINTED_CONFIGURATION: &str = "TaintedConfiguration";

/// Annotation carrying an opaque JSON patch for the virtualization child.
pub const ANNOTATION_KUBEVIRT_JSONPATCH: &str = "kubevirt.kubevirt.io/jsonpatch";
/// Annotation carrying an opaque JSON patch for the data-import child.
pub const ANNOTATION_CDI_JSONPATCH: &str = "containerizeddataimporter.kubevirt.io/jsonpatch";
/// Annotation carrying an opaque JSON patch for the network add-ons child.
pub const ANNOTATION_CNAO_JSONPATCH: &str = "networkaddonsconfigs.kubevirt.io/jsonpatch";
/// Annotation carrying an opaque JSON patch for the scheduling sidecar child.
pub const ANNOTATION_SSP_JSONPATCH: &str = "ssp.kubevirt.io/jsonpatch";
/// Annotation selecting the live-migration tuning override.
pub const ANNOTATION_TUNING_POLICY: &str = "hco.kubevirt.io/tuningPolicy";
/// Annotation gating the Passt network binding bundle.
pub const ANNOTATION_DEPLOY_PASST: &str = "hco.kubevirt.io/deployPasstNetworkBinding";
/// Annotation switching the wasp-agent to dry-run mode.
pub const ANNOTATION_WASP_DRY_RUN: &str = "wasp.hyperconverged.io/dry-run";
/// Annotation stamped on data-import-cron templates with the supported architectures.
pub const ANNOTATION_DICT_ARCHITECTURES: &str = "ssp.kubevirt.io/dict.architectures";

/// How to proceed on uninstall when workloads still exist.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum UninstallStrategy {
    /// Prevent the CR from being removed while workloads still exist.
    #[default]
    BlockUninstallIfWorkloadsExist,

    /// Cascading-delete all workloads on uninstall.
    RemoveWorkloads,
}

/// Tuning mode for the virtualization child's rate limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TuningPolicy {
    /// Take qps/burst values from the tuning-policy annotation.
    Annotation,
    /// Use the pre-set high-burst profile.
    HighBurst,
}

/// Cluster-level eviction strategy for virtual machine instances on node drain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum EvictionStrategy {
    /// No eviction strategy at cluster level.
    None,
    /// Migrate the VM on eviction.
    LiveMigrate,
    /// Migrate if possible, otherwise directly evict.
    LiveMigrateIfPossible,
    /// Block the drain and notify an external controller.
    External,
}

/// A single scheduling toleration, mirroring the core/v1 shape.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Toleration {
    /// Taint key the toleration applies to; empty matches all keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Operator relating the key to the value (Exists or Equal).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,

    /// Taint value the toleration matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Taint effect to match; empty matches all effects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,

    /// Period of time the toleration tolerates the taint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toleration_seconds: Option<i64>,
}

/// Node scheduling configuration propagated into child resources.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodePlacement {
    /// Node labels a pod must match to be scheduled.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,

    /// Pod affinity scheduling rules, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affinity: Option<serde_json::Value>,

    /// Tolerations for node taints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tolerations: Vec<Toleration>,
}

impl NodePlacement {
    /// True when no placement constraint is set at all.
    pub fn is_empty(&self) -> bool {
        self.node_selector.is_empty() && self.affinity.is_none() && self.tolerations.is_empty()
    }
}

/// Pod configuration (currently only placement) for a component class.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HyperConvergedConfig {
    /// Node scheduling configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_placement: Option<NodePlacement>,
}

/// Rotation policy for one certificate pair. Durations use Go's duration
/// string format ("48h0m0s").
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CertRotateConfig {
    /// Requested lifetime of the certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    /// How long before expiry renewal is attempted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renew_before: Option<String>,
}

/// Rotation policy for internal, self-signed certificates.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HyperConvergedCertConfig {
    /// CA certificate configuration; CA certs stay in the bundle while valid.
    #[serde(default)]
    pub ca: CertRotateConfig,

    /// Server certificate configuration; certs are rotated and discarded.
    #[serde(default)]
    pub server: CertRotateConfig,
}

/// Live migration limits and timeouts, applied so that migration processes
/// do not overwhelm the cluster.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LiveMigrationConfig {
    /// Number of migrations running in parallel in the cluster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_migrations_per_cluster: Option<u32>,

    /// Maximum number of outbound migrations per node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_outbound_migrations_per_node: Option<u32>,

    /// Bandwidth limit of each migration, in MiB/s (quantity string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth_per_migration: Option<String>,

    /// Cancel the migration if not completed in this time, per GiB of memory.
    #[serde(
        default,
        rename = "completionTimeoutPerGiB",
        skip_serializing_if = "Option::is_none"
    )]
    pub completion_timeout_per_gib: Option<i64>,

    /// Cancel the migration if memory copy makes no progress in this many seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_timeout: Option<i64>,

    /// Dedicated multus network to perform migrations over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    /// Allow compromising VMI performance to guarantee migration convergence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_auto_converge: Option<bool>,

    /// Allow switching to post-copy when the completion timeout triggers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_post_copy: Option<bool>,
}

/// Label selector; the subset used by HyperConverged fields.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Labels that must all match.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
}

/// Resource requirements for the operand workloads.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperandResourceRequirements {
    /// How much physical CPU to request per requested virtual CPU, as a
    /// divisor: VMI pod CPU request = vCPUs * 1/ratio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vmi_cpu_allocation_ratio: Option<u32>,

    /// When set, a CPU limit is placed on virt-launcher for VMIs running in
    /// namespaces matching the selector. Incompatible with an allocation
    /// ratio of 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_cpu_limit_namespace_label_selector: Option<LabelSelector>,
}

/// A method that may be used to disrupt workloads during automated updates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum WorkloadUpdateMethod {
    /// Live-migrate the workload to an updated launcher.
    LiveMigrate,
    /// Evict (shut down) the workload so it restarts updated.
    Evict,
}

/// Cluster-level policy for automated workload updates.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadUpdateStrategy {
    /// Methods that can be used to disrupt workloads; the least disruptive
    /// listed method takes precedence. Empty disables automated updates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workload_update_methods: Vec<WorkloadUpdateMethod>,

    /// Number of VMIs that can be force-updated per interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_eviction_size: Option<i32>,

    /// Interval to wait before issuing the next batch of shutdowns
    /// (Go duration string).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_eviction_interval: Option<String>,
}

/// Cluster-level virtual machine options.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineOptions {
    /// Disable free page reporting of the memory balloon device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_free_page_reporting: Option<bool>,
}

/// Higher workload density configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HigherWorkloadDensity {
    /// Memory overcommit percentage; 100 means no overcommit. Values above
    /// 100 require the swap-backed density bundle on the nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_overcommit_percentage: Option<u32>,
}

/// Selector of an accelerator-image-enforcement rule.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AIERuleSelector {
    /// Device resource names the rule applies to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub device_names: Vec<String>,

    /// VM label selector the rule applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_labels: Option<LabelSelector>,
}

/// One accelerator-image-enforcement rule: launch pods matching the selector
/// with the given image.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AIEWebhookRule {
    /// Rule name, unique within the config.
    pub name: String,

    /// Launcher image to enforce.
    pub image: String,

    /// What the rule matches.
    #[serde(default)]
    pub selector: AIERuleSelector,
}

/// Configuration of the accelerator-image-enforcement webhook.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AIEWebhookConfig {
    /// Enforcement rules, rendered into the launcher config map.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<AIEWebhookRule>,
}

/// Metadata of a data-import-cron template. Only the name is required;
/// namespace defaults to the golden-images namespace.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    /// Template name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Target namespace override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Annotations, including the supported-architectures stamp.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Registry source of a data volume.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataVolumeSourceRegistry {
    /// Explicit image URL (docker://...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Name of an image stream to resolve the URL from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_stream: Option<String>,

    /// Pull method (for example "node").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_method: Option<String>,
}

/// Source of a data volume.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataVolumeSource {
    /// Container-registry source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<DataVolumeSourceRegistry>,
}

/// Spec of the data volume created by each cron trigger.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataVolumeSpec {
    /// Import source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DataVolumeSource>,

    /// Storage configuration, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<serde_json::Value>,
}

/// Template of the data volume created by each cron trigger.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataVolumeTemplate {
    /// Data volume spec.
    #[serde(default)]
    pub spec: DataVolumeSpec,
}

/// Spec of a recurring bootable-image import.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataImportCronSpec {
    /// Cron schedule in standard cron format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,

    /// Data volume template to create on each trigger.
    #[serde(default)]
    pub template: DataVolumeTemplate,

    /// Name of the DataSource the cron manages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_data_source: Option<String>,

    /// Garbage collection mode ("Outdated" or "Never").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub garbage_collect: Option<String>,

    /// How many imported sources to retain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imports_to_keep: Option<i32>,

    /// Retention policy ("RetainAll" or "RetainNone").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_policy: Option<String>,
}

/// A data-import-cron template (golden image definition).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataImportCronTemplate {
    /// Template metadata; name is required when used.
    #[serde(default)]
    pub metadata: TemplateMetadata,

    /// The cron spec.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<DataImportCronSpec>,
}

impl DataImportCronTemplate {
    /// Name of the template, or empty when unset.
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("")
    }
}

/// Provenance of a data-import-cron template published in the status.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataImportCronStatus {
    /// True for an operator-provided (common) template, false for a
    /// user-defined one.
    #[serde(default, skip_serializing_if = "is_false")]
    pub common_template: bool,

    /// True when a common template was customized by the user. Always false
    /// for custom templates.
    #[serde(default, skip_serializing_if = "is_false")]
    pub modified: bool,
}

/// A data-import-cron template as actually published to the scheduling
/// sidecar, with provenance.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub struct DataImportCronTemplateStatus {
    /// The effective template.
    #[serde(flatten)]
    pub template: DataImportCronTemplate,

    /// Provenance tag.
    #[serde(default)]
    pub status: DataImportCronStatus,
}

/// A component name/version pair published in the status.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub struct Version {
    /// Component name; "operator" is the operator itself.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Observed or deployed version.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// Status condition with heartbeat semantics: `last_transition_time` moves
/// only when the status flips, `last_heartbeat_time` moves on every write.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type (Available, Progressing, ...).
    #[serde(rename = "type")]
    pub type_: String,

    /// "True", "False" or "Unknown".
    pub status: String,

    /// Machine-readable reason in CamelCase.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,

    /// Human-readable message.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    /// Generation of the HyperConverged resource the condition was set for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Last time the status changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<chrono::DateTime<chrono::Utc>>,

    /// Last time the condition was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat_time: Option<chrono::DateTime<chrono::Utc>>,
}

/// Reference to an owned or adopted child resource.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    /// API version of the referent.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    /// Kind of the referent.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    /// Namespace of the referent; empty for cluster-scoped children.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Name of the referent.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Resource version at the time of the last reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

/// Observed state of the HyperConverged resource. Shared verbatim between
/// the two API versions.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HyperConvergedStatus {
    /// State of the HyperConverged resource, one entry per condition type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Objects created and maintained by this operator, deduplicated by
    /// (apiVersion, kind, namespace, name).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_objects: Vec<ObjectReference>,

    /// Component versions; upsert by name preserves position.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<Version>,

    /// Generation the published status corresponds to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Cron expression generated once for the common templates; stored here
    /// so it survives operator restart.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data_import_schedule: String,

    /// The effective data-import-cron templates (common and custom) with
    /// provenance tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_import_cron_templates: Vec<DataImportCronTemplateStatus>,

    /// Aggregated health: "healthy", "warning" or "error".
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub system_health_status: String,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Parses a Go-style duration string ("48h0m0s", "1m0s", "800s") into a
/// [`std::time::Duration`]. Fractions and negative values are not accepted;
/// the HyperConverged fields never carry them.
pub fn parse_go_duration(s: &str) -> Option<std::time::Duration> {
    let mut total = 0u64;
    let mut num = String::new();
    let mut seen_unit = false;

    for c in s.chars() {
        if c.is_ascii_digit() {
            num.push(c);
        } else {
            let value: u64 = num.parse().ok()?;
            num.clear();
            seen_unit = true;
            total += match c {
                'h' => value.checked_mul(3600)?,
                'm' => value.checked_mul(60)?,
                's' => value,
                _ => return None,
            };
        }
    }

    if !num.is_empty() || !seen_unit {
        return None;
    }

    Some(std::time::Duration::from_secs(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_durations() {
        assert_eq!(
            parse_go_duration("48h0m0s"),
            Some(std::time::Duration::from_secs(48 * 3600))
        );
        assert_eq!(
            parse_go_duration("1m30s"),
            Some(std::time::Duration::from_secs(90))
        );
        assert_eq!(
            parse_go_duration("800s"),
            Some(std::time::Duration::from_secs(800))
        );
    }

    #[test]
    fn rejects_malformed_durations() {
        assert_eq!(parse_go_duration(""), None);
        assert_eq!(parse_go_duration("48"), None);
        assert_eq!(parse_go_duration("2d"), None);
        assert_eq!(parse_go_duration("h"), None);
    }

    #[test]
    fn dict_status_serializes_flattened() {
        let entry = DataImportCronTemplateStatus {
            template: DataImportCronTemplate {
                metadata: TemplateMetadata {
                    name: Some("centos8".to_string()),
                    ..Default::default()
                },
                spec: None,
            },
            status: DataImportCronStatus {
                common_template: true,
                modified: false,
            },
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["metadata"]["name"], "centos8");
        assert_eq!(json["status"]["commonTemplate"], true);
    }
}
