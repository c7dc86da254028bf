//! Operator environment: install namespace, component versions and image
//! names injected by the deployment manifest.

use std::env;

use crate::error::ControllerError;

/// Environment variable with the operator install namespace.
pub const ENV_OPERATOR_NAMESPACE: &str = "OPERATOR_NAMESPACE";
/// Fallback namespace when none is injected.
pub const DEFAULT_NAMESPACE: &str = "kubevirt-hyperconverged";

/// Configuration the operator reads from its own pod environment once at
/// startup. Component versions feed `status.versions`; the side-car image
/// names are required, a deployment without them is broken and the pass
/// must fail rather than roll out an incomplete import stack.
#[derive(Debug, Clone)]
pub struct OperatorEnv {
    /// Namespace the operator and its namespaced children live in.
    pub namespace: String,

    /// Version of the operator itself; published as the "operator" entry.
    pub operator_version: String,

    /// Versions of the composite children, published per component.
    pub kubevirt_version: String,
    /// Data-import child version.
    pub cdi_version: String,
    /// Network add-ons child version.
    pub network_addons_version: String,
    /// Scheduling sidecar child version.
    pub ssp_version: String,

    /// Image of the disk conversion side-car.
    pub conversion_container: String,
    /// Image of the VMware import side-car.
    pub vmware_container: String,

    /// SMBIOS defaults for the virtualization config.
    pub smbios: Option<String>,
    /// Machine-type default for the virtualization config.
    pub machinetype: Option<String>,

    /// Alternative namespace for bootable-image resources.
    pub images_namespace: Option<String>,
}

impl OperatorEnv {
    /// Reads the environment. Fails on missing import side-car images.
    pub fn from_env() -> Result<Self, ControllerError> {
        let required = |name: &str| {
            env::var(name).map_err(|_| {
                ControllerError::InvalidConfig(format!("{name} environment variable is required"))
            })
        };

        Ok(Self {
            namespace: env::var(ENV_OPERATOR_NAMESPACE)
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
            operator_version: env::var("OPERATOR_VERSION").unwrap_or_default(),
            kubevirt_version: env::var("KUBEVIRT_VERSION").unwrap_or_default(),
            cdi_version: env::var("CDI_VERSION").unwrap_or_default(),
            network_addons_version: env::var("NETWORK_ADDONS_VERSION").unwrap_or_default(),
            ssp_version: env::var("SSP_VERSION").unwrap_or_default(),
            conversion_container: required("CONVERSION_CONTAINER")?,
            vmware_container: required("VMWARE_CONTAINER")?,
            smbios: env::var("SMBIOS").ok(),
            machinetype: env::var("MACHINETYPE").ok(),
            images_namespace: env::var("IMAGES_NS").ok(),
        })
    }

    /// Namespace the bootable-image resources go into.
    pub fn images_namespace(&self) -> &str {
        self.images_namespace.as_deref().unwrap_or(&self.namespace)
    }
}

#[cfg(test)]
pub fn test_env() -> OperatorEnv {
    OperatorEnv {
        namespace: DEFAULT_NAMESPACE.to_string(),
        operator_version: "1.15.0".to_string(),
        kubevirt_version: "1.4.0".to_string(),
        cdi_version: "1.61.0".to_string(),
        network_addons_version: "0.98.0".to_string(),
        ssp_version: "0.22.0".to_string(),
        conversion_container: "quay.io/kubevirt/kubevirt-v2v-conversion:test".to_string(),
        vmware_container: "quay.io/kubevirt/kubevirt-vmware:test".to_string(),
        smbios: Some("Family: KubeVirt\nProduct: None".to_string()),
        machinetype: Some("q35".to_string()),
        images_namespace: None,
    }
}
