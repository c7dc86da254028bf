//! Static feature-gate registry: every known gate name with its lifecycle
//! phase. The phase decides the default state of a gate and whether user
//! entries can still change it.

/// Lifecycle phase of a feature gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureGatePhase {
    /// Experimental; off unless explicitly enabled.
    Alpha,
    /// Stabilizing; on unless explicitly disabled.
    Beta,
    /// Graduated; always on, entries are ignored.
    GA,
    /// Retired; always off, entries are ignored.
    Deprecated,
}

impl FeatureGatePhase {
    /// Default state for an unlisted gate of this phase.
    pub fn default_enabled(self) -> bool {
        matches!(self, FeatureGatePhase::Beta | FeatureGatePhase::GA)
    }

    /// True when the state can no longer be changed by an entry.
    pub fn is_final(self) -> bool {
        matches!(self, FeatureGatePhase::GA | FeatureGatePhase::Deprecated)
    }
}

/// All known gates. Adding a gate here is the only registration step.
const REGISTRY: &[(&str, FeatureGatePhase)] = &[
    ("deployAIEWebhook", FeatureGatePhase::Beta),
    ("enableCommonBootImageImport", FeatureGatePhase::Beta),
    ("enableHigherDensityWithSwap", FeatureGatePhase::Alpha),
    ("downwardMetrics", FeatureGatePhase::Alpha),
    ("persistentReservation", FeatureGatePhase::Alpha),
    ("alignCPUs", FeatureGatePhase::Alpha),
    ("disableMDevConfiguration", FeatureGatePhase::Alpha),
    ("deployKubeSecondaryDNS", FeatureGatePhase::Alpha),
    ("kubevirtSeccompProfile", FeatureGatePhase::GA),
    ("enableManagedTenantQuota", FeatureGatePhase::Deprecated),
    ("nonRoot", FeatureGatePhase::Deprecated),
    ("withHostPassthroughCPU", FeatureGatePhase::Deprecated),
];

/// The phase of `name`, or None for unknown gates.
pub fn gate_phase(name: &str) -> Option<FeatureGatePhase> {
    REGISTRY
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, phase)| *phase)
}

/// Names of every registered gate, in registry order.
pub fn gate_names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(n, _)| *n)
}

/// Resolves the effective state of `name` given an optional explicit value.
/// Final phases win over the explicit value; unknown names are always off.
pub fn resolve_phase(name: &str, explicit: Option<bool>) -> bool {
    match gate_phase(name) {
        None => false,
        Some(phase) if phase.is_final() => phase.default_enabled(),
        Some(phase) => explicit.unwrap_or_else(|| phase.default_enabled()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ga_gates_cannot_be_disabled() {
        assert!(resolve_phase("kubevirtSeccompProfile", Some(false)));
    }

    #[test]
    fn deprecated_gates_cannot_be_enabled() {
        assert!(!resolve_phase("enableManagedTenantQuota", Some(true)));
        assert!(!resolve_phase("nonRoot", Some(true)));
    }

    #[test]
    fn alpha_defaults_off_beta_defaults_on() {
        assert!(!resolve_phase("persistentReservation", None));
        assert!(resolve_phase("persistentReservation", Some(true)));
        assert!(resolve_phase("deployAIEWebhook", None));
        assert!(!resolve_phase("deployAIEWebhook", Some(false)));
    }

    #[test]
    fn unknown_gates_are_off() {
        assert!(!resolve_phase("notARealGate", Some(true)));
        assert!(gate_phase("notARealGate").is_none());
    }
}
