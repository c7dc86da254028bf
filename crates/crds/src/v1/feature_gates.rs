//! Feature gates as an ordered entry list, the `v1` representation.
//!
//! Wire format: an entry with no `enabled` key means Enabled, so a gate that
//! is merely listed is on. `enabled` is written only for disabled gates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::registry::{self, FeatureGatePhase};

/// Whether a listed gate is on or off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum Enablement {
    /// The gate is on. Never written to the wire.
    #[default]
    #[serde(rename = "True")]
    Enabled,

    /// The gate is explicitly off.
    #[serde(rename = "False")]
    Disabled,
}

impl Enablement {
    /// True for [`Enablement::Enabled`]; used to keep it off the wire.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Enablement::Enabled)
    }
}

/// A single named feature gate entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FeatureGate {
    /// Gate name, matching the registry.
    pub name: String,

    /// Explicit state; omitted on the wire when enabled.
    #[serde(default, skip_serializing_if = "Enablement::is_enabled")]
    pub enabled: Enablement,
}

impl FeatureGate {
    /// An enabled entry for `name`.
    pub fn enabled(name: impl Into<String>) -> Self {
        FeatureGate {
            name: name.into(),
            enabled: Enablement::Enabled,
        }
    }

    /// A disabled entry for `name`.
    pub fn disabled(name: impl Into<String>) -> Self {
        FeatureGate {
            name: name.into(),
            enabled: Enablement::Disabled,
        }
    }
}

/// Ordered set of feature gate entries with name-keyed access.
///
/// Order is user-facing and preserved: `add` overwrites in place rather than
/// re-appending.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct FeatureGateSet(pub Vec<FeatureGate>);

impl FeatureGateSet {
    /// True when no gate is listed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Inserts the entry, overwriting an existing entry of the same name in
    /// place.
    pub fn add(&mut self, gate: FeatureGate) {
        match self.0.iter_mut().find(|g| g.name == gate.name) {
            Some(existing) => *existing = gate,
            None => self.0.push(gate),
        }
    }

    /// Marks `name` as enabled, inserting the entry if absent.
    pub fn enable(&mut self, name: &str) {
        self.add(FeatureGate::enabled(name));
    }

    /// Marks `name` as disabled, inserting the entry if absent.
    pub fn disable(&mut self, name: &str) {
        self.add(FeatureGate::disabled(name));
    }

    /// The explicit entry for `name`, if listed.
    pub fn get(&self, name: &str) -> Option<&FeatureGate> {
        self.0.iter().find(|g| g.name == name)
    }

    /// Resolves the effective state of `name`.
    ///
    /// Unknown names are always off. GA and Deprecated gates are final and
    /// ignore explicit entries. Otherwise an explicit entry wins, falling
    /// back to the phase default (Beta on, Alpha off).
    pub fn is_enabled(&self, name: &str) -> bool {
        let Some(phase) = registry::gate_phase(name) else {
            return false;
        };

        match phase {
            FeatureGatePhase::GA => true,
            FeatureGatePhase::Deprecated => false,
            FeatureGatePhase::Alpha | FeatureGatePhase::Beta => self
                .get(name)
                .map(|g| g.enabled.is_enabled())
                .unwrap_or(phase == FeatureGatePhase::Beta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_entry_has_no_enabled_key() {
        let gate = FeatureGate::enabled("deployAIEWebhook");
        let json = serde_json::to_value(&gate).unwrap();
        assert_eq!(json, serde_json::json!({"name": "deployAIEWebhook"}));
    }

    #[test]
    fn disabled_entry_writes_false() {
        let gate = FeatureGate::disabled("deployAIEWebhook");
        let json = serde_json::to_value(&gate).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "deployAIEWebhook", "enabled": "False"})
        );
    }

    #[test]
    fn missing_enabled_deserializes_as_enabled() {
        let gate: FeatureGate =
            serde_json::from_value(serde_json::json!({"name": "persistentReservation"})).unwrap();
        assert_eq!(gate.enabled, Enablement::Enabled);
    }

    #[test]
    fn add_overwrites_in_place() {
        let mut set = FeatureGateSet::default();
        set.enable("persistentReservation");
        set.enable("alignCPUs");
        set.disable("persistentReservation");

        assert_eq!(set.0[0], FeatureGate::disabled("persistentReservation"));
        assert_eq!(set.0.len(), 2);
    }

    #[test]
    fn final_phases_ignore_explicit_entries() {
        let mut set = FeatureGateSet::default();
        set.disable("kubevirtSeccompProfile");
        set.enable("enableManagedTenantQuota");

        assert!(set.is_enabled("kubevirtSeccompProfile"));
        assert!(!set.is_enabled("enableManagedTenantQuota"));
    }

    #[test]
    fn phase_defaults_apply_to_unlisted_gates() {
        let set = FeatureGateSet::default();
        assert!(set.is_enabled("enableCommonBootImageImport"));
        assert!(!set.is_enabled("persistentReservation"));
        assert!(!set.is_enabled("noSuchGate"));
    }
}
