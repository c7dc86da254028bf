//! Status bookkeeping: the per-pass condition accumulator and the
//! position-stable list upserts used by the reconcile engine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::shared::{
    CONDITION_AVAILABLE, CONDITION_DEGRADED, CONDITION_PROGRESSING, CONDITION_RECONCILE_COMPLETE,
    CONDITION_TAINTED_CONFIGURATION, CONDITION_UPGRADEABLE, Condition, ObjectReference, Version,
};

/// Canonical output order of the well-known condition types. Unknown types
/// sort after these, alphabetically.
const CONDITION_ORDER: &[&str] = &[
    CONDITION_RECONCILE_COMPLETE,
    CONDITION_AVAILABLE,
    CONDITION_PROGRESSING,
    CONDITION_DEGRADED,
    CONDITION_UPGRADEABLE,
    CONDITION_TAINTED_CONFIGURATION,
];

/// Condition accumulator for one reconcile pass.
///
/// Handlers write conditions here keyed by type; at the end of the pass the
/// accumulated state is flushed into the resource status with
/// [`Conditions::apply_to`], which owns the timestamp rules:
/// `lastTransitionTime` moves only when the status string flips, while
/// `lastHeartbeatTime` moves on every flush.
#[derive(Debug, Clone, Default)]
pub struct Conditions {
    map: BTreeMap<String, Condition>,
}

impl Conditions {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no condition has been recorded this pass.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// True when `type_` has been recorded this pass.
    pub fn contains(&self, type_: &str) -> bool {
        self.map.contains_key(type_)
    }

    /// The recorded condition of `type_`, if any.
    pub fn get(&self, type_: &str) -> Option<&Condition> {
        self.map.get(type_)
    }

    /// Records a condition, replacing any previous one of the same type.
    pub fn set(&mut self, cond: Condition) {
        self.map.insert(cond.type_.clone(), cond);
    }

    /// Records a condition only when its type has not been recorded yet.
    /// Used by the aggregation loop, where the first (worst) report wins.
    pub fn set_if_unset(&mut self, cond: Condition) {
        self.map.entry(cond.type_.clone()).or_insert(cond);
    }

    /// Builds a condition in place from its parts.
    pub fn set_parts(&mut self, type_: &str, status: &str, reason: &str, message: &str) {
        self.set(Condition {
            type_: type_.to_string(),
            status: status.to_string(),
            reason: reason.to_string(),
            message: message.to_string(),
            ..Default::default()
        });
    }

    /// Flushes the accumulated conditions into `existing`, applying the
    /// timestamp and generation rules. Types not recorded this pass are left
    /// untouched; recorded types keep their position, new ones append in
    /// canonical order.
    pub fn apply_to(
        &self,
        existing: &mut Vec<Condition>,
        observed_generation: i64,
        now: DateTime<Utc>,
    ) {
        let mut ordered: Vec<&Condition> = self.map.values().collect();
        ordered.sort_by_key(|c| {
            CONDITION_ORDER
                .iter()
                .position(|t| *t == c.type_)
                .unwrap_or(CONDITION_ORDER.len())
        });

        for cond in ordered {
            let mut next = cond.clone();
            next.observed_generation = Some(observed_generation);
            next.last_heartbeat_time = Some(now);

            match existing.iter_mut().find(|c| c.type_ == cond.type_) {
                Some(slot) => {
                    next.last_transition_time = if slot.status == next.status {
                        slot.last_transition_time
                    } else {
                        Some(now)
                    };
                    *slot = next;
                }
                None => {
                    next.last_transition_time = Some(now);
                    existing.push(next);
                }
            }
        }
    }
}

/// Upserts a component version by name, keeping list position stable.
pub fn upsert_version(versions: &mut Vec<Version>, name: &str, version: &str) {
    match versions.iter_mut().find(|v| v.name == name) {
        Some(existing) => existing.version = version.to_string(),
        None => versions.push(Version {
            name: name.to_string(),
            version: version.to_string(),
        }),
    }
}

/// The recorded version for `name`, if any.
pub fn get_version<'a>(versions: &'a [Version], name: &str) -> Option<&'a str> {
    versions
        .iter()
        .find(|v| v.name == name)
        .map(|v| v.version.as_str())
}

/// Adds a related-object reference, replacing an existing reference to the
/// same object (matched by apiVersion, kind, namespace and name).
pub fn add_related_object(objects: &mut Vec<ObjectReference>, obj: ObjectReference) {
    let same = |o: &ObjectReference| {
        o.api_version == obj.api_version
            && o.kind == obj.kind
            && o.namespace == obj.namespace
            && o.name == obj.name
    };
    match objects.iter_mut().find(|o| same(o)) {
        Some(existing) => *existing = obj,
        None => objects.push(obj),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn transition_time_moves_only_on_status_change() {
        let mut conds = Conditions::new();
        conds.set_parts(CONDITION_AVAILABLE, "True", "ReconcileCompleted", "ok");

        let mut status = Vec::new();
        conds.apply_to(&mut status, 1, at(100));
        assert_eq!(status[0].last_transition_time, Some(at(100)));
        assert_eq!(status[0].last_heartbeat_time, Some(at(100)));

        conds.apply_to(&mut status, 2, at(200));
        assert_eq!(status[0].last_transition_time, Some(at(100)));
        assert_eq!(status[0].last_heartbeat_time, Some(at(200)));
        assert_eq!(status[0].observed_generation, Some(2));

        let mut conds = Conditions::new();
        conds.set_parts(CONDITION_AVAILABLE, "False", "KubeVirtNotAvailable", "down");
        conds.apply_to(&mut status, 3, at(300));
        assert_eq!(status[0].last_transition_time, Some(at(300)));
    }

    #[test]
    fn first_writer_wins_with_set_if_unset() {
        let mut conds = Conditions::new();
        conds.set_if_unset(Condition {
            type_: CONDITION_DEGRADED.to_string(),
            status: "True".to_string(),
            reason: "KubeVirtDegraded".to_string(),
            ..Default::default()
        });
        conds.set_if_unset(Condition {
            type_: CONDITION_DEGRADED.to_string(),
            status: "True".to_string(),
            reason: "CDIDegraded".to_string(),
            ..Default::default()
        });

        assert_eq!(conds.get(CONDITION_DEGRADED).unwrap().reason, "KubeVirtDegraded");
    }

    #[test]
    fn new_conditions_append_in_canonical_order() {
        let mut conds = Conditions::new();
        conds.set_parts(CONDITION_UPGRADEABLE, "True", "ReconcileCompleted", "");
        conds.set_parts(CONDITION_AVAILABLE, "True", "ReconcileCompleted", "");

        let mut status = Vec::new();
        conds.apply_to(&mut status, 1, at(1));
        assert_eq!(status[0].type_, CONDITION_AVAILABLE);
        assert_eq!(status[1].type_, CONDITION_UPGRADEABLE);
    }

    #[test]
    fn version_upsert_is_position_stable() {
        let mut versions = Vec::new();
        upsert_version(&mut versions, "operator", "1.14.0");
        upsert_version(&mut versions, "kubevirt", "1.4.0");
        upsert_version(&mut versions, "operator", "1.15.0");

        assert_eq!(versions[0].name, "operator");
        assert_eq!(versions[0].version, "1.15.0");
        assert_eq!(get_version(&versions, "kubevirt"), Some("1.4.0"));
    }

    #[test]
    fn related_objects_dedup_by_identity() {
        let obj = |rv: &str| ObjectReference {
            api_version: "kubevirt.io/v1".to_string(),
            kind: "KubeVirt".to_string(),
            namespace: Some("kubevirt-hyperconverged".to_string()),
            name: "kubevirt-kubevirt-hyperconverged".to_string(),
            resource_version: Some(rv.to_string()),
        };

        let mut objects = Vec::new();
        add_related_object(&mut objects, obj("1"));
        add_related_object(&mut objects, obj("2"));

        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].resource_version.as_deref(), Some("2"));
    }
}
