//! Translation of child-resource conditions into CR-level conditions.
//!
//! Children only ever downgrade: the first component reporting a problem
//! sets the condition and its reason, later components cannot restore a
//! positive state. Types left untouched at the end of the pass fall back to
//! the positive defaults.

use serde_json::Value;

use crds::shared::{
    CONDITION_AVAILABLE, CONDITION_DEGRADED, CONDITION_PROGRESSING, CONDITION_UPGRADEABLE,
    Condition,
};
use crds::status::Conditions;

/// One condition as read from a child object's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildCondition {
    pub type_: String,
    pub status: String,
    pub reason: String,
    pub message: String,
}

/// Reads `status.conditions` from a raw child object. Entries without a
/// recognizable type or status are skipped.
pub fn read_child_conditions(object: &Value) -> Vec<ChildCondition> {
    let Some(Value::Array(conditions)) = object.pointer("/status/conditions") else {
        return Vec::new();
    };

    conditions
        .iter()
        .filter_map(|c| {
            Some(ChildCondition {
                type_: c.get("type")?.as_str()?.to_string(),
                status: c.get("status")?.as_str()?.to_string(),
                reason: string_or_empty(c.get("reason")),
                message: string_or_empty(c.get("message")),
            })
        })
        .collect()
}

fn string_or_empty(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Folds one component's child conditions into the accumulator.
pub fn translate_child(acc: &mut Conditions, component: &str, child: &[ChildCondition]) {
    if child.is_empty() {
        let reason = format!("{component}Conditions");
        let message = format!("{component} resource has no conditions");
        downgrade(acc, CONDITION_AVAILABLE, "False", &reason, &message);
        downgrade(acc, CONDITION_PROGRESSING, "True", &reason, &message);
        downgrade(acc, CONDITION_UPGRADEABLE, "False", &reason, &message);
        return;
    }

    for cond in child {
        match (cond.type_.as_str(), cond.status.as_str()) {
            (CONDITION_AVAILABLE, "False") => {
                let reason = format!("{component}NotAvailable");
                let message = child_message(component, cond);
                downgrade(acc, CONDITION_AVAILABLE, "False", &reason, &message);
            }
            (CONDITION_PROGRESSING, "True") => {
                let reason = format!("{component}Progressing");
                let message = child_message(component, cond);
                downgrade(acc, CONDITION_PROGRESSING, "True", &reason, &message);
                downgrade(acc, CONDITION_UPGRADEABLE, "False", &reason, &message);
            }
            (CONDITION_DEGRADED, "True") => {
                let reason = format!("{component}Degraded");
                let message = child_message(component, cond);
                downgrade(acc, CONDITION_DEGRADED, "True", &reason, &message);
            }
            _ => {}
        }
    }
}

/// Fills every aggregation type still unset with its positive default.
pub fn fill_positive_defaults(acc: &mut Conditions) {
    for (type_, status, reason, message) in [
        (
            CONDITION_AVAILABLE,
            "True",
            "ReconcileComplete",
            "Reconcile completed successfully",
        ),
        (
            CONDITION_PROGRESSING,
            "False",
            "ReconcileComplete",
            "Reconcile completed successfully",
        ),
        (
            CONDITION_DEGRADED,
            "False",
            "ReconcileComplete",
            "Reconcile completed successfully",
        ),
        (
            CONDITION_UPGRADEABLE,
            "True",
            "ReconcileComplete",
            "Reconcile completed successfully",
        ),
    ] {
        if !acc.contains(type_) {
            acc.set_parts(type_, status, reason, message);
        }
    }
}

fn child_message(component: &str, cond: &ChildCondition) -> String {
    if cond.message.is_empty() {
        format!("{component} is reporting {}={}", cond.type_, cond.status)
    } else {
        format!("{component}: {}", cond.message)
    }
}

fn downgrade(acc: &mut Conditions, type_: &str, status: &str, reason: &str, message: &str) {
    acc.set_if_unset(Condition {
        type_: type_.to_string(),
        status: status.to_string(),
        reason: reason.to_string(),
        message: message.to_string(),
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(type_: &str, status: &str) -> ChildCondition {
        ChildCondition {
            type_: type_.to_string(),
            status: status.to_string(),
            reason: String::new(),
            message: String::new(),
        }
    }

    #[test]
    fn missing_conditions_report_the_component() {
        let mut acc = Conditions::new();
        translate_child(&mut acc, "CDI", &[]);

        let available = acc.get(CONDITION_AVAILABLE).unwrap();
        assert_eq!(available.status, "False");
        assert_eq!(available.reason, "CDIConditions");
        assert_eq!(available.message, "CDI resource has no conditions");
        assert_eq!(acc.get(CONDITION_UPGRADEABLE).unwrap().status, "False");
    }

    #[test]
    fn first_failing_component_wins() {
        let mut acc = Conditions::new();
        translate_child(&mut acc, "KubeVirt", &[child(CONDITION_AVAILABLE, "False")]);
        translate_child(&mut acc, "CDI", &[child(CONDITION_AVAILABLE, "False")]);

        assert_eq!(
            acc.get(CONDITION_AVAILABLE).unwrap().reason,
            "KubeVirtNotAvailable"
        );
    }

    #[test]
    fn progressing_child_also_blocks_upgrades() {
        let mut acc = Conditions::new();
        translate_child(
            &mut acc,
            "NetworkAddonsConfig",
            &[
                child(CONDITION_AVAILABLE, "True"),
                child(CONDITION_PROGRESSING, "True"),
            ],
        );

        assert_eq!(acc.get(CONDITION_PROGRESSING).unwrap().status, "True");
        assert_eq!(
            acc.get(CONDITION_UPGRADEABLE).unwrap().reason,
            "NetworkAddonsConfigProgressing"
        );
        assert!(acc.get(CONDITION_AVAILABLE).is_none());
    }

    #[test]
    fn healthy_children_leave_positive_defaults() {
        let mut acc = Conditions::new();
        translate_child(
            &mut acc,
            "SSP",
            &[
                child(CONDITION_AVAILABLE, "True"),
                child(CONDITION_PROGRESSING, "False"),
                child(CONDITION_DEGRADED, "False"),
            ],
        );
        fill_positive_defaults(&mut acc);

        assert_eq!(acc.get(CONDITION_AVAILABLE).unwrap().status, "True");
        assert_eq!(acc.get(CONDITION_DEGRADED).unwrap().status, "False");
        assert_eq!(acc.get(CONDITION_UPGRADEABLE).unwrap().status, "True");
    }

    #[test]
    fn child_conditions_parse_from_raw_status() {
        let object = serde_json::json!({
            "status": {
                "conditions": [
                    {"type": "Available", "status": "False", "reason": "Deploying", "message": "rolling out"},
                    {"garbage": true},
                ],
            },
        });

        let parsed = read_child_conditions(&object);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].reason, "Deploying");
    }
}
