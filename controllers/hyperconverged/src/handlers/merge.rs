//! Three-way projection of a child resource: desired object, live object and
//! the per-field merge policy produce the target the engine writes back.

use serde_json::Value;

use super::MergePolicy;
use crate::error::ControllerError;

/// Computes the object to write for an existing child.
///
/// The user patch, when present, is applied to the desired object first;
/// operator-managed pointers are then re-forced so a patch cannot displace
/// them. The result is the live object with the desired object deep-merged
/// over it, with third-party pointers restored from live (unless upgrade
/// mode forces them).
pub fn project_target(
    live: &Value,
    desired: &Value,
    policy: &MergePolicy,
    user_patch: Option<&json_patch::Patch>,
    upgrade_mode: bool,
    component: &'static str,
) -> Result<Value, ControllerError> {
    let mut desired = desired.clone();

    if let Some(patch) = user_patch {
        let forced: Vec<(&str, Option<Value>)> = policy
            .operator
            .iter()
            .map(|ptr| (*ptr, desired.pointer(ptr).cloned()))
            .collect();

        json_patch::patch(&mut desired, patch)
            .map_err(|e| ControllerError::JsonPatch(component.to_string(), e.to_string()))?;

        for (ptr, value) in forced {
            match value {
                Some(v) => set_pointer(&mut desired, ptr, v),
                None => remove_pointer(&mut desired, ptr),
            }
        }
    }

    let mut target = live.clone();
    deep_merge(&mut target, &desired);

    for ptr in policy.preserve {
        if upgrade_mode && policy.force_on_upgrade.contains(ptr) {
            continue;
        }
        if let Some(existing) = live.pointer(ptr) {
            set_pointer(&mut target, ptr, existing.clone());
        }
    }

    Ok(target)
}

/// Whether the write would change anything the operator cares about. Status
/// and server-populated metadata are ignored.
pub fn differs(live: &Value, target: &Value) -> bool {
    if live.pointer("/spec") != target.pointer("/spec")
        || live.pointer("/data") != target.pointer("/data")
        || live.pointer("/webhooks") != target.pointer("/webhooks")
        || live.pointer("/rules") != target.pointer("/rules")
        || live.pointer("/roleRef") != target.pointer("/roleRef")
        || live.pointer("/subjects") != target.pointer("/subjects")
        || live.pointer("/value") != target.pointer("/value")
    {
        return true;
    }
    !labels_subset(target, live) || !annotations_subset(target, live)
}

fn labels_subset(wanted: &Value, live: &Value) -> bool {
    map_subset(
        wanted.pointer("/metadata/labels"),
        live.pointer("/metadata/labels"),
    )
}

fn annotations_subset(wanted: &Value, live: &Value) -> bool {
    map_subset(
        wanted.pointer("/metadata/annotations"),
        live.pointer("/metadata/annotations"),
    )
}

fn map_subset(wanted: Option<&Value>, live: Option<&Value>) -> bool {
    let Some(Value::Object(wanted)) = wanted else {
        return true;
    };
    let Some(Value::Object(live)) = live else {
        return wanted.is_empty();
    };
    wanted.iter().all(|(k, v)| live.get(k) == Some(v))
}

/// Recursively merges `overlay` into `base`: objects merge key by key,
/// everything else (scalars, arrays, null) replaces.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

fn set_pointer(doc: &mut Value, pointer: &str, value: Value) {
    let Some((parent, key)) = pointer.rsplit_once('/') else {
        return;
    };
    let parent = if parent.is_empty() {
        Some(doc)
    } else {
        doc.pointer_mut(parent)
    };
    if let Some(Value::Object(map)) = parent {
        map.insert(key.to_string(), value);
    }
}

fn remove_pointer(doc: &mut Value, pointer: &str) {
    let Some((parent, key)) = pointer.rsplit_once('/') else {
        return;
    };
    let parent = if parent.is_empty() {
        Some(doc)
    } else {
        doc.pointer_mut(parent)
    };
    if let Some(Value::Object(map)) = parent {
        map.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn desired_fields_overwrite_live_drift() {
        let live = json!({"spec": {"replicas": 5, "foreign": "kept"}});
        let desired = json!({"spec": {"replicas": 2}});

        let target = project_target(
            &live,
            &desired,
            &MergePolicy::default(),
            None,
            false,
            "Test",
        )
        .unwrap();

        assert_eq!(target["spec"]["replicas"], 2);
        assert_eq!(target["spec"]["foreign"], "kept");
        assert!(differs(&live, &target));
    }

    #[test]
    fn preserved_pointer_survives_normal_pass_but_not_upgrade() {
        let live = json!({"spec": {"configuration": {"machineType": "pinned-by-admin"}}});
        let desired = json!({"spec": {"configuration": {"machineType": "q35"}}});
        let policy = MergePolicy {
            preserve: &["/spec/configuration/machineType"],
            force_on_upgrade: &["/spec/configuration/machineType"],
            ..Default::default()
        };

        let steady = project_target(&live, &desired, &policy, None, false, "Test").unwrap();
        assert_eq!(steady["spec"]["configuration"]["machineType"], "pinned-by-admin");

        let upgrade = project_target(&live, &desired, &policy, None, true, "Test").unwrap();
        assert_eq!(upgrade["spec"]["configuration"]["machineType"], "q35");
    }

    #[test]
    fn user_patch_cannot_displace_operator_fields() {
        let live = json!({"spec": {}});
        let desired = json!({"spec": {"imagePullPolicy": "IfNotPresent", "tuning": "default"}});
        let policy = MergePolicy {
            operator: &["/spec/imagePullPolicy"],
            ..Default::default()
        };
        let patch: json_patch::Patch = serde_json::from_value(json!([
            {"op": "replace", "path": "/spec/imagePullPolicy", "value": "Always"},
            {"op": "replace", "path": "/spec/tuning", "value": "custom"},
        ]))
        .unwrap();

        let target = project_target(&live, &desired, &policy, Some(&patch), false, "Test").unwrap();

        assert_eq!(target["spec"]["imagePullPolicy"], "IfNotPresent");
        assert_eq!(target["spec"]["tuning"], "custom");
    }

    #[test]
    fn invalid_patch_reports_the_component() {
        let patch: json_patch::Patch = serde_json::from_value(json!([
            {"op": "replace", "path": "/spec/missing/deep", "value": 1},
        ]))
        .unwrap();

        let err = project_target(
            &json!({"spec": {}}),
            &json!({"spec": {}}),
            &MergePolicy::default(),
            Some(&patch),
            false,
            "KubeVirt",
        )
        .unwrap_err();

        assert!(matches!(err, ControllerError::JsonPatch(component, _) if component == "KubeVirt"));
    }

    #[test]
    fn missing_labels_count_as_drift() {
        let live = json!({"spec": {}, "metadata": {"labels": {"app": "old"}}});
        let target = json!({"spec": {}, "metadata": {"labels": {"app": "old", "extra": "new"}}});
        assert!(differs(&live, &target));

        let superset = json!({"spec": {}, "metadata": {"labels": {"app": "old", "other": "x"}}});
        assert!(!differs(&superset, &json!({"spec": {}, "metadata": {"labels": {"app": "old"}}})));
    }
}
