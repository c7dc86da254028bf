//! Defaulting mutation for HyperConverged admission.
//!
//! Runs the static defaulting over a copy of the submitted resource and
//! answers with the JSON-Patch between the two, so the stored object is
//! always fully populated. A field removed by the user comes back as its
//! default on the same write.

use crds::v1beta1::HyperConverged;
use json_patch::Patch;

/// The patch that brings `hc` to its fully-defaulted form. Empty when the
/// resource already carries every default.
pub fn default_patch(hc: &HyperConverged, single_worker: bool) -> Result<Patch, serde_json::Error> {
    let mut defaulted = hc.clone();
    crds::defaults::apply(&mut defaulted.spec, single_worker);

    let before = serde_json::to_value(hc)?;
    let after = serde_json::to_value(&defaulted)?;
    Ok(json_patch::diff(&before, &after))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::HYPERCONVERGED_NAME;
    use crds::v1beta1::HyperConvergedSpec;

    fn bare_hc() -> HyperConverged {
        let mut hc = HyperConverged::new(HYPERCONVERGED_NAME, HyperConvergedSpec::default());
        hc.metadata.namespace = Some("kubevirt-hyperconverged".to_string());
        hc
    }

    fn paths(patch: &Patch) -> Vec<String> {
        patch.0.iter().map(|op| op.path().to_string()).collect()
    }

    #[test]
    fn bare_spec_gets_a_patch_per_missing_default() {
        let patch = default_patch(&bare_hc(), false).unwrap();
        let paths = paths(&patch);

        assert!(paths.iter().any(|p| p == "/spec/uninstallStrategy"));
        assert!(paths.iter().any(|p| p == "/spec/certConfig"));
        assert!(paths.iter().any(|p| p == "/spec/liveMigrationConfig"));
        assert!(paths.iter().any(|p| p == "/spec/evictionStrategy"));
    }

    #[test]
    fn defaulted_spec_yields_empty_patch() {
        let mut hc = bare_hc();
        crds::defaults::apply(&mut hc.spec, false);
        let patch = default_patch(&hc, false).unwrap();
        assert!(patch.0.is_empty());
    }

    #[test]
    fn removed_field_comes_back_as_default() {
        let mut hc = bare_hc();
        crds::defaults::apply(&mut hc.spec, false);
        hc.spec.uninstall_strategy = None;

        let patch = default_patch(&hc, false).unwrap();
        let paths = paths(&patch);
        assert_eq!(paths, vec!["/spec/uninstallStrategy".to_string()]);
    }

    #[test]
    fn single_worker_defaults_eviction_to_none() {
        let patch = default_patch(&bare_hc(), true).unwrap();
        let value = patch
            .0
            .iter()
            .find(|op| op.path().to_string() == "/spec/evictionStrategy")
            .and_then(|op| match op {
                json_patch::PatchOperation::Add(add) => Some(add.value.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(value, "None");

        let patch = default_patch(&bare_hc(), false).unwrap();
        let value = patch
            .0
            .iter()
            .find(|op| op.path().to_string() == "/spec/evictionStrategy")
            .and_then(|op| match op {
                json_patch::PatchOperation::Add(add) => Some(add.value.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(value, "LiveMigrate");
    }
}
