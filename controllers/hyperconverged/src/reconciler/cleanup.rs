//! Uninstall path: run when the HyperConverged CR carries a deletion
//! timestamp. Removes the admission webhook first (so finalizer patches are
//! not rejected by our own webhook), then clears finalizers so garbage
//! collection can proceed, then deletes legacy aggregated API services.

use std::time::Duration;

use kube::api::{Api, ApiResource, DynamicObject, Patch, PatchParams};
use kube::core::GroupVersionKind;
use kube::{Client, ResourceExt};
use serde_json::json;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crds::v1beta1::HyperConverged;

use crate::env::OperatorEnv;
use crate::error::ControllerError;
use crate::handlers::kubevirt::KUBEVIRT_NAME;

/// Name of the operator's validating webhook configuration.
const VALIDATING_WEBHOOK_NAME: &str = "validate-hco.kubevirt.io";

/// Aggregated API services left behind by very old virtualization versions.
const LEGACY_API_SERVICES: &[&str] = &["v1alpha3.subresources.kubevirt.io"];

const FINALIZER_POLL: Duration = Duration::from_secs(1);
const FINALIZER_DEADLINE: Duration = Duration::from_secs(30);

/// Runs the whole uninstall sequence.
pub async fn run(
    client: &Client,
    env: &OperatorEnv,
    hc: &HyperConverged,
) -> Result<(), ControllerError> {
    remove_validating_webhook(client).await?;
    clear_finalizers(client, env, hc).await?;
    remove_legacy_api_services(client).await?;
    Ok(())
}

async fn remove_validating_webhook(client: &Client) -> Result<(), ControllerError> {
    let ar = ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk(
            "admissionregistration.k8s.io",
            "v1",
            "ValidatingWebhookConfiguration",
        ),
        "validatingwebhookconfigurations",
    );
    let api: Api<DynamicObject> = Api::all_with(client.clone(), &ar);

    match api.delete(VALIDATING_WEBHOOK_NAME, &Default::default()).await {
        Ok(_) => {
            info!("removed validating webhook configuration");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Clears finalizers on the CR itself and on the virtualization child,
/// polling until both are gone or the deadline expires.
async fn clear_finalizers(
    client: &Client,
    env: &OperatorEnv,
    hc: &HyperConverged,
) -> Result<(), ControllerError> {
    let namespace = hc.metadata.namespace.as_deref().unwrap_or(&env.namespace);

    let hco_api: Api<HyperConverged> = Api::namespaced(client.clone(), namespace);
    let kv_ar = ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk("kubevirt.io", "v1", "KubeVirt"),
        "kubevirts",
    );
    let kv_api: Api<DynamicObject> = Api::namespaced_with(client.clone(), namespace, &kv_ar);

    let deadline = Instant::now() + FINALIZER_DEADLINE;
    loop {
        let mut pending = false;

        pending |= strip_finalizers(&hco_api, &hc.name_any()).await?;
        pending |= strip_finalizers(&kv_api, KUBEVIRT_NAME).await?;

        if !pending {
            return Ok(());
        }
        if Instant::now() >= deadline {
            warn!("finalizer clearing did not converge before the deadline");
            return Err(ControllerError::UninstallBlocked(
                "finalizers still present after the cleanup deadline".to_string(),
            ));
        }
        sleep(FINALIZER_POLL).await;
    }
}

/// Strips finalizers from one object. Returns true while the object still
/// exists with finalizers, i.e. while another poll round is needed.
async fn strip_finalizers<K>(api: &Api<K>, name: &str) -> Result<bool, ControllerError>
where
    K: kube::Resource + Clone + serde::de::DeserializeOwned + std::fmt::Debug,
{
    let object = match api.get(name).await {
        Ok(object) => object,
        Err(kube::Error::Api(ae)) if ae.code == 404 => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    if object.meta().finalizers.as_ref().is_none_or(Vec::is_empty) {
        return Ok(false);
    }

    debug!(name, "clearing finalizers");
    let patch = json!({"metadata": {"finalizers": null}});
    match api
        .patch_metadata(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
    {
        Ok(_) => Ok(true),
        // Conflicts and racing deletes both mean: look again next round.
        Err(kube::Error::Api(ae)) if ae.code == 409 || ae.code == 404 => Ok(true),
        Err(e) => Err(e.into()),
    }
}

async fn remove_legacy_api_services(client: &Client) -> Result<(), ControllerError> {
    let ar = ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk("apiregistration.k8s.io", "v1", "APIService"),
        "apiservices",
    );
    let api: Api<DynamicObject> = Api::all_with(client.clone(), &ar);

    for name in LEGACY_API_SERVICES {
        match api.delete(name, &Default::default()).await {
            Ok(_) => info!(name, "removed legacy aggregated API service"),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
