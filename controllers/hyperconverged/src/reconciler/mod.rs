//! The reconcile engine: drives every operand from the HyperConverged CR,
//! aggregates child conditions and publishes a single status update per
//! pass.

pub mod cleanup;
pub mod conditions;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use kube::api::{Api, DynamicObject, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use kube_runtime::controller::Action;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crds::shared::{
    CONDITION_AVAILABLE, CONDITION_DEGRADED, CONDITION_PROGRESSING, CONDITION_RECONCILE_COMPLETE,
    CONDITION_TAINTED_CONFIGURATION, HyperConvergedStatus, ObjectReference,
};
use crds::status::{Conditions, add_related_object, upsert_version};
use crds::v1beta1::HyperConverged;

use crate::backoff::FibonacciBackoff;
use crate::env::OperatorEnv;
use crate::error::ControllerError;
use crate::handlers::{self, DesiredResource, OperandHandler, golden_images, merge};
use crate::metrics;
use crate::nodeinfo::ClusterInfo;
use crate::request::ReconcileRequest;
use crate::stream;

/// Advisory requeue hint of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequeueHint {
    /// Converged; wait for the next input change.
    Done,
    /// Transient contention; retry shortly.
    RetrySoon,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

impl RequeueHint {
    pub fn to_action(self) -> Action {
        match self {
            RequeueHint::Done => Action::await_change(),
            RequeueHint::RetrySoon => Action::requeue(Duration::from_secs(5)),
            RequeueHint::RetryAfter(delay) => Action::requeue(delay),
        }
    }
}

/// What happened to one child resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnsureOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Reconciles the HyperConverged CR and its operands.
pub struct Reconciler {
    client: Client,
    hco_api: Api<HyperConverged>,
    env: OperatorEnv,
    handlers: Vec<Box<dyn OperandHandler>>,
    /// Requeue delay while operands are still converging. Reset once a
    /// pass makes no changes.
    progress_backoff: Mutex<FibonacciBackoff>,
}

impl Reconciler {
    pub fn new(client: Client, env: OperatorEnv) -> Self {
        let hco_api = Api::namespaced(client.clone(), &env.namespace);
        Reconciler {
            client,
            hco_api,
            env,
            handlers: handlers::handler_chain(),
            progress_backoff: Mutex::new(FibonacciBackoff::new(5, 300)),
        }
    }

    /// One full reconcile pass.
    pub async fn reconcile(&self, hc: Arc<HyperConverged>) -> Result<Action, ControllerError> {
        let name = hc.name_any();

        if hc.metadata.deletion_timestamp.is_some() {
            info!(name, "resource is being deleted, running cleanup");
            metrics::CR_EXISTS.set(0);
            cleanup::run(&self.client, &self.env, &hc).await?;
            return Ok(Action::await_change());
        }

        metrics::CR_EXISTS.set(1);
        self.record_unsafe_modifications(&hc);

        let cluster = ClusterInfo::fetch(&self.client).await?;
        let upgrade_mode = self.detect_upgrade_mode(&hc);
        if upgrade_mode {
            info!(
                name,
                version = self.env.operator_version,
                "operator version changed, entering upgrade mode"
            );
        }

        let req = ReconcileRequest::new((*hc).clone(), self.env.clone(), cluster, upgrade_mode)?;

        let mut acc = Conditions::new();
        let mut related: Vec<ObjectReference> = Vec::new();
        let mut first_error: Option<ControllerError> = None;
        let mut progressing = false;

        for handler in &self.handlers {
            let component = handler.name();
            let result = self.reconcile_operand(&req, handler.as_ref(), &mut acc, &mut related).await;

            match result {
                Ok(operand_progressing) => progressing |= operand_progressing,
                Err(err) => {
                    warn!(name, component, error = %err, "operand reconciliation failed");
                    acc.set_if_unset(crds::shared::Condition {
                        type_: CONDITION_DEGRADED.to_string(),
                        status: "True".to_string(),
                        reason: format!("{component}Error"),
                        message: err.to_string(),
                        ..Default::default()
                    });
                    first_error.get_or_insert(err);
                }
            }
        }

        conditions::fill_positive_defaults(&mut acc);
        self.set_pass_conditions(&req, &mut acc, first_error.as_ref());

        let status = self.build_status(&hc, &req, acc, related, first_error.is_none())?;
        self.hco_api
            .patch_status(
                &name,
                &PatchParams::default(),
                &Patch::Merge(json!({"status": status})),
            )
            .await?;

        match first_error {
            Some(err) if err.is_conflict() => {
                debug!(name, "pass hit an update conflict, retrying soon");
                Ok(RequeueHint::RetrySoon.to_action())
            }
            Some(err) => Err(err),
            None if progressing => {
                let delay = self.next_progress_delay();
                Ok(RequeueHint::RetryAfter(delay).to_action())
            }
            None => {
                self.reset_progress_delay();
                Ok(RequeueHint::Done.to_action())
            }
        }
    }

    /// Ensures every resource of one operand, or removes them when the
    /// operand is gated off. Returns whether the operand is still rolling
    /// out.
    async fn reconcile_operand(
        &self,
        req: &ReconcileRequest,
        handler: &dyn OperandHandler,
        acc: &mut Conditions,
        related: &mut Vec<ObjectReference>,
    ) -> Result<bool, ControllerError> {
        let resources = handler.desired(req)?;

        if !handler.enabled(req) {
            for desired in &resources {
                self.ensure_deleted(desired).await?;
            }
            return Ok(false);
        }

        let mut progressing = false;
        for desired in &resources {
            let (live, outcome) = self.ensure_resource(req, handler, desired).await?;

            add_related_object(
                related,
                ObjectReference {
                    api_version: desired.gvk.api_version(),
                    kind: desired.gvk.kind.clone(),
                    namespace: desired.namespace.clone(),
                    name: desired.name.clone(),
                    resource_version: live
                        .pointer("/metadata/resourceVersion")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                },
            );

            if outcome == EnsureOutcome::Created {
                progressing = true;
            }

            if handler.reports_conditions() {
                let child = conditions::read_child_conditions(&live);
                conditions::translate_child(acc, handler.name(), &child);
            }
        }

        Ok(progressing)
    }

    /// Brings one child to its target shape: create when absent, three-way
    /// merge when present.
    async fn ensure_resource(
        &self,
        req: &ReconcileRequest,
        handler: &dyn OperandHandler,
        desired: &DesiredResource,
    ) -> Result<(Value, EnsureOutcome), ControllerError> {
        let api = self.dynamic_api(desired);

        let live = match api.get(&desired.name).await {
            Ok(live) => Some(live),
            Err(kube::Error::Api(ae)) if ae.code == 404 => None,
            Err(e) => return Err(e.into()),
        };

        let live = match live {
            Some(live) => live,
            None => {
                let object: DynamicObject = serde_json::from_value(desired.object.clone())?;
                match api.create(&PostParams::default(), &object).await {
                    Ok(created) => {
                        info!(
                            component = handler.name(),
                            kind = %desired.gvk.kind,
                            name = %desired.name,
                            "created child resource"
                        );
                        return Ok((serde_json::to_value(&created)?, EnsureOutcome::Created));
                    }
                    // Lost the create race; fall through to the merge path
                    // with an authoritative read.
                    Err(kube::Error::Api(ae)) if ae.code == 409 => api.get(&desired.name).await?,
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let live_value = serde_json::to_value(&live)?;
        let target = merge::project_target(
            &live_value,
            &desired.object,
            &desired.policy,
            handler.user_patch(req),
            req.upgrade_mode,
            handler.name(),
        )?;

        if !merge::differs(&live_value, &target) {
            return Ok((live_value, EnsureOutcome::Unchanged));
        }

        metrics::record_overwritten_modification(handler.name());
        info!(
            component = handler.name(),
            kind = %desired.gvk.kind,
            name = %desired.name,
            "updating child resource to its opinionated shape"
        );

        let object: DynamicObject = serde_json::from_value(target)?;
        match api.replace(&desired.name, &PostParams::default(), &object).await {
            Ok(updated) => Ok((serde_json::to_value(&updated)?, EnsureOutcome::Updated)),
            Err(kube::Error::Api(ae)) if ae.code == 409 => Err(ControllerError::Conflict(format!(
                "{} {}",
                desired.gvk.kind, desired.name
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a gated-off child if it still exists.
    async fn ensure_deleted(&self, desired: &DesiredResource) -> Result<(), ControllerError> {
        let api = self.dynamic_api(desired);

        match api.delete(&desired.name, &Default::default()).await {
            Ok(_) => {
                info!(kind = %desired.gvk.kind, name = %desired.name, "removed gated-off child resource");
                Ok(())
            }
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn dynamic_api(&self, desired: &DesiredResource) -> Api<DynamicObject> {
        let ar = desired.api_resource();
        match &desired.namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        }
    }

    /// Next requeue delay while children are still converging. Grows along
    /// the Fibonacci sequence across consecutive progressing passes.
    fn next_progress_delay(&self) -> Duration {
        match self.progress_backoff.lock() {
            Ok(mut backoff) => backoff.next_backoff(),
            Err(e) => {
                warn!("Failed to lock progress backoff: {}, using default", e);
                Duration::from_secs(60)
            }
        }
    }

    fn reset_progress_delay(&self) {
        if let Ok(mut backoff) = self.progress_backoff.lock() {
            backoff.reset();
        }
    }

    /// Upgrade mode holds until the status reports the running operator
    /// version.
    fn detect_upgrade_mode(&self, hc: &HyperConverged) -> bool {
        let Some(status) = &hc.status else {
            return false;
        };
        match crds::status::get_version(&status.versions, "operator") {
            Some(deployed) => deployed != self.env.operator_version,
            None => false,
        }
    }

    /// Conditions owned by the pass itself rather than by child resources.
    fn set_pass_conditions(
        &self,
        req: &ReconcileRequest,
        acc: &mut Conditions,
        first_error: Option<&ControllerError>,
    ) {
        match first_error {
            None => acc.set_parts(
                CONDITION_RECONCILE_COMPLETE,
                "True",
                "ReconcileCompleted",
                "Reconcile completed successfully",
            ),
            Some(err) => acc.set_parts(
                CONDITION_RECONCILE_COMPLETE,
                "False",
                "ReconcileFailed",
                &err.to_string(),
            ),
        }

        if req.tainted() {
            acc.set_parts(
                CONDITION_TAINTED_CONFIGURATION,
                "True",
                "UnsupportedFeatureAnnotation",
                "Unsupported feature was activated via an HCO annotation",
            );
        } else {
            acc.set_parts(
                CONDITION_TAINTED_CONFIGURATION,
                "False",
                "Unsupported",
                "No unsupported feature annotations are present",
            );
        }
    }

    /// Builds the full status object written at the end of the pass.
    fn build_status(
        &self,
        hc: &HyperConverged,
        req: &ReconcileRequest,
        acc: Conditions,
        related: Vec<ObjectReference>,
        converged: bool,
    ) -> Result<HyperConvergedStatus, ControllerError> {
        let mut status = hc.status.clone().unwrap_or_default();

        let observed_generation = hc.metadata.generation.unwrap_or_default();
        acc.apply_to(&mut status.conditions, observed_generation, chrono::Utc::now());
        status.observed_generation = Some(observed_generation);
        status.related_objects = related;

        if converged {
            for (component, version) in self.component_versions() {
                upsert_version(&mut status.versions, &component, &version);
            }
        }

        status.data_import_cron_templates = golden_images::effective_templates(req)?;
        status.data_import_schedule = golden_images::import_schedule(req);
        status.system_health_status = system_health(&status.conditions);

        Ok(status)
    }

    fn component_versions(&self) -> Vec<(String, String)> {
        let components = [
            ("kubevirt", &self.env.kubevirt_version),
            ("cdi", &self.env.cdi_version),
            ("networkaddonsoperator", &self.env.network_addons_version),
            ("ssp", &self.env.ssp_version),
        ];
        let mut versions = vec![("operator".to_string(), self.env.operator_version.clone())];
        versions.extend(stream::remap_pairs(
            stream::filter(components, |(_, version)| !version.is_empty()),
            |component, version| (component.to_string(), version.clone()),
        ));
        versions
    }

    fn record_unsafe_modifications(&self, hc: &HyperConverged) {
        let namespace = hc.metadata.namespace.as_deref().unwrap_or_default();
        let annotations = hc.metadata.annotations.clone().unwrap_or_default();
        for key in [
            crds::ANNOTATION_KUBEVIRT_JSONPATCH,
            crds::ANNOTATION_CDI_JSONPATCH,
            crds::ANNOTATION_CNAO_JSONPATCH,
            crds::ANNOTATION_SSP_JSONPATCH,
        ] {
            let present = annotations.contains_key(key);
            metrics::set_unsafe_modification(key, namespace, i64::from(present));
        }
    }
}

/// Aggregated system health derived from the final condition set.
fn system_health(conditions: &[crds::shared::Condition]) -> String {
    let get = |type_: &str| {
        conditions
            .iter()
            .find(|c| c.type_ == type_)
            .map(|c| c.status.as_str())
    };

    if get(CONDITION_DEGRADED) == Some("True") || get(CONDITION_AVAILABLE) == Some("False") {
        "error".to_string()
    } else if get(CONDITION_PROGRESSING) == Some("True") {
        "warning".to_string()
    } else {
        "healthy".to_string()
    }
}

#[cfg(test)]
mod health_tests {
    use super::system_health;
    use crds::shared::Condition;

    fn cond(type_: &str, status: &str) -> Condition {
        Condition {
            type_: type_.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn health_follows_the_worst_condition() {
        assert_eq!(
            system_health(&[cond("Available", "True"), cond("Progressing", "False")]),
            "healthy"
        );
        assert_eq!(
            system_health(&[cond("Available", "True"), cond("Progressing", "True")]),
            "warning"
        );
        assert_eq!(
            system_health(&[cond("Available", "False"), cond("Degraded", "False")]),
            "error"
        );
        assert_eq!(system_health(&[cond("Degraded", "True")]), "error");
    }
}
