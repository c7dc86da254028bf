//! The silence reconcile loop.
//!
//! KubeVirt holds its PodDisruptionBudgets at their limit while it manages
//! eviction itself, so the corresponding alert is pure noise on a healthy
//! cluster. The loop keeps an indefinite silence for it in place: each tick
//! lists the active silences and creates the well-known one if it is
//! missing. Create-if-missing is idempotent, so a tick that races another
//! replica at worst leaves a duplicate that expires with the others.

use std::sync::Arc;
use std::time::Duration;

use alertmanager_client::{AlertmanagerClientTrait, Matcher, PostableSilence};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::ObservabilityError;

/// Alert kept silenced while the operator owns eviction.
pub const SILENCED_ALERT: &str = "PodDisruptionBudgetAtLimit";

/// Identity stamped on the silences this loop creates.
pub const CREATED_BY: &str = "hyperconverged-cluster-operator";

const COMMENT: &str =
    "KubeVirt PodDisruptionBudgets are expected to sit at their limit; silenced by the HyperConverged operator";

/// Tick period of the loop.
pub const TICK_PERIOD: Duration = Duration::from_secs(5);

/// Creates the mandated silence when no active silence covers the alert.
pub async fn ensure_pdb_silence(
    client: &dyn AlertmanagerClientTrait,
) -> Result<(), ObservabilityError> {
    let silences = client.list_silences().await?;

    let covered = silences
        .iter()
        .any(|s| s.is_active() && s.matches("alertname", SILENCED_ALERT));
    if covered {
        debug!(alert = SILENCED_ALERT, "Silence already in place");
        return Ok(());
    }

    let silence = PostableSilence::indefinite(
        vec![Matcher::equal("alertname", SILENCED_ALERT)],
        CREATED_BY,
        COMMENT,
    );
    let created = client.create_silence(silence).await?;
    info!(
        alert = SILENCED_ALERT,
        id = created.silence_id,
        "Created silence"
    );

    Ok(())
}

/// Runs the tick loop until the shutdown signal fires. Transient
/// Alertmanager errors are logged and retried on the next tick.
pub async fn run_loop(
    client: Arc<dyn AlertmanagerClientTrait>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(TICK_PERIOD);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = ensure_pdb_silence(client.as_ref()).await {
                    warn!("Silence reconciliation failed, retrying next tick: {}", e);
                }
            }
            _ = shutdown.changed() => {
                info!("Shutdown requested, stopping silence loop");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alertmanager_client::MockAlertmanagerClient;

    #[tokio::test]
    async fn creates_silence_when_absent() {
        let client = MockAlertmanagerClient::new();
        ensure_pdb_silence(&client).await.unwrap();

        let silences = client.silences();
        assert_eq!(silences.len(), 1);
        assert!(silences[0].matches("alertname", SILENCED_ALERT));
        assert_eq!(silences[0].created_by, CREATED_BY);
    }

    #[tokio::test]
    async fn active_silence_is_not_duplicated() {
        let client = MockAlertmanagerClient::new();
        ensure_pdb_silence(&client).await.unwrap();
        ensure_pdb_silence(&client).await.unwrap();

        assert_eq!(client.silences().len(), 1);
    }

    #[tokio::test]
    async fn listing_failure_surfaces_and_creates_nothing() {
        let client = MockAlertmanagerClient::new();
        client.set_fail_listing(true);

        let err = ensure_pdb_silence(&client).await.unwrap_err();
        assert!(matches!(err, ObservabilityError::Alertmanager(_)));

        client.set_fail_listing(false);
        assert!(client.silences().is_empty());
    }

    #[tokio::test]
    async fn unrelated_silences_do_not_count() {
        let client = MockAlertmanagerClient::new();
        client
            .create_silence(PostableSilence::indefinite(
                vec![Matcher::equal("alertname", "SomeOtherAlert")],
                "someone-else",
                "unrelated",
            ))
            .await
            .unwrap();

        ensure_pdb_silence(&client).await.unwrap();
        assert_eq!(client.silences().len(), 2);
    }

    #[tokio::test]
    async fn loop_stops_on_shutdown() {
        let client = Arc::new(MockAlertmanagerClient::new());
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(run_loop(client.clone(), rx));
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop did not stop on shutdown")
            .unwrap();

        // The first tick fires immediately, so the silence exists already.
        assert_eq!(client.silences().len(), 1);
    }
}
