//! Mock AlertmanagerClient for unit testing
//!
//! Stores silences in memory so the observability controller can be tested
//! without a running Alertmanager.

use std::sync::{Arc, Mutex};

use crate::alertmanager_trait::AlertmanagerClientTrait;
use crate::error::AlertmanagerError;
use crate::models::{CreatedSilence, PostableSilence, Silence, SilenceState, SilenceStatus};

/// Mock AlertmanagerClient for testing
#[derive(Clone, Default)]
pub struct MockAlertmanagerClient {
    silences: Arc<Mutex<Vec<Silence>>>,
    fail_listing: Arc<Mutex<bool>>,
    next_id: Arc<Mutex<u64>>,
}

impl MockAlertmanagerClient {
    /// Create an empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a silence to the mock store (for test setup)
    pub fn add_silence(&self, silence: Silence) {
        self.silences.lock().unwrap().push(silence);
    }

    /// Make `list_silences` fail (for test setup)
    pub fn set_fail_listing(&self, fail: bool) {
        *self.fail_listing.lock().unwrap() = fail;
    }

    /// Snapshot of the stored silences (for assertions)
    pub fn silences(&self) -> Vec<Silence> {
        self.silences.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AlertmanagerClientTrait for MockAlertmanagerClient {
    async fn list_silences(&self) -> Result<Vec<Silence>, AlertmanagerError> {
        if *self.fail_listing.lock().unwrap() {
            return Err(AlertmanagerError::Api(
                "Failed to list silences: 503 - mock outage".to_string(),
            ));
        }
        Ok(self.silences())
    }

    async fn create_silence(
        &self,
        silence: PostableSilence,
    ) -> Result<CreatedSilence, AlertmanagerError> {
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("mock-silence-{next}")
        };

        self.silences.lock().unwrap().push(Silence {
            id: id.clone(),
            status: SilenceStatus {
                state: SilenceState::Active,
            },
            matchers: silence.matchers,
            starts_at: silence.starts_at,
            ends_at: silence.ends_at,
            created_by: silence.created_by,
            comment: silence.comment,
        });

        Ok(CreatedSilence { silence_id: id })
    }
}
