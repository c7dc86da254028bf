//! Alertmanager v2 API models (the silence subset)

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A label matcher of a silence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    /// Label name.
    pub name: String,

    /// Label value (or regex when `is_regex`).
    pub value: String,

    /// Whether `value` is a regular expression.
    #[serde(default)]
    pub is_regex: bool,

    /// Whether the matcher is an equality (true) or inequality (false).
    #[serde(default = "default_true")]
    pub is_equal: bool,
}

impl Matcher {
    /// An exact equality matcher.
    pub fn equal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Matcher {
            name: name.into(),
            value: value.into(),
            is_regex: false,
            is_equal: true,
        }
    }
}

/// State of a silence as reported by Alertmanager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SilenceState {
    /// The silence is currently suppressing alerts.
    Active,
    /// The silence is scheduled for the future.
    Pending,
    /// The silence has ended or was expired.
    Expired,
}

/// Status wrapper of a gettable silence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SilenceStatus {
    /// Current state.
    pub state: SilenceState,
}

/// A silence as returned by `GET /api/v2/silences`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Silence {
    /// Server-assigned identifier.
    pub id: String,

    /// Current status.
    pub status: SilenceStatus,

    /// Matchers selecting the suppressed alerts.
    pub matchers: Vec<Matcher>,

    /// Start of the suppression window.
    pub starts_at: DateTime<Utc>,

    /// End of the suppression window.
    pub ends_at: DateTime<Utc>,

    /// Creator identity.
    pub created_by: String,

    /// Free-form comment.
    pub comment: String,
}

impl Silence {
    /// True when the silence is currently suppressing alerts.
    pub fn is_active(&self) -> bool {
        self.status.state == SilenceState::Active
    }

    /// True when the silence has an equality matcher `name == value`.
    pub fn matches(&self, name: &str, value: &str) -> bool {
        self.matchers
            .iter()
            .any(|m| m.is_equal && !m.is_regex && m.name == name && m.value == value)
    }
}

/// A silence to create via `POST /api/v2/silences`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostableSilence {
    /// Matchers selecting the suppressed alerts.
    pub matchers: Vec<Matcher>,

    /// Start of the suppression window.
    pub starts_at: DateTime<Utc>,

    /// End of the suppression window.
    pub ends_at: DateTime<Utc>,

    /// Creator identity.
    pub created_by: String,

    /// Free-form comment.
    pub comment: String,
}

impl PostableSilence {
    /// A silence starting now and lasting far enough into the future to be
    /// effectively indefinite; the owning controller re-creates it anyway.
    pub fn indefinite(
        matchers: Vec<Matcher>,
        created_by: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        PostableSilence {
            matchers,
            starts_at: now,
            ends_at: now + Duration::days(365 * 100),
            created_by: created_by.into(),
            comment: comment.into(),
        }
    }
}

/// Response of `POST /api/v2/silences`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSilence {
    /// Identifier of the created silence.
    #[serde(rename = "silenceID")]
    pub silence_id: String,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_matches_on_equality_matchers_only() {
        let silence = Silence {
            id: "abc".to_string(),
            status: SilenceStatus {
                state: SilenceState::Active,
            },
            matchers: vec![Matcher {
                name: "alertname".to_string(),
                value: "PodDisruptionBudgetAtLimit".to_string(),
                is_regex: true,
                is_equal: true,
            }],
            starts_at: Utc::now(),
            ends_at: Utc::now(),
            created_by: "hco-operator".to_string(),
            comment: String::new(),
        };

        assert!(!silence.matches("alertname", "PodDisruptionBudgetAtLimit"));
    }

    #[test]
    fn silence_state_uses_lowercase_wire_values() {
        let json = serde_json::json!({"state": "active"});
        let status: SilenceStatus = serde_json::from_value(json).unwrap();
        assert_eq!(status.state, SilenceState::Active);
    }
}
