//! Alertmanager v2 API Client
//!
//! A small client for the Alertmanager silence API, used by the
//! observability controller to keep mandated silences in place.
//!
//! # Example
//!
//! ```no_run
//! use alertmanager_client::{
//!     AlertmanagerClient, AlertmanagerClientTrait, Matcher, PostableSilence,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AlertmanagerClient::new(
//!     "http://alertmanager-operated:9093".to_string(),
//!     None,
//! )?;
//!
//! let silences = client.list_silences().await?;
//! if !silences.iter().any(|s| s.is_active()) {
//!     client
//!         .create_silence(PostableSilence::indefinite(
//!             vec![Matcher::equal("alertname", "PodDisruptionBudgetAtLimit")],
//!             "hco-operator",
//!             "Silencing PDB alerts for single-replica operands",
//!         ))
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod alertmanager_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use alertmanager_trait::AlertmanagerClientTrait;
pub use client::AlertmanagerClient;
pub use error::AlertmanagerError;
pub use models::*;
#[cfg(feature = "test-util")]
pub use mock::MockAlertmanagerClient;
