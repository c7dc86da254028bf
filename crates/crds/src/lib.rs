//! HyperConverged CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the HyperConverged cluster
//! operator. Two API versions coexist:
//! - `v1beta1`: the storage version, feature gates as named boolean fields
//! - `v1`: the conversion hub, feature gates as an ordered entry list
//!
//! Conversion between the two preserves the logical value of every known
//! feature gate. Shared sub-types (placement, cert rotation, live migration
//! tuning, data-import-cron templates) live in [`shared`].

pub mod conversion;
pub mod defaults;
pub mod registry;
pub mod shared;
pub mod status;
pub mod v1;
pub mod v1beta1;

pub use registry::{FeatureGatePhase, gate_phase, resolve_phase};
pub use shared::*;
pub use status::{Conditions, add_related_object, upsert_version};

/// The fixed name of the singleton HyperConverged resource. Exactly one
/// instance with this name may exist cluster-wide; the admission webhook
/// rejects any other name.
pub const HYPERCONVERGED_NAME: &str = "kubevirt-hyperconverged";

/// API group of the HyperConverged resource.
pub const API_GROUP: &str = "hco.kubevirt.io";
