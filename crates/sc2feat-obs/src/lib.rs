//! Feature extraction for sc2feat.
//!
//! Turns one engine [`Observation`](sc2feat_core::Observation) per step
//! into the three streams a replay is reduced to:
//!
//! - [`GlobalFeatureExtractor`]: a fixed-length numeric vector (economy,
//!   upgrades, per-unit-type aggregates, enemy kills). Stateful across
//!   steps of one replay.
//! - [`SpatialFeatureExtractor`]: a stack of minimap layers. Stateless.
//! - [`ActionClassifier`]: the production actions issued since the
//!   previous step.
//!
//! The [`Canonicalizer`] builds the stable per-race unit index the
//! global vector is laid out by.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod actions;
pub mod canonical;
pub mod error;
pub mod global;
pub mod spatial;

pub use actions::{is_production, ActionClassifier, ActionEvent, PRODUCTION_CATEGORIES};
pub use canonical::{AliasRule, AliasTable, Canonicalizer, RaceUnitIndex, RaceUnits, UpgradeIndex};
pub use error::ExtractError;
pub use global::{EnemyTagState, GlobalFeatureExtractor, SCALAR_FEATURES};
pub use spatial::{FeatureKind, LayerScale, MinimapFeature, SpatialFeatureExtractor};
