//! Test utilities and mock types for sc2feat development.
//!
//! Provides a scripted [`MockEngine`] implementing the engine traits, a
//! small [`fixture_catalog`] with alias variants for every race, and
//! builders for [`Unit`](sc2feat_core::Unit) and
//! [`Observation`](sc2feat_core::Observation) values.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod engine;
pub mod fixtures;

pub use engine::{MockAbilities, MockController, MockEngine, MockReplay, StartedReplay};
pub use fixtures::{
    blank_minimap, fixture_catalog, replay_info, ObservationBuilder, UnitBuilder, ABILITY_MOVE,
    ABILITY_TRAIN_MARINE, ABILITY_TRAIN_ZEALOT,
};
