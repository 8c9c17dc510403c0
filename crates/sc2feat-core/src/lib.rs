//! Core types and traits for the sc2feat replay feature pipeline.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace:
//! strongly-typed identifiers, races, the game catalog, the per-step
//! observation model, and the traits through which the simulation
//! engine is driven.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod engine;
pub mod error;
pub mod id;
pub mod interface;
pub mod observation;
pub mod race;
pub mod replay_info;
pub mod work;

pub use catalog::{CatalogEntry, GameCatalog};
pub use engine::{AbilityLookup, Controller, Engine, StartReplay};
pub use error::{EngineError, LayerError};
pub use id::{AbilityId, PlayerId, Tag, UnitTypeId, UpgradeId};
pub use interface::{InterfaceOptions, Resolution, SpatialCameraSetup};
pub use observation::{
    Alliance, CommandTarget, DisplayType, GameResult, ImageData, MinimapRenders, Observation,
    Passenger, PlayerCommon, PlayerResult, RawAction, RawData, Score, ScoreDetails, Unit,
};
pub use race::{ParseRaceError, Race};
pub use replay_info::{ReplayInfo, ReplayPlayerInfo};
pub use work::{artifact_key, replay_id, ReplayWorkItem};
