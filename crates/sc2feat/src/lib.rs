//! sc2feat: turn StarCraft II replays into fixed-schema training features.
//!
//! This is the top-level facade crate. It re-exports the sub-crates and
//! adds the two end-to-end operations, [`pipeline::parse`] and
//! [`pipeline::finalise`], plus the command line in [`cli`].
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sc2feat::prelude::*;
//!
//! let job = Job {
//!     library_dir: "../replay_library".into(),
//!     output_dir: "../parsed_replays".into(),
//!     player_race: Race::Protoss,
//!     enemy_race: Race::Terran,
//!     maps: Vec::new(),
//!     config: PipelineConfig::default(),
//! };
//! let report = parse(Arc::new(my_engine), &job, |_| {})?;
//! println!("{} replays extracted", report.succeeded());
//! finalise(&catalog, &job)?;
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `sc2feat-core` | IDs, races, observations, the engine traits |
//! | [`obs`] | `sc2feat-obs` | Global, spatial and action feature extraction |
//! | [`store`] | `sc2feat-store` | Replay libraries, artifacts, companion tables |
//! | [`engine`] | `sc2feat-engine` | Work queue, workers and supervisor |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and engine traits (`sc2feat-core`).
///
/// Implement [`types::Engine`] and [`types::Controller`] to plug a game
/// client into the pipeline.
pub use sc2feat_core as types;

/// Feature extraction (`sc2feat-obs`).
pub use sc2feat_obs as obs;

/// Artifact storage and replay libraries (`sc2feat-store`).
///
/// [`store::SparseMatrix`] is the on-disk format of the per-replay
/// feature matrices.
pub use sc2feat_store as store;

/// Parallel extraction (`sc2feat-engine`).
pub use sc2feat_engine as engine;

pub mod cli;
pub mod pipeline;

/// Common imports for driving a run.
pub mod prelude {
    // Core
    pub use sc2feat_core::{Engine, GameCatalog, PlayerId, Race, ReplayWorkItem};

    // Extraction
    pub use sc2feat_obs::{Canonicalizer, MinimapFeature};

    // Storage
    pub use sc2feat_store::{Completeness, OutputLayout, SparseMatrix};

    // Engine
    pub use sc2feat_engine::{PipelineConfig, ShutdownHandle, Supervisor, SupervisorReport};

    // Pipeline
    pub use crate::pipeline::{finalise, load_catalog, parse, plan, Job, PipelineError};
}
