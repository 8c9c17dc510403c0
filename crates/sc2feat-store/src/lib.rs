//! Artifact persistence for sc2feat.
//!
//! Everything that touches the output directory lives here: the CSC
//! [`SparseMatrix`] `.npz` format for global and spatial sequences, the
//! step-indexed [`ActionLog`], the [`OutputLayout`] naming scheme, the
//! [`CompletenessCheck`] that decides whether a replay-player is done,
//! the companion CSV tables, and the [`ReplayLibrary`] that work is
//! planned from.
//!
//! Artifact files are always written to a temporary sibling and renamed
//! into place.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod atomic;
pub mod actions;
pub mod completeness;
pub mod error;
pub mod layout;
pub mod library;
pub mod schema;
pub mod sparse;

pub use actions::ActionLog;
pub use completeness::{Completeness, CompletenessCheck};
pub use error::StoreError;
pub use layout::{ArtifactKind, ArtifactPaths, OutputLayout};
pub use library::{LibraryPlayer, LibraryReplay, ReplayLibrary};
pub use schema::{write_feature_table, write_replay_table, write_scale_table, ReplayRow};
pub use sparse::SparseMatrix;
