//! Completeness check for a replay-player's artifacts.
//!
//! An extraction run can be cut short by a crash, a lost engine or an
//! interrupt. Artifacts only count as done if all three exist and the
//! last recorded frame (column 0 of the global matrix) is close enough to
//! the replay's true duration.

use crate::error::StoreError;
use crate::layout::{ArtifactKind, ArtifactPaths};
use crate::sparse::SparseMatrix;

/// Outcome of a [`CompletenessCheck`].
#[derive(Clone, Debug, PartialEq)]
pub enum Completeness {
    /// All artifacts exist and cover the replay.
    Complete {
        /// Recorded steps.
        steps: usize,
    },
    /// An artifact does not exist.
    Missing(ArtifactKind),
    /// The global matrix has no rows.
    Empty,
    /// The global matrix was written with a different feature schema.
    WrongWidth {
        /// Columns in the global matrix.
        columns: usize,
        /// Columns of the current schema.
        expected: usize,
    },
    /// The recording stops too far before the end of the replay.
    Truncated {
        /// Recorded steps.
        steps: usize,
        /// Last recorded frame.
        last_frame: f32,
        /// Replay duration in frames.
        duration: u32,
    },
}

impl Completeness {
    /// Whether the artifacts can be used as-is.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

/// Accepts artifacts whose last frame is within `tolerance × step_frames`
/// of the replay duration and, when `global_columns` is set, whose global
/// matrix has exactly that many columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletenessCheck {
    /// Frames per extraction step.
    pub step_frames: u32,
    /// Allowed shortfall, in steps.
    pub tolerance: u32,
    /// Expected global feature count. `None` skips the width check.
    pub global_columns: Option<usize>,
}

impl CompletenessCheck {
    /// The same check, also requiring `columns` global features.
    pub fn with_global_columns(self, columns: usize) -> Self {
        Self {
            global_columns: Some(columns),
            ..self
        }
    }

    /// Maximum accepted gap between last frame and duration, in frames.
    pub fn max_gap(&self) -> f64 {
        f64::from(self.step_frames) * f64::from(self.tolerance)
    }

    /// Check the artifacts at `paths` against a replay of
    /// `duration_frames` frames.
    pub fn check(
        &self,
        paths: &ArtifactPaths,
        duration_frames: u32,
    ) -> Result<Completeness, StoreError> {
        if let Some(kind) = paths.first_missing() {
            return Ok(Completeness::Missing(kind));
        }
        let global = SparseMatrix::read_npz(&paths.global)?;
        let (steps, columns) = global.shape();
        if let Some(expected) = self.global_columns {
            if columns != expected {
                return Ok(Completeness::WrongWidth { columns, expected });
            }
        }
        if steps == 0 {
            return Ok(Completeness::Empty);
        }
        let last_frame = global.get(steps - 1, 0);
        let gap = f64::from(duration_frames) - f64::from(last_frame);
        if gap > self.max_gap() {
            return Ok(Completeness::Truncated {
                steps,
                last_frame,
                duration: duration_frames,
            });
        }
        Ok(Completeness::Complete { steps })
    }
}
