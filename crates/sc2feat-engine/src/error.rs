//! Errors raised while processing one work item.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use sc2feat_core::{EngineError, PlayerId};
use sc2feat_obs::ExtractError;
use sc2feat_store::StoreError;

/// Why a work item could not be turned into artifacts.
#[derive(Debug)]
pub enum WorkerError {
    /// The replay file does not exist. Stops the worker.
    MissingReplay {
        /// The missing file.
        path: PathBuf,
    },
    /// The engine failed.
    Engine(EngineError),
    /// A step's observation could not be converted.
    Extract(ExtractError),
    /// Artifacts could not be written.
    Store(StoreError),
    /// The observed player does not appear in the replay metadata.
    UnknownPlayer {
        /// The requested player.
        player: PlayerId,
    },
    /// A step did not advance the game loop and no result was reported.
    Stalled {
        /// Game loop the engine is stuck at.
        game_loop: u32,
    },
    /// Shutdown was requested mid-replay.
    Interrupted,
}

impl WorkerError {
    /// Map an engine error from reading the replay at `path`.
    pub(crate) fn reading(path: &std::path::Path, e: EngineError) -> Self {
        match e {
            EngineError::Io(io) if io.kind() == io::ErrorKind::NotFound => Self::MissingReplay {
                path: path.to_path_buf(),
            },
            other => Self::Engine(other),
        }
    }

    /// Whether the worker should stop taking work.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingReplay { .. } | Self::Interrupted)
    }

    /// Whether the controller can no longer be trusted and must be
    /// relaunched before the next item.
    pub fn needs_restart(&self) -> bool {
        matches!(
            self,
            Self::Engine(
                EngineError::ConnectionLost
                    | EngineError::Launch { .. }
                    | EngineError::Protocol { .. }
            ) | Self::Stalled { .. }
        )
    }
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingReplay { path } => {
                write!(f, "replay file {} does not exist", path.display())
            }
            Self::Engine(e) => write!(f, "engine: {e}"),
            Self::Extract(e) => write!(f, "extraction: {e}"),
            Self::Store(e) => write!(f, "storage: {e}"),
            Self::UnknownPlayer { player } => {
                write!(f, "player {player} not found in replay metadata")
            }
            Self::Stalled { game_loop } => {
                write!(f, "engine stalled at game loop {game_loop} without a result")
            }
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

impl Error for WorkerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(e) => Some(e),
            Self::Extract(e) => Some(e),
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EngineError> for WorkerError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

impl From<ExtractError> for WorkerError {
    fn from(e: ExtractError) -> Self {
        Self::Extract(e)
    }
}

impl From<StoreError> for WorkerError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn not_found_becomes_missing_replay() {
        let e = EngineError::Io(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let w = WorkerError::reading(Path::new("/r/a.SC2Replay"), e);
        assert!(matches!(w, WorkerError::MissingReplay { .. }));
        assert!(w.is_fatal());
    }

    #[test]
    fn other_io_is_not_fatal() {
        let e = EngineError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "no"));
        let w = WorkerError::reading(Path::new("/r/a.SC2Replay"), e);
        assert!(matches!(w, WorkerError::Engine(_)));
        assert!(!w.is_fatal());
        assert!(!w.needs_restart());
    }

    #[test]
    fn lost_connection_needs_restart() {
        assert!(WorkerError::Engine(EngineError::ConnectionLost).needs_restart());
        assert!(WorkerError::Stalled { game_loop: 10 }.needs_restart());
        assert!(!WorkerError::UnknownPlayer { player: PlayerId(3) }.needs_restart());
    }
}
