//! Units of pipeline work.

use std::path::{Path, PathBuf};

use crate::id::PlayerId;

/// One replay to be extracted from one player's perspective.
///
/// Created by work planning, consumed exactly once by a worker.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReplayWorkItem {
    /// Replay file.
    pub replay_path: PathBuf,
    /// Replay identifier used in artifact names.
    pub replay_id: String,
    /// Observed player.
    pub player_id: PlayerId,
}

impl ReplayWorkItem {
    /// Work item for `replay_path`, deriving the replay id from the file
    /// stem.
    pub fn new(replay_path: impl Into<PathBuf>, player_id: PlayerId) -> Self {
        let replay_path = replay_path.into();
        let replay_id = replay_id(&replay_path);
        Self {
            replay_path,
            replay_id,
            player_id,
        }
    }

    /// Artifact key, `{player}@{replay}`.
    pub fn key(&self) -> String {
        artifact_key(self.player_id, &self.replay_id)
    }
}

/// Replay identifier: the file name without its extension.
pub fn replay_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Artifact key for a replay-player pair, `{player}@{replay}`.
pub fn artifact_key(player: PlayerId, replay_id: &str) -> String {
    format!("{player}@{replay_id}")
}
