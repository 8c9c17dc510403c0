//! On-disk layout of one matchup's output.
//!
//! ```text
//! {output}/{Player}_vs_{Enemy}/
//!     global/{player}@{replay}.glo.npz
//!     spatial/{player}@{replay}.spa.npz
//!     actions/{player}@{replay}.act
//!     features.csv
//!     spa_embedding.csv
//!     replays.csv
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use sc2feat_core::{artifact_key, PlayerId, Race};

use crate::error::StoreError;

/// Which of the three per-replay artifacts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Global feature matrix.
    Global,
    /// Spatial feature matrix.
    Spatial,
    /// Action log.
    Actions,
}

impl ArtifactKind {
    /// All kinds, in write order.
    pub const ALL: [ArtifactKind; 3] = [Self::Global, Self::Spatial, Self::Actions];

    /// Subdirectory name.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Spatial => "spatial",
            Self::Actions => "actions",
        }
    }

    /// File name suffix after the artifact key.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Global => ".glo.npz",
            Self::Spatial => ".spa.npz",
            Self::Actions => ".act",
        }
    }
}

/// Paths of one replay-player's three artifacts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Global feature matrix.
    pub global: PathBuf,
    /// Spatial feature matrix.
    pub spatial: PathBuf,
    /// Action log.
    pub actions: PathBuf,
}

impl ArtifactPaths {
    /// Path of one artifact.
    pub fn get(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Global => &self.global,
            ArtifactKind::Spatial => &self.spatial,
            ArtifactKind::Actions => &self.actions,
        }
    }

    /// First artifact that does not exist, if any.
    pub fn first_missing(&self) -> Option<ArtifactKind> {
        ArtifactKind::ALL
            .into_iter()
            .find(|&k| !self.get(k).is_file())
    }
}

/// Output directory tree for one matchup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Layout under `output` for `player` observed against `enemy`.
    ///
    /// Unlike the replay library, the directory name is not sorted: the
    /// player race always comes first.
    pub fn new(output: &Path, player: Race, enemy: Race) -> Self {
        Self {
            root: output.join(format!("{player}_vs_{enemy}")),
        }
    }

    /// Matchup directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one artifact kind.
    pub fn dir(&self, kind: ArtifactKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Create the matchup directory and the three artifact directories.
    pub fn create_dirs(&self) -> Result<(), StoreError> {
        for kind in ArtifactKind::ALL {
            let dir = self.dir(kind);
            fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        Ok(())
    }

    /// Artifact paths for `player` in `replay_id`.
    pub fn artifacts(&self, player: PlayerId, replay_id: &str) -> ArtifactPaths {
        let key = artifact_key(player, replay_id);
        let path = |kind: ArtifactKind| self.dir(kind).join(format!("{key}{}", kind.suffix()));
        ArtifactPaths {
            global: path(ArtifactKind::Global),
            spatial: path(ArtifactKind::Spatial),
            actions: path(ArtifactKind::Actions),
        }
    }

    /// Feature-name table.
    pub fn features_csv(&self) -> PathBuf {
        self.root.join("features.csv")
    }

    /// Spatial scale table.
    pub fn spatial_scales_csv(&self) -> PathBuf {
        self.root.join("spa_embedding.csv")
    }

    /// Valid replay list.
    pub fn replays_csv(&self) -> PathBuf {
        self.root.join("replays.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names() {
        let layout = OutputLayout::new(Path::new("/out"), Race::Protoss, Race::Terran);
        let paths = layout.artifacts(PlayerId(2), "f00d");
        assert_eq!(paths.global, Path::new("/out/Protoss_vs_Terran/global/2@f00d.glo.npz"));
        assert_eq!(paths.spatial, Path::new("/out/Protoss_vs_Terran/spatial/2@f00d.spa.npz"));
        assert_eq!(paths.actions, Path::new("/out/Protoss_vs_Terran/actions/2@f00d.act"));
        assert_eq!(layout.features_csv(), Path::new("/out/Protoss_vs_Terran/features.csv"));
    }

    #[test]
    fn missing_artifacts_reported_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path(), Race::Zerg, Race::Zerg);
        layout.create_dirs().unwrap();
        let paths = layout.artifacts(PlayerId(1), "r");
        assert_eq!(paths.first_missing(), Some(ArtifactKind::Global));
        fs::write(&paths.global, b"").unwrap();
        fs::write(&paths.spatial, b"").unwrap();
        assert_eq!(paths.first_missing(), Some(ArtifactKind::Actions));
        fs::write(&paths.actions, b"").unwrap();
        assert_eq!(paths.first_missing(), None);
    }
}
