//! Per-replay accumulation of extracted features.
//!
//! A [`ReplaySession`] lives for exactly one replay-player. It owns a
//! fresh [`GlobalFeatureExtractor`] (whose enemy-kill bookkeeping must
//! not leak between replays), buffers one row per step for each stream,
//! and writes the three artifacts when the replay ends.

use sc2feat_core::{AbilityLookup, GameCatalog, Observation, Race};
use sc2feat_obs::{ActionClassifier, Canonicalizer, GlobalFeatureExtractor, SpatialFeatureExtractor};
use sc2feat_store::{ActionLog, ArtifactPaths, SparseMatrix, StoreError};
use tracing::debug;

use crate::error::WorkerError;

/// What one finished session wrote.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    /// Recorded steps.
    pub steps: usize,
    /// Game loop of the last recorded step.
    pub last_frame: u32,
    /// Non-zero entries in the global matrix.
    pub global_nnz: usize,
    /// Non-zero entries in the spatial matrix.
    pub spatial_nnz: usize,
    /// Production events in the action log.
    pub action_events: usize,
}

/// Feature buffers for one replay-player.
pub struct ReplaySession<'a> {
    global: GlobalFeatureExtractor,
    spatial: &'a SpatialFeatureExtractor,
    classifier: ActionClassifier<'a>,
    global_rows: Vec<Vec<f32>>,
    spatial_rows: Vec<Vec<f32>>,
    actions: ActionLog,
    last_frame: u32,
}

impl<'a> ReplaySession<'a> {
    /// Session observing `player_race` against `enemy_race`.
    pub fn new(
        catalog: &GameCatalog,
        canonicalizer: &Canonicalizer,
        spatial: &'a SpatialFeatureExtractor,
        abilities: &'a dyn AbilityLookup,
        player_race: Race,
        enemy_race: Race,
    ) -> Self {
        Self {
            global: GlobalFeatureExtractor::new(catalog, canonicalizer, player_race, enemy_race),
            spatial,
            classifier: ActionClassifier::new(abilities),
            global_rows: Vec::new(),
            spatial_rows: Vec::new(),
            actions: ActionLog::new(),
            last_frame: 0,
        }
    }

    /// Run all three extractors on one step's observation.
    ///
    /// On error nothing is recorded for the step.
    pub fn record_step(&mut self, obs: &Observation) -> Result<(), WorkerError> {
        let spatial = self.spatial.extract(obs)?;
        let global = self.global.extract(obs);
        let events = self.classifier.extract(&obs.actions);

        self.spatial_rows.push(spatial.iter().copied().collect());
        self.global_rows.push(global);
        self.actions.push(events);
        self.last_frame = obs.game_loop;
        Ok(())
    }

    /// Steps recorded so far.
    pub fn steps(&self) -> usize {
        self.global_rows.len()
    }

    /// Game loop of the last recorded step, if any.
    pub fn last_frame(&self) -> Option<u32> {
        (!self.global_rows.is_empty()).then_some(self.last_frame)
    }

    /// Names of the global vector slots.
    pub fn feature_names(&self) -> &[String] {
        self.global.feature_names()
    }

    /// Write the spatial matrix, action log, and global matrix to
    /// `paths`.
    ///
    /// The global matrix goes last: completeness is judged from it.
    pub fn finish(self, paths: &ArtifactPaths) -> Result<SessionSummary, StoreError> {
        let spatial = SparseMatrix::from_rows(&self.spatial_rows)?;
        spatial.write_npz(&paths.spatial)?;
        drop(self.spatial_rows);

        self.actions.write_json(&paths.actions)?;

        let global = SparseMatrix::from_rows(&self.global_rows)?;
        global.write_npz(&paths.global)?;

        let summary = SessionSummary {
            steps: self.global_rows.len(),
            last_frame: self.last_frame,
            global_nnz: global.nnz(),
            spatial_nnz: spatial.nnz(),
            action_events: self.actions.event_count(),
        };
        debug!(?summary, global = %paths.global.display(), "artifacts written");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc2feat_core::{CommandTarget, GameResult, PlayerId, RawAction, Resolution, Tag};
    use sc2feat_obs::MinimapFeature;
    use sc2feat_store::OutputLayout;
    use sc2feat_test_utils::{
        blank_minimap, fixture_catalog, MockAbilities, ObservationBuilder, UnitBuilder,
        ABILITY_TRAIN_MARINE,
    };

    const LAYERS: [&str; 2] = ["height_map", "creep"];

    fn spatial() -> SpatialFeatureExtractor {
        SpatialFeatureExtractor::new(
            MinimapFeature::parse_list(&LAYERS).unwrap(),
            Resolution::square(4),
            &fixture_catalog(),
        )
        .unwrap()
    }

    fn train_marine() -> RawAction {
        RawAction::UnitCommand {
            ability: ABILITY_TRAIN_MARINE,
            target: CommandTarget::None,
            unit_tags: vec![Tag(1)],
            queue_command: false,
        }
    }

    #[test]
    fn records_and_writes_three_artifacts() {
        let catalog = fixture_catalog();
        let spatial = spatial();
        let abilities = MockAbilities::new();
        let mut session = ReplaySession::new(
            &catalog,
            &Canonicalizer::default(),
            &spatial,
            &abilities,
            Race::Terran,
            Race::Zerg,
        );
        assert_eq!(session.last_frame(), None);

        for (i, game_loop) in [72, 144].into_iter().enumerate() {
            let mut obs = ObservationBuilder::new(game_loop)
                .unit(UnitBuilder::new(1, 48).build())
                .minimap(blank_minimap(&LAYERS, 4));
            if i == 0 {
                obs = obs.action(train_marine());
            } else {
                obs = obs.result(1, GameResult::Victory);
            }
            session.record_step(&obs.build()).unwrap();
        }
        assert_eq!(session.steps(), 2);
        assert_eq!(session.last_frame(), Some(144));

        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path(), Race::Terran, Race::Zerg);
        layout.create_dirs().unwrap();
        let paths = layout.artifacts(PlayerId(1), "r");
        let names = session.feature_names().len();
        let summary = session.finish(&paths).unwrap();

        assert_eq!(summary.steps, 2);
        assert_eq!(summary.action_events, 1);
        let global = SparseMatrix::read_npz(&paths.global).unwrap();
        assert_eq!(global.shape(), (2, names));
        assert_eq!(global.get(1, 0), 144.0);
        let spatial = SparseMatrix::read_npz(&paths.spatial).unwrap();
        assert_eq!(spatial.shape(), (2, 2 * 16));
        let log = ActionLog::read_json(&paths.actions).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.step(0).unwrap()[0].name, "Train_Marine_quick");
    }

    #[test]
    fn failed_step_records_nothing() {
        let catalog = fixture_catalog();
        let spatial = spatial();
        let abilities = MockAbilities::new();
        let mut session = ReplaySession::new(
            &catalog,
            &Canonicalizer::default(),
            &spatial,
            &abilities,
            Race::Terran,
            Race::Zerg,
        );
        let obs = ObservationBuilder::new(72).build();
        assert!(matches!(
            session.record_step(&obs),
            Err(WorkerError::Extract(_))
        ));
        assert_eq!(session.steps(), 0);
    }
}
