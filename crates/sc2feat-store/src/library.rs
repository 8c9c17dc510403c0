//! Replay library and work planning.
//!
//! Replay discovery writes one JSON file per matchup,
//! `{RaceA}_vs_{RaceB}.json` with the races sorted, listing every replay
//! of that matchup. Planning turns a library into work items for one
//! player race, skipping replay-players whose artifacts are already
//! complete so that an interrupted run can be resumed.

use std::fs;
use std::path::{Path, PathBuf};

use sc2feat_core::{replay_id, PlayerId, Race, ReplayWorkItem};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::completeness::{Completeness, CompletenessCheck};
use crate::error::StoreError;
use crate::layout::OutputLayout;
use crate::schema::ReplayRow;

/// One participant of a library replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LibraryPlayer {
    /// Player slot.
    pub id: PlayerId,
    /// Race played.
    pub race: Race,
    /// 1 for a win, 0 for a loss.
    pub result: i32,
    /// Actions per minute.
    pub apm: f32,
    /// Matchmaking rating.
    pub mmr: i32,
}

/// One library replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LibraryReplay {
    /// Replay file.
    pub path: PathBuf,
    /// Map display name.
    pub map: String,
    /// Game length in seconds.
    pub duration_seconds: f32,
    /// Game length in engine frames.
    pub duration_frames: u32,
    /// Participants.
    pub players: Vec<LibraryPlayer>,
}

impl LibraryReplay {
    /// Replay id used in artifact names.
    pub fn replay_id(&self) -> String {
        replay_id(&self.path)
    }
}

/// All library replays of one matchup.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplayLibrary {
    /// Replays, in library order.
    pub replays: Vec<LibraryReplay>,
}

impl ReplayLibrary {
    /// Library file name for a matchup.
    pub fn file_name(a: Race, b: Race) -> String {
        format!("{}.json", Race::matchup_key(a, b))
    }

    /// Load the library for a matchup from `dir`.
    pub fn load(dir: &Path, a: Race, b: Race) -> Result<Self, StoreError> {
        let path = dir.join(Self::file_name(a, b));
        let bytes = fs::read(&path).map_err(|e| StoreError::io(&path, e))?;
        let library: Self = serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), replays = library.replays.len(), "loaded replay library");
        Ok(library)
    }

    /// Keep only replays played on one of `maps`. An empty list keeps
    /// everything.
    pub fn filter_maps(mut self, maps: &[String]) -> Self {
        if !maps.is_empty() {
            self.replays.retain(|r| maps.iter().any(|m| m == &r.map));
        }
        self
    }

    /// `(replay, player)` pairs where the player played `race`.
    pub fn players_of(&self, race: Race) -> impl Iterator<Item = (&LibraryReplay, &LibraryPlayer)> {
        self.replays.iter().flat_map(move |replay| {
            replay
                .players
                .iter()
                .filter(move |p| p.race == race)
                .map(move |p| (replay, p))
        })
    }

    /// Work items for every `race` player whose artifacts under `layout`
    /// are not yet complete.
    ///
    /// Artifacts that cannot be read count as incomplete.
    pub fn plan_work(
        &self,
        race: Race,
        layout: &OutputLayout,
        check: &CompletenessCheck,
    ) -> Vec<ReplayWorkItem> {
        let mut skipped = 0usize;
        let items: Vec<ReplayWorkItem> = self
            .players_of(race)
            .filter(|(replay, player)| {
                let paths = layout.artifacts(player.id, &replay.replay_id());
                match check.check(&paths, replay.duration_frames) {
                    Ok(Completeness::Complete { .. }) => {
                        skipped += 1;
                        false
                    }
                    Ok(Completeness::WrongWidth { columns, expected }) => {
                        warn!(replay = %replay.path.display(), player = %player.id, columns, expected, "artifacts use another feature schema, rescheduling");
                        true
                    }
                    Ok(status) => {
                        debug!(replay = %replay.path.display(), player = %player.id, ?status, "scheduling");
                        true
                    }
                    Err(e) => {
                        warn!(replay = %replay.path.display(), player = %player.id, error = %e, "unreadable artifacts, rescheduling");
                        true
                    }
                }
            })
            .map(|(replay, player)| ReplayWorkItem::new(&replay.path, player.id))
            .collect();
        info!(scheduled = items.len(), skipped, "planned work");
        items
    }

    /// Rows for `replays.csv`: every `race` player whose artifacts are
    /// complete.
    pub fn valid_replays(
        &self,
        race: Race,
        layout: &OutputLayout,
        check: &CompletenessCheck,
    ) -> Vec<ReplayRow> {
        self.players_of(race)
            .filter_map(|(replay, player)| {
                let replay_id = replay.replay_id();
                let paths = layout.artifacts(player.id, &replay_id);
                match check.check(&paths, replay.duration_frames) {
                    Ok(Completeness::Complete { steps }) => Some(ReplayRow {
                        key: sc2feat_core::artifact_key(player.id, &replay_id),
                        result: player.result,
                        steps,
                    }),
                    Ok(Completeness::WrongWidth { columns, expected }) => {
                        warn!(replay = %replay_id, player = %player.id, columns, expected, "global matrix does not match the feature table, skipped");
                        None
                    }
                    Ok(status) => {
                        debug!(replay = %replay_id, player = %player.id, ?status, "not valid");
                        None
                    }
                    Err(e) => {
                        warn!(replay = %replay_id, player = %player.id, error = %e, "unreadable artifacts");
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"[
        {
            "path": "/replays/aaa.SC2Replay",
            "map": "Acropolis LE",
            "duration_seconds": 900.5,
            "duration_frames": 20160,
            "players": [
                {"id": 1, "race": "Terran", "result": 1, "apm": 180, "mmr": 4100},
                {"id": 2, "race": "Zerg", "result": 0, "apm": 220, "mmr": 4050}
            ]
        },
        {
            "path": "/replays/bbb.SC2Replay",
            "map": "Thunderbird LE",
            "duration_seconds": 600.0,
            "duration_frames": 13440,
            "players": [
                {"id": 1, "race": "Zerg", "result": 0, "apm": 150, "mmr": 3900},
                {"id": 2, "race": "Terran", "result": 1, "apm": 160, "mmr": 3950}
            ]
        }
    ]"#;

    fn library() -> ReplayLibrary {
        serde_json::from_str(LIBRARY).unwrap()
    }

    #[test]
    fn file_name_sorts_races() {
        assert_eq!(ReplayLibrary::file_name(Race::Zerg, Race::Terran), "Terran_vs_Zerg.json");
    }

    #[test]
    fn players_of_race() {
        let lib = library();
        let picked: Vec<_> = lib
            .players_of(Race::Terran)
            .map(|(r, p)| (r.replay_id(), p.id))
            .collect();
        assert_eq!(picked, vec![("aaa".to_string(), PlayerId(1)), ("bbb".to_string(), PlayerId(2))]);
    }

    #[test]
    fn map_filter() {
        let lib = library().filter_maps(&["Thunderbird LE".to_string()]);
        assert_eq!(lib.replays.len(), 1);
        assert_eq!(library().filter_maps(&[]).replays.len(), 2);
    }

    #[test]
    fn load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Terran_vs_Zerg.json"), LIBRARY).unwrap();
        let lib = ReplayLibrary::load(dir.path(), Race::Zerg, Race::Terran).unwrap();
        assert_eq!(lib, library());
    }

    #[test]
    fn missing_library_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReplayLibrary::load(dir.path(), Race::Zerg, Race::Terran).unwrap_err();
        assert!(err.is_not_found());
    }
}
