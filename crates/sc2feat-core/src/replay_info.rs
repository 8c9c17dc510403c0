//! Replay metadata reported by the engine before a session starts.

use serde::{Deserialize, Serialize};

use crate::id::PlayerId;
use crate::observation::GameResult;
use crate::race::Race;

/// Per-player replay metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayPlayerInfo {
    /// Player slot.
    pub player_id: PlayerId,
    /// Race actually played.
    pub race_actual: Race,
    /// Outcome, when the replay records one.
    #[serde(skip)]
    pub result: Option<GameResult>,
    /// Actions per minute.
    pub apm: u32,
    /// Matchmaking rating.
    pub mmr: i32,
}

/// Replay-level metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayInfo {
    /// Map display name.
    pub map_name: String,
    /// Local map file for custom maps; `None` for ladder maps the engine
    /// already knows.
    pub local_map_path: Option<String>,
    /// Game length in engine frames.
    pub game_duration_loops: u32,
    /// Engine build the replay was recorded with.
    pub base_build: u32,
    /// Participants.
    pub player_info: Vec<ReplayPlayerInfo>,
}

impl ReplayInfo {
    /// Race of `player` and of the first other participant.
    ///
    /// Returns `None` if either side is missing from the metadata.
    pub fn matchup(&self, player: PlayerId) -> Option<(Race, Race)> {
        let own = self
            .player_info
            .iter()
            .find(|p| p.player_id == player)?
            .race_actual;
        let enemy = self
            .player_info
            .iter()
            .find(|p| p.player_id != player)?
            .race_actual;
        Some((own, enemy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: u32, race: Race) -> ReplayPlayerInfo {
        ReplayPlayerInfo {
            player_id: PlayerId(id),
            race_actual: race,
            result: None,
            apm: 120,
            mmr: 4000,
        }
    }

    fn info(players: Vec<ReplayPlayerInfo>) -> ReplayInfo {
        ReplayInfo {
            map_name: "Acropolis LE".into(),
            local_map_path: None,
            game_duration_loops: 20_000,
            base_build: 75689,
            player_info: players,
        }
    }

    #[test]
    fn matchup_from_observed_player() {
        let i = info(vec![player(1, Race::Terran), player(2, Race::Protoss)]);
        assert_eq!(i.matchup(PlayerId(2)), Some((Race::Protoss, Race::Terran)));
        assert_eq!(i.matchup(PlayerId(1)), Some((Race::Terran, Race::Protoss)));
    }

    #[test]
    fn matchup_missing_side() {
        let i = info(vec![player(1, Race::Zerg)]);
        assert_eq!(i.matchup(PlayerId(1)), None);
        assert_eq!(i.matchup(PlayerId(3)), None);
    }
}
