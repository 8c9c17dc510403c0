//! Reusable catalog, unit and observation fixtures.
//!
//! Unit type ids in [`fixture_catalog`] follow the engine's real ids so
//! that fixtures read naturally next to logs from a live engine.

use sc2feat_core::{
    Alliance, CatalogEntry, DisplayType, GameCatalog, GameResult, ImageData, MinimapRenders,
    Observation, Passenger, PlayerId, PlayerResult, Race, RawAction, ReplayInfo, ReplayPlayerInfo,
    Resolution, Tag, Unit, UnitTypeId, UpgradeId,
};
use smallvec::SmallVec;

pub const ABILITY_TRAIN_MARINE: u32 = 560;
pub const ABILITY_TRAIN_ZEALOT: u32 = 916;
pub const ABILITY_MOVE: u32 = 16;

/// A small catalog with alias variants for every race.
///
/// Terran: `SupplyDepot`, `SupplyDepotLowered`, `Barracks`,
/// `BarracksFlying`, `Marine`, `SiegeTank`, `SiegeTankSieged`.
/// Zerg: `Zergling`, `Roach`, `RoachBurrowed`.
/// Protoss: `Pylon`, `Zealot`, `Stalker`, `WarpPrism`, `WarpPrismPhasing`.
pub fn fixture_catalog() -> GameCatalog {
    fn units(entries: &[(u32, &str)]) -> Vec<CatalogEntry<UnitTypeId>> {
        entries
            .iter()
            .map(|&(id, name)| CatalogEntry::new(UnitTypeId(id), name))
            .collect()
    }
    GameCatalog {
        terran: units(&[
            (19, "SupplyDepot"),
            (47, "SupplyDepotLowered"),
            (21, "Barracks"),
            (46, "BarracksFlying"),
            (48, "Marine"),
            (33, "SiegeTank"),
            (32, "SiegeTankSieged"),
        ]),
        zerg: units(&[(105, "Zergling"), (110, "Roach"), (118, "RoachBurrowed")]),
        protoss: units(&[
            (60, "Pylon"),
            (73, "Zealot"),
            (74, "Stalker"),
            (81, "WarpPrism"),
            (136, "WarpPrismPhasing"),
        ]),
        upgrades: vec![
            CatalogEntry::new(UpgradeId(15), "Stimpack"),
            CatalogEntry::new(UpgradeId(16), "ShieldWall"),
            CatalogEntry::new(UpgradeId(86), "Charge"),
        ],
    }
}

/// Two-player replay metadata.
pub fn replay_info(players: &[(u32, Race)], duration_loops: u32) -> ReplayInfo {
    ReplayInfo {
        map_name: "Fixture LE".to_string(),
        local_map_path: None,
        game_duration_loops: duration_loops,
        base_build: 75689,
        player_info: players
            .iter()
            .map(|&(id, race)| ReplayPlayerInfo {
                player_id: PlayerId(id),
                race_actual: race,
                result: None,
                apm: 150,
                mmr: 3500,
            })
            .collect(),
    }
}

/// Zero-filled 8-bit minimap layers of the given names.
pub fn blank_minimap(names: &[&str], side: u32) -> MinimapRenders {
    names
        .iter()
        .map(|name| {
            let image = ImageData {
                bits_per_pixel: 8,
                size: Resolution::square(side),
                data: vec![0; (side * side) as usize],
            };
            (name.to_string(), image)
        })
        .collect()
}

/// Builder for [`Unit`] values.
///
/// Defaults to a complete, visible, self-owned unit at full health.
#[derive(Clone, Debug)]
pub struct UnitBuilder {
    unit: Unit,
}

impl UnitBuilder {
    pub fn new(tag: u64, unit_type: u32) -> Self {
        Self {
            unit: Unit {
                tag: Tag(tag),
                unit_type: UnitTypeId(unit_type),
                alliance: Alliance::SelfOwned,
                display_type: DisplayType::Visible,
                build_progress: 1.0,
                health: 100.0,
                health_max: 100.0,
                shield: 0.0,
                shield_max: 0.0,
                passengers: SmallVec::new(),
            },
        }
    }

    pub fn enemy(mut self) -> Self {
        self.unit.alliance = Alliance::Enemy;
        self
    }

    pub fn alliance(mut self, alliance: Alliance) -> Self {
        self.unit.alliance = alliance;
        self
    }

    pub fn display(mut self, display: DisplayType) -> Self {
        self.unit.display_type = display;
        self
    }

    pub fn progress(mut self, progress: f32) -> Self {
        self.unit.build_progress = progress;
        self
    }

    pub fn health(mut self, health: f32, health_max: f32) -> Self {
        self.unit.health = health;
        self.unit.health_max = health_max;
        self
    }

    pub fn shield(mut self, shield: f32, shield_max: f32) -> Self {
        self.unit.shield = shield;
        self.unit.shield_max = shield_max;
        self
    }

    /// Load a full-health passenger.
    pub fn passenger(mut self, tag: u64, unit_type: u32, health_max: f32) -> Self {
        self.unit.passengers.push(Passenger {
            tag: Tag(tag),
            unit_type: UnitTypeId(unit_type),
            health: health_max,
            health_max,
            shield: 0.0,
            shield_max: 0.0,
        });
        self
    }

    pub fn build(self) -> Unit {
        self.unit
    }
}

/// Builder for [`Observation`] values.
#[derive(Clone, Debug, Default)]
pub struct ObservationBuilder {
    obs: Observation,
}

impl ObservationBuilder {
    pub fn new(game_loop: u32) -> Self {
        Self {
            obs: Observation {
                game_loop,
                ..Observation::default()
            },
        }
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.obs.raw.units.push(unit);
        self
    }

    pub fn dead(mut self, tag: u64) -> Self {
        self.obs.raw.dead_units.push(Tag(tag));
        self
    }

    pub fn upgrade(mut self, upgrade: u32) -> Self {
        self.obs.raw.upgrade_ids.push(UpgradeId(upgrade));
        self
    }

    pub fn action(mut self, action: RawAction) -> Self {
        self.obs.actions.push(action);
        self
    }

    pub fn minerals(mut self, minerals: u32) -> Self {
        self.obs.player_common.minerals = minerals;
        self
    }

    pub fn minimap(mut self, minimap: MinimapRenders) -> Self {
        self.obs.minimap = minimap;
        self
    }

    /// Mark the observation terminal.
    pub fn result(mut self, player: u32, result: GameResult) -> Self {
        self.obs.player_result.push(PlayerResult {
            player_id: PlayerId(player),
            result,
        });
        self
    }

    pub fn build(self) -> Observation {
        self.obs
    }
}
