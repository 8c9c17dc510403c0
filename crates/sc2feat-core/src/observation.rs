//! Per-step observation snapshot reported by the engine.
//!
//! Mirrors the subset of the engine's observation response that the
//! extractors read: the score block, the player-common block, the raw
//! unit list with upgrades and destroyed tags, minimap feature layers,
//! the raw actions issued since the previous step, and the terminal
//! player result.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::error::LayerError;
use crate::id::{PlayerId, Tag, UnitTypeId, UpgradeId};
use crate::interface::Resolution;

/// One observation taken at a step boundary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Observation {
    /// Engine frame counter ("game loop").
    pub game_loop: u32,
    /// Cumulative score block.
    pub score: Score,
    /// Economy and supply counters of the observed player.
    pub player_common: PlayerCommon,
    /// Raw unit data.
    pub raw: RawData,
    /// Rendered minimap layers, keyed by layer name.
    pub minimap: MinimapRenders,
    /// Raw actions the observed player issued since the previous step.
    pub actions: Vec<RawAction>,
    /// Non-empty once the game has ended.
    pub player_result: Vec<PlayerResult>,
}

impl Observation {
    /// Whether the engine reported a terminal result.
    pub fn is_terminal(&self) -> bool {
        !self.player_result.is_empty()
    }
}

/// Cumulative score block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Score {
    /// Overall score.
    pub score: i32,
    /// Score breakdown.
    pub details: ScoreDetails,
}

/// Score breakdown.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreDetails {
    /// Accumulated time production buildings spent idle.
    pub idle_production_time: f32,
    /// Accumulated time workers spent idle.
    pub idle_worker_time: f32,
    /// Resource value of all units.
    pub total_value_units: f32,
    /// Resource value of all structures.
    pub total_value_structures: f32,
    /// Resource value of enemy units killed.
    pub killed_value_units: f32,
    /// Resource value of enemy structures killed.
    pub killed_value_structures: f32,
    /// Minerals collected.
    pub collected_minerals: f32,
    /// Vespene collected.
    pub collected_vespene: f32,
    /// Current mineral income rate.
    pub collection_rate_minerals: f32,
    /// Current vespene income rate.
    pub collection_rate_vespene: f32,
    /// Minerals spent.
    pub spent_minerals: f32,
    /// Vespene spent.
    pub spent_vespene: f32,
}

/// Economy and supply counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerCommon {
    /// Banked minerals.
    pub minerals: u32,
    /// Banked vespene.
    pub vespene: u32,
    /// Supply cap.
    pub food_cap: u32,
    /// Supply used.
    pub food_used: u32,
    /// Supply used by army units.
    pub food_army: u32,
    /// Supply used by workers.
    pub food_workers: u32,
    /// Idle workers.
    pub idle_worker_count: u32,
    /// Army units.
    pub army_count: u32,
    /// Warp gates.
    pub warp_gate_count: u32,
}

/// Raw unit data of one observation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawData {
    /// All units known to the observed player, including remembered
    /// (snapshot) enemy structures.
    pub units: Vec<Unit>,
    /// Upgrades the observed player owns. May contain duplicates.
    pub upgrade_ids: Vec<UpgradeId>,
    /// Tags of units destroyed during the last step.
    pub dead_units: Vec<Tag>,
}

/// Relationship of a unit to the observed player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Alliance {
    /// Owned by the observed player.
    SelfOwned,
    /// Owned by a teammate.
    Ally,
    /// Neutral (minerals, rocks, critters).
    Neutral,
    /// Owned by an opponent.
    Enemy,
}

/// How a unit is currently shown to the observed player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayType {
    /// In vision right now.
    Visible,
    /// Remembered from an earlier sighting, currently under fog.
    Snapshot,
    /// Not visible.
    Hidden,
    /// Building placement preview.
    Placeholder,
}

/// A unit carried inside another unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Passenger {
    /// Instance tag.
    pub tag: Tag,
    /// Engine unit type.
    pub unit_type: UnitTypeId,
    /// Current hit points.
    pub health: f32,
    /// Maximum hit points.
    pub health_max: f32,
    /// Current shields.
    pub shield: f32,
    /// Maximum shields.
    pub shield_max: f32,
}

/// One unit in the raw unit list.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    /// Instance tag.
    pub tag: Tag,
    /// Engine unit type.
    pub unit_type: UnitTypeId,
    /// Owner relationship.
    pub alliance: Alliance,
    /// Visibility state.
    pub display_type: DisplayType,
    /// Construction progress in `[0, 1]`; `1.0` once complete.
    pub build_progress: f32,
    /// Current hit points.
    pub health: f32,
    /// Maximum hit points.
    pub health_max: f32,
    /// Current shields.
    pub shield: f32,
    /// Maximum shields.
    pub shield_max: f32,
    /// Units loaded inside this one (bunkers, transports, nydus).
    pub passengers: SmallVec<[Passenger; 4]>,
}

impl Unit {
    /// Whether construction has finished.
    pub fn is_complete(&self) -> bool {
        self.build_progress >= 1.0
    }
}

/// A packed single-channel image as rendered by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    /// Bits per pixel: 1, 8, 16 or 32.
    pub bits_per_pixel: u32,
    /// Image size.
    pub size: Resolution,
    /// Packed pixel bytes, row-major.
    pub data: Vec<u8>,
}

impl ImageData {
    /// Unpack into one value per pixel, row-major, at native scale.
    ///
    /// 1-bit images are read most-significant bit first; 16-bit images
    /// are unsigned and 32-bit images signed, both little-endian.
    pub fn unpack(&self) -> Result<Vec<f32>, LayerError> {
        let pixels = self.size.area();
        let values: Vec<f32> = match self.bits_per_pixel {
            1 => self
                .data
                .iter()
                .flat_map(|&byte| (0..8u32).rev().map(move |bit| ((byte >> bit) & 1) as f32))
                .take(pixels)
                .collect(),
            8 => self.data.iter().take(pixels).map(|&b| b as f32).collect(),
            16 => self
                .data
                .chunks_exact(2)
                .take(pixels)
                .map(|c| u16::from_le_bytes([c[0], c[1]]) as f32)
                .collect(),
            32 => self
                .data
                .chunks_exact(4)
                .take(pixels)
                .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32)
                .collect(),
            bits => return Err(LayerError::UnsupportedBitsPerPixel { bits }),
        };
        if values.len() < pixels {
            return Err(LayerError::Truncated {
                expected: pixels,
                actual: values.len(),
            });
        }
        Ok(values)
    }
}

/// Minimap layers keyed by layer name, in the order the engine sent them.
pub type MinimapRenders = IndexMap<String, ImageData>;

/// Target of a raw unit command.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandTarget {
    /// No target (train, research, stop).
    None,
    /// A world position.
    Point {
        /// World x.
        x: f32,
        /// World y.
        y: f32,
    },
    /// Another unit.
    Unit(Tag),
}

/// A low-level action as recorded in the replay.
#[derive(Clone, Debug, PartialEq)]
pub enum RawAction {
    /// A command issued to a set of units.
    UnitCommand {
        /// Engine ability id of the command.
        ability: u32,
        /// Command target.
        target: CommandTarget,
        /// Units the command was issued to.
        unit_tags: Vec<Tag>,
        /// Whether the command was shift-queued.
        queue_command: bool,
    },
    /// Camera moved to a world position.
    CameraMove {
        /// World x.
        x: f32,
        /// World y.
        y: f32,
    },
    /// Autocast toggled for an ability.
    ToggleAutocast {
        /// Engine ability id.
        ability: u32,
    },
    /// Selection or control-group change made through the user interface.
    Ui,
    /// Chat message.
    Chat(String),
}

/// Final outcome for one player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameResult {
    /// Won.
    Victory,
    /// Lost.
    Defeat,
    /// Draw.
    Tie,
    /// Ended without a decision.
    Undecided,
}

/// Terminal result for one player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerResult {
    /// Player slot.
    pub player_id: PlayerId,
    /// Outcome.
    pub result: GameResult,
}
