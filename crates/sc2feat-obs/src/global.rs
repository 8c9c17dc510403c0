//! Global feature vector extraction.
//!
//! One [`GlobalFeatureExtractor`] is built per replay-player session and
//! fed every observation of that session in step order. Each call
//! produces a vector laid out as:
//!
//! ```text
//! [23 scalars]
//! [one slot per upgrade]
//! [player: alive, hp, construction, percent]   4 × player units
//! [enemy:  alive, hp, construction, percent]   4 × enemy units
//! [enemy kills this step]                      1 × enemy units
//! ```
//!
//! The layout depends only on the catalog and the race pairing, so
//! [`feature_names`](GlobalFeatureExtractor::feature_names) can be
//! written once per matchup.

use std::collections::{HashMap, HashSet};

use sc2feat_core::{
    Alliance, DisplayType, GameCatalog, Observation, Race, Tag, Unit, UnitTypeId, UpgradeId,
};
use tracing::{debug, warn};

use crate::canonical::{Canonicalizer, RaceUnits, UpgradeIndex};

/// Names of the scalar passthrough fields, in vector order.
pub const SCALAR_FEATURES: [&str; 23] = [
    "frame",
    "score",
    "idle_production_time",
    "idle_worker_time",
    "total_value_units",
    "total_value_structures",
    "killed_value_units",
    "killed_value_structures",
    "collected_minerals",
    "collected_vespene",
    "collection_rate_minerals",
    "collection_rate_vespene",
    "spent_minerals",
    "spent_vespene",
    "minerals",
    "vespene",
    "food_cap",
    "food_used",
    "food_army",
    "food_workers",
    "idle_worker_count",
    "army_count",
    "warp_gate_count",
];

const UNIT_AGGREGATES: [&str; 4] = ["unit", "hp", "construction", "percent"];

// ── Enemy tag bookkeeping ───────────────────────────────────────

/// Enemy instance tags seen so far, per enemy unit slot.
///
/// A tag enters its slot's set the first time the unit is seen and
/// leaves it on the step the engine reports it destroyed, which is when
/// it counts as a kill. A tag that was never seen is never counted.
///
/// A tag lives in one slot at a time: a unit that morphs keeps its tag
/// and moves to the slot of its latest type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnemyTagState {
    tracked: Vec<HashSet<Tag>>,
    slot_of: HashMap<Tag, usize>,
}

impl EnemyTagState {
    /// Empty state for `slots` enemy unit slots.
    pub fn new(slots: usize) -> Self {
        Self {
            tracked: vec![HashSet::new(); slots],
            slot_of: HashMap::new(),
        }
    }

    /// Track `tag` under `slot`, moving it out of any previous slot.
    /// Out-of-range slots are ignored.
    pub fn track(&mut self, slot: usize, tag: Tag) {
        if slot >= self.tracked.len() {
            return;
        }
        if let Some(previous) = self.slot_of.insert(tag, slot) {
            if previous != slot {
                self.tracked[previous].remove(&tag);
            }
        }
        self.tracked[slot].insert(tag);
    }

    /// Remove every tracked tag in `dead` and return the number removed
    /// per slot.
    pub fn record_kills(&mut self, dead: &HashSet<Tag>) -> Vec<f32> {
        let mut kills = vec![0.0; self.tracked.len()];
        for tag in dead {
            if let Some(slot) = self.slot_of.remove(tag) {
                if self.tracked[slot].remove(tag) {
                    kills[slot] += 1.0;
                }
            }
        }
        kills
    }

    /// Number of tags tracked under `slot`.
    pub fn tracked(&self, slot: usize) -> usize {
        self.tracked.get(slot).map_or(0, HashSet::len)
    }
}

// ── Per-slot aggregation ────────────────────────────────────────

/// Count and running sum per unit slot.
struct Aggregate {
    count: Vec<f32>,
    sum: Vec<f32>,
}

impl Aggregate {
    fn new(slots: usize) -> Self {
        Self {
            count: vec![0.0; slots],
            sum: vec![0.0; slots],
        }
    }

    fn add(&mut self, slot: usize, value: f32) {
        self.count[slot] += 1.0;
        self.sum[slot] += value;
    }

    /// Append counts then averages. Slots with no members average to 0.
    fn append_to(self, out: &mut Vec<f32>) {
        out.extend_from_slice(&self.count);
        out.extend(self.count.iter().zip(&self.sum).map(|(&n, &s)| {
            if n > 0.0 {
                s / n
            } else {
                0.0
            }
        }));
    }
}

/// `(health + shield) / (health_max + shield_max)`, clamped to `[0, 1]`.
/// Units with no hit points at all report 0.
fn health_ratio(health: f32, shield: f32, health_max: f32, shield_max: f32) -> f32 {
    let max = health_max + shield_max;
    if max > 0.0 {
        ((health + shield) / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// ── Extractor ───────────────────────────────────────────────────

/// Stateful global feature extractor for one replay-player session.
///
/// # Examples
///
/// ```
/// use sc2feat_core::{CatalogEntry, GameCatalog, Observation, Race, UnitTypeId};
/// use sc2feat_obs::{Canonicalizer, GlobalFeatureExtractor};
///
/// let catalog = GameCatalog {
///     terran: vec![CatalogEntry::new(UnitTypeId(48), "Marine")],
///     zerg: vec![CatalogEntry::new(UnitTypeId(105), "Zergling")],
///     ..GameCatalog::default()
/// };
/// let mut extractor =
///     GlobalFeatureExtractor::new(&catalog, &Canonicalizer::default(), Race::Terran, Race::Zerg);
/// let features = extractor.extract(&Observation::default());
/// assert_eq!(features.len(), extractor.feature_names().len());
/// assert_eq!(features.len(), 23 + 4 + 4 + 1);
/// ```
#[derive(Debug)]
pub struct GlobalFeatureExtractor {
    player: RaceUnits,
    enemy: RaceUnits,
    upgrades: UpgradeIndex,
    enemy_tags: EnemyTagState,
    names: Vec<String>,
    reported_units: HashSet<UnitTypeId>,
    reported_upgrades: HashSet<UpgradeId>,
}

impl GlobalFeatureExtractor {
    /// Build an extractor for `player_race` observed against
    /// `enemy_race`.
    pub fn new(
        catalog: &GameCatalog,
        canonicalizer: &Canonicalizer,
        player_race: Race,
        enemy_race: Race,
    ) -> Self {
        let player = canonicalizer.build_race(catalog, player_race);
        let enemy = canonicalizer.build_race(catalog, enemy_race);
        let upgrades = canonicalizer.build_upgrades(catalog);
        let names = feature_names(&player, &enemy, &upgrades);
        Self {
            enemy_tags: EnemyTagState::new(enemy.len()),
            player,
            enemy,
            upgrades,
            names,
            reported_units: HashSet::new(),
            reported_upgrades: HashSet::new(),
        }
    }

    /// Human-readable name of every vector slot, in vector order.
    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    /// Length of every vector this extractor produces.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: the scalar block is never empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The observed player's unit slots.
    pub fn player_units(&self) -> &RaceUnits {
        &self.player
    }

    /// The opponent's unit slots.
    pub fn enemy_units(&self) -> &RaceUnits {
        &self.enemy
    }

    /// Kill bookkeeping carried between steps.
    pub fn enemy_tags(&self) -> &EnemyTagState {
        &self.enemy_tags
    }

    /// Extract the vector for one step.
    ///
    /// Must be called once per step in step order: enemy kills are
    /// computed against the tags seen on earlier calls.
    pub fn extract(&mut self, obs: &Observation) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.names.len());
        push_scalars(obs, &mut out);
        self.push_upgrades(obs, &mut out);

        let (alive, building) = self.player_aggregates(obs);
        alive.append_to(&mut out);
        building.append_to(&mut out);

        let (alive, building) = self.enemy_aggregates(obs);
        alive.append_to(&mut out);
        building.append_to(&mut out);

        let dead: HashSet<Tag> = obs.raw.dead_units.iter().copied().collect();
        out.extend(self.enemy_tags.record_kills(&dead));

        debug_assert_eq!(out.len(), self.names.len());
        out
    }

    fn push_upgrades(&mut self, obs: &Observation, out: &mut Vec<f32>) {
        let start = out.len();
        out.resize(start + self.upgrades.len(), 0.0);
        for &upgrade in &obs.raw.upgrade_ids {
            match self.upgrades.index_of(upgrade) {
                Some(slot) => out[start + slot] += 1.0,
                None => {
                    if self.reported_upgrades.insert(upgrade) {
                        warn!(upgrade = %upgrade, "unknown upgrade, skipping");
                    } else {
                        debug!(upgrade = %upgrade, "unknown upgrade, skipping");
                    }
                }
            }
        }
    }

    fn player_aggregates(&mut self, obs: &Observation) -> (Aggregate, Aggregate) {
        let mut alive = Aggregate::new(self.player.len());
        let mut building = Aggregate::new(self.player.len());

        for unit in obs.raw.units.iter().filter(|u| u.alliance == Alliance::SelfOwned) {
            let Some(slot) = self.slot(Side::Player, unit.unit_type) else {
                continue;
            };
            if !unit.is_complete() {
                building.add(slot, unit.build_progress);
                continue;
            }
            alive.add(slot, unit_health(unit));
            for passenger in &unit.passengers {
                if let Some(slot) = self.slot(Side::Player, passenger.unit_type) {
                    let hp = health_ratio(
                        passenger.health,
                        passenger.shield,
                        passenger.health_max,
                        passenger.shield_max,
                    );
                    alive.add(slot, hp);
                }
            }
        }
        (alive, building)
    }

    fn enemy_aggregates(&mut self, obs: &Observation) -> (Aggregate, Aggregate) {
        let mut alive = Aggregate::new(self.enemy.len());
        let mut building = Aggregate::new(self.enemy.len());

        let visible_enemies = obs
            .raw
            .units
            .iter()
            .filter(|u| u.alliance == Alliance::Enemy && u.display_type == DisplayType::Visible);
        for unit in visible_enemies {
            let Some(slot) = self.slot(Side::Enemy, unit.unit_type) else {
                continue;
            };
            if unit.is_complete() {
                alive.add(slot, unit_health(unit));
            } else {
                building.add(slot, unit.build_progress);
            }
            self.enemy_tags.track(slot, unit.tag);
        }
        (alive, building)
    }

    fn slot(&mut self, side: Side, unit_type: UnitTypeId) -> Option<usize> {
        let units = match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        };
        let slot = units.slot(unit_type);
        if slot.is_none() {
            if self.reported_units.insert(unit_type) {
                warn!(unit_type = %unit_type, side = side.name(), "unknown unit type, skipping");
            } else {
                debug!(unit_type = %unit_type, side = side.name(), "unknown unit type, skipping");
            }
        }
        slot
    }
}

#[derive(Clone, Copy)]
enum Side {
    Player,
    Enemy,
}

impl Side {
    fn name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
        }
    }
}

fn unit_health(unit: &Unit) -> f32 {
    health_ratio(unit.health, unit.shield, unit.health_max, unit.shield_max)
}

fn push_scalars(obs: &Observation, out: &mut Vec<f32>) {
    let d = &obs.score.details;
    let p = &obs.player_common;
    out.extend_from_slice(&[
        obs.game_loop as f32,
        obs.score.score as f32,
        d.idle_production_time,
        d.idle_worker_time,
        d.total_value_units,
        d.total_value_structures,
        d.killed_value_units,
        d.killed_value_structures,
        d.collected_minerals,
        d.collected_vespene,
        d.collection_rate_minerals,
        d.collection_rate_vespene,
        d.spent_minerals,
        d.spent_vespene,
        p.minerals as f32,
        p.vespene as f32,
        p.food_cap as f32,
        p.food_used as f32,
        p.food_army as f32,
        p.food_workers as f32,
        p.idle_worker_count as f32,
        p.army_count as f32,
        p.warp_gate_count as f32,
    ]);
}

fn feature_names(player: &RaceUnits, enemy: &RaceUnits, upgrades: &UpgradeIndex) -> Vec<String> {
    let mut names: Vec<String> = SCALAR_FEATURES.iter().map(|s| s.to_string()).collect();
    names.extend(upgrades.names().map(str::to_string));
    for (side, units) in [("player", player), ("enemy", enemy)] {
        for aggregate in UNIT_AGGREGATES {
            names.extend(
                units
                    .index
                    .names()
                    .map(|unit| format!("{side}_{aggregate}_{unit}")),
            );
        }
    }
    names.extend(enemy.index.names().map(|unit| format!("enemy_killed_{unit}")));
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use sc2feat_core::{CatalogEntry, Passenger};
    use smallvec::smallvec;

    fn catalog() -> GameCatalog {
        GameCatalog {
            terran: vec![
                CatalogEntry::new(UnitTypeId(24), "Bunker"),
                CatalogEntry::new(UnitTypeId(48), "Marine"),
                CatalogEntry::new(UnitTypeId(19), "SupplyDepot"),
                CatalogEntry::new(UnitTypeId(47), "SupplyDepotLowered"),
            ],
            protoss: vec![
                CatalogEntry::new(UnitTypeId(73), "Zealot"),
                CatalogEntry::new(UnitTypeId(74), "Stalker"),
            ],
            upgrades: vec![
                CatalogEntry::new(UpgradeId(15), "Stimpack"),
                CatalogEntry::new(UpgradeId(16), "ShieldWall"),
            ],
            ..GameCatalog::default()
        }
    }

    fn extractor() -> GlobalFeatureExtractor {
        GlobalFeatureExtractor::new(
            &catalog(),
            &Canonicalizer::default(),
            Race::Terran,
            Race::Protoss,
        )
    }

    fn unit(tag: u64, unit_type: u32, alliance: Alliance, progress: f32) -> Unit {
        Unit {
            tag: Tag(tag),
            unit_type: UnitTypeId(unit_type),
            alliance,
            display_type: DisplayType::Visible,
            build_progress: progress,
            health: 40.0,
            health_max: 80.0,
            shield: 0.0,
            shield_max: 0.0,
            passengers: smallvec![],
        }
    }

    /// Offset of `aggregate` block for the player side.
    fn player_block(e: &GlobalFeatureExtractor, aggregate: usize) -> usize {
        SCALAR_FEATURES.len() + 2 + aggregate * e.player_units().len()
    }

    fn enemy_block(e: &GlobalFeatureExtractor, aggregate: usize) -> usize {
        player_block(e, 4) + aggregate * e.enemy_units().len()
    }

    #[test]
    fn names_follow_layout() {
        let e = extractor();
        let names = e.feature_names();
        assert_eq!(names.len(), 23 + 2 + 4 * 3 + 4 * 2 + 2);
        assert_eq!(names[0], "frame");
        assert_eq!(names[22], "warp_gate_count");
        assert_eq!(names[23], "Stimpack");
        assert_eq!(names[25], "player_unit_Bunker");
        assert_eq!(names[player_block(&e, 1) + 1], "player_hp_Marine");
        assert_eq!(names[enemy_block(&e, 3) + 1], "enemy_percent_Stalker");
        assert_eq!(names.last().map(String::as_str), Some("enemy_killed_Stalker"));
    }

    #[test]
    fn scalars_pass_through() {
        let mut e = extractor();
        let mut obs = Observation::default();
        obs.game_loop = 144;
        obs.score.score = 3000;
        obs.score.details.spent_vespene = 75.0;
        obs.player_common.minerals = 50;
        obs.player_common.warp_gate_count = 2;
        let v = e.extract(&obs);
        assert_eq!(v[0], 144.0);
        assert_eq!(v[1], 3000.0);
        assert_eq!(v[13], 75.0);
        assert_eq!(v[14], 50.0);
        assert_eq!(v[22], 2.0);
    }

    #[test]
    fn duplicate_upgrades_count_twice_and_unknown_is_skipped() {
        let mut e = extractor();
        let mut obs = Observation::default();
        obs.raw.upgrade_ids = vec![UpgradeId(16), UpgradeId(16), UpgradeId(999)];
        let v = e.extract(&obs);
        assert_eq!(&v[23..25], &[0.0, 2.0]);
    }

    #[test]
    fn aliased_units_share_base_slot() {
        let mut e = extractor();
        let mut obs = Observation::default();
        obs.raw.units = vec![
            unit(1, 19, Alliance::SelfOwned, 1.0),
            unit(2, 47, Alliance::SelfOwned, 1.0),
        ];
        let v = e.extract(&obs);
        assert_eq!(v[player_block(&e, 0) + 2], 2.0);
        assert!((v[player_block(&e, 1) + 2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn passengers_count_as_alive() {
        let mut e = extractor();
        let mut bunker = unit(1, 24, Alliance::SelfOwned, 1.0);
        bunker.passengers = smallvec![Passenger {
            tag: Tag(2),
            unit_type: UnitTypeId(48),
            health: 45.0,
            health_max: 45.0,
            shield: 0.0,
            shield_max: 0.0,
        }];
        let mut obs = Observation::default();
        obs.raw.units = vec![bunker];
        let v = e.extract(&obs);
        assert_eq!(v[player_block(&e, 0)], 1.0);
        assert_eq!(v[player_block(&e, 0) + 1], 1.0);
        assert_eq!(v[player_block(&e, 1) + 1], 1.0);
    }

    #[test]
    fn hidden_and_snapshot_enemies_are_ignored() {
        let mut e = extractor();
        let mut snap = unit(9, 73, Alliance::Enemy, 1.0);
        snap.display_type = DisplayType::Snapshot;
        let mut obs = Observation::default();
        obs.raw.units = vec![snap];
        let v = e.extract(&obs);
        assert_eq!(v[enemy_block(&e, 0)], 0.0);
        assert_eq!(e.enemy_tags().tracked(0), 0);
    }

    #[test]
    fn enemy_construction_is_tracked_for_kills() {
        let mut e = extractor();
        let mut obs = Observation::default();
        obs.raw.units = vec![unit(5, 74, Alliance::Enemy, 0.25)];
        let v = e.extract(&obs);
        assert_eq!(v[enemy_block(&e, 2) + 1], 1.0);
        assert_eq!(v[enemy_block(&e, 3) + 1], 0.25);

        let mut obs = Observation::default();
        obs.raw.dead_units = vec![Tag(5)];
        let v = e.extract(&obs);
        assert_eq!(v[v.len() - 1], 1.0);
    }

    #[test]
    fn zero_max_health_reports_zero() {
        assert_eq!(health_ratio(0.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(health_ratio(120.0, 0.0, 100.0, 0.0), 1.0);
    }

    #[test]
    fn kills_counted_once() {
        let mut state = EnemyTagState::new(2);
        state.track(1, Tag(7));
        state.track(1, Tag(8));
        let dead: HashSet<Tag> = [Tag(7), Tag(99)].into_iter().collect();
        assert_eq!(state.record_kills(&dead), vec![0.0, 1.0]);
        assert_eq!(state.record_kills(&dead), vec![0.0, 0.0]);
        assert_eq!(state.tracked(1), 1);
    }

    #[test]
    fn retracked_tag_moves_slot() {
        let mut state = EnemyTagState::new(2);
        state.track(0, Tag(7));
        state.track(1, Tag(7));
        assert_eq!(state.tracked(0), 0);
        assert_eq!(state.tracked(1), 1);
        let dead: HashSet<Tag> = [Tag(7)].into_iter().collect();
        assert_eq!(state.record_kills(&dead), vec![0.0, 1.0]);
    }
}
