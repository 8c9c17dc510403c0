//! Canonical unit and upgrade indices.
//!
//! The engine enumerates many unit types that are really one unit in a
//! different state: a sieged tank, a lowered supply depot, a burrowed
//! roach, a flying barracks. The global feature vector counts units by
//! *base* type, so those variants are folded onto their base through an
//! [`AliasTable`] and only base types receive a dense slot in the
//! [`RaceUnitIndex`].
//!
//! Folding is driven by an ordered list of [`AliasRule`]s: exact
//! overrides first (for variants whose names do not follow a pattern),
//! then suffix rules. New engine variants are added as rules, not code.

use std::collections::HashMap;

use indexmap::IndexMap;
use sc2feat_core::{CatalogEntry, GameCatalog, Race, UnitTypeId, UpgradeId};
use tracing::debug;

/// One alias rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AliasRule {
    /// `variant` is a state of `base`.
    Exact {
        /// Variant unit name.
        variant: String,
        /// Base unit name.
        base: String,
    },
    /// Names ending in `suffix` are states of the name without it.
    Suffix(String),
}

impl AliasRule {
    /// Convenience constructor for [`AliasRule::Exact`].
    pub fn exact(variant: &str, base: &str) -> Self {
        Self::Exact {
            variant: variant.to_string(),
            base: base.to_string(),
        }
    }

    /// Base name for `name` under this rule, if the rule applies.
    pub fn base_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        match self {
            Self::Exact { variant, base } => (variant == name).then_some(base.as_str()),
            Self::Suffix(suffix) => name.strip_suffix(suffix.as_str()).filter(|b| !b.is_empty()),
        }
    }

    /// The stock rule list: state variants that do not follow the
    /// suffix convention, then the `Burrowed`, `Uprooted` and `Flying`
    /// suffixes.
    pub fn defaults() -> Vec<AliasRule> {
        vec![
            Self::exact("DisruptorPhased", "Disruptor"),
            Self::exact("ObserverSurveillanceMode", "Observer"),
            Self::exact("WarpPrismPhasing", "WarpPrism"),
            Self::exact("GhostAlternate", "Ghost"),
            Self::exact("GhostNova", "Ghost"),
            Self::exact("LiberatorAG", "Liberator"),
            Self::exact("SiegeTankSieged", "SiegeTank"),
            Self::exact("SupplyDepotLowered", "SupplyDepot"),
            Self::exact("ThorHighImpactMode", "Thor"),
            Self::exact("VikingAssault", "VikingFighter"),
            Self::exact("OverseerOversightMode", "Overseer"),
            Self::Suffix("Burrowed".to_string()),
            Self::Suffix("Uprooted".to_string()),
            Self::Suffix("Flying".to_string()),
        ]
    }
}

/// Variant unit type → canonical unit type.
///
/// Never chains: no canonical id is itself a key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: HashMap<UnitTypeId, UnitTypeId>,
}

impl AliasTable {
    /// Canonical form of `unit_type`. Canonical ids resolve to themselves.
    pub fn resolve(&self, unit_type: UnitTypeId) -> UnitTypeId {
        self.aliases.get(&unit_type).copied().unwrap_or(unit_type)
    }

    /// Whether `unit_type` is a variant.
    pub fn is_alias(&self, unit_type: UnitTypeId) -> bool {
        self.aliases.contains_key(&unit_type)
    }

    /// Number of variants.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Whether there are no variants.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Canonical unit type → dense index, in catalog order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RaceUnitIndex {
    units: IndexMap<UnitTypeId, String>,
}

impl RaceUnitIndex {
    /// Dense index of a canonical unit type.
    pub fn index_of(&self, unit_type: UnitTypeId) -> Option<usize> {
        self.units.get_index_of(&unit_type)
    }

    /// Number of canonical unit types.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit names in index order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.values().map(String::as_str)
    }

    /// `(unit type, name)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitTypeId, &str)> {
        self.units.iter().map(|(id, name)| (*id, name.as_str()))
    }
}

/// Upgrade → dense index, in catalog order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpgradeIndex {
    upgrades: IndexMap<UpgradeId, String>,
}

impl UpgradeIndex {
    /// Dense index of an upgrade.
    pub fn index_of(&self, upgrade: UpgradeId) -> Option<usize> {
        self.upgrades.get_index_of(&upgrade)
    }

    /// Number of upgrades.
    pub fn len(&self) -> usize {
        self.upgrades.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.upgrades.is_empty()
    }

    /// Upgrade names in index order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.upgrades.values().map(String::as_str)
    }
}

/// A race's unit index together with the aliases that feed it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RaceUnits {
    /// Dense index of canonical types.
    pub index: RaceUnitIndex,
    /// Variant folding.
    pub aliases: AliasTable,
}

impl RaceUnits {
    /// Dense slot for an observed unit type, after alias folding.
    pub fn slot(&self, unit_type: UnitTypeId) -> Option<usize> {
        self.index.index_of(self.aliases.resolve(unit_type))
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether there are no slots.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Builds canonical indices from a [`GameCatalog`].
///
/// # Examples
///
/// ```
/// use sc2feat_core::{CatalogEntry, GameCatalog, Race, UnitTypeId};
/// use sc2feat_obs::Canonicalizer;
///
/// let catalog = GameCatalog {
///     terran: vec![
///         CatalogEntry::new(UnitTypeId(33), "SiegeTank"),
///         CatalogEntry::new(UnitTypeId(32), "SiegeTankSieged"),
///         CatalogEntry::new(UnitTypeId(48), "Marine"),
///     ],
///     ..GameCatalog::default()
/// };
/// let (index, aliases) = Canonicalizer::default().build(&catalog, Race::Terran);
/// assert_eq!(index.len(), 2);
/// assert_eq!(aliases.resolve(UnitTypeId(32)), UnitTypeId(33));
/// assert_eq!(index.index_of(UnitTypeId(48)), Some(1));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canonicalizer {
    rules: Vec<AliasRule>,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(AliasRule::defaults())
    }
}

impl Canonicalizer {
    /// Canonicalizer applying `rules` in order; the first rule that
    /// matches a name decides its base.
    pub fn new(rules: Vec<AliasRule>) -> Self {
        Self { rules }
    }

    /// The rule list.
    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }

    /// Build the unit index and alias table for `race`.
    ///
    /// Entries are visited in catalog order. A variant whose base is
    /// missing from the catalog keeps its own slot.
    pub fn build(&self, catalog: &GameCatalog, race: Race) -> (RaceUnitIndex, AliasTable) {
        let entries = catalog.units(race);
        let by_name: HashMap<&str, UnitTypeId> =
            entries.iter().map(|e| (e.name.as_str(), e.id)).collect();

        let mut index = RaceUnitIndex::default();
        let mut aliases = AliasTable::default();

        for entry in entries {
            match self.base_of(entry, &by_name) {
                Some(base) => {
                    aliases.aliases.insert(entry.id, base);
                }
                None => {
                    index.units.insert(entry.id, entry.name.clone());
                }
            }
        }

        collapse_chains(&mut aliases);
        debug!(
            race = %race,
            units = index.len(),
            aliases = aliases.len(),
            "built canonical unit index"
        );
        (index, aliases)
    }

    /// Build `race`'s [`RaceUnits`].
    pub fn build_race(&self, catalog: &GameCatalog, race: Race) -> RaceUnits {
        let (index, aliases) = self.build(catalog, race);
        RaceUnits { index, aliases }
    }

    /// Build the global upgrade index.
    pub fn build_upgrades(&self, catalog: &GameCatalog) -> UpgradeIndex {
        UpgradeIndex {
            upgrades: catalog
                .upgrades
                .iter()
                .map(|e| (e.id, e.name.clone()))
                .collect(),
        }
    }

    fn base_of(
        &self,
        entry: &CatalogEntry<UnitTypeId>,
        by_name: &HashMap<&str, UnitTypeId>,
    ) -> Option<UnitTypeId> {
        let base_name = self.rules.iter().find_map(|r| r.base_name(&entry.name))?;
        match by_name.get(base_name) {
            Some(&base) if base != entry.id => Some(base),
            _ => {
                debug!(
                    unit = %entry.name,
                    base = base_name,
                    "alias base not in catalog, keeping own slot"
                );
                None
            }
        }
    }
}

/// Point every alias straight at its final base.
fn collapse_chains(table: &mut AliasTable) {
    let keys: Vec<UnitTypeId> = table.aliases.keys().copied().collect();
    let limit = table.aliases.len();
    for key in keys {
        let mut target = table.aliases[&key];
        let mut hops = 0;
        while let Some(&next) = table.aliases.get(&target) {
            if hops >= limit || next == key {
                break;
            }
            target = next;
            hops += 1;
        }
        table.aliases.insert(key, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terran() -> GameCatalog {
        let names = [
            (21, "Barracks"),
            (46, "BarracksFlying"),
            (33, "SiegeTank"),
            (32, "SiegeTankSieged"),
            (19, "SupplyDepot"),
            (47, "SupplyDepotLowered"),
            (48, "Marine"),
            (58, "WidowMineBurrowed"),
            (498, "WidowMine"),
        ];
        GameCatalog {
            terran: names
                .iter()
                .map(|&(id, n)| CatalogEntry::new(UnitTypeId(id), n))
                .collect(),
            ..GameCatalog::default()
        }
    }

    #[test]
    fn variants_fold_onto_base() {
        let (index, aliases) = Canonicalizer::default().build(&terran(), Race::Terran);
        assert_eq!(
            index.names().collect::<Vec<_>>(),
            vec!["Barracks", "SiegeTank", "SupplyDepot", "Marine", "WidowMine"]
        );
        assert_eq!(aliases.resolve(UnitTypeId(46)), UnitTypeId(21));
        assert_eq!(aliases.resolve(UnitTypeId(32)), UnitTypeId(33));
        assert_eq!(aliases.resolve(UnitTypeId(47)), UnitTypeId(19));
        // Base declared after its variant.
        assert_eq!(aliases.resolve(UnitTypeId(58)), UnitTypeId(498));
        assert_eq!(aliases.len(), 4);
    }

    #[test]
    fn canonical_ids_resolve_to_themselves() {
        let (index, aliases) = Canonicalizer::default().build(&terran(), Race::Terran);
        for (id, _) in index.iter() {
            assert_eq!(aliases.resolve(id), id);
            assert!(!aliases.is_alias(id));
        }
    }

    #[test]
    fn exact_rules_take_precedence_over_suffixes() {
        let catalog = GameCatalog {
            zerg: vec![
                CatalogEntry::new(UnitTypeId(1), "Overseer"),
                CatalogEntry::new(UnitTypeId(2), "Spire"),
                CatalogEntry::new(UnitTypeId(3), "SpireFlying"),
            ],
            ..GameCatalog::default()
        };
        let rules = vec![
            AliasRule::exact("SpireFlying", "Overseer"),
            AliasRule::Suffix("Flying".into()),
        ];
        let (_, aliases) = Canonicalizer::new(rules).build(&catalog, Race::Zerg);
        assert_eq!(aliases.resolve(UnitTypeId(3)), UnitTypeId(1));
    }

    #[test]
    fn variant_without_base_keeps_slot() {
        let catalog = GameCatalog {
            protoss: vec![CatalogEntry::new(UnitTypeId(7), "ObserverSurveillanceMode")],
            ..GameCatalog::default()
        };
        let (index, aliases) = Canonicalizer::default().build(&catalog, Race::Protoss);
        assert_eq!(index.index_of(UnitTypeId(7)), Some(0));
        assert!(aliases.is_empty());
    }

    #[test]
    fn chains_collapse_to_final_base() {
        let catalog = GameCatalog {
            zerg: vec![
                CatalogEntry::new(UnitTypeId(1), "Thing"),
                CatalogEntry::new(UnitTypeId(2), "ThingFlying"),
                CatalogEntry::new(UnitTypeId(3), "ThingFlyingBurrowed"),
            ],
            ..GameCatalog::default()
        };
        let (index, aliases) = Canonicalizer::default().build(&catalog, Race::Zerg);
        assert_eq!(index.len(), 1);
        assert_eq!(aliases.resolve(UnitTypeId(3)), UnitTypeId(1));
        assert!(!aliases.is_alias(aliases.resolve(UnitTypeId(3))));
    }

    #[test]
    fn suffix_alone_is_not_a_variant() {
        assert_eq!(AliasRule::Suffix("Flying".into()).base_name("Flying"), None);
    }

    #[test]
    fn rebuilding_is_identical() {
        let c = Canonicalizer::default();
        assert_eq!(c.build(&terran(), Race::Terran), c.build(&terran(), Race::Terran));
    }

    #[test]
    fn upgrades_follow_catalog_order() {
        let catalog = GameCatalog {
            upgrades: vec![
                CatalogEntry::new(UpgradeId(9), "Stimpack"),
                CatalogEntry::new(UpgradeId(1), "ShieldWall"),
            ],
            ..GameCatalog::default()
        };
        let upgrades = Canonicalizer::default().build_upgrades(&catalog);
        assert_eq!(upgrades.index_of(UpgradeId(1)), Some(1));
        assert_eq!(upgrades.names().collect::<Vec<_>>(), vec!["Stimpack", "ShieldWall"]);
    }
}
