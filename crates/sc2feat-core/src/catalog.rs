//! The engine's static catalog of unit types and upgrades.
//!
//! The catalog is data supplied by the engine collaborator (or loaded
//! from a JSON file by the command-line tool). Entry order matters: the
//! canonicalizer assigns dense indices in catalog order, so two runs over
//! the same catalog always produce the same feature schema.

use serde::{Deserialize, Serialize};

use crate::id::{UnitTypeId, UpgradeId};
use crate::race::Race;

/// One named entry of the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry<I> {
    /// Engine identifier.
    pub id: I,
    /// Engine enumeration name, e.g. `SiegeTankSieged`.
    pub name: String,
}

impl<I> CatalogEntry<I> {
    /// Create an entry.
    pub fn new(id: I, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Unit and upgrade enumerations, in stable engine order.
///
/// # Examples
///
/// ```
/// use sc2feat_core::{CatalogEntry, GameCatalog, Race, UnitTypeId};
///
/// let catalog = GameCatalog {
///     terran: vec![CatalogEntry::new(UnitTypeId(48), "Marine")],
///     ..GameCatalog::default()
/// };
/// assert_eq!(catalog.units(Race::Terran).len(), 1);
/// assert!(catalog.units(Race::Zerg).is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameCatalog {
    /// Terran unit types.
    #[serde(default)]
    pub terran: Vec<CatalogEntry<UnitTypeId>>,
    /// Zerg unit types.
    #[serde(default)]
    pub zerg: Vec<CatalogEntry<UnitTypeId>>,
    /// Protoss unit types.
    #[serde(default)]
    pub protoss: Vec<CatalogEntry<UnitTypeId>>,
    /// All upgrades, regardless of race.
    #[serde(default)]
    pub upgrades: Vec<CatalogEntry<UpgradeId>>,
}

impl GameCatalog {
    /// Unit types defined for `race`. `Random` has none.
    pub fn units(&self, race: Race) -> &[CatalogEntry<UnitTypeId>] {
        match race {
            Race::Terran => &self.terran,
            Race::Zerg => &self.zerg,
            Race::Protoss => &self.protoss,
            Race::Random => &[],
        }
    }

    /// Largest unit type id across all races, if any.
    ///
    /// The `unit_type` minimap layer is categorical over this range.
    pub fn max_unit_id(&self) -> Option<UnitTypeId> {
        self.terran
            .iter()
            .chain(&self.zerg)
            .chain(&self.protoss)
            .map(|e| e.id)
            .max()
    }
}
