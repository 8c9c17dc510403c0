use proptest::prelude::*;
use sc2feat_core::{CatalogEntry, GameCatalog, Race, UnitTypeId};
use sc2feat_obs::Canonicalizer;
use sc2feat_test_utils::fixture_catalog;

const SUFFIXES: [&str; 4] = ["", "Burrowed", "Uprooted", "Flying"];

/// A Zerg catalog of `Base{n}{suffix}` names with distinct ids.
fn arb_catalog() -> impl Strategy<Value = GameCatalog> {
    proptest::collection::vec((0u32..12, 0usize..4), 1..40).prop_map(|specs| {
        let mut zerg: Vec<CatalogEntry<UnitTypeId>> = Vec::new();
        for (base, suffix) in specs {
            let name = format!("Base{base}{}", SUFFIXES[suffix]);
            if zerg.iter().all(|e| e.name != name) {
                let id = UnitTypeId(zerg.len() as u32 + 1);
                zerg.push(CatalogEntry::new(id, name));
            }
        }
        GameCatalog {
            zerg,
            ..GameCatalog::default()
        }
    })
}

proptest! {
    #[test]
    fn resolution_is_idempotent(catalog in arb_catalog()) {
        let (index, aliases) = Canonicalizer::default().build(&catalog, Race::Zerg);
        for entry in &catalog.zerg {
            let canonical = aliases.resolve(entry.id);
            prop_assert_eq!(aliases.resolve(canonical), canonical);
            prop_assert!(index.index_of(canonical).is_some());
        }
    }

    #[test]
    fn every_catalog_unit_gets_exactly_one_slot(catalog in arb_catalog()) {
        let (index, aliases) = Canonicalizer::default().build(&catalog, Race::Zerg);
        prop_assert_eq!(index.len() + aliases.len(), catalog.zerg.len());
        let dense: Vec<usize> = index.iter().filter_map(|(id, _)| index.index_of(id)).collect();
        prop_assert_eq!(dense, (0..index.len()).collect::<Vec<_>>());
    }
}

#[test]
fn building_twice_is_identical_for_every_race() {
    let catalog = fixture_catalog();
    let canonicalizer = Canonicalizer::default();
    for race in [Race::Terran, Race::Zerg, Race::Protoss] {
        assert_eq!(canonicalizer.build(&catalog, race), canonicalizer.build(&catalog, race));
    }
}
