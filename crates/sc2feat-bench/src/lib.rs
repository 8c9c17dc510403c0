//! Benchmark profiles for the sc2feat extraction pipeline.
//!
//! - [`mid_game_observation`]: a busy observation with a few hundred
//!   units on both sides
//! - [`dense_minimap`]: every default layer filled with a varying pattern

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use sc2feat_core::{MinimapRenders, Observation};
use sc2feat_obs::MinimapFeature;
use sc2feat_test_utils::{blank_minimap, ObservationBuilder, UnitBuilder};

/// Unit type ids from the fixture catalog, per side.
const OWN_TYPES: [u32; 5] = [19, 21, 48, 33, 32];
const ENEMY_TYPES: [u32; 3] = [105, 110, 118];

/// Names of the default minimap layers.
pub fn default_layer_names() -> Vec<&'static str> {
    MinimapFeature::DEFAULT_SELECTION
        .iter()
        .map(|f| f.name())
        .collect()
}

/// Default layers at `side`×`side`, with pixel values cycling so that
/// roughly half of every layer is non-zero.
pub fn dense_minimap(side: u32) -> MinimapRenders {
    let mut minimap = blank_minimap(&default_layer_names(), side);
    for (layer, image) in minimap.values_mut().enumerate() {
        for (i, px) in image.data.iter_mut().enumerate() {
            *px = if (i + layer) % 2 == 0 { ((i % 7) + 1) as u8 } else { 0 };
        }
    }
    minimap
}

/// An observation at `game_loop` with `units_per_side` own and enemy
/// units, some of them damaged or under construction.
pub fn mid_game_observation(game_loop: u32, units_per_side: u64, side: u32) -> Observation {
    let mut obs = ObservationBuilder::new(game_loop)
        .minerals(1250)
        .minimap(dense_minimap(side));
    for i in 0..units_per_side {
        let own = OWN_TYPES[i as usize % OWN_TYPES.len()];
        let mut unit = UnitBuilder::new(i + 1, own);
        if i % 9 == 0 {
            unit = unit.progress(0.5);
        }
        if i % 4 == 0 {
            unit = unit.health(40.0, 100.0);
        }
        obs = obs.unit(unit.build());

        let enemy = ENEMY_TYPES[i as usize % ENEMY_TYPES.len()];
        obs = obs.unit(UnitBuilder::new(10_000 + i, enemy).enemy().build());
    }
    obs.build()
}
