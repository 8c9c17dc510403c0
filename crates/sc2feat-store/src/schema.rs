//! Companion CSV tables written next to the artifacts.
//!
//! All tables are header-less:
//!
//! - `features.csv`: `index,name` per global feature slot.
//! - `spa_embedding.csv`: `name,category,scale` per spatial layer.
//! - `replays.csv`: `{player}@{replay},result,steps` per valid
//!   replay-player.

use std::path::Path;

use serde::Serialize;
use sc2feat_obs::LayerScale;

use crate::atomic::write_atomic;
use crate::error::StoreError;

/// One row of `replays.csv`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplayRow {
    /// `{player}@{replay}`.
    pub key: String,
    /// Result as recorded in the replay library (1 win, 0 loss).
    pub result: i32,
    /// Recorded steps.
    pub steps: usize,
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<(), StoreError> {
    let csv_err = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };
    write_atomic(path, |file| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for row in rows {
            writer.serialize(row).map_err(csv_err)?;
        }
        writer.flush().map_err(|e| StoreError::io(path, e))
    })
}

/// Write the feature-name table.
pub fn write_feature_table(path: &Path, names: &[String]) -> Result<(), StoreError> {
    write_rows(path, names.iter().enumerate())
}

/// Write the spatial scale table.
pub fn write_scale_table(path: &Path, scales: &[LayerScale]) -> Result<(), StoreError> {
    write_rows(path, scales)
}

/// Write the valid replay list.
pub fn write_replay_table(path: &Path, rows: &[ReplayRow]) -> Result<(), StoreError> {
    write_rows(path, rows)
}
