//! The two end-to-end operations: `parse` and `finalise`.
//!
//! `parse` loads the matchup's replay library, plans the replay-players
//! whose artifacts are not yet complete, and runs them through a
//! [`Supervisor`]. `finalise` writes the companion tables describing the
//! artifacts and lists every replay-player that passes the completeness
//! check.

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sc2feat_core::{Engine, GameCatalog, Race, ReplayWorkItem};
use sc2feat_engine::{ConfigError, PipelineConfig, ShutdownHandle, Supervisor, SupervisorReport};
use sc2feat_obs::{Canonicalizer, GlobalFeatureExtractor, SpatialFeatureExtractor};
use sc2feat_store::{
    write_feature_table, write_replay_table, write_scale_table, CompletenessCheck, OutputLayout,
    ReplayLibrary, StoreError,
};
use tracing::info;

// ── PipelineError ──────────────────────────────────────────────────

/// Errors from [`plan`], [`parse`] and [`finalise`].
#[derive(Debug)]
pub enum PipelineError {
    /// The game catalog file could not be read.
    CatalogIo {
        /// Catalog path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The game catalog file is not valid JSON.
    CatalogJson {
        /// Catalog path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// The output directory could not be created.
    OutputIo {
        /// Directory path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Invalid pipeline configuration.
    Config(ConfigError),
    /// Library or artifact storage failed.
    Store(StoreError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CatalogIo { path, .. } => {
                write!(f, "cannot read game catalog {}", path.display())
            }
            Self::CatalogJson { path, .. } => {
                write!(f, "malformed game catalog {}", path.display())
            }
            Self::OutputIo { path, .. } => {
                write!(f, "cannot create output directory {}", path.display())
            }
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Store(e) => write!(f, "storage: {e}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CatalogIo { source, .. } => Some(source),
            Self::CatalogJson { source, .. } => Some(source),
            Self::OutputIo { source, .. } => Some(source),
            Self::Config(e) => Some(e),
            Self::Store(e) => Some(e),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ── Jobs ───────────────────────────────────────────────────────────

/// Where a run reads from and writes to, and for which matchup.
#[derive(Clone, Debug, PartialEq)]
pub struct Job {
    /// Directory holding `{RaceA}_vs_{RaceB}.json` replay libraries.
    pub library_dir: PathBuf,
    /// Root output directory.
    pub output_dir: PathBuf,
    /// Race of the observed player.
    pub player_race: Race,
    /// Race of the opponent.
    pub enemy_race: Race,
    /// Map names to keep. Empty keeps all.
    pub maps: Vec<String>,
    /// Pipeline configuration.
    pub config: PipelineConfig,
}

impl Job {
    /// Output layout for this job's matchup.
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_dir, self.player_race, self.enemy_race)
    }

    fn library(&self) -> Result<ReplayLibrary, StoreError> {
        Ok(ReplayLibrary::load(&self.library_dir, self.player_race, self.enemy_race)?
            .filter_maps(&self.maps))
    }
}

/// Load a game catalog from a JSON file.
pub fn load_catalog(path: &Path) -> Result<GameCatalog, PipelineError> {
    let bytes = fs::read(path).map_err(|source| PipelineError::CatalogIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| PipelineError::CatalogJson {
        path: path.to_path_buf(),
        source,
    })
}

// ── Operations ─────────────────────────────────────────────────────

/// Work items for every replay-player of the job whose artifacts are
/// not yet complete.
pub fn plan(job: &Job) -> Result<Vec<ReplayWorkItem>, PipelineError> {
    job.config.validate()?;
    plan_with(job, &job.config.completeness_check())
}

fn plan_with(job: &Job, check: &CompletenessCheck) -> Result<Vec<ReplayWorkItem>, PipelineError> {
    let library = job.library()?;
    Ok(library.plan_work(job.player_race, &job.layout(), check))
}

/// Plan the job and extract every planned item with `engine`.
///
/// The feature tables are written from the engine's own catalog before
/// any work starts, and artifacts written under a different feature
/// schema are planned again. `on_start` receives the run's
/// [`ShutdownHandle`] before any work is taken, e.g. to wire it to a
/// signal handler.
pub fn parse<E, F>(engine: Arc<E>, job: &Job, on_start: F) -> Result<SupervisorReport, PipelineError>
where
    E: Engine + 'static,
    F: FnOnce(ShutdownHandle),
{
    job.config.validate()?;
    let schema = write_schema(engine.catalog(), job)?;
    let check = job
        .config
        .completeness_check()
        .with_global_columns(schema.features);
    let items = plan_with(job, &check)?;
    let supervisor = Supervisor::new(
        engine,
        job.config.clone(),
        job.layout(),
        Canonicalizer::default(),
    )?;
    on_start(supervisor.shutdown_handle());
    Ok(supervisor.run(items)?)
}

/// What [`finalise`] wrote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FinaliseReport {
    /// Global feature slots listed in `features.csv`.
    pub features: usize,
    /// Spatial layers listed in `spa_embedding.csv`.
    pub spatial_layers: usize,
    /// Valid replay-players listed in `replays.csv`.
    pub valid_replays: usize,
}

/// Sizes of the feature tables written by [`write_schema`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchemaReport {
    /// Global feature slots.
    pub features: usize,
    /// Spatial layers.
    pub spatial_layers: usize,
}

/// Write `features.csv` and `spa_embedding.csv` for the job's matchup as
/// derived from `catalog`.
pub fn write_schema(catalog: &GameCatalog, job: &Job) -> Result<SchemaReport, PipelineError> {
    let layout = job.layout();
    fs::create_dir_all(layout.root()).map_err(|source| PipelineError::OutputIo {
        path: layout.root().to_path_buf(),
        source,
    })?;

    let global = GlobalFeatureExtractor::new(
        catalog,
        &Canonicalizer::default(),
        job.player_race,
        job.enemy_race,
    );
    write_feature_table(&layout.features_csv(), global.feature_names())?;

    let spatial = SpatialFeatureExtractor::new(
        job.config.spatial_layers.clone(),
        job.config.minimap_resolution(),
        catalog,
    )
    .map_err(|_| ConfigError::NoSpatialLayers)?;
    let scales = spatial.scale_table();
    write_scale_table(&layout.spatial_scales_csv(), &scales)?;

    Ok(SchemaReport {
        features: global.len(),
        spatial_layers: scales.len(),
    })
}

/// Write the feature tables and `replays.csv` for the job's matchup.
///
/// Only replay-players whose global matrix has exactly as many columns
/// as `features.csv` lists are valid.
pub fn finalise(catalog: &GameCatalog, job: &Job) -> Result<FinaliseReport, PipelineError> {
    job.config.validate()?;
    let layout = job.layout();
    let schema = write_schema(catalog, job)?;

    let check = job
        .config
        .completeness_check()
        .with_global_columns(schema.features);
    let rows = job
        .library()?
        .valid_replays(job.player_race, &layout, &check);
    write_replay_table(&layout.replays_csv(), &rows)?;

    let report = FinaliseReport {
        features: schema.features,
        spatial_layers: schema.spatial_layers,
        valid_replays: rows.len(),
    };
    info!(?report, root = %layout.root().display(), "finalised");
    Ok(report)
}
