//! Command-line front end.
//!
//! The `sc2feat` binary only understands `finalise` and `parse
//! --dry-run`: extraction needs an engine binding, which lives outside
//! this workspace. A binding crate provides its own `main` that parses
//! the same [`Cli`] and hands its engine to [`run_parse`].

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sc2feat_core::{Engine, GameCatalog, Race};
use sc2feat_engine::{PipelineConfig, ShutdownHandle, SupervisorReport};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::pipeline::{self, Job};

/// `sc2feat` command line.
#[derive(Debug, Parser)]
#[command(name = "sc2feat")]
#[command(about = "Extract training features from StarCraft II replays", long_about = None)]
pub struct Cli {
    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay every planned replay-player and write its artifacts
    Parse(ParseArgs),
    /// Write the feature tables and the list of valid replays
    Finalise(FinaliseArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Directory holding the replay library JSON files
    #[arg(long, default_value = "../replay_library")]
    pub library: PathBuf,

    /// Root directory for parsed output
    #[arg(long, default_value = "../parsed_replays")]
    pub output: PathBuf,

    /// Race of the observed player
    #[arg(long, default_value = "Protoss")]
    pub player_race: Race,

    /// Race of the opponent
    #[arg(long, default_value = "Terran")]
    pub enemy_race: Race,

    /// Minimap layers, comma separated
    #[arg(
        long,
        value_delimiter = ',',
        default_values = ["height_map", "visibility_map", "creep", "player_relative", "unit_type", "pathable"]
    )]
    pub layers: Vec<String>,

    /// Minimap resolution in pixels
    #[arg(long, default_value_t = 64)]
    pub map_size: u32,

    /// Engine frames between observations
    #[arg(long, default_value_t = 72)]
    pub step_size: u32,

    /// Allowed shortfall of a recording, in steps
    #[arg(long, default_value_t = 10)]
    pub tolerance: u32,
}

/// `parse` options.
#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Shared options.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Only keep replays on these maps, separated by ';'
    #[arg(long, value_delimiter = ';')]
    pub maps: Vec<String>,

    /// Parallel engine instances (default: one per CPU)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Replays per engine instance before it is restarted
    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    /// Screen camera width in world units
    #[arg(long, default_value_t = 24.0)]
    pub width: f32,

    /// Plan and report the work without running an engine
    #[arg(long)]
    pub dry_run: bool,
}

/// `finalise` options.
#[derive(Debug, Args)]
pub struct FinaliseArgs {
    /// Shared options.
    #[command(flatten)]
    pub common: CommonArgs,

    /// Game catalog JSON (unit types per race and upgrades)
    #[arg(long)]
    pub catalog: PathBuf,
}

impl CommonArgs {
    fn config(&self) -> Result<PipelineConfig> {
        let config = PipelineConfig {
            minimap_size: self.map_size,
            step_frames: self.step_size,
            completeness_tolerance: self.tolerance,
            ..PipelineConfig::default()
        }
        .with_layer_names(&self.layers)?;
        config.validate()?;
        Ok(config)
    }

    fn job(&self, maps: Vec<String>, config: PipelineConfig) -> Job {
        Job {
            library_dir: self.library.clone(),
            output_dir: self.output.clone(),
            player_race: self.player_race,
            enemy_race: self.enemy_race,
            maps,
            config,
        }
    }
}

impl FinaliseArgs {
    /// Load the game catalog named by `--catalog`.
    pub fn load_catalog(&self) -> Result<GameCatalog> {
        pipeline::load_catalog(&self.catalog)
            .with_context(|| format!("loading catalog {}", self.catalog.display()))
    }
}

impl ParseArgs {
    /// The job these arguments describe.
    pub fn job(&self) -> Result<Job> {
        let config = PipelineConfig {
            worker_count: self.workers,
            batch_size: self.batch_size,
            camera_width: self.width,
            ..self.common.config()?
        };
        config.validate()?;
        Ok(self.common.job(self.maps.clone(), config))
    }
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// default filter.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sc2feat=info,warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

/// Request shutdown on the first Ctrl-C.
///
/// The signal is awaited on a dedicated thread running a single-threaded
/// runtime; the pipeline itself stays on plain threads.
pub fn trap_interrupt(handle: ShutdownHandle) {
    let spawned = thread::Builder::new()
        .name("sc2feat-signal".into())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!(error = %e, "cannot build signal runtime, Ctrl-C will not be trapped");
                    return;
                }
            };
            rt.block_on(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => handle.request(),
                    Err(e) => error!(error = %e, "cannot listen for Ctrl-C"),
                }
            });
        });
    if let Err(e) = spawned {
        warn!(error = %e, "signal thread not started");
    }
}

/// Plan the job and log what a `parse` would do.
pub fn run_plan(args: &ParseArgs) -> Result<usize> {
    let job = args.job()?;
    let items = pipeline::plan(&job).context("planning work")?;
    for item in &items {
        info!(key = %item.key(), path = %item.replay_path.display(), "planned");
    }
    info!(planned = items.len(), "dry run, nothing extracted");
    Ok(items.len())
}

/// Extract the job with `engine`, trapping Ctrl-C for a graceful stop.
pub fn run_parse<E: Engine + 'static>(args: &ParseArgs, engine: Arc<E>) -> Result<SupervisorReport> {
    let job = args.job()?;
    let report = pipeline::parse(engine, &job, trap_interrupt).context("parsing replays")?;
    if report.interrupted {
        warn!(
            abandoned = report.abandoned,
            "interrupted; rerun to resume from completed artifacts"
        );
    }
    Ok(report)
}

/// Write the companion tables.
pub fn run_finalise(args: &FinaliseArgs) -> Result<()> {
    let config = args.common.config()?;
    let catalog = args.load_catalog()?;
    let job = args.common.job(Vec::new(), config);
    let report = pipeline::finalise(&catalog, &job).context("finalising")?;
    info!(
        features = report.features,
        spatial_layers = report.spatial_layers,
        valid_replays = report.valid_replays,
        "done"
    );
    Ok(())
}
