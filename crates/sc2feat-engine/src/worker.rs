//! Replay worker: one engine instance, many replays.
//!
//! Each worker thread owns exactly one controller at a time. It takes
//! items from the shared [`ReplayQueue`], runs each replay to its end,
//! and writes the artifacts. After `batch_size` items (or an engine
//! failure that leaves the controller unusable) the controller is shut
//! down and a fresh one is launched.
//!
//! ```text
//!   Idle ──get──▶ Simulating ──terminal──▶ Persisting ──▶ Idle
//!    │                │                                    │
//!    └── closed / shutdown / missing file / launch failure ─┴──▶ Stopped
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sc2feat_core::{Controller, Engine, GameCatalog, InterfaceOptions, ReplayWorkItem, StartReplay};
use sc2feat_obs::{Canonicalizer, SpatialFeatureExtractor};
use sc2feat_store::OutputLayout;
use tracing::{error, info, trace, warn};

use crate::config::{ConfigError, PipelineConfig};
use crate::error::WorkerError;
use crate::queue::{QueueError, ReplayQueue};
use crate::session::{ReplaySession, SessionSummary};

// ── WorkerContext ──────────────────────────────────────────────────

/// Read-only state shared by every worker of a run.
#[derive(Debug)]
pub struct WorkerContext {
    config: PipelineConfig,
    layout: OutputLayout,
    canonicalizer: Canonicalizer,
    spatial: SpatialFeatureExtractor,
    options: InterfaceOptions,
}

impl WorkerContext {
    /// Validate `config` and prepare the shared extractors.
    pub fn new(
        config: PipelineConfig,
        layout: OutputLayout,
        canonicalizer: Canonicalizer,
        catalog: &GameCatalog,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let spatial = SpatialFeatureExtractor::new(
            config.spatial_layers.clone(),
            config.minimap_resolution(),
            catalog,
        )
        .map_err(|_| ConfigError::NoSpatialLayers)?;
        let options = config.interface_options();
        Ok(Self {
            config,
            layout,
            canonicalizer,
            spatial,
            options,
        })
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Output layout artifacts are written under.
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Spatial extractor shared by all sessions.
    pub fn spatial(&self) -> &SpatialFeatureExtractor {
        &self.spatial
    }

    /// Unit canonicalization rules.
    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }
}

// ── WorkerState / StopReason / WorkerReport ────────────────────────

/// Lifecycle state of a worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for an item.
    Idle,
    /// Stepping through a replay.
    Simulating,
    /// Writing artifacts.
    Persisting,
    /// No longer taking work.
    Stopped,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Simulating => "simulating",
            Self::Persisting => "persisting",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Why a worker stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The queue was closed.
    QueueClosed,
    /// Shutdown was requested.
    Interrupted,
    /// A replay file does not exist.
    MissingReplay(PathBuf),
    /// No engine instance could be launched.
    LaunchFailed(String),
}

/// Summary of one worker's run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerReport {
    /// Worker index.
    pub worker: usize,
    /// Items whose artifacts were written.
    pub succeeded: usize,
    /// Items that failed and were skipped.
    pub failed: usize,
    /// Engine instances launched.
    pub launches: usize,
    /// Why the worker stopped.
    pub stop: StopReason,
}

// ── ReplayWorker ───────────────────────────────────────────────────

/// A worker bound to one queue and one engine.
pub struct ReplayWorker<E: Engine> {
    id: usize,
    engine: Arc<E>,
    queue: ReplayQueue,
    ctx: Arc<WorkerContext>,
    shutdown: Arc<AtomicBool>,
    state: WorkerState,
    succeeded: usize,
    failed: usize,
    launches: usize,
}

impl<E: Engine> ReplayWorker<E> {
    /// Worker number `id`.
    pub fn new(
        id: usize,
        engine: Arc<E>,
        queue: ReplayQueue,
        ctx: Arc<WorkerContext>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            engine,
            queue,
            ctx,
            shutdown,
            state: WorkerState::Idle,
            succeeded: 0,
            failed: 0,
            launches: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.state
    }

    fn transition(&mut self, next: WorkerState) {
        trace!(worker = self.id, from = %self.state, to = %next, "worker state");
        self.state = next;
    }

    fn interrupted(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    fn settle(&self, result: Result<(), QueueError>) {
        if let Err(e) = result {
            warn!(worker = self.id, error = %e, "queue bookkeeping");
        }
    }

    /// Take and process items until stopped.
    pub fn run(mut self) -> WorkerReport {
        info!(worker = self.id, "worker started");
        let stop = loop {
            if self.interrupted() {
                break StopReason::Interrupted;
            }
            let mut controller = match self.engine.start() {
                Ok(c) => c,
                Err(e) => {
                    error!(worker = self.id, error = %e, "engine launch failed");
                    break StopReason::LaunchFailed(e.to_string());
                }
            };
            self.launches += 1;
            let outcome = self.run_batch(&mut controller);
            if let Err(e) = controller.quit() {
                warn!(worker = self.id, error = %e, "engine shutdown failed");
            }
            if let Some(stop) = outcome {
                break stop;
            }
        };
        self.transition(WorkerState::Stopped);
        info!(
            worker = self.id,
            succeeded = self.succeeded,
            failed = self.failed,
            launches = self.launches,
            ?stop,
            "worker stopped"
        );
        WorkerReport {
            worker: self.id,
            succeeded: self.succeeded,
            failed: self.failed,
            launches: self.launches,
            stop,
        }
    }

    /// Process up to `batch_size` items on one controller. `Some` means
    /// the worker must stop; `None` means relaunch and continue.
    fn run_batch(&mut self, controller: &mut E::Controller) -> Option<StopReason> {
        for _ in 0..self.ctx.config.batch_size {
            self.transition(WorkerState::Idle);
            let Some(item) = self.queue.get() else {
                return Some(StopReason::QueueClosed);
            };
            if self.interrupted() {
                self.settle(self.queue.abandon());
                return Some(StopReason::Interrupted);
            }

            let result = self.process_replay(controller, &item);
            self.transition(WorkerState::Idle);
            match result {
                Ok(summary) => {
                    self.settle(self.queue.task_done());
                    self.succeeded += 1;
                    info!(
                        worker = self.id,
                        key = %item.key(),
                        steps = summary.steps,
                        last_frame = summary.last_frame,
                        "replay done"
                    );
                }
                Err(WorkerError::Interrupted) => {
                    self.settle(self.queue.abandon());
                    warn!(worker = self.id, key = %item.key(), "replay abandoned");
                    return Some(StopReason::Interrupted);
                }
                Err(WorkerError::MissingReplay { path }) => {
                    self.settle(self.queue.task_done());
                    error!(worker = self.id, path = %path.display(), "replay file missing, stopping");
                    return Some(StopReason::MissingReplay(path));
                }
                Err(e) => {
                    self.settle(self.queue.task_done());
                    self.failed += 1;
                    error!(worker = self.id, key = %item.key(), error = %e, "replay failed");
                    if e.needs_restart() {
                        return None;
                    }
                }
            }
        }
        None
    }

    /// Run one replay from its first frame to the terminal observation
    /// and write its artifacts.
    #[tracing::instrument(
        name = "replay",
        skip_all,
        fields(worker = self.id, replay = %item.replay_id, player = %item.player_id)
    )]
    pub fn process_replay(
        &mut self,
        controller: &mut E::Controller,
        item: &ReplayWorkItem,
    ) -> Result<SessionSummary, WorkerError> {
        let replay_data = self
            .engine
            .replay_data(&item.replay_path)
            .map_err(|e| WorkerError::reading(&item.replay_path, e))?;
        let info = controller.replay_info(&replay_data)?;
        let map_data = match &info.local_map_path {
            Some(path) => Some(self.engine.map_data(path)?),
            None => None,
        };
        let (player_race, enemy_race) =
            info.matchup(item.player_id)
                .ok_or(WorkerError::UnknownPlayer {
                    player: item.player_id,
                })?;

        let ctx = Arc::clone(&self.ctx);
        let engine = Arc::clone(&self.engine);
        let mut session = ReplaySession::new(
            engine.catalog(),
            &ctx.canonicalizer,
            &ctx.spatial,
            engine.abilities(),
            player_race,
            enemy_race,
        );

        controller.start_replay(StartReplay {
            replay_data: &replay_data,
            map_data: map_data.as_deref(),
            options: &ctx.options,
            observed_player_id: item.player_id,
        })?;

        self.transition(WorkerState::Simulating);
        let step_frames = ctx.config.step_frames;
        loop {
            if self.interrupted() {
                return Err(WorkerError::Interrupted);
            }
            controller.step(step_frames)?;
            let obs = controller.observe()?;
            if let Some(last) = session.last_frame() {
                if obs.game_loop <= last && !obs.is_terminal() {
                    return Err(WorkerError::Stalled {
                        game_loop: obs.game_loop,
                    });
                }
            }
            session.record_step(&obs)?;
            if obs.is_terminal() {
                break;
            }
        }

        self.transition(WorkerState::Persisting);
        let paths = ctx.layout.artifacts(item.player_id, &item.replay_id);
        Ok(session.finish(&paths)?)
    }
}
