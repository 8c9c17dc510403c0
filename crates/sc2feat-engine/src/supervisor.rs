//! Supervisor: fills the queue, runs the workers, reports progress.
//!
//! A run has three phases:
//!
//! 1. **Running:** a filler thread feeds work items into the bounded
//!    queue while the worker pool drains it. The supervisor wakes every
//!    `poll_interval` and logs progress.
//! 2. **Draining:** once every item is processed, or shutdown is
//!    requested, or no worker is left alive, the queue is closed. Blocked
//!    workers and the filler wake up and exit.
//! 3. **Joined:** all threads are joined and a [`SupervisorReport`] is
//!    returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use sc2feat_core::{Engine, ReplayWorkItem};
use sc2feat_obs::Canonicalizer;
use sc2feat_store::OutputLayout;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, PipelineConfig};
use crate::queue::{QueueError, ReplayQueue};
use crate::worker::{ReplayWorker, WorkerContext, WorkerReport};

// ── ShutdownHandle ─────────────────────────────────────────────────

/// Requests a graceful stop of a running [`Supervisor`] from another
/// thread (e.g. a signal handler).
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    queue: ReplayQueue,
}

impl ShutdownHandle {
    /// Stop taking work: workers abandon their current replay, the queue
    /// is closed.
    pub fn request(&self) {
        if !self.flag.swap(true, Ordering::AcqRel) {
            warn!("shutdown requested");
        }
        self.queue.close();
    }

    /// Whether shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

// ── SupervisorReport ───────────────────────────────────────────────

/// Outcome of [`Supervisor::run`].
#[derive(Debug)]
pub struct SupervisorReport {
    /// Items submitted.
    pub total: usize,
    /// Items settled as processed (successfully or not).
    pub processed: u64,
    /// Items dropped without processing.
    pub abandoned: u64,
    /// Whether shutdown was requested during the run.
    pub interrupted: bool,
    /// Whether the filler thread was joined successfully.
    pub filler_joined: bool,
    /// Reports of workers that were joined successfully.
    pub workers: Vec<WorkerReport>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl SupervisorReport {
    /// Items whose artifacts were written.
    pub fn succeeded(&self) -> usize {
        self.workers.iter().map(|w| w.succeeded).sum()
    }

    /// Items that failed.
    pub fn failed(&self) -> usize {
        self.workers.iter().map(|w| w.failed).sum()
    }
}

// ── Supervisor ─────────────────────────────────────────────────────

/// Runs one batch of work items through a pool of workers.
pub struct Supervisor<E: Engine + 'static> {
    engine: Arc<E>,
    ctx: Arc<WorkerContext>,
    queue: ReplayQueue,
    shutdown: Arc<AtomicBool>,
    worker_count: usize,
    poll_interval: Duration,
}

impl<E: Engine + 'static> Supervisor<E> {
    /// Validate `config` and prepare a run writing under `layout`.
    pub fn new(
        engine: Arc<E>,
        config: PipelineConfig,
        layout: OutputLayout,
        canonicalizer: Canonicalizer,
    ) -> Result<Self, ConfigError> {
        let worker_count = config.resolved_worker_count();
        let queue = ReplayQueue::bounded(config.queue_capacity());
        let poll_interval = config.poll_interval;
        let ctx = WorkerContext::new(config, layout, canonicalizer, engine.catalog())?;
        Ok(Self {
            engine,
            ctx: Arc::new(ctx),
            queue,
            shutdown: Arc::new(AtomicBool::new(false)),
            worker_count,
            poll_interval,
        })
    }

    /// Handle that stops this supervisor's run.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            queue: self.queue.clone(),
        }
    }

    /// Shared worker context.
    pub fn context(&self) -> &WorkerContext {
        &self.ctx
    }

    /// Process `items` and block until they are all settled or the run
    /// is stopped.
    pub fn run(self, items: Vec<ReplayWorkItem>) -> Result<SupervisorReport, ConfigError> {
        let start = Instant::now();
        let total = items.len();
        self.ctx
            .layout()
            .create_dirs()
            .map_err(|e| ConfigError::OutputUnavailable {
                reason: e.to_string(),
            })?;
        info!(
            total,
            workers = self.worker_count,
            output = %self.ctx.layout().root().display(),
            "starting extraction"
        );

        let filler = self.spawn_filler(items)?;
        let workers = self.spawn_workers()?;

        self.poll(total, &workers);

        // Draining: nothing more will be taken.
        let discarded = self.queue.close();
        if discarded > 0 {
            debug!(discarded, "discarded queued items");
        }
        match self.queue.join() {
            Ok(()) | Err(QueueError::Closed) => {}
            Err(e) => warn!(error = %e, "queue join"),
        }

        let filler_joined = filler.join().is_ok();
        let mut reports = Vec::with_capacity(workers.len());
        for handle in workers {
            match handle.join() {
                Ok(report) => reports.push(report),
                Err(_) => warn!("worker thread panicked"),
            }
        }

        let report = SupervisorReport {
            total,
            processed: self.queue.processed(),
            abandoned: self.queue.abandoned(),
            interrupted: self.shutdown.load(Ordering::Acquire),
            filler_joined,
            workers: reports,
            elapsed: start.elapsed(),
        };
        info!(
            processed = report.processed,
            succeeded = report.succeeded(),
            failed = report.failed(),
            abandoned = report.abandoned,
            interrupted = report.interrupted,
            elapsed_s = report.elapsed.as_secs_f64(),
            "extraction finished"
        );
        Ok(report)
    }

    fn spawn_filler(&self, items: Vec<ReplayWorkItem>) -> Result<JoinHandle<()>, ConfigError> {
        let queue = self.queue.clone();
        thread::Builder::new()
            .name("sc2feat-filler".into())
            .spawn(move || {
                for item in items {
                    if queue.put(item).is_err() {
                        debug!("queue closed, filler stopping");
                        return;
                    }
                }
            })
            .map_err(|e| ConfigError::ThreadSpawnFailed {
                reason: format!("filler: {e}"),
            })
    }

    fn spawn_workers(&self) -> Result<Vec<JoinHandle<WorkerReport>>, ConfigError> {
        let mut handles = Vec::with_capacity(self.worker_count);
        for i in 0..self.worker_count {
            let worker = ReplayWorker::new(
                i,
                Arc::clone(&self.engine),
                self.queue.clone(),
                Arc::clone(&self.ctx),
                Arc::clone(&self.shutdown),
            );
            let spawned = thread::Builder::new()
                .name(format!("sc2feat-worker-{i}"))
                .spawn(move || worker.run());
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Release the workers already running before bailing.
                    self.shutdown_handle().request();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(ConfigError::ThreadSpawnFailed {
                        reason: format!("worker {i}: {e}"),
                    });
                }
            }
        }
        Ok(handles)
    }

    /// Log progress until every item is processed, shutdown is
    /// requested, or every worker has exited.
    fn poll(&self, total: usize, workers: &[JoinHandle<WorkerReport>]) {
        let total = total as u64;
        let mut last = u64::MAX;
        loop {
            let processed = self.queue.processed();
            if processed != last {
                info!(processed, total, "progress");
                last = processed;
            }
            if processed + self.queue.abandoned() >= total {
                return;
            }
            if self.shutdown.load(Ordering::Acquire) {
                return;
            }
            if workers.iter().all(|h| h.is_finished()) {
                warn!(processed, total, "all workers stopped with work remaining");
                return;
            }
            thread::sleep(self.poll_interval);
        }
    }
}
