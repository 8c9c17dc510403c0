//! Parallel replay extraction for sc2feat.
//!
//! A [`Supervisor`] drives a pool of [`ReplayWorker`] threads over a
//! bounded [`ReplayQueue`]. Each worker owns one engine controller,
//! steps replays through it, feeds every observation to a
//! [`ReplaySession`], and writes the session's artifacts when the replay
//! reaches its terminal observation.
//!
//! # Quick start
//!
//! ```ignore
//! let supervisor = Supervisor::new(engine, PipelineConfig::default(), layout, Canonicalizer::default())?;
//! let handle = supervisor.shutdown_handle();
//! let report = supervisor.run(items)?;
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod queue;
pub mod session;
pub mod supervisor;
pub mod worker;

pub use config::{ConfigError, PipelineConfig};
pub use error::WorkerError;
pub use queue::{QueueError, ReplayQueue};
pub use session::{ReplaySession, SessionSummary};
pub use supervisor::{ShutdownHandle, Supervisor, SupervisorReport};
pub use worker::{ReplayWorker, StopReason, WorkerContext, WorkerReport, WorkerState};
