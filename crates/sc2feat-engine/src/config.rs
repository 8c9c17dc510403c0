//! Pipeline configuration, validation, and error types.

use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::time::Duration;

use sc2feat_core::{InterfaceOptions, Resolution};
use sc2feat_obs::MinimapFeature;
use sc2feat_store::CompletenessCheck;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`PipelineConfig::validate()`] or while
/// starting the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// `batch_size` is zero.
    ZeroBatchSize,
    /// `step_frames` is zero.
    ZeroStepFrames,
    /// `queue_capacity_per_worker` is zero.
    ZeroQueueCapacity,
    /// `minimap_size` is zero.
    ZeroMinimapSize,
    /// `camera_width` is NaN, infinite, zero or negative.
    InvalidCameraWidth {
        /// The invalid value.
        value: f32,
    },
    /// `poll_interval` is zero.
    ZeroPollInterval,
    /// No spatial layers configured.
    NoSpatialLayers,
    /// A spatial layer name is not in the minimap layer catalog.
    UnknownLayer {
        /// The unrecognised name.
        name: String,
    },
    /// A spatial layer is listed twice.
    DuplicateLayer {
        /// The repeated name.
        name: String,
    },
    /// The output directories could not be created.
    OutputUnavailable {
        /// Description of the failure.
        reason: String,
    },
    /// A worker or filler thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBatchSize => write!(f, "batch_size must be at least 1"),
            Self::ZeroStepFrames => write!(f, "step_frames must be at least 1"),
            Self::ZeroQueueCapacity => {
                write!(f, "queue_capacity_per_worker must be at least 1")
            }
            Self::ZeroMinimapSize => write!(f, "minimap_size must be at least 1"),
            Self::InvalidCameraWidth { value } => {
                write!(f, "camera_width must be finite and positive, got {value}")
            }
            Self::ZeroPollInterval => write!(f, "poll_interval must be non-zero"),
            Self::NoSpatialLayers => write!(f, "no spatial layers configured"),
            Self::UnknownLayer { name } => write!(f, "unknown minimap layer '{name}'"),
            Self::DuplicateLayer { name } => {
                write!(f, "minimap layer '{name}' listed more than once")
            }
            Self::OutputUnavailable { reason } => write!(f, "output unavailable: {reason}"),
            Self::ThreadSpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ConfigError {}

// ── PipelineConfig ─────────────────────────────────────────────────

/// Everything that shapes an extraction run.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Number of parallel workers, each owning one engine instance.
    /// `None` = one per available CPU.
    pub worker_count: Option<usize>,
    /// Replays a worker processes before restarting its engine instance.
    /// Default: 10.
    pub batch_size: usize,
    /// Engine frames advanced between observations. Default: 72.
    pub step_frames: u32,
    /// Queue slots per worker. Default: 10.
    pub queue_capacity_per_worker: usize,
    /// Minimap (and screen) resolution in pixels. Default: 64.
    pub minimap_size: u32,
    /// World width of the rendered screen area. Default: 24.
    pub camera_width: f32,
    /// Minimap layers stacked into the spatial tensor, in order.
    pub spatial_layers: Vec<MinimapFeature>,
    /// How often the supervisor reports progress. Default: 1 s.
    pub poll_interval: Duration,
    /// Allowed shortfall between the last recorded frame and the replay
    /// duration, in steps. Default: 10.
    pub completeness_tolerance: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: None,
            batch_size: 10,
            step_frames: 72,
            queue_capacity_per_worker: 10,
            minimap_size: 64,
            camera_width: 24.0,
            spatial_layers: MinimapFeature::DEFAULT_SELECTION.to_vec(),
            poll_interval: Duration::from_secs(1),
            completeness_tolerance: 10,
        }
    }
}

impl PipelineConfig {
    /// Replace the spatial layers with the named ones.
    pub fn with_layer_names<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, ConfigError> {
        self.spatial_layers = names
            .iter()
            .map(|n| {
                n.as_ref()
                    .parse::<MinimapFeature>()
                    .map_err(|_| ConfigError::UnknownLayer {
                        name: n.as_ref().to_string(),
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// Resolve the actual worker count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to at least 1.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.max(1),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }

    /// Total work queue capacity.
    pub fn queue_capacity(&self) -> usize {
        self.resolved_worker_count() * self.queue_capacity_per_worker
    }

    /// Interface options sent with every replay session.
    pub fn interface_options(&self) -> InterfaceOptions {
        InterfaceOptions::for_extraction(self.camera_width, self.minimap_size)
    }

    /// Minimap resolution.
    pub fn minimap_resolution(&self) -> Resolution {
        Resolution::square(self.minimap_size)
    }

    /// Completeness check matching this configuration.
    pub fn completeness_check(&self) -> CompletenessCheck {
        CompletenessCheck {
            step_frames: self.step_frames,
            tolerance: self.completeness_tolerance,
            global_columns: None,
        }
    }

    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.step_frames == 0 {
            return Err(ConfigError::ZeroStepFrames);
        }
        if self.queue_capacity_per_worker == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.minimap_size == 0 {
            return Err(ConfigError::ZeroMinimapSize);
        }
        if !self.camera_width.is_finite() || self.camera_width <= 0.0 {
            return Err(ConfigError::InvalidCameraWidth {
                value: self.camera_width,
            });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.spatial_layers.is_empty() {
            return Err(ConfigError::NoSpatialLayers);
        }
        let mut seen = HashSet::new();
        for layer in &self.spatial_layers {
            if !seen.insert(layer) {
                return Err(ConfigError::DuplicateLayer {
                    name: layer.name().to_string(),
                });
            }
        }
        Ok(())
    }
}
