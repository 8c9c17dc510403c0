//! Spatial (minimap) feature extraction.
//!
//! The engine renders a fixed catalog of minimap layers. A
//! [`SpatialFeatureExtractor`] picks a subset, unpacks each packed image
//! and stacks them into a `(layers, rows, cols)` tensor. Values stay at
//! native engine scale; [`scale_table`](SpatialFeatureExtractor::scale_table)
//! tells consumers how to normalise or one-hot them.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array3, Axis};
use sc2feat_core::{GameCatalog, Observation, Resolution};
use serde::Serialize;

use crate::error::ExtractError;

/// How a layer's values should be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureKind {
    /// Continuous value in `[0, scale)`.
    Scalar,
    /// One of `scale` discrete categories.
    Categorical,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scalar => "SCALAR",
            Self::Categorical => "CATEGORICAL",
        })
    }
}

/// A minimap layer the engine can render, in engine order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MinimapFeature {
    /// Terrain height.
    HeightMap,
    /// Hidden, fogged or visible.
    VisibilityMap,
    /// Zerg creep.
    Creep,
    /// Current camera rectangle.
    Camera,
    /// Owning player slot.
    PlayerId,
    /// Owner relative to the observer: none, self, ally, neutral, enemy.
    PlayerRelative,
    /// Selected units.
    Selected,
    /// Unit type id.
    UnitType,
    /// Minimap alerts.
    Alerts,
    /// Ground pathability.
    Pathable,
    /// Structure placement.
    Buildable,
}

impl MinimapFeature {
    /// Every layer, in engine order.
    pub const ALL: [MinimapFeature; 11] = [
        Self::HeightMap,
        Self::VisibilityMap,
        Self::Creep,
        Self::Camera,
        Self::PlayerId,
        Self::PlayerRelative,
        Self::Selected,
        Self::UnitType,
        Self::Alerts,
        Self::Pathable,
        Self::Buildable,
    ];

    /// Layers extracted when none are configured.
    pub const DEFAULT_SELECTION: [MinimapFeature; 6] = [
        Self::HeightMap,
        Self::VisibilityMap,
        Self::Creep,
        Self::PlayerRelative,
        Self::UnitType,
        Self::Pathable,
    ];

    /// Engine layer name.
    pub fn name(self) -> &'static str {
        match self {
            Self::HeightMap => "height_map",
            Self::VisibilityMap => "visibility_map",
            Self::Creep => "creep",
            Self::Camera => "camera",
            Self::PlayerId => "player_id",
            Self::PlayerRelative => "player_relative",
            Self::Selected => "selected",
            Self::UnitType => "unit_type",
            Self::Alerts => "alerts",
            Self::Pathable => "pathable",
            Self::Buildable => "buildable",
        }
    }

    /// Value interpretation.
    pub fn kind(self) -> FeatureKind {
        match self {
            Self::HeightMap => FeatureKind::Scalar,
            _ => FeatureKind::Categorical,
        }
    }

    /// Scale factor. `unit_type_scale` is catalog-dependent and used only
    /// for [`MinimapFeature::UnitType`].
    pub fn scale(self, unit_type_scale: u32) -> u32 {
        match self {
            Self::HeightMap => 256,
            Self::VisibilityMap => 4,
            Self::PlayerId => 17,
            Self::PlayerRelative => 5,
            Self::UnitType => unit_type_scale,
            Self::Creep
            | Self::Camera
            | Self::Selected
            | Self::Alerts
            | Self::Pathable
            | Self::Buildable => 2,
        }
    }

    /// Parse a list of layer names, keeping their order.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>, ExtractError> {
        names.iter().map(|n| n.as_ref().parse()).collect()
    }
}

impl fmt::Display for MinimapFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MinimapFeature {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| ExtractError::UnknownLayer {
                name: s.to_string(),
            })
    }
}

/// One row of the spatial scale table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LayerScale {
    /// Layer name.
    pub name: &'static str,
    /// Value interpretation.
    pub category: FeatureKind,
    /// Scale factor.
    pub scale: u32,
}

/// Stateless minimap layer stacker.
///
/// # Examples
///
/// ```
/// use sc2feat_core::{GameCatalog, Resolution};
/// use sc2feat_obs::{MinimapFeature, SpatialFeatureExtractor};
///
/// let extractor = SpatialFeatureExtractor::new(
///     MinimapFeature::DEFAULT_SELECTION.to_vec(),
///     Resolution::square(64),
///     &GameCatalog::default(),
/// )
/// .unwrap();
/// assert_eq!(extractor.flat_len(), 6 * 64 * 64);
/// assert_eq!(extractor.scale_table()[0].name, "height_map");
/// ```
#[derive(Clone, Debug)]
pub struct SpatialFeatureExtractor {
    layers: Vec<MinimapFeature>,
    resolution: Resolution,
    unit_type_scale: u32,
}

impl SpatialFeatureExtractor {
    /// Extractor stacking `layers` in the given order at `resolution`.
    ///
    /// The `unit_type` scale is one past the largest unit id in
    /// `catalog`.
    pub fn new(
        layers: Vec<MinimapFeature>,
        resolution: Resolution,
        catalog: &GameCatalog,
    ) -> Result<Self, ExtractError> {
        if layers.is_empty() {
            return Err(ExtractError::NoLayers);
        }
        let unit_type_scale = catalog.max_unit_id().map_or(1, |id| id.0 + 1);
        Ok(Self {
            layers,
            resolution,
            unit_type_scale,
        })
    }

    /// Configured layers, in stacking order.
    pub fn layers(&self) -> &[MinimapFeature] {
        &self.layers
    }

    /// `(rows, cols)` of every layer.
    pub fn shape(&self) -> (usize, usize) {
        (self.resolution.y as usize, self.resolution.x as usize)
    }

    /// Length of one flattened tensor.
    pub fn flat_len(&self) -> usize {
        self.layers.len() * self.resolution.area()
    }

    /// `(name, category, scale)` per layer, in stacking order.
    pub fn scale_table(&self) -> Vec<LayerScale> {
        self.layers
            .iter()
            .map(|&f| LayerScale {
                name: f.name(),
                category: f.kind(),
                scale: f.scale(self.unit_type_scale),
            })
            .collect()
    }

    /// Stack the configured layers of `obs` into `(layers, rows, cols)`.
    pub fn extract(&self, obs: &Observation) -> Result<Array3<f32>, ExtractError> {
        let (rows, cols) = self.shape();
        let mut out = Array3::<f32>::zeros((self.layers.len(), rows, cols));

        for (feature, mut plane) in self.layers.iter().zip(out.axis_iter_mut(Axis(0))) {
            let name = feature.name();
            let image = obs
                .minimap
                .get(name)
                .ok_or_else(|| ExtractError::MissingLayer {
                    name: name.to_string(),
                })?;
            if image.size != self.resolution {
                return Err(ExtractError::ShapeMismatch {
                    name: name.to_string(),
                    expected: (rows, cols),
                    actual: (image.size.y as usize, image.size.x as usize),
                });
            }
            let values = image.unpack().map_err(|source| ExtractError::Layer {
                name: name.to_string(),
                source,
            })?;
            for (dst, src) in plane.iter_mut().zip(values) {
                *dst = src;
            }
        }
        Ok(out)
    }
}
