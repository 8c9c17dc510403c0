//! Interface options sent to the engine when a replay session starts.

use serde::{Deserialize, Serialize};

/// Width and height of a rendered feature layer, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Pixels along x.
    pub x: u32,
    /// Pixels along y.
    pub y: u32,
}

impl Resolution {
    /// A square resolution.
    pub fn square(side: u32) -> Self {
        Self { x: side, y: side }
    }

    /// Number of pixels.
    pub fn area(&self) -> usize {
        self.x as usize * self.y as usize
    }
}

/// Camera and rendering setup for feature layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialCameraSetup {
    /// World width of the rendered screen area.
    pub width: f32,
    /// Screen layer resolution.
    pub resolution: Resolution,
    /// Minimap layer resolution.
    pub minimap_resolution: Resolution,
    /// Render layers that ignore fog of war.
    pub allow_cheating_layers: bool,
}

/// What the engine should include in each observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterfaceOptions {
    /// Include the raw unit list.
    pub raw: bool,
    /// Include the score block.
    pub score: bool,
    /// Render feature layers (screen and minimap).
    pub feature_layer: Option<SpatialCameraSetup>,
}

impl InterfaceOptions {
    /// Options used for extraction: raw units, score, and feature layers
    /// at `map_size`×`map_size` with a camera `width` world units wide.
    pub fn for_extraction(width: f32, map_size: u32) -> Self {
        Self {
            raw: true,
            score: true,
            feature_layer: Some(SpatialCameraSetup {
                width,
                resolution: Resolution::square(map_size),
                minimap_resolution: Resolution::square(map_size),
                allow_cheating_layers: true,
            }),
        }
    }

    /// Near-zero-resolution options for reverse action lookup, where
    /// only the ability identity matters.
    pub fn minimal() -> Self {
        Self {
            raw: false,
            score: false,
            feature_layer: Some(SpatialCameraSetup {
                width: 1.0,
                resolution: Resolution::square(1),
                minimap_resolution: Resolution::square(1),
                allow_cheating_layers: false,
            }),
        }
    }

    /// Minimap resolution, if feature layers are enabled.
    pub fn minimap_resolution(&self) -> Option<Resolution> {
        self.feature_layer.as_ref().map(|f| f.minimap_resolution)
    }
}
