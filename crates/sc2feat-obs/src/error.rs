//! Error types for feature extraction.

use std::error::Error;
use std::fmt;

use sc2feat_core::LayerError;

/// Errors from building or running an extractor.
///
/// Unknown unit types and unresolvable actions are not errors; they are
/// logged and skipped by the extractors themselves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtractError {
    /// A configured minimap layer name is not in the layer catalog.
    UnknownLayer {
        /// The unrecognised name.
        name: String,
    },
    /// An extractor was configured with no layers.
    NoLayers,
    /// A configured layer was absent from the observation.
    MissingLayer {
        /// Layer name.
        name: String,
    },
    /// A layer image could not be unpacked.
    Layer {
        /// Layer name.
        name: String,
        /// Underlying unpack error.
        source: LayerError,
    },
    /// A layer's size differs from the configured minimap resolution.
    ShapeMismatch {
        /// Layer name.
        name: String,
        /// Configured `(rows, cols)`.
        expected: (usize, usize),
        /// Received `(rows, cols)`.
        actual: (usize, usize),
    },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownLayer { name } => write!(f, "unknown minimap layer '{name}'"),
            Self::NoLayers => write!(f, "no minimap layers configured"),
            Self::MissingLayer { name } => {
                write!(f, "minimap layer '{name}' missing from observation")
            }
            Self::Layer { name, source } => write!(f, "minimap layer '{name}': {source}"),
            Self::ShapeMismatch {
                name,
                expected,
                actual,
            } => write!(
                f,
                "minimap layer '{name}' is {}x{}, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
        }
    }
}

impl Error for ExtractError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Layer { source, .. } => Some(source),
            _ => None,
        }
    }
}
