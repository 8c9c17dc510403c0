//! Error types shared across the workspace.
//!
//! [`EngineError`] covers everything the simulation engine collaborator
//! can report. [`LayerError`] covers malformed feature layer images.

use std::error::Error;
use std::fmt;
use std::io;

/// Errors reported by the engine collaborator.
#[derive(Debug)]
pub enum EngineError {
    /// Reading replay or map bytes failed.
    Io(io::Error),
    /// The engine process could not be launched or reached.
    Launch {
        /// Human-readable description.
        reason: String,
    },
    /// The engine rejected the replay (version mismatch, corrupt file).
    ReplayRejected {
        /// Human-readable description.
        reason: String,
    },
    /// The engine answered with something the client did not expect.
    Protocol {
        /// Human-readable description.
        detail: String,
    },
    /// A raw action has no stable mapping to a named ability.
    UnresolvableAction {
        /// Human-readable description.
        detail: String,
    },
    /// The connection dropped mid-session.
    ConnectionLost,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Launch { reason } => write!(f, "failed to launch engine: {reason}"),
            Self::ReplayRejected { reason } => write!(f, "replay rejected: {reason}"),
            Self::Protocol { detail } => write!(f, "protocol error: {detail}"),
            Self::UnresolvableAction { detail } => {
                write!(f, "action has no ability mapping: {detail}")
            }
            Self::ConnectionLost => write!(f, "connection to engine lost"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for EngineError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// A feature layer image could not be unpacked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerError {
    /// Pixel depth other than 1, 8, 16 or 32 bits.
    UnsupportedBitsPerPixel {
        /// The reported depth.
        bits: u32,
    },
    /// Fewer pixels than the declared size.
    Truncated {
        /// Pixels required by the declared size.
        expected: usize,
        /// Pixels present in the payload.
        actual: usize,
    },
}

impl fmt::Display for LayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedBitsPerPixel { bits } => {
                write!(f, "unsupported pixel depth {bits} bits")
            }
            Self::Truncated { expected, actual } => {
                write!(f, "image truncated: expected {expected} pixels, got {actual}")
            }
        }
    }
}

impl Error for LayerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_chain_source() {
        let err = EngineError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(err.to_string().contains("gone"));
        assert!(err.source().is_some());
    }

    #[test]
    fn display_includes_detail() {
        let err = EngineError::ReplayRejected {
            reason: "base build 4.10".into(),
        };
        assert_eq!(err.to_string(), "replay rejected: base build 4.10");
        assert!(err.source().is_none());
    }
}
