//! Error types for artifact persistence.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use ndarray_npy::{ReadNpzError, WriteNpzError};

/// Errors that can occur while writing or reading artifacts.
#[derive(Debug)]
pub enum StoreError {
    /// A filesystem operation failed.
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Writing an `.npz` archive failed.
    NpzWrite {
        /// Destination file.
        path: PathBuf,
        /// Underlying error.
        source: WriteNpzError,
    },
    /// Reading an `.npz` archive failed.
    NpzRead {
        /// Source file.
        path: PathBuf,
        /// Underlying error.
        source: ReadNpzError,
    },
    /// JSON encoding or decoding failed.
    Json {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// Writing a CSV table failed.
    Csv {
        /// Destination file.
        path: PathBuf,
        /// Underlying error.
        source: csv::Error,
    },
    /// Rows handed to a matrix builder have different lengths.
    RaggedRows {
        /// Offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        actual: usize,
    },
    /// A matrix exceeds the 32-bit index range of the archive format.
    TooLarge {
        /// Non-zero values in the matrix.
        nnz: usize,
    },
    /// A stored matrix is structurally invalid.
    MalformedMatrix {
        /// Source file.
        path: PathBuf,
        /// Human-readable description.
        detail: String,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means a file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::NpzWrite { path, source } => {
                write!(f, "writing {}: {source}", path.display())
            }
            Self::NpzRead { path, source } => write!(f, "reading {}: {source}", path.display()),
            Self::Json { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Csv { path, source } => write!(f, "writing {}: {source}", path.display()),
            Self::RaggedRows {
                row,
                expected,
                actual,
            } => write!(f, "row {row} has {actual} columns, expected {expected}"),
            Self::TooLarge { nnz } => {
                write!(f, "matrix with {nnz} non-zeros exceeds 32-bit indices")
            }
            Self::MalformedMatrix { path, detail } => {
                write!(f, "malformed matrix {}: {detail}", path.display())
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::NpzWrite { source, .. } => Some(source),
            Self::NpzRead { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::RaggedRows { .. } | Self::TooLarge { .. } | Self::MalformedMatrix { .. } => None,
        }
    }
}
