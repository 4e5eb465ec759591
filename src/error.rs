//! Error types for map-graph generation

use std::fmt;

/// Errors that can occur during map-graph generation
///
/// All variants are fatal: generation is a single-shot batch computation
/// with no retry path, so a failed `generate()` leaves no partial graph.
/// Recoverable conditions (an edge dropped during clipping, watershed
/// propagation hitting its iteration cap) are handled internally and never
/// surface as errors.
#[derive(Debug, Clone)]
pub enum MapError {
    /// Configuration validation failed
    InvalidConfig(String),
    /// Degenerate or insufficient input sites (fewer than three
    /// non-collinear points, duplicates, or sites outside the bounding box)
    InvalidInput(String),
    /// Only point sites are supported
    UnsupportedSite(String),
    /// A clipped cell could not be stitched back into a closed loop
    Closure {
        /// Index of the cell whose boundary could not be closed
        cell: usize,
        /// Human-readable description of the failure
        detail: String,
    },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            MapError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            MapError::UnsupportedSite(msg) => write!(f, "unsupported site: {}", msg),
            MapError::Closure { cell, detail } => {
                write!(f, "cell {} could not be closed: {}", cell, detail)
            }
        }
    }
}

impl std::error::Error for MapError {}

/// Result type alias for map-graph operations
pub type Result<T> = std::result::Result<T, MapError>;
