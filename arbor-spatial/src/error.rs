//! Error types for the spatial layer.

use thiserror::Error;

/// Spatial errors.
#[derive(Error, Debug)]
pub enum SpatialError {
    /// WKT parsing error.
    #[error("WKT parse error: {0}")]
    WktParse(String),

    /// Invalid geometry (e.g., self-intersecting polygon). Recoverable:
    /// relation tests surface this and callers treat it as "no relation".
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Persisted layer format error (corrupt or incompatible version).
    #[error("Layer format error: {0}")]
    FormatError(String),

    /// Storage error from the persistence seam.
    #[error("Storage error: {0}")]
    Storage(#[from] arbor_core::Error),

    /// IO error during encode/decode.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for spatial operations.
pub type Result<T> = std::result::Result<T, SpatialError>;
