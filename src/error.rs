//! Errors raised at the clustering engine boundary.

use thiserror::Error;

/// Errors returned by the K-means engine.
#[derive(Debug, Error, PartialEq)]
pub enum KMeansError {
    /// The point set has no rows.
    #[error("empty input: at least one point is required")]
    EmptyInput,

    /// A run parameter is out of range.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// More clusters were requested than there are points to seed them.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_points} points")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of points in the dataset.
        n_points: usize,
    },

    /// A point or centroid has the wrong number of coordinates.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },
}

/// Result type used by the engine.
pub type KMeansResult<T> = std::result::Result<T, KMeansError>;
