//! KMeansForge: Lloyd's K-means with two front ends
//!
//! The engine in [`model`] clusters any dense point matrix. [`compress`]
//! uses it to reduce images to K colors and [`viz`] renders 2D runs as
//! plots and animated GIFs.

pub mod cli;
pub mod compress;
pub mod data;
pub mod error;
pub mod model;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use compress::{compress_image, quantize, ChannelScale, CompressionReport};
pub use data::{load_points_csv, sample_points, synthetic_blobs};
pub use error::KMeansError;
pub use model::{
    assign, fit_kmeans, initialize, total_cost, update, KMeansModel, KMeansParams, RunState, Seed,
};
pub use viz::{create_cluster_visualization, render_animation, FrameStyle};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
