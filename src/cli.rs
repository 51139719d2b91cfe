//! Command-line interface definitions and argument parsing

use crate::compress::ChannelScale;
use crate::model::{KMeansParams, Seed};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// K-means color quantization and 2D clustering visualizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reduce an image to K colors
    Compress {
        /// Image to read
        input: PathBuf,
        /// Where to write the quantized image (format from extension)
        output: PathBuf,
        /// Number of colors
        k: usize,
        /// Maximum number of iterations
        #[arg(default_value = "20")]
        max_iterations: usize,
        /// Fixed seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
        /// Cluster on channels scaled to 0..1 instead of 0..255
        #[arg(long)]
        normalize: bool,
        /// Also write a swatch of the final palette
        #[arg(long)]
        palette: Option<PathBuf>,
        /// Also write the original and quantized images side by side
        #[arg(long)]
        compare: Option<PathBuf>,
        /// Skip captions and tile numbers on the extra images
        #[arg(long)]
        no_labels: bool,
    },

    /// Animate K-means on 2D points (synthetic blobs or a CSV of x,y lines)
    Visualize {
        /// Number of clusters
        #[arg(default_value = "8")]
        k: usize,
        /// Maximum number of iterations
        #[arg(default_value = "15")]
        iterations: usize,
        /// CSV file with one x,y pair per line
        csv: Option<PathBuf>,
        /// GIF animation output path
        #[arg(short, long, default_value = "kmeans.gif")]
        output: PathBuf,
        /// Also write a PNG of the final state
        #[arg(long)]
        plot: Option<PathBuf>,
        /// Also write a bar chart of cluster sizes
        #[arg(long)]
        sizes: Option<PathBuf>,
        /// Fixed seed for the centroid sample
        #[arg(long)]
        seed: Option<u64>,
        /// Seed for the synthetic dataset
        #[arg(long, default_value = "42")]
        data_seed: u64,
        /// Frame delay in milliseconds
        #[arg(long, default_value = "600")]
        delay_ms: u32,
        /// Skip text captions
        #[arg(long)]
        no_labels: bool,
    },

    /// Cluster points and print centroids, assignments and cost
    Cluster {
        /// CSV file with one x,y pair per line (defaults to a built-in sample)
        csv: Option<PathBuf>,
        /// Number of clusters
        #[arg(short = 'k', long, default_value = "2")]
        clusters: usize,
        /// Maximum iterations
        #[arg(long, default_value = "10")]
        max_iters: usize,
        /// Fixed seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Write two images side by side at a common height
    Compare {
        original: PathBuf,
        compressed: PathBuf,
        output: PathBuf,
        /// Skip the "Original" / "Compressed" captions
        #[arg(long)]
        no_labels: bool,
    },

    /// Write a four-color test image
    TestImage {
        output: PathBuf,
        /// Edge length in pixels
        #[arg(long, default_value = "200")]
        size: u32,
    },
}

/// Build engine parameters from parsed flags
pub fn kmeans_params(k: usize, max_iterations: usize, seed: Option<u64>) -> KMeansParams {
    KMeansParams::new(k, Seed::from(seed)).max_iterations(max_iterations)
}

pub fn channel_scale(normalize: bool) -> ChannelScale {
    if normalize {
        ChannelScale::Unit
    } else {
        ChannelScale::Byte
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_positionals() {
        let args =
            Args::try_parse_from(["kmeansforge", "compress", "in.png", "out.png", "16"]).unwrap();
        match args.command {
            Command::Compress {
                input,
                output,
                k,
                max_iterations,
                seed,
                normalize,
                no_labels,
                ..
            } => {
                assert_eq!(input, PathBuf::from("in.png"));
                assert_eq!(output, PathBuf::from("out.png"));
                assert_eq!(k, 16);
                assert_eq!(max_iterations, 20);
                assert_eq!(seed, None);
                assert!(!normalize);
                assert!(!no_labels);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_visualize_defaults() {
        let args = Args::try_parse_from(["kmeansforge", "-v", "visualize"]).unwrap();
        assert_eq!(args.verbose, 1);
        match args.command {
            Command::Visualize {
                k,
                iterations,
                csv,
                output,
                data_seed,
                ..
            } => {
                assert_eq!(k, 8);
                assert_eq!(iterations, 15);
                assert!(csv.is_none());
                assert_eq!(output, PathBuf::from("kmeans.gif"));
                assert_eq!(data_seed, 42);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_compare_no_labels_flag() {
        let args =
            Args::try_parse_from(["kmeansforge", "compare", "a.png", "b.png", "c.png", "--no-labels"])
                .unwrap();
        assert!(matches!(args.command, Command::Compare { no_labels: true, .. }));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(Args::try_parse_from(["kmeansforge", "compress", "in.png", "out.png"]).is_err());
        assert!(Args::try_parse_from(["kmeansforge", "compress", "in.png", "out.png", "many"]).is_err());
        assert!(Args::try_parse_from(["kmeansforge", "cluster", "--max-iters", "-3"]).is_err());
    }

    #[test]
    fn test_kmeans_params_from_flags() {
        let params = kmeans_params(4, 12, Some(9));
        assert_eq!(params.n_clusters, 4);
        assert_eq!(params.max_iterations, 12);
        assert_eq!(params.seed, Seed::Fixed(9));
        assert_eq!(kmeans_params(4, 12, None).seed, Seed::Entropy);
        assert_eq!(channel_scale(true), ChannelScale::Unit);
    }
}
