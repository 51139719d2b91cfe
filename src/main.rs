//! KMeansForge command-line entrypoint
//!
//! Parses arguments, sets up logging and dispatches to the image
//! quantization, 2D visualization and plain clustering pipelines.

use anyhow::{Context, Result};
use clap::Parser;
use kmeansforge::cli::{channel_scale, kmeans_params, Args, Command};
use kmeansforge::{compress, data, fit_kmeans, viz, FrameStyle};
use ndarray::Array2;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Compress {
            input,
            output,
            k,
            max_iterations,
            seed,
            normalize,
            palette,
            compare,
            no_labels,
        } => {
            let params = kmeans_params(k, max_iterations, seed);
            run_compress(
                &input,
                &output,
                &params,
                channel_scale(normalize),
                palette.as_deref(),
                compare.as_deref(),
                !no_labels,
            )
        }
        Command::Visualize {
            k,
            iterations,
            csv,
            output,
            plot,
            sizes,
            seed,
            data_seed,
            delay_ms,
            no_labels,
        } => {
            let points = load_or_generate(csv.as_deref(), data_seed)?;
            let params = kmeans_params(k, iterations, seed).record_history(true);
            let style = FrameStyle {
                annotate: !no_labels,
                ..FrameStyle::default()
            };
            run_visualize(&points, &params, &output, plot, sizes, delay_ms, &style)
        }
        Command::Cluster {
            csv,
            clusters,
            max_iters,
            seed,
        } => {
            let points = match csv {
                Some(path) => data::load_points_csv(&path)?,
                None => data::sample_points(),
            };
            run_cluster(&points, &kmeans_params(clusters, max_iters, seed))
        }
        Command::Compare {
            original,
            compressed,
            output,
            no_labels,
        } => {
            let left = compress::load_rgb(&original)?;
            let right = compress::load_rgb(&compressed)?;
            let captions = (!no_labels).then_some(["Original", "Compressed"]);
            save_image(&compress::side_by_side(&left, &right, captions)?, &output)?;
            println!("✓ Comparison saved to: {}", output.display());
            Ok(())
        }
        Command::TestImage { output, size } => {
            save_image(&compress::test_pattern(size), &output)?;
            println!(
                "✓ Test image created: {} ({}x{}, 4 colors)",
                output.display(),
                size,
                size
            );
            Ok(())
        }
    }
}

/// Quantize an image and optionally write its palette and a comparison
fn run_compress(
    input: &Path,
    output: &Path,
    params: &kmeansforge::KMeansParams,
    scale: kmeansforge::ChannelScale,
    palette_path: Option<&Path>,
    compare_path: Option<&Path>,
    annotate: bool,
) -> Result<()> {
    println!("=== Image Compression ===\n");
    let start_time = Instant::now();

    let (original, compressed, report) = compress::compress_image(input, output, params, scale)?;

    println!(
        "✓ Image loaded: {}x{} ({} pixels)",
        report.width,
        report.height,
        report.pixel_count()
    );
    println!(
        "✓ K-Means finished: {} colors, {} iterations ({:?})",
        params.n_clusters, report.iterations, report.state
    );
    println!("  Seed: {}", report.seed);
    println!("  Final cost: {:.4}", report.cost);

    println!("\nFinal colors (RGB):");
    for (i, color) in report.palette.iter().enumerate() {
        println!("  Color {}: ({}, {}, {})", i, color[0], color[1], color[2]);
    }

    if let Some(path) = palette_path {
        let cols = (report.palette.len() as u32).min(8);
        save_image(&compress::palette_swatch(&report.palette, 40, cols, annotate)?, path)?;
        println!("\n✓ Palette saved to: {}", path.display());
    }
    if let Some(path) = compare_path {
        let right_caption = format!("Compressed (K={})", params.n_clusters);
        let captions = annotate.then_some(["Original", right_caption.as_str()]);
        save_image(&compress::side_by_side(&original, &compressed, captions)?, path)?;
        println!("✓ Comparison saved to: {}", path.display());
    }

    println!("\nCompressed image saved to: {}", output.display());
    println!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Fit with history and render the animation plus optional stills
fn run_visualize(
    points: &Array2<f64>,
    params: &kmeansforge::KMeansParams,
    output: &Path,
    plot: Option<PathBuf>,
    sizes: Option<PathBuf>,
    delay_ms: u32,
    style: &FrameStyle,
) -> Result<()> {
    println!("=== 2D K-Means Visualization ===\n");
    let start_time = Instant::now();

    let model = fit_kmeans(points, params)?;
    println!("✓ Model fitted: seed {}", model.seed);

    let frames = viz::render_animation(points, &model, output, delay_ms, style)?;
    println!("✓ Animation saved to: {} ({} frames)", output.display(), frames);

    if let Some(path) = plot {
        viz::create_cluster_visualization(points, &model, &path, style)?;
        println!("✓ Final plot saved to: {}", path.display());
    }
    if let Some(path) = sizes {
        viz::create_cluster_size_chart(&model, &path, style)?;
        println!("✓ Cluster sizes saved to: {}", path.display());
    }

    viz::print_cluster_statistics(points, &model);
    println!("\nTotal processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

fn run_cluster(points: &Array2<f64>, params: &kmeansforge::KMeansParams) -> Result<()> {
    let model = fit_kmeans(points, params)?;

    println!("Centroids:");
    for centroid in model.centroids.outer_iter() {
        let coords: Vec<String> = centroid.iter().map(|v| v.to_string()).collect();
        println!("{}", coords.join(" "));
    }

    println!("Assignments:");
    let labels: Vec<String> = model.labels.iter().map(|l| l.to_string()).collect();
    println!("{}", labels.join(" "));

    println!("Final cost: {}", model.cost);
    println!("Iterations: {} ({:?}, seed {})", model.iterations, model.state, model.seed);
    Ok(())
}

fn load_or_generate(csv: Option<&Path>, data_seed: u64) -> Result<Array2<f64>> {
    match csv {
        Some(path) => {
            let points = data::load_points_csv(path)?;
            println!("✓ Loaded {} points from {}", points.nrows(), path.display());
            Ok(points)
        }
        None => {
            let points = data::synthetic_blobs(data_seed)?;
            println!("✓ Generated {} points in 8 blobs plus noise", points.nrows());
            Ok(points)
        }
    }
}

fn save_image(img: &image::RgbImage, path: &Path) -> Result<()> {
    img.save(path)
        .with_context(|| format!("cannot write image {}", path.display()))
}
