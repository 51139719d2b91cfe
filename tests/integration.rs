//! Integration tests for KMeansForge

use image::{Rgb, RgbImage};
use kmeansforge::compress::{self, ChannelScale};
use kmeansforge::{fit_kmeans, load_points_csv, sample_points, KMeansParams, RunState, Seed};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

/// Create a CSV file with two well separated groups and some junk lines
fn create_test_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "x,y").unwrap();
    for i in 0..10 {
        let jitter = i as f64 * 0.05;
        writeln!(file, "{},{}", 1.0 + jitter, 1.0 - jitter).unwrap();
        writeln!(file, "{},{}", 20.0 - jitter, 15.0 + jitter).unwrap();
    }
    writeln!(file).unwrap();
    writeln!(file, "oops").unwrap();
    file
}

#[test]
fn test_csv_to_clusters() {
    let file = create_test_csv();
    let points = load_points_csv(file.path()).unwrap();
    assert_eq!(points.dim(), (20, 2));

    let params = KMeansParams::new(2, Seed::Fixed(8)).max_iterations(25);
    let model = fit_kmeans(&points, &params).unwrap();

    assert_eq!(model.state, RunState::Converged);
    assert_eq!(model.cluster_sizes().iter().sum::<usize>(), 20);
    for i in (0..20).step_by(2) {
        assert_eq!(model.labels[i], model.labels[0]);
        assert_ne!(model.labels[i + 1], model.labels[0]);
    }
}

#[test]
fn test_sample_scenario() {
    let points = sample_points();
    let params = KMeansParams::new(2, Seed::Fixed(1)).max_iterations(10);
    let model = fit_kmeans(&points, &params).unwrap();

    let mut sizes = model.cluster_sizes();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![2, 5]);
    assert!(model.cost.is_finite() && model.cost > 0.0);
}

#[test]
fn test_image_round_trip_uses_only_palette_colors() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.png");
    let output = dir.path().join("output.png");

    let img = RgbImage::from_fn(24, 18, |x, y| {
        Rgb([(x * 10) as u8, (y * 13) as u8, ((x + y) * 5) as u8])
    });
    img.save(&input).unwrap();

    let params = KMeansParams::new(5, Seed::Fixed(21)).max_iterations(30);
    let (_original, compressed, report) =
        compress::compress_image(&input, &output, &params, ChannelScale::Byte).unwrap();

    let decoded = compress::load_rgb(&output).unwrap();
    assert_eq!(decoded.dimensions(), (24, 18));
    assert_eq!(decoded, compressed);
    for pixel in decoded.pixels() {
        assert!(report.palette.contains(pixel), "{pixel:?} not in palette");
    }
}

#[test]
fn test_test_pattern_compresses_losslessly() {
    let img = compress::test_pattern(20);
    let params = KMeansParams::new(1, Seed::Fixed(0));
    let (out, report) = compress::quantize(&img, &params, ChannelScale::Byte).unwrap();

    // a single color is the rounded mean of the four quadrants
    assert_eq!(report.palette.len(), 1);
    assert_eq!(report.palette[0], Rgb([128, 128, 64]));
    assert!(out.pixels().all(|p| *p == report.palette[0]));
}

#[test]
fn test_unreadable_inputs_fail() {
    let dir = tempdir().unwrap();
    assert!(load_points_csv(dir.path().join("nope.csv")).is_err());
    assert!(compress::load_rgb(dir.path().join("nope.png")).is_err());
}
