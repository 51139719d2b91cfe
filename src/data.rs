//! Point set sources: CSV files, the synthetic demo dataset and a tiny sample

use anyhow::Context;
use csv::{ReaderBuilder, Trim};
use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Uniform};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Seed used for the synthetic dataset unless the caller picks another
pub const DEFAULT_DATA_SEED: u64 = 42;

/// Gaussian blobs of the demo dataset: (mean x, sd x, mean y, sd y, count)
const BLOBS: [(f64, f64, f64, f64, usize); 8] = [
    (2.0, 0.8, 6.0, 0.6, 120),
    (8.0, 0.7, 6.5, 0.5, 100),
    (1.5, 0.6, 3.5, 0.8, 90),
    (5.0, 0.9, 4.0, 0.7, 110),
    (8.5, 0.5, 1.5, 0.6, 80),
    (2.5, 0.7, 1.0, 0.5, 85),
    (9.0, 0.6, 4.5, 0.8, 95),
    (5.5, 0.5, 7.0, 0.4, 75),
];

const NOISE_POINTS: usize = 45;

/// Load 2D points from a CSV file of `x,y` lines
///
/// # Arguments
/// * `file_path` - Path to the CSV file (no header row)
///
/// # Returns
/// * `(m, 2)` matrix of the valid rows; fails only if the file is unreadable
///   or no row parses
pub fn load_points_csv<P: AsRef<Path>>(file_path: P) -> crate::Result<Array2<f64>> {
    let path = file_path.as_ref();
    let file = File::open(path).with_context(|| format!("cannot read {}", path.display()))?;
    parse_points_csv(file).with_context(|| format!("no usable points in {}", path.display()))
}

/// Parse `x,y` records from any reader.
///
/// Blank lines are ignored. Records with fewer than two fields or a
/// non-numeric coordinate are skipped with a warning. Extra fields are ignored.
pub fn parse_points_csv<R: Read>(reader: R) -> crate::Result<Array2<f64>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut coords = Vec::new();
    let mut skipped = 0usize;

    for record in rdr.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                warn!(error = %err, "skipping unreadable record");
                skipped += 1;
                continue;
            }
        };
        let line = record.position().map_or(0, |pos| pos.line());

        let parsed = match (record.get(0), record.get(1)) {
            (Some(x), Some(y)) => parse_coordinate(x).zip(parse_coordinate(y)),
            _ => None,
        };

        match parsed {
            Some((x, y)) => coords.extend_from_slice(&[x, y]),
            None => {
                warn!(line, record = ?record.iter().collect::<Vec<_>>(), "skipping malformed record");
                skipped += 1;
            }
        }
    }

    if coords.is_empty() {
        anyhow::bail!("no valid x,y records found");
    }

    let n_points = coords.len() / 2;
    debug!(n_points, skipped, "parsed csv points");
    Ok(Array2::from_shape_vec((n_points, 2), coords)?)
}

/// A finite coordinate; `nan` and `inf` spellings are rejected
fn parse_coordinate(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Eight Gaussian blobs plus uniform noise, 800 points in total
pub fn synthetic_blobs(seed: u64) -> crate::Result<Array2<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let total = BLOBS.iter().map(|b| b.4).sum::<usize>() + NOISE_POINTS;
    let mut coords = Vec::with_capacity(total * 2);

    for &(mx, sx, my, sy, count) in BLOBS.iter() {
        let dx = Normal::new(mx, sx)?;
        let dy = Normal::new(my, sy)?;
        for _ in 0..count {
            coords.push(dx.sample(&mut rng));
            coords.push(dy.sample(&mut rng));
        }
    }

    let nx = Uniform::new(0.5, 10.0);
    let ny = Uniform::new(0.5, 8.0);
    for _ in 0..NOISE_POINTS {
        coords.push(nx.sample(&mut rng));
        coords.push(ny.sample(&mut rng));
    }

    Ok(Array2::from_shape_vec((total, 2), coords)?)
}

/// Seven hand-picked points forming one tight pair and one loose group of five
pub fn sample_points() -> Array2<f64> {
    array![
        [1.0, 1.0],
        [1.5, 2.0],
        [3.0, 4.0],
        [5.0, 7.0],
        [3.5, 5.0],
        [4.5, 5.0],
        [3.5, 4.5],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_skips_blank_and_malformed_lines() {
        let text = "1,2\n\n3.5, 4.5\nfoo,bar\n7\n-1e1,0,ignored\n";
        let points = parse_points_csv(text.as_bytes()).unwrap();

        assert_eq!(points.dim(), (3, 2));
        assert_eq!(points.row(0).to_vec(), vec![1.0, 2.0]);
        assert_eq!(points.row(1).to_vec(), vec![3.5, 4.5]);
        assert_eq!(points.row(2).to_vec(), vec![-10.0, 0.0]);
    }

    #[test]
    fn test_parse_skips_non_finite_coordinates() {
        let text = "1,1\nnan,1\n2,inf\n-inf,3\nNaN,NaN\n5,5\n";
        let points = parse_points_csv(text.as_bytes()).unwrap();

        assert_eq!(points.dim(), (2, 2));
        assert!(points.iter().all(|v| v.is_finite()));
        assert_eq!(points.row(1).to_vec(), vec![5.0, 5.0]);
    }

    #[test]
    fn test_parse_fails_without_valid_points() {
        assert!(parse_points_csv("x,y\nabc,def\n".as_bytes()).is_err());
        assert!(parse_points_csv("".as_bytes()).is_err());
    }

    #[test]
    fn test_load_points_csv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0.5,0.25").unwrap();
        writeln!(file, "x,y").unwrap();
        writeln!(file, "2,3").unwrap();

        let points = load_points_csv(file.path()).unwrap();
        assert_eq!(points.nrows(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_points_csv("/definitely/not/here.csv");
        assert!(result.is_err());
    }

    #[test]
    fn test_synthetic_blobs_are_reproducible() {
        let a = synthetic_blobs(DEFAULT_DATA_SEED).unwrap();
        let b = synthetic_blobs(DEFAULT_DATA_SEED).unwrap();
        assert_eq!(a.dim(), (800, 2));
        assert_eq!(a, b);
        assert_ne!(a, synthetic_blobs(7).unwrap());
    }
}
