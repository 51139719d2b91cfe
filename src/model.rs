//! K-Means engine: Lloyd's algorithm over dense point matrices
//!
//! A point set is an `m × d` matrix with one point per row. A run seeds `K`
//! centroids from distinct rows, then alternates [`assign`] and [`update`]
//! until the assignment stops changing or the iteration budget runs out.

use crate::error::{KMeansError, KMeansResult};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Iteration budget used when none is given.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Source of the initial centroid sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    /// Reproducible run.
    Fixed(u64),
    /// Draw a fresh seed from the thread RNG.
    Entropy,
}

impl Seed {
    /// Resolve to a concrete seed value, drawing one if needed.
    pub fn resolve(self) -> u64 {
        match self {
            Seed::Fixed(seed) => seed,
            Seed::Entropy => rand::thread_rng().gen(),
        }
    }
}

impl From<Option<u64>> for Seed {
    fn from(seed: Option<u64>) -> Self {
        seed.map_or(Seed::Entropy, Seed::Fixed)
    }
}

/// Parameters for a single K-Means run
#[derive(Debug, Clone)]
pub struct KMeansParams {
    /// Number of clusters (K)
    pub n_clusters: usize,
    /// Upper bound on assign steps
    pub max_iterations: usize,
    /// Seed for the initial sample
    pub seed: Seed,
    /// Keep a snapshot of every assign step (for animation)
    pub record_history: bool,
}

impl KMeansParams {
    pub fn new(n_clusters: usize, seed: Seed) -> Self {
        Self {
            n_clusters,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed,
            record_history: false,
        }
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn record_history(mut self, record_history: bool) -> Self {
        self.record_history = record_history;
        self
    }

    fn validate(&self, points: &Array2<f64>) -> KMeansResult<()> {
        if points.nrows() == 0 {
            return Err(KMeansError::EmptyInput);
        }
        if self.n_clusters == 0 {
            return Err(KMeansError::InvalidParameter {
                name: "n_clusters",
                message: "must be at least 1",
            });
        }
        if self.max_iterations == 0 {
            return Err(KMeansError::InvalidParameter {
                name: "max_iterations",
                message: "must be at least 1",
            });
        }
        if self.n_clusters > points.nrows() {
            return Err(KMeansError::InvalidClusterCount {
                requested: self.n_clusters,
                n_points: points.nrows(),
            });
        }
        Ok(())
    }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Initializing,
    Iterating,
    /// Two consecutive assign steps produced the same labels.
    Converged,
    /// The iteration budget ran out first.
    Exhausted,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Converged | RunState::Exhausted)
    }
}

/// Centroids used by one assign step together with the labels it produced.
#[derive(Debug, Clone)]
pub struct IterationSnapshot {
    /// 1-based assign step
    pub iteration: usize,
    pub centroids: Array2<f64>,
    pub labels: Array1<usize>,
}

/// Outcome of a K-Means run
#[derive(Debug, Clone)]
pub struct KMeansModel {
    /// Number of clusters
    pub n_clusters: usize,
    /// Final centroids, one row per cluster
    pub centroids: Array2<f64>,
    /// Cluster label for every input point
    pub labels: Array1<usize>,
    /// Assign steps actually performed
    pub iterations: usize,
    /// Sum of squared distances from each point to its centroid
    pub cost: f64,
    /// Terminal state (converged or exhausted)
    pub state: RunState,
    /// Seed the initial sample was drawn with
    pub seed: u64,
    /// Centroids sampled by [`initialize`]
    pub initial_centroids: Array2<f64>,
    /// Per-step snapshots, empty unless history was requested
    pub history: Vec<IterationSnapshot>,
}

impl KMeansModel {
    /// Nearest centroid for a new point
    pub fn predict(&self, point: &ArrayView1<f64>) -> KMeansResult<usize> {
        let dim = self.centroids.ncols();
        if point.len() != dim {
            return Err(KMeansError::DimensionMismatch {
                expected: dim,
                found: point.len(),
            });
        }
        Ok(nearest_centroid(point, &self.centroids).0)
    }

    /// Get cluster sizes
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.labels.iter() {
            sizes[label] += 1;
        }
        sizes
    }

    pub fn converged(&self) -> bool {
        self.state == RunState::Converged
    }

    /// Mean silhouette coefficient over the first `sample_size` points
    pub fn compute_silhouette_sample(&self, points: &Array2<f64>, sample_size: usize) -> f64 {
        let n_samples = points.nrows().min(sample_size);
        if n_samples < 2 {
            return 0.0;
        }

        let mut silhouette_sum = 0.0;

        for i in 0..n_samples {
            let point = points.row(i);
            let own = self.labels[i];

            let mut same = (0.0, 0usize);
            let mut other = vec![(0.0, 0usize); self.n_clusters];

            for j in 0..n_samples {
                if i == j {
                    continue;
                }
                let distance = squared_distance(&point, &points.row(j)).sqrt();
                let label = self.labels[j];
                let slot = if label == own { &mut same } else { &mut other[label] };
                slot.0 += distance;
                slot.1 += 1;
            }

            // a(i): mean distance within the own cluster
            let a_i = if same.1 == 0 { 0.0 } else { same.0 / same.1 as f64 };

            // b(i): smallest mean distance to another cluster
            let b_i = other
                .iter()
                .filter(|(_, count)| *count > 0)
                .map(|(sum, count)| sum / *count as f64)
                .fold(f64::INFINITY, f64::min);

            silhouette_sum += if b_i.is_infinite() || (a_i == 0.0 && b_i == 0.0) {
                0.0
            } else {
                (b_i - a_i) / a_i.max(b_i)
            };
        }

        silhouette_sum / n_samples as f64
    }
}

/// Squared Euclidean distance between two points of equal dimension
#[inline]
pub fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Sample `k` distinct rows of `points` as starting centroids.
///
/// The rows are the first `k` entries of a uniformly shuffled index
/// permutation, so the result depends only on the RNG state.
pub fn initialize<R: Rng + ?Sized>(
    points: &Array2<f64>,
    k: usize,
    rng: &mut R,
) -> KMeansResult<Array2<f64>> {
    let m = points.nrows();
    if m == 0 {
        return Err(KMeansError::EmptyInput);
    }
    if k == 0 {
        return Err(KMeansError::InvalidParameter {
            name: "n_clusters",
            message: "must be at least 1",
        });
    }
    if k > m {
        return Err(KMeansError::InvalidClusterCount {
            requested: k,
            n_points: m,
        });
    }

    let mut order: Vec<usize> = (0..m).collect();
    order.shuffle(rng);
    Ok(points.select(Axis(0), &order[..k]))
}

/// Label every point with its closest centroid.
///
/// On equal distances the lower centroid index wins.
///
/// # Panics
/// If `points` and `centroids` differ in width.
pub fn assign(points: &Array2<f64>, centroids: &Array2<f64>) -> Array1<usize> {
    assert_eq!(points.ncols(), centroids.ncols(), "point and centroid widths differ");
    points
        .outer_iter()
        .map(|point| nearest_centroid(&point, centroids).0)
        .collect()
}

fn nearest_centroid(point: &ArrayView1<f64>, centroids: &Array2<f64>) -> (usize, f64) {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (j, centroid) in centroids.outer_iter().enumerate() {
        let distance = squared_distance(point, &centroid);
        if distance < best_distance {
            best_distance = distance;
            best = j;
        }
    }
    (best, best_distance)
}

/// Move each centroid to the mean of the points labelled with it.
///
/// A cluster that received no points keeps its row from `previous`.
///
/// # Panics
/// If `points` and `previous` differ in width, or a label is not below
/// `previous.nrows()`. Labels produced by [`assign`] always are.
pub fn update(points: &Array2<f64>, labels: &Array1<usize>, previous: &Array2<f64>) -> Array2<f64> {
    let (k, d) = previous.dim();
    assert_eq!(points.ncols(), d, "point and centroid widths differ");
    assert!(labels.iter().all(|&l| l < k), "label out of range for {k} clusters");
    let mut sums = Array2::<f64>::zeros((k, d));
    let mut counts = vec![0usize; k];

    for (point, &label) in points.outer_iter().zip(labels.iter()) {
        counts[label] += 1;
        let mut row = sums.row_mut(label);
        row += &point;
    }

    for (cluster, mut row) in sums.outer_iter_mut().enumerate() {
        match counts[cluster] {
            0 => row.assign(&previous.row(cluster)),
            n => row /= n as f64,
        }
    }

    sums
}

/// Sum of squared distances from each point to its assigned centroid
pub fn total_cost(points: &Array2<f64>, labels: &Array1<usize>, centroids: &Array2<f64>) -> f64 {
    points
        .outer_iter()
        .zip(labels.iter())
        .map(|(point, &label)| squared_distance(&point, &centroids.row(label)))
        .sum()
}

/// Run Lloyd's algorithm on `points`
///
/// # Arguments
/// * `points` - One point per row; every row shares the same dimension
/// * `params` - Cluster count, iteration budget, seed and history switch
///
/// # Returns
/// * Fitted `KMeansModel`; fails if the input is empty or `K` exceeds the point count
pub fn fit_kmeans(points: &Array2<f64>, params: &KMeansParams) -> KMeansResult<KMeansModel> {
    params.validate(points)?;

    let seed = params.seed.resolve();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut state = RunState::Initializing;
    debug!(?state, k = params.n_clusters, m = points.nrows(), seed, "sampling centroids");

    let mut centroids = initialize(points, params.n_clusters, &mut rng)?;
    let initial_centroids = centroids.clone();
    state = RunState::Iterating;

    let mut history = Vec::new();
    let mut labels = assign(points, &centroids);
    let mut iterations = 1;
    if params.record_history {
        history.push(IterationSnapshot {
            iteration: iterations,
            centroids: centroids.clone(),
            labels: labels.clone(),
        });
    }

    while state == RunState::Iterating {
        centroids = update(points, &labels, &centroids);
        debug!(
            iteration = iterations,
            cost = total_cost(points, &labels, &centroids),
            "centroids updated"
        );

        if iterations == params.max_iterations {
            state = RunState::Exhausted;
            break;
        }

        let next = assign(points, &centroids);
        iterations += 1;
        if params.record_history {
            history.push(IterationSnapshot {
                iteration: iterations,
                centroids: centroids.clone(),
                labels: next.clone(),
            });
        }

        if next == labels {
            state = RunState::Converged;
        }
        labels = next;
    }

    let cost = total_cost(points, &labels, &centroids);
    info!(?state, iterations, cost, "k-means finished");

    Ok(KMeansModel {
        n_clusters: params.n_clusters,
        centroids,
        labels,
        iterations,
        cost,
        state,
        seed,
        initial_centroids,
        history,
    })
}
