//! k-means clustering over node features.
//!
//! Lloyd iterations seeded with k-means++ (Arthur & Vassilvitskii, 2007).
//! Several independent restarts are run and the lowest-inertia solution is
//! kept. The RNG is seeded, so a given input always clusters the same way.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};
use rand::prelude::*;
use rand_xorshift::XorShiftRng;

/// k-means configuration.
#[derive(Debug, Clone, Copy)]
pub struct KMeansConfig {
    /// Number of clusters.
    pub n_clusters: usize,
    /// Independent restarts (default: 10).
    pub n_init: usize,
    /// Lloyd iterations per restart (default: 300).
    pub max_iter: usize,
    /// Relative tolerance on centre movement (default: 1e-4).
    pub tolerance: f64,
    /// Random seed (default: 42).
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_clusters: 5,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

impl KMeansConfig {
    pub fn with_clusters(mut self, k: usize) -> Self {
        self.n_clusters = k;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Fitted clustering.
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster label per row.
    pub labels: Vec<usize>,
    /// `k x F` cluster centres.
    pub centers: Array2<f64>,
    /// Sum of squared distances to the assigned centre.
    pub inertia: f64,
    /// Lloyd iterations used by the kept restart.
    pub iterations: usize,
}

impl KMeansResult {
    /// Number of rows assigned to each cluster.
    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centers.nrows()];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }
}

/// Cluster the rows of `x`.
///
/// # Errors
///
/// `n_clusters` of zero or larger than the number of rows.
pub fn kmeans(x: ArrayView2<'_, f32>, config: &KMeansConfig) -> Result<KMeansResult> {
    let n = x.nrows();
    let k = config.n_clusters;
    if k == 0 {
        return Err(Error::InvalidConfig("n_clusters must be at least 1".into()));
    }
    if n < k {
        return Err(Error::InvalidConfig(format!(
            "node count {n} is smaller than cluster count {k}"
        )));
    }

    let data = x.mapv(f64::from);
    let tol = scaled_tolerance(&data, config.tolerance);
    let mut rng = XorShiftRng::seed_from_u64(config.seed);

    let mut best: Option<KMeansResult> = None;
    for _ in 0..config.n_init.max(1) {
        let centers = kmeans_plus_plus(&data, k, &mut rng);
        let run = lloyd(&data, centers, config.max_iter, tol);
        if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
            best = Some(run);
        }
    }
    best.ok_or(Error::Empty("kmeans restarts"))
}

/// Tolerance relative to the mean per-feature variance, as scikit-learn does.
#[allow(clippy::cast_precision_loss)]
fn scaled_tolerance(data: &Array2<f64>, tol: f64) -> f64 {
    let (n, f) = data.dim();
    if n == 0 || f == 0 {
        return 0.0;
    }
    let n_f = n as f64;
    let mean_var = data
        .columns()
        .into_iter()
        .map(|col| {
            let mean = col.sum() / n_f;
            col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n_f
        })
        .sum::<f64>()
        / f as f64;
    mean_var * tol
}

fn sq_dist(a: ndarray::ArrayView1<'_, f64>, b: ndarray::ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn kmeans_plus_plus(data: &Array2<f64>, k: usize, rng: &mut XorShiftRng) -> Array2<f64> {
    let (n, f) = data.dim();
    let mut centers = Array2::<f64>::zeros((k, f));
    let first = rng.gen_range(0..n);
    centers.row_mut(0).assign(&data.row(first));

    let mut closest: Vec<f64> = (0..n)
        .map(|i| sq_dist(data.row(i), centers.row(0)))
        .collect();

    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = n - 1;
            for (i, &d) in closest.iter().enumerate() {
                if target < d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        } else {
            // every point coincides with an existing centre
            rng.gen_range(0..n)
        };
        centers.row_mut(c).assign(&data.row(pick));
        for (i, d) in closest.iter_mut().enumerate() {
            *d = d.min(sq_dist(data.row(i), centers.row(c)));
        }
    }
    centers
}

#[allow(clippy::cast_precision_loss)]
fn lloyd(data: &Array2<f64>, mut centers: Array2<f64>, max_iter: usize, tol: f64) -> KMeansResult {
    let (n, f) = data.dim();
    let k = centers.nrows();
    let mut labels = vec![0usize; n];
    let mut iterations = 0;

    for iter in 0..max_iter.max(1) {
        iterations = iter + 1;
        assign(data, &centers, &mut labels);

        let mut sums = Array2::<f64>::zeros((k, f));
        let mut counts = vec![0usize; k];
        for (i, &l) in labels.iter().enumerate() {
            let mut row = sums.row_mut(l);
            row += &data.row(i);
            counts[l] += 1;
        }

        for c in 0..k {
            if counts[c] == 0 {
                // Re-seed an empty cluster at the point worst served by its centre.
                let far = (0..n)
                    .max_by(|&a, &b| {
                        sq_dist(data.row(a), centers.row(labels[a]))
                            .total_cmp(&sq_dist(data.row(b), centers.row(labels[b])))
                    })
                    .unwrap_or(0);
                sums.row_mut(c).assign(&data.row(far));
                counts[c] = 1;
                labels[far] = c;
            }
        }

        let mut shift = 0.0;
        for c in 0..k {
            let mut new_center = sums.row(c).to_owned();
            new_center /= counts[c] as f64;
            shift += sq_dist(new_center.view(), centers.row(c));
            centers.row_mut(c).assign(&new_center);
        }

        if shift <= tol {
            break;
        }
    }

    assign(data, &centers, &mut labels);
    let inertia = labels
        .iter()
        .enumerate()
        .map(|(i, &l)| sq_dist(data.row(i), centers.row(l)))
        .sum();

    KMeansResult {
        labels,
        centers,
        inertia,
        iterations,
    }
}

fn assign(data: &Array2<f64>, centers: &Array2<f64>, labels: &mut [usize]) {
    for (i, label) in labels.iter_mut().enumerate() {
        let row = data.row(i);
        let mut best = (f64::INFINITY, 0usize);
        for (c, center) in centers.outer_iter().enumerate() {
            let d = sq_dist(row, center);
            if d < best.0 {
                best = (d, c);
            }
        }
        *label = best.1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_blobs() -> Array2<f32> {
        array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.0, 0.2],
            [10.0, 10.0],
            [10.1, 9.9],
            [9.8, 10.2],
        ]
    }

    #[test]
    fn test_separates_blobs() {
        let x = two_blobs();
        let res = kmeans(x.view(), &KMeansConfig::default().with_clusters(2)).unwrap();
        assert_eq!(res.labels[0], res.labels[1]);
        assert_eq!(res.labels[1], res.labels[2]);
        assert_eq!(res.labels[3], res.labels[4]);
        assert_ne!(res.labels[0], res.labels[3]);
        assert_eq!(res.sizes(), vec![3, 3]);
        assert!(res.inertia < 1.0);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let x = two_blobs();
        let cfg = KMeansConfig::default().with_clusters(3);
        let a = kmeans(x.view(), &cfg).unwrap();
        let b = kmeans(x.view(), &cfg).unwrap();
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_too_many_clusters() {
        let x = two_blobs();
        assert!(kmeans(x.view(), &KMeansConfig::default().with_clusters(7)).is_err());
    }

    #[test]
    fn test_duplicate_points() {
        let x = array![[1.0f32, 1.0], [1.0, 1.0], [1.0, 1.0]];
        let res = kmeans(x.view(), &KMeansConfig::default().with_clusters(3)).unwrap();
        assert_eq!(res.labels.len(), 3);
        assert_eq!(res.sizes().iter().sum::<usize>(), 3);
    }
}
