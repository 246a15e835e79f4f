//! Derived relationship graphs.
//!
//! When a caller has no explicit edge list, relationships are inferred from
//! the data itself:
//!
//! | Builder | Signal | Edge rule |
//! |---------|--------|-----------|
//! | [`correlation_graph`] | returns matrix `N x T` | `abs(rho_ij) > threshold` |
//! | [`knn_graph`] | feature matrix `N x F` | `j` among the `k` nearest of `i`, or vice versa |
//! | [`sector_graph`] | one label per node | same label |
//!
//! All builders return loop-free symmetric 0/1 matrices; callers add
//! self-loops afterwards with [`add_self_loops`](crate::adjacency::add_self_loops).

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};

/// Pearson correlation between every pair of rows.
///
/// Rows with zero variance produce `NaN` correlations, like `numpy.corrcoef`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn correlation_matrix(rows: ArrayView2<'_, f32>) -> Array2<f64> {
    let (n, t) = rows.dim();
    let t_f = t as f64;

    // Center each row once, then every pair is a dot product.
    let mut centered = Array2::<f64>::zeros((n, t));
    let mut norms = vec![0.0f64; n];
    for (i, row) in rows.outer_iter().enumerate() {
        let mean = row.iter().map(|&v| f64::from(v)).sum::<f64>() / t_f;
        for (k, &v) in row.iter().enumerate() {
            centered[[i, k]] = f64::from(v) - mean;
        }
        norms[i] = centered.row(i).dot(&centered.row(i)).sqrt();
    }

    let mut corr = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in i..n {
            let r = centered.row(i).dot(&centered.row(j)) / (norms[i] * norms[j]);
            corr[[i, j]] = r;
            corr[[j, i]] = r;
        }
    }
    corr
}

/// Relationship graph from return co-movement.
///
/// `returns` is `N x T` (one return series per node). An edge joins `i` and
/// `j` when `abs(rho_ij) > threshold`; undefined correlations never form
/// edges and the diagonal is cleared.
///
/// # Errors
///
/// Fewer than two observations per node, or a threshold outside `[0, 1]`.
pub fn correlation_graph(returns: ArrayView2<'_, f32>, threshold: f64) -> Result<Array2<f32>> {
    if returns.ncols() < 2 {
        return Err(Error::InvalidConfig(format!(
            "correlation needs at least 2 observations per node, got {}",
            returns.ncols()
        )));
    }
    if !(0.0..=1.0).contains(&threshold) {
        return Err(Error::InvalidConfig(format!(
            "correlation threshold must be in [0, 1], got {threshold}"
        )));
    }

    let corr = correlation_matrix(returns);
    let n = corr.nrows();
    let mut adj = corr.mapv(|r| if r.abs() > threshold { 1.0f32 } else { 0.0 });
    for i in 0..n {
        adj[[i, i]] = 0.0;
    }
    Ok(adj)
}

/// k-nearest-neighbour connectivity graph.
///
/// Each node is linked to its `k` nearest other nodes by Euclidean distance
/// (ties broken by lower index), then the graph is made undirected by
/// element-wise max with its transpose. `k` is clamped to `N - 1`.
///
/// # Errors
///
/// `k == 0`.
pub fn knn_graph(features: ArrayView2<'_, f32>, k: usize) -> Result<Array2<f32>> {
    if k == 0 {
        return Err(Error::InvalidConfig("knn k must be at least 1".into()));
    }
    let n = features.nrows();
    let k = k.min(n.saturating_sub(1));
    let mut adj = Array2::<f32>::zeros((n, n));

    for i in 0..n {
        let anchor = features.row(i);
        let mut dists: Vec<(f64, usize)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| {
                let d2: f64 = anchor
                    .iter()
                    .zip(features.row(j).iter())
                    .map(|(&a, &b)| {
                        let d = f64::from(a) - f64::from(b);
                        d * d
                    })
                    .sum();
                (d2, j)
            })
            .collect();
        dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for &(_, j) in dists.iter().take(k) {
            adj[[i, j]] = 1.0;
            adj[[j, i]] = 1.0;
        }
    }
    Ok(adj)
}

/// Connect nodes that share a sector label.
#[must_use]
pub fn sector_graph<S: AsRef<str>>(sectors: &[S]) -> Array2<f32> {
    let n = sectors.len();
    let mut adj = Array2::<f32>::zeros((n, n));
    for i in 0..n {
        for j in i + 1..n {
            if sectors[i].as_ref() == sectors[j].as_ref() {
                adj[[i, j]] = 1.0;
                adj[[j, i]] = 1.0;
            }
        }
    }
    adj
}
