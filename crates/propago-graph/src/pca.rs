//! Two-component projection for plotting node clusters.
//!
//! Principal axes are the top eigenvectors of the feature covariance matrix,
//! found by power iteration with deflation. That is plenty for the small
//! feature counts a scoring request carries and avoids a LAPACK dependency.

use ndarray::{Array1, Array2, ArrayView2, Axis};

const POWER_ITERATIONS: usize = 500;
const POWER_TOLERANCE: f64 = 1e-10;

/// 2-D coordinates per row plus the variance ratio each axis explains.
#[derive(Debug, Clone)]
pub struct Projection {
    /// `N x 2` coordinates.
    pub coords: Array2<f64>,
    /// Explained variance ratio of the two axes.
    pub explained_variance_ratio: [f64; 2],
}

/// Project rows of `x` to two dimensions.
///
/// With more than two features this is PCA. With one or two features the
/// raw values are used (a missing second column is 0) and the ratio is
/// reported as `[1.0, 0.0]`.
#[must_use]
pub fn project_2d(x: ArrayView2<'_, f32>) -> Projection {
    let (n, f) = x.dim();
    if f > 2 {
        return pca_2d(x);
    }

    let mut coords = Array2::<f64>::zeros((n, 2));
    for (i, row) in x.outer_iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            coords[[i, j]] = f64::from(v);
        }
    }
    Projection {
        coords,
        explained_variance_ratio: [1.0, 0.0],
    }
}

/// Principal component projection onto the top two axes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pca_2d(x: ArrayView2<'_, f32>) -> Projection {
    let (n, f) = x.dim();
    let data = x.mapv(f64::from);
    let mean = data
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(f));
    let centered = &data - &mean;

    let denom = n.saturating_sub(1).max(1) as f64;
    let mut cov = centered.t().dot(&centered) / denom;
    let total_variance: f64 = cov.diag().sum();

    let mut coords = Array2::<f64>::zeros((n, 2));
    let mut ratios = [0.0; 2];
    let mut axes: Vec<Array1<f64>> = Vec::with_capacity(2);
    for axis in 0..2.min(f) {
        let (eigenvalue, v) = dominant_eigenpair(&cov, &axes, total_variance);
        let projected = centered.dot(&v);
        coords.column_mut(axis).assign(&projected);
        if total_variance > 0.0 {
            ratios[axis] = (eigenvalue / total_variance).max(0.0);
        }

        // deflate: C <- C - lambda v v^T
        for i in 0..f {
            for j in 0..f {
                cov[[i, j]] -= eigenvalue * v[i] * v[j];
            }
        }
        axes.push(v);
    }

    Projection {
        coords,
        explained_variance_ratio: ratios,
    }
}

/// Largest eigenpair of a symmetric PSD matrix, orthogonal to `previous`.
///
/// The returned vector has unit norm and its largest-magnitude entry
/// positive. When the matrix has no variance left relative to `scale`, the
/// eigenvalue is 0 and the vector is all zeros, so projections onto it are 0.
#[allow(clippy::cast_precision_loss)]
fn dominant_eigenpair(m: &Array2<f64>, previous: &[Array1<f64>], scale: f64) -> (f64, Array1<f64>) {
    let f = m.nrows();
    let negligible = scale.abs().max(f64::MIN_POSITIVE) * 1e-9;

    // Slightly uneven start so it is never orthogonal to the dominant axis by symmetry.
    let mut v = Array1::from_iter((0..f).map(|i| 1.0 + i as f64 * 1e-3));
    orthogonalize(&mut v, previous);
    normalize(&mut v);

    for _ in 0..POWER_ITERATIONS {
        let mut next = m.dot(&v);
        orthogonalize(&mut next, previous);
        let norm = next.dot(&next).sqrt();
        if norm <= negligible {
            return (0.0, Array1::zeros(f));
        }
        next /= norm;
        let delta: f64 = (&next - &v).iter().map(|d| d.abs()).sum();
        v = next;
        if delta < POWER_TOLERANCE {
            break;
        }
    }

    let eigenvalue = v.dot(&m.dot(&v));
    let pivot = v
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap_or(1.0);
    if pivot < 0.0 {
        v.mapv_inplace(|x| -x);
    }
    (eigenvalue, v)
}

fn orthogonalize(v: &mut Array1<f64>, basis: &[Array1<f64>]) {
    for b in basis {
        let c = v.dot(b);
        v.scaled_add(-c, b);
    }
}

fn normalize(v: &mut Array1<f64>) {
    let norm = v.dot(v).sqrt();
    if norm > 0.0 {
        *v /= norm;
    }
}
