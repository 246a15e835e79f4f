//! Symmetric degree normalization.
//!
//! Every graph-convolution layer propagates with
//!
//! ```text
//! A_hat = D^{-1/2} A D^{-1/2},   D = diag(rowsum(A))
//! ```
//!
//! `A` is expected to already carry self-loops, which keeps every degree at
//! least 1. Zero-degree rows are still handled: their inverse square root is
//! defined as 0, so the row and column come out zeroed instead of `inf`/`NaN`.

use ndarray::Array2;

/// `d^{-1/2}` per row, with 0 for zero-degree rows.
#[must_use]
pub fn inverse_sqrt_degrees(a: &Array2<f32>) -> Vec<f32> {
    a.rows()
        .into_iter()
        .map(|row| {
            let d: f32 = row.sum();
            if d > 0.0 {
                1.0 / d.sqrt()
            } else {
                0.0
            }
        })
        .collect()
}

/// Compute `D^{-1/2} A D^{-1/2}`.
///
/// Recomputed per request; nothing is cached.
#[must_use]
pub fn normalize_adjacency(a: &Array2<f32>) -> Array2<f32> {
    let d = inverse_sqrt_degrees(a);
    let mut out = a.clone();
    for ((i, j), v) in out.indexed_iter_mut() {
        *v *= d[i] * d[j];
    }
    out
}
