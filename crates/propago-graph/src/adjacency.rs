//! Dense 0/1 adjacency matrices.
//!
//! Every adjacency in this crate is an `N x N` [`Array2<f32>`] whose row and
//! column order follows the request's node list. Relationships are undirected,
//! so builders always write both `(i, j)` and `(j, i)`.

use ndarray::Array2;

/// Build a symmetric adjacency from an explicit edge list, with self-loops.
///
/// Each entry is read as `[i, j, ..]`; entries with fewer than two indices are
/// skipped, and any index outside `0..n` drops the whole edge without error.
///
/// An empty edge list yields the identity matrix.
#[must_use]
pub fn from_edge_list(n: usize, edges: &[Vec<i64>]) -> Array2<f32> {
    let mut a = Array2::<f32>::zeros((n, n));
    for edge in edges {
        let (Some(&i), Some(&j)) = (edge.first(), edge.get(1)) else {
            continue;
        };
        let (Some(i), Some(j)) = (checked_index(i, n), checked_index(j, n)) else {
            continue;
        };
        a[[i, j]] = 1.0;
        a[[j, i]] = 1.0;
    }
    add_self_loops(&mut a);
    a
}

fn checked_index(raw: i64, n: usize) -> Option<usize> {
    usize::try_from(raw).ok().filter(|&i| i < n)
}

/// All-ones `n x n` adjacency (every node related to every node, itself included).
#[must_use]
pub fn fully_connected(n: usize) -> Array2<f32> {
    Array2::ones((n, n))
}

/// Set every diagonal entry to 1.
///
/// Builders produce loop-free graphs and call this last, so the diagonal is
/// exactly 1 regardless of what the source signal put there.
pub fn add_self_loops(a: &mut Array2<f32>) {
    a.diag_mut().fill(1.0);
}

/// Number of non-zero off-diagonal entries, counted as ordered pairs.
///
/// Computed as `sum(A) - N` on a self-looped 0/1 matrix, so an undirected edge
/// contributes 2.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn edge_count(a: &Array2<f32>) -> usize {
    let n = a.nrows() as f64;
    let total: f64 = a.iter().map(|&v| f64::from(v)).sum();
    (total - n).max(0.0).round() as usize
}

/// Whether `a` is square and equal to its transpose.
#[must_use]
pub fn is_symmetric(a: &Array2<f32>) -> bool {
    let (rows, cols) = a.dim();
    if rows != cols {
        return false;
    }
    (0..rows).all(|i| (i + 1..cols).all(|j| a[[i, j]] == a[[j, i]]))
}
