//! Priority-ordered graph resolution.
//!
//! A request may carry several relationship signals at once; exactly one is
//! honoured, in this order:
//!
//! 1. explicit edge list (non-empty)
//! 2. returns correlation
//! 3. k-nearest-neighbour over features (`use_knn`)
//! 4. sector co-membership
//! 5. fully connected

use crate::adjacency::{add_self_loops, from_edge_list, fully_connected};
use crate::builders::{correlation_graph, knn_graph, sector_graph};
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView2};
use serde::Serialize;

/// Which signal produced the adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphSource {
    Explicit,
    Correlation,
    Knn,
    Sector,
    FullyConnected,
}

/// Relationship signals available for one request.
#[derive(Debug, Clone)]
pub struct GraphSpec {
    /// Explicit `[i, j]` index pairs.
    pub edges: Option<Vec<Vec<i64>>>,
    /// Returns matrix, one row per node.
    pub returns: Option<Array2<f32>>,
    /// Correlation threshold (default: 0.3).
    pub correlation_threshold: f64,
    /// Derive a k-NN graph from features when nothing above applies.
    pub use_knn: bool,
    /// Neighbours per node for the k-NN graph (default: 5).
    pub knn_k: usize,
    /// Optional sector label per node.
    pub sectors: Option<Vec<String>>,
}

impl Default for GraphSpec {
    fn default() -> Self {
        Self {
            edges: None,
            returns: None,
            correlation_threshold: 0.3,
            use_knn: false,
            knn_k: 5,
            sectors: None,
        }
    }
}

impl GraphSpec {
    pub fn with_edges(mut self, edges: Vec<Vec<i64>>) -> Self {
        self.edges = Some(edges);
        self
    }

    pub fn with_returns(mut self, returns: Array2<f32>) -> Self {
        self.returns = Some(returns);
        self
    }

    pub fn with_correlation_threshold(mut self, threshold: f64) -> Self {
        self.correlation_threshold = threshold;
        self
    }

    pub fn with_knn(mut self, k: usize) -> Self {
        self.use_knn = true;
        self.knn_k = k;
        self
    }

    pub fn with_sectors(mut self, sectors: Vec<String>) -> Self {
        self.sectors = Some(sectors);
        self
    }
}

/// A resolved adjacency (0/1, symmetric, self-looped) and where it came from.
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub adjacency: Array2<f32>,
    pub source: GraphSource,
}

/// Resolve `spec` against an `N x F` feature matrix.
///
/// # Errors
///
/// A returns matrix or sector list whose length differs from `N`, or an
/// invalid correlation/k-NN configuration.
pub fn build_graph(features: ArrayView2<'_, f32>, spec: &GraphSpec) -> Result<BuiltGraph> {
    let n = features.nrows();

    if let Some(edges) = spec.edges.as_ref().filter(|e| !e.is_empty()) {
        return Ok(BuiltGraph {
            adjacency: from_edge_list(n, edges),
            source: GraphSource::Explicit,
        });
    }

    let (mut adjacency, source) = if let Some(returns) = &spec.returns {
        if returns.nrows() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                got: returns.nrows(),
            });
        }
        (
            correlation_graph(returns.view(), spec.correlation_threshold)?,
            GraphSource::Correlation,
        )
    } else if spec.use_knn {
        (knn_graph(features, spec.knn_k)?, GraphSource::Knn)
    } else if let Some(sectors) = &spec.sectors {
        if sectors.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                got: sectors.len(),
            });
        }
        (sector_graph(sectors), GraphSource::Sector)
    } else {
        return Ok(BuiltGraph {
            adjacency: fully_connected(n),
            source: GraphSource::FullyConnected,
        });
    };

    add_self_loops(&mut adjacency);
    Ok(BuiltGraph { adjacency, source })
}
