//! Graph construction and analysis for node scoring.
//!
//! `propago-graph` turns raw relationship signals into the dense adjacency
//! structures consumed by the GNN layers in `propago-nn`, and carries the
//! small amount of classical numerics the scoring service needs around them.
//!
//! # Modules
//!
//! - [`adjacency`]: explicit edge lists, self-loops, edge counts, symmetry checks
//! - [`builders`]: correlation, k-nearest-neighbour and sector graphs
//! - [`source`]: priority-ordered [`GraphSpec`] resolution into a [`BuiltGraph`]
//! - [`normalize`]: symmetric degree normalization `D^{-1/2} A D^{-1/2}`
//! - [`components`]: connected components (via petgraph)
//! - [`cluster`]: k-means with k-means++ seeding
//! - [`pca`]: two-component PCA projection
//! - [`stats`]: Pearson/Spearman correlation and prediction evaluation
//!
//! # Example
//!
//! ```rust
//! use propago_graph::{adjacency::from_edge_list, normalize::normalize_adjacency};
//!
//! let a = from_edge_list(3, &[vec![0, 1], vec![1, 2]]);
//! let a_hat = normalize_adjacency(&a);
//! assert_eq!(a_hat.dim(), (3, 3));
//! assert!(a_hat.iter().all(|v| v.is_finite()));
//! ```

pub mod adjacency;
pub mod builders;
pub mod cluster;
pub mod components;
pub mod error;
pub mod normalize;
pub mod pca;
pub mod source;
pub mod stats;

pub use error::{Error, Result};
pub use source::{build_graph, BuiltGraph, GraphSource, GraphSpec};
