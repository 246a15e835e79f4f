//! Connected components of a dense adjacency.

use ndarray::Array2;
use petgraph::graph::UnGraph;

/// Build an undirected petgraph view of a dense adjacency (upper triangle, no loops).
#[must_use]
pub fn to_petgraph(a: &Array2<f32>) -> UnGraph<(), ()> {
    let n = a.nrows();
    let mut graph = UnGraph::<(), ()>::with_capacity(n, 0);
    let nodes: Vec<_> = (0..n).map(|_| graph.add_node(())).collect();
    for i in 0..n {
        for j in i + 1..n {
            if a[[i, j]] > 0.0 || a[[j, i]] > 0.0 {
                graph.add_edge(nodes[i], nodes[j], ());
            }
        }
    }
    graph
}

/// Number of weakly connected components.
#[must_use]
pub fn connected_components(a: &Array2<f32>) -> usize {
    petgraph::algo::connected_components(&to_petgraph(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::{from_edge_list, fully_connected};

    #[test]
    fn test_components() {
        assert_eq!(connected_components(&from_edge_list(4, &[vec![0, 1]])), 3);
        assert_eq!(connected_components(&fully_connected(4)), 1);
        assert_eq!(connected_components(&Array2::zeros((0, 0))), 0);
    }
}
