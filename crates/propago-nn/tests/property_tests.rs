//! Property tests for scoring invariants.

use candle_core::Device;
use ndarray::Array2;
use proptest::prelude::*;
use propago_graph::adjacency::from_edge_list;
use propago_nn::scoring::{rank_nodes, rescale_scores};
use propago_nn::{GraphInputs, ModelConfig, ModelKind, Session};

proptest! {
    #[test]
    fn rescaled_scores_are_bounded(raw in prop::collection::vec(-1e6f32..1e6, 0..40)) {
        let scores = rescale_scores(&raw);
        prop_assert_eq!(scores.len(), raw.len());
        for s in &scores {
            prop_assert!((0.0..=100.0).contains(s));
        }
    }

    #[test]
    fn constant_scores_map_to_midpoint(value in -1e3f32..1e3, n in 1usize..20) {
        let scores = rescale_scores(&vec![value; n]);
        prop_assert!(scores.iter().all(|&s| s == 50.0));
    }

    #[test]
    fn ranking_is_a_permutation(raw in prop::collection::vec(0.0f64..100.0, 1..30)) {
        let nodes: Vec<String> = (0..raw.len()).map(|i| format!("N{i}")).collect();
        let ranked = rank_nodes(&nodes, &raw);
        prop_assert_eq!(ranked.len(), raw.len());
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
        let mut seen: Vec<&str> = ranked.iter().map(|r| r.node.as_str()).collect();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), raw.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn every_model_scores_small_graphs(
        n in 1usize..6,
        f in 1usize..4,
        kind_idx in 0usize..5,
        values in prop::collection::vec(-3.0f32..3.0, 24),
    ) {
        let features = Array2::from_shape_fn((n, f), |(i, j)| values[(i * f + j) % values.len()]);
        let adj = from_edge_list(n, &[vec![0, (n as i64) - 1]]);
        let inputs = GraphInputs::new(&features, &adj, &Device::Cpu).unwrap();

        let kind = ModelKind::ALL[kind_idx];
        let session = Session::new(kind, &ModelConfig::new(f).with_hidden_dim(8), &Device::Cpu).unwrap();
        let raw = session.predict(&inputs).unwrap();
        prop_assert_eq!(raw.len(), n);

        let scores = rescale_scores(&raw);
        prop_assert!(scores.iter().all(|s| (0.0..=100.0).contains(s)));
    }
}
