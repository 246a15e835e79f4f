//! Turning raw model outputs into display scores and rankings.

use serde::Serialize;

use crate::error::{Error, Result};

/// Raw score spreads at or below this map every node to [`MIDPOINT`].
pub const SCORE_TOLERANCE: f64 = 1e-6;
/// Display score used when raw scores are indistinguishable.
pub const MIDPOINT: f64 = 50.0;

/// Reject NaN or infinite model outputs.
pub fn ensure_finite(raw: &[f32], what: &str) -> Result<()> {
    if raw.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(Error::NonFinite(what.to_string()))
    }
}

/// Min-max rescale to `[0, 100]`.
///
/// If `max - min <= SCORE_TOLERANCE` every score is exactly `50.0`.
pub fn rescale_scores(raw: &[f32]) -> Vec<f64> {
    let (min, max) = raw
        .iter()
        .map(|&v| f64::from(v))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if raw.is_empty() || range.is_nan() || range <= SCORE_TOLERANCE {
        return vec![MIDPOINT; raw.len()];
    }
    raw.iter()
        .map(|&v| (100.0 * (f64::from(v) - min) / range).clamp(0.0, 100.0))
        .collect()
}

/// One row of a ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedNode {
    /// 1-based position.
    pub rank: usize,
    pub node: String,
    pub score: f64,
}

/// Sort nodes by score, highest first. Ties keep input order.
pub fn rank_nodes(nodes: &[String], scores: &[f64]) -> Vec<RankedNode> {
    let mut order: Vec<usize> = (0..nodes.len().min(scores.len())).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
        .into_iter()
        .enumerate()
        .map(|(i, idx)| RankedNode {
            rank: i + 1,
            node: nodes[idx].clone(),
            score: scores[idx],
        })
        .collect()
}

/// The `k` best `(node, score)` pairs.
pub fn top_k(nodes: &[String], scores: &[f64], k: usize) -> Vec<(String, f64)> {
    rank_nodes(nodes, scores)
        .into_iter()
        .take(k)
        .map(|r| (r.node, r.score))
        .collect()
}
