//! Rank statistics and prediction evaluation.
//!
//! | Metric | Range | Description |
//! |--------|-------|-------------|
//! | Spearman | [-1, 1] | Pearson correlation of average ranks |
//! | Pearson / IC | [-1, 1] | Linear correlation of predictions and outcomes |
//! | Top-20% precision | [0, 1] | Overlap of predicted and actual top quintile |
//! | RMSE | [0, inf) | Root mean squared error |
//!
//! Correlations are `None` when undefined (fewer than two points or a
//! constant input).

use crate::error::{Error, Result};
use serde::Serialize;

/// Pearson correlation coefficient.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (&x, &y) in a.iter().zip(b) {
        let (dx, dy) = (x - mean_a, y - mean_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let r = cov / (var_a.sqrt() * var_b.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// 1-based ranks with ties sharing their average rank.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end share ranks start+1..=end
        let avg = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
        start = end;
    }
    ranks
}

/// Spearman rank correlation.
#[must_use]
pub fn spearman(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    pearson(&average_ranks(a), &average_ranks(b))
}

/// Agreement between predicted scores and realized outcomes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    pub spearman_corr: Option<f64>,
    pub pearson_corr: Option<f64>,
    pub top20_precision: f64,
    pub ic: Option<f64>,
    pub rmse: f64,
}

/// Score predictions against realized targets.
///
/// Top-20% precision compares the index sets of the `max(1, N / 5)` largest
/// predictions and targets.
///
/// # Errors
///
/// Empty inputs or mismatched lengths.
#[allow(clippy::cast_precision_loss)]
pub fn evaluate_predictions(predictions: &[f64], targets: &[f64]) -> Result<EvaluationMetrics> {
    if predictions.is_empty() {
        return Err(Error::Empty("predictions"));
    }
    if predictions.len() != targets.len() {
        return Err(Error::DimensionMismatch {
            expected: predictions.len(),
            got: targets.len(),
        });
    }

    let n = predictions.len();
    let top_k = (n / 5).max(1);
    let pred_top = top_indices(predictions, top_k);
    let actual_top = top_indices(targets, top_k);
    let hits = pred_top.iter().filter(|i| actual_top.contains(i)).count();

    let mse = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / n as f64;

    let pearson_corr = pearson(predictions, targets);
    Ok(EvaluationMetrics {
        spearman_corr: spearman(predictions, targets),
        pearson_corr,
        top20_precision: hits as f64 / top_k as f64,
        ic: pearson_corr,
        rmse: mse.sqrt(),
    })
}

fn top_indices(values: &[f64], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[j].total_cmp(&values[i]));
    order.truncate(k);
    order
}
