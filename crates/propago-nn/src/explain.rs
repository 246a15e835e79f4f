//! Gradient-based feature importance.
//!
//! Importance of feature `f` is the mean over nodes of
//! `|d(sum of scores) / d x[n, f]|`, normalized to sum to 1. This is a
//! first-order sensitivity measure, not a causal attribution.

use candle_core::{Tensor, Var};

use crate::error::{Error, Result};
use crate::models::GraphModel;
use crate::tensor::to_vec;

/// Per-feature importance for `model` at input `x` `(N, F)`.
///
/// Falls back to a uniform `1/F` when every gradient is zero.
pub fn feature_importance(model: &dyn GraphModel, x: &Tensor, adj: &Tensor) -> Result<Vec<f32>> {
    let (_, n_features) = x.dims2()?;
    if n_features == 0 {
        return Ok(Vec::new());
    }

    let input = Var::from_tensor(x)?;
    let out = model.forward(input.as_tensor(), adj)?;
    let grads = out.sum_all()?.backward()?;
    let grad = grads
        .get(input.as_tensor())
        .ok_or_else(|| Error::Training("no gradient reached the input features".into()))?;

    let per_feature = to_vec(&grad.abs()?.mean(0)?)?;
    Ok(normalize_importance(per_feature))
}

/// Scale to sum 1; uniform when the total is zero or not finite.
pub fn normalize_importance(values: Vec<f32>) -> Vec<f32> {
    let total: f32 = values.iter().sum();
    if total > 0.0 && total.is_finite() {
        values.into_iter().map(|v| v / total).collect()
    } else {
        let uniform = 1.0 / values.len().max(1) as f32;
        vec![uniform; values.len()]
    }
}
