//! Request validation. Everything here runs before any model is built.

use ndarray::Array2;

use crate::error::ApiError;

pub const MAX_EPOCHS: usize = 500;

fn invalid(msg: impl Into<String>) -> ApiError {
    ApiError::InvalidInput(msg.into())
}

/// An integer knob inside `[lo, hi]`.
pub fn int_in(name: &str, value: i64, lo: usize, hi: usize) -> Result<usize, ApiError> {
    usize::try_from(value)
        .ok()
        .filter(|v| (lo..=hi).contains(v))
        .ok_or_else(|| invalid(format!("{name} must be between {lo} and {hi}, got {value}")))
}

/// A real knob inside `[lo, hi]`.
pub fn float_in(name: &str, value: f64, lo: f64, hi: f64) -> Result<f64, ApiError> {
    if (lo..=hi).contains(&value) {
        Ok(value)
    } else {
        Err(invalid(format!("{name} must be between {lo} and {hi}, got {value}")))
    }
}

pub fn train_epochs(value: i64) -> Result<usize, ApiError> {
    int_in("train_epochs", value, 0, MAX_EPOCHS)
}

/// Rectangular, finite `rows x cols` matrix. Zero rows yields a `(0, 0)` matrix.
pub fn matrix(name: &str, rows: &[Vec<f64>]) -> Result<Array2<f32>, ApiError> {
    let cols = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
        return Err(invalid(format!(
            "{name} row {i} has {} values, expected {cols}",
            row.len()
        )));
    }
    let flat: Vec<f32> = rows.iter().flatten().map(|&v| v as f32).collect();
    if flat.iter().any(|v| !v.is_finite()) {
        return Err(invalid(format!("{name} must be finite")));
    }
    Array2::from_shape_vec((rows.len(), cols), flat).map_err(|e| invalid(format!("{name}: {e}")))
}

/// Feature matrix with one row per node and at least one column.
pub fn feature_matrix(nodes: &[String], features: &[Vec<f64>]) -> Result<Array2<f32>, ApiError> {
    if nodes.len() != features.len() {
        return Err(invalid(format!(
            "nodes has {} entries but features has {} rows",
            nodes.len(),
            features.len()
        )));
    }
    let x = matrix("features", features)?;
    if x.nrows() > 0 && x.ncols() == 0 {
        return Err(invalid("features must have at least one column"));
    }
    Ok(x)
}

/// Non-empty node set.
pub fn require_nodes(nodes: &[String]) -> Result<(), ApiError> {
    if nodes.is_empty() {
        Err(invalid("No nodes provided"))
    } else {
        Ok(())
    }
}

/// Returns series: one row per node, at least two observations.
pub fn returns_matrix(returns: &[Vec<f64>], n: usize) -> Result<Array2<f32>, ApiError> {
    let r = matrix("returns", returns)?;
    if r.nrows() != n {
        return Err(invalid(format!(
            "returns has {} rows but there are {n} nodes",
            r.nrows()
        )));
    }
    if r.ncols() < 2 {
        return Err(invalid("returns need at least two observations per node"));
    }
    Ok(r)
}

/// Targets: one finite value per node.
pub fn targets(values: &[f64], n: usize) -> Result<Vec<f32>, ApiError> {
    if values.len() != n {
        return Err(invalid(format!(
            "targets has {} entries but there are {n} nodes",
            values.len()
        )));
    }
    let out: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    if out.iter().any(|v| !v.is_finite()) {
        return Err(invalid("targets must be finite"));
    }
    Ok(out)
}

/// Sector labels: one per node.
pub fn sectors(labels: &[String], n: usize) -> Result<(), ApiError> {
    if labels.len() != n {
        return Err(invalid(format!(
            "sectors has {} entries but there are {n} nodes",
            labels.len()
        )));
    }
    Ok(())
}
