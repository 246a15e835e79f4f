//! Fixed-length training loop.
//!
//! Runs exactly `epochs` AdamW steps on the chosen [`Objective`]. There is no
//! early stopping, no schedule and no convergence check: the epoch count is
//! the caller's latency budget.
//!
//! # Example
//!
//! ```rust,ignore
//! use propago_nn::{Objective, TrainingConfig};
//!
//! let config = TrainingConfig::default()
//!     .with_epochs(100)
//!     .with_learning_rate(0.005)
//!     .with_objective(Objective::Contrastive);
//! let report = session.train(&inputs, &config)?;
//! ```

use candle_core::{Tensor, Var};
use candle_nn::{AdamW, Optimizer, ParamsAdamW};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::loss::Objective;
use crate::models::GraphModel;

/// Training configuration.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Number of optimization steps (default: 50).
    pub epochs: usize,
    /// AdamW learning rate (default: 0.01).
    pub learning_rate: f64,
    /// Objective to minimize (default: smoothness).
    pub objective: Objective,
    /// Record a loss snapshot every this many epochs (default: 10).
    pub snapshot_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            learning_rate: 0.01,
            objective: Objective::Smoothness,
            snapshot_every: 10,
        }
    }
}

impl TrainingConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }
}

/// Loss at one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LossSnapshot {
    pub epoch: usize,
    pub loss: f32,
}

/// Outcome of a training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub final_loss: f32,
    pub history: Vec<LossSnapshot>,
}

/// Train `model` in place by stepping `vars`.
pub fn train(
    model: &dyn GraphModel,
    vars: Vec<Var>,
    x: &Tensor,
    adj: &Tensor,
    config: &TrainingConfig,
) -> Result<TrainingReport> {
    if config.epochs == 0 {
        return Err(Error::InvalidConfig("epochs must be positive".into()));
    }
    if config.learning_rate.is_nan() || config.learning_rate <= 0.0 {
        return Err(Error::InvalidConfig(format!(
            "learning_rate must be positive, got {}",
            config.learning_rate
        )));
    }

    let params = ParamsAdamW {
        lr: config.learning_rate,
        beta1: 0.9,
        beta2: 0.999,
        eps: 1e-8,
        weight_decay: 0.0,
    };
    let mut optimizer = AdamW::new(vars, params)?;
    let every = config.snapshot_every.max(1);

    let mut history = Vec::new();
    let mut final_loss = f32::NAN;
    for epoch in 0..config.epochs {
        let out = model.forward_t(x, adj, true)?;
        let loss = config.objective.loss(&out, adj)?;
        optimizer.backward_step(&loss)?;

        final_loss = loss.to_dtype(candle_core::DType::F32)?.to_scalar::<f32>()?;
        if !final_loss.is_finite() {
            return Err(Error::Training(format!(
                "{} loss diverged at epoch {epoch}",
                config.objective.name()
            )));
        }
        if epoch % every == 0 {
            tracing::debug!(epoch, loss = final_loss, objective = config.objective.name(), "training");
            history.push(LossSnapshot {
                epoch,
                loss: final_loss,
            });
        }
    }

    Ok(TrainingReport {
        final_loss,
        history,
    })
}
