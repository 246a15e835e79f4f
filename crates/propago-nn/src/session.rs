//! A per-request model lifecycle: construct, optionally train, infer, drop.

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use ndarray::{Array2, Array3};
use propago_graph::normalize::normalize_adjacency;

use crate::error::{Error, Result};
use crate::explain;
use crate::models::{build_model, GraphModel, ModelConfig, ModelKind};
use crate::scoring::ensure_finite;
use crate::tensor::{matrix_to_tensor, sequence_to_tensor, to_vec};
use crate::trainer::{self, TrainingConfig, TrainingReport};

/// Device-resident features plus the normalized propagation operator.
#[derive(Debug, Clone)]
pub struct GraphInputs {
    /// `(N, F)`, or `(N, T, F)` for temporal models.
    pub features: Tensor,
    /// Normalized adjacency `(N, N)`.
    pub adjacency: Tensor,
}

impl GraphInputs {
    /// Normalize a 0/1 adjacency and upload it with the features.
    pub fn new(features: &Array2<f32>, adjacency: &Array2<f32>, device: &Device) -> Result<Self> {
        check_square(features.nrows(), adjacency)?;
        Ok(Self {
            features: matrix_to_tensor(features, device)?,
            adjacency: matrix_to_tensor(&normalize_adjacency(adjacency), device)?,
        })
    }

    /// Same as [`GraphInputs::new`] for `(N, T, F)` node histories.
    ///
    /// Library-only: the HTTP endpoints and the CLI always send a single
    /// `(N, F)` slice, which the temporal model reads as `T = 1`.
    pub fn sequences(
        features: &Array3<f32>,
        adjacency: &Array2<f32>,
        device: &Device,
    ) -> Result<Self> {
        check_square(features.dim().0, adjacency)?;
        Ok(Self {
            features: sequence_to_tensor(features, device)?,
            adjacency: matrix_to_tensor(&normalize_adjacency(adjacency), device)?,
        })
    }

    pub fn n_nodes(&self) -> usize {
        self.features.dims().first().copied().unwrap_or(0)
    }
}

fn check_square(n: usize, adjacency: &Array2<f32>) -> Result<()> {
    if adjacency.dim() != (n, n) {
        return Err(Error::DimensionMismatch {
            expected: n,
            got: adjacency.nrows(),
        });
    }
    Ok(())
}

/// One freshly initialized model and its parameters.
///
/// Weights are random on every construction; nothing is shared across
/// sessions.
pub struct Session {
    device: Device,
    varmap: VarMap,
    model: Box<dyn GraphModel>,
}

impl Session {
    pub fn new(kind: ModelKind, config: &ModelConfig, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let model = build_model(kind, config, vb)?;
        tracing::debug!(%kind, in_features = config.in_features, "model initialized");
        Ok(Self {
            device: device.clone(),
            varmap,
            model,
        })
    }

    pub fn kind(&self) -> ModelKind {
        self.model.kind()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn model(&self) -> &dyn GraphModel {
        self.model.as_ref()
    }

    /// Train in place. Returns `None` without touching the weights when
    /// `config.epochs` is zero.
    pub fn train(
        &self,
        inputs: &GraphInputs,
        config: &TrainingConfig,
    ) -> Result<Option<TrainingReport>> {
        if config.epochs == 0 {
            return Ok(None);
        }
        let report = trainer::train(
            self.model.as_ref(),
            self.varmap.all_vars(),
            &inputs.features,
            &inputs.adjacency,
            config,
        )?;
        Ok(Some(report))
    }

    /// Raw per-node scores in inference mode.
    pub fn predict(&self, inputs: &GraphInputs) -> Result<Vec<f32>> {
        let out = self.model.forward(&inputs.features, &inputs.adjacency)?;
        let raw = to_vec(&out)?;
        ensure_finite(&raw, "model output")?;
        Ok(raw)
    }

    /// Normalized gradient importance per input feature.
    pub fn feature_importance(&self, inputs: &GraphInputs) -> Result<Vec<f32>> {
        let importance =
            explain::feature_importance(self.model.as_ref(), &inputs.features, &inputs.adjacency)?;
        ensure_finite(&importance, "feature importance")?;
        Ok(importance)
    }
}
