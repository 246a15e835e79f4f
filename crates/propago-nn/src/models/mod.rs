//! Graph neural network architectures for node scoring.
//!
//! Every architecture maps node features `(N, F)` and a normalized adjacency
//! `(N, N)` to one raw score per node, shape `(N,)`.
//!
//! | Kind | Idea |
//! |------|------|
//! | `simple` | two rounds of neighborhood averaging around a linear stack |
//! | `deep` | GCN stack with batch norm and dropout |
//! | `gat` | multi-head attention over neighbors |
//! | `hybrid` | GCN and per-node MLP branches fused by a small MLP, with per-node branch weights |
//! | `temporal` | LSTM over each node's history, fused with a GCN on the latest slice |

mod deep;
mod gat;
mod hybrid;
mod simple;
mod temporal;

pub use deep::DeepGcn;
pub use gat::GatModel;
pub use hybrid::HybridModel;
pub use simple::SimpleGnn;
pub use temporal::TemporalModel;

use std::fmt;
use std::str::FromStr;

use candle_core::Tensor;
use candle_nn::VarBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A graph model producing one raw score per node.
pub trait GraphModel: Send + Sync {
    /// Architecture tag.
    fn kind(&self) -> ModelKind;

    /// Forward pass. `train` enables dropout and batch statistics.
    fn forward_t(&self, x: &Tensor, adj: &Tensor, train: bool) -> candle_core::Result<Tensor>;

    /// Inference-mode forward pass.
    fn forward(&self, x: &Tensor, adj: &Tensor) -> candle_core::Result<Tensor> {
        self.forward_t(x, adj, false)
    }
}

/// Supported architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Simple,
    Deep,
    Gat,
    Hybrid,
    Temporal,
}

impl ModelKind {
    /// All kinds, in listing order.
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Simple,
        ModelKind::Deep,
        ModelKind::Gat,
        ModelKind::Hybrid,
        ModelKind::Temporal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Simple => "simple",
            ModelKind::Deep => "deep",
            ModelKind::Gat => "gat",
            ModelKind::Hybrid => "hybrid",
            ModelKind::Temporal => "temporal",
        }
    }

    /// One-line description for listings.
    pub fn description(self) -> &'static str {
        match self {
            ModelKind::Simple => "Two-layer neighborhood-averaging GNN",
            ModelKind::Deep => "Stacked GCN with batch normalization and dropout",
            ModelKind::Gat => "Multi-head graph attention network",
            ModelKind::Hybrid => "GCN and MLP branches with attention-weighted fusion",
            ModelKind::Temporal => "LSTM over node histories fused with a spatial GCN",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownModel(s.to_string()))
    }
}

/// Architecture hyperparameters.
///
/// `None` fields fall back to the per-architecture default.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Input feature dimension.
    pub in_features: usize,
    /// Hidden width (simple 32, gat 64, hybrid 32, temporal 32).
    pub hidden_dim: Option<usize>,
    /// Explicit deep-GCN widths; default `[64, 32, 16]`, or `[h, h/2]` when
    /// only `hidden_dim` is given.
    pub hidden_dims: Option<Vec<usize>>,
    /// Dropout probability.
    pub dropout: f32,
    /// Attention heads (gat).
    pub heads: usize,
    /// LeakyReLU slope for attention logits.
    pub negative_slope: f64,
    /// Batch norm between deep-GCN layers.
    pub batch_norm: bool,
    /// Stacked LSTM layers (temporal).
    pub lstm_layers: usize,
}

impl ModelConfig {
    pub fn new(in_features: usize) -> Self {
        Self {
            in_features,
            hidden_dim: None,
            hidden_dims: None,
            dropout: 0.2,
            heads: 4,
            negative_slope: 0.2,
            batch_norm: true,
            lstm_layers: 2,
        }
    }

    pub fn with_hidden_dim(mut self, hidden: usize) -> Self {
        self.hidden_dim = Some(hidden);
        self
    }

    pub fn with_hidden_dims(mut self, dims: Vec<usize>) -> Self {
        self.hidden_dims = Some(dims);
        self
    }

    pub fn with_dropout(mut self, dropout: f32) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_heads(mut self, heads: usize) -> Self {
        self.heads = heads;
        self
    }

    pub fn with_batch_norm(mut self, batch_norm: bool) -> Self {
        self.batch_norm = batch_norm;
        self
    }

    pub fn with_lstm_layers(mut self, layers: usize) -> Self {
        self.lstm_layers = layers;
        self
    }

    pub(crate) fn hidden_or(&self, default: usize) -> usize {
        self.hidden_dim.unwrap_or(default)
    }

    pub(crate) fn deep_dims(&self) -> Vec<usize> {
        match (&self.hidden_dims, self.hidden_dim) {
            (Some(dims), _) => dims.clone(),
            (None, Some(h)) => vec![h, (h / 2).max(1)],
            (None, None) => vec![64, 32, 16],
        }
    }

    fn validate(&self) -> Result<()> {
        if self.in_features == 0 {
            return Err(Error::InvalidConfig("in_features must be positive".into()));
        }
        if self.hidden_dim == Some(0) {
            return Err(Error::InvalidConfig("hidden_dim must be positive".into()));
        }
        if let Some(dims) = &self.hidden_dims {
            if dims.is_empty() || dims.contains(&0) {
                return Err(Error::InvalidConfig(
                    "hidden_dims must be non-empty and positive".into(),
                ));
            }
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(Error::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        if self.heads == 0 || self.lstm_layers == 0 {
            return Err(Error::InvalidConfig(
                "heads and lstm_layers must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Instantiate an architecture with fresh parameters drawn through `vb`.
pub fn build_model(
    kind: ModelKind,
    config: &ModelConfig,
    vb: VarBuilder,
) -> Result<Box<dyn GraphModel>> {
    config.validate()?;
    let model: Box<dyn GraphModel> = match kind {
        ModelKind::Simple => Box::new(SimpleGnn::new(config, vb)?),
        ModelKind::Deep => Box::new(DeepGcn::new(config, vb)?),
        ModelKind::Gat => Box::new(GatModel::new(config, vb)?),
        ModelKind::Hybrid => Box::new(HybridModel::new(config, vb)?),
        ModelKind::Temporal => Box::new(TemporalModel::new(config, vb)?),
    };
    Ok(model)
}
