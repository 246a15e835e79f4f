use candle_core::{Result, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder};

use super::{GraphModel, ModelConfig, ModelKind};

/// Two-layer GNN: `fc2(A relu(fc1(A X)))`.
///
/// Aggregation happens before each linear map, so a node's score depends on
/// its two-hop neighborhood.
pub struct SimpleGnn {
    fc1: Linear,
    fc2: Linear,
}

impl SimpleGnn {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let hidden = config.hidden_or(32);
        Ok(Self {
            fc1: linear(config.in_features, hidden, vb.pp("fc1"))?,
            fc2: linear(hidden, 1, vb.pp("fc2"))?,
        })
    }
}

impl GraphModel for SimpleGnn {
    fn kind(&self) -> ModelKind {
        ModelKind::Simple
    }

    fn forward_t(&self, x: &Tensor, adj: &Tensor, _train: bool) -> Result<Tensor> {
        let h = adj.matmul(x)?;
        let h = self.fc1.forward(&h)?.relu()?;
        let h = adj.matmul(&h)?;
        self.fc2.forward(&h)?.squeeze(1)
    }
}
