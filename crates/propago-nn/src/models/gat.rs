use candle_core::{Result, Tensor};
use candle_nn::{Dropout, ModuleT, VarBuilder};

use super::{GraphModel, ModelConfig, ModelKind};
use crate::layers::GraphAttention;

/// Multi-head GAT: concatenated ELU heads, then a single linear attention
/// head producing the score.
pub struct GatModel {
    heads: Vec<GraphAttention>,
    out: GraphAttention,
    dropout: Dropout,
}

impl GatModel {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let hidden = config.hidden_or(64);
        let heads = (0..config.heads)
            .map(|i| {
                GraphAttention::new(
                    config.in_features,
                    hidden,
                    config.dropout,
                    config.negative_slope,
                    true,
                    vb.pp(format!("head{i}")),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        let out = GraphAttention::new(
            hidden * config.heads,
            1,
            config.dropout,
            config.negative_slope,
            false,
            vb.pp("out"),
        )?;
        Ok(Self {
            heads,
            out,
            dropout: Dropout::new(config.dropout),
        })
    }
}

impl GraphModel for GatModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Gat
    }

    fn forward_t(&self, x: &Tensor, adj: &Tensor, train: bool) -> Result<Tensor> {
        let x = self.dropout.forward_t(x, train)?;
        let heads = self
            .heads
            .iter()
            .map(|head| head.forward_t(&x, adj, train))
            .collect::<Result<Vec<_>>>()?;
        let h = Tensor::cat(&heads, 1)?;
        let h = self.dropout.forward_t(&h, train)?;
        self.out.forward_t(&h, adj, train)?.squeeze(1)
    }
}
