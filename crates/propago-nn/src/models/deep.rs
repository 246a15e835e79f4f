use candle_core::{Result, Tensor};
use candle_nn::{batch_norm, linear, BatchNorm, BatchNormConfig, Dropout, Linear, Module, ModuleT, VarBuilder};

use super::{GraphModel, ModelConfig, ModelKind};
use crate::layers::GraphConv;

/// Stacked GCN with optional batch norm, ReLU and dropout between layers,
/// followed by a linear head.
pub struct DeepGcn {
    convs: Vec<GraphConv>,
    norms: Vec<BatchNorm>,
    dropout: Dropout,
    head: Linear,
}

impl DeepGcn {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let dims = config.deep_dims();
        let mut convs = Vec::with_capacity(dims.len());
        let mut norms = Vec::new();

        let mut in_dim = config.in_features;
        for (i, &out_dim) in dims.iter().enumerate() {
            convs.push(GraphConv::new(in_dim, out_dim, true, vb.pp(format!("conv{i}")))?);
            if config.batch_norm {
                norms.push(batch_norm(
                    out_dim,
                    BatchNormConfig::default(),
                    vb.pp(format!("bn{i}")),
                )?);
            }
            in_dim = out_dim;
        }

        Ok(Self {
            convs,
            norms,
            dropout: Dropout::new(config.dropout),
            head: linear(in_dim, 1, vb.pp("head"))?,
        })
    }
}

impl GraphModel for DeepGcn {
    fn kind(&self) -> ModelKind {
        ModelKind::Deep
    }

    fn forward_t(&self, x: &Tensor, adj: &Tensor, train: bool) -> Result<Tensor> {
        let mut h = x.clone();
        for (i, conv) in self.convs.iter().enumerate() {
            h = conv.forward(&h, adj)?;
            if let Some(norm) = self.norms.get(i) {
                h = norm.forward_t(&h, train)?;
            }
            h = h.relu()?;
            h = self.dropout.forward_t(&h, train)?;
        }
        self.head.forward(&h)?.squeeze(1)
    }
}
