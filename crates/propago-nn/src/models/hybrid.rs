use candle_core::{Result, Tensor};
use candle_nn::ops::softmax;
use candle_nn::{linear, Dropout, Linear, Module, ModuleT, VarBuilder};

use super::{GraphModel, ModelConfig, ModelKind};
use crate::layers::{GraphConv, Mlp};

/// Two branches over the same input, concatenated and fused:
///
/// - GCN: `gcn2(dropout(relu(gcn1(X))))`
/// - MLP: per-node features only, no graph
///
/// The fusion MLP maps the `2h` concatenation to one score. A per-node
/// attention head computes softmax weights over the two branches; the
/// weighted blend is formed but does not enter the output.
pub struct HybridModel {
    gcn1: GraphConv,
    gcn2: GraphConv,
    dropout: Dropout,
    mlp: Mlp,
    attention: Linear,
    fusion: Mlp,
}

impl HybridModel {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let hidden = config.hidden_or(32);
        let f = config.in_features;
        Ok(Self {
            gcn1: GraphConv::new(f, hidden, true, vb.pp("gcn1"))?,
            gcn2: GraphConv::new(hidden, hidden, true, vb.pp("gcn2"))?,
            dropout: Dropout::new(config.dropout),
            mlp: Mlp::new(f, hidden, hidden, config.dropout, vb.pp("mlp"))?,
            attention: linear(2 * hidden, 2, vb.pp("attention"))?,
            fusion: Mlp::new(2 * hidden, hidden, 1, config.dropout, vb.pp("fusion"))?,
        })
    }

    fn branches(&self, x: &Tensor, adj: &Tensor, train: bool) -> Result<Tensor> {
        let h_gcn = self.gcn1.forward(x, adj)?.relu()?;
        let h_gcn = self.dropout.forward_t(&h_gcn, train)?;
        let h_gcn = self.gcn2.forward(&h_gcn, adj)?;
        let h_mlp = self.mlp.forward_t(x, train)?;
        Tensor::cat(&[h_gcn, h_mlp], 1)
    }

    fn weights_of(&self, combined: &Tensor) -> Result<Tensor> {
        softmax(&self.attention.forward(combined)?, 1)
    }

    /// Per-node branch weights `(N, 2)` in eval mode; each row sums to 1.
    pub fn branch_weights(&self, x: &Tensor, adj: &Tensor) -> Result<Tensor> {
        let combined = self.branches(x, adj, false)?;
        self.weights_of(&combined)
    }
}

impl GraphModel for HybridModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Hybrid
    }

    fn forward_t(&self, x: &Tensor, adj: &Tensor, train: bool) -> Result<Tensor> {
        let combined = self.branches(x, adj, train)?;
        let hidden = combined.dim(1)? / 2;

        let weights = self.weights_of(&combined)?;
        let h_gcn = combined.narrow(1, 0, hidden)?;
        let h_mlp = combined.narrow(1, hidden, hidden)?;
        let _blended = (h_gcn.broadcast_mul(&weights.narrow(1, 0, 1)?)?
            + h_mlp.broadcast_mul(&weights.narrow(1, 1, 1)?)?)?;

        self.fusion.forward_t(&combined, train)?.squeeze(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn setup(device: &Device) -> (VarMap, HybridModel) {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let model = HybridModel::new(&ModelConfig::new(3).with_hidden_dim(8), vb).unwrap();
        (varmap, model)
    }

    #[test]
    fn test_two_branch_parameters() {
        let device = Device::Cpu;
        let (varmap, _model) = setup(&device);
        let data = varmap.data().lock().unwrap();

        assert_eq!(data["attention.weight"].dims(), &[2, 16]);
        assert_eq!(data["fusion.0.weight"].dims(), &[8, 16]);
        assert_eq!(data["gcn2.weight"].dims(), &[8, 8]);
        assert!(data.keys().all(|k| !k.starts_with("branch_weights")));
    }

    #[test]
    fn test_branch_weights_per_node() {
        let device = Device::Cpu;
        let (_varmap, model) = setup(&device);
        let x = Tensor::randn(0f32, 1f32, (5, 3), &device).unwrap();
        let adj = Tensor::eye(5, DType::F32, &device).unwrap();

        let weights = model.branch_weights(&x, &adj).unwrap();
        assert_eq!(weights.dims(), &[5, 2]);
        let sums: Vec<f32> = weights.sum(1).unwrap().to_vec1().unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_output_ignores_branch_weights() {
        let device = Device::Cpu;
        let (varmap, model) = setup(&device);
        let x = Tensor::randn(0f32, 1f32, (5, 3), &device).unwrap();
        let adj = Tensor::eye(5, DType::F32, &device).unwrap();

        let before: Vec<f32> = model.forward(&x, &adj).unwrap().to_vec1().unwrap();
        let weights_before = model.branch_weights(&x, &adj).unwrap();
        {
            let data = varmap.data().lock().unwrap();
            let head = &data["attention.weight"];
            head.set(&Tensor::randn(0f32, 5f32, (2, 16), &device).unwrap())
                .unwrap();
        }
        let after: Vec<f32> = model.forward(&x, &adj).unwrap().to_vec1().unwrap();
        let weights_after = model.branch_weights(&x, &adj).unwrap();

        assert_eq!(before, after);
        let shift: f32 = (weights_before - weights_after)
            .unwrap()
            .abs()
            .unwrap()
            .sum_all()
            .unwrap()
            .to_scalar()
            .unwrap();
        assert!(shift > 0.0);
    }
}
