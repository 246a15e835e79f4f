use candle_core::{Result, Tensor};
use candle_nn::rnn::{lstm, LSTMConfig, LSTM, RNN};
use candle_nn::{Dropout, ModuleT, VarBuilder};

use super::{GraphModel, ModelConfig, ModelKind};
use crate::layers::{GraphConv, Mlp};

/// Temporal GNN.
///
/// Input is either `(N, F)`, treated as a single time step, or `(N, T, F)`.
/// A stacked LSTM runs over each node's sequence and its last hidden state is
/// concatenated with a two-layer GCN embedding of the latest time slice,
/// `gcn2(dropout(relu(gcn1(x_T))))`. A fusion MLP
/// maps the `2h` concatenation to the score.
pub struct TemporalModel {
    layers: Vec<LSTM>,
    dropout: Dropout,
    gcn1: GraphConv,
    gcn2: GraphConv,
    fusion: Mlp,
}

impl TemporalModel {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let hidden = config.hidden_or(32);
        let mut layers = Vec::with_capacity(config.lstm_layers);
        let mut in_dim = config.in_features;
        for i in 0..config.lstm_layers {
            layers.push(lstm(
                in_dim,
                hidden,
                LSTMConfig::default(),
                vb.pp(format!("lstm{i}")),
            )?);
            in_dim = hidden;
        }
        Ok(Self {
            layers,
            dropout: Dropout::new(config.dropout),
            gcn1: GraphConv::new(config.in_features, hidden, true, vb.pp("gcn1"))?,
            gcn2: GraphConv::new(hidden, hidden, true, vb.pp("gcn2"))?,
            fusion: Mlp::new(2 * hidden, hidden, 1, config.dropout, vb.pp("fusion"))?,
        })
    }

    /// Last hidden state of the top LSTM layer, `(N, hidden)`.
    fn encode_sequence(&self, seq: &Tensor, train: bool) -> Result<Tensor> {
        let mut input = seq.clone();
        let mut last = None;
        for (i, layer) in self.layers.iter().enumerate() {
            let states = layer.seq(&input)?;
            let Some(final_state) = states.last() else {
                candle_core::bail!("temporal input has no time steps");
            };
            last = Some(final_state.h().clone());
            if i + 1 < self.layers.len() {
                input = layer.states_to_tensor(&states)?;
                input = self.dropout.forward_t(&input, train)?;
            }
        }
        match last {
            Some(h) => Ok(h),
            None => candle_core::bail!("temporal model has no LSTM layers"),
        }
    }
}

impl GraphModel for TemporalModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Temporal
    }

    fn forward_t(&self, x: &Tensor, adj: &Tensor, train: bool) -> Result<Tensor> {
        let seq = match x.rank() {
            2 => x.unsqueeze(1)?,
            3 => x.clone(),
            r => candle_core::bail!("temporal input must be (N, F) or (N, T, F), got rank {r}"),
        };
        let steps = seq.dim(1)?;
        if steps == 0 {
            candle_core::bail!("temporal input has no time steps");
        }

        let temporal = self.encode_sequence(&seq, train)?;
        let current = seq.narrow(1, steps - 1, 1)?.squeeze(1)?;
        let spatial = self.gcn1.forward(&current, adj)?.relu()?;
        let spatial = self.dropout.forward_t(&spatial, train)?;
        let spatial = self.gcn2.forward(&spatial, adj)?;

        let combined = Tensor::cat(&[temporal, spatial], 1)?;
        self.fusion.forward_t(&combined, train)?.squeeze(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    #[test]
    fn test_sequence_input() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = TemporalModel::new(&ModelConfig::new(3).with_hidden_dim(8), vb).unwrap();

        let x = Tensor::randn(0f32, 1f32, (4, 6, 3), &device).unwrap();
        let adj = Tensor::eye(4, DType::F32, &device).unwrap();
        assert_eq!(model.forward(&x, &adj).unwrap().dims(), &[4]);
    }

    #[test]
    fn test_spatial_branch_has_two_convolutions() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let _model = TemporalModel::new(&ModelConfig::new(3).with_hidden_dim(8), vb).unwrap();

        let data = varmap.data().lock().unwrap();
        assert_eq!(data["gcn1.weight"].dims(), &[3, 8]);
        assert_eq!(data["gcn2.weight"].dims(), &[8, 8]);
        assert_eq!(data["fusion.0.weight"].dims(), &[8, 16]);
        let convs = data
            .keys()
            .filter(|k| k.starts_with("gcn") && k.ends_with(".weight"))
            .count();
        assert_eq!(convs, 2);
    }

    #[test]
    fn test_rejects_rank_one() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = TemporalModel::new(&ModelConfig::new(3), vb).unwrap();

        let x = Tensor::zeros(3, DType::F32, &device).unwrap();
        let adj = Tensor::eye(3, DType::F32, &device).unwrap();
        assert!(model.forward(&x, &adj).is_err());
    }
}
