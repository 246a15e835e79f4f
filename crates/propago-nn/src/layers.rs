//! Message-passing layers.
//!
//! - [`GraphConv`]: Graph Convolutional Network layer (Kipf & Welling, 2017)
//! - [`GraphAttention`]: dense single-head Graph Attention layer (Velickovic et al., 2018)
//! - [`Mlp`]: two-layer perceptron used as a per-node branch and as a fusion head
//!
//! All layers operate on dense tensors: node features `(N, F)` and a
//! normalized adjacency `(N, N)` that already includes self-loops.

use candle_core::{Result, Tensor};
use candle_nn::{linear, Dropout, Init, Linear, Module, ModuleT, VarBuilder};

/// Xavier/Glorot uniform initializer for a `(fan_in, fan_out)` weight.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn xavier_uniform(fan_in: usize, fan_out: usize) -> Init {
    let bound = (6.0 / (fan_in + fan_out) as f64).sqrt();
    Init::Uniform {
        lo: -bound,
        up: bound,
    }
}

/// Graph Convolutional Network layer.
///
/// Implements: H' = A_hat (H W) + b
///
/// Where:
/// - A_hat is the normalized adjacency matrix (with self-loops)
/// - H is the node feature matrix
/// - W is the learnable weight matrix (Xavier-uniform init)
/// - b is an optional bias (zero init)
///
/// # Reference
///
/// Kipf & Welling, "Semi-Supervised Classification with Graph Convolutional
/// Networks", ICLR 2017.
pub struct GraphConv {
    weight: Tensor,
    bias: Option<Tensor>,
}

impl GraphConv {
    /// Create a new GCN layer.
    ///
    /// # Arguments
    /// - `in_features`: Input feature dimension
    /// - `out_features`: Output feature dimension
    /// - `bias`: Whether to include bias term
    /// - `vb`: Variable builder for parameter initialization
    pub fn new(in_features: usize, out_features: usize, bias: bool, vb: VarBuilder) -> Result<Self> {
        let weight = vb.get_with_hints(
            (in_features, out_features),
            "weight",
            xavier_uniform(in_features, out_features),
        )?;
        let bias = if bias {
            Some(vb.get_with_hints(out_features, "bias", Init::Const(0.0))?)
        } else {
            None
        };
        Ok(Self { weight, bias })
    }

    /// Forward pass.
    ///
    /// # Arguments
    /// - `x`: Node features (N x in_features)
    /// - `adj`: Normalized adjacency matrix (N x N)
    ///
    /// # Returns
    /// - Node embeddings (N x out_features)
    pub fn forward(&self, x: &Tensor, adj: &Tensor) -> Result<Tensor> {
        // Linear transform: X * W
        let support = x.matmul(&self.weight)?;
        // Neighborhood aggregation: A_hat * (X W)
        let out = adj.matmul(&support)?;
        match &self.bias {
            Some(b) => out.broadcast_add(b),
            None => Ok(out),
        }
    }
}

/// Graph Attention Network layer (single head, dense).
///
/// Implements attention-weighted aggregation:
/// h_i' = sum_{j in N(i)} alpha_{ij} W h_j
///
/// Where alpha_{ij} = softmax_j(LeakyReLU(a^T [Wh_i || Wh_j])), and
/// non-edges are masked with a large negative logit before the softmax.
/// The attention vector `a` is split into its source and destination halves
/// so the `N x N` logit matrix is one broadcast add instead of a pairwise
/// concatenation.
///
/// When `concat` is set (hidden heads) the output goes through ELU.
///
/// # Reference
///
/// Velickovic et al., "Graph Attention Networks", ICLR 2018.
pub struct GraphAttention {
    weight: Tensor,
    att_src: Tensor, // (out, 1)
    att_dst: Tensor, // (out, 1)
    negative_slope: f64,
    dropout: Dropout,
    concat: bool,
}

/// Logit assigned to non-edges before the attention softmax.
const MASKED_LOGIT: f32 = -9e15;

impl GraphAttention {
    /// Create a new attention layer.
    ///
    /// # Arguments
    /// - `in_features`: Input feature dimension
    /// - `out_features`: Output feature dimension
    /// - `dropout`: Dropout applied to attention coefficients while training
    /// - `negative_slope`: LeakyReLU negative slope (typically 0.2)
    /// - `concat`: Hidden head (ELU output) vs. final layer (linear output)
    /// - `vb`: Variable builder
    pub fn new(
        in_features: usize,
        out_features: usize,
        dropout: f32,
        negative_slope: f64,
        concat: bool,
        vb: VarBuilder,
    ) -> Result<Self> {
        let weight = vb.get_with_hints(
            (in_features, out_features),
            "weight",
            xavier_uniform(in_features, out_features),
        )?;
        // a = [a_src || a_dst], initialized as one (2 * out, 1) vector
        let att_src = vb.get_with_hints(
            (out_features, 1),
            "att_src",
            xavier_uniform(2 * out_features, 1),
        )?;
        let att_dst = vb.get_with_hints(
            (out_features, 1),
            "att_dst",
            xavier_uniform(2 * out_features, 1),
        )?;

        Ok(Self {
            weight,
            att_src,
            att_dst,
            negative_slope,
            dropout: Dropout::new(dropout),
            concat,
        })
    }

    /// Forward pass with masked attention.
    ///
    /// # Arguments
    /// - `x`: Node features (N x in_features)
    /// - `adj`: Adjacency (N x N); entries > 0 are edges
    /// - `train`: Enables attention dropout
    ///
    /// # Returns
    /// - Node embeddings (N x out_features)
    pub fn forward_t(&self, x: &Tensor, adj: &Tensor, train: bool) -> Result<Tensor> {
        let n = x.dim(0)?;
        let h = x.matmul(&self.weight)?;

        // e_ij = LeakyReLU(h_i . a_src + h_j . a_dst)
        let src = h.matmul(&self.att_src)?; // (N, 1)
        let dst = h.matmul(&self.att_dst)?.t()?; // (1, N)
        let e = leaky_relu(&src.broadcast_add(&dst)?, self.negative_slope)?;

        let mask = adj.gt(0f64)?;
        let masked = Tensor::full(MASKED_LOGIT, (n, n), x.device())?.to_dtype(e.dtype())?;
        let attention = mask.where_cond(&e, &masked)?;
        let attention = candle_nn::ops::softmax(&attention, 1)?;
        let attention = self.dropout.forward_t(&attention, train)?;

        let h_prime = attention.matmul(&h)?;
        if self.concat {
            h_prime.elu(1.0)
        } else {
            Ok(h_prime)
        }
    }
}

/// LeakyReLU: x for x > 0, slope * x otherwise.
pub fn leaky_relu(x: &Tensor, negative_slope: f64) -> Result<Tensor> {
    let negative = (x.neg()?.relu()? * negative_slope)?;
    x.relu()? - negative
}

/// Linear -> ReLU -> Dropout -> Linear.
pub struct Mlp {
    input: Linear,
    output: Linear,
    dropout: Dropout,
}

impl Mlp {
    pub fn new(
        in_features: usize,
        hidden: usize,
        out_features: usize,
        dropout: f32,
        vb: VarBuilder,
    ) -> Result<Self> {
        Ok(Self {
            input: linear(in_features, hidden, vb.pp("0"))?,
            output: linear(hidden, out_features, vb.pp("1"))?,
            dropout: Dropout::new(dropout),
        })
    }

    pub fn forward_t(&self, x: &Tensor, train: bool) -> Result<Tensor> {
        let h = self.input.forward(x)?.relu()?;
        let h = self.dropout.forward_t(&h, train)?;
        self.output.forward(&h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn path_adj(device: &Device) -> Tensor {
        // normalized 3-node path with self-loops
        let s = 1.0 / 6f32.sqrt();
        Tensor::new(
            &[[0.5f32, s, 0.0], [s, 1.0 / 3.0, s], [0.0, s, 0.5]],
            device,
        )
        .unwrap()
    }

    #[test]
    fn test_graph_conv_forward_shape() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let gcn = GraphConv::new(4, 8, true, vb).unwrap();
        let x = Tensor::randn(0f32, 1f32, (3, 4), &device).unwrap();
        let out = gcn.forward(&x, &path_adj(&device)).unwrap();
        assert_eq!(out.dims(), &[3, 8]);
    }

    #[test]
    fn test_identity_adjacency_is_plain_linear() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let gcn = GraphConv::new(2, 2, false, vb).unwrap();
        let x = Tensor::new(&[[1f32, 2.0], [3.0, 4.0]], &device).unwrap();
        let eye = Tensor::eye(2, DType::F32, &device).unwrap();
        let via_graph = gcn.forward(&x, &eye).unwrap();
        let direct = x.matmul(&gcn.weight).unwrap();
        let diff = (via_graph - direct).unwrap().abs().unwrap().sum_all().unwrap();
        assert!(diff.to_scalar::<f32>().unwrap() < 1e-6);
    }

    #[test]
    fn test_attention_respects_mask() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let gat = GraphAttention::new(3, 4, 0.0, 0.2, false, vb).unwrap();
        // node 2 is isolated except for its self-loop
        let adj = Tensor::new(
            &[[1f32, 1.0, 0.0], [1.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            &device,
        )
        .unwrap();
        let x = Tensor::randn(0f32, 1f32, (3, 3), &device).unwrap();
        let out = gat.forward_t(&x, &adj, false).unwrap();
        assert_eq!(out.dims(), &[3, 4]);

        // an isolated node attends only to itself: output equals its own W h
        let h = x.matmul(&gat.weight).unwrap();
        let own = h.get(2).unwrap();
        let diff = (out.get(2).unwrap() - own).unwrap().abs().unwrap().sum_all().unwrap();
        assert!(diff.to_scalar::<f32>().unwrap() < 1e-5);
    }

    #[test]
    fn test_leaky_relu() {
        let device = Device::Cpu;
        let x = Tensor::new(&[-2f32, 0.0, 3.0], &device).unwrap();
        let y = leaky_relu(&x, 0.2).unwrap().to_vec1::<f32>().unwrap();
        assert!((y[0] + 0.4).abs() < 1e-6);
        assert_eq!(y[1], 0.0);
        assert_eq!(y[2], 3.0);
    }

    #[test]
    fn test_mlp_shape() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let mlp = Mlp::new(5, 7, 1, 0.2, vb).unwrap();
        let x = Tensor::randn(0f32, 1f32, (4, 5), &device).unwrap();
        assert_eq!(mlp.forward_t(&x, true).unwrap().dims(), &[4, 1]);
        assert_eq!(mlp.forward_t(&x, false).unwrap().dims(), &[4, 1]);
    }
}
