//! Training objectives.
//!
//! Callers rarely have labels, so the default objectives are self-supervised
//! proxies over the graph:
//!
//! - **Smoothness**: connected nodes should score alike, with a small
//!   variance bonus so the outputs do not collapse to a constant.
//! - **Contrastive**: the pairwise product `s_i * s_j` acts as a logit; edges
//!   are positives, non-edges are negatives (binary cross-entropy).
//! - **Variance**: maximize output spread.
//!
//! When targets are available, **Ranking** (pairwise hinge) and **Combined**
//! (`alpha * MSE + (1 - alpha) * Ranking`) train against them directly.

use std::str::FromStr;

use candle_core::{DType, Tensor};

use crate::error::{Error, Result};

/// Weight of the negative-variance term inside the smoothness objective.
pub const SPREAD_WEIGHT: f64 = 0.1;
/// Default hinge margin for the ranking objective.
pub const DEFAULT_MARGIN: f64 = 0.1;
/// Default MSE weight for the combined objective.
pub const DEFAULT_ALPHA: f64 = 0.5;

/// A training objective over raw node scores `(N,)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Objective {
    #[default]
    Smoothness,
    Contrastive,
    Variance,
    Ranking { targets: Vec<f32>, margin: f64 },
    Combined { targets: Vec<f32>, alpha: f64, margin: f64 },
}

impl Objective {
    /// Resolve an objective from its request name.
    ///
    /// `ranking` and `combined` need `targets`.
    pub fn from_name(name: &str, targets: Option<Vec<f32>>) -> Result<Self> {
        let kind: ObjectiveKind = name.parse()?;
        match (kind, targets) {
            (ObjectiveKind::Smoothness, _) => Ok(Objective::Smoothness),
            (ObjectiveKind::Contrastive, _) => Ok(Objective::Contrastive),
            (ObjectiveKind::Variance, _) => Ok(Objective::Variance),
            (ObjectiveKind::Ranking, Some(targets)) => Ok(Objective::Ranking {
                targets,
                margin: DEFAULT_MARGIN,
            }),
            (ObjectiveKind::Combined, Some(targets)) => Ok(Objective::Combined {
                targets,
                alpha: DEFAULT_ALPHA,
                margin: DEFAULT_MARGIN,
            }),
            (kind, None) => Err(Error::InvalidConfig(format!(
                "loss_type '{}' requires targets",
                kind.as_str()
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Objective::Smoothness => ObjectiveKind::Smoothness.as_str(),
            Objective::Contrastive => ObjectiveKind::Contrastive.as_str(),
            Objective::Variance => ObjectiveKind::Variance.as_str(),
            Objective::Ranking { .. } => ObjectiveKind::Ranking.as_str(),
            Objective::Combined { .. } => ObjectiveKind::Combined.as_str(),
        }
    }

    /// Scalar loss for scores `out` `(N,)` on normalized adjacency `adj` `(N, N)`.
    pub fn loss(&self, out: &Tensor, adj: &Tensor) -> Result<Tensor> {
        let loss = match self {
            Objective::Smoothness => smoothness_loss(out, adj)?,
            Objective::Contrastive => contrastive_loss(out, adj)?,
            Objective::Variance => unbiased_variance(out)?.neg()?,
            Objective::Ranking { targets, margin } => ranking_loss(out, targets, *margin)?,
            Objective::Combined {
                targets,
                alpha,
                margin,
            } => {
                let mse = mse_loss(out, targets)?;
                let rank = ranking_loss(out, targets, *margin)?;
                ((mse * *alpha)? + (rank * (1.0 - *alpha))?)?
            }
        };
        Ok(loss)
    }
}

/// Objective names accepted at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveKind {
    Smoothness,
    Contrastive,
    Variance,
    Ranking,
    Combined,
}

impl ObjectiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectiveKind::Smoothness => "smooth",
            ObjectiveKind::Contrastive => "contrast",
            ObjectiveKind::Variance => "variance",
            ObjectiveKind::Ranking => "ranking",
            ObjectiveKind::Combined => "combined",
        }
    }

    pub fn needs_targets(self) -> bool {
        matches!(self, ObjectiveKind::Ranking | ObjectiveKind::Combined)
    }
}

impl FromStr for ObjectiveKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [
            ObjectiveKind::Smoothness,
            ObjectiveKind::Contrastive,
            ObjectiveKind::Variance,
            ObjectiveKind::Ranking,
            ObjectiveKind::Combined,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == s)
        .ok_or_else(|| Error::InvalidConfig(format!("unknown loss_type '{s}'")))
    }
}

/// Unbiased sample variance; zero when fewer than two values.
pub fn unbiased_variance(out: &Tensor) -> candle_core::Result<Tensor> {
    let n = out.dim(0)?;
    if n < 2 {
        return Tensor::zeros((), out.dtype(), out.device());
    }
    let centered = out.broadcast_sub(&out.mean_all()?)?;
    centered.sqr()?.sum_all()?.affine(1.0 / (n - 1) as f64, 0.0)
}

/// Mean over neighbors of `(s_i - s_j)^2`, averaged over nodes, minus
/// `SPREAD_WEIGHT` times the output variance.
pub fn smoothness_loss(out: &Tensor, adj: &Tensor) -> candle_core::Result<Tensor> {
    let n = out.dim(0)?;
    if n == 0 {
        return Tensor::zeros((), out.dtype(), out.device());
    }
    let diff2 = out
        .unsqueeze(1)?
        .broadcast_sub(&out.unsqueeze(0)?)?
        .sqr()?;
    let mask = adj.gt(0f64)?.to_dtype(out.dtype())?;
    let degree = mask.sum(1)?.maximum(1f64)?;
    let per_node = (diff2 * &mask)?.sum(1)?.div(&degree)?;
    let smooth = per_node.mean_all()?;
    smooth - (unbiased_variance(out)? * SPREAD_WEIGHT)?
}

/// Binary cross-entropy on `s_i * s_j` logits: edges toward 1, non-edges
/// toward 0. A pair set with no members contributes 0.
pub fn contrastive_loss(out: &Tensor, adj: &Tensor) -> candle_core::Result<Tensor> {
    let similarity = out.unsqueeze(1)?.broadcast_mul(&out.unsqueeze(0)?)?;
    let positive = adj.gt(0f64)?.to_dtype(out.dtype())?;
    let negative = adj.eq(0f64)?.to_dtype(out.dtype())?;

    // -log(sigmoid(x)) = softplus(-x), -log(1 - sigmoid(x)) = softplus(x)
    let pos_loss = masked_mean(&softplus(&similarity.neg()?)?, &positive)?;
    let neg_loss = masked_mean(&softplus(&similarity)?, &negative)?;
    pos_loss + neg_loss
}

/// Mean pairwise hinge `relu(margin - sign(t_i - t_j) * (p_i - p_j))` over `i < j`.
pub fn ranking_loss(pred: &Tensor, targets: &[f32], margin: f64) -> Result<Tensor> {
    let n = pred.dim(0)?;
    if targets.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            got: targets.len(),
        });
    }
    if n < 2 {
        return Ok(Tensor::zeros((), pred.dtype(), pred.device())?);
    }

    let mut sign = vec![0f32; n * n];
    let mut upper = vec![0f32; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            sign[i * n + j] = pair_sign(targets[i], targets[j]);
            upper[i * n + j] = 1.0;
        }
    }
    let sign = Tensor::from_vec(sign, (n, n), pred.device())?.to_dtype(pred.dtype())?;
    let upper = Tensor::from_vec(upper, (n, n), pred.device())?.to_dtype(pred.dtype())?;

    let diff = pred.unsqueeze(1)?.broadcast_sub(&pred.unsqueeze(0)?)?;
    let hinge = (sign * diff)?.affine(-1.0, margin)?.relu()?;
    let pairs = (n * (n - 1) / 2) as f64;
    Ok((hinge * upper)?.sum_all()?.affine(1.0 / pairs, 0.0)?)
}

/// Mean squared error against `targets`.
pub fn mse_loss(pred: &Tensor, targets: &[f32]) -> Result<Tensor> {
    let n = pred.dim(0)?;
    if targets.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            got: targets.len(),
        });
    }
    let targets = Tensor::from_slice(targets, n, pred.device())?.to_dtype(pred.dtype())?;
    Ok(pred.sub(&targets)?.sqr()?.mean_all()?)
}

fn pair_sign(a: f32, b: f32) -> f32 {
    if a > b {
        1.0
    } else if a < b {
        -1.0
    } else {
        0.0
    }
}

/// `log(1 + exp(x))` without overflow.
fn softplus(x: &Tensor) -> candle_core::Result<Tensor> {
    let tail = x.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?;
    x.relu()? + tail
}

fn masked_mean(values: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
    let count = mask.sum_all()?.to_dtype(DType::F64)?.to_scalar::<f64>()?;
    if count == 0.0 {
        return Tensor::zeros((), values.dtype(), values.device());
    }
    (values * mask)?.sum_all()?.affine(1.0 / count, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn scalar(t: Tensor) -> f32 {
        t.to_scalar::<f32>().unwrap()
    }

    #[test]
    fn test_variance_small_inputs() {
        let d = Device::Cpu;
        let one = Tensor::new(&[3f32], &d).unwrap();
        assert_eq!(scalar(unbiased_variance(&one).unwrap()), 0.0);

        let two = Tensor::new(&[1f32, 3.0], &d).unwrap();
        assert!((scalar(unbiased_variance(&two).unwrap()) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_smoothness_constant_output_is_zero() {
        let d = Device::Cpu;
        let out = Tensor::new(&[1f32, 1.0, 1.0], &d).unwrap();
        let adj = Tensor::ones((3, 3), DType::F32, &d).unwrap();
        assert!(scalar(smoothness_loss(&out, &adj).unwrap()).abs() < 1e-6);
    }

    #[test]
    fn test_smoothness_penalizes_disagreeing_neighbors() {
        let d = Device::Cpu;
        let adj = Tensor::new(&[[1f32, 1.0], [1.0, 1.0]], &d).unwrap();
        let far = Tensor::new(&[0f32, 2.0], &d).unwrap();
        let near = Tensor::new(&[0f32, 0.5], &d).unwrap();
        let far_loss = scalar(smoothness_loss(&far, &adj).unwrap());
        let near_loss = scalar(smoothness_loss(&near, &adj).unwrap());
        assert!(far_loss > near_loss);
    }

    #[test]
    fn test_contrastive_fully_connected_is_finite() {
        // no negative pairs at all
        let d = Device::Cpu;
        let out = Tensor::new(&[0.5f32, -1.0, 2.0], &d).unwrap();
        let adj = Tensor::ones((3, 3), DType::F32, &d).unwrap();
        let loss = scalar(contrastive_loss(&out, &adj).unwrap());
        assert!(loss.is_finite());
        assert!(loss > 0.0);
    }

    #[test]
    fn test_contrastive_large_logits_stay_finite() {
        let d = Device::Cpu;
        let out = Tensor::new(&[100f32, -100.0], &d).unwrap();
        let adj = Tensor::new(&[[1f32, 0.0], [0.0, 1.0]], &d).unwrap();
        assert!(scalar(contrastive_loss(&out, &adj).unwrap()).is_finite());
    }

    #[test]
    fn test_ranking_loss_ordering() {
        let d = Device::Cpu;
        let targets = [3.0f32, 2.0, 1.0];
        let agree = Tensor::new(&[3f32, 2.0, 1.0], &d).unwrap();
        let reversed = Tensor::new(&[1f32, 2.0, 3.0], &d).unwrap();
        assert_eq!(scalar(ranking_loss(&agree, &targets, 0.1).unwrap()), 0.0);
        assert!(scalar(ranking_loss(&reversed, &targets, 0.1).unwrap()) > 1.0);
    }

    #[test]
    fn test_ranking_ties_cost_margin() {
        let d = Device::Cpu;
        let out = Tensor::new(&[5f32, -5.0], &d).unwrap();
        let loss = scalar(ranking_loss(&out, &[1.0, 1.0], 0.1).unwrap());
        assert!((loss - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_ranking_length_mismatch() {
        let d = Device::Cpu;
        let out = Tensor::new(&[1f32, 2.0], &d).unwrap();
        assert!(matches!(
            ranking_loss(&out, &[1.0], 0.1),
            Err(Error::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_objective_names() {
        assert_eq!(Objective::from_name("smooth", None).unwrap(), Objective::Smoothness);
        assert_eq!(Objective::from_name("contrast", None).unwrap().name(), "contrast");
        assert!(Objective::from_name("ranking", None).is_err());
        assert!(Objective::from_name("combined", Some(vec![1.0])).is_ok());
        assert!(Objective::from_name("huber", None).is_err());
        assert!(ObjectiveKind::Combined.needs_targets());
    }

    #[test]
    fn test_combined_blends_terms() {
        let d = Device::Cpu;
        let out = Tensor::new(&[1f32, 0.0], &d).unwrap();
        let adj = Tensor::eye(2, DType::F32, &d).unwrap();
        let objective = Objective::Combined {
            targets: vec![1.0, 0.0],
            alpha: 0.5,
            margin: 0.1,
        };
        // perfect fit and ordering with gap 1 > margin
        assert!(scalar(objective.loss(&out, &adj).unwrap()).abs() < 1e-6);
    }
}
