//! Conversions between `ndarray` matrices and candle tensors.

use candle_core::{Device, Tensor};
use ndarray::{Array2, Array3};

use crate::error::Result;

/// Copy a row-major `(rows, cols)` matrix into an `F32` tensor.
pub fn matrix_to_tensor(a: &Array2<f32>, device: &Device) -> Result<Tensor> {
    let t = Tensor::from_iter(a.iter().copied(), device)?.reshape(a.dim())?;
    Ok(t)
}

/// Copy a `(N, T, F)` sequence block into an `F32` tensor.
pub fn sequence_to_tensor(a: &Array3<f32>, device: &Device) -> Result<Tensor> {
    let t = Tensor::from_iter(a.iter().copied(), device)?.reshape(a.dim())?;
    Ok(t)
}

/// Flatten a tensor into a `Vec<f32>`.
pub fn to_vec(t: &Tensor) -> Result<Vec<f32>> {
    Ok(t.flatten_all()?.to_dtype(candle_core::DType::F32)?.to_vec1::<f32>()?)
}
