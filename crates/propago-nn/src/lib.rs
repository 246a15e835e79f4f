//! Graph neural network scoring on candle.
//!
//! `propago-nn` holds the model family, the training objectives and the
//! per-request lifecycle that fits a freshly initialized model and reads
//! scores or feature importance out of it. Graph construction lives in
//! `propago-graph`.
//!
//! # Modules
//!
//! - [`layers`]: message-passing layers (GCN, dense GAT) and an MLP block
//! - [`models`]: Simple, Deep, GAT, Hybrid and Temporal architectures
//! - [`loss`]: smoothness, contrastive, variance, ranking and combined objectives
//! - [`trainer`]: fixed-epoch AdamW loop with loss snapshots
//! - [`scoring`]: min-max rescaling and rankings
//! - [`explain`]: input-gradient feature importance
//! - [`session`]: construct, train, infer
//!
//! # Example
//!
//! ```rust,ignore
//! use candle_core::Device;
//! use propago_graph::adjacency::from_edge_list;
//! use propago_nn::{GraphInputs, ModelConfig, ModelKind, Session, TrainingConfig};
//!
//! let adj = from_edge_list(3, &[vec![0, 1], vec![1, 2]]);
//! let inputs = GraphInputs::new(&features, &adj, &Device::Cpu)?;
//!
//! let session = Session::new(ModelKind::Gat, &ModelConfig::new(2), &Device::Cpu)?;
//! session.train(&inputs, &TrainingConfig::default().with_epochs(50))?;
//! let scores = propago_nn::scoring::rescale_scores(&session.predict(&inputs)?);
//! ```

pub mod error;
pub mod explain;
pub mod layers;
pub mod loss;
pub mod models;
pub mod scoring;
pub mod session;
pub mod tensor;
pub mod trainer;

pub use error::{Error, Result};
pub use loss::{Objective, ObjectiveKind};
pub use models::{build_model, GraphModel, ModelConfig, ModelKind};
pub use session::{GraphInputs, Session};
pub use trainer::{LossSnapshot, TrainingConfig, TrainingReport};
