//! Request and response bodies.
//!
//! Integer knobs are accepted as `i64` so out-of-range values (including
//! negatives) reach validation and get a descriptive 400 instead of a
//! deserialization rejection.

use std::collections::BTreeMap;

use propago_graph::stats::EvaluationMetrics;
use propago_graph::GraphSource;
use propago_nn::scoring::RankedNode;
use propago_nn::TrainingReport;
use serde::{Deserialize, Serialize};

pub type Scores = BTreeMap<String, f64>;

fn default_model_type() -> String {
    "simple".to_string()
}

fn default_loss_type() -> String {
    "smooth".to_string()
}

fn default_compare_models() -> Vec<String> {
    vec!["simple".to_string(), "deep".to_string(), "gat".to_string()]
}

fn default_epochs() -> i64 {
    50
}

fn default_hidden_dim() -> i64 {
    32
}

fn default_dropout() -> f64 {
    0.2
}

fn default_learning_rate() -> f64 {
    0.01
}

fn default_correlation_threshold() -> f64 {
    0.3
}

fn default_knn_k() -> i64 {
    5
}

fn default_n_clusters() -> i64 {
    5
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub nodes: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub adjacency: Vec<Vec<i64>>,
    #[serde(default)]
    pub train_epochs: i64,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub scores: Scores,
    pub info: PredictInfo,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PredictInfo {
    Empty {
        error: String,
    },
    Scored {
        n_nodes: usize,
        n_features: usize,
        train_epochs: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        training: Option<TrainingReport>,
    },
}

#[derive(Debug, Deserialize)]
pub struct AdvancedRequest {
    pub nodes: Vec<String>,
    pub features: Vec<Vec<f64>>,
    #[serde(default)]
    pub adjacency: Option<Vec<Vec<i64>>>,
    /// Per-node return series for a correlation graph.
    #[serde(default)]
    pub returns: Option<Vec<Vec<f64>>>,
    /// Per-node sector labels for a co-membership graph.
    #[serde(default)]
    pub sectors: Option<Vec<String>>,
    #[serde(default = "default_model_type")]
    pub model_type: String,
    #[serde(default = "default_epochs")]
    pub train_epochs: i64,
    #[serde(default = "default_hidden_dim")]
    pub hidden_dim: i64,
    #[serde(default = "default_dropout")]
    pub dropout: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_correlation_threshold")]
    pub correlation_threshold: f64,
    #[serde(default)]
    pub use_knn_graph: bool,
    #[serde(default = "default_knn_k")]
    pub knn_k: i64,
    #[serde(default = "default_loss_type")]
    pub loss_type: String,
    /// Realized outcomes, one per node.
    #[serde(default)]
    pub targets: Option<Vec<f64>>,
}

#[derive(Debug, Serialize)]
pub struct AdvancedResponse {
    pub scores: Scores,
    pub ranking: Vec<RankedNode>,
    pub model_type: String,
    pub info: AdvancedInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationMetrics>,
}

#[derive(Debug, Serialize)]
pub struct AdvancedInfo {
    pub n_nodes: usize,
    pub n_features: usize,
    pub n_edges: usize,
    pub n_components: usize,
    pub graph_source: GraphSource,
    pub loss_type: String,
    pub train_epochs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training: Option<TrainingReport>,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub nodes: Vec<String>,
    pub features: Vec<Vec<f64>>,
    #[serde(default)]
    pub adjacency: Option<Vec<Vec<i64>>>,
    #[serde(default = "default_compare_models")]
    pub model_types: Vec<String>,
    #[serde(default = "default_epochs")]
    pub train_epochs: i64,
    #[serde(default)]
    pub returns: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub results: BTreeMap<String, ModelOutcome>,
    pub model_agreement: Vec<ModelAgreement>,
    pub n_nodes: usize,
    pub n_features: usize,
}

/// Per-model result; a failing model is reported inline.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ModelOutcome {
    Scored {
        scores: Scores,
        top5: Vec<(String, f64)>,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct ModelAgreement {
    pub model1: String,
    pub model2: String,
    pub spearman: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ClusterRequest {
    pub nodes: Vec<String>,
    pub features: Vec<Vec<f64>>,
    #[serde(default = "default_n_clusters")]
    pub n_clusters: i64,
}

#[derive(Debug, Serialize)]
pub struct ClusterResponse {
    pub clusters: BTreeMap<String, Vec<ClusterPoint>>,
    pub cluster_centers: Vec<ClusterCenter>,
    pub node_labels: BTreeMap<String, usize>,
    pub pca_explained_variance: Vec<f64>,
    pub n_clusters: usize,
}

#[derive(Debug, Serialize)]
pub struct ClusterPoint {
    pub node: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize)]
pub struct ClusterCenter {
    pub cluster: usize,
    pub center: Vec<f64>,
    pub size: usize,
}

#[derive(Debug, Deserialize)]
pub struct ImportanceRequest {
    pub nodes: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub feature_names: Vec<String>,
    pub adjacency: Vec<Vec<i64>>,
}

#[derive(Debug, Serialize)]
pub struct ImportanceResponse {
    pub feature_importance: Vec<FeatureScore>,
    pub top_features: Vec<FeatureScore>,
    pub method: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureScore {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
    pub uptime_ms: u128,
    pub cuda_available: bool,
}
