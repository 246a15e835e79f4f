//! Synchronous request orchestration.
//!
//! Each function validates its request, builds the graph, runs a fresh
//! [`Session`] and formats the response. They are CPU-bound and are called
//! from `spawn_blocking` by the handlers and directly by the CLI.

use std::collections::BTreeMap;

use candle_core::Device;
use ndarray::Array2;
use propago_graph::adjacency::{edge_count, from_edge_list};
use propago_graph::cluster::{kmeans, KMeansConfig};
use propago_graph::components::connected_components;
use propago_graph::pca::project_2d;
use propago_graph::stats::{evaluate_predictions, spearman};
use propago_graph::{build_graph, GraphSpec};
use propago_nn::scoring::{rank_nodes, rescale_scores, top_k};
use propago_nn::{
    GraphInputs, ModelConfig, ModelKind, Objective, ObjectiveKind, Session, TrainingConfig,
    TrainingReport,
};

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::types::{
    AdvancedInfo, AdvancedRequest, AdvancedResponse, ClusterCenter, ClusterPoint, ClusterRequest,
    ClusterResponse, CompareRequest, CompareResponse, FeatureScore, ImportanceRequest,
    ImportanceResponse, ModelAgreement, ModelOutcome, PredictInfo, PredictRequest,
    PredictResponse, Scores,
};
use crate::validate;

/// Hidden width of the model trained for feature importance.
const IMPORTANCE_HIDDEN: usize = 32;
const TOP_MODELS: usize = 5;
const TOP_FEATURES: usize = 5;

fn device() -> Device {
    Device::Cpu
}

fn score_map(nodes: &[String], scores: &[f64]) -> Scores {
    nodes.iter().cloned().zip(scores.iter().copied()).collect()
}

/// Fit a fresh model of `kind` and return its raw outputs.
fn fit_and_score(
    kind: ModelKind,
    model: &ModelConfig,
    inputs: &GraphInputs,
    training: &TrainingConfig,
) -> Result<(Vec<f32>, Option<TrainingReport>), ApiError> {
    let session = Session::new(kind, model, &device())?;
    let report = session.train(inputs, training)?;
    let raw = session.predict(inputs)?;
    Ok((raw, report))
}

#[tracing::instrument(level = "debug", skip_all, fields(n_nodes = req.nodes.len()))]
pub fn predict(req: &PredictRequest) -> Result<PredictResponse, ApiError> {
    let epochs = validate::train_epochs(req.train_epochs)?;
    if req.nodes.is_empty() && req.features.is_empty() {
        return Ok(PredictResponse {
            scores: Scores::new(),
            info: PredictInfo::Empty {
                error: "no nodes".to_string(),
            },
        });
    }
    let features = validate::feature_matrix(&req.nodes, &req.features)?;
    let (n, f) = features.dim();

    let adjacency = from_edge_list(n, &req.adjacency);
    let inputs = GraphInputs::new(&features, &adjacency, &device())?;
    let model = ModelConfig::new(f).with_hidden_dim((2 * f).max(16));
    let (raw, training) = fit_and_score(
        ModelKind::Simple,
        &model,
        &inputs,
        &TrainingConfig::default().with_epochs(epochs),
    )?;

    Ok(PredictResponse {
        scores: score_map(&req.nodes, &rescale_scores(&raw)),
        info: PredictInfo::Scored {
            n_nodes: n,
            n_features: f,
            train_epochs: epochs,
            training,
        },
    })
}

#[tracing::instrument(level = "debug", skip_all, fields(n_nodes = req.nodes.len(), model = %req.model_type))]
pub fn advanced(req: &AdvancedRequest) -> Result<AdvancedResponse, ApiError> {
    validate::require_nodes(&req.nodes)?;
    let features = validate::feature_matrix(&req.nodes, &req.features)?;
    let (n, f) = features.dim();

    let epochs = validate::train_epochs(req.train_epochs)?;
    let hidden = validate::int_in("hidden_dim", req.hidden_dim, 8, 256)?;
    let dropout = validate::float_in("dropout", req.dropout, 0.0, 0.5)?;
    let lr = validate::float_in("learning_rate", req.learning_rate, 1e-4, 0.1)?;
    let threshold = validate::float_in("correlation_threshold", req.correlation_threshold, 0.0, 1.0)?;
    let knn_k = validate::int_in("knn_k", req.knn_k, 1, 20)?;

    let loss_kind: ObjectiveKind = req
        .loss_type
        .parse()
        .map_err(|e: propago_nn::Error| ApiError::InvalidInput(e.to_string()))?;
    let targets = req
        .targets
        .as_deref()
        .map(|t| validate::targets(t, n))
        .transpose()?;
    if loss_kind.needs_targets() && targets.is_none() {
        return Err(ApiError::InvalidInput(format!(
            "loss_type '{}' requires targets",
            loss_kind.as_str()
        )));
    }

    let mut spec = GraphSpec::default().with_correlation_threshold(threshold);
    if let Some(edges) = &req.adjacency {
        spec = spec.with_edges(edges.clone());
    }
    if let Some(returns) = &req.returns {
        spec = spec.with_returns(validate::returns_matrix(returns, n)?);
    }
    if req.use_knn_graph {
        spec = spec.with_knn(knn_k);
    }
    if let Some(sectors) = &req.sectors {
        validate::sectors(sectors, n)?;
        spec = spec.with_sectors(sectors.clone());
    }

    let kind: ModelKind = req.model_type.parse()?;
    let objective = Objective::from_name(loss_kind.as_str(), targets.clone())?;

    let graph = build_graph(features.view(), &spec)?;
    let n_edges = edge_count(&graph.adjacency);
    let n_components = connected_components(&graph.adjacency);
    tracing::debug!(source = ?graph.source, n_edges, n_components, "graph built");

    let inputs = GraphInputs::new(&features, &graph.adjacency, &device())?;
    let model = ModelConfig::new(f)
        .with_hidden_dim(hidden)
        .with_dropout(dropout as f32);
    let training = TrainingConfig::default()
        .with_epochs(epochs)
        .with_learning_rate(lr)
        .with_objective(objective);
    let (raw, report) = fit_and_score(kind, &model, &inputs, &training)?;

    let scores = rescale_scores(&raw);
    let evaluation = targets
        .map(|t| {
            let predictions: Vec<f64> = raw.iter().map(|&v| f64::from(v)).collect();
            let actual: Vec<f64> = t.iter().map(|&v| f64::from(v)).collect();
            evaluate_predictions(&predictions, &actual)
        })
        .transpose()?;

    Ok(AdvancedResponse {
        ranking: rank_nodes(&req.nodes, &scores),
        scores: score_map(&req.nodes, &scores),
        model_type: kind.to_string(),
        info: AdvancedInfo {
            n_nodes: n,
            n_features: f,
            n_edges,
            n_components,
            graph_source: graph.source,
            loss_type: loss_kind.as_str().to_string(),
            train_epochs: epochs,
            training: report,
        },
        evaluation,
    })
}

#[tracing::instrument(level = "debug", skip_all, fields(n_nodes = req.nodes.len(), models = req.model_types.len()))]
pub fn compare(req: &CompareRequest, config: &ServiceConfig) -> Result<CompareResponse, ApiError> {
    validate::require_nodes(&req.nodes)?;
    let features = validate::feature_matrix(&req.nodes, &req.features)?;
    let (n, f) = features.dim();
    let epochs = validate::train_epochs(req.train_epochs)?;

    let mut spec =
        GraphSpec::default().with_correlation_threshold(config.compare_correlation_threshold);
    if let Some(edges) = &req.adjacency {
        spec = spec.with_edges(edges.clone());
    }
    if let Some(returns) = &req.returns {
        spec = spec.with_returns(validate::returns_matrix(returns, n)?);
    }
    let graph = build_graph(features.view(), &spec)?;
    let inputs = GraphInputs::new(&features, &graph.adjacency, &device())?;
    let training = TrainingConfig::default().with_epochs(epochs);

    let mut requested: Vec<&str> = Vec::new();
    for name in &req.model_types {
        if !requested.contains(&name.as_str()) {
            requested.push(name);
        }
    }

    let mut results = BTreeMap::new();
    let mut succeeded: Vec<(String, Vec<f64>)> = Vec::new();
    for name in requested {
        let outcome = name
            .parse::<ModelKind>()
            .map_err(ApiError::from)
            .and_then(|kind| fit_and_score(kind, &ModelConfig::new(f), &inputs, &training));
        match outcome {
            Ok((raw, _)) => {
                let scores = rescale_scores(&raw);
                results.insert(
                    name.to_string(),
                    ModelOutcome::Scored {
                        scores: score_map(&req.nodes, &scores),
                        top5: top_k(&req.nodes, &scores, TOP_MODELS),
                    },
                );
                succeeded.push((name.to_string(), scores));
            }
            Err(err) => {
                tracing::warn!(model = name, error = %err, "model failed during comparison");
                results.insert(
                    name.to_string(),
                    ModelOutcome::Failed {
                        error: err.to_string(),
                    },
                );
            }
        }
    }

    let mut model_agreement = Vec::new();
    for (i, (first, a)) in succeeded.iter().enumerate() {
        for (second, b) in &succeeded[i + 1..] {
            model_agreement.push(ModelAgreement {
                model1: first.clone(),
                model2: second.clone(),
                spearman: spearman(a, b),
            });
        }
    }

    Ok(CompareResponse {
        results,
        model_agreement,
        n_nodes: n,
        n_features: f,
    })
}

#[tracing::instrument(level = "debug", skip_all, fields(n_nodes = req.nodes.len()))]
pub fn cluster(req: &ClusterRequest) -> Result<ClusterResponse, ApiError> {
    let k = validate::int_in("n_clusters", req.n_clusters, 2, 20)?;
    let features = validate::feature_matrix(&req.nodes, &req.features)?;
    let n = features.nrows();
    if n < k {
        return Err(ApiError::InvalidInput(format!(
            "node count {n} is smaller than cluster count {k}"
        )));
    }

    let result = kmeans(features.view(), &KMeansConfig::default().with_clusters(k))?;
    let projection = project_2d(features.view());
    let sizes = result.sizes();

    let mut clusters: BTreeMap<String, Vec<ClusterPoint>> = BTreeMap::new();
    for (i, (node, &label)) in req.nodes.iter().zip(&result.labels).enumerate() {
        clusters.entry(label.to_string()).or_default().push(ClusterPoint {
            node: node.clone(),
            x: projection.coords[[i, 0]],
            y: projection.coords[[i, 1]],
        });
    }

    let cluster_centers = result
        .centers
        .outer_iter()
        .enumerate()
        .map(|(c, center)| ClusterCenter {
            cluster: c,
            center: center.to_vec(),
            size: sizes.get(c).copied().unwrap_or(0),
        })
        .collect();

    Ok(ClusterResponse {
        clusters,
        cluster_centers,
        node_labels: req.nodes.iter().cloned().zip(result.labels.iter().copied()).collect(),
        pca_explained_variance: projection.explained_variance_ratio.to_vec(),
        n_clusters: k,
    })
}

#[tracing::instrument(level = "debug", skip_all, fields(n_nodes = req.nodes.len()))]
pub fn importance(
    req: &ImportanceRequest,
    config: &ServiceConfig,
) -> Result<ImportanceResponse, ApiError> {
    validate::require_nodes(&req.nodes)?;
    let features = validate::feature_matrix(&req.nodes, &req.features)?;
    let (n, f) = features.dim();
    if req.feature_names.len() != f {
        return Err(ApiError::InvalidInput(format!(
            "feature_names has {} entries but features have {f} columns",
            req.feature_names.len()
        )));
    }

    let adjacency: Array2<f32> = from_edge_list(n, &req.adjacency);
    let inputs = GraphInputs::new(&features, &adjacency, &device())?;
    let session = Session::new(
        ModelKind::Simple,
        &ModelConfig::new(f).with_hidden_dim(IMPORTANCE_HIDDEN),
        &device(),
    )?;
    session.train(
        &inputs,
        &TrainingConfig::default().with_epochs(config.importance_epochs),
    )?;
    let importance = session.feature_importance(&inputs)?;

    let mut ranked: Vec<FeatureScore> = req
        .feature_names
        .iter()
        .zip(&importance)
        .map(|(name, &value)| FeatureScore {
            feature: name.clone(),
            importance: f64::from(value),
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    Ok(ImportanceResponse {
        top_features: ranked.iter().take(TOP_FEATURES).cloned().collect(),
        feature_importance: ranked,
        method: "gradient_based",
    })
}
