use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use propago_server::config::ServiceConfig;
use propago_server::server::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> axum::Router {
    router(AppState::new(
        ServiceConfig::default().with_importance_epochs(5),
    ))
}

async fn call(method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (status, body) = call("GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    let endpoints = body["endpoints"].as_array().unwrap();
    assert!(endpoints.iter().any(|e| e == "/gcn/importance"));
}

#[tokio::test]
async fn test_health() {
    let (status, body) = call("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["cuda_available"].is_boolean());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_predict_three_nodes() {
    let (status, body) = call(
        "POST",
        "/gcn/predict",
        Some(json!({
            "nodes": ["A", "B", "C"],
            "features": [[1, 0], [0, 1], [1, 1]],
            "adjacency": [[0, 1], [1, 2]]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let scores = body["scores"].as_object().unwrap();
    let mut keys: Vec<&str> = scores.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["A", "B", "C"]);
    for value in scores.values() {
        let s = value.as_f64().unwrap();
        assert!((0.0..=100.0).contains(&s));
    }
    assert_eq!(body["info"]["n_nodes"], 3);
    assert!(body["info"].get("training").is_none());
}

#[tokio::test]
async fn test_predict_with_training_reports_history() {
    let (status, body) = call(
        "POST",
        "/gcn/predict",
        Some(json!({
            "nodes": ["A", "B", "C", "D"],
            "features": [[1.0, 0.2], [0.0, 1.0], [1.0, 1.0], [0.3, 0.3]],
            "adjacency": [[0, 1], [2, 3], [7, 1]],
            "train_epochs": 20
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["training"]["history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_predict_no_nodes() {
    let (status, body) = call(
        "POST",
        "/gcn/predict",
        Some(json!({"nodes": [], "features": [], "adjacency": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["error"], "no nodes");
}

#[tokio::test]
async fn test_predict_epochs_out_of_range() {
    let (status, body) = call(
        "POST",
        "/gcn/predict",
        Some(json!({
            "nodes": ["A"],
            "features": [[1.0]],
            "adjacency": [],
            "train_epochs": 501
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("train_epochs"));
}

#[tokio::test]
async fn test_advanced_correlation_graph() {
    let (status, body) = call(
        "POST",
        "/gcn/advanced",
        Some(json!({
            "nodes": ["A", "B", "C"],
            "features": [[1.0, 0.5], [0.2, 0.1], [0.9, 0.4]],
            "returns": [[0.01, 0.02, -0.01, 0.03], [0.02, 0.04, -0.02, 0.06], [0.03, -0.01, 0.02, -0.02]],
            "model_type": "gat",
            "train_epochs": 5,
            "hidden_dim": 8
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_type"], "gat");
    assert_eq!(body["info"]["graph_source"], "correlation");
    let ranking = body["ranking"].as_array().unwrap();
    assert_eq!(ranking.len(), 3);
    assert_eq!(ranking[0]["rank"], 1);
}

#[tokio::test]
async fn test_advanced_unknown_model_is_500() {
    let (status, body) = call(
        "POST",
        "/gcn/advanced",
        Some(json!({
            "nodes": ["A", "B"],
            "features": [[1.0], [2.0]],
            "model_type": "transformer"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Unknown model type: transformer");
}

#[tokio::test]
async fn test_compare_inline_error() {
    let (status, body) = call(
        "POST",
        "/gcn/compare",
        Some(json!({
            "nodes": ["A", "B", "C"],
            "features": [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            "model_types": ["simple", "bogus"],
            "train_epochs": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"]["simple"]["scores"].as_object().unwrap().len(), 3);
    assert!(body["results"]["simple"]["top5"].is_array());
    assert!(body["results"]["bogus"]["error"].is_string());
    assert!(body["model_agreement"].as_array().unwrap().is_empty());
    assert_eq!(body["n_nodes"], 3);
    assert_eq!(body["n_features"], 2);
}

#[tokio::test]
async fn test_cluster_too_many_clusters() {
    let (status, body) = call(
        "POST",
        "/gcn/cluster",
        Some(json!({
            "nodes": ["A", "B", "C"],
            "features": [[1.0], [2.0], [3.0]],
            "n_clusters": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains('3') && detail.contains('4'));
}

#[tokio::test]
async fn test_cluster_projection() {
    let (status, body) = call(
        "POST",
        "/gcn/cluster",
        Some(json!({
            "nodes": ["A", "B", "C", "D"],
            "features": [[0.0, 0.0, 1.0], [0.1, 0.0, 1.1], [5.0, 5.0, 0.0], [5.1, 4.9, 0.1]],
            "n_clusters": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["n_clusters"], 2);
    assert_eq!(body["cluster_centers"].as_array().unwrap().len(), 2);
    assert_eq!(body["node_labels"]["A"], body["node_labels"]["B"]);
    assert_eq!(body["pca_explained_variance"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_importance_name_mismatch() {
    let (status, body) = call(
        "POST",
        "/gcn/importance",
        Some(json!({
            "nodes": ["A", "B"],
            "features": [[1.0, 2.0, 3.0], [0.0, 1.0, 0.5]],
            "feature_names": ["pe", "roe"],
            "adjacency": [[0, 1]]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains('2') && detail.contains('3'));
}

#[tokio::test]
async fn test_importance_ranked() {
    let (status, body) = call(
        "POST",
        "/gcn/importance",
        Some(json!({
            "nodes": ["A", "B", "C"],
            "features": [[1.0, 2.0], [0.0, 1.0], [0.5, 0.5]],
            "feature_names": ["pe", "roe"],
            "adjacency": [[0, 1], [1, 2]]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["method"], "gradient_based");
    assert_eq!(body["feature_importance"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_field_gets_detail_body() {
    let (status, body) = call(
        "POST",
        "/gcn/importance",
        Some(json!({
            "nodes": ["A", "B"],
            "features": [[1.0], [2.0]],
            "adjacency": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("feature_names"));
}

#[tokio::test]
async fn test_non_numeric_feature_gets_detail_body() {
    let (status, body) = call(
        "POST",
        "/gcn/predict",
        Some(json!({
            "nodes": ["A"],
            "features": [["high"]],
            "adjacency": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_malformed_json_gets_detail_body() {
    let req = Request::builder()
        .method("POST")
        .uri("/gcn/cluster")
        .header("content-type", "application/json")
        .body(Body::from("{\"nodes\": ["))
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"].is_string());
}
