//! Integration tests for the HTTP surface
//!
//! Runs the router in-process against a mock inference engine.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use lobcast_core::{ModelSpec, PredictionResult, WindowBatch};
use lobcast_ports::{EngineStatus, InferenceError, InferenceGateway, InferenceResult};
use lobcast_runner::LocalPipeline;
use lobcast_server::{AppState, create_router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Engine with only TLOB loaded; predicts Down for every window
struct MockEngine {
    reachable: bool,
}

#[async_trait]
impl InferenceGateway for MockEngine {
    async fn infer(&self, model_id: &str, windows: &WindowBatch) -> InferenceResult<PredictionResult> {
        if !self.reachable {
            return Err(InferenceError::Unavailable(format!(
                "{}: connection refused",
                model_id
            )));
        }
        Ok(PredictionResult::from_logits(&vec![
            vec![0.0, 0.5, 4.0];
            windows.len()
        ]))
    }

    async fn is_loaded(&self, model_id: &str) -> bool {
        self.reachable && model_id == "tlob"
    }

    fn status(&self) -> EngineStatus {
        EngineStatus {
            device: "cuda".to_string(),
        }
    }
}

fn create_app(reachable: bool) -> axum::Router {
    let engine = Arc::new(MockEngine { reachable });
    let pipeline = LocalPipeline::new(engine, ModelSpec::defaults(), 10).unwrap();
    create_router(Arc::new(AppState::new(Arc::new(pipeline))))
}

fn rows(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "timestamp": 1_700_000_000_000i64 + (i / 2) as i64,
                "symbol": "BTCUSDT",
                "bid_price": 50_000.0 - i as f64,
                "bid_qty": 1.5,
                "ask_price": 50_001.0 + i as f64,
                "ask_qty": 2.0
            })
        })
        .collect()
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_csv(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_root_endpoint() {
    let (status, body) = send(create_app(true), get("/api/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"message": "Order Book Prediction API", "status": "running"})
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = send(create_app(true), get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tlob_loaded"], true);
    assert_eq!(body["mlplob_loaded"], false);
    assert_eq!(body["device"], "cuda");
}

#[tokio::test]
async fn test_models_endpoint() {
    let (status, body) = send(create_app(true), get("/api/models")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tlob"]["sequence_size"], 128);
    assert_eq!(body["tlob"]["architecture"], "Transformer-based");
    assert_eq!(body["mlplob"]["sequence_size"], 384);
    assert!(body["mlplob"].get("num_heads").is_none());
}

#[tokio::test]
async fn test_capabilities_endpoint() {
    let (status, body) = send(create_app(true), get("/api/capabilities")).await;

    assert_eq!(status, StatusCode::OK);
    let groups = body["capabilities"].as_array().unwrap();
    assert!(!groups.is_empty());
    for group in groups {
        assert!(group["category"].is_string());
        assert!(!group["items"].as_array().unwrap().is_empty());
    }
    let windows = groups
        .iter()
        .find(|g| g["category"] == "Temporal Windows")
        .unwrap();
    assert!(windows["items"][0].as_str().unwrap().contains("128"));
    assert_eq!(body["model_info"]["tlob"]["num_heads"], 1);
    assert_eq!(body["model_info"]["mlplob"]["sequence_size"], 384);
}

#[tokio::test]
async fn test_predict_json() {
    let _ = env_logger::try_init();

    let request = post_json("/api/predict-json", json!({ "data": rows(300) }));
    let (status, body) = send(create_app(true), request).await;

    assert_eq!(status, StatusCode::OK);
    // 300 rows, two per timestamp: 150 frames
    assert_eq!(body["tlob"]["num_predictions"], 150 - 128 + 1);
    assert_eq!(body["mlplob"]["num_predictions"], 1);
    assert_eq!(body["tlob"]["predictions"][0], 2);
    assert_eq!(body["tlob"]["class_names"][2], "Down");
    assert_eq!(body["summary"]["total_rows"], 300);
    assert_eq!(body["summary"]["symbol"], "BTCUSDT");
    assert_eq!(body["summary"]["time_range"]["start"], "1700000000000");
    assert_eq!(body["summary"]["time_range"]["end"], "1700000000149");
    assert_eq!(body["model_metadata"]["tlob"]["num_layers"], 4);
}

#[tokio::test]
async fn test_predict_json_no_data() {
    let request = post_json("/api/predict-json", json!({ "data": [] }));
    let (status, body) = send(create_app(true), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "No data provided");
}

#[tokio::test]
async fn test_predict_json_missing_columns() {
    let request = post_json(
        "/api/predict-json",
        json!({ "data": [{ "timestamp": 1, "symbol": "BTCUSDT", "bid_price": 1.0 }] }),
    );
    let (status, body) = send(create_app(true), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("bid_qty"));
    assert!(detail.contains("ask_price"));
    assert!(detail.contains("ask_qty"));
}

#[tokio::test]
async fn test_predict_json_engine_down() {
    let request = post_json("/api/predict-json", json!({ "data": rows(4) }));
    let (status, body) = send(create_app(false), request).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["detail"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_predict_csv() {
    let csv = "\
timestamp,symbol,bid_price,bid_qty,ask_price,ask_qty
1000,BTCUSDT,50000,1.5,50001,2.0
1000,BTCUSDT,49999,2.0,50002,1.8
1001,BTCUSDT,50000,1.4,50001,2.1
1002,BTCUSDT,not-a-number,1.0,50001,2.0
";
    let (status, body) = send(create_app(true), post_csv("/api/predict", csv)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tlob"]["num_predictions"], 1);
    assert_eq!(body["summary"]["total_rows"], 4);
    assert_eq!(body["summary"]["time_range"]["end"], "1002");
}

#[tokio::test]
async fn test_predict_csv_missing_columns() {
    let csv = "timestamp,symbol\n1000,BTCUSDT\n";
    let (status, body) = send(create_app(true), post_csv("/api/predict", csv)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("bid_qty"));
}

#[tokio::test]
async fn test_predict_csv_empty() {
    let csv = "timestamp,symbol,bid_price,bid_qty,ask_price,ask_qty\n";
    let (status, body) = send(create_app(true), post_csv("/api/predict", csv)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "No data provided");
}
