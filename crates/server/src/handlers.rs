use axum::{Json, body::Bytes, extract::State};
use lobcast_core::RecordSet;
use lobcast_gateway::{PredictJsonRequest, PredictionResponse, messages::response::ModelMetadata};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    dto::{CapabilitiesResponse, CapabilityGroup, HealthResponse, RootResponse},
    error::ApiError,
    router::AppState,
};

/// GET /api/
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Order Book Prediction API".to_string(),
        status: "running".to_string(),
    })
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let gateway = state.pipeline.gateway();
    let mut loaded = BTreeMap::new();
    for model in state.pipeline.models() {
        loaded.insert(
            format!("{}_loaded", model.id),
            gateway.is_loaded(&model.id).await,
        );
    }

    Json(HealthResponse {
        status: "healthy".to_string(),
        loaded,
        device: gateway.status().device,
    })
}

/// GET /api/models
pub async fn models(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, ModelMetadata>> {
    Json(state.pipeline.assembler().metadata().clone())
}

/// GET /api/capabilities
pub async fn capabilities(State(state): State<Arc<AppState>>) -> Json<CapabilitiesResponse> {
    let models = state.pipeline.models();
    let builder = state.pipeline.window_builder();
    let group = |category: &str, items: Vec<String>| CapabilityGroup {
        category: category.to_string(),
        items,
    };

    let mut windows: Vec<String> = models
        .iter()
        .map(|m| format!("{}: windows of {} snapshots", m.name, m.sequence_size))
        .collect();
    windows.push("Shorter inputs yield one zero-padded window".to_string());

    Json(CapabilitiesResponse {
        capabilities: vec![
            group(
                "Order Book Data Processing",
                vec![
                    "Accept JSON rows or CSV with timestamp, symbol, bid_price, bid_qty, ask_price, ask_qty".to_string(),
                    format!(
                        "Flatten up to {} levels per side into {} features per snapshot",
                        builder.depth(),
                        builder.feature_width()
                    ),
                    "Z-score every feature column over the submitted batch".to_string(),
                ],
            ),
            group("Temporal Windows", windows),
            group(
                "Price Movement Prediction",
                vec![
                    "Predict mid-price direction (Up, Stationary, Down)".to_string(),
                    "Return a probability distribution per window".to_string(),
                ],
            ),
            group(
                "Delivery",
                vec![
                    "Synchronous HTTP prediction endpoints".to_string(),
                    "Queue-driven workers publishing to a results queue".to_string(),
                    "Live WebSocket stream of published results".to_string(),
                ],
            ),
        ],
        model_info: state.pipeline.assembler().metadata().clone(),
    })
}

/// POST /api/predict-json
pub async fn predict_json(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictJsonRequest>,
) -> Result<Json<PredictionResponse>, ApiError> {
    if request.is_empty() {
        return Err(ApiError::no_data());
    }
    log::info!("predict-json: {} rows", request.data.len());
    run(&state, request.into_records()).await
}

/// POST /api/predict (CSV body)
pub async fn predict_csv(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let records = RecordSet::from_csv_reader(body.as_ref())?;
    if records.is_empty() {
        return Err(ApiError::no_data());
    }
    log::info!("predict: {} CSV rows", records.len());
    run(&state, records).await
}

async fn run(state: &AppState, records: RecordSet) -> Result<Json<PredictionResponse>, ApiError> {
    match state.pipeline.predict_records(&records).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            log::warn!("Prediction failed: {}", e);
            Err(e.into())
        }
    }
}
