//! Inference adapters
//!
//! - [`HttpInferenceGateway`] talks to a model-serving engine per model
//! - [`PredictJsonClient`] forwards raw rows to a remote `/predict-json` service

pub mod http_engine;
pub mod predict_client;

pub use http_engine::{HttpEngineConfig, HttpInferenceGateway};
pub use predict_client::PredictJsonClient;
