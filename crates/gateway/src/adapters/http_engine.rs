//! Inference engine over HTTP
//!
//! Protocol:
//! - `POST {base}/v1/models/{id}:predict` with `{"instances": [window, ...]}`
//!   returns `{"predictions": [[score; 3], ...]}` (raw class scores)
//! - `GET {base}/v1/models/{id}` answers 2xx when the model is loaded
//!
//! JSON cannot carry NaN, so engines send `null` for it.

use async_trait::async_trait;
use lobcast_core::{NUM_CLASSES, PredictionResult, WindowBatch};
use lobcast_ports::{EngineStatus, InferenceError, InferenceGateway, InferenceResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the engine
#[derive(Debug, Clone)]
pub struct HttpEngineConfig {
    pub base_url: String,
    /// Ceiling for one inference call
    pub timeout: Duration,
    /// Reported on the health surface
    pub device: String,
}

impl Default for HttpEngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8501".to_string(),
            timeout: Duration::from_secs(30),
            device: "cpu".to_string(),
        }
    }
}

impl HttpEngineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<Vec<Vec<f32>>>,
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<Option<f32>>>,
}

/// [`InferenceGateway`] backed by an HTTP model server
#[derive(Clone)]
pub struct HttpInferenceGateway {
    client: Client,
    config: HttpEngineConfig,
}

impl HttpInferenceGateway {
    pub fn new(config: HttpEngineConfig) -> InferenceResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InferenceError::Unavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpEngineConfig {
        &self.config
    }

    fn model_url(&self, model_id: &str) -> String {
        format!(
            "{}/v1/models/{}",
            self.config.base_url.trim_end_matches('/'),
            model_id
        )
    }

    fn map_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout(self.config.timeout)
        } else {
            InferenceError::Unavailable(e.to_string())
        }
    }
}

/// Check the engine answered one row of class scores per window
fn check_shape(logits: &[Vec<f32>], windows: usize) -> InferenceResult<()> {
    if logits.len() != windows {
        return Err(InferenceError::ShapeMismatch(format!(
            "expected {} predictions, got {}",
            windows,
            logits.len()
        )));
    }
    if let Some((i, row)) = logits
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != NUM_CLASSES)
    {
        return Err(InferenceError::ShapeMismatch(format!(
            "prediction {} has {} scores, expected {}",
            i,
            row.len(),
            NUM_CLASSES
        )));
    }
    Ok(())
}

#[async_trait]
impl InferenceGateway for HttpInferenceGateway {
    async fn infer(
        &self,
        model_id: &str,
        windows: &WindowBatch,
    ) -> InferenceResult<PredictionResult> {
        let url = format!("{}:predict", self.model_url(model_id));
        let request = PredictRequest {
            instances: windows.to_nested(),
        };

        log::debug!(
            "POST {} ({} windows of {}x{})",
            url,
            windows.len(),
            windows.window_length(),
            windows.width()
        );

        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.map_error(e))?;

        if status == StatusCode::NOT_FOUND {
            return Err(InferenceError::UnknownModel(model_id.to_string()));
        }
        if !status.is_success() {
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: PredictResponse =
            serde_json::from_str(&text).map_err(|e| InferenceError::Malformed(e.to_string()))?;
        let logits: Vec<Vec<f32>> = parsed
            .predictions
            .into_iter()
            .map(|row| row.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect())
            .collect();

        check_shape(&logits, windows.len())?;
        Ok(PredictionResult::from_logits(&logits))
    }

    async fn is_loaded(&self, model_id: &str) -> bool {
        match self.client.get(self.model_url(model_id)).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                log::debug!("Model status check for {} failed: {}", model_id, e);
                false
            }
        }
    }

    fn status(&self) -> EngineStatus {
        EngineStatus {
            device: self.config.device.clone(),
        }
    }
}
