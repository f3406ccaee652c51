//! Client for a remote `/predict-json` service

use crate::messages::{predict::PredictJsonRequest, response::PredictionResponse};
use lobcast_ports::{InferenceError, InferenceResult};
use reqwest::Client;
use std::time::Duration;

/// Posts order-book rows to a prediction service and decodes the merged response
#[derive(Clone)]
pub struct PredictJsonClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl PredictJsonClient {
    /// `url` is the full endpoint, e.g. `http://localhost:8001/api/predict-json`
    pub fn new(url: impl Into<String>, timeout: Duration) -> InferenceResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn predict(&self, request: &PredictJsonRequest) -> InferenceResult<PredictionResponse> {
        log::debug!("POST {} ({} rows)", self.url, request.data.len());

        let resp = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.map_error(e))?;

        if !status.is_success() {
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        PredictionResponse::from_json(&text).map_err(|e| InferenceError::Malformed(e.to_string()))
    }

    fn map_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout(self.timeout)
        } else {
            InferenceError::Unavailable(e.to_string())
        }
    }
}
