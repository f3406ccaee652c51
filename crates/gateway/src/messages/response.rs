//! Outbound prediction response
//!
//! ```text
//! {
//!   "tlob":   { predictions, probabilities, num_predictions, class_names },
//!   "mlplob": { ... },
//!   "summary": { total_rows, symbol, time_range: { start, end } },
//!   "model_metadata": { "tlob": { name, architecture, ... }, ... }
//! }
//! ```

use crate::error::GatewayError;
use lobcast_core::{CLASS_NAMES, ModelSpec, PredictionResult, TickSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder reported when the input carried no symbol or timestamp
pub const UNKNOWN: &str = "Unknown";

/// One model's predictions, keyed by model id in [`PredictionResponse`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub predictions: Vec<usize>,
    pub probabilities: Vec<Vec<f32>>,
    pub num_predictions: usize,
    pub class_names: Vec<String>,
}

impl From<PredictionResult> for ModelOutput {
    fn from(result: PredictionResult) -> Self {
        Self {
            num_predictions: result.len(),
            predictions: result.predictions,
            probabilities: result.probabilities,
            class_names: CLASS_NAMES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// Facts about the input rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_rows: usize,
    pub symbol: String,
    pub time_range: TimeRange,
}

impl From<&TickSummary> for Summary {
    fn from(summary: &TickSummary) -> Self {
        let ts = |t: Option<i64>| t.map_or_else(|| UNKNOWN.to_string(), |t| t.to_string());
        Self {
            total_rows: summary.total_rows,
            symbol: summary.symbol.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            time_range: TimeRange {
                start: ts(summary.first_timestamp),
                end: ts(summary.last_timestamp),
            },
        }
    }
}

/// Static description of a participating model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    pub architecture: String,
    pub sequence_size: usize,
    pub num_layers: u32,
    pub hidden_dim: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_heads: Option<u32>,
    pub features: usize,
    pub description: String,
}

impl From<&ModelSpec> for ModelMetadata {
    fn from(spec: &ModelSpec) -> Self {
        Self {
            name: spec.name.clone(),
            architecture: spec.architecture.clone(),
            sequence_size: spec.sequence_size,
            num_layers: spec.num_layers,
            hidden_dim: spec.hidden_dim,
            num_heads: spec.num_heads,
            features: spec.features,
            description: spec.description.clone(),
        }
    }
}

/// Merged response: per-model outputs plus summary and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(flatten)]
    pub models: BTreeMap<String, ModelOutput>,
    pub summary: Summary,
    pub model_metadata: BTreeMap<String, ModelMetadata>,
}

impl PredictionResponse {
    pub fn model(&self, id: &str) -> Option<&ModelOutput> {
        self.models.get(id)
    }

    pub fn from_json(payload: &str) -> Result<Self, GatewayError> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn to_json(&self) -> Result<String, GatewayError> {
        serde_json::to_string(self).map_err(|e| GatewayError::Serialization(e.to_string()))
    }
}

/// Static metadata for a set of models, keyed by id
pub fn metadata_for(models: &[ModelSpec]) -> BTreeMap<String, ModelMetadata> {
    models
        .iter()
        .map(|m| (m.id.clone(), ModelMetadata::from(m)))
        .collect()
}
