use lobcast_gateway::messages::response::ModelMetadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error body: `{"detail": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        ErrorResponse {
            detail: detail.into(),
        }
    }
}

/// `{"status": "healthy", "tlob_loaded": true, ..., "device": "cpu"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(flatten)]
    pub loaded: BTreeMap<String, bool>,
    pub device: String,
}

/// One themed list of what the service can do
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityGroup {
    pub category: String,
    pub items: Vec<String>,
}

/// `{"capabilities": [group, ...], "model_info": {"tlob": {...}, ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    pub capabilities: Vec<CapabilityGroup>,
    pub model_info: BTreeMap<String, ModelMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
}
