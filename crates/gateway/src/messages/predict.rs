//! `/predict-json` request body

use crate::error::GatewayError;
use lobcast_core::{RawTick, RecordSet};
use serde::{Deserialize, Serialize};

/// `{"data": [{"timestamp", "symbol", "bid_qty", ...}, ...]}`
///
/// Rows are kept as raw JSON objects so the receiver can report exactly
/// which columns are missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictJsonRequest {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

impl PredictJsonRequest {
    pub fn from_ticks(ticks: &[RawTick]) -> Result<Self, GatewayError> {
        let data = ticks
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()
            .map_err(|e| GatewayError::Serialization(e.to_string()))?;
        Ok(Self { data })
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Rows as a record set for the normalizer
    pub fn into_records(self) -> RecordSet {
        RecordSet::from_json_rows(self.data)
    }
}
