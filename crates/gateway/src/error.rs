//! Error types for the gateway crate

use thiserror::Error;

/// Gateway-level errors (message decoding and encoding)
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Decode(e.to_string())
    }
}
