use std::time::Duration;
use thiserror::Error;

/// Failure at the inference boundary
///
/// Every engine failure surfaces as this one type; the variant carries the
/// cause. Callers never retry on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("Inference engine unavailable: {0}")]
    Unavailable(String),

    #[error("Inference timed out after {0:?}")]
    Timeout(Duration),

    #[error("Inference engine returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed inference response: {0}")]
    Malformed(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Inference output shape mismatch: {0}")]
    ShapeMismatch(String),
}

pub type InferenceResult<T> = std::result::Result<T, InferenceError>;

/// Queue broker failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Queue command failed: {0}")]
    Command(String),

    #[error("Broker closed")]
    Closed,
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;
