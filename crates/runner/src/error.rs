//! Error types for the runner

use lobcast_gateway::GatewayError;
use lobcast_ports::{InferenceError, TransportError};
use thiserror::Error;

/// Failure of one pipeline run; fatal for the message, never for the worker
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PipelineError {
    /// Whether the caller sent bad input (as opposed to a downstream failure)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Schema { .. } | PipelineError::EmptyInput(_) | PipelineError::Decode(_)
        )
    }
}

impl From<lobcast_core::Error> for PipelineError {
    fn from(e: lobcast_core::Error) -> Self {
        match e {
            lobcast_core::Error::Schema { missing } => PipelineError::Schema { missing },
            lobcast_core::Error::EmptyInput(msg) => PipelineError::EmptyInput(msg),
            lobcast_core::Error::InvalidConfig(msg) => PipelineError::InvalidConfig(msg),
            other => PipelineError::Decode(other.to_string()),
        }
    }
}

impl From<GatewayError> for PipelineError {
    fn from(e: GatewayError) -> Self {
        PipelineError::Decode(e.to_string())
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Outcome of one dispatcher iteration that could not complete
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The message is discarded; the loop carries on
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The broker is unreachable; the loop backs off and retries
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Processing a message panicked; the message is discarded and the loop
    /// backs off before taking the next one
    #[error("Message processing panicked: {0}")]
    Panicked(String),
}

/// Errors raised by the depth poller
#[derive(Error, Debug)]
pub enum PollError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Depth endpoint returned HTTP {0}")]
    Status(u16),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
