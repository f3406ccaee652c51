use crate::error::InferenceResult;
use async_trait::async_trait;
use lobcast_core::{PredictionResult, WindowBatch};

/// What an engine reports about itself for health checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    /// Compute device the engine runs on (e.g., "cpu", "cuda")
    pub device: String,
}

/// Port for the opaque inference engine
///
/// Implementations must be read-only: no call may update model state.
/// Each returned [`PredictionResult`] covers every input window in order,
/// with one probability row of [`NUM_CLASSES`](lobcast_core::NUM_CLASSES)
/// entries per window.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Run one model over a batch of windows
    async fn infer(&self, model_id: &str, windows: &WindowBatch) -> InferenceResult<PredictionResult>;

    /// Whether the engine has `model_id` loaded and ready
    async fn is_loaded(&self, model_id: &str) -> bool;

    /// Static engine facts
    fn status(&self) -> EngineStatus;
}
