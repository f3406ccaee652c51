//! Bootstrap - builds brokers and pipelines from configuration
//!
//! Every component is constructed explicitly here and injected; nothing is
//! held in process-wide globals.

use crate::config::{BrokerConfig, BrokerKind, PipelineMode, RunnerConfig};
use crate::error::PipelineError;
use crate::pipeline::{LocalPipeline, PredictionPipeline, RemotePipeline};
use lobcast_gateway::{HttpInferenceGateway, MemoryBroker, PredictJsonClient, RedisBroker};
use lobcast_ports::{InferenceError, InferenceGateway, QueueBroker, TransportError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Broker setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error("Inference setup failed: {0}")]
    Inference(#[from] InferenceError),
    #[error("Pipeline setup failed: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Create a broker handle; the connection itself opens on first use
///
/// Call once per worker: a handle blocked in a pop cannot serve anyone else.
pub fn build_broker(config: &BrokerConfig) -> Result<Arc<dyn QueueBroker>, BootstrapError> {
    let broker: Arc<dyn QueueBroker> = match config.kind {
        BrokerKind::Redis => Arc::new(RedisBroker::new(&config.url)?),
        BrokerKind::Memory => Arc::new(MemoryBroker::new()),
    };
    Ok(broker)
}

/// Inference engine adapter described by `config.inference`
pub fn build_engine(config: &RunnerConfig) -> Result<Arc<dyn InferenceGateway>, BootstrapError> {
    Ok(Arc::new(HttpInferenceGateway::new(config.to_engine_config())?))
}

/// In-process pipeline against the configured engine
pub fn build_local_pipeline(config: &RunnerConfig) -> Result<LocalPipeline, BootstrapError> {
    let engine = build_engine(config)?;
    Ok(LocalPipeline::new(
        engine,
        config.models.clone(),
        config.pipeline.depth,
    )?)
}

/// Pipeline selected by `config.pipeline.mode`
pub fn build_pipeline(config: &RunnerConfig) -> Result<Arc<dyn PredictionPipeline>, BootstrapError> {
    let pipeline: Arc<dyn PredictionPipeline> = match config.pipeline.mode {
        PipelineMode::Local => Arc::new(build_local_pipeline(config)?),
        PipelineMode::Remote => {
            let client =
                PredictJsonClient::new(&config.pipeline.predict_url, config.inference_timeout())?;
            Arc::new(RemotePipeline::new(client))
        }
    };
    log::info!("Using {} pipeline", pipeline.mode());
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_memory_broker() {
        let config = BrokerConfig {
            kind: BrokerKind::Memory,
            url: String::new(),
        };
        assert!(build_broker(&config).is_ok());
    }

    #[test]
    fn test_build_redis_broker_is_lazy() {
        // Constructing must not require a running server
        assert!(build_broker(&BrokerConfig::default()).is_ok());
    }

    #[test]
    fn test_build_pipelines() {
        let mut config = RunnerConfig::default();
        assert_eq!(build_pipeline(&config).unwrap().mode(), "local");

        config.pipeline.mode = PipelineMode::Remote;
        assert_eq!(build_pipeline(&config).unwrap().mode(), "remote");
    }

    #[test]
    fn test_build_local_pipeline_validates_models() {
        let mut config = RunnerConfig::default();
        config.pipeline.depth = 4;
        assert!(matches!(
            build_local_pipeline(&config),
            Err(BootstrapError::Pipeline(PipelineError::InvalidConfig(_)))
        ));
    }
}
