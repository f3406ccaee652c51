use std::path::Path;
use thiserror::Error;

use super::types::{PipelineMode, RunnerConfig};
use lobcast_core::ModelSpec;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load runner configuration from a JSON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunnerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<RunnerConfig, ConfigError> {
    let config: RunnerConfig = serde_json::from_str(json)?;
    Ok(config)
}

/// Load the default embedded configuration
pub fn load_default_config() -> Result<RunnerConfig, ConfigError> {
    let default_config = include_str!("runner_config.json");
    load_config_from_str(default_config)
}

impl RunnerConfig {
    /// Get a model variant by id
    pub fn get_model(&self, id: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        ModelSpec::validate_all(&self.models, self.pipeline.depth)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.queues.inbound.trim().is_empty() || self.queues.outbound.trim().is_empty() {
            return Err(ConfigError::Invalid("queue names must not be empty".to_string()));
        }
        if self.queues.inbound == self.queues.outbound {
            return Err(ConfigError::Invalid("queue names must be distinct".to_string()));
        }
        if let Some(id) = &self.dispatcher.worker_id {
            if id.trim().is_empty() || id.contains(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!(
                    "dispatcher.worker_id {:?} must be a non-empty token",
                    id
                )));
            }
        }

        if self.dispatcher.retry_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "dispatcher.retry_delay_ms must be positive".to_string(),
            ));
        }
        if self.inference.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "inference.timeout_ms must be positive".to_string(),
            ));
        }
        if self.pipeline.mode == PipelineMode::Remote && self.pipeline.predict_url.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "pipeline.predict_url is required in remote mode".to_string(),
            ));
        }
        if self.poller.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poller.interval_ms must be positive".to_string(),
            ));
        }
        if self.stream.interval_ms == 0 || self.stream.capacity == 0 {
            return Err(ConfigError::Invalid(
                "stream.interval_ms and stream.capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Delivery;
    use crate::config::types::BrokerKind;
    use std::time::Duration;

    #[test]
    fn test_load_default_config() {
        let config = load_default_config().unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.broker.kind, BrokerKind::Redis);
        assert_eq!(config.pipeline.mode, PipelineMode::Local);
    }

    #[test]
    fn test_embedded_models_match_builtins() {
        let config = load_default_config().unwrap();
        assert_eq!(config.get_model("tlob"), Some(&ModelSpec::tlob()));
        assert_eq!(config.get_model("mlplob"), Some(&ModelSpec::mlplob()));
        assert!(config.get_model("deeplob").is_none());
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = load_config_from_str("{}").unwrap();
        let defaults = RunnerConfig::default();

        assert_eq!(config.queues.inbound, "lob_queue");
        assert_eq!(config.dispatcher.retry_delay_ms, 5000);
        assert_eq!(config.inference.timeout_ms, 30_000);
        assert_eq!(config.server.bind, "0.0.0.0:8001");
        assert_eq!(config.models, defaults.models);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_to_dispatcher_config() {
        let config = load_config_from_str(
            r#"{
                "queues": { "inbound": "in", "outbound": "out" },
                "dispatcher": {
                    "worker_id": "w3",
                    "retry_delay_ms": 250,
                    "delivery": "at_least_once"
                }
            }"#,
        )
        .unwrap();
        let dispatcher = config.to_dispatcher_config();

        assert_eq!(dispatcher.inbound, "in");
        assert_eq!(dispatcher.outbound, "out");
        assert_eq!(dispatcher.worker_id, "w3");
        assert_eq!(dispatcher.processing_queue(), "in:processing:w3");
        assert_eq!(dispatcher.retry_delay, Duration::from_millis(250));
        assert_eq!(dispatcher.pop_timeout, Duration::ZERO);
        assert_eq!(dispatcher.delivery, Delivery::AtLeastOnce);
    }

    #[test]
    fn test_to_engine_and_poller_config() {
        let config = RunnerConfig::default();
        let engine = config.to_engine_config();
        assert_eq!(engine.timeout, Duration::from_secs(30));
        assert_eq!(engine.device, "cpu");

        let poller = config.to_poller_config();
        assert_eq!(poller.queue, "lob_queue");
        assert_eq!(poller.interval, Duration::from_secs(5));

        let relay = config.to_relay_config();
        assert_eq!(relay.queue, "results_queue");
        assert_eq!(relay.interval, Duration::from_millis(200));
        assert_eq!(config.stream.bind, "0.0.0.0:9000");
    }

    #[test]
    fn test_workers_without_id_get_separate_lists() {
        let config = RunnerConfig::default();
        assert!(config.dispatcher.worker_id.is_none());
        let first = config.to_dispatcher_config();
        let second = config.to_dispatcher_config();
        assert!(first.processing_queue().starts_with("lob_queue:processing:worker-"));
        assert_ne!(first.processing_queue(), second.processing_queue());
    }

    #[test]
    fn test_validate_rejects_blank_worker_id() {
        let config = load_config_from_str(r#"{ "dispatcher": { "worker_id": " " } }"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_depth() {
        let config = load_config_from_str(r#"{ "pipeline": { "depth": 5 } }"#).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_shared_queue_names() {
        let config =
            load_config_from_str(r#"{ "queues": { "inbound": "q", "outbound": "q" } }"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            load_config_from_str("{ not json"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
