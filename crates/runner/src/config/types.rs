use crate::dispatcher::{Delivery, DispatcherConfig};
use crate::poller::PollerConfig;
use crate::relay::RelayConfig;
use lobcast_core::{DEFAULT_DEPTH, ModelSpec};
use lobcast_gateway::{HttpEngineConfig, Queues};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for every `lobcast` process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub queues: QueueConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfigJson,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    /// Participating model variants
    #[serde(default = "ModelSpec::defaults")]
    pub models: Vec<ModelSpec>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub poller: PollerConfigJson,
    #[serde(default)]
    pub stream: StreamConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            broker: BrokerConfig::default(),
            queues: QueueConfig::default(),
            dispatcher: DispatcherConfigJson::default(),
            pipeline: PipelineConfig::default(),
            inference: InferenceConfig::default(),
            models: ModelSpec::defaults(),
            server: ServerConfig::default(),
            poller: PollerConfigJson::default(),
            stream: StreamConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerKind {
    #[default]
    Redis,
    /// In-process queues; only useful when producer and worker share a process
    Memory,
}

/// Queue broker connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default)]
    pub kind: BrokerKind,
    #[serde(default = "default_redis_url")]
    pub url: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            kind: BrokerKind::default(),
            url: default_redis_url(),
        }
    }
}

/// Queue names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_inbound")]
    pub inbound: String,
    #[serde(default = "default_outbound")]
    pub outbound: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            inbound: default_inbound(),
            outbound: default_outbound(),
        }
    }
}

/// Worker loop settings (JSON representation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfigJson {
    /// Names the worker's processing list (`<inbound>:processing:<id>`);
    /// a random id is used when absent
    #[serde(default)]
    pub worker_id: Option<String>,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Zero blocks until a message arrives
    #[serde(default)]
    pub pop_timeout_secs: u64,
    #[serde(default)]
    pub delivery: Delivery,
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

impl Default for DispatcherConfigJson {
    fn default() -> Self {
        DispatcherConfigJson {
            worker_id: None,
            retry_delay_ms: default_retry_delay(),
            pop_timeout_secs: 0,
            delivery: Delivery::default(),
            symbol: default_symbol(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineMode {
    /// Run windowing and inference in the worker
    #[default]
    Local,
    /// Forward rows to a `/predict-json` service
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub mode: PipelineMode,
    /// Price levels per side
    #[serde(default = "default_depth")]
    pub depth: usize,
    #[serde(default = "default_predict_url")]
    pub predict_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            mode: PipelineMode::default(),
            depth: default_depth(),
            predict_url: default_predict_url(),
        }
    }
}

/// Inference engine (and remote service) connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default = "default_engine_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_device")]
    pub device: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            base_url: default_engine_url(),
            timeout_ms: default_timeout(),
            device: default_device(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
        }
    }
}

/// Depth poller settings (JSON representation)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfigJson {
    #[serde(default = "default_depth_url")]
    pub depth_url: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
}

impl Default for PollerConfigJson {
    fn default() -> Self {
        PollerConfigJson {
            depth_url: default_depth_url(),
            symbol: default_symbol(),
            limit: default_limit(),
            interval_ms: default_poll_interval(),
        }
    }
}

/// Live result stream (WebSocket) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_stream_bind")]
    pub bind: String,
    #[serde(default = "default_relay_interval")]
    pub interval_ms: u64,
    #[serde(default = "default_stream_capacity")]
    pub capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            bind: default_stream_bind(),
            interval_ms: default_relay_interval(),
            capacity: default_stream_capacity(),
        }
    }
}

impl RunnerConfig {
    /// Convert to the dispatcher's runtime config
    pub fn to_dispatcher_config(&self) -> DispatcherConfig {
        let config = DispatcherConfig::default()
            .with_queues(&self.queues.inbound, &self.queues.outbound)
            .with_retry_delay(Duration::from_millis(self.dispatcher.retry_delay_ms))
            .with_pop_timeout(Duration::from_secs(self.dispatcher.pop_timeout_secs))
            .with_delivery(self.dispatcher.delivery)
            .with_symbol(&self.dispatcher.symbol);
        match &self.dispatcher.worker_id {
            Some(id) => config.with_worker_id(id),
            None => config,
        }
    }

    /// Convert to the inference engine adapter's config
    pub fn to_engine_config(&self) -> HttpEngineConfig {
        HttpEngineConfig::new(&self.inference.base_url)
            .with_timeout(self.inference_timeout())
            .with_device(&self.inference.device)
    }

    /// Convert to the poller's runtime config
    pub fn to_poller_config(&self) -> PollerConfig {
        PollerConfig::default()
            .with_depth_url(&self.poller.depth_url)
            .with_symbol(&self.poller.symbol)
            .with_limit(self.poller.limit)
            .with_interval(Duration::from_millis(self.poller.interval_ms))
            .with_queue(&self.queues.inbound)
    }

    /// Convert to the result relay's runtime config
    pub fn to_relay_config(&self) -> RelayConfig {
        RelayConfig::default()
            .with_queue(&self.queues.outbound)
            .with_interval(Duration::from_millis(self.stream.interval_ms))
            .with_capacity(self.stream.capacity)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference.timeout_ms)
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/0".to_string()
}

fn default_inbound() -> String {
    Queues::LOB.to_string()
}

fn default_outbound() -> String {
    Queues::RESULTS.to_string()
}

fn default_retry_delay() -> u64 {
    5000
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}

fn default_depth() -> usize {
    DEFAULT_DEPTH
}

fn default_predict_url() -> String {
    "http://localhost:8001/api/predict-json".to_string()
}

fn default_engine_url() -> String {
    "http://localhost:8501".to_string()
}

fn default_timeout() -> u64 {
    30_000
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:8001".to_string()
}

fn default_depth_url() -> String {
    "https://api.binance.com/api/v3/depth".to_string()
}

fn default_limit() -> u32 {
    100
}

fn default_poll_interval() -> u64 {
    5000
}

fn default_stream_bind() -> String {
    "0.0.0.0:9000".to_string()
}

fn default_relay_interval() -> u64 {
    200
}

fn default_stream_capacity() -> usize {
    256
}
