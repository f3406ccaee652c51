//! Lobcast Runner - prediction pipelines and the dispatcher worker loop
//!
//! - **Result Assembler**: merges per-model outputs with summary and metadata
//! - **Pipelines**: local (windowing + inference engine) or remote (`/predict-json`)
//! - **Dispatcher**: blocks on the inbound queue, runs the pipeline, publishes
//! - **Depth Poller**: feeds the inbound queue from an exchange depth endpoint
//! - **Result Relay**: drains the results queue to live stream subscribers
//! - **Config / Bootstrap**: JSON configuration and component wiring
//!
//! ## Architecture
//!
//! ```text
//!   Depth Poller ──► lob_queue
//!                        │ blocking pop
//!                        ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                      DISPATCHER                          │
//! │                                                          │
//! │  decode ─► rows ─► PredictionPipeline                    │
//! │                     │                                    │
//! │                     ├─ SnapshotNormalizer                │
//! │                     ├─ WindowBuilder (stats once)        │
//! │                     ├─ InferenceGateway × models         │
//! │                     └─ ResultAssembler                   │
//! └──────────────────────────┬───────────────────────────────┘
//!                            │ push
//!                            ▼
//!                      results_queue ──► Result Relay ──► subscribers
//! ```

pub mod assembler;
pub mod bootstrap;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod poller;
pub mod relay;

// Re-export main types
pub use assembler::ResultAssembler;
pub use bootstrap::{BootstrapError, build_broker, build_local_pipeline, build_pipeline};
pub use config::{ConfigError, RunnerConfig, load_config, load_default_config};
pub use dispatcher::{Delivery, DispatchStats, Dispatcher, DispatcherConfig, DispatcherState};
pub use error::{DispatchError, PipelineError, PipelineResult, PollError};
pub use pipeline::{LocalPipeline, PredictionPipeline, RemotePipeline};
pub use poller::{DepthPoller, PollerConfig};
pub use relay::{RelayConfig, ResultRelay};
