//! Lobcast Gateway
//!
//! Infrastructure adapters for the Lobcast pipeline. Provides:
//! - Queue brokers (in-process [`MemoryBroker`], Redis-backed `RedisBroker`)
//! - Wire message types for inbound order books and outbound predictions
//! - Inference adapters (engine over HTTP, remote `/predict-json` service)
//!
//! ## Architecture
//!
//! ```text
//! Producer (depth poller, push CLI)
//!         │ lpush lob_queue
//!    ┌────▼────┐
//!    │ Broker  │  Redis lists / in-process queues
//!    └────┬────┘
//!         │ brpop lob_queue
//!    ┌────▼────┐        POST /v1/models/{id}:predict
//!    │ Worker  │ ─────────────────────────────────► Inference engine
//!    └────┬────┘
//!         │ lpush results_queue
//!         ▼
//!     Consumer
//! ```

pub mod adapters;
pub mod error;
pub mod messages;
pub mod transport;

// Re-export commonly used types
pub use adapters::{HttpEngineConfig, HttpInferenceGateway, PredictJsonClient};
pub use error::GatewayError;
pub use lobcast_ports::TransportError;
pub use messages::{
    order_book::{LevelValue, OrderBookPayload},
    predict::PredictJsonRequest,
    response::{ModelMetadata, ModelOutput, PredictionResponse, Summary, TimeRange},
};
pub use transport::{MemoryBroker, Queues};

#[cfg(feature = "redis")]
pub use transport::RedisBroker;
