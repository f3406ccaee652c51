//! Lobcast Ports
//!
//! Port definitions (traits) for the Lobcast pipeline.
//! These define the boundaries between the windowing core and infrastructure:
//!
//! - [`InferenceGateway`]: windows in, class predictions out
//! - [`QueueBroker`]: FIFO message queues shared by producers and workers

mod error;
mod inference;
mod queue;

pub use error::{InferenceError, InferenceResult, TransportError, TransportResult};
pub use inference::{EngineStatus, InferenceGateway};
pub use queue::QueueBroker;
