//! Queue transport layer
//!
//! Brokers implementing [`QueueBroker`](lobcast_ports::QueueBroker):
//! - [`MemoryBroker`] for single-process mode and tests
//! - `RedisBroker` for Redis lists shared between processes
//!
//! A broker handle is constructed once per worker and passed by reference.
//! Blocking pops stall the underlying connection, so concurrent workers each
//! get their own handle.

pub mod config;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use config::Queues;
pub use memory::MemoryBroker;
#[cfg(feature = "redis")]
pub use self::redis::RedisBroker;
