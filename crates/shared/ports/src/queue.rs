use crate::error::TransportResult;
use async_trait::async_trait;
use std::time::Duration;

/// Port for a FIFO message broker
///
/// Queues are lists: producers push at the head, consumers pop at the tail,
/// so items are served in push order. A broker handle owns one connection,
/// established lazily on first use and reused for the handle's lifetime.
///
/// A timeout of [`Duration::ZERO`] means "block until a message arrives".
#[async_trait]
pub trait QueueBroker: Send + Sync {
    /// Push a payload at the head of `queue`
    async fn push(&self, queue: &str, payload: &str) -> TransportResult<()>;

    /// Pop from the tail of `queue` without blocking
    async fn pop(&self, queue: &str) -> TransportResult<Option<String>>;

    /// Pop from the tail of `queue`, waiting up to `timeout`
    ///
    /// Returns `(queue, payload)`, or `None` on timeout.
    async fn blocking_pop(
        &self,
        queue: &str,
        timeout: Duration,
    ) -> TransportResult<Option<(String, String)>>;

    /// Atomically move the tail of `source` to the head of `destination`,
    /// waiting up to `timeout`. Used for acknowledged delivery.
    async fn blocking_move(
        &self,
        source: &str,
        destination: &str,
        timeout: Duration,
    ) -> TransportResult<Option<String>>;

    /// Remove one occurrence of `payload` from `queue`; returns how many were removed
    async fn remove(&self, queue: &str, payload: &str) -> TransportResult<usize>;

    /// Move every item of `source` onto the tail of `destination` so they
    /// are served next. Returns how many items moved.
    async fn requeue_all(&self, source: &str, destination: &str) -> TransportResult<usize>;

    /// Current length of `queue`
    async fn len(&self, queue: &str) -> TransportResult<usize>;
}
