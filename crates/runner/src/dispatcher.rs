//! Dispatcher - the queue-driven worker loop
//!
//! ```text
//! Idle ─► Waiting ─► Processing ─┬─► Publishing ─┬─► Waiting
//!            ▲                   └─► Discarding ─┘
//!            └── transport failure: back off, retry
//! any state at the Waiting boundary ─► ShuttingDown (on shutdown signal)
//! ```
//!
//! One message is in flight per dispatcher. Per-message failures (bad JSON,
//! bad rows, inference errors) discard the message and never stop the loop.
//! Each message is processed on its own task, so a panicking pipeline or
//! engine also only discards that message; the loop then backs off like it
//! does for broker failures. Broker failures back off for a fixed delay and
//! retry indefinitely. Shutdown is honoured only while waiting; a message
//! being processed runs to completion first.

use crate::error::{DispatchError, PipelineError};
use crate::pipeline::PredictionPipeline;
use chrono::Utc;
use lobcast_gateway::{OrderBookPayload, Queues};
use lobcast_ports::{QueueBroker, TransportError};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinError;
use uuid::Uuid;

/// Delivery guarantee for inbound messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Pop and forget; a crash mid-message loses it
    #[default]
    AtMostOnce,
    /// Park in this worker's processing list until a final outcome, recover
    /// that list on start
    AtLeastOnce,
}

/// Dispatcher runtime settings
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub inbound: String,
    pub outbound: String,
    /// Names this worker's processing list; keep it stable across restarts
    /// so [`Delivery::AtLeastOnce`] can recover what a crash left behind
    pub worker_id: String,
    /// Pause after a broker failure
    pub retry_delay: Duration,
    /// Blocking pop timeout; zero waits forever
    pub pop_timeout: Duration,
    pub delivery: Delivery,
    /// Symbol stamped on rows translated from order-book payloads
    pub symbol: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            inbound: Queues::LOB.to_string(),
            outbound: Queues::RESULTS.to_string(),
            worker_id: generated_worker_id(),
            retry_delay: Duration::from_secs(5),
            pop_timeout: Duration::ZERO,
            delivery: Delivery::AtMostOnce,
            symbol: "BTCUSDT".to_string(),
        }
    }
}

impl DispatcherConfig {
    pub fn with_queues(mut self, inbound: impl Into<String>, outbound: impl Into<String>) -> Self {
        self.inbound = inbound.into();
        self.outbound = outbound.into();
        self
    }

    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = worker_id.into();
        self
    }

    /// In-flight list owned by this worker
    pub fn processing_queue(&self) -> String {
        Queues::processing(&self.inbound, &self.worker_id)
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_pop_timeout(mut self, timeout: Duration) -> Self {
        self.pop_timeout = timeout;
        self
    }

    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }
}

/// Random id for workers that were not given one; such a worker cannot
/// recover its processing list after a restart
pub fn generated_worker_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("worker-{}", &id[..8])
}

/// Where the worker loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Waiting,
    Processing,
    Publishing,
    Discarding,
    ShuttingDown,
}

/// Counters returned when the loop exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub received: u64,
    pub published: u64,
    pub discarded: u64,
    pub transport_failures: u64,
    /// Messages whose processing panicked (also counted as discarded)
    pub panics: u64,
}

/// Queue-driven worker: inbound order books in, merged predictions out
pub struct Dispatcher {
    broker: Arc<dyn QueueBroker>,
    pipeline: Arc<dyn PredictionPipeline>,
    config: DispatcherConfig,
    processing: String,
    state_tx: watch::Sender<DispatcherState>,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(
        broker: Arc<dyn QueueBroker>,
        pipeline: Arc<dyn PredictionPipeline>,
        config: DispatcherConfig,
    ) -> Self {
        let (state_tx, _) = watch::channel(DispatcherState::Idle);
        let processing = config.processing_queue();
        Self {
            broker,
            pipeline,
            config,
            processing,
            state_tx,
            stats: DispatchStats::default(),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<DispatcherState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> DispatcherState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, state: DispatcherState) {
        self.state_tx.send_replace(state);
    }

    /// Run until the process is killed
    pub async fn run(self) -> DispatchStats {
        self.run_until(std::future::pending()).await
    }

    /// Run until `shutdown` resolves
    pub async fn run_until<F>(mut self, shutdown: F) -> DispatchStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        log::info!(
            "Dispatcher {} started: {} -> {} ({} pipeline, {:?})",
            self.config.worker_id,
            self.config.inbound,
            self.config.outbound,
            self.pipeline.mode(),
            self.config.delivery
        );

        // At-most-once has no processing list to recover from
        let mut recovered = self.config.delivery == Delivery::AtMostOnce;

        loop {
            let step = if recovered {
                self.set_state(DispatcherState::Waiting);
                let received = tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    received = self.receive() => received,
                };
                match received {
                    Ok(Some(payload)) => self.handle(payload).await,
                    Ok(None) => Ok(()),
                    Err(e) => Err(e.into()),
                }
            } else {
                match self.recover().await {
                    Ok(_) => {
                        recovered = true;
                        Ok(())
                    }
                    Err(e) => Err(e.into()),
                }
            };

            if let Err(e) = step {
                match &e {
                    DispatchError::Panicked(_) => self.stats.panics += 1,
                    _ => self.stats.transport_failures += 1,
                }
                log::error!("{}; retrying in {:?}", e, self.config.retry_delay);
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(self.config.retry_delay) => {}
                }
            }
        }

        self.set_state(DispatcherState::ShuttingDown);
        log::info!("Dispatcher stopped: {:?}", self.stats);
        self.stats
    }

    /// Put messages this worker left in flight in a previous run back in
    /// front of the inbound queue
    ///
    /// Only this worker's own list is touched; other workers' lists belong
    /// to them even when they share the inbound queue.
    async fn recover(&self) -> Result<usize, TransportError> {
        let moved = self
            .broker
            .requeue_all(&self.processing, &self.config.inbound)
            .await?;
        if moved > 0 {
            log::warn!(
                "Recovered {} in-flight messages from {}",
                moved,
                self.processing
            );
        }
        Ok(moved)
    }

    async fn receive(&self) -> Result<Option<String>, TransportError> {
        match self.config.delivery {
            Delivery::AtMostOnce => Ok(self
                .broker
                .blocking_pop(&self.config.inbound, self.config.pop_timeout)
                .await?
                .map(|(_, payload)| payload)),
            Delivery::AtLeastOnce => {
                self.broker
                    .blocking_move(&self.config.inbound, &self.processing, self.config.pop_timeout)
                    .await
            }
        }
    }

    /// Drive one message to a final state
    ///
    /// Broker failures and panics escape to the loop's backoff; everything
    /// else is a plain discard. A panicked message is discarded too, so it is
    /// never retried.
    async fn handle(&mut self, payload: String) -> Result<(), DispatchError> {
        let id = Uuid::new_v4();
        self.stats.received += 1;
        self.set_state(DispatcherState::Processing);
        log::info!("[{}] Received message ({} bytes)", id, payload.len());

        let task = tokio::spawn(process(
            Arc::clone(&self.pipeline),
            self.config.symbol.clone(),
            payload.clone(),
        ));

        let mut panicked = None;
        match task.await {
            Ok(Ok(response)) => {
                self.set_state(DispatcherState::Publishing);
                self.broker.push(&self.config.outbound, &response).await?;
                self.stats.published += 1;
                log::info!("[{}] Published result to {}", id, self.config.outbound);
            }
            Ok(Err(e)) => {
                self.set_state(DispatcherState::Discarding);
                self.stats.discarded += 1;
                log::warn!("[{}] Discarding message: {}", id, e);
            }
            Err(e) => {
                self.set_state(DispatcherState::Discarding);
                self.stats.discarded += 1;
                let reason = join_failure(e);
                log::error!("[{}] Discarding message, processing failed: {}", id, reason);
                panicked = Some(reason);
            }
        }

        if self.config.delivery == Delivery::AtLeastOnce {
            self.broker.remove(&self.processing, &payload).await?;
        }
        match panicked {
            Some(reason) => Err(DispatchError::Panicked(reason)),
            None => Ok(()),
        }
    }
}

/// Decode, translate and predict; the serialized response on success
async fn process(
    pipeline: Arc<dyn PredictionPipeline>,
    symbol: String,
    payload: String,
) -> Result<String, PipelineError> {
    let book = OrderBookPayload::from_json(&payload)?;
    let ticks = book.to_ticks(&symbol, Utc::now().timestamp_millis())?;
    let response = pipeline.predict(&ticks).await?;
    Ok(response.to_json()?)
}

fn join_failure(e: JoinError) -> String {
    if e.is_cancelled() {
        return "processing task cancelled".to_string();
    }
    panic_message(e.into_panic())
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => msg.to_string(),
            Err(_) => "non-string panic payload".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DispatcherConfig::default();
        assert_eq!(config.inbound, "lob_queue");
        assert_eq!(config.outbound, "results_queue");
        assert!(config.worker_id.starts_with("worker-"));
        assert_eq!(
            config.processing_queue(),
            format!("lob_queue:processing:{}", config.worker_id)
        );
        assert_eq!(config.retry_delay, Duration::from_secs(5));
        assert_eq!(config.pop_timeout, Duration::ZERO);
        assert_eq!(config.delivery, Delivery::AtMostOnce);
    }

    #[test]
    fn test_config_builders() {
        let config = DispatcherConfig::default()
            .with_queues("in", "out")
            .with_worker_id("w7")
            .with_retry_delay(Duration::from_millis(10))
            .with_delivery(Delivery::AtLeastOnce)
            .with_symbol("ETHUSDT");
        assert_eq!(config.processing_queue(), "in:processing:w7");
        assert_eq!(config.retry_delay, Duration::from_millis(10));
        assert_eq!(config.delivery, Delivery::AtLeastOnce);
        assert_eq!(config.symbol, "ETHUSDT");
    }

    #[test]
    fn test_generated_worker_ids_differ() {
        assert_ne!(generated_worker_id(), generated_worker_id());
        assert_ne!(
            DispatcherConfig::default().processing_queue(),
            DispatcherConfig::default().processing_queue()
        );
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new("bad bid".to_string())), "bad bid");
        assert_eq!(panic_message(Box::new(7_u8)), "non-string panic payload");
    }

    #[test]
    fn test_delivery_serde() {
        let delivery: Delivery = serde_json::from_str("\"at_least_once\"").unwrap();
        assert_eq!(delivery, Delivery::AtLeastOnce);
        assert_eq!(
            serde_json::to_string(&Delivery::AtMostOnce).unwrap(),
            "\"at_most_once\""
        );
    }
}
