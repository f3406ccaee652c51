//! Result Relay - drains the results queue to live subscribers
//!
//! Every interval, while at least one subscriber is attached, one result is
//! popped from the queue and broadcast to every subscriber. With nobody
//! listening the queue is left alone, so other consumers (or a later
//! subscriber) still get the results.

use lobcast_gateway::Queues;
use lobcast_ports::{QueueBroker, TransportResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Relay settings
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub queue: String,
    pub interval: Duration,
    /// Results buffered per subscriber before a slow one starts skipping
    pub capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            queue: Queues::RESULTS.to_string(),
            interval: Duration::from_millis(200),
            capacity: 256,
        }
    }
}

impl RelayConfig {
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Queue-to-broadcast bridge feeding the live result stream
pub struct ResultRelay {
    broker: Arc<dyn QueueBroker>,
    config: RelayConfig,
    results: broadcast::Sender<String>,
}

impl ResultRelay {
    pub fn new(broker: Arc<dyn QueueBroker>, config: RelayConfig) -> Self {
        let (results, _) = broadcast::channel(config.capacity.max(1));
        Self {
            broker,
            config,
            results,
        }
    }

    /// Sending half, for handing out more subscriptions (e.g. per client)
    pub fn sender(&self) -> broadcast::Sender<String> {
        self.results.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.results.subscribe()
    }

    /// Move at most one result to the subscribers; whether one was relayed
    pub async fn relay_once(&self) -> TransportResult<bool> {
        if self.results.receiver_count() == 0 {
            return Ok(false);
        }
        let Some(payload) = self.broker.pop(&self.config.queue).await? else {
            return Ok(false);
        };
        if self.results.send(payload).is_err() {
            log::warn!("Subscribers left before a result from {} was relayed", self.config.queue);
            return Ok(false);
        }
        Ok(true)
    }

    /// Relay until `shutdown` resolves; returns the number of results relayed
    pub async fn run_until<F>(self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut relayed = 0;

        log::info!(
            "Relaying {} to stream subscribers every {:?}",
            self.config.queue,
            self.config.interval
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            match self.relay_once().await {
                Ok(true) => relayed += 1,
                Ok(false) => {}
                Err(e) => log::warn!("Result relay failed: {}", e),
            }
        }

        log::info!("Result relay stopped after {} results", relayed);
        relayed
    }
}
