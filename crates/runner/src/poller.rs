//! Depth Poller - feeds the inbound queue from an exchange depth endpoint
//!
//! Every interval it fetches `{depth_url}?symbol=S&limit=N` (Binance
//! `/api/v3/depth` format) and pushes the raw body onto the queue. Failures
//! are logged and the next poll goes ahead as scheduled.

use crate::error::PollError;
use lobcast_gateway::Queues;
use lobcast_ports::QueueBroker;
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Poller settings
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub depth_url: String,
    pub symbol: String,
    /// Levels per side requested from the exchange
    pub limit: u32,
    pub interval: Duration,
    pub queue: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            depth_url: "https://api.binance.com/api/v3/depth".to_string(),
            symbol: "BTCUSDT".to_string(),
            limit: 100,
            interval: Duration::from_secs(5),
            queue: Queues::LOB.to_string(),
        }
    }
}

impl PollerConfig {
    pub fn with_depth_url(mut self, url: impl Into<String>) -> Self {
        self.depth_url = url.into();
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }
}

/// Periodic producer of order-book snapshots
pub struct DepthPoller {
    client: Client,
    broker: Arc<dyn QueueBroker>,
    config: PollerConfig,
}

impl DepthPoller {
    pub fn new(broker: Arc<dyn QueueBroker>, config: PollerConfig) -> Self {
        Self {
            client: Client::new(),
            broker,
            config,
        }
    }

    /// Fetch one snapshot and push it
    pub async fn poll_once(&self) -> Result<(), PollError> {
        let limit = self.config.limit.to_string();
        let resp = self
            .client
            .get(&self.config.depth_url)
            .query(&[("symbol", self.config.symbol.as_str()), ("limit", limit.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PollError::Status(status.as_u16()));
        }

        let body = resp.text().await?;
        self.broker.push(&self.config.queue, &body).await?;
        log::debug!(
            "Pushed {} depth snapshot ({} bytes) to {}",
            self.config.symbol,
            body.len(),
            self.config.queue
        );
        Ok(())
    }

    /// Poll until `shutdown` resolves; returns the number of snapshots pushed
    pub async fn run_until<F>(self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut pushed = 0;

        log::info!(
            "Polling {} for {} every {:?}",
            self.config.depth_url,
            self.config.symbol,
            self.config.interval
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            match self.poll_once().await {
                Ok(()) => pushed += 1,
                Err(e) => log::warn!("Depth poll failed: {}", e),
            }
        }

        log::info!("Depth poller stopped after {} snapshots", pushed);
        pushed
    }
}
