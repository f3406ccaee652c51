//! Redis list broker
//!
//! Each queue is a Redis list: `LPUSH` at the head, `RPOP`/`BRPOP` at the
//! tail. The connection is opened on first use and reused for the lifetime
//! of the handle; [`ConnectionManager`] reconnects after a drop.

use async_trait::async_trait;
use lobcast_ports::{QueueBroker, TransportError, TransportResult};
use redis::aio::ConnectionManager;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Broker speaking to a Redis server
///
/// A blocking pop holds its connection until it returns, so every worker
/// must own a separate `RedisBroker`.
pub struct RedisBroker {
    url: String,
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
}

impl RedisBroker {
    /// Parse `url` (e.g., `redis://127.0.0.1:6379/0`); no connection is made yet
    pub fn new(url: &str) -> TransportResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| TransportError::Connection(format!("{}: {}", url, e)))?;
        Ok(Self {
            url: url.to_string(),
            client,
            conn: OnceCell::new(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the connection has been established
    pub fn is_connected(&self) -> bool {
        self.conn.initialized()
    }

    /// Round-trip a `PING`, connecting first if needed
    pub async fn ping(&self) -> TransportResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn connection(&self) -> TransportResult<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                log::info!("Connecting to Redis at {}", self.url);
                ConnectionManager::new(self.client.clone())
                    .await
                    .map_err(|e| TransportError::Connection(format!("{}: {}", self.url, e)))
            })
            .await?;
        Ok(conn.clone())
    }
}

/// Redis encodes a block-forever timeout as 0; sub-second values are allowed
fn timeout_arg(timeout: Duration) -> f64 {
    timeout.as_secs_f64()
}

fn map_redis_error(e: redis::RedisError) -> TransportError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
    {
        TransportError::Connection(e.to_string())
    } else {
        TransportError::Command(e.to_string())
    }
}

#[async_trait]
impl QueueBroker for RedisBroker {
    async fn push(&self, queue: &str, payload: &str) -> TransportResult<()> {
        let mut conn = self.connection().await?;
        let _: i64 = redis::cmd("LPUSH")
            .arg(queue)
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn pop(&self, queue: &str) -> TransportResult<Option<String>> {
        let mut conn = self.connection().await?;
        let payload: Option<String> = redis::cmd("RPOP")
            .arg(queue)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(payload)
    }

    async fn blocking_pop(
        &self,
        queue: &str,
        timeout: Duration,
    ) -> TransportResult<Option<(String, String)>> {
        let mut conn = self.connection().await?;
        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(queue)
            .arg(timeout_arg(timeout))
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(popped)
    }

    async fn blocking_move(
        &self,
        source: &str,
        destination: &str,
        timeout: Duration,
    ) -> TransportResult<Option<String>> {
        let mut conn = self.connection().await?;
        let moved: Option<String> = redis::cmd("BLMOVE")
            .arg(source)
            .arg(destination)
            .arg("RIGHT")
            .arg("LEFT")
            .arg(timeout_arg(timeout))
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(moved)
    }

    async fn remove(&self, queue: &str, payload: &str) -> TransportResult<usize> {
        let mut conn = self.connection().await?;
        let removed: usize = redis::cmd("LREM")
            .arg(queue)
            .arg(1)
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(removed)
    }

    async fn requeue_all(&self, source: &str, destination: &str) -> TransportResult<usize> {
        let mut conn = self.connection().await?;
        let mut moved = 0;
        loop {
            let item: Option<String> = redis::cmd("LMOVE")
                .arg(source)
                .arg(destination)
                .arg("LEFT")
                .arg("RIGHT")
                .query_async(&mut conn)
                .await
                .map_err(map_redis_error)?;
            if item.is_none() {
                break;
            }
            moved += 1;
        }
        Ok(moved)
    }

    async fn len(&self, queue: &str) -> TransportResult<usize> {
        let mut conn = self.connection().await?;
        let len: usize = redis::cmd("LLEN")
            .arg(queue)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(len)
    }
}
