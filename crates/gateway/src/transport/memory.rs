//! In-process broker for single-process mode
//!
//! Queues are `VecDeque`s behind one mutex, so every operation is atomic with
//! respect to every other. Waiters park on a [`Notify`] and re-check their
//! queue whenever anything is pushed.

use async_trait::async_trait;
use lobcast_ports::{QueueBroker, TransportError, TransportResult};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

type QueueMap = HashMap<String, VecDeque<String>>;

struct Inner {
    queues: Mutex<QueueMap>,
    notify: Notify,
    closed: AtomicBool,
}

/// Broker backed by in-memory lists
///
/// Cloning yields another handle onto the same queues, which is how a
/// producer and a worker share one broker in tests.
#[derive(Clone)]
pub struct MemoryBroker {
    inner: Arc<Inner>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                queues: Mutex::new(HashMap::new()),
                notify: Notify::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Close the broker; every subsequent call fails with [`TransportError::Closed`]
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Copy of `queue` from head to tail
    pub fn snapshot(&self, queue: &str) -> Vec<String> {
        self.inner
            .queues
            .lock()
            .get(queue)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn ensure_open(&self) -> TransportResult<()> {
        if self.is_closed() {
            Err(TransportError::Closed)
        } else {
            Ok(())
        }
    }

    /// Run `take` against the queues until it yields a value or the deadline passes
    async fn wait_for<T, F>(&self, timeout: Duration, mut take: F) -> TransportResult<Option<T>>
    where
        F: FnMut(&mut QueueMap) -> Option<T> + Send,
        T: Send,
    {
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);

        loop {
            // Register interest before checking so a push in between is not missed
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            self.ensure_open()?;
            let taken = {
                let mut queues = self.inner.queues.lock();
                take(&mut queues)
            };
            if taken.is_some() {
                return Ok(taken);
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return Ok(None);
                    }
                }
                None => notified.await,
            }
        }
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueBroker for MemoryBroker {
    async fn push(&self, queue: &str, payload: &str) -> TransportResult<()> {
        self.ensure_open()?;
        self.inner
            .queues
            .lock()
            .entry(queue.to_string())
            .or_default()
            .push_front(payload.to_string());
        self.inner.notify.notify_waiters();
        Ok(())
    }

    async fn pop(&self, queue: &str) -> TransportResult<Option<String>> {
        self.ensure_open()?;
        Ok(self
            .inner
            .queues
            .lock()
            .get_mut(queue)
            .and_then(|q| q.pop_back()))
    }

    async fn blocking_pop(
        &self,
        queue: &str,
        timeout: Duration,
    ) -> TransportResult<Option<(String, String)>> {
        self.wait_for(timeout, |queues| {
            queues
                .get_mut(queue)
                .and_then(|q| q.pop_back())
                .map(|payload| (queue.to_string(), payload))
        })
        .await
    }

    async fn blocking_move(
        &self,
        source: &str,
        destination: &str,
        timeout: Duration,
    ) -> TransportResult<Option<String>> {
        let moved = self
            .wait_for(timeout, |queues| {
                let payload = queues.get_mut(source).and_then(|q| q.pop_back())?;
                queues
                    .entry(destination.to_string())
                    .or_default()
                    .push_front(payload.clone());
                Some(payload)
            })
            .await?;
        if moved.is_some() {
            self.inner.notify.notify_waiters();
        }
        Ok(moved)
    }

    async fn remove(&self, queue: &str, payload: &str) -> TransportResult<usize> {
        self.ensure_open()?;
        let mut queues = self.inner.queues.lock();
        let Some(q) = queues.get_mut(queue) else {
            return Ok(0);
        };
        match q.iter().position(|p| p == payload) {
            Some(index) => {
                q.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn requeue_all(&self, source: &str, destination: &str) -> TransportResult<usize> {
        self.ensure_open()?;
        let moved = {
            let mut queues = self.inner.queues.lock();
            let items = queues.remove(source).unwrap_or_default();
            let count = items.len();
            let target = queues.entry(destination.to_string()).or_default();
            // Head of the source first, so the oldest item ends up at the tail
            for payload in items {
                target.push_back(payload);
            }
            count
        };
        if moved > 0 {
            self.inner.notify.notify_waiters();
        }
        Ok(moved)
    }

    async fn len(&self, queue: &str) -> TransportResult<usize> {
        self.ensure_open()?;
        Ok(self.inner.queues.lock().get(queue).map_or(0, VecDeque::len))
    }
}
