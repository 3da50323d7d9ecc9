//! Bounded FIFO of candidate URLs
//!
//! Pushes never block: a full frontier drops the candidate. Pops wait on a
//! `Notify` for at most a caller-supplied timeout so workers can notice the
//! stop signal.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

#[derive(Debug)]
pub struct Frontier {
    capacity: usize,
    queue: Mutex<VecDeque<String>>,
    available: Notify,
}

impl Frontier {
    /// `capacity` must be positive; `CrawlConfig` validation guarantees it
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(4096))),
            available: Notify::new(),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current length over capacity, in `[0, 1]`
    #[must_use]
    pub fn fill_ratio(&self) -> f64 {
        self.len() as f64 / self.capacity as f64
    }

    /// Enqueue without blocking; false if the frontier is full
    pub fn try_push(&self, url: String) -> bool {
        {
            let mut queue = self.queue.lock();
            if queue.len() >= self.capacity {
                return false;
            }
            queue.push_back(url);
        }
        self.available.notify_one();
        true
    }

    #[must_use]
    pub fn try_pop(&self) -> Option<String> {
        self.queue.lock().pop_front()
    }

    /// Dequeue, waiting up to `timeout` for an item
    pub async fn pop_timeout(&self, timeout: Duration) -> Option<String> {
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(url) = self.try_pop() {
                return Some(url);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.try_pop();
            }
        }
    }

    /// Copy of the contents in FIFO order, taken under the lock
    ///
    /// The frontier is left exactly as it was.
    #[must_use]
    pub fn snapshot_contents(&self) -> Vec<String> {
        self.queue.lock().iter().cloned().collect()
    }

    /// Replace the contents; anything past capacity is dropped
    ///
    /// Returns how many URLs were dropped.
    pub fn restore(&self, urls: Vec<String>) -> usize {
        let total = urls.len();
        {
            let mut queue = self.queue.lock();
            queue.clear();
            queue.extend(urls.into_iter().take(self.capacity));
        }
        self.available.notify_waiters();
        total.saturating_sub(self.capacity)
    }

    pub fn clear(&self) {
        self.queue.lock().clear();
    }
}
