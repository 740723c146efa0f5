//manager/queue.rs
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

struct Inner {
    items: VecDeque<i64>,
    queued: HashSet<i64>,
}

/// Bounded FIFO of claimed grading-unit ids, shared by the poller and the
/// workers. An id is held at most once at a time.
pub struct WorkQueue {
    capacity: usize,
    inner: Mutex<Inner>,
    available: Notify,
}

impl WorkQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                queued: HashSet::new(),
            }),
            available: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// How many more ids fit before the queue is full.
    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.len())
    }

    /// Enqueues `unit_id` unless it is already queued or the queue is full.
    pub fn push_unique(&self, unit_id: i64) -> bool {
        {
            let mut inner = self.lock();
            if inner.items.len() >= self.capacity || !inner.queued.insert(unit_id) {
                return false;
            }
            inner.items.push_back(unit_id);
        }
        self.available.notify_one();
        true
    }

    /// Takes the next id without waiting.
    pub fn try_pop(&self) -> Option<i64> {
        let mut inner = self.lock();
        let id = inner.items.pop_front()?;
        inner.queued.remove(&id);
        Some(id)
    }

    /// Waits for the next id. Returns `None` once `cancel` fires, even if ids
    /// are still queued.
    pub async fn pop(&self, cancel: &CancellationToken) -> Option<i64> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            // Register before checking so a push in between is not missed.
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(id) = self.try_pop() {
                return Some(id);
            }

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = &mut notified => {}
            }
        }
    }

    /// Removes every queued id and returns them in queue order.
    pub fn drain(&self) -> Vec<i64> {
        let mut inner = self.lock();
        inner.queued.clear();
        inner.items.drain(..).collect()
    }
}
