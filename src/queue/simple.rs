/*!
 * Simple FIFO Queue
 *
 * A growable FIFO queue guarded by a `ChainedLock`. Dequeue is non-blocking;
 * callers that need to wait for values use `BacklogQueue` instead.
 */

use crate::atomic::AtomicCell;
use crate::errors::{SyncError, SyncResult};
use crate::locks::ChainedLock;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio_util::sync::CancellationToken;

/// Mutex-guarded FIFO queue with sync and async entries
pub struct SimpleQueue<T> {
    lock: ChainedLock,
    /// Safe container for the items; exclusion comes from `lock`
    items: Mutex<VecDeque<T>>,
    count: AtomicCell<u64>,
    available: AtomicCell<bool>,
}

impl<T> SimpleQueue<T> {
    /// Create an empty, available queue
    pub fn new() -> Self {
        Self {
            lock: ChainedLock::new(),
            items: Mutex::new(VecDeque::new()),
            count: AtomicCell::new(0),
            available: AtomicCell::new(true),
        }
    }

    /// Number of queued values
    pub fn len(&self) -> usize {
        self.count.get() as usize
    }

    /// Whether no values are queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the queue still accepts values
    pub fn is_available(&self) -> bool {
        self.available.get()
    }

    /// Stop accepting values; queued values remain dequeueable. Idempotent.
    pub fn disable(&self) {
        self.available.set(false);
    }

    fn push(&self, value: T) -> SyncResult<()> {
        if !self.available.get() {
            return Err(SyncError::Closed);
        }
        let mut items = self.items.lock();
        items.push_back(value);
        self.count.fetch_inc();
        Ok(())
    }

    /// Append a value; fails with `Closed` once disabled
    ///
    /// Blocking entry; must not run on an async runtime thread.
    pub fn enqueue(&self, value: T) -> SyncResult<()> {
        if !self.available.get() {
            return Err(SyncError::Closed);
        }
        let permit = self.lock.wait();
        let pushed = self.push(value);
        permit.release();
        pushed
    }

    /// Async counterpart of [`SimpleQueue::enqueue`]
    pub async fn enqueue_async(&self, value: T) -> SyncResult<()> {
        if !self.available.get() {
            return Err(SyncError::Closed);
        }
        let permit = self.lock.wait_async().await;
        let pushed = self.push(value);
        permit.release();
        pushed
    }

    /// Cancellable counterpart of [`SimpleQueue::enqueue`]
    pub async fn enqueue_async_cancellable(
        &self,
        value: T,
        cancel: &CancellationToken,
    ) -> SyncResult<()> {
        if !self.available.get() {
            return Err(SyncError::Closed);
        }
        let permit = self.lock.wait_async_cancellable(cancel).await;
        if !permit.is_accepted() {
            return Err(SyncError::Cancelled);
        }
        let pushed = self.push(value);
        permit.release();
        pushed
    }

    /// [`SimpleQueue::enqueue`] with the failure detail erased to `bool`
    pub fn try_enqueue(&self, value: T) -> bool {
        self.enqueue(value).is_ok()
    }

    /// Async counterpart of [`SimpleQueue::try_enqueue`]
    pub async fn try_enqueue_async(&self, value: T) -> bool {
        self.enqueue_async(value).await.is_ok()
    }

    /// Cancellable counterpart of [`SimpleQueue::try_enqueue`]
    pub async fn try_enqueue_async_cancellable(
        &self,
        value: T,
        cancel: &CancellationToken,
    ) -> bool {
        self.enqueue_async_cancellable(value, cancel).await.is_ok()
    }

    fn pop(&self) -> Option<T> {
        let value = self.items.lock().pop_front();
        if value.is_some() {
            self.count.fetch_dec();
        }
        value
    }

    /// Remove and return the head; `None` when empty
    pub fn dequeue(&self) -> Option<T> {
        let permit = self.lock.wait();
        let value = self.pop();
        permit.release();
        value
    }

    /// Async counterpart of [`SimpleQueue::dequeue`]
    pub async fn dequeue_async(&self) -> Option<T> {
        let permit = self.lock.wait_async().await;
        let value = self.pop();
        permit.release();
        value
    }

    /// Cancellable counterpart of [`SimpleQueue::dequeue`]; `None` when
    /// empty or cancelled while queued for the lock
    pub async fn dequeue_async_cancellable(&self, cancel: &CancellationToken) -> Option<T> {
        let permit = self.lock.wait_async_cancellable(cancel).await;
        if !permit.is_accepted() {
            return None;
        }
        let value = self.pop();
        permit.release();
        value
    }

    /// [`SimpleQueue::dequeue`] with a lock-free emptiness fast path
    pub fn try_dequeue(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        self.dequeue()
    }

    fn take_all(&self) -> Vec<T> {
        let mut items = self.items.lock();
        self.count.set(0);
        items.drain(..).collect()
    }

    /// Remove and return every queued value as one snapshot
    pub fn drain(&self) -> Vec<T> {
        let permit = self.lock.wait();
        let values = self.take_all();
        permit.release();
        values
    }

    /// Async counterpart of [`SimpleQueue::drain`]
    pub async fn drain_async(&self) -> Vec<T> {
        let permit = self.lock.wait_async().await;
        let values = self.take_all();
        permit.release();
        values
    }

    /// Cancellable counterpart of [`SimpleQueue::drain`]; empty when
    /// cancelled while queued for the lock
    pub async fn drain_async_cancellable(&self, cancel: &CancellationToken) -> Vec<T> {
        let permit = self.lock.wait_async_cancellable(cancel).await;
        if !permit.is_accepted() {
            return Vec::new();
        }
        let values = self.take_all();
        permit.release();
        values
    }

    /// Snapshot variant reporting emptiness: `None` when nothing was queued
    pub fn try_drain(&self) -> Option<Vec<T>> {
        let values = self.drain();
        (!values.is_empty()).then_some(values)
    }
}

impl<T> Default for SimpleQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_enqueue_dequeue_fifo() {
        let queue = SimpleQueue::new();
        assert_eq!(queue.enqueue(1), Ok(()));
        assert!(queue.try_enqueue(2));
        assert_eq!(queue.enqueue(3), Ok(()));

        assert_eq!(queue.dequeue(), Some(1));
        assert_eq!(queue.try_dequeue(), Some(2));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_disable_is_terminal() {
        let queue = SimpleQueue::new();
        queue.enqueue(1).unwrap();
        queue.disable();
        queue.disable(); // idempotent

        assert_eq!(queue.enqueue(2), Err(SyncError::Closed));
        assert!(!queue.try_enqueue(2));
        // Queued values stay dequeueable
        assert_eq!(queue.dequeue(), Some(1));
        assert_eq!(queue.try_dequeue(), None);
    }

    #[test]
    fn test_drain_snapshot() {
        let queue = SimpleQueue::new();
        for i in 0..5 {
            queue.enqueue(i).unwrap();
        }
        assert_eq!(queue.drain(), vec![0, 1, 2, 3, 4]);
        assert_eq!(queue.try_drain(), None);
    }

    #[tokio::test]
    async fn test_async_entries() {
        let queue = SimpleQueue::new();
        assert_eq!(queue.enqueue_async(7).await, Ok(()));
        assert_eq!(queue.dequeue_async().await, Some(7));

        let cancel = CancellationToken::new();
        assert!(queue.try_enqueue_async_cancellable(8, &cancel).await);
        assert_eq!(queue.drain_async_cancellable(&cancel).await, vec![8]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancel_mid_wait_leaves_queue_intact() {
        let queue = Arc::new(SimpleQueue::new());
        queue.enqueue_async(1).await.unwrap();

        // Hold the internal lock so the cancellable calls pend on it
        let holder = queue.lock.wait_async().await;

        let cancel = CancellationToken::new();
        let queue_clone = queue.clone();
        let cancel_clone = cancel.clone();
        let producer = tokio::spawn(async move {
            queue_clone
                .enqueue_async_cancellable(2, &cancel_clone)
                .await
        });
        let queue_clone = queue.clone();
        let cancel_clone = cancel.clone();
        let drainer =
            tokio::spawn(async move { queue_clone.drain_async_cancellable(&cancel_clone).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        assert_eq!(producer.await.unwrap(), Err(SyncError::Cancelled));
        assert_eq!(drainer.await.unwrap(), Vec::<u32>::new());
        holder.release();

        // Nothing was added or removed by the cancelled calls
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dequeue_async().await, Some(1));
    }

    #[tokio::test]
    async fn test_cancelled_dequeue_returns_none() {
        let queue = SimpleQueue::new();
        queue.enqueue_async(9).await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(queue.dequeue_async_cancellable(&cancel).await, None);

        // The value is still there for an uncancelled dequeue
        assert_eq!(queue.dequeue_async().await, Some(9));
    }
}
