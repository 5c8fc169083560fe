/*!
 * Rendezvous/Backlog Queue
 *
 * Hands values directly to a waiting consumer when one exists, bypassing the
 * buffer; otherwise appends to an unbounded backlog. A single consumer
 * blocks or suspends on an empty queue until a producer hands a value off.
 *
 * # Invariant
 *
 * A non-empty backlog and a waiting consumer never coexist: enqueue always
 * prefers satisfying the waiting consumer, and dequeue registers as waiter
 * only after observing an empty backlog under the same lock.
 */

use crate::atomic::AtomicCell;
use crate::errors::{SyncError, SyncResult};
use crate::locks::FifoLock;
use crate::waiter::{waiter, Signal, Waiter};
use log::debug;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio_util::sync::CancellationToken;

struct BacklogState<T> {
    backlog: VecDeque<T>,
    /// At most one outstanding consumer hand-off slot
    consumer: Option<Signal<T>>,
}

/// Single-consumer queue with rendezvous hand-off and backlog buffering
pub struct BacklogQueue<T> {
    lock: FifoLock,
    /// Safe container for the state; exclusion comes from `lock`
    state: Mutex<BacklogState<T>>,
    available: AtomicCell<bool>,
    count: AtomicCell<u64>,
}

impl<T> BacklogQueue<T> {
    /// Create an empty, available queue
    pub fn new() -> Self {
        Self {
            lock: FifoLock::new(),
            state: Mutex::new(BacklogState {
                backlog: VecDeque::new(),
                consumer: None,
            }),
            available: AtomicCell::new(true),
            count: AtomicCell::new(0),
        }
    }

    /// Number of buffered (unclaimed) values
    pub fn len(&self) -> usize {
        self.count.get() as usize
    }

    /// Whether no values are buffered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the queue still accepts values
    pub fn is_available(&self) -> bool {
        self.available.get()
    }

    /// Disable the queue: producers become no-ops, an outstanding consumer
    /// wait fails with `Closed`. Idempotent; buffered values remain drainable.
    ///
    /// Takes the lock's blocking entry under contention; must not run on an
    /// async runtime thread.
    pub fn disable(&self) {
        let (changed, _) = self.available.try_exchange(false);
        if !changed {
            return;
        }
        let stale = {
            let Some(_scope) = self.lock.scoped() else {
                return;
            };
            self.state.lock().consumer.take()
        };
        // Dropping the un-fired signal resolves the waiter as closed
        drop(stale);
        debug!("backlog queue disabled");
    }

    /// Add a value: hand off to a waiting consumer, else buffer
    ///
    /// Fails with `Closed` if the queue is disabled or the lock was disposed.
    /// Blocking entry; must not run on an async runtime thread.
    pub fn enqueue(&self, value: T) -> SyncResult<()> {
        if !self.available.get() {
            return Err(SyncError::Closed);
        }
        let mut value = value;
        loop {
            let Some(scope) = self.lock.scoped() else {
                return Err(SyncError::Closed);
            };
            let placed = self.place_value(value);
            drop(scope);
            match placed {
                Ok(outcome) => return outcome,
                Err((mut sig, v)) => match sig.fire(v) {
                    Ok(()) => return Ok(()),
                    // Consumer gave up between registering and the hand-off;
                    // go around again with the value
                    Err(v) => value = v,
                },
            }
        }
    }

    /// Async counterpart of [`BacklogQueue::enqueue`]
    pub async fn enqueue_async(&self, value: T) -> SyncResult<()> {
        if !self.available.get() {
            return Err(SyncError::Closed);
        }
        let mut value = value;
        loop {
            let Some(scope) = self.lock.scoped_async().await else {
                return Err(SyncError::Closed);
            };
            let placed = self.place_value(value);
            drop(scope);
            match placed {
                Ok(outcome) => return outcome,
                Err((mut sig, v)) => match sig.fire(v) {
                    Ok(()) => return Ok(()),
                    Err(v) => value = v,
                },
            }
        }
    }

    /// Cancellable counterpart of [`BacklogQueue::enqueue`]
    pub async fn enqueue_async_cancellable(
        &self,
        value: T,
        cancel: &CancellationToken,
    ) -> SyncResult<()> {
        if !self.available.get() {
            return Err(SyncError::Closed);
        }
        let mut value = value;
        loop {
            let Some(scope) = self.lock.scoped_async_cancellable(cancel).await else {
                if cancel.is_cancelled() {
                    return Err(SyncError::Cancelled);
                }
                return Err(SyncError::Closed);
            };
            let placed = self.place_value(value);
            drop(scope);
            match placed {
                Ok(outcome) => return outcome,
                Err((mut sig, v)) => match sig.fire(v) {
                    Ok(()) => return Ok(()),
                    Err(v) => value = v,
                },
            }
        }
    }

    /// [`BacklogQueue::enqueue`] with the failure detail erased to `bool`
    pub fn try_enqueue(&self, value: T) -> bool {
        self.enqueue(value).is_ok()
    }

    /// Async counterpart of [`BacklogQueue::try_enqueue`]
    pub async fn try_enqueue_async(&self, value: T) -> bool {
        self.enqueue_async(value).await.is_ok()
    }

    /// Cancellable counterpart of [`BacklogQueue::try_enqueue`]
    pub async fn try_enqueue_async_cancellable(
        &self,
        value: T,
        cancel: &CancellationToken,
    ) -> bool {
        self.enqueue_async_cancellable(value, cancel).await.is_ok()
    }

    /// Under the lock: buffer the value or take the waiting consumer's slot.
    ///
    /// `Ok(outcome)` means the decision is final; `Err((signal, value))`
    /// means a hand-off must be attempted outside the state section.
    fn place_value(&self, value: T) -> Result<SyncResult<()>, (Signal<T>, T)> {
        let mut st = self.state.lock();
        if !self.available.get() {
            return Ok(Err(SyncError::Closed));
        }
        match st.consumer.take() {
            Some(sig) => Err((sig, value)),
            None => {
                st.backlog.push_back(value);
                self.count.fetch_inc();
                Ok(Ok(()))
            }
        }
    }

    /// Under the lock: pop the head, or register as the sole waiting consumer
    fn take_or_register(&self) -> SyncResult<Result<T, Waiter<T>>> {
        let mut st = self.state.lock();
        if !self.available.get() {
            return Err(SyncError::Closed);
        }
        if let Some(value) = st.backlog.pop_front() {
            self.count.fetch_dec();
            return Ok(Ok(value));
        }
        let (sig, wtr) = waiter();
        // Displaces a previous waiter, whose wait resolves as closed; this
        // queue serves a single consumer at a time
        st.consumer = Some(sig);
        Ok(Err(wtr))
    }

    /// Remove the head value, blocking until a producer hands one off
    ///
    /// Fails with `Closed` once the queue is disabled. Must not run on an
    /// async runtime thread.
    pub fn dequeue(&self) -> SyncResult<T> {
        if !self.available.get() {
            return Err(SyncError::Closed);
        }
        let registered = {
            let _scope = self.lock.scoped().ok_or(SyncError::Closed)?;
            self.take_or_register()?
        };
        match registered {
            Ok(value) => Ok(value),
            Err(wtr) => wtr.wait_blocking().ok_or(SyncError::Closed),
        }
    }

    /// Async counterpart of [`BacklogQueue::dequeue`]
    pub async fn dequeue_async(&self) -> SyncResult<T> {
        if !self.available.get() {
            return Err(SyncError::Closed);
        }
        let registered = {
            let _scope = self.lock.scoped_async().await.ok_or(SyncError::Closed)?;
            self.take_or_register()?
        };
        match registered {
            Ok(value) => Ok(value),
            Err(mut wtr) => wtr.recv().await.ok_or(SyncError::Closed),
        }
    }

    /// Cancellable counterpart of [`BacklogQueue::dequeue`]
    ///
    /// If a producer completed the hand-off before cancellation surfaced,
    /// the value is returned rather than discarded - a race between
    /// cancellation and hand-off never silently drops a value.
    pub async fn dequeue_async_cancellable(
        &self,
        cancel: &CancellationToken,
    ) -> SyncResult<T> {
        if !self.available.get() {
            return Err(SyncError::Closed);
        }
        let registered = {
            let _scope = self
                .lock
                .scoped_async_cancellable(cancel)
                .await
                .ok_or(SyncError::Cancelled)?;
            self.take_or_register()?
        };
        match registered {
            Ok(value) => Ok(value),
            Err(mut wtr) => {
                tokio::select! {
                    value = wtr.recv() => value.ok_or(SyncError::Closed),
                    _ = cancel.cancelled() => {
                        match wtr.cancel() {
                            Some(value) => Ok(value),
                            None => Err(SyncError::Cancelled),
                        }
                    }
                }
            }
        }
    }

    /// Pop the head without blocking; `None` when the backlog is empty
    pub fn try_dequeue(&self) -> Option<T> {
        if !self.available.get() {
            return None;
        }
        let _scope = self.lock.scoped()?;
        let mut st = self.state.lock();
        let value = st.backlog.pop_front();
        if value.is_some() {
            self.count.fetch_dec();
        }
        value
    }

    fn drain_locked(&self) -> Vec<T> {
        let mut st = self.state.lock();
        self.count.set(0);
        st.backlog.drain(..).collect()
    }

    /// Remove and return every buffered value as one snapshot
    ///
    /// Works on a disabled queue: in-flight consumers drain silently.
    pub fn drain(&self) -> Vec<T> {
        let Some(_scope) = self.lock.scoped() else {
            return Vec::new();
        };
        self.drain_locked()
    }

    /// Async counterpart of [`BacklogQueue::drain`]
    pub async fn drain_async(&self) -> Vec<T> {
        let Some(_scope) = self.lock.scoped_async().await else {
            return Vec::new();
        };
        self.drain_locked()
    }

    /// Cancellable counterpart of [`BacklogQueue::drain`]
    pub async fn drain_async_cancellable(&self, cancel: &CancellationToken) -> Vec<T> {
        let Some(_scope) = self.lock.scoped_async_cancellable(cancel).await else {
            return Vec::new();
        };
        self.drain_locked()
    }

    /// Snapshot variant reporting emptiness: `None` when nothing was buffered
    pub fn try_drain(&self) -> Option<Vec<T>> {
        let values = self.drain();
        (!values.is_empty()).then_some(values)
    }
}

impl<T> Default for BacklogQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
