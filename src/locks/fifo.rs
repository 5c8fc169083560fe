/*!
 * Explicit-Queue FIFO Lock
 *
 * Mutual exclusion backed by an explicit FIFO queue of waiter handles,
 * guarded by a short spin section. Queue order equals acquisition order.
 *
 * Release hands ownership directly to the next queued waiter (the locked
 * flag never clears in between), so the lock cannot be stolen out of order.
 * Disposal fails every pending waiter instead of hanging it; waits after
 * disposal report "not accepted" immediately.
 */

use crate::atomic::AtomicCell;
use crate::waiter::{waiter, Signal, Waiter};
use log::debug;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio_util::sync::CancellationToken;

/// Explicit waiter-queue lock; the canonical strict-FIFO primitive
pub struct FifoLock {
    /// Spin section guarding the waiter queue and flag transitions
    waiters: Mutex<VecDeque<Signal<bool>>>,
    locked: AtomicCell<bool>,
    disposed: AtomicCell<bool>,
}

/// Slow-path outcome of the enqueue step
enum Entry {
    /// Lock acquired on the fast path
    Acquired,
    /// Queued; wait on the handle outside the spin section
    Queued(Waiter<bool>),
    /// Disposed; the wait is not accepted
    Rejected,
}

impl FifoLock {
    /// Create an unlocked lock
    pub fn new() -> Self {
        Self {
            waiters: Mutex::new(VecDeque::new()),
            locked: AtomicCell::new(false),
            disposed: AtomicCell::new(false),
        }
    }

    fn try_entry(&self) -> Entry {
        if self.disposed.get() {
            return Entry::Rejected;
        }
        let mut queue = self.waiters.lock();
        if self.disposed.get() {
            return Entry::Rejected;
        }
        if self.locked.get() {
            let (sig, wtr) = waiter();
            queue.push_back(sig);
            Entry::Queued(wtr)
        } else {
            self.locked.set(true);
            Entry::Acquired
        }
    }

    /// Block the current thread until the lock is held
    ///
    /// Returns `false` ("not accepted") if the lock was disposed; callers
    /// must check before entering the critical section. Must not be called
    /// from an async runtime thread.
    pub fn wait(&self) -> bool {
        match self.try_entry() {
            Entry::Acquired => true,
            Entry::Queued(wtr) => wtr.wait_blocking().unwrap_or(false),
            Entry::Rejected => false,
        }
    }

    /// Suspend until the lock is held; `false` if disposed
    pub async fn wait_async(&self) -> bool {
        match self.try_entry() {
            Entry::Acquired => true,
            Entry::Queued(mut wtr) => wtr.recv().await.unwrap_or(false),
            Entry::Rejected => false,
        }
    }

    /// Suspend until the lock is held, `cancel` fires, or the lock is
    /// disposed; `false` unless the lock was acquired
    pub async fn wait_async_cancellable(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        match self.try_entry() {
            Entry::Acquired => true,
            Entry::Rejected => false,
            Entry::Queued(mut wtr) => {
                tokio::select! {
                    granted = wtr.recv() => granted.unwrap_or(false),
                    _ = cancel.cancelled() => {
                        // The hand-off may have completed before cancellation
                        // surfaced; a lock we now own must be released, never
                        // leaked - and never double-released if we don't.
                        if wtr.cancel() == Some(true) {
                            self.release();
                        }
                        false
                    }
                }
            }
        }
    }

    /// Hand the lock to the next queued waiter, or unlock if none
    pub fn release(&self) {
        loop {
            let mut next = {
                let mut queue = self.waiters.lock();
                if self.disposed.get() {
                    self.locked.set(false);
                    return;
                }
                match queue.pop_front() {
                    Some(sig) => sig,
                    None => {
                        self.locked.set(false);
                        return;
                    }
                }
            };
            if next.fire(true).is_ok() {
                // Ownership transferred; the flag stays locked
                return;
            }
            // Waiter gave up (cancelled); try the one behind it
        }
    }

    /// Dispose the lock, failing every pending waiter
    ///
    /// Idempotent; pending and future waits report "not accepted".
    pub fn dispose(&self) {
        let (changed, _) = self.disposed.try_exchange(true);
        if !changed {
            return;
        }
        let drained: Vec<Signal<bool>> = {
            let mut queue = self.waiters.lock();
            queue.drain(..).collect()
        };
        if !drained.is_empty() {
            debug!("fifo lock disposed with {} pending waiters", drained.len());
        }
        for mut sig in drained {
            let _ = sig.fire(false);
        }
    }

    /// Whether some caller currently holds the lock
    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }

    /// Whether the lock was disposed
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Acquire as an RAII scope; `None` if not accepted
    pub fn scoped(&self) -> Option<FifoScope<'_>> {
        self.wait().then(|| FifoScope { lock: self })
    }

    /// Async counterpart of [`FifoLock::scoped`]
    pub async fn scoped_async(&self) -> Option<FifoScope<'_>> {
        self.wait_async().await.then(|| FifoScope { lock: self })
    }

    /// Cancellable counterpart of [`FifoLock::scoped`]
    pub async fn scoped_async_cancellable(
        &self,
        cancel: &CancellationToken,
    ) -> Option<FifoScope<'_>> {
        self.wait_async_cancellable(cancel)
            .await
            .then(|| FifoScope { lock: self })
    }
}

impl Default for FifoLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FifoLock {
    fn drop(&mut self) {
        // Safety net only; explicit dispose is the primary release path
        self.dispose();
    }
}

/// Holds a `FifoLock` for one scope; releases on drop
#[must_use = "dropping the scope releases the lock"]
pub struct FifoScope<'a> {
    lock: &'a FifoLock,
}

impl Drop for FifoScope<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}
