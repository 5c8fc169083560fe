/*!
 * Chained Lock
 *
 * Mutual exclusion by chaining each waiter's completion handle onto the
 * previous holder's: a waiter swaps its own handle into the tail slot,
 * retrieves the previous occupant, and holds the lock once that occupant
 * completes. Release fires the caller's own handle, admitting whoever
 * swapped in next.
 *
 * Acquisition order is the realized swap order - deterministic, but under
 * true concurrency not necessarily program-submission order (a weaker FIFO
 * than the ticket lock).
 */

use crate::waiter::{waiter, Signal, Waiter};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Tail-swap chained lock
pub struct ChainedLock {
    /// Previous waiter's completion handle; `None` when uncontended
    tail: Mutex<Option<Waiter<()>>>,
}

impl ChainedLock {
    /// Create an unlocked chained lock
    pub fn new() -> Self {
        Self {
            tail: Mutex::new(None),
        }
    }

    fn chain(&self) -> (Signal<()>, Option<Waiter<()>>) {
        let (sig, wtr) = waiter();
        let prev = self.tail.lock().replace(wtr);
        (sig, prev)
    }

    /// Block the current thread until the lock is held
    ///
    /// Must not be called from an async runtime thread; use
    /// [`ChainedLock::wait_async`] there.
    pub fn wait(&self) -> Permit {
        let (sig, prev) = self.chain();
        if let Some(prev) = prev {
            // A dropped predecessor handle counts as released
            prev.wait_blocking();
        }
        Permit::accepted(sig)
    }

    /// Suspend until the lock is held
    pub async fn wait_async(&self) -> Permit {
        let (sig, prev) = self.chain();
        if let Some(mut prev) = prev {
            prev.recv().await;
        }
        Permit::accepted(sig)
    }

    /// Suspend until the lock is held or `cancel` fires
    ///
    /// A cancelled waiter gets a non-accepted permit and must not enter the
    /// critical section. Its own completion still fires once its predecessor
    /// finishes, so the next waiter in the chain is never orphaned.
    pub async fn wait_async_cancellable(&self, cancel: &CancellationToken) -> Permit {
        let (mut sig, prev) = self.chain();
        let Some(mut prev) = prev else {
            return Permit::accepted(sig);
        };

        tokio::select! {
            _ = prev.recv() => Permit::accepted(sig),
            _ = cancel.cancelled() => {
                // Forward the turn: once the predecessor completes, pass it
                // straight through to whoever swapped in after us.
                tokio::spawn(async move {
                    prev.recv().await;
                    let _ = sig.fire(());
                });
                Permit::rejected()
            }
        }
    }
}

impl Default for ChainedLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a chained-lock wait
///
/// An accepted permit holds the lock; releasing it (explicitly or on drop)
/// admits the next waiter in the chain.
#[must_use = "an accepted permit holds the lock until released or dropped"]
pub struct Permit {
    signal: Option<Signal<()>>,
    accepted: bool,
}

impl Permit {
    fn accepted(signal: Signal<()>) -> Self {
        Self {
            signal: Some(signal),
            accepted: true,
        }
    }

    fn rejected() -> Self {
        Self {
            signal: None,
            accepted: false,
        }
    }

    /// Whether the wait actually acquired the lock
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Release the lock, admitting the next waiter
    pub fn release(self) {
        // Drop does the signalling
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if let Some(mut sig) = self.signal.take() {
            let _ = sig.fire(());
        }
    }
}
