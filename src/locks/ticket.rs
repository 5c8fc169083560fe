/*!
 * Ticket Spin Lock
 *
 * Classic two-counter ticket lock: `issued` hands out strictly increasing
 * tickets, `served` admits them in order. Service order equals ticket-issue
 * order, so waiters are never starved as long as every holder exits.
 *
 * # Performance
 *
 * - Ultra-low latency under light contention (pure spinning)
 * - The async entry suspends between fixed-interval polls instead of
 *   spinning, so it never monopolizes a runtime worker
 *
 * Not reentrant: a recursive `enter` from the lock holder deadlocks.
 */

use crate::atomic::AtomicCell;
use crate::config::SpinPolicy;
use std::hint;
use std::thread;

/// Two-counter ticket lock with spin-wait and poll-wait entries
pub struct TicketLock {
    issued: AtomicCell<u64>,
    served: AtomicCell<u64>,
    policy: SpinPolicy,
}

impl TicketLock {
    /// Create an unlocked ticket lock with default spin tuning
    pub fn new() -> Self {
        Self::with_policy(SpinPolicy::default())
    }

    /// Create with explicit spin/poll tuning
    pub fn with_policy(policy: SpinPolicy) -> Self {
        // served == issued + 1 so the first ticket is admitted immediately
        Self {
            issued: AtomicCell::new(0),
            served: AtomicCell::new(1),
            policy,
        }
    }

    /// Take a ticket and busy-wait until it is served
    pub fn enter(&self) -> TicketGuard<'_> {
        let ticket = self.issued.fetch_inc() + 1;
        if self.served.get() == ticket {
            return TicketGuard { lock: self };
        }

        let yield_every = self.policy.spins_per_yield.max(1);
        let mut spins: u32 = 0;
        loop {
            hint::spin_loop();
            spins = spins.wrapping_add(1);
            if spins % yield_every == 0 {
                thread::yield_now();
            }
            if self.served.get() == ticket {
                return TicketGuard { lock: self };
            }
        }
    }

    /// Acquire only if the lock is free right now; never takes a ticket
    /// it would have to wait on
    pub fn try_enter(&self) -> Option<TicketGuard<'_>> {
        let issued = self.issued.get();
        if self.served.get() != issued + 1 {
            return None;
        }
        // Claim the next ticket only if nobody raced us to it
        let (claimed, _) = self.issued.try_compare_exchange(issued + 1, issued);
        claimed.then(|| TicketGuard { lock: self })
    }

    /// Take a ticket and suspend between fixed-interval polls until served
    ///
    /// No cancellation entry exists: abandoning an issued ticket would hole
    /// the service sequence and deadlock every later ticket.
    pub async fn enter_async(&self) -> TicketGuard<'_> {
        let ticket = self.issued.fetch_inc() + 1;
        while self.served.get() != ticket {
            tokio::time::sleep(self.policy.poll_interval).await;
        }
        TicketGuard { lock: self }
    }

    /// Whether some ticket currently holds the lock
    pub fn is_locked(&self) -> bool {
        self.served.get() != self.issued.get() + 1
    }

    fn exit(&self) {
        self.served.fetch_inc();
    }
}

impl Default for TicketLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the lock for one ticket; exits on drop
#[must_use = "dropping the guard releases the lock"]
pub struct TicketGuard<'a> {
    lock: &'a TicketLock,
}

impl Drop for TicketGuard<'_> {
    fn drop(&mut self) {
        self.lock.exit();
    }
}
