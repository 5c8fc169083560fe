/*!
 * Spin/Poll Configuration
 *
 * Runtime tuning for the spinning and polling entries of the lock primitives
 */

use std::time::Duration;

/// Spin and poll tuning for `TicketLock`
///
/// Every primitive still constructs with no arguments; this only exists for
/// callers that have measured a different sweet spot.
#[derive(Debug, Clone, Copy)]
pub struct SpinPolicy {
    /// Spin iterations between `yield_now` calls while busy-waiting
    pub spins_per_yield: u32,
    /// Suspension interval between polls on the async entry
    pub poll_interval: Duration,
}

impl Default for SpinPolicy {
    fn default() -> Self {
        Self {
            spins_per_yield: 64,
            poll_interval: Duration::from_millis(1),
        }
    }
}

impl SpinPolicy {
    /// Tuning for very short critical sections (< 1µs hold times expected)
    pub const fn low_latency() -> Self {
        Self {
            spins_per_yield: 512,
            poll_interval: Duration::from_micros(100),
        }
    }
}
