/*!
 * Mutual-Exclusion Primitives
 *
 * Three lock variants with different ordering/performance trade-offs:
 * - `TicketLock`: two-counter ticket lock, strict FIFO, spin or poll entry
 * - `ChainedLock`: tail-swap chaining, swap-order FIFO, one suspension point
 * - `FifoLock`: explicit waiter queue, strict FIFO, disposable
 *
 * `FifoLock` is the canonical choice for new code; `ChainedLock` only wins
 * when avoiding the explicit queue is a measured requirement.
 */

mod chained;
mod fifo;
mod ticket;

pub use chained::{ChainedLock, Permit};
pub use fifo::{FifoLock, FifoScope};
pub use ticket::{TicketGuard, TicketLock};
