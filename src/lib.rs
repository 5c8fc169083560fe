/*!
 * syncq - Synchronization & Queueing Primitives
 *
 * Low-level coordination primitives for producers and consumers spread
 * across threads and async tasks. Every blocking operation has a
 * thread-blocking entry and a suspension-based (tokio) entry driven by the
 * same underlying state machine; async entries optionally accept a
 * cancellation token.
 *
 * # Architecture
 *
 * Leaf to root:
 * - [`atomic`]: single-slot atomic cells (scalars and `Arc` references)
 * - [`locks`]: ticket spin lock, chained lock, explicit-FIFO lock
 * - [`queue`]: rendezvous/backlog queue, sharded drain queue, and the
 *   mutex-guarded simple siblings
 *
 * Queues acquire locks to protect shared state; locks use atomic cells for
 * their counters and flags. Shared mutable state is touched only inside a
 * primitive's protected section, and every lock/unlock pair is
 * scope-guaranteed via RAII guards.
 *
 * # Lifecycle
 *
 * Primitives are constructed with no arguments, live for their component's
 * lifetime, and are terminated explicitly: `dispose()`/`disable()` fail
 * pending waiters with a well-defined closed outcome instead of hanging
 * them, and are idempotent. Guard drops are a safety net, never the primary
 * release path.
 */

pub mod atomic;
pub mod config;
pub mod errors;
pub mod locks;
pub mod queue;
mod waiter;

// Re-exports
pub use atomic::{AtomicCell, AtomicRef};
pub use config::SpinPolicy;
pub use errors::{SyncError, SyncResult};
pub use locks::{ChainedLock, FifoLock, FifoScope, Permit, TicketGuard, TicketLock};
pub use queue::{BacklogQueue, ConcurrentList, ShardHandle, ShardedQueue, SimpleQueue};
