/*!
 * Producer/Consumer Queues
 *
 * Queue variants built on the lock primitives:
 * - `BacklogQueue`: direct hand-off to a waiting consumer, else buffering
 * - `ShardedQueue`: per-producer shards drained as one order-preserving
 *   snapshot via an atomic buffer swap
 * - `SimpleQueue` / `ConcurrentList`: mutex-guarded simple siblings
 */

mod backlog;
mod list;
mod sharded;
mod simple;

pub use backlog::BacklogQueue;
pub use list::ConcurrentList;
pub use sharded::{ShardHandle, ShardedQueue};
pub use simple::SimpleQueue;
