/*!
 * Error Types
 *
 * Shared error taxonomy for lock and queue operations
 */

use thiserror::Error;

/// Result type for blocking/suspending queue operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Terminal outcomes of a wait
///
/// A non-blocking `try_*` operation that finds nothing reports `None`/`false`
/// instead - an empty queue is a normal negative result, not an error.
/// Timeouts are not modeled; waits are unbounded unless cancelled.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// The primitive was disposed/disabled while waiting, or before the call
    #[error("primitive is closed")]
    Closed,

    /// The caller's own cancellation token fired while waiting
    #[error("wait was cancelled")]
    Cancelled,
}
