/*!
 * One-Shot Completion Handles
 *
 * Internal promise/future pairs used by the lock and queue primitives.
 * Each handle has exactly one producer and one consumer: signalled once,
 * awaited once, then discarded.
 */

use tokio::sync::oneshot;

/// Create a fresh (signal, waiter) pair
pub(crate) fn waiter<T>() -> (Signal<T>, Waiter<T>) {
    let (tx, rx) = oneshot::channel();
    (Signal { tx: Some(tx) }, Waiter { rx })
}

/// Producer half: fires at most once
pub(crate) struct Signal<T> {
    tx: Option<oneshot::Sender<T>>,
}

impl<T> Signal<T> {
    /// Deliver `value` to the waiter.
    ///
    /// Returns the value back if the waiter already gave up (receiver
    /// dropped) or the signal was already fired, so callers can re-route it.
    pub(crate) fn fire(&mut self, value: T) -> Result<(), T> {
        match self.tx.take() {
            Some(tx) => tx.send(value),
            None => Err(value),
        }
    }
}

/// Consumer half: resolves once the signal fires
///
/// Dropping the matching `Signal` without firing resolves the waiter with
/// `None` (close-on-drop), which callers surface as a closed outcome.
pub(crate) struct Waiter<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Waiter<T> {
    /// Block the current thread until the signal fires.
    ///
    /// Must not be called from an async runtime thread; async callers use
    /// [`Waiter::recv`] instead.
    pub(crate) fn wait_blocking(self) -> Option<T> {
        self.rx.blocking_recv().ok()
    }

    /// Suspend until the signal fires.
    ///
    /// Takes `&mut self` so it can race a cancellation branch in `select!`
    /// and still allow [`Waiter::cancel`] afterwards.
    pub(crate) async fn recv(&mut self) -> Option<T> {
        (&mut self.rx).await.ok()
    }

    /// Stop accepting the signal, then report a value that already arrived.
    ///
    /// Closing before checking makes the race with a concurrent `fire`
    /// deterministic: either the value is returned here, or `fire` observes
    /// the rejection and keeps it. A value can never land after `None`.
    pub(crate) fn cancel(&mut self) -> Option<T> {
        self.rx.close();
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_then_wait() {
        let (mut sig, wtr) = waiter::<u32>();
        assert!(sig.fire(7).is_ok());
        assert_eq!(wtr.wait_blocking(), Some(7));
    }

    #[test]
    fn test_fire_twice_returns_value() {
        let (mut sig, _wtr) = waiter::<u32>();
        assert!(sig.fire(1).is_ok());
        assert_eq!(sig.fire(2), Err(2));
    }

    #[test]
    fn test_dropped_waiter_rejects_value() {
        let (mut sig, wtr) = waiter::<u32>();
        drop(wtr);
        assert_eq!(sig.fire(9), Err(9));
    }

    #[test]
    fn test_dropped_signal_closes_waiter() {
        let (sig, wtr) = waiter::<u32>();
        drop(sig);
        assert_eq!(wtr.wait_blocking(), None);
    }

    #[tokio::test]
    async fn test_cancel_recovers_fired_value() {
        let (mut sig, mut wtr) = waiter::<u32>();
        sig.fire(3).unwrap();
        assert_eq!(wtr.cancel(), Some(3));
    }

    #[tokio::test]
    async fn test_fire_after_cancel_is_rejected() {
        let (mut sig, mut wtr) = waiter::<u32>();
        assert_eq!(wtr.cancel(), None);
        assert_eq!(sig.fire(5), Err(5));
    }
}
