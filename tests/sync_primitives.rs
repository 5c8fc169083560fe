/*!
 * Lock Primitive Integration Tests
 *
 * Ordering, mutual-exclusion and disposal properties of the three lock
 * variants under real thread and task interleavings
 */

use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use syncq::{ChainedLock, FifoLock, TicketLock};
use tokio_util::sync::CancellationToken;

#[test]
fn test_ticket_holder_order_equals_issue_order() {
    let lock = Arc::new(TicketLock::new());
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    // Park the lock so every spawned thread queues behind it
    let gate = lock.enter();

    let mut handles = vec![];
    for i in 0..6u32 {
        let lock = lock.clone();
        let order = order.clone();
        handles.push(thread::spawn(move || {
            let _guard = lock.enter();
            order.lock().push(i);
        }));
        // Enough separation to fix ticket-issue order
        thread::sleep(Duration::from_millis(30));
    }

    drop(gate);
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_ticket_single_holder_under_contention() {
    let lock = Arc::new(TicketLock::new());
    let active = Arc::new(AtomicU32::new(0));
    let peak = Arc::new(AtomicU32::new(0));
    let mut handles = vec![];

    for _ in 0..8 {
        let lock = lock.clone();
        let active = active.clone();
        let peak = peak.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..500 {
                let _guard = lock.enter();
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                active.fetch_sub(1, Ordering::SeqCst);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[test]
fn test_fifo_lock_hands_off_in_wait_order() {
    // Three threads wait in a known order; successive releases admit them
    // in the same order
    let lock = Arc::new(FifoLock::new());
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

    assert!(lock.wait());

    let mut handles = vec![];
    for i in 1..=3u32 {
        let lock = lock.clone();
        let order = order.clone();
        handles.push(thread::spawn(move || {
            assert!(lock.wait());
            order.lock().push(i);
            lock.release();
        }));
        // Enough separation to fix queue order
        thread::sleep(Duration::from_millis(50));
    }

    lock.release();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*order.lock(), vec![1, 2, 3]);
}

#[test]
fn test_fifo_lock_dispose_is_idempotent() {
    let lock = Arc::new(FifoLock::new());
    assert!(lock.wait());

    let lock_clone = lock.clone();
    let pending = thread::spawn(move || lock_clone.wait());

    thread::sleep(Duration::from_millis(50));
    lock.dispose();
    let first = lock.wait();
    lock.dispose();
    let second = lock.wait();

    // Pending waiter failed; later waits fail; twice == once
    assert!(!pending.join().unwrap());
    assert_eq!(first, second);
    assert!(!first);
}

#[test]
fn test_chained_lock_mutual_exclusion() {
    let lock = Arc::new(ChainedLock::new());
    let active = Arc::new(AtomicU32::new(0));
    let mut handles = vec![];

    for _ in 0..6 {
        let lock = lock.clone();
        let active = active.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                let permit = lock.wait();
                assert!(permit.is_accepted());
                assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                active.fetch_sub(1, Ordering::SeqCst);
                permit.release();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fifo_lock_async_contention() {
    let lock = Arc::new(FifoLock::new());
    let counter = Arc::new(AtomicU32::new(0));
    let mut tasks = vec![];

    for _ in 0..16 {
        let lock = lock.clone();
        let counter = counter.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..50 {
                assert!(lock.wait_async().await);
                counter.fetch_add(1, Ordering::SeqCst);
                lock.release();
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(counter.load(Ordering::SeqCst), 800);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fifo_lock_cancel_never_double_releases() {
    let lock = Arc::new(FifoLock::new());
    assert!(lock.wait_async().await);

    // Cancel a queued waiter, then verify one release still suffices
    let cancel = CancellationToken::new();
    let lock_clone = lock.clone();
    let cancel_clone = cancel.clone();
    let waiter =
        tokio::spawn(async move { lock_clone.wait_async_cancellable(&cancel_clone).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();
    assert!(!waiter.await.unwrap());

    lock.release();
    assert!(!lock.is_locked());

    // Lock is still fully functional
    assert!(lock.wait_async().await);
    lock.release();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_chained_lock_cancel_keeps_chain_alive() {
    let lock = Arc::new(ChainedLock::new());
    let holder = lock.wait_async().await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let rejected = lock.wait_async_cancellable(&cancel).await;
    assert!(!rejected.is_accepted());

    // A successor queued behind the cancelled waiter must still be admitted
    let lock_clone = lock.clone();
    let successor = tokio::spawn(async move {
        let permit = lock_clone.wait_async().await;
        let accepted = permit.is_accepted();
        permit.release();
        accepted
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    holder.release();

    assert!(successor.await.unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ticket_lock_async_entry() {
    let lock = Arc::new(TicketLock::new());
    let counter = Arc::new(AtomicU32::new(0));
    let mut tasks = vec![];

    for _ in 0..8 {
        let lock = lock.clone();
        let counter = counter.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..25 {
                let _guard = lock.enter_async().await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(counter.load(Ordering::SeqCst), 200);
    assert!(!lock.is_locked());
}
