/*!
 * Concurrent List
 *
 * A growable array guarded by the ticket spin lock. Critical sections are a
 * handful of instructions, so the spinning entry is the right tool and no
 * async variants are offered.
 */

use crate::atomic::AtomicCell;
use crate::locks::TicketLock;
use parking_lot::Mutex;

/// Spin-guarded growable list
pub struct ConcurrentList<T> {
    lock: TicketLock,
    /// Safe container for the items; exclusion comes from `lock`
    items: Mutex<Vec<T>>,
    count: AtomicCell<u64>,
}

impl<T> ConcurrentList<T> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            lock: TicketLock::new(),
            items: Mutex::new(Vec::new()),
            count: AtomicCell::new(0),
        }
    }

    /// Number of stored values (lock-free read)
    pub fn len(&self) -> usize {
        self.count.get() as usize
    }

    /// Whether the list holds no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a value
    pub fn push(&self, value: T) {
        let _guard = self.lock.enter();
        self.items.lock().push(value);
        self.count.fetch_inc();
    }

    /// Append a value only if the lock is free right now; `false` when a
    /// holder would force a spin
    pub fn try_push(&self, value: T) -> bool {
        let Some(_guard) = self.lock.try_enter() else {
            return false;
        };
        self.items.lock().push(value);
        self.count.fetch_inc();
        true
    }

    /// Append every value from `values`
    pub fn extend<I: IntoIterator<Item = T>>(&self, values: I) {
        let _guard = self.lock.enter();
        let mut items = self.items.lock();
        items.extend(values);
        self.count.set(items.len() as u64);
    }

    /// Remove and return the value at `index`; `None` if out of bounds
    pub fn remove(&self, index: usize) -> Option<T> {
        let _guard = self.lock.enter();
        let mut items = self.items.lock();
        if index >= items.len() {
            return None;
        }
        self.count.fetch_dec();
        Some(items.remove(index))
    }

    /// Remove and return every value as one snapshot
    pub fn drain(&self) -> Vec<T> {
        let _guard = self.lock.enter();
        let mut items = self.items.lock();
        self.count.set(0);
        items.drain(..).collect()
    }
}

impl<T: Clone> ConcurrentList<T> {
    /// Copy out the value at `index`; `None` if out of bounds
    pub fn get(&self, index: usize) -> Option<T> {
        let _guard = self.lock.enter();
        self.items.lock().get(index).cloned()
    }

    /// Copy out the whole list
    pub fn snapshot(&self) -> Vec<T> {
        let _guard = self.lock.enter();
        self.items.lock().clone()
    }
}

impl<T> Default for ConcurrentList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_push_get_remove() {
        let list = ConcurrentList::new();
        list.push(10);
        list.push(20);
        list.extend([30, 40]);

        assert_eq!(list.len(), 4);
        assert_eq!(list.get(2), Some(30));
        assert_eq!(list.remove(1), Some(20));
        assert_eq!(list.remove(9), None);
        assert_eq!(list.snapshot(), vec![10, 30, 40]);
    }

    #[test]
    fn test_try_push() {
        let list = ConcurrentList::new();
        assert!(list.try_push(1));

        // A held lock turns try_push into a refusal, not a spin
        let guard = list.lock.enter();
        assert!(!list.try_push(2));
        drop(guard);

        assert!(list.try_push(3));
        assert_eq!(list.snapshot(), vec![1, 3]);
    }

    #[test]
    fn test_drain() {
        let list = ConcurrentList::new();
        list.extend(0..3);
        assert_eq!(list.drain(), vec![0, 1, 2]);
        assert!(list.is_empty());
    }

    #[test]
    fn test_concurrent_pushes() {
        let list = Arc::new(ConcurrentList::new());
        let mut handles = vec![];

        for t in 0..4u32 {
            let list = list.clone();
            handles.push(thread::spawn(move || {
                for i in 0..250 {
                    list.push(t * 1000 + i);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(list.len(), 1000);
    }
}
