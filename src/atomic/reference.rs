/*!
 * Atomic Reference Slot
 *
 * An atomic `Option<Arc<T>>` slot built on arc-swap's RCU-style pointer
 * exchange. Comparison is pointer identity, never `PartialEq`.
 */

use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Atomic single-slot cell over an optional shared reference
pub struct AtomicRef<T> {
    slot: ArcSwapOption<T>,
}

fn same_ref<T>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl<T> AtomicRef<T> {
    /// Create an empty slot
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    /// Read the current reference
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    /// Overwrite the current reference
    pub fn set(&self, value: Option<Arc<T>>) {
        self.slot.store(value)
    }

    /// Swap in `value`, returning the previous occupant
    pub fn exchange(&self, value: Option<Arc<T>>) -> Option<Arc<T>> {
        self.slot.swap(value)
    }

    /// Swap in `value`; reports whether the slot now points elsewhere
    pub fn try_exchange(&self, value: Option<Arc<T>>) -> (bool, Option<Arc<T>>) {
        let old = self.slot.swap(value.clone());
        (!same_ref(&old, &value), old)
    }

    /// Store `value` only if the slot currently holds `comparand` (pointer
    /// identity); returns the previous occupant either way
    pub fn compare_exchange(
        &self,
        value: Option<Arc<T>>,
        comparand: &Option<Arc<T>>,
    ) -> Option<Arc<T>> {
        let prev = self.slot.compare_and_swap(comparand, value);
        Option::clone(&prev)
    }

    /// Conditional swap; reports whether the slot changed
    pub fn try_compare_exchange(
        &self,
        value: Option<Arc<T>>,
        comparand: &Option<Arc<T>>,
    ) -> (bool, Option<Arc<T>>) {
        let old = self.compare_exchange(value.clone(), comparand);
        (
            same_ref(&old, comparand) && !same_ref(&old, &value),
            old,
        )
    }
}

impl<T> Default for AtomicRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for AtomicRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AtomicRef").field(&self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_then_set() {
        let slot = AtomicRef::<String>::new();
        assert!(slot.get().is_none());

        let a = Arc::new("a".to_string());
        slot.set(Some(a.clone()));
        assert!(Arc::ptr_eq(&slot.get().unwrap(), &a));
    }

    #[test]
    fn test_exchange_returns_previous() {
        let slot = AtomicRef::new();
        let a = Arc::new(1u32);
        let b = Arc::new(2u32);

        assert!(slot.exchange(Some(a.clone())).is_none());
        let prev = slot.exchange(Some(b)).unwrap();
        assert!(Arc::ptr_eq(&prev, &a));
    }

    #[test]
    fn test_try_exchange_pointer_identity() {
        let slot = AtomicRef::new();
        let a = Arc::new(5u32);

        let (changed, _) = slot.try_exchange(Some(a.clone()));
        assert!(changed);

        // Same Arc again: pointer-identical, nothing changed
        let (changed, _) = slot.try_exchange(Some(a.clone()));
        assert!(!changed);

        // Equal value but distinct allocation counts as a change
        let (changed, _) = slot.try_exchange(Some(Arc::new(5u32)));
        assert!(changed);
    }

    #[test]
    fn test_compare_exchange() {
        let slot = AtomicRef::new();
        let a = Arc::new(1u32);
        let b = Arc::new(2u32);

        slot.set(Some(a.clone()));

        // Mismatched comparand leaves the slot alone
        let old = slot.compare_exchange(Some(b.clone()), &None);
        assert!(Arc::ptr_eq(old.as_ref().unwrap(), &a));
        assert!(Arc::ptr_eq(&slot.get().unwrap(), &a));

        let (changed, _) = slot.try_compare_exchange(Some(b.clone()), &Some(a.clone()));
        assert!(changed);
        assert!(Arc::ptr_eq(&slot.get().unwrap(), &b));
    }
}
