/*!
 * Generic Atomic Scalar Cell
 *
 * One cell type replaces a per-scalar-type family of wrappers. Supported
 * payloads are the trivially-copyable scalars (bool, integers, floats);
 * floats are stored and compared by bit pattern.
 *
 * # Semantics
 *
 * - Full-fence (`SeqCst`) ordering on every operation
 * - "Try" variants report whether the stored value changed - a convenience,
 *   not a retry-until-success CAS loop; callers needing a spin-CAS loop
 *   must loop themselves
 */

use std::sync::atomic::{
    AtomicBool, AtomicI32, AtomicI64, AtomicIsize, AtomicU32, AtomicU64, AtomicUsize,
    Ordering::SeqCst,
};

mod sealed {
    pub trait Sealed {}
}

/// Scalar types storable in an [`AtomicCell`]
///
/// Sealed; implemented for bool, i32/u32/i64/u64/isize/usize, f32/f64.
pub trait Atom: Copy + Send + Sync + sealed::Sealed + 'static {
    #[doc(hidden)]
    type Repr: Send + Sync;
    #[doc(hidden)]
    fn new_repr(value: Self) -> Self::Repr;
    #[doc(hidden)]
    fn load(repr: &Self::Repr) -> Self;
    #[doc(hidden)]
    fn store(repr: &Self::Repr, value: Self);
    #[doc(hidden)]
    fn swap(repr: &Self::Repr, value: Self) -> Self;
    #[doc(hidden)]
    fn compare_swap(repr: &Self::Repr, current: Self, new: Self) -> Self;
    /// Identity comparison: `==` for integers, bit equality for floats
    #[doc(hidden)]
    fn same(a: Self, b: Self) -> bool;
}

/// Integer payloads additionally support fetch-style arithmetic/bit ops
pub trait AtomInt: Atom {
    #[doc(hidden)]
    const ONE: Self;
    #[doc(hidden)]
    fn fetch_add(repr: &Self::Repr, value: Self) -> Self;
    #[doc(hidden)]
    fn fetch_sub(repr: &Self::Repr, value: Self) -> Self;
    #[doc(hidden)]
    fn fetch_and(repr: &Self::Repr, value: Self) -> Self;
    #[doc(hidden)]
    fn fetch_or(repr: &Self::Repr, value: Self) -> Self;
}

macro_rules! impl_atom_direct {
    ($($ty:ty => $repr:ty),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}
        impl Atom for $ty {
            type Repr = $repr;
            fn new_repr(value: Self) -> Self::Repr {
                <$repr>::new(value)
            }
            fn load(repr: &Self::Repr) -> Self {
                repr.load(SeqCst)
            }
            fn store(repr: &Self::Repr, value: Self) {
                repr.store(value, SeqCst)
            }
            fn swap(repr: &Self::Repr, value: Self) -> Self {
                repr.swap(value, SeqCst)
            }
            fn compare_swap(repr: &Self::Repr, current: Self, new: Self) -> Self {
                match repr.compare_exchange(current, new, SeqCst, SeqCst) {
                    Ok(old) | Err(old) => old,
                }
            }
            fn same(a: Self, b: Self) -> bool {
                a == b
            }
        }
    )*};
}

macro_rules! impl_atom_int {
    ($($ty:ty),* $(,)?) => {$(
        impl AtomInt for $ty {
            const ONE: Self = 1;
            fn fetch_add(repr: &Self::Repr, value: Self) -> Self {
                repr.fetch_add(value, SeqCst)
            }
            fn fetch_sub(repr: &Self::Repr, value: Self) -> Self {
                repr.fetch_sub(value, SeqCst)
            }
            fn fetch_and(repr: &Self::Repr, value: Self) -> Self {
                repr.fetch_and(value, SeqCst)
            }
            fn fetch_or(repr: &Self::Repr, value: Self) -> Self {
                repr.fetch_or(value, SeqCst)
            }
        }
    )*};
}

macro_rules! impl_atom_float {
    ($($ty:ty => ($repr:ty, $bits:ty)),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}
        impl Atom for $ty {
            type Repr = $repr;
            fn new_repr(value: Self) -> Self::Repr {
                <$repr>::new(value.to_bits())
            }
            fn load(repr: &Self::Repr) -> Self {
                <$ty>::from_bits(repr.load(SeqCst))
            }
            fn store(repr: &Self::Repr, value: Self) {
                repr.store(value.to_bits(), SeqCst)
            }
            fn swap(repr: &Self::Repr, value: Self) -> Self {
                <$ty>::from_bits(repr.swap(value.to_bits(), SeqCst))
            }
            fn compare_swap(repr: &Self::Repr, current: Self, new: Self) -> Self {
                let old = match repr.compare_exchange(
                    current.to_bits(),
                    new.to_bits(),
                    SeqCst,
                    SeqCst,
                ) {
                    Ok(old) | Err(old) => old,
                };
                <$ty>::from_bits(old)
            }
            fn same(a: Self, b: Self) -> bool {
                a.to_bits() == b.to_bits()
            }
        }
    )*};
}

impl_atom_direct! {
    bool => AtomicBool,
    i32 => AtomicI32,
    u32 => AtomicU32,
    i64 => AtomicI64,
    u64 => AtomicU64,
    isize => AtomicIsize,
    usize => AtomicUsize,
}
impl_atom_int!(i32, u32, i64, u64, isize, usize);
impl_atom_float! {
    f32 => (AtomicU32, u32),
    f64 => (AtomicU64, u64),
}

/// Atomic single-slot cell over a scalar
///
/// All reads/writes are indivisible; no intermediate state is observable.
pub struct AtomicCell<T: Atom> {
    repr: T::Repr,
}

impl<T: Atom> AtomicCell<T> {
    /// Create a cell holding `value`
    pub fn new(value: T) -> Self {
        Self {
            repr: T::new_repr(value),
        }
    }

    /// Read the current value
    #[inline]
    pub fn get(&self) -> T {
        T::load(&self.repr)
    }

    /// Overwrite the current value
    #[inline]
    pub fn set(&self, value: T) {
        T::store(&self.repr, value)
    }

    /// Swap in `value`, returning the previous value
    #[inline]
    pub fn exchange(&self, value: T) -> T {
        T::swap(&self.repr, value)
    }

    /// Swap in `value`; reports whether the stored value changed
    ///
    /// Returns `(changed, previous)` where `changed` is true when the
    /// previous value differed from `value`.
    #[inline]
    pub fn try_exchange(&self, value: T) -> (bool, T) {
        let old = T::swap(&self.repr, value);
        (!T::same(old, value), old)
    }

    /// Store `value` only if the cell currently holds `comparand`
    ///
    /// Returns the previous value either way.
    #[inline]
    pub fn compare_exchange(&self, value: T, comparand: T) -> T {
        T::compare_swap(&self.repr, comparand, value)
    }

    /// Conditional swap; reports whether the stored value changed
    ///
    /// Returns `(changed, previous)`: `changed` is true when `comparand`
    /// matched and the new value differs from the old one.
    #[inline]
    pub fn try_compare_exchange(&self, value: T, comparand: T) -> (bool, T) {
        let old = T::compare_swap(&self.repr, comparand, value);
        (T::same(old, comparand) && !T::same(old, value), old)
    }
}

impl<T: AtomInt> AtomicCell<T> {
    /// Add one, returning the previous value
    #[inline]
    pub fn fetch_inc(&self) -> T {
        T::fetch_add(&self.repr, T::ONE)
    }

    /// Subtract one, returning the previous value
    #[inline]
    pub fn fetch_dec(&self) -> T {
        T::fetch_sub(&self.repr, T::ONE)
    }

    /// Bitwise AND with `value`, returning the previous value
    #[inline]
    pub fn fetch_and(&self, value: T) -> T {
        T::fetch_and(&self.repr, value)
    }

    /// Bitwise OR with `value`, returning the previous value
    #[inline]
    pub fn fetch_or(&self, value: T) -> T {
        T::fetch_or(&self.repr, value)
    }
}

impl<T: Atom + Default> Default for AtomicCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Atom + std::fmt::Debug> std::fmt::Debug for AtomicCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AtomicCell").field(&self.get()).finish()
    }
}
