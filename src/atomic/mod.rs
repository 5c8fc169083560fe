/*!
 * Atomic Cells
 *
 * Single-slot atomic storage underpinning every primitive above it:
 * - `AtomicCell<T>`: one generic cell over any supported scalar
 * - `AtomicRef<T>`: an atomic `Option<Arc<T>>` slot for reference payloads
 *
 * All operations are lock-free and linearizable at single-slot granularity.
 */

mod cell;
mod reference;

pub use cell::{Atom, AtomInt, AtomicCell};
pub use reference::AtomicRef;
