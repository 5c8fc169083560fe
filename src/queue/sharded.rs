/*!
 * Sharded Drain Queue
 *
 * Per-producer shards feed one shared sequence counter; the consumer drains
 * an order-preserving snapshot by swapping every shard's active/inactive
 * buffers in one registry-locked pass.
 *
 * # Ordering
 *
 * Each element's position in the drained array is exactly its assigned
 * sequence number, and sequence numbers from the shared counter form a
 * dense, gap-free, duplicate-free range per cycle - so the snapshot
 * preserves global insertion order for everything enqueued strictly before
 * the swap. Elements racing the swap land in this cycle or the next, never
 * lost or duplicated, because a shard swaps under the same lock its
 * enqueue uses.
 *
 * Shards are independently locked, so producers never block each other;
 * only a drain briefly contends with an enqueue on the same shard.
 */

use crate::atomic::AtomicCell;
use crate::errors::{SyncError, SyncResult};
use crate::locks::FifoLock;
use ahash::RandomState;
use log::{debug, trace};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::mem;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type SeqMap<T> = HashMap<u64, T, RandomState>;

struct ShardMaps<T> {
    active: SeqMap<T>,
    inactive: SeqMap<T>,
    /// Current cycle's shared sequence counter; replaced on every swap
    seq: Arc<AtomicCell<u64>>,
}

struct Shard<T> {
    lock: FifoLock,
    /// Safe container for the maps; exclusion comes from `lock`
    maps: Mutex<ShardMaps<T>>,
    available: AtomicCell<bool>,
}

impl<T> Shard<T> {
    fn new(seq: Arc<AtomicCell<u64>>) -> Self {
        Self {
            lock: FifoLock::new(),
            maps: Mutex::new(ShardMaps {
                active: SeqMap::with_hasher(RandomState::new()),
                inactive: SeqMap::with_hasher(RandomState::new()),
                seq,
            }),
            available: AtomicCell::new(true),
        }
    }

    fn insert(&self, value: T) -> SyncResult<()> {
        if !self.available.get() {
            return Err(SyncError::Closed);
        }
        let mut maps = self.maps.lock();
        let seq = maps.seq.fetch_inc();
        maps.active.insert(seq, value);
        Ok(())
    }

    /// Exchange active/inactive buffers and adopt the next cycle's counter.
    /// Runs under the same lock as `insert`, so no element can race past it.
    fn swap(&self, next_seq: Arc<AtomicCell<u64>>) {
        if !self.lock.wait() {
            return;
        }
        {
            let mut maps = self.maps.lock();
            let ShardMaps {
                active, inactive, ..
            } = &mut *maps;
            mem::swap(active, inactive);
            maps.seq = next_seq;
        }
        self.lock.release();
    }

    async fn swap_async(&self, next_seq: Arc<AtomicCell<u64>>) {
        if !self.lock.wait_async().await {
            return;
        }
        {
            let mut maps = self.maps.lock();
            let ShardMaps {
                active, inactive, ..
            } = &mut *maps;
            mem::swap(active, inactive);
            maps.seq = next_seq;
        }
        self.lock.release();
    }

    /// Copy the retired buffer into the snapshot at each recorded index
    fn drain_into(&self, slots: &mut [Option<T>]) {
        let mut maps = self.maps.lock();
        for (seq, value) in maps.inactive.drain() {
            if let Some(slot) = slots.get_mut(seq as usize) {
                *slot = Some(value);
            }
        }
    }
}

/// Producer handle onto one private shard
///
/// Dropping the handle disables its shard as a safety net; the registry
/// removes disabled shards on the next drain so an in-flight enqueue is
/// never dropped.
pub struct ShardHandle<T> {
    shard: Arc<Shard<T>>,
}

impl<T> ShardHandle<T> {
    /// Add a value under this shard's own lock
    ///
    /// Fails with `Closed` once the shard is disabled. Blocking entry; must
    /// not run on an async runtime thread.
    pub fn enqueue(&self, value: T) -> SyncResult<()> {
        if !self.shard.available.get() {
            return Err(SyncError::Closed);
        }
        let Some(_scope) = self.shard.lock.scoped() else {
            return Err(SyncError::Closed);
        };
        self.shard.insert(value)
    }

    /// Async counterpart of [`ShardHandle::enqueue`]
    pub async fn enqueue_async(&self, value: T) -> SyncResult<()> {
        if !self.shard.available.get() {
            return Err(SyncError::Closed);
        }
        let Some(_scope) = self.shard.lock.scoped_async().await else {
            return Err(SyncError::Closed);
        };
        self.shard.insert(value)
    }

    /// Cancellable counterpart of [`ShardHandle::enqueue`]
    pub async fn enqueue_async_cancellable(
        &self,
        value: T,
        cancel: &CancellationToken,
    ) -> SyncResult<()> {
        if !self.shard.available.get() {
            return Err(SyncError::Closed);
        }
        let Some(_scope) = self.shard.lock.scoped_async_cancellable(cancel).await else {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            return Err(SyncError::Closed);
        };
        self.shard.insert(value)
    }

    /// [`ShardHandle::enqueue`] with the failure detail erased to `bool`
    pub fn try_enqueue(&self, value: T) -> bool {
        self.enqueue(value).is_ok()
    }

    /// Stop accepting values; removal happens on the next drain
    pub fn disable(&self) {
        self.shard.available.set(false);
    }

    /// Whether the shard still accepts values
    pub fn is_available(&self) -> bool {
        self.shard.available.get()
    }
}

impl<T> Drop for ShardHandle<T> {
    fn drop(&mut self) {
        self.disable();
    }
}

struct Registry<T> {
    shards: Vec<Arc<Shard<T>>>,
    /// Counter shards currently assign from
    seq_in: Arc<AtomicCell<u64>>,
    /// Retired counter; its final value sizes the next snapshot
    seq_out: Arc<AtomicCell<u64>>,
}

/// Multi-producer queue drained as one order-preserving snapshot
pub struct ShardedQueue<T> {
    lock: FifoLock,
    state: Mutex<Registry<T>>,
}

impl<T> ShardedQueue<T> {
    /// Create an empty queue with no shards
    pub fn new() -> Self {
        Self {
            lock: FifoLock::new(),
            state: Mutex::new(Registry {
                shards: Vec::new(),
                seq_in: Arc::new(AtomicCell::new(0)),
                seq_out: Arc::new(AtomicCell::new(0)),
            }),
        }
    }

    /// Number of values enqueued in the current cycle
    pub fn len(&self) -> usize {
        self.state.lock().seq_in.get() as usize
    }

    /// Whether the current cycle holds no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn register_shard(&self) -> ShardHandle<T> {
        let mut reg = self.state.lock();
        let shard = Arc::new(Shard::new(reg.seq_in.clone()));
        reg.shards.push(shard.clone());
        ShardHandle { shard }
    }

    /// Create a private shard for one producer
    ///
    /// Fails with `Closed` if the registry lock was disposed. Blocking
    /// entry; must not run on an async runtime thread.
    pub fn create_shard(&self) -> SyncResult<ShardHandle<T>> {
        let _scope = self.lock.scoped().ok_or(SyncError::Closed)?;
        Ok(self.register_shard())
    }

    /// Async counterpart of [`ShardedQueue::create_shard`]
    pub async fn create_shard_async(&self) -> SyncResult<ShardHandle<T>> {
        let _scope = self.lock.scoped_async().await.ok_or(SyncError::Closed)?;
        Ok(self.register_shard())
    }

    /// Cancellable counterpart of [`ShardedQueue::create_shard`]
    pub async fn create_shard_async_cancellable(
        &self,
        cancel: &CancellationToken,
    ) -> SyncResult<ShardHandle<T>> {
        let Some(_scope) = self.lock.scoped_async_cancellable(cancel).await else {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            return Err(SyncError::Closed);
        };
        Ok(self.register_shard())
    }

    /// [`ShardedQueue::create_shard`] with the failure detail erased
    pub fn try_create_shard(&self) -> Option<ShardHandle<T>> {
        self.create_shard().ok()
    }

    /// Swap phase: retire the in counter, reset the replacement to zero,
    /// and report which shards to drop after the copy.
    ///
    /// Caller must hold the registry lock.
    fn begin_cycle(&self, disable_all: bool) -> (Vec<Arc<Shard<T>>>, Arc<AtomicCell<u64>>, Vec<usize>) {
        let mut reg = self.state.lock();

        if disable_all {
            for shard in &reg.shards {
                shard.available.set(false);
            }
        }
        let stale: Vec<usize> = reg
            .shards
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.available.get())
            .map(|(i, _)| i)
            .collect();

        let Registry {
            seq_in, seq_out, ..
        } = &mut *reg;
        mem::swap(seq_in, seq_out);
        reg.seq_in.set(0);

        (reg.shards.clone(), reg.seq_in.clone(), stale)
    }

    /// Copy phase: snapshot every shard's retired buffer, then drop the
    /// shards marked before the swap.
    ///
    /// Caller must hold the registry lock.
    fn finish_cycle(&self, stale: Vec<usize>, clear_all: bool) -> Vec<Option<T>> {
        let (shards, count) = {
            let reg = self.state.lock();
            (reg.shards.clone(), reg.seq_out.get() as usize)
        };

        let mut slots: Vec<Option<T>> = Vec::new();
        slots.resize_with(count, || None);
        for shard in &shards {
            shard.drain_into(&mut slots);
        }

        let mut reg = self.state.lock();
        if clear_all {
            reg.shards.clear();
        } else {
            for index in stale.iter().rev() {
                reg.shards.remove(*index);
            }
            if !stale.is_empty() {
                debug!("removed {} disabled shards on drain", stale.len());
            }
        }
        trace!("drained {} values", count);
        slots
    }

    fn collect(slots: Vec<Option<T>>) -> Vec<T> {
        // The sequence range is dense per cycle, so every slot is filled
        slots.into_iter().flatten().collect()
    }

    fn drain_cycle(&self, disable_all: bool) -> Vec<T> {
        let (shards, next_seq, stale) = self.begin_cycle(disable_all);
        for shard in &shards {
            shard.swap(next_seq.clone());
        }
        Self::collect(self.finish_cycle(stale, disable_all))
    }

    async fn drain_cycle_async(&self, disable_all: bool) -> Vec<T> {
        let (shards, next_seq, stale) = self.begin_cycle(disable_all);
        for shard in &shards {
            shard.swap_async(next_seq.clone()).await;
        }
        Self::collect(self.finish_cycle(stale, disable_all))
    }

    /// Drain everything enqueued before the swap as one ordered snapshot
    ///
    /// Blocking entry; must not run on an async runtime thread.
    pub fn drain_all(&self) -> Vec<T> {
        let Some(_scope) = self.lock.scoped() else {
            return Vec::new();
        };
        self.drain_cycle(false)
    }

    /// Async counterpart of [`ShardedQueue::drain_all`]
    pub async fn drain_all_async(&self) -> Vec<T> {
        let Some(_scope) = self.lock.scoped_async().await else {
            return Vec::new();
        };
        self.drain_cycle_async(false).await
    }

    /// Cancellable counterpart of [`ShardedQueue::drain_all`]
    ///
    /// Cancellation applies to registry-lock acquisition only; a drain that
    /// already started always completes, keeping every shard consistent.
    pub async fn drain_all_async_cancellable(&self, cancel: &CancellationToken) -> Vec<T> {
        let Some(_scope) = self.lock.scoped_async_cancellable(cancel).await else {
            return Vec::new();
        };
        self.drain_cycle_async(false).await
    }

    /// Snapshot variant reporting emptiness: `None` when nothing was drained
    pub fn try_drain_all(&self) -> Option<Vec<T>> {
        let values = self.drain_all();
        (!values.is_empty()).then_some(values)
    }

    /// Disable every shard, drain the final snapshot, and empty the registry
    pub fn clear(&self) -> Vec<T> {
        let Some(_scope) = self.lock.scoped() else {
            return Vec::new();
        };
        self.drain_cycle(true)
    }

    /// Async counterpart of [`ShardedQueue::clear`]
    pub async fn clear_async(&self) -> Vec<T> {
        let Some(_scope) = self.lock.scoped_async().await else {
            return Vec::new();
        };
        self.drain_cycle_async(true).await
    }

    /// Cancellable counterpart of [`ShardedQueue::clear`]
    pub async fn clear_async_cancellable(&self, cancel: &CancellationToken) -> Vec<T> {
        let Some(_scope) = self.lock.scoped_async_cancellable(cancel).await else {
            return Vec::new();
        };
        self.drain_cycle_async(true).await
    }
}

impl<T> Default for ShardedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
