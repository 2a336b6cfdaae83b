//! Pool of temporary backend buffers.
//!
//! [`TempPool::acquire`] hands out a [`Lease`]; dropping the lease puts the
//! buffer back on a free list keyed by its dimensions, so the next request
//! for the same shape reuses it. Because release happens in `Drop`, every
//! exit path (including `?` early returns) gives buffers back.
//!
//! Idle buffers are bounded by a byte budget. When a release pushes the
//! free list over budget, the least recently released buffers are dropped.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::backend::{BufferHandle, memory};
use crate::ComputeResult;

/// Shape of a pooled buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferKey {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl BufferKey {
    pub fn new(width: u32, height: u32, channels: u32) -> Self {
        Self { width, height, channels }
    }
}

/// Snapshot of pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers currently leased out.
    pub leased: usize,
    /// Idle buffers on the free list.
    pub free: usize,
    /// Bytes held by idle buffers.
    pub free_bytes: u64,
    /// Acquires served from the free list.
    pub hits: u64,
    /// Acquires that allocated.
    pub misses: u64,
    /// Idle buffers dropped to stay within budget.
    pub evictions: u64,
}

struct PoolState<H> {
    /// Idle buffers, front = least recently released.
    free: VecDeque<(BufferKey, H)>,
    free_bytes: u64,
    leased: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Pool of reusable temporary buffers.
pub struct TempPool<H> {
    state: Mutex<PoolState<H>>,
    max_bytes: u64,
}

impl<H: BufferHandle> TempPool<H> {
    /// Create pool with the default budget.
    pub fn new() -> Self {
        Self::with_budget(memory::pool_budget())
    }

    /// Create pool keeping at most `max_bytes` of idle buffers.
    pub fn with_budget(max_bytes: u64) -> Self {
        Self {
            state: Mutex::new(PoolState {
                free: VecDeque::new(),
                free_bytes: 0,
                leased: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            max_bytes,
        }
    }

    /// Lease a `width x height x channels` buffer.
    ///
    /// Reuses an idle buffer of the same shape when one exists, otherwise
    /// calls `alloc`. A reused buffer keeps its previous contents.
    pub fn acquire<F>(&self, width: u32, height: u32, channels: u32, alloc: F) -> ComputeResult<Lease<'_, H>>
    where
        F: FnOnce() -> ComputeResult<H>,
    {
        let key = BufferKey::new(width, height, channels);
        {
            let mut state = self.lock();
            if let Some(pos) = state.free.iter().rposition(|(k, _)| *k == key) {
                if let Some((_, handle)) = state.free.remove(pos) {
                    state.free_bytes = state.free_bytes.saturating_sub(handle.size_bytes());
                    state.hits += 1;
                    state.leased += 1;
                    trace!(?key, "pool hit");
                    return Ok(Lease { pool: self, handle: Some(handle) });
                }
            }
            state.misses += 1;
        }

        // Allocate outside the lock; a failed allocation leaves nothing leased.
        let handle = alloc()?;
        self.lock().leased += 1;
        trace!(?key, "pool miss");
        Ok(Lease { pool: self, handle: Some(handle) })
    }

    /// Current counters.
    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        PoolStats {
            leased: state.leased,
            free: state.free.len(),
            free_bytes: state.free_bytes,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
        }
    }

    /// Buffers currently leased out.
    pub fn leased(&self) -> usize {
        self.lock().leased
    }

    /// Idle buffer count.
    pub fn free_len(&self) -> usize {
        self.lock().free.len()
    }

    /// Byte budget for idle buffers.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Drop every idle buffer. Leased buffers are unaffected.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.free.clear();
        state.free_bytes = 0;
    }

    fn release(&self, handle: H) {
        let (width, height, channels) = handle.dimensions();
        let key = BufferKey::new(width, height, channels);
        let mut state = self.lock();
        state.leased = state.leased.saturating_sub(1);
        state.free_bytes += handle.size_bytes();
        state.free.push_back((key, handle));

        while state.free_bytes > self.max_bytes {
            match state.free.pop_front() {
                Some((_, old)) => {
                    state.free_bytes = state.free_bytes.saturating_sub(old.size_bytes());
                    state.evictions += 1;
                }
                None => break,
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<H>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H: BufferHandle> Default for TempPool<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// A leased buffer, returned to its pool on drop.
pub struct Lease<'p, H: BufferHandle> {
    pool: &'p TempPool<H>,
    handle: Option<H>,
}

impl<H: BufferHandle> Deref for Lease<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        // Only `Drop` takes the handle.
        self.handle.as_ref().unwrap_or_else(|| unreachable!("lease used after release"))
    }
}

impl<H: BufferHandle> DerefMut for Lease<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.handle.as_mut().unwrap_or_else(|| unreachable!("lease used after release"))
    }
}

impl<H: BufferHandle> Drop for Lease<'_, H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.pool.release(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ComputeError;

    struct Fake(u32, u32, u32);

    impl BufferHandle for Fake {
        fn dimensions(&self) -> (u32, u32, u32) {
            (self.0, self.1, self.2)
        }
    }

    fn alloc(w: u32, h: u32, c: u32) -> impl FnOnce() -> ComputeResult<Fake> {
        move || Ok(Fake(w, h, c))
    }

    #[test]
    fn test_lease_released_on_drop() {
        let pool: TempPool<Fake> = TempPool::with_budget(1 << 20);
        {
            let _a = pool.acquire(4, 4, 4, alloc(4, 4, 4)).unwrap();
            let _b = pool.acquire(4, 4, 4, alloc(4, 4, 4)).unwrap();
            assert_eq!(pool.leased(), 2);
        }
        assert_eq!(pool.leased(), 0);
        assert_eq!(pool.free_len(), 2);
    }

    #[test]
    fn test_reuse_matching_shape() {
        let pool: TempPool<Fake> = TempPool::with_budget(1 << 20);
        drop(pool.acquire(8, 2, 1, alloc(8, 2, 1)).unwrap());

        // different shape misses
        drop(pool.acquire(2, 8, 1, alloc(2, 8, 1)).unwrap());
        // same shape hits without calling alloc
        let lease = pool
            .acquire(8, 2, 1, || Err(ComputeError::BackendDispatchFailure("unused".into())))
            .unwrap();
        assert_eq!(lease.dimensions(), (8, 2, 1));
        drop(lease);

        let stats = pool.stats();
        assert_eq!((stats.hits, stats.misses), (1, 2));
        assert_eq!(stats.free, 2);
    }

    #[test]
    fn test_failed_alloc_leaks_nothing() {
        let pool: TempPool<Fake> = TempPool::with_budget(1 << 20);
        let res = pool.acquire(1, 1, 1, || Err(ComputeError::InvalidDimensions(1, 1)));
        assert!(res.is_err());
        assert_eq!(pool.leased(), 0);
    }

    #[test]
    fn test_eviction_over_budget() {
        // 4x4x4 f32 = 256 bytes; budget fits two
        let pool: TempPool<Fake> = TempPool::with_budget(512);
        let a = pool.acquire(4, 4, 4, alloc(4, 4, 4)).unwrap();
        let b = pool.acquire(4, 4, 4, alloc(4, 4, 4)).unwrap();
        let c = pool.acquire(4, 4, 4, alloc(4, 4, 4)).unwrap();
        drop(a);
        drop(b);
        drop(c);

        let stats = pool.stats();
        assert_eq!(stats.free, 2);
        assert_eq!(stats.free_bytes, 512);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn test_clear() {
        let pool: TempPool<Fake> = TempPool::with_budget(1 << 20);
        drop(pool.acquire(2, 2, 2, alloc(2, 2, 2)).unwrap());
        pool.clear();
        assert_eq!(pool.stats().free, 0);
        assert_eq!(pool.stats().free_bytes, 0);
    }
}
