use super::block::EdgeBlock;
use crate::{
    error::{Error, Result},
    types::{BlockId, EType, NO_BLOCK},
};
use log::info;
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard};
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

/// Hands out edge-block handles.
///
/// Handles are never reused and start at 1; handle 0 is the chain terminator.
pub trait BlockAllocator: Send + Sync {
    /// Claims the next unused handle.
    fn claim(&self) -> BlockId;

    /// One past the highest handle claimed so far.
    fn claimed(&self) -> usize;
}

/// Lock-free bump allocator: a shared counter advanced with `fetch_add`.
pub struct BumpAllocator {
    next: AtomicUsize,
}

impl Default for BumpAllocator {
    fn default() -> Self {
        Self {
            next: AtomicUsize::new(NO_BLOCK + 1),
        }
    }
}

impl BlockAllocator for BumpAllocator {
    fn claim(&self) -> BlockId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    fn claimed(&self) -> usize {
        self.next.load(Ordering::Relaxed)
    }
}

/// Allocator serialising every claim behind one mutex.
///
/// Handy in tests hunting ordering bugs: handles come out in a strict total order.
pub struct SerialAllocator {
    next: Mutex<usize>,
}

impl Default for SerialAllocator {
    fn default() -> Self {
        Self {
            next: Mutex::new(NO_BLOCK + 1),
        }
    }
}

impl BlockAllocator for SerialAllocator {
    fn claim(&self) -> BlockId {
        let mut next = self.next.lock();
        let handle = *next;
        *next += 1;
        handle
    }

    fn claimed(&self) -> usize {
        *self.next.lock()
    }
}

/// The arena of edge blocks shared by the whole graph.
///
/// Allocation is a bump of the allocator's counter. A handed-out block never
/// moves to a different handle. Growing the arena is the only operation needing
/// exclusive access: it takes the write side of `blocks`, which every other
/// access holds for reading only as long as it touches a single block.
pub struct EdgePool<A: BlockAllocator = BumpAllocator> {
    blocks: RwLock<Vec<Mutex<EdgeBlock>>>,
    allocator: A,
    max_blocks: usize,
    growth_timeout: Duration,
}

impl<A: BlockAllocator> EdgePool<A> {
    pub fn new(allocator: A, initial_blocks: usize, max_blocks: usize, growth_timeout: Duration) -> Self {
        let initial_blocks = initial_blocks.max(NO_BLOCK + 1);
        Self {
            blocks: RwLock::new((0..initial_blocks).map(|_| Mutex::default()).collect()),
            allocator,
            max_blocks,
            growth_timeout,
        }
    }

    /// Allocates a fresh block of type `etype` whose forward link is `next`.
    pub fn allocate_block(&self, etype: EType, next: BlockId) -> Result<BlockId> {
        let handle = self.allocator.claim();
        if handle >= self.max_blocks {
            return Err(Error::AllocationFailure {
                requested: handle,
                limit: self.max_blocks,
            });
        }
        loop {
            {
                let blocks = self.blocks.read();
                if let Some(block) = blocks.get(handle) {
                    *block.lock() = EdgeBlock::new(etype, next);
                    return Ok(handle);
                }
            }
            self.grow(handle + 1)?;
        }
    }

    fn grow(&self, min_len: usize) -> Result<()> {
        let mut blocks = self
            .blocks
            .try_write_for(self.growth_timeout)
            .ok_or(Error::ConcurrentGrowthConflict)?;
        if blocks.len() >= min_len {
            return Ok(());
        }
        let new_len = blocks
            .len()
            .saturating_mul(2)
            .max(min_len)
            .min(self.max_blocks);
        info!("growing edge pool from {} to {} blocks", blocks.len(), new_len);
        blocks.resize_with(new_len, Mutex::default);
        Ok(())
    }

    /// Runs `f` on block `handle`.
    ///
    /// # Panics
    ///
    /// Panics if `handle` was never allocated.
    pub fn with_block<R>(&self, handle: BlockId, f: impl FnOnce(&EdgeBlock) -> R) -> R {
        f(&self.blocks.read()[handle].lock())
    }

    pub fn with_block_mut<R>(&self, handle: BlockId, f: impl FnOnce(&mut EdgeBlock) -> R) -> R {
        f(&mut self.blocks.read()[handle].lock())
    }

    /// Pins the arena for a bulk read; growth waits until the view is dropped.
    pub fn view(&self) -> PoolView<'_> {
        PoolView {
            blocks: self.blocks.read(),
        }
    }

    /// Blocks handed out, the sentinel excluded.
    pub fn blocks_in_use(&self) -> usize {
        self.allocator
            .claimed()
            .min(self.max_blocks)
            .saturating_sub(NO_BLOCK + 1)
    }

    pub fn capacity(&self) -> usize {
        self.blocks.read().len()
    }
}

/// A read-pinned arena; see [`EdgePool::view`].
pub struct PoolView<'a> {
    blocks: RwLockReadGuard<'a, Vec<Mutex<EdgeBlock>>>,
}

impl<'a> PoolView<'a> {
    pub fn block(&self, handle: BlockId) -> MutexGuard<'_, EdgeBlock> {
        self.blocks[handle].lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pool<A: BlockAllocator + Default>(initial: usize, max: usize) -> EdgePool<A> {
        EdgePool::new(A::default(), initial, max, Duration::from_secs(1))
    }

    #[test]
    fn test_allocate_skips_sentinel() {
        let pool: EdgePool = pool(4, usize::MAX);
        let handle = pool.allocate_block(3, NO_BLOCK).unwrap();
        assert_eq!(handle, 1);
        assert_eq!(pool.with_block(handle, |b| (b.etype(), b.next())), (3, NO_BLOCK));
        assert_eq!(pool.blocks_in_use(), 1);
    }

    #[test]
    fn test_growth_keeps_contents() {
        let pool: EdgePool<SerialAllocator> = pool(2, usize::MAX);
        let first = pool.allocate_block(7, NO_BLOCK).unwrap();
        let handles: Vec<_> = (0..10).map(|i| pool.allocate_block(i, first).unwrap()).collect();
        assert_eq!(handles, (2..12).collect::<Vec<_>>());
        assert!(pool.capacity() >= 12);
        assert_eq!(pool.with_block(first, |b| b.etype()), 7);
        assert_eq!(pool.with_block(11, |b| (b.etype(), b.next())), (9, first));
    }

    #[test]
    fn test_exhaustion() {
        let pool: EdgePool = pool(2, 3);
        assert_eq!(pool.allocate_block(0, NO_BLOCK).unwrap(), 1);
        assert_eq!(pool.allocate_block(0, NO_BLOCK).unwrap(), 2);
        assert!(matches!(
            pool.allocate_block(0, NO_BLOCK),
            Err(Error::AllocationFailure { requested: 3, limit: 3 })
        ));
        assert_eq!(pool.blocks_in_use(), 2);
    }

    #[test]
    fn test_growth_conflict_while_pinned() {
        let pool: EdgePool = EdgePool::new(BumpAllocator::default(), 2, 64, Duration::from_millis(10));
        assert_eq!(pool.allocate_block(0, NO_BLOCK).unwrap(), 1);
        let view = pool.view();
        assert!(matches!(
            pool.allocate_block(0, NO_BLOCK),
            Err(Error::ConcurrentGrowthConflict)
        ));
        drop(view);
        // The conflicting claim consumed handle 2.
        assert_eq!(pool.allocate_block(0, NO_BLOCK).unwrap(), 3);
    }

    #[test]
    fn test_concurrent_allocation_unique() {
        let pool: EdgePool = pool(2, usize::MAX);
        let handles: Vec<Vec<BlockId>> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|t| {
                    let pool = &pool;
                    s.spawn(move || (0..200).map(|_| pool.allocate_block(t, NO_BLOCK).unwrap()).collect())
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        let all: HashSet<_> = handles.iter().flatten().copied().collect();
        assert_eq!(all.len(), 1600);
        assert!(!all.contains(&NO_BLOCK));
        assert_eq!(pool.blocks_in_use(), 1600);
    }
}
