use super::{block::Slot, BlockAllocator, Graph};
use crate::{
    error::Result,
    types::{BlockId, EType, VId, EDGE_BLOCK_SIZE, NO_BLOCK},
};
use log::debug;
use parking_lot::MutexGuard;

/// Outcome of [`ExclusiveChain::compact`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionReport {
    /// Odd/even passes run, the final swap-free pass included.
    pub passes: usize,
    pub live: usize,
    /// Tombstones turned back into empty slots.
    pub reclaimed: usize,
}

/// Exclusive access to one (vertex, edge type) chain.
///
/// Holding it keeps every mutator of the vertex out; the lock is released when
/// the value is dropped.
pub struct ExclusiveChain<'g, A: BlockAllocator> {
    graph: &'g Graph<A>,
    vertex: usize,
    etype: usize,
    _guard: MutexGuard<'g, ()>,
}

impl<A: BlockAllocator> Graph<A> {
    /// Blocks until the chain of `vertex` for `etype` is exclusively held.
    pub fn lock_chain(&self, vertex: VId, etype: EType) -> Result<ExclusiveChain<'_, A>> {
        let (v, t) = (self.check_vertex(vertex)?, self.check_etype(etype)?);
        Ok(ExclusiveChain {
            graph: self,
            vertex: v,
            etype: t,
            _guard: self.vertices.lock(v),
        })
    }
}

impl<'g, A: BlockAllocator> ExclusiveChain<'g, A> {
    /// Block handles from the chain head onwards.
    pub fn blocks(&self) -> Vec<BlockId> {
        let mut handles = Vec::new();
        let mut handle = self.graph.vertices.chain_head(self.vertex, self.etype);
        while handle != NO_BLOCK {
            handles.push(handle);
            handle = self.graph.pool.with_block(handle, |block| block.next());
        }
        handles
    }

    /// Live neighbors in physical chain order.
    pub fn neighbors(&self) -> Vec<VId> {
        let mut out = Vec::new();
        for handle in self.blocks() {
            self.graph.pool.with_block(handle, |block| {
                out.extend(block.live_edges().map(|(_, e)| e.neighbor))
            });
        }
        out
    }

    /// Sorts the chain ascending by neighbor with dead slots moved to the tail,
    /// then refreshes every block's cached summary.
    pub fn compact(&mut self) -> CompactionReport {
        let handles = self.blocks();
        let mut slots: Vec<Slot> = Vec::new();
        for &handle in handles.iter() {
            self.graph
                .pool
                .with_block(handle, |block| slots.extend_from_slice(block.slots()));
        }

        let key = |slot: &Slot| {
            if slot.is_live() {
                (0, slot.edge.neighbor)
            } else {
                (1, 0)
            }
        };
        let mut passes = 0;
        loop {
            passes += 1;
            let mut swapped = false;
            for start in 0..2 {
                for i in (start..slots.len().saturating_sub(1)).step_by(2) {
                    if key(&slots[i]) > key(&slots[i + 1]) {
                        slots.swap(i, i + 1);
                        swapped = true;
                    }
                }
            }
            if !swapped {
                break;
            }
        }

        let mut report = CompactionReport {
            passes,
            live: slots.iter().filter(|s| s.is_live()).count(),
            reclaimed: 0,
        };
        for (&handle, chunk) in handles.iter().zip(slots.chunks(EDGE_BLOCK_SIZE)) {
            report.reclaimed += self.graph.pool.with_block_mut(handle, |block| {
                block.slots_mut().copy_from_slice(chunk);
                block.rebuild_summary()
            });
        }
        debug!(
            "compacted chain of vertex {} type {}: {:?}",
            self.vertex, self.etype, report
        );
        report
    }
}
