//! The mutable edge store: an edge-block pool plus a vertex directory.
//!
//! ```text
//!  vertex directory                       edge pool
//! +------+----------------+         +-----+-----+-----+-----+
//! |  v0  | heads[t] ------+-------> |  0  |  1  |  2  | ... |
//! |  v1  | out_degrees[t] |         +-----+--+--+-----+-----+
//! | ...  | in_degree      |                  |  next
//! +------+----------------+                  +-------> ...
//! ```
//!
//! Every (vertex, edge type) pair owns a chain of blocks linked by handle.
//! Chains of distinct vertices never share a block, so edits to different
//! vertices never contend; edits to one vertex are serialised by its lock.

pub use block::{Edge, EdgeBlock, SlotState};
pub use compact::{CompactionReport, ExclusiveChain};
pub use mutation::EdgeChange;
pub use pool::{BlockAllocator, BumpAllocator, EdgePool, PoolView, SerialAllocator};
pub use stats::GraphStats;
pub use vertices::VertexDirectory;

pub(crate) use block::WeightUpdate;

mod block;
mod compact;
mod mutation;
mod pool;
mod stats;
mod vertices;

use crate::{
    config::GraphConfig,
    error::{Error, Result},
    types::{EType, VId, NO_BLOCK},
};
use std::sync::atomic::{AtomicI64, Ordering};

/// An in-memory, concurrently mutable temporal multigraph.
pub struct Graph<A: BlockAllocator = BumpAllocator> {
    config: GraphConfig,
    pool: EdgePool<A>,
    vertices: VertexDirectory,
    etype_counts: Box<[AtomicI64]>,
}

impl Graph {
    pub fn new(config: GraphConfig) -> Self {
        Self::with_allocator(config, BumpAllocator::default())
    }
}

impl<A: BlockAllocator> Graph<A> {
    pub fn with_allocator(config: GraphConfig, allocator: A) -> Self {
        let pool = EdgePool::new(
            allocator,
            config.get_initial_blocks(),
            config.get_max_blocks(),
            config.get_growth_timeout(),
        );
        let vertices = VertexDirectory::new(config.get_num_vertices(), config.get_num_etypes());
        let etype_counts = (0..config.get_num_etypes())
            .map(|_| AtomicI64::new(0))
            .collect();
        Self {
            config,
            pool,
            vertices,
            etype_counts,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn pool(&self) -> &EdgePool<A> {
        &self.pool
    }

    pub fn vertices(&self) -> &VertexDirectory {
        &self.vertices
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_etypes(&self) -> usize {
        self.vertices.num_etypes()
    }

    /// Live edges of type `etype`.
    pub fn edges_of_type(&self, etype: EType) -> Result<usize> {
        let t = self.check_etype(etype)?;
        Ok(self.etype_counts[t].load(Ordering::Relaxed).max(0) as usize)
    }

    /// Live edges of every type.
    pub fn total_edges(&self) -> usize {
        self.etype_counts
            .iter()
            .map(|c| c.load(Ordering::Relaxed).max(0) as usize)
            .sum()
    }

    pub fn out_degree(&self, vertex: VId) -> Result<usize> {
        Ok(self.vertices.total_out_degree(self.check_vertex(vertex)?))
    }

    pub fn out_degree_of_type(&self, vertex: VId, etype: EType) -> Result<usize> {
        Ok(self
            .vertices
            .out_degree(self.check_vertex(vertex)?, self.check_etype(etype)?))
    }

    pub fn in_degree(&self, vertex: VId) -> Result<usize> {
        Ok(self.vertices.in_degree(self.check_vertex(vertex)?))
    }

    /// The live edge `from -> to` of type `etype`, if any.
    pub fn edge(&self, etype: EType, from: VId, to: VId) -> Result<Option<Edge>> {
        let (v, t) = (self.check_vertex(from)?, self.check_etype(etype)?);
        let mut handle = self.vertices.chain_head(v, t);
        while handle != NO_BLOCK {
            let (found, next) = self.pool.with_block(handle, |block| {
                (block.find(to).map(|k| block.slots()[k].edge), block.next())
            });
            if found.is_some() {
                return Ok(found);
            }
            handle = next;
        }
        Ok(None)
    }

    pub fn has_edge(&self, etype: EType, from: VId, to: VId) -> Result<bool> {
        Ok(self.edge(etype, from, to)?.is_some())
    }

    /// Live out-edges of `vertex` over every edge type, with their type.
    pub fn neighbors(&self, vertex: VId) -> Result<Vec<(EType, Edge)>> {
        let v = self.check_vertex(vertex)?;
        let mut out = Vec::with_capacity(self.vertices.total_out_degree(v));
        for t in 0..self.num_etypes() {
            let mut handle = self.vertices.chain_head(v, t);
            while handle != NO_BLOCK {
                handle = self.pool.with_block(handle, |block| {
                    out.extend(block.live_edges().map(|(_, e)| (t as EType, *e)));
                    block.next()
                });
            }
        }
        Ok(out)
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats::new(
            self.num_vertices(),
            self.total_edges(),
            self.num_etypes(),
            self.pool.blocks_in_use(),
            self.pool.capacity(),
        )
    }

    pub(crate) fn check_vertex(&self, vertex: VId) -> Result<usize> {
        if vertex >= 0 && (vertex as u64) < self.num_vertices() as u64 {
            Ok(vertex as usize)
        } else {
            Err(Error::VertexOutOfRange {
                vertex,
                nv: self.num_vertices(),
            })
        }
    }

    pub(crate) fn check_etype(&self, etype: EType) -> Result<usize> {
        if etype >= 0 && (etype as u64) < self.num_etypes() as u64 {
            Ok(etype as usize)
        } else {
            Err(Error::EdgeTypeOutOfRange {
                etype,
                num_etypes: self.num_etypes(),
            })
        }
    }

    pub(crate) fn add_etype_count(&self, t: usize, delta: i64) {
        self.etype_counts[t].fetch_add(delta, Ordering::Relaxed);
    }
}
