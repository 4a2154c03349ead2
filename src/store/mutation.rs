use super::{block::Edge, BlockAllocator, Graph, WeightUpdate};
use crate::{
    csr::Csr,
    error::{Error, Result},
    types::{BlockId, EType, Timestamp, VId, Weight, EDGE_BLOCK_SIZE, NO_BLOCK},
};
use log::info;
use rayon::prelude::*;

/// What an insert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeChange {
    Inserted,
    /// The edge existed; its weight and `time_recent` were updated.
    Updated,
}

impl<A: BlockAllocator> Graph<A> {
    /// Inserts `from -> to`, or updates its weight and `time_recent` if present.
    pub fn insert_edge(
        &self,
        etype: EType,
        from: VId,
        to: VId,
        weight: Weight,
        timestamp: Timestamp,
    ) -> Result<EdgeChange> {
        self.upsert(etype, from, to, WeightUpdate::Replace(weight), timestamp)
    }

    /// Like [`insert_edge`](Self::insert_edge), but adds `weight` to an existing edge's weight.
    pub fn increment_edge(
        &self,
        etype: EType,
        from: VId,
        to: VId,
        weight: Weight,
        timestamp: Timestamp,
    ) -> Result<EdgeChange> {
        self.upsert(etype, from, to, WeightUpdate::Add(weight), timestamp)
    }

    /// Inserts both `from -> to` and `to -> from`.
    pub fn insert_edge_pair(
        &self,
        etype: EType,
        from: VId,
        to: VId,
        weight: Weight,
        timestamp: Timestamp,
    ) -> Result<(EdgeChange, EdgeChange)> {
        Ok((
            self.insert_edge(etype, from, to, weight, timestamp)?,
            self.insert_edge(etype, to, from, weight, timestamp)?,
        ))
    }

    /// Tombstones `from -> to`. Returns `false` if there was no such edge.
    pub fn remove_edge(&self, etype: EType, from: VId, to: VId) -> Result<bool> {
        let (v, t) = (self.check_vertex(from)?, self.check_etype(etype)?);
        let _guard = self.vertices.lock(v);
        let mut handle = self.vertices.chain_head(v, t);
        while handle != NO_BLOCK {
            let (removed, next) = self.pool.with_block_mut(handle, |block| {
                let removed = block.find(to).map(|k| block.tombstone(k));
                (removed, block.next())
            });
            if removed.is_some() {
                self.vertices.add_out_degree(v, t, -1);
                if let Ok(d) = self.check_vertex(to) {
                    self.vertices.add_in_degree(d, -1);
                }
                self.add_etype_count(t, -1);
                return Ok(true);
            }
            handle = next;
        }
        Ok(false)
    }

    /// Removes both `from -> to` and `to -> from`; returns how many were present.
    pub fn remove_edge_pair(&self, etype: EType, from: VId, to: VId) -> Result<usize> {
        let forward = self.remove_edge(etype, from, to)?;
        let backward = self.remove_edge(etype, to, from)?;
        Ok(forward as usize + backward as usize)
    }

    fn upsert(
        &self,
        etype: EType,
        from: VId,
        to: VId,
        update: WeightUpdate,
        timestamp: Timestamp,
    ) -> Result<EdgeChange> {
        let (v, t) = (self.check_vertex(from)?, self.check_etype(etype)?);
        let d = self.check_vertex(to)?;
        let _guard = self.vertices.lock(v);
        let head = self.vertices.chain_head(v, t);
        let mut hole: Option<(BlockId, usize)> = None;
        let mut extendable: Option<BlockId> = None;
        let mut handle = head;
        while handle != NO_BLOCK {
            let (updated, block_hole, can_extend, next) =
                self.pool.with_block_mut(handle, |block| match block.find(to) {
                    Some(k) => {
                        block.update(k, update, timestamp);
                        (true, None, false, NO_BLOCK)
                    }
                    None => (false, block.hole(), block.can_extend(), block.next()),
                });
            if updated {
                return Ok(EdgeChange::Updated);
            }
            if hole.is_none() {
                hole = block_hole.map(|k| (handle, k));
            }
            if extendable.is_none() && can_extend {
                extendable = Some(handle);
            }
            handle = next;
        }

        let edge = Edge {
            neighbor: to,
            weight: update.initial(),
            time_first: timestamp,
            time_recent: timestamp,
        };
        if let Some((handle, k)) = hole {
            self.pool.with_block_mut(handle, |block| block.claim(k, edge));
        } else if let Some(handle) = extendable {
            self.pool
                .with_block_mut(handle, |block| block.claim(block.high(), edge));
        } else {
            let handle = self.pool.allocate_block(etype, head)?;
            self.pool.with_block_mut(handle, |block| block.claim(0, edge));
            self.vertices.set_chain_head(v, t, handle);
        }
        self.vertices.add_out_degree(v, t, 1);
        self.vertices.add_in_degree(d, 1);
        self.add_etype_count(t, 1);
        Ok(EdgeChange::Inserted)
    }

    /// Bulk-loads `csr` as edges of type `etype`, all vertices in parallel.
    ///
    /// Missing timestamp arrays fall back to each other, then to `default_time`;
    /// missing weights load as 1. Repeated neighbors in one row collapse into a
    /// single edge: the last weight wins, `time_first` is the earliest and
    /// `time_recent` the latest. Rows whose chain already holds edges go
    /// through the regular insert path.
    pub fn set_initial_edges(&self, etype: EType, csr: &Csr, default_time: Timestamp) -> Result<()> {
        let t = self.check_etype(etype)?;
        if csr.num_vertices() > self.num_vertices() {
            return Err(Error::VertexOutOfRange {
                vertex: csr.num_vertices() as VId - 1,
                nv: self.num_vertices(),
            });
        }
        if let Some(&bad) = csr.ind().iter().find(|&&d| self.check_vertex(d).is_err()) {
            return Err(Error::VertexOutOfRange {
                vertex: bad,
                nv: self.num_vertices(),
            });
        }
        let time_first = csr.time_first().or_else(|| csr.time_recent());
        let time_recent = csr.time_recent().or_else(|| csr.time_first());
        info!(
            "loading {} initial edges of type {} into {} vertices",
            csr.num_edges(),
            etype,
            csr.num_vertices()
        );
        (0..csr.num_vertices()).into_par_iter().try_for_each(|v| {
            let range = csr.row(v);
            let edges: Vec<Edge> = range
                .map(|i| Edge {
                    neighbor: csr.ind()[i],
                    weight: csr.weight().map_or(1, |w| w[i]),
                    time_first: time_first.map_or(default_time, |ts| ts[i]),
                    time_recent: time_recent.map_or(default_time, |ts| ts[i]),
                })
                .collect();
            self.load_row(v, t, etype, edges)
        })
    }

    fn load_row(&self, v: usize, t: usize, etype: EType, mut edges: Vec<Edge>) -> Result<()> {
        if edges.is_empty() {
            return Ok(());
        }
        let guard = self.vertices.lock(v);
        if self.vertices.chain_head(v, t) != NO_BLOCK {
            drop(guard);
            for e in edges {
                self.upsert(etype, v as VId, e.neighbor, WeightUpdate::Replace(e.weight), e.time_first)?;
                if e.time_recent != e.time_first {
                    self.upsert(etype, v as VId, e.neighbor, WeightUpdate::Replace(e.weight), e.time_recent)?;
                }
            }
            return Ok(());
        }
        edges.sort_by_key(|e| e.neighbor);
        edges.dedup_by(|later, kept| {
            if later.neighbor != kept.neighbor {
                return false;
            }
            kept.weight = later.weight;
            kept.time_first = kept.time_first.min(later.time_first);
            kept.time_recent = kept.time_recent.max(later.time_recent);
            true
        });
        let mut head = NO_BLOCK;
        for chunk in edges.chunks(EDGE_BLOCK_SIZE) {
            let handle = self.pool.allocate_block(etype, head)?;
            self.pool.with_block_mut(handle, |block| {
                for (k, &e) in chunk.iter().enumerate() {
                    block.claim(k, e);
                }
            });
            head = handle;
        }
        self.vertices.set_chain_head(v, t, head);
        self.vertices.add_out_degree(v, t, edges.len() as i64);
        for e in edges.iter() {
            self.vertices.add_in_degree(e.neighbor as usize, 1);
        }
        self.add_etype_count(t, edges.len() as i64);
        Ok(())
    }
}
