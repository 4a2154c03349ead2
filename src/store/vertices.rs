use crate::types::{BlockId, NO_BLOCK};
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

struct VertexRecord {
    lock: Mutex<()>,
    in_degree: AtomicI64,
    heads: Box<[AtomicUsize]>,
    out_degrees: Box<[AtomicI64]>,
}

impl VertexRecord {
    fn new(num_etypes: usize) -> Self {
        Self {
            lock: Mutex::new(()),
            in_degree: AtomicI64::new(0),
            heads: (0..num_etypes).map(|_| AtomicUsize::new(NO_BLOCK)).collect(),
            out_degrees: (0..num_etypes).map(|_| AtomicI64::new(0)).collect(),
        }
    }
}

/// Per-vertex chain heads and degree counters.
///
/// Indexing is by dense vertex position and edge-type position; callers
/// validate ids first. Degrees move with atomic adds, so concurrent edits of
/// the same vertex stay consistent.
pub struct VertexDirectory {
    records: Vec<VertexRecord>,
    num_etypes: usize,
}

impl VertexDirectory {
    pub fn new(num_vertices: usize, num_etypes: usize) -> Self {
        Self {
            records: (0..num_vertices).map(|_| VertexRecord::new(num_etypes)).collect(),
            num_etypes,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn num_etypes(&self) -> usize {
        self.num_etypes
    }

    pub fn chain_head(&self, v: usize, t: usize) -> BlockId {
        self.records[v].heads[t].load(Ordering::Acquire)
    }

    /// Only used when prepending a freshly allocated block.
    pub fn set_chain_head(&self, v: usize, t: usize, handle: BlockId) {
        self.records[v].heads[t].store(handle, Ordering::Release);
    }

    pub fn out_degree(&self, v: usize, t: usize) -> usize {
        self.records[v].out_degrees[t].load(Ordering::Relaxed).max(0) as usize
    }

    /// Out-degree summed over every edge type.
    pub fn total_out_degree(&self, v: usize) -> usize {
        (0..self.num_etypes).map(|t| self.out_degree(v, t)).sum()
    }

    pub fn in_degree(&self, v: usize) -> usize {
        self.records[v].in_degree.load(Ordering::Relaxed).max(0) as usize
    }

    pub(crate) fn add_out_degree(&self, v: usize, t: usize, delta: i64) {
        self.records[v].out_degrees[t].fetch_add(delta, Ordering::Relaxed);
    }

    pub(crate) fn add_in_degree(&self, v: usize, delta: i64) {
        self.records[v].in_degree.fetch_add(delta, Ordering::Relaxed);
    }

    /// Serialises chain edits of vertex `v`.
    pub(crate) fn lock(&self, v: usize) -> MutexGuard<'_, ()> {
        self.records[v].lock.lock()
    }
}
