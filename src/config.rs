//! Graph construction parameters.

use crate::types::DEFAULT_NUM_ETYPES;
use std::time::Duration;

const MIN_INITIAL_BLOCKS: usize = 1024;

/// Sizing and limits of a [`Graph`](crate::store::Graph).
///
/// ```
/// use tempograph::GraphConfig;
///
/// let config = GraphConfig::new(100).num_etypes(2).max_blocks(4096);
/// assert_eq!(config.get_num_vertices(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct GraphConfig {
    num_vertices: usize,
    num_etypes: usize,
    initial_blocks: Option<usize>,
    max_blocks: usize,
    growth_timeout: Duration,
}

impl GraphConfig {
    pub fn new(num_vertices: usize) -> Self {
        Self {
            num_vertices,
            num_etypes: DEFAULT_NUM_ETYPES,
            initial_blocks: None,
            max_blocks: usize::MAX,
            growth_timeout: Duration::from_secs(5),
        }
    }

    pub fn num_etypes(mut self, num_etypes: usize) -> Self {
        self.num_etypes = num_etypes.max(1);
        self
    }

    /// Number of blocks the pool is created with, the sentinel included.
    pub fn initial_blocks(mut self, initial_blocks: usize) -> Self {
        self.initial_blocks = Some(initial_blocks.max(2));
        self
    }

    /// Upper bound on pool size; allocations beyond it fail with `AllocationFailure`.
    pub fn max_blocks(mut self, max_blocks: usize) -> Self {
        self.max_blocks = max_blocks.max(2);
        self
    }

    /// How long pool growth waits for its exclusive window.
    pub fn growth_timeout(mut self, growth_timeout: Duration) -> Self {
        self.growth_timeout = growth_timeout;
        self
    }

    pub fn get_num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn get_num_etypes(&self) -> usize {
        self.num_etypes
    }

    pub fn get_initial_blocks(&self) -> usize {
        self.initial_blocks
            .unwrap_or_else(|| self.num_vertices.max(MIN_INITIAL_BLOCKS))
            .min(self.max_blocks)
    }

    pub fn get_max_blocks(&self) -> usize {
        self.max_blocks
    }

    pub fn get_growth_timeout(&self) -> Duration {
        self.growth_timeout
    }
}
