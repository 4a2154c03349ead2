use derive_more::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[display(
    fmt = "nv: {} ne: {} etypes: {} blocks: {}/{}",
    num_vertices,
    num_edges,
    num_etypes,
    blocks_in_use,
    pool_capacity
)]
pub struct GraphStats {
    num_vertices: usize,
    num_edges: usize,
    num_etypes: usize,
    blocks_in_use: usize,
    pool_capacity: usize,
}

impl GraphStats {
    pub fn new(
        num_vertices: usize,
        num_edges: usize,
        num_etypes: usize,
        blocks_in_use: usize,
        pool_capacity: usize,
    ) -> Self {
        Self {
            num_vertices,
            num_edges,
            num_etypes,
            blocks_in_use,
            pool_capacity,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn blocks_in_use(&self) -> usize {
        self.blocks_in_use
    }
}
