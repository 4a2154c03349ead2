//! Various types shared by the store, the sort kernels and the CSR builders.

/// The vertex id type.
///
/// Vertex ids are dense: a graph with `nv` vertices owns ids `0..nv`.
pub type VId = i64;

/// The edge type tag.
pub type EType = i64;

/// The edge weight type.
pub type Weight = i64;

/// The timestamp type.
pub type Timestamp = i64;

/// Handle of an edge block inside the edge pool.
pub type BlockId = usize;

/// Number of edge slots in one edge block.
pub const EDGE_BLOCK_SIZE: usize = 14;

/// The sentinel handle terminating every chain. Slot 0 of the pool is never handed out.
pub const NO_BLOCK: BlockId = 0;

/// Default number of edge types a graph is configured with.
pub const DEFAULT_NUM_ETYPES: usize = 5;

/// Marker word opening snapshot and action-stream files, used to detect byte order.
pub const ENDIAN_MARKER: i64 = 0x1234_ABCD;
