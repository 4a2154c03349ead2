//! In-memory temporal multigraph store for streaming graph analytics.
//!
//! Edges live in chains of fixed-size blocks drawn from a shared pool, one
//! chain per (vertex, edge type). Batches of insertions and deletions are
//! applied in parallel across source vertices, and the live store can be
//! extracted into a CSR at any quiescent point.

pub mod batch;
pub mod config;
pub mod csr;
pub mod error;
pub mod snapshot;
pub mod sort;
pub mod store;
pub mod types;

pub(crate) mod tools;

pub use batch::{Batch, BatchAck, BatchAction, BatchSession};
pub use config::GraphConfig;
pub use csr::{Csr, CsrFields, EdgeList};
pub use error::{Error, Result};
pub use store::{Edge, EdgeChange, Graph, GraphStats};
