//! Error management.

use crate::types::{EType, VId};
use derive_more::Display;

#[derive(Debug, Display)]
pub enum Error {
    #[display(fmt = "i/o error: {}", _0)]
    Io(std::io::Error),
    #[display(fmt = "corrupt snapshot: {}", _0)]
    CorruptSnapshot(String),
    #[display(fmt = "file holds {} words, header implies {}", actual, expected)]
    SizeMismatch { expected: usize, actual: usize },
    #[display(fmt = "edge pool exhausted: block {} requested, limit is {}", requested, limit)]
    AllocationFailure { requested: usize, limit: usize },
    #[display(
        fmt = "vertex {} gathered {} edges but its degree was {}",
        vertex,
        actual,
        expected
    )]
    ConsistencyViolation {
        vertex: VId,
        expected: usize,
        actual: usize,
    },
    #[display(fmt = "edge pool growth could not obtain exclusive access")]
    ConcurrentGrowthConflict,
    #[display(fmt = "vertex {} out of range for {} vertices", vertex, nv)]
    VertexOutOfRange { vertex: VId, nv: usize },
    #[display(fmt = "edge type {} out of range for {} types", etype, num_etypes)]
    EdgeTypeOutOfRange { etype: EType, num_etypes: usize },
    #[display(fmt = "batch session already closed")]
    SessionClosed,
    #[display(fmt = "invalid edge list: {}", _0)]
    InvalidEdgeList(String),
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
