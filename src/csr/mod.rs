//! Compressed sparse row snapshots of the store, and conversions between
//! CSRs, raw edge lists and live graphs.

pub use convert::{edge_list_to_csr, edge_list_to_graph, EdgeList};

mod convert;
mod extract;

use crate::{
    config::GraphConfig,
    error::{Error, Result},
    sort::find_in_sorted,
    store::Graph,
    types::{EType, Timestamp, VId, Weight},
};
use itertools::Itertools;
use std::ops::Range;

/// Optional per-edge arrays a CSR extraction fills in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CsrFields {
    pub weight: bool,
    pub time_first: bool,
    pub time_recent: bool,
    pub etype: bool,
}

impl CsrFields {
    /// Neighbors only.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            weight: true,
            time_first: true,
            time_recent: true,
            etype: true,
        }
    }

    pub fn weights() -> Self {
        Self {
            weight: true,
            ..Self::default()
        }
    }
}

/// A compressed sparse row adjacency.
///
/// Row `v` spans `off[v]..off[v + 1]` of `ind` and of every optional array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Csr {
    off: Vec<i64>,
    ind: Vec<VId>,
    weight: Option<Vec<Weight>>,
    time_first: Option<Vec<Timestamp>>,
    time_recent: Option<Vec<Timestamp>>,
    etype: Option<Vec<EType>>,
    sorted: bool,
}

impl Csr {
    /// Checks and wraps raw arrays.
    pub fn from_parts(off: Vec<i64>, ind: Vec<VId>, weight: Option<Vec<Weight>>) -> Result<Self> {
        let csr = Self {
            off,
            ind,
            weight,
            time_first: None,
            time_recent: None,
            etype: None,
            sorted: false,
        };
        csr.validate()?;
        Ok(csr)
    }

    /// Attaches per-edge timestamps.
    pub fn with_timestamps(
        mut self,
        time_first: Option<Vec<Timestamp>>,
        time_recent: Option<Vec<Timestamp>>,
    ) -> Result<Self> {
        self.time_first = time_first;
        self.time_recent = time_recent;
        self.validate()?;
        Ok(self)
    }

    pub(crate) fn from_columns(
        off: Vec<i64>,
        ind: Vec<VId>,
        weight: Option<Vec<Weight>>,
        time_first: Option<Vec<Timestamp>>,
        time_recent: Option<Vec<Timestamp>>,
        etype: Option<Vec<EType>>,
        sorted: bool,
    ) -> Self {
        Self {
            off,
            ind,
            weight,
            time_first,
            time_recent,
            etype,
            sorted,
        }
    }

    /// Offsets start at 0, never decrease, end at the edge count; every
    /// optional array is as long as `ind`.
    pub fn validate(&self) -> Result<()> {
        match (self.off.first(), self.off.last()) {
            (Some(0), Some(&last)) if last as usize == self.ind.len() => (),
            (None, _) => return Err(Error::InvalidEdgeList("empty offset array".into())),
            _ => {
                return Err(Error::InvalidEdgeList(format!(
                    "offsets must run from 0 to {}",
                    self.ind.len()
                )))
            }
        }
        if let Some((v, _)) = self
            .off
            .iter()
            .tuple_windows()
            .find_position(|(a, b)| a > b)
        {
            return Err(Error::InvalidEdgeList(format!(
                "offsets decrease at vertex {}",
                v
            )));
        }
        let columns = [
            ("weight", self.weight.as_ref()),
            ("time_first", self.time_first.as_ref()),
            ("time_recent", self.time_recent.as_ref()),
            ("etype", self.etype.as_ref()),
        ];
        for (name, column) in columns.iter() {
            if let Some(column) = column {
                if column.len() != self.ind.len() {
                    return Err(Error::InvalidEdgeList(format!(
                        "{} holds {} entries for {} edges",
                        name,
                        column.len(),
                        self.ind.len()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn num_vertices(&self) -> usize {
        self.off.len() - 1
    }

    pub fn num_edges(&self) -> usize {
        self.ind.len()
    }

    /// Whether every row is ascending by neighbor.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn off(&self) -> &[i64] {
        &self.off
    }

    pub fn ind(&self) -> &[VId] {
        &self.ind
    }

    pub fn weight(&self) -> Option<&[Weight]> {
        self.weight.as_deref()
    }

    pub fn time_first(&self) -> Option<&[Timestamp]> {
        self.time_first.as_deref()
    }

    pub fn time_recent(&self) -> Option<&[Timestamp]> {
        self.time_recent.as_deref()
    }

    pub fn etype(&self) -> Option<&[EType]> {
        self.etype.as_deref()
    }

    /// Positions of row `v`.
    pub fn row(&self, v: usize) -> Range<usize> {
        self.off[v] as usize..self.off[v + 1] as usize
    }

    pub fn degree(&self, v: usize) -> usize {
        self.row(v).len()
    }

    pub fn neighbors(&self, v: usize) -> &[VId] {
        &self.ind[self.row(v)]
    }

    /// Position of the edge `v -> d`, binary searched in sorted CSRs.
    pub fn find_edge(&self, v: usize, d: VId) -> Option<usize> {
        let row = self.neighbors(v);
        let k = if self.sorted {
            find_in_sorted(d, row)
        } else {
            row.iter().position(|&n| n == d)
        };
        k.map(|k| self.off[v] as usize + k)
    }

    pub fn has_edge(&self, v: usize, d: VId) -> bool {
        self.find_edge(v, d).is_some()
    }

    /// Bulk loads the CSR into a fresh graph as edges of type `etype`.
    pub fn to_graph(&self, config: GraphConfig, etype: EType, default_time: Timestamp) -> Result<Graph> {
        let graph = Graph::new(config);
        graph.set_initial_edges(etype, self, default_time)?;
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Csr {
        Csr::from_parts(vec![0, 2, 2, 5], vec![4, 1, 0, 2, 1], Some(vec![1, 2, 3, 4, 5])).unwrap()
    }

    #[test]
    fn test_accessors() {
        let csr = sample();
        assert_eq!((csr.num_vertices(), csr.num_edges()), (3, 5));
        assert_eq!(csr.degree(1), 0);
        assert_eq!(csr.neighbors(2), &[0, 2, 1]);
        assert_eq!(csr.find_edge(2, 1), Some(4));
        assert!(!csr.has_edge(0, 2));
        assert!(!csr.is_sorted());
    }

    #[test]
    fn test_validate() {
        assert!(Csr::from_parts(vec![0], vec![], None).is_ok());
        assert!(Csr::from_parts(vec![], vec![], None).is_err());
        assert!(Csr::from_parts(vec![1, 1], vec![0], None).is_err());
        assert!(Csr::from_parts(vec![0, 2, 1], vec![0], None).is_err());
        assert!(Csr::from_parts(vec![0, 1], vec![0], Some(vec![])).is_err());
        assert!(sample().with_timestamps(Some(vec![0; 5]), Some(vec![0; 4])).is_err());
    }

    #[test]
    fn test_to_graph() {
        let graph = sample().to_graph(GraphConfig::new(5).num_etypes(2), 1, 3).unwrap();
        assert_eq!(graph.total_edges(), 5);
        assert_eq!(graph.edges_of_type(1).unwrap(), 5);
        let edge = graph.edge(1, 2, 2).unwrap().unwrap();
        assert_eq!((edge.weight, edge.time_first, edge.time_recent), (4, 3, 3));
    }
}
