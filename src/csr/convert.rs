use super::Csr;
use crate::{
    config::GraphConfig,
    error::{Error, Result},
    sort::{prefix_sum, radix_sort_pairs, split_rows, DEFAULT_RADIX_BITS},
    store::Graph,
    types::{Timestamp, VId, Weight},
};
use log::info;
use rayon::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};

/// A raw multigraph edge list; edge `i` is `sources[i] -> destinations[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeList {
    pub sources: Vec<VId>,
    pub destinations: Vec<VId>,
    pub weights: Option<Vec<Weight>>,
    pub time_first: Option<Vec<Timestamp>>,
    pub time_recent: Option<Vec<Timestamp>>,
}

impl EdgeList {
    pub fn new(sources: Vec<VId>, destinations: Vec<VId>) -> Self {
        Self {
            sources,
            destinations,
            ..Self::default()
        }
    }

    pub fn with_weights(mut self, weights: Vec<Weight>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_timestamps(mut self, time_first: Option<Vec<Timestamp>>, time_recent: Option<Vec<Timestamp>>) -> Self {
        self.time_first = time_first;
        self.time_recent = time_recent;
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Every column has one entry per edge and every endpoint lies in `0..nv`.
    pub fn validate(&self, nv: usize) -> Result<()> {
        let ne = self.len();
        let columns = [
            ("destinations", Some(&self.destinations)),
            ("weights", self.weights.as_ref()),
            ("time_first", self.time_first.as_ref()),
            ("time_recent", self.time_recent.as_ref()),
        ];
        for (name, column) in columns.iter() {
            if let Some(column) = column {
                if column.len() != ne {
                    return Err(Error::InvalidEdgeList(format!(
                        "{} holds {} entries for {} sources",
                        name,
                        column.len(),
                        ne
                    )));
                }
            }
        }
        if let Some(&v) = self
            .sources
            .par_iter()
            .chain(self.destinations.par_iter())
            .find_any(|&&v| v < 0 || v as u64 >= nv as u64)
        {
            return Err(Error::VertexOutOfRange { vertex: v, nv });
        }
        Ok(())
    }
}

/// Builds a CSR of `nv` vertices from an edge list, keeping duplicates.
///
/// Degrees come from a parallel atomic histogram and offsets from a prefix
/// sum. Edges are placed by radix sorting `(source, index)` pairs, so each
/// row keeps the edges in their list order.
pub fn edge_list_to_csr(nv: usize, list: &EdgeList) -> Result<Csr> {
    list.validate(nv)?;
    let ne = list.len();
    info!("building csr of {} vertices from {} edges...", nv, ne);

    let degrees: Vec<AtomicI64> = (0..nv).map(|_| AtomicI64::new(0)).collect();
    list.sources.par_iter().for_each(|&s| {
        degrees[s as usize].fetch_add(1, Ordering::Relaxed);
    });
    let mut off = Vec::with_capacity(nv + 1);
    off.push(0);
    off.extend(degrees.into_iter().map(AtomicI64::into_inner));
    prefix_sum(&mut off[1..]);

    let mut keys: Vec<(i64, i64)> = list
        .sources
        .par_iter()
        .enumerate()
        .map(|(i, &s)| (s, i as i64))
        .collect();
    radix_sort_pairs(&mut keys, DEFAULT_RADIX_BITS);
    let gather = |column: &[i64]| -> Vec<i64> { keys.par_iter().map(|&(_, i)| column[i as usize]).collect() };

    let ind = gather(&list.destinations);
    let weight = list.weights.as_deref().map(gather);
    let time_first = list.time_first.as_deref().map(gather);
    let time_recent = list.time_recent.as_deref().map(gather);
    Ok(Csr::from_columns(off, ind, weight, time_first, time_recent, None, false))
}

impl Csr {
    /// Expands the rows back into an edge list.
    pub fn to_edge_list(&self) -> EdgeList {
        let mut sources = vec![0; self.num_edges()];
        split_rows(&mut sources, self.off())
            .into_par_iter()
            .enumerate()
            .for_each(|(v, row)| row.iter_mut().for_each(|s| *s = v as VId));
        EdgeList {
            sources,
            destinations: self.ind().to_vec(),
            weights: self.weight().map(<[_]>::to_vec),
            time_first: self.time_first().map(<[_]>::to_vec),
            time_recent: self.time_recent().map(<[_]>::to_vec),
        }
    }
}

/// Loads an edge list into a fresh graph as edges of type 0.
///
/// A missing timestamp array falls back to the other one, then to `default_time`.
pub fn edge_list_to_graph(config: GraphConfig, list: &EdgeList, default_time: Timestamp) -> Result<Graph> {
    let csr = edge_list_to_csr(config.get_num_vertices(), list)?;
    csr.to_graph(config, 0, default_time)
}
