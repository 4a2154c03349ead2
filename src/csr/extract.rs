use super::{Csr, CsrFields};
use crate::{
    error::{Error, Result},
    sort::{prefix_sum, split_rows},
    store::{BlockAllocator, Graph, PoolView},
    types::{EType, Timestamp, VId, Weight, NO_BLOCK},
};
use log::info;
use rayon::prelude::*;

/// The slices of one CSR row being filled.
struct RowMut<'a> {
    ind: &'a mut [VId],
    weight: Option<&'a mut [Weight]>,
    time_first: Option<&'a mut [Timestamp]>,
    time_recent: Option<&'a mut [Timestamp]>,
    etype: Option<&'a mut [EType]>,
}

impl<'a> RowMut<'a> {
    /// Reorders every column of the row so that `ind` ascends; ties keep
    /// their gather order.
    fn sort(&mut self, perm: &mut Vec<usize>, scratch: &mut Vec<i64>) {
        let d = self.ind.len();
        if d < 2 {
            return;
        }
        perm.clear();
        perm.extend(0..d);
        let ind = &*self.ind;
        perm.sort_unstable_by_key(|&i| (ind[i], i));
        permute(self.ind, perm, scratch);
        for column in [
            self.weight.as_deref_mut(),
            self.time_first.as_deref_mut(),
            self.time_recent.as_deref_mut(),
            self.etype.as_deref_mut(),
        ]
        .iter_mut()
        .flatten()
        {
            permute(column, perm, scratch);
        }
    }
}

fn permute(column: &mut [i64], perm: &[usize], scratch: &mut Vec<i64>) {
    scratch.clear();
    scratch.extend(perm.iter().map(|&i| column[i]));
    column.copy_from_slice(scratch);
}

impl<A: BlockAllocator> Graph<A> {
    /// Extracts every live edge into a CSR, rows in chain order.
    ///
    /// The store must be quiescent: a vertex whose gathered edge count differs
    /// from its degree yields `ConsistencyViolation`.
    pub fn to_unsorted_csr(&self, fields: CsrFields) -> Result<Csr> {
        self.extract_csr(fields, false)
    }

    /// Like [`to_unsorted_csr`](Self::to_unsorted_csr), with every row sorted by neighbor.
    pub fn to_sorted_csr(&self, fields: CsrFields) -> Result<Csr> {
        self.extract_csr(fields, true)
    }

    fn extract_csr(&self, fields: CsrFields, sorted: bool) -> Result<Csr> {
        let nv = self.num_vertices();
        info!("extracting {} csr of {} vertices...", if sorted { "sorted" } else { "unsorted" }, nv);
        let mut off = vec![0; nv + 1];
        off[1..]
            .par_iter_mut()
            .enumerate()
            .for_each(|(v, d)| *d = self.vertices().total_out_degree(v) as i64);
        let ne = prefix_sum(&mut off[1..]) as usize;

        let column = |wanted: bool| if wanted { Some(vec![0; ne]) } else { None };
        let mut ind = vec![0; ne];
        let mut weight = column(fields.weight);
        let mut time_first = column(fields.time_first);
        let mut time_recent = column(fields.time_recent);
        let mut etype = column(fields.etype);

        {
            let mut weight_rows = weight.as_deref_mut().map(|c| split_rows(c, &off).into_iter());
            let mut time_first_rows = time_first.as_deref_mut().map(|c| split_rows(c, &off).into_iter());
            let mut time_recent_rows = time_recent.as_deref_mut().map(|c| split_rows(c, &off).into_iter());
            let mut etype_rows = etype.as_deref_mut().map(|c| split_rows(c, &off).into_iter());
            let rows: Vec<RowMut> = split_rows(&mut ind, &off)
                .into_iter()
                .map(|ind| RowMut {
                    ind,
                    weight: weight_rows.as_mut().and_then(Iterator::next),
                    time_first: time_first_rows.as_mut().and_then(Iterator::next),
                    time_recent: time_recent_rows.as_mut().and_then(Iterator::next),
                    etype: etype_rows.as_mut().and_then(Iterator::next),
                })
                .collect();

            let view = self.pool().view();
            rows.into_par_iter().enumerate().try_for_each_init(
                || (Vec::new(), Vec::new()),
                |(perm, scratch), (v, mut row)| {
                    self.gather_row(&view, v, &mut row)?;
                    if sorted {
                        row.sort(perm, scratch);
                    }
                    Ok::<(), Error>(())
                },
            )?;
        }

        Ok(Csr::from_columns(
            off,
            ind,
            weight,
            time_first,
            time_recent,
            etype,
            sorted,
        ))
    }

    fn gather_row(&self, view: &PoolView<'_>, v: usize, row: &mut RowMut<'_>) -> Result<()> {
        let expected = row.ind.len();
        let mut count = 0;
        for t in 0..self.num_etypes() {
            let mut handle = self.vertices().chain_head(v, t);
            while handle != NO_BLOCK {
                let block = view.block(handle);
                for (_, edge) in block.live_edges() {
                    if count < expected {
                        row.ind[count] = edge.neighbor;
                        if let Some(w) = row.weight.as_deref_mut() {
                            w[count] = edge.weight;
                        }
                        if let Some(ts) = row.time_first.as_deref_mut() {
                            ts[count] = edge.time_first;
                        }
                        if let Some(ts) = row.time_recent.as_deref_mut() {
                            ts[count] = edge.time_recent;
                        }
                        if let Some(et) = row.etype.as_deref_mut() {
                            et[count] = t as EType;
                        }
                    }
                    count += 1;
                }
                handle = block.next();
            }
        }
        if count != expected {
            return Err(Error::ConsistencyViolation {
                vertex: v as VId,
                expected,
                actual: count,
            });
        }
        Ok(())
    }
}
