//! Bulk sorting and partitioning kernels over 64-bit integers.
//!
//! These kernels are independent of the live store. They turn unordered edge
//! lists into CSR offsets and bucket batch actions by source vertex.

pub use bucket::bucket_sort_pairs;
pub use counting::counting_sort;
pub use prefix::prefix_sum;
pub use radix::{radix_sort_pairs, DEFAULT_RADIX_BITS};

mod bucket;
mod counting;
mod prefix;
mod radix;

/// Finds `value` in the ascending slice `ary`.
pub fn find_in_sorted(value: i64, ary: &[i64]) -> Option<usize> {
    ary.binary_search(&value).ok()
}

/// Splits `data` into consecutive mutable rows, row `i` covering `bounds[i]..bounds[i + 1]`.
///
/// `bounds` must be non-decreasing, start at 0 and end at `data.len()`.
pub(crate) fn split_rows<'a, T>(mut data: &'a mut [T], bounds: &[i64]) -> Vec<&'a mut [T]> {
    let mut rows = Vec::with_capacity(bounds.len().saturating_sub(1));
    for w in bounds.windows(2) {
        let (row, rest) = std::mem::take(&mut data).split_at_mut((w[1] - w[0]) as usize);
        rows.push(row);
        data = rest;
    }
    rows
}
