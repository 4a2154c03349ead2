use rayon::prelude::*;

/// Parallel inclusive prefix sum, in place. Returns the grand total.
///
/// The array is cut into one contiguous slice per worker. Every worker sums its
/// slice, the slice totals are exclusive-prefix-summed by a single writer, and
/// each worker then scans its slice starting from that offset.
///
/// ```
/// use tempograph::sort::prefix_sum;
///
/// let mut ary = [4, 1, 2, 5];
/// assert_eq!(prefix_sum(&mut ary), 12);
/// assert_eq!(ary, [4, 5, 7, 12]);
/// ```
pub fn prefix_sum(ary: &mut [i64]) -> i64 {
    match ary.len() {
        0 => return 0,
        1 => return ary[0],
        _ => (),
    }
    let num_slices = rayon::current_num_threads().max(1);
    let slice_len = (ary.len() + num_slices - 1) / num_slices;
    let mut offsets: Vec<i64> = ary
        .par_chunks(slice_len)
        .map(|slice| slice.iter().sum())
        .collect();
    let mut carry = 0;
    for offset in offsets.iter_mut() {
        let total = *offset;
        *offset = carry;
        carry += total;
    }
    ary.par_chunks_mut(slice_len)
        .zip(offsets.par_iter())
        .for_each(|(slice, &offset)| {
            let mut acc = offset;
            for x in slice.iter_mut() {
                acc += *x;
                *x = acc;
            }
        });
    ary[ary.len() - 1]
}
