use super::{prefix::prefix_sum, split_rows};
use log::debug;
use rayon::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};

/// Sorts `(key, payload)` pairs ascending, first by key, then by payload.
///
/// Pairs are scattered into one contiguous bucket per key value. Bucket bounds
/// come from a histogram and a prefix sum; every pair claims its destination
/// slot with an atomic increment of its bucket cursor, so the scatter runs in
/// parallel. Each bucket is then sorted by payload.
///
/// Hot-spotting on popular keys limits scaling; prefer
/// [`radix_sort_pairs`](super::radix_sort_pairs) at high concurrency.
pub fn bucket_sort_pairs(pairs: &mut [(i64, i64)]) {
    if pairs.len() < 2 {
        return;
    }
    let (min, max) = pairs
        .par_iter()
        .map(|&(k, _)| (k, k))
        .reduce(|| (i64::MAX, i64::MIN), |a, b| (a.0.min(b.0), a.1.max(b.1)));
    let bucket_of = |k: i64| k.wrapping_sub(min) as u64 as usize;
    let range = bucket_of(max) + 1;
    debug!("bucket sort: {} pairs over {} buckets", pairs.len(), range);

    let counts: Vec<AtomicI64> = (0..range).map(|_| AtomicI64::new(0)).collect();
    pairs.par_iter().for_each(|&(k, _)| {
        counts[bucket_of(k)].fetch_add(1, Ordering::Relaxed);
    });
    let mut bounds = Vec::with_capacity(range + 1);
    bounds.push(0);
    bounds.extend(counts.into_iter().map(AtomicI64::into_inner));
    let total = prefix_sum(&mut bounds[1..]);
    assert_eq!(total as usize, pairs.len(), "bucket histogram lost pairs");

    let cursors: Vec<AtomicI64> = bounds[..range].iter().map(|&b| AtomicI64::new(b)).collect();
    let keys: Vec<AtomicI64> = (0..pairs.len()).map(|_| AtomicI64::new(0)).collect();
    let payloads: Vec<AtomicI64> = (0..pairs.len()).map(|_| AtomicI64::new(0)).collect();
    pairs.par_iter().for_each(|&(k, p)| {
        let index = cursors[bucket_of(k)].fetch_add(1, Ordering::Relaxed) as usize;
        keys[index].store(k, Ordering::Relaxed);
        payloads[index].store(p, Ordering::Relaxed);
    });
    pairs.par_iter_mut().enumerate().for_each(|(i, pair)| {
        *pair = (
            keys[i].load(Ordering::Relaxed),
            payloads[i].load(Ordering::Relaxed),
        );
    });

    split_rows(pairs, &bounds)
        .into_par_iter()
        .filter(|bucket| bucket.len() > 1)
        .for_each(|bucket| bucket.sort_unstable_by_key(|&(_, p)| p));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_sort_pairs() {
        let mut pairs = [(3, 9), (1, 5), (3, 2)];
        bucket_sort_pairs(&mut pairs);
        assert_eq!(pairs, [(1, 5), (3, 2), (3, 9)]);
    }

    #[test]
    fn test_bucket_sort_pairs_negative_and_duplicates() {
        let mut pairs = vec![(0, 0), (-4, 7), (2, -1), (-4, -7), (2, -1), (0, 3)];
        let mut expected = pairs.clone();
        expected.sort();
        bucket_sort_pairs(&mut pairs);
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_bucket_sort_pairs_large() {
        let mut pairs: Vec<(i64, i64)> = (0..5000).map(|i| ((i * 7919) % 97, (i * 31) % 1013)).collect();
        let mut expected = pairs.clone();
        expected.sort();
        bucket_sort_pairs(&mut pairs);
        assert_eq!(pairs, expected);
    }
}
