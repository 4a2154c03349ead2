use rayon::prelude::*;

/// Digit width used when callers have no better estimate.
pub const DEFAULT_RADIX_BITS: u32 = 8;

type Shifted = (u64, u64);

/// Sorts pairs ascending by `(first, second)` with two LSD radix passes.
///
/// Both elements are shifted into the non-negative range. The first pass
/// orders everything by the second element; the second pass orders that
/// result by the first element. Every digit pass is a stable counting scatter,
/// so the composition is a full lexicographic order.
///
/// # Panics
///
/// Panics if `num_bits` is not in `1..=16`.
pub fn radix_sort_pairs(pairs: &mut [(i64, i64)], num_bits: u32) {
    assert!(
        (1..=16).contains(&num_bits),
        "radix digit width must be 1..=16 bits, got {}",
        num_bits
    );
    if pairs.len() < 2 {
        return;
    }
    let (min_first, min_second) = pairs
        .par_iter()
        .cloned()
        .reduce(|| (i64::MAX, i64::MAX), |a, b| (a.0.min(b.0), a.1.min(b.1)));
    let mut cur: Vec<Shifted> = pairs
        .par_iter()
        .map(|&(a, b)| {
            (
                a.wrapping_sub(min_first) as u64,
                b.wrapping_sub(min_second) as u64,
            )
        })
        .collect();
    let mut scratch = vec![(0, 0); cur.len()];
    stable_radix_by(&mut cur, &mut scratch, num_bits, |p| p.1);
    stable_radix_by(&mut cur, &mut scratch, num_bits, |p| p.0);
    pairs
        .par_iter_mut()
        .zip(cur.par_iter())
        .for_each(|(pair, &(a, b))| {
            *pair = (
                (a as i64).wrapping_add(min_first),
                (b as i64).wrapping_add(min_second),
            );
        });
}

/// Stable LSD radix sort of `cur` by `key`, one counting scatter per digit.
fn stable_radix_by<F>(cur: &mut Vec<Shifted>, scratch: &mut Vec<Shifted>, num_bits: u32, key: F)
where
    F: Fn(&Shifted) -> u64 + Sync,
{
    let num_buckets = 1usize << num_bits;
    let mask = (num_buckets - 1) as u64;
    let mut rest = cur.par_iter().map(&key).max().unwrap_or(0);
    let mut shift = 0;
    while rest != 0 {
        let digit = |p: &Shifted| ((key(p) >> shift) & mask) as usize;
        let histogram = cur
            .par_iter()
            .fold(
                || vec![0usize; num_buckets],
                |mut h, p| {
                    h[digit(p)] += 1;
                    h
                },
            )
            .reduce(
                || vec![0usize; num_buckets],
                |mut a, b| {
                    a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                    a
                },
            );
        let mut cursor = 0;
        let mut starts = histogram;
        for start in starts.iter_mut() {
            let count = *start;
            *start = cursor;
            cursor += count;
        }
        for p in cur.iter() {
            let d = digit(p);
            scratch[starts[d]] = *p;
            starts[d] += 1;
        }
        std::mem::swap(cur, scratch);
        shift += num_bits;
        rest >>= num_bits;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radix_sort_pairs() {
        let mut pairs = [(3, 9), (1, 5), (3, 2)];
        radix_sort_pairs(&mut pairs, DEFAULT_RADIX_BITS);
        assert_eq!(pairs, [(1, 5), (3, 2), (3, 9)]);
    }

    #[test]
    fn test_radix_sort_pairs_negative() {
        let mut pairs = vec![(-1, 4), (2, -9), (-1, -4), (-7, 0), (2, -9), (i64::MIN, 1)];
        let mut expected = pairs.clone();
        expected.sort();
        radix_sort_pairs(&mut pairs, 4);
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_radix_sort_pairs_all_digit_widths() {
        let input: Vec<(i64, i64)> = (0..3000)
            .map(|i| ((i * 7919) % 251 - 100, (i * 104_729) % 65_537))
            .collect();
        let mut expected = input.clone();
        expected.sort();
        for bits in [1, 3, 8, 11, 16].iter() {
            let mut pairs = input.clone();
            radix_sort_pairs(&mut pairs, *bits);
            assert_eq!(pairs, expected, "digit width {}", bits);
        }
    }

    #[test]
    #[should_panic]
    fn test_radix_sort_pairs_rejects_zero_bits() {
        radix_sort_pairs(&mut [(1, 1), (0, 0)], 0);
    }
}
