/// Sorts `array` ascending by counting occurrences of every value in `[min, max]`.
///
/// Costs `O(n + max - min)`; only worthwhile when the value range is small
/// compared to the array.
pub fn counting_sort(array: &mut [i64]) {
    if array.len() < 2 {
        return;
    }
    let (min, max) = array
        .iter()
        .fold((array[0], array[0]), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    let range = max.wrapping_sub(min) as u64 as usize + 1;
    let mut count = vec![0usize; range];
    for &x in array.iter() {
        count[x.wrapping_sub(min) as u64 as usize] += 1;
    }
    let mut z = 0;
    for (i, &c) in count.iter().enumerate() {
        let value = min.wrapping_add(i as i64);
        for slot in &mut array[z..z + c] {
            *slot = value;
        }
        z += c;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_sort() {
        let mut array = [5, -2, 9, 5, 0, -2, 3];
        counting_sort(&mut array);
        assert_eq!(array, [-2, -2, 0, 3, 5, 5, 9]);
    }

    #[test]
    fn test_counting_sort_trivial() {
        let mut empty: [i64; 0] = [];
        counting_sort(&mut empty);
        let mut one = [42];
        counting_sort(&mut one);
        assert_eq!(one, [42]);
        let mut same = [3, 3, 3];
        counting_sort(&mut same);
        assert_eq!(same, [3, 3, 3]);
    }
}
