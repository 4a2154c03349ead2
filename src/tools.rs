/// Splits a slice into maximal runs of consecutive elements sharing a key.
pub struct GroupBy<'a, T, F, K>
where
    T: 'a,
    F: FnMut(&T) -> K,
    K: PartialEq,
{
    slice: &'a [T],
    key: F,
}

impl<'a, T, F, K> GroupBy<'a, T, F, K>
where
    T: 'a,
    F: FnMut(&T) -> K,
    K: PartialEq,
{
    pub fn new(slice: &'a [T], key: F) -> Self {
        GroupBy { slice, key }
    }
}

impl<'a, T, F, K> Iterator for GroupBy<'a, T, F, K>
where
    T: 'a,
    F: FnMut(&T) -> K,
    K: PartialEq,
{
    type Item = (K, &'a [T]);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (first, rest) = self.slice.split_first()?;
        let key = (self.key)(first);
        let len = 1 + rest.iter().take_while(|x| (self.key)(*x) == key).count();
        let (head, tail) = self.slice.split_at(len);
        self.slice = tail;
        Some((key, head))
    }
}
