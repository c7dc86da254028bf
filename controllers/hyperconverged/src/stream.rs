//! Lazy sequence combinators used by the operand builders.
//!
//! Thin wrappers over iterator adaptors, named for the shapes they take:
//! plain sequences and key/value pair sequences. They keep the operand code
//! declarative without collecting intermediate vectors.

/// Elements of `seq` matching the predicate.
pub fn filter<T>(
    seq: impl IntoIterator<Item = T>,
    pred: impl Fn(&T) -> bool,
) -> impl Iterator<Item = T> {
    seq.into_iter().filter(move |t| pred(t))
}

/// `seq` mapped element-wise.
pub fn map_one<T, U>(
    seq: impl IntoIterator<Item = T>,
    f: impl Fn(T) -> U,
) -> impl Iterator<Item = U> {
    seq.into_iter().map(f)
}

/// A pair sequence collapsed to a plain one.
pub fn map_pairs<K, V, U>(
    seq: impl IntoIterator<Item = (K, V)>,
    f: impl Fn(K, V) -> U,
) -> impl Iterator<Item = U> {
    seq.into_iter().map(move |(k, v)| f(k, v))
}

/// A pair sequence mapped to another pair sequence.
pub fn remap_pairs<K, V, K2, V2>(
    seq: impl IntoIterator<Item = (K, V)>,
    f: impl Fn(K, V) -> (K2, V2),
) -> impl Iterator<Item = (K2, V2)> {
    seq.into_iter().map(move |(k, v)| f(k, v))
}

/// The values of a pair sequence.
pub fn pair_values<K, V>(seq: impl IntoIterator<Item = (K, V)>) -> impl Iterator<Item = V> {
    seq.into_iter().map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn filter_keeps_matching_elements() {
        let evens: Vec<i32> = filter(vec![1, 2, 3, 4, 5], |n| n % 2 == 0).collect();
        assert_eq!(evens, vec![2, 4]);
    }

    #[test]
    fn map_one_is_lazy() {
        let mut calls = 0;
        let seq = map_one(vec![1, 2, 3], |n| n * 2);
        // Nothing evaluated until consumed.
        for v in seq {
            calls += 1;
            assert_eq!(v % 2, 0);
        }
        assert_eq!(calls, 3);
    }

    #[test]
    fn pair_combinators_cover_map_shapes() {
        let gates = BTreeMap::from([("a", true), ("b", false), ("c", true)]);

        let enabled: Vec<&str> =
            map_pairs(filter(gates.clone(), |(_, on)| *on), |name, _| name).collect();
        assert_eq!(enabled, vec!["a", "c"]);

        let inverted: BTreeMap<&str, bool> =
            remap_pairs(gates.clone(), |name, on| (name, !on)).collect();
        assert_eq!(inverted[&"b"], true);

        let values: Vec<bool> = pair_values(gates).collect();
        assert_eq!(values, vec![true, false, true]);
    }
}
