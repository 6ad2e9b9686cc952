//! Collectors that build containers and scalars.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Add;

use super::Collector;
use crate::core::{Error, Result};

/// Collect into a `Vec` in encounter order.
pub fn to_list<T: 'static>() -> Collector<T, Vec<T>, Vec<T>> {
    Collector::of(Vec::new, Vec::push, |mut left, right| {
        left.extend(right);
        left
    })
}

/// Collect into a `HashSet`.
pub fn to_set<T: Eq + Hash + 'static>() -> Collector<T, HashSet<T>, HashSet<T>> {
    Collector::of(
        HashSet::new,
        |set: &mut HashSet<T>, item| {
            set.insert(item);
        },
        |mut left, right| {
            left.extend(right);
            left
        },
    )
}

/// Collect into any container that can be created empty and extended.
///
/// ```rust
/// use std::collections::BTreeSet;
/// use lazyweld::collectors;
///
/// let set = collectors::to_collection::<_, BTreeSet<_>>()
///     .collect_iter(["you", "I", "love", "I"])
///     .unwrap();
/// assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["I", "love", "you"]);
/// ```
pub fn to_collection<T, C>() -> Collector<T, C, C>
where
    T: 'static,
    C: Default + Extend<T> + IntoIterator<Item = T> + 'static,
{
    Collector::of(
        C::default,
        |container: &mut C, item| container.extend(std::iter::once(item)),
        |mut left, right| {
            left.extend(right);
            left
        },
    )
}

/// Collect into a map, failing with [`Error::DuplicateKey`] when two
/// elements produce the same key.
pub fn to_map<T, K, V, KF, VF>(key_fn: KF, value_fn: VF) -> Collector<T, HashMap<K, V>, HashMap<K, V>>
where
    T: 'static,
    K: Eq + Hash + Debug + 'static,
    V: 'static,
    KF: Fn(&T) -> K + Send + Sync + 'static,
    VF: Fn(T) -> V + Send + Sync + 'static,
{
    Collector::try_of(
        HashMap::new,
        move |map: &mut HashMap<K, V>, item| match map.entry(key_fn(&item)) {
            Entry::Occupied(entry) => Err(Error::duplicate_key(entry.key())),
            Entry::Vacant(entry) => {
                entry.insert(value_fn(item));
                Ok(())
            }
        },
        |mut left, right| {
            for (key, value) in right {
                match left.entry(key) {
                    Entry::Occupied(entry) => return Err(Error::duplicate_key(entry.key())),
                    Entry::Vacant(entry) => {
                        entry.insert(value);
                    }
                }
            }
            Ok(left)
        },
    )
}

/// Collect into a map, resolving key collisions with `merge`.
///
/// `merge` receives the value already in the map first. Its errors abort the
/// evaluation unchanged.
pub fn to_map_with<T, K, V, KF, VF, M>(
    key_fn: KF,
    value_fn: VF,
    merge: M,
) -> Collector<T, HashMap<K, V>, HashMap<K, V>>
where
    T: 'static,
    K: Eq + Hash + 'static,
    V: 'static,
    KF: Fn(&T) -> K + Send + Sync + 'static,
    VF: Fn(T) -> V + Send + Sync + 'static,
    M: Fn(V, V) -> Result<V> + Send + Sync + Clone + 'static,
{
    let combine_merge = merge.clone();
    Collector::try_of(
        HashMap::new,
        move |map: &mut HashMap<K, V>, item| {
            let key = key_fn(&item);
            let value = value_fn(item);
            let value = match map.remove(&key) {
                Some(existing) => merge(existing, value)?,
                None => value,
            };
            map.insert(key, value);
            Ok(())
        },
        move |mut left, right| {
            for (key, value) in right {
                let value = match left.remove(&key) {
                    Some(existing) => combine_merge(existing, value)?,
                    None => value,
                };
                left.insert(key, value);
            }
            Ok(left)
        },
    )
}

/// Count the elements.
pub fn counting<T: 'static>() -> Collector<T, u64, u64> {
    Collector::of(|| 0, |count: &mut u64, _item| *count += 1, |a, b| a + b)
}

/// Sum a numeric projection of the elements.
pub fn summing<T, N, F>(f: F) -> Collector<T, N, N>
where
    T: 'static,
    N: Default + Add<Output = N> + 'static,
    F: Fn(T) -> N + Send + Sync + 'static,
{
    Collector::of(
        N::default,
        move |sum: &mut N, item| {
            let current = std::mem::take(sum);
            *sum = current + f(item);
        },
        |a, b| a + b,
    )
}

/// Fold the elements with `op`, starting from `identity`.
///
/// `identity` must be neutral for `op`, since every partition of a parallel
/// evaluation starts from it.
pub fn reducing<T, F>(identity: T, op: F) -> Collector<T, T, T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T, T) -> T + Send + Sync + Clone + 'static,
{
    let seed = identity.clone();
    let combine_op = op.clone();
    Collector::of(
        move || seed.clone(),
        move |acc: &mut T, item| {
            let current = std::mem::replace(acc, identity.clone());
            *acc = op(current, item);
        },
        move |left, right| combine_op(left, right),
    )
}

/// The smallest element by `cmp`; the earliest wins ties.
pub fn min_by<T, F>(cmp: F) -> Collector<T, Option<T>, Option<T>>
where
    T: 'static,
    F: Fn(&T, &T) -> Ordering + Send + Sync + Clone + 'static,
{
    keep_by(cmp, Ordering::Less)
}

/// The largest element by `cmp`; the earliest wins ties.
pub fn max_by<T, F>(cmp: F) -> Collector<T, Option<T>, Option<T>>
where
    T: 'static,
    F: Fn(&T, &T) -> Ordering + Send + Sync + Clone + 'static,
{
    keep_by(cmp, Ordering::Greater)
}

// replaces the current pick only when strictly better
fn keep_by<T, F>(cmp: F, better: Ordering) -> Collector<T, Option<T>, Option<T>>
where
    T: 'static,
    F: Fn(&T, &T) -> Ordering + Send + Sync + Clone + 'static,
{
    let combine_cmp = cmp.clone();
    Collector::of(
        || None,
        move |best: &mut Option<T>, item| match best {
            Some(current) if cmp(&item, current) != better => {}
            _ => *best = Some(item),
        },
        move |left, right| match (left, right) {
            (Some(l), Some(r)) => {
                if combine_cmp(&r, &l) == better {
                    Some(r)
                } else {
                    Some(l)
                }
            }
            (l, r) => l.or(r),
        },
    )
}

/// Apply `finisher` to the result of `downstream`.
pub fn collecting_and_then<T, A, R, R2, F>(
    downstream: Collector<T, A, R>,
    finisher: F,
) -> Collector<T, A, R2>
where
    A: 'static,
    R: 'static,
    F: Fn(R) -> R2 + Send + Sync + 'static,
{
    downstream.and_then(finisher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_list_and_set() {
        assert_eq!(to_list().collect_iter(vec![3, 1, 3]).unwrap(), vec![3, 1, 3]);
        let set = to_set().collect_iter(vec!["I", "I", "you"]).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_to_map_duplicate_key() {
        let by_len = to_map(|s: &&str| s.len(), |s: &str| s.to_uppercase());
        let map = by_len.collect_iter(["I", "love"]).unwrap();
        assert_eq!(map[&4], "LOVE");

        let err = by_len.collect_iter(["you", "too"]).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { key } if key == "3"));
    }

    #[test]
    fn test_to_map_duplicate_key_on_combine() {
        let by_len = to_map(|s: &&str| s.len(), |s: &'static str| s);
        let mut left = by_len.supply();
        let mut right = by_len.supply();
        by_len.accumulate(&mut left, "you").unwrap();
        by_len.accumulate(&mut right, "too").unwrap();
        assert!(by_len.combine(left, right).is_err());
    }

    #[test]
    fn test_to_map_with_merge() {
        let joined = to_map_with(
            |s: &&str| s.len(),
            |s: &str| s.to_string(),
            |a, b| Ok(format!("{}|{}", a, b)),
        );
        let map = joined.collect_iter(["you", "I", "too"]).unwrap();
        assert_eq!(map[&3], "you|too");
        assert_eq!(map[&1], "I");
    }

    #[test]
    fn test_to_map_with_merge_error_propagates() {
        let strict = to_map_with(
            |n: &i32| n % 2,
            |n: i32| n,
            |_, _| Err(Error::custom("collision")),
        );
        let err = strict.collect_iter([1, 3]).unwrap_err();
        assert!(matches!(err, Error::Custom(msg) if msg == "collision"));
    }

    #[test]
    fn test_scalar_collectors() {
        assert_eq!(counting().collect_iter(0..0).unwrap(), 0);
        assert_eq!(counting().collect_iter(0..5).unwrap(), 5);
        assert_eq!(summing(|s: &str| s.len()).collect_iter(["I", "love"]).unwrap(), 5);
        assert_eq!(reducing(0, |a, b| a + b).collect_iter(1..=4).unwrap(), 10);
    }

    #[test]
    fn test_min_max_keep_first_on_ties() {
        let words = ["you", "I", "too", "me"];
        let shortest = min_by(|a: &&str, b: &&str| a.len().cmp(&b.len()));
        let longest = max_by(|a: &&str, b: &&str| a.len().cmp(&b.len()));
        assert_eq!(shortest.collect_iter(words).unwrap(), Some("I"));
        assert_eq!(longest.collect_iter(words).unwrap(), Some("you"));
        assert_eq!(longest.collect_iter(Vec::<&str>::new()).unwrap(), None);

        let left = longest.collect_iter(["you"]).unwrap();
        let right = longest.collect_iter(["too"]).unwrap();
        assert_eq!(longest.combine(left, right).unwrap(), Some("you"));
    }

    #[test]
    fn test_collecting_and_then() {
        let size = collecting_and_then(to_list(), |v: Vec<char>| v.len());
        assert_eq!(size.collect_iter("love".chars()).unwrap(), 4);
    }
}
