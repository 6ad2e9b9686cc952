//! Collectors that route elements to downstream collectors.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use super::{to_list, Collector};

/// Group elements by key, reducing every group with `downstream`.
///
/// A group's container is created the first time its key is seen, so the
/// result holds only keys that occurred.
pub fn grouping_by<T, K, A, R, KF>(
    key_fn: KF,
    downstream: Collector<T, A, R>,
) -> Collector<T, HashMap<K, A>, HashMap<K, R>>
where
    T: 'static,
    K: Eq + Hash + 'static,
    A: 'static,
    R: 'static,
    KF: Fn(&T) -> K + Send + Sync + 'static,
{
    let accumulate = downstream.clone();
    let combine = downstream.clone();
    let finish = downstream;
    Collector::try_of(
        HashMap::new,
        move |groups: &mut HashMap<K, A>, item| {
            let container = groups
                .entry(key_fn(&item))
                .or_insert_with(|| accumulate.supply());
            accumulate.accumulate(container, item)
        },
        move |mut left, right| {
            for (key, container) in right {
                let container = match left.remove(&key) {
                    Some(existing) => combine.combine(existing, container)?,
                    None => container,
                };
                left.insert(key, container);
            }
            Ok(left)
        },
    )
    .try_finish(move |groups| {
        groups
            .into_iter()
            .map(|(key, container)| Ok((key, finish.finish(container)?)))
            .collect()
    })
}

/// Group elements by key into lists.
pub fn grouping_by_list<T, K, KF>(key_fn: KF) -> Collector<T, HashMap<K, Vec<T>>, HashMap<K, Vec<T>>>
where
    T: 'static,
    K: Eq + Hash + 'static,
    KF: Fn(&T) -> K + Send + Sync + 'static,
{
    grouping_by(key_fn, to_list())
}

/// Split elements by a predicate, reducing both sides with `downstream`.
///
/// The result always has a `false` and a `true` entry, even for empty input.
pub fn partitioning_by<T, A, R, P>(
    predicate: P,
    downstream: Collector<T, A, R>,
) -> Collector<T, (A, A), BTreeMap<bool, R>>
where
    T: 'static,
    A: 'static,
    R: 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    let supply = downstream.clone();
    let accumulate = downstream.clone();
    let combine = downstream.clone();
    let finish = downstream;
    Collector::try_of(
        move || (supply.supply(), supply.supply()),
        move |(rejected, accepted): &mut (A, A), item| {
            if predicate(&item) {
                accumulate.accumulate(accepted, item)
            } else {
                accumulate.accumulate(rejected, item)
            }
        },
        move |left, right| {
            Ok((
                combine.combine(left.0, right.0)?,
                combine.combine(left.1, right.1)?,
            ))
        },
    )
    .try_finish(move |(rejected, accepted)| {
        Ok(BTreeMap::from([
            (false, finish.finish(rejected)?),
            (true, finish.finish(accepted)?),
        ]))
    })
}

/// Split elements by a predicate into two lists.
pub fn partitioning_by_list<T, P>(predicate: P) -> Collector<T, (Vec<T>, Vec<T>), BTreeMap<bool, Vec<T>>>
where
    T: 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    partitioning_by(predicate, to_list())
}

/// Transform elements before handing them to `downstream`.
pub fn mapping<T, U, A, R, F>(f: F, downstream: Collector<U, A, R>) -> Collector<T, A, R>
where
    T: 'static,
    U: 'static,
    A: 'static,
    R: 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    let accumulate = downstream.clone();
    downstream.adapt(move |container: &mut A, item: T| accumulate.accumulate(container, f(item)))
}

/// Hand only elements matching `predicate` to `downstream`.
///
/// Unlike a `filter` stage before a grouping, groups whose elements are all
/// rejected still appear in the grouping result.
pub fn filtering<T, A, R, P>(predicate: P, downstream: Collector<T, A, R>) -> Collector<T, A, R>
where
    T: 'static,
    A: 'static,
    R: 'static,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    let accumulate = downstream.clone();
    downstream.adapt(move |container: &mut A, item: T| {
        if predicate(&item) {
            accumulate.accumulate(container, item)
        } else {
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::{counting, joining_with};

    #[test]
    fn test_grouping_by_counting() {
        let grouped = grouping_by(|n: &i32| n % 2 == 0, counting())
            .collect_iter(1..=5)
            .unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&false], 3);
        assert_eq!(grouped[&true], 2);
    }

    #[test]
    fn test_grouping_by_combine_merges_groups() {
        let collector = grouping_by_list(|s: &&str| s.len());
        let left = {
            let mut c = collector.supply();
            collector.accumulate(&mut c, "you").unwrap();
            collector.accumulate(&mut c, "I").unwrap();
            c
        };
        let right = {
            let mut c = collector.supply();
            collector.accumulate(&mut c, "too").unwrap();
            c
        };
        let merged = collector.combine(left, right).unwrap();
        let groups = collector.finish(merged).unwrap();
        assert_eq!(groups[&3], vec!["you", "too"]);
        assert_eq!(groups[&1], vec!["I"]);
    }

    #[test]
    fn test_partitioning_by_empty_has_both_keys() {
        let passing = partitioning_by_list(|grade: &u32| *grade >= 60)
            .collect_iter(Vec::new())
            .unwrap();
        assert_eq!(passing.len(), 2);
        assert!(passing[&false].is_empty());
        assert!(passing[&true].is_empty());
    }

    #[test]
    fn test_partitioning_by_downstream() {
        let split = partitioning_by(|grade: &u32| *grade >= 60, counting())
            .collect_iter([59, 60, 99, 12])
            .unwrap();
        assert_eq!(split[&false], 2);
        assert_eq!(split[&true], 2);
    }

    #[test]
    fn test_mapping_and_filtering() {
        let lengths = mapping(|s: &str| s.len(), to_list())
            .collect_iter(["I", "love", "you"])
            .unwrap();
        assert_eq!(lengths, vec![1, 4, 3]);

        let by_initial = grouping_by(
            |s: &&str| s.chars().next(),
            filtering(|s: &&str| s.len() > 1, joining_with("-")),
        )
        .collect_iter(["I", "you", "yes"])
        .unwrap();
        assert_eq!(by_initial[&Some('I')], "");
        assert_eq!(by_initial[&Some('y')], "you-yes");
    }
}
