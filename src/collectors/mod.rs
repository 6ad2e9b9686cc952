//! The reduction protocol.
//!
//! A [`Collector`] describes a mutable reduction as four functions: a
//! supplier creating an empty container, an accumulator folding one element
//! into a container, a combiner merging two containers built from disjoint,
//! adjacent runs of the input, and a finisher turning the container into the
//! result. Collectors compose: grouping, partitioning, mapping and filtering
//! collectors take a downstream collector that handles each group.
//!
//! The accumulator and combiner must be associative, so that folding a
//! sequence in one container gives the same result as folding its parts
//! separately and combining them in order. Parallel evaluation relies on it.
//!
//! # Examples
//!
//! ```rust
//! use lazyweld::collectors;
//! use lazyweld::pipeline::Pipeline;
//!
//! let grouped = Pipeline::range(1..6)
//!     .collect(collectors::grouping_by(|n: &i64| n % 2 == 0, collectors::counting()))
//!     .unwrap();
//! assert_eq!(grouped[&false], 3);
//! assert_eq!(grouped[&true], 2);
//! ```

mod containers;
mod grouping;
mod joining;

use std::sync::Arc;

use crate::core::Result;

pub use containers::{
    collecting_and_then, counting, max_by, min_by, reducing, summing, to_collection, to_list,
    to_map, to_map_with, to_set,
};
pub use grouping::{
    filtering, grouping_by, grouping_by_list, mapping, partitioning_by, partitioning_by_list,
};
pub use joining::{joining, joining_full, joining_with, Text};

type Supplier<A> = Arc<dyn Fn() -> A + Send + Sync>;
type Accumulator<T, A> = Arc<dyn Fn(&mut A, T) -> Result<()> + Send + Sync>;
type Combiner<A> = Arc<dyn Fn(A, A) -> Result<A> + Send + Sync>;
type Finisher<A, R> = Arc<dyn Fn(A) -> Result<R> + Send + Sync>;

/// A mutable reduction from elements of type `T`, through a container of
/// type `A`, to a result of type `R`.
pub struct Collector<T, A, R> {
    supplier: Supplier<A>,
    accumulator: Accumulator<T, A>,
    combiner: Combiner<A>,
    finisher: Finisher<A, R>,
}

impl<T, A, R> Clone for Collector<T, A, R> {
    fn clone(&self) -> Self {
        Self {
            supplier: Arc::clone(&self.supplier),
            accumulator: Arc::clone(&self.accumulator),
            combiner: Arc::clone(&self.combiner),
            finisher: Arc::clone(&self.finisher),
        }
    }
}

impl<T, A: 'static> Collector<T, A, A> {
    /// Build a collector whose result is its container.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazyweld::collectors::Collector;
    ///
    /// let total_len = Collector::of(
    ///     || 0usize,
    ///     |acc: &mut usize, s: &str| *acc += s.len(),
    ///     |a, b| a + b,
    /// );
    /// assert_eq!(total_len.collect_iter(["I", "love", "you"]).unwrap(), 8);
    /// ```
    pub fn of<S, F, C>(supplier: S, accumulator: F, combiner: C) -> Self
    where
        S: Fn() -> A + Send + Sync + 'static,
        F: Fn(&mut A, T) + Send + Sync + 'static,
        C: Fn(A, A) -> A + Send + Sync + 'static,
    {
        Self::try_of(
            supplier,
            move |acc, item| {
                accumulator(acc, item);
                Ok(())
            },
            move |left, right| Ok(combiner(left, right)),
        )
    }

    /// Build a collector from fallible accumulate and combine functions.
    ///
    /// Errors abort the evaluation and are returned unchanged.
    pub fn try_of<S, F, C>(supplier: S, accumulator: F, combiner: C) -> Self
    where
        S: Fn() -> A + Send + Sync + 'static,
        F: Fn(&mut A, T) -> Result<()> + Send + Sync + 'static,
        C: Fn(A, A) -> Result<A> + Send + Sync + 'static,
    {
        Self {
            supplier: Arc::new(supplier),
            accumulator: Arc::new(accumulator),
            combiner: Arc::new(combiner),
            finisher: Arc::new(|container: A| -> Result<A> { Ok(container) }),
        }
    }

    pub(crate) fn try_finish<R, F>(self, finisher: F) -> Collector<T, A, R>
    where
        F: Fn(A) -> Result<R> + Send + Sync + 'static,
    {
        Collector {
            supplier: self.supplier,
            accumulator: self.accumulator,
            combiner: self.combiner,
            finisher: Arc::new(finisher),
        }
    }
}

impl<T, A, R: 'static> Collector<T, A, R> {
    /// Append a finishing transformation to the result.
    pub fn and_then<R2, F>(self, finisher: F) -> Collector<T, A, R2>
    where
        F: Fn(R) -> R2 + Send + Sync + 'static,
        A: 'static,
    {
        let inner = self.finisher;
        Collector {
            supplier: self.supplier,
            accumulator: self.accumulator,
            combiner: self.combiner,
            finisher: Arc::new(move |container| inner(container).map(&finisher)),
        }
    }
}

impl<T, A, R> Collector<T, A, R> {
    /// Create an empty container.
    pub fn supply(&self) -> A {
        (self.supplier)()
    }

    /// Fold one element into `container`.
    pub fn accumulate(&self, container: &mut A, item: T) -> Result<()> {
        (self.accumulator)(container, item)
    }

    /// Merge two containers, `left` holding the earlier elements.
    pub fn combine(&self, left: A, right: A) -> Result<A> {
        (self.combiner)(left, right)
    }

    /// Turn a container into the result.
    pub fn finish(&self, container: A) -> Result<R> {
        (self.finisher)(container)
    }

    // same containers and result, different element type
    pub(crate) fn adapt<U, F>(self, accumulator: F) -> Collector<U, A, R>
    where
        F: Fn(&mut A, U) -> Result<()> + Send + Sync + 'static,
    {
        Collector {
            supplier: self.supplier,
            accumulator: Arc::new(accumulator),
            combiner: self.combiner,
            finisher: self.finisher,
        }
    }

    /// Run the collector over an iterator on the calling thread.
    pub fn collect_iter<I: IntoIterator<Item = T>>(&self, items: I) -> Result<R> {
        let mut container = self.supply();
        for item in items {
            self.accumulate(&mut container, item)?;
        }
        self.finish(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;

    #[test]
    fn test_of_and_then() {
        let words = Collector::of(
            Vec::new,
            |acc: &mut Vec<String>, s: &str| acc.push(s.to_uppercase()),
            |mut left, right| {
                left.extend(right);
                left
            },
        )
        .and_then(|v| v.join(" "));
        assert_eq!(words.collect_iter(["I", "love", "you"]).unwrap(), "I LOVE YOU");
    }

    #[test]
    fn test_try_of_propagates_accumulator_error() {
        let strict = Collector::try_of(
            || 0u8,
            |acc: &mut u8, n: u8| {
                *acc = acc
                    .checked_add(n)
                    .ok_or_else(|| Error::custom("overflow"))?;
                Ok(())
            },
            |a, b| a.checked_add(b).ok_or_else(|| Error::custom("overflow")),
        );
        assert_eq!(strict.collect_iter([100, 100]).unwrap(), 200);
        assert!(matches!(
            strict.collect_iter([200, 100]),
            Err(Error::Custom(msg)) if msg == "overflow"
        ));
    }

    #[test]
    fn test_combine_then_finish_matches_sequential() {
        let collector = to_list::<u32>().and_then(|v| v.len());
        let mut left = collector.supply();
        let mut right = collector.supply();
        collector.accumulate(&mut left, 1).unwrap();
        collector.accumulate(&mut right, 2).unwrap();
        collector.accumulate(&mut right, 3).unwrap();
        let merged = collector.combine(left, right).unwrap();
        assert_eq!(collector.finish(merged).unwrap(), 3);
    }
}
