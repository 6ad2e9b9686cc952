//! Terminal sinks for the lazyweld library.
//!
//! Every terminal operation of a [`Pipeline`](crate::pipeline::Pipeline) ends
//! the stage chain in one of these sinks. [`BufferSink`] and [`ForEachSink`]
//! are public so they can be handed to
//! [`Pipeline::drive_into`](crate::pipeline::Pipeline::drive_into); the rest
//! back specific terminals.

use tokio_util::sync::CancellationToken;

use crate::collectors::Collector;
use crate::core::{Result, SizeHint, Sink};

/// A sink that buffers every element in encounter order.
pub struct BufferSink<T> {
    items: Vec<T>,
}

impl<T> BufferSink<T> {
    /// Create a new buffer sink
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The buffered elements so far
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Take the buffered elements
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for BufferSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sink<T> for BufferSink<T> {
    fn begin(&mut self, size: SizeHint) {
        self.items.reserve(size.capacity());
    }

    fn accept(&mut self, item: T) -> Result<()> {
        self.items.push(item);
        Ok(())
    }
}

/// A sink that hands every element to a callback.
pub struct ForEachSink<F> {
    f: F,
}

impl<F> ForEachSink<F> {
    /// Create a new for-each sink
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, F: FnMut(T)> Sink<T> for ForEachSink<F> {
    fn accept(&mut self, item: T) -> Result<()> {
        (self.f)(item);
        Ok(())
    }
}

/// Feeds elements into one container of a collector.
pub(crate) struct CollectorSink<'c, T, A, R> {
    collector: &'c Collector<T, A, R>,
    container: A,
}

impl<'c, T, A, R> CollectorSink<'c, T, A, R> {
    pub(crate) fn new(collector: &'c Collector<T, A, R>) -> Self {
        Self {
            container: collector.supply(),
            collector,
        }
    }

    pub(crate) fn into_container(self) -> A {
        self.container
    }
}

impl<'c, T, A, R> Sink<T> for CollectorSink<'c, T, A, R> {
    fn accept(&mut self, item: T) -> Result<()> {
        self.collector.accumulate(&mut self.container, item)
    }
}

/// Left-folds elements, seeded by the first one.
pub(crate) struct ReduceSink<'f, T, F> {
    acc: Option<T>,
    op: &'f F,
}

impl<'f, T, F> ReduceSink<'f, T, F>
where
    F: Fn(T, T) -> T,
{
    pub(crate) fn new(op: &'f F) -> Self {
        Self { acc: None, op }
    }

    pub(crate) fn into_result(self) -> Option<T> {
        self.acc
    }
}

impl<'f, T, F> Sink<T> for ReduceSink<'f, T, F>
where
    F: Fn(T, T) -> T,
{
    fn accept(&mut self, item: T) -> Result<()> {
        self.acc = Some(match self.acc.take() {
            Some(acc) => (self.op)(acc, item),
            None => item,
        });
        Ok(())
    }
}

/// Left-folds elements into a seed of another type.
pub(crate) struct FoldSink<'f, U, F> {
    acc: Option<U>,
    f: &'f F,
}

impl<'f, U, F> FoldSink<'f, U, F> {
    pub(crate) fn new(seed: U, f: &'f F) -> Self {
        Self { acc: Some(seed), f }
    }

    pub(crate) fn into_result(self) -> Option<U> {
        self.acc
    }
}

impl<'f, T, U, F> Sink<T> for FoldSink<'f, U, F>
where
    F: Fn(U, T) -> U,
{
    fn accept(&mut self, item: T) -> Result<()> {
        if let Some(acc) = self.acc.take() {
            self.acc = Some((self.f)(acc, item));
        }
        Ok(())
    }
}

/// Keeps the first element and stops.
pub(crate) struct FirstSink<T> {
    first: Option<T>,
    cancel: Option<CancellationToken>,
}

impl<T> FirstSink<T> {
    /// `cancel` is fired on the first hit, stopping sibling partitions.
    pub(crate) fn new(cancel: Option<CancellationToken>) -> Self {
        Self {
            first: None,
            cancel,
        }
    }

    pub(crate) fn into_result(self) -> Option<T> {
        self.first
    }
}

impl<T> Sink<T> for FirstSink<T> {
    fn accept(&mut self, item: T) -> Result<()> {
        if self.first.is_none() {
            self.first = Some(item);
            if let Some(token) = &self.cancel {
                token.cancel();
            }
        }
        Ok(())
    }

    fn cancellation_requested(&self) -> bool {
        self.first.is_some()
    }
}

/// Tests elements until one decides the answer of a match operation.
pub(crate) struct MatchSink<'p, P> {
    predicate: &'p P,
    decisive: bool,
    decided: bool,
    cancel: Option<CancellationToken>,
}

impl<'p, P> MatchSink<'p, P> {
    /// The answer is decided by the first element whose predicate result
    /// equals `decisive`.
    pub(crate) fn new(predicate: &'p P, decisive: bool, cancel: Option<CancellationToken>) -> Self {
        Self {
            predicate,
            decisive,
            decided: false,
            cancel,
        }
    }

    pub(crate) fn decided(&self) -> bool {
        self.decided
    }
}

impl<'p, T, P> Sink<T> for MatchSink<'p, P>
where
    P: Fn(&T) -> bool,
{
    fn accept(&mut self, item: T) -> Result<()> {
        if (self.predicate)(&item) == self.decisive {
            self.decided = true;
            if let Some(token) = &self.cancel {
                token.cancel();
            }
        }
        Ok(())
    }

    fn cancellation_requested(&self) -> bool {
        self.decided
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors;

    #[test]
    fn test_collector_sink() {
        let collector = collectors::counting::<&str>();
        let mut sink = CollectorSink::new(&collector);
        sink.accept("I").unwrap();
        sink.accept("love").unwrap();
        assert_eq!(sink.into_container(), 2);
    }

    #[test]
    fn test_reduce_sink() {
        let longest = |a: &'static str, b: &'static str| if b.len() > a.len() { b } else { a };
        let mut sink = ReduceSink::new(&longest);
        for word in ["I", "love", "you", "too"] {
            sink.accept(word).unwrap();
        }
        assert_eq!(sink.into_result(), Some("love"));

        let empty: ReduceSink<'_, &str, _> = ReduceSink::new(&longest);
        assert_eq!(empty.into_result(), None);
    }

    #[test]
    fn test_fold_sink() {
        let add_len = |acc: usize, s: &str| acc + s.len();
        let mut sink = FoldSink::new(0, &add_len);
        for word in ["I", "love", "you", "too"] {
            sink.accept(word).unwrap();
        }
        assert_eq!(sink.into_result(), Some(11));
    }

    #[test]
    fn test_first_sink_cancels_token() {
        let token = CancellationToken::new();
        let mut sink = FirstSink::new(Some(token.clone()));
        assert!(!sink.cancellation_requested());
        sink.accept(7).unwrap();
        assert!(sink.cancellation_requested());
        assert!(token.is_cancelled());
        assert_eq!(sink.into_result(), Some(7));
    }

    #[test]
    fn test_match_sink() {
        let even = |n: &i32| n % 2 == 0;
        let mut sink = MatchSink::new(&even, true, None);
        sink.accept(1).unwrap();
        assert!(!sink.decided());
        sink.accept(4).unwrap();
        assert!(sink.decided());
        assert!(sink.cancellation_requested());
    }
}
