//! Core traits for the pull/push evaluation model.
//!
//! A [`Source`] is pulled one element at a time by an evaluation driver, which
//! pushes every element into a chain of [`Sink`]s. Stages are sinks that own
//! their downstream sink, so a whole pipeline is a single sink from the
//! driver's point of view.

use async_trait::async_trait;

use crate::core::error::Result;

/// How much a source (or stage) knows about the number of remaining elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SizeHint {
    /// Exactly this many elements remain
    Exact(usize),
    /// Roughly this many elements remain (an upper bound when filtered)
    Estimated(usize),
    /// Nothing is known, possibly unbounded
    Unknown,
}

impl SizeHint {
    /// The best known element count, if any.
    pub fn estimate(&self) -> Option<usize> {
        match *self {
            SizeHint::Exact(n) | SizeHint::Estimated(n) => Some(n),
            SizeHint::Unknown => None,
        }
    }

    /// Whether the count is exact.
    pub fn is_exact(&self) -> bool {
        matches!(self, SizeHint::Exact(_))
    }

    /// Demote an exact count to an estimate, as after a filter.
    pub fn inexact(self) -> Self {
        match self {
            SizeHint::Exact(n) => SizeHint::Estimated(n),
            other => other,
        }
    }

    /// The hint after at most `n` elements are kept.
    pub fn limited(self, n: usize) -> Self {
        match self {
            SizeHint::Exact(m) => SizeHint::Exact(m.min(n)),
            SizeHint::Estimated(m) => SizeHint::Estimated(m.min(n)),
            SizeHint::Unknown => SizeHint::Estimated(n),
        }
    }

    /// The hint after the first `n` elements are dropped.
    pub fn skipped(self, n: usize) -> Self {
        match self {
            SizeHint::Exact(m) => SizeHint::Exact(m.saturating_sub(n)),
            SizeHint::Estimated(m) => SizeHint::Estimated(m.saturating_sub(n)),
            SizeHint::Unknown => SizeHint::Unknown,
        }
    }

    /// Capacity worth reserving for a buffer fed by this hint.
    pub(crate) fn capacity(&self) -> usize {
        // cap speculative reservations for estimates
        match *self {
            SizeHint::Exact(n) => n,
            SizeHint::Estimated(n) => n.min(4096),
            SizeHint::Unknown => 0,
        }
    }
}

impl From<(usize, Option<usize>)> for SizeHint {
    /// Derive a hint from `Iterator::size_hint` bounds.
    fn from((lower, upper): (usize, Option<usize>)) -> Self {
        match upper {
            Some(upper) if upper == lower => SizeHint::Exact(lower),
            _ if lower > 0 => SizeHint::Estimated(lower),
            _ => SizeHint::Unknown,
        }
    }
}

/// A source produces elements on demand.
///
/// Sources are pull-based: the evaluation driver calls [`Source::next`] only
/// while the stage chain still wants elements, so an unbounded source is fine
/// as long as something downstream short-circuits.
///
/// Once `next` returns `Ok(None)` it must keep returning `Ok(None)`.
///
/// # Examples
///
/// ```rust
/// use lazyweld::core::{Result, SizeHint, Source};
///
/// struct Countdown {
///     remaining: u32,
/// }
///
/// impl Source for Countdown {
///     type Item = u32;
///
///     fn next(&mut self) -> Result<Option<Self::Item>> {
///         if self.remaining == 0 {
///             return Ok(None);
///         }
///         self.remaining -= 1;
///         Ok(Some(self.remaining + 1))
///     }
///
///     fn size_hint(&self) -> SizeHint {
///         SizeHint::Exact(self.remaining as usize)
///     }
/// }
/// ```
pub trait Source {
    /// The type of elements this source produces
    type Item: Send + 'static;

    /// Produce the next element, or `None` once the source is exhausted.
    fn next(&mut self) -> Result<Option<Self::Item>>;

    /// How many elements remain.
    fn size_hint(&self) -> SizeHint {
        SizeHint::Unknown
    }

    /// Whether elements have a meaningful encounter order.
    fn is_ordered(&self) -> bool {
        true
    }

    /// Whether [`Source::try_split`] can ever succeed.
    fn can_split(&self) -> bool {
        false
    }

    /// Split off a prefix of the remaining elements into a new source.
    ///
    /// On success `self` keeps the suffix, so concatenating the returned
    /// source and `self` yields the original sequence.
    fn try_split(&mut self) -> Option<Self>
    where
        Self: Sized,
    {
        None
    }

    /// Discard up to `n` elements, returning how many were discarded.
    fn advance_by(&mut self, n: usize) -> Result<usize> {
        for advanced in 0..n {
            if self.next()?.is_none() {
                return Ok(advanced);
            }
        }
        Ok(n)
    }
}

/// A sink receives elements pushed by the evaluation driver.
///
/// Every stage of a pipeline is a sink wrapping the next one, and terminal
/// operations supply the innermost sink. The driver calls [`Sink::begin`]
/// once, [`Sink::accept`] per element, and [`Sink::end`] once, checking
/// [`Sink::cancellation_requested`] before every pull.
pub trait Sink<T> {
    /// Called before the first element with the expected element count.
    fn begin(&mut self, _size: SizeHint) {}

    /// Receive one element.
    fn accept(&mut self, item: T) -> Result<()>;

    /// Called after the last element.
    fn end(&mut self) -> Result<()> {
        Ok(())
    }

    /// Whether this sink (or anything downstream) wants no more elements.
    fn cancellation_requested(&self) -> bool {
        false
    }
}

impl<T, S: Sink<T> + ?Sized> Sink<T> for &mut S {
    fn begin(&mut self, size: SizeHint) {
        (**self).begin(size)
    }

    fn accept(&mut self, item: T) -> Result<()> {
        (**self).accept(item)
    }

    fn end(&mut self) -> Result<()> {
        (**self).end()
    }

    fn cancellation_requested(&self) -> bool {
        (**self).cancellation_requested()
    }
}

impl<T, S: Sink<T> + ?Sized> Sink<T> for Box<S> {
    fn begin(&mut self, size: SizeHint) {
        (**self).begin(size)
    }

    fn accept(&mut self, item: T) -> Result<()> {
        (**self).accept(item)
    }

    fn end(&mut self) -> Result<()> {
        (**self).end()
    }

    fn cancellation_requested(&self) -> bool {
        (**self).cancellation_requested()
    }
}

/// An owned, type-erased sink. Stages hold their downstream as one of these.
pub type BoxSink<'a, T> = Box<dyn Sink<T> + Send + 'a>;

/// An asynchronous source that answers explicit demand with a batch.
///
/// This is the async counterpart of [`Source`]: the async driver asks for up
/// to `demand` elements at a time and stops asking once the stage chain is
/// satisfied.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use lazyweld::core::{AsyncSource, Result};
///
/// struct Counter {
///     current: u64,
///     max: u64,
/// }
///
/// #[async_trait]
/// impl AsyncSource for Counter {
///     type Item = u64;
///
///     async fn handle_demand(&mut self, demand: usize) -> Result<Vec<Self::Item>> {
///         let mut items = Vec::with_capacity(demand);
///         while items.len() < demand && self.current <= self.max {
///             items.push(self.current);
///             self.current += 1;
///         }
///         Ok(items)
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncSource: Send {
    /// The type of elements this source produces
    type Item: Send + 'static;

    /// Return up to `demand` elements. An empty batch means exhausted.
    async fn handle_demand(&mut self, demand: usize) -> Result<Vec<Self::Item>>;

    /// How many elements remain.
    fn size_hint(&self) -> SizeHint {
        SizeHint::Unknown
    }
}

/// Anything a [`Pipeline`](crate::pipeline::Pipeline) can draw elements from.
///
/// Implemented for every [`Source`], and for [`Streamed`] wrappers around
/// [`AsyncSource`]s.
pub trait Origin {
    /// The type of elements entering the pipeline
    type Item: Send + 'static;
}

impl<S: Source> Origin for S {
    type Item = S::Item;
}

/// Marks an [`AsyncSource`] as the origin of a pipeline, enabling the async
/// terminal operations.
pub struct Streamed<A>(pub(crate) A);

impl<A: AsyncSource> Origin for Streamed<A> {
    type Item = A::Item;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fused {
        items: Vec<u8>,
    }

    impl Source for Fused {
        type Item = u8;

        fn next(&mut self) -> Result<Option<u8>> {
            Ok(self.items.pop())
        }
    }

    #[test]
    fn test_size_hint_adjustments() {
        assert_eq!(SizeHint::Exact(10).inexact(), SizeHint::Estimated(10));
        assert_eq!(SizeHint::Exact(10).limited(3), SizeHint::Exact(3));
        assert_eq!(SizeHint::Unknown.limited(3), SizeHint::Estimated(3));
        assert_eq!(SizeHint::Exact(2).skipped(5), SizeHint::Exact(0));
        assert_eq!(SizeHint::Unknown.skipped(5), SizeHint::Unknown);
        assert_eq!(SizeHint::Estimated(7).estimate(), Some(7));
        assert!(SizeHint::Exact(0).is_exact());
    }

    #[test]
    fn test_size_hint_from_iterator_bounds() {
        assert_eq!(SizeHint::from((4, Some(4))), SizeHint::Exact(4));
        assert_eq!(SizeHint::from((2, None)), SizeHint::Estimated(2));
        assert_eq!(SizeHint::from((0, Some(9))), SizeHint::Unknown);
    }

    #[test]
    fn test_default_advance_by_stops_at_exhaustion() {
        let mut source = Fused {
            items: vec![3, 2, 1],
        };
        assert_eq!(source.advance_by(2).unwrap(), 2);
        assert_eq!(source.advance_by(5).unwrap(), 1);
        assert_eq!(source.next().unwrap(), None);
        assert_eq!(source.next().unwrap(), None);
    }
}
