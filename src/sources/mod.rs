//! Source implementations for the lazyweld library.
//!
//! This module provides concrete element sources that feed pipelines. Sources
//! backed by memory (`VecSource`, `RangeSource`) know their exact size and can
//! split for parallel evaluation; the rest are sequential only.

pub mod stream;

use std::collections::VecDeque;
use std::io::BufRead;
use std::iter::Fuse;
use std::ops::Range;

use crate::core::{Result, SizeHint, Source};

pub use stream::{StreamSource, TryStreamSource};

/// A source that yields items from a vector
pub struct VecSource<T> {
    items: VecDeque<T>,
}

impl<T> VecSource<T> {
    /// Create a new vector source
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Check if the source has more items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of remaining items
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T: Send + 'static> Source for VecSource<T> {
    type Item = T;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        Ok(self.items.pop_front())
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::Exact(self.items.len())
    }

    fn can_split(&self) -> bool {
        self.items.len() > 1
    }

    fn try_split(&mut self) -> Option<Self> {
        if self.items.len() < 2 {
            return None;
        }
        let suffix = self.items.split_off(self.items.len() / 2);
        let prefix = std::mem::replace(&mut self.items, suffix);
        Some(Self { items: prefix })
    }

    fn advance_by(&mut self, n: usize) -> Result<usize> {
        let n = n.min(self.items.len());
        self.items.drain(..n);
        Ok(n)
    }
}

impl<T> FromIterator<T> for VecSource<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A source that generates numbers from a half-open range
pub struct RangeSource {
    range: Range<i64>,
}

impl RangeSource {
    /// Create a new range source
    pub fn new(range: Range<i64>) -> Self {
        Self { range }
    }

    // the width of `i64::MIN..i64::MAX` does not fit an `i64`
    fn width(&self) -> u64 {
        if self.range.end > self.range.start {
            self.range.end.abs_diff(self.range.start)
        } else {
            0
        }
    }

    fn remaining(&self) -> usize {
        usize::try_from(self.width()).unwrap_or(usize::MAX)
    }
}

impl Source for RangeSource {
    type Item = i64;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        Ok(self.range.next())
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::Exact(self.remaining())
    }

    fn can_split(&self) -> bool {
        self.remaining() > 1
    }

    fn try_split(&mut self) -> Option<Self> {
        let width = self.width();
        if width < 2 {
            return None;
        }
        let mid = self.range.start.wrapping_add_unsigned(width / 2);
        let prefix = self.range.start..mid;
        self.range.start = mid;
        Some(Self { range: prefix })
    }

    fn advance_by(&mut self, n: usize) -> Result<usize> {
        let n = n.min(self.remaining());
        self.range.start = self.range.start.wrapping_add_unsigned(n as u64);
        Ok(n)
    }
}

/// A source that pulls from any iterator
///
/// The iterator is fused, so a misbehaving iterator that resumes after
/// returning `None` still reads as exhausted.
pub struct IterSource<I: Iterator> {
    iter: Fuse<I>,
}

impl<I: Iterator> IterSource<I> {
    /// Create a new iterator source
    pub fn new<T: IntoIterator<IntoIter = I>>(iter: T) -> Self {
        Self {
            iter: iter.into_iter().fuse(),
        }
    }
}

impl<I> Source for IterSource<I>
where
    I: Iterator,
    I::Item: Send + 'static,
{
    type Item = I::Item;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        Ok(self.iter.next())
    }

    fn size_hint(&self) -> SizeHint {
        self.iter.size_hint().into()
    }
}

/// A source that repeats a single value
pub struct RepeatSource<T> {
    value: T,
    remaining: Option<usize>,
}

impl<T: Clone> RepeatSource<T> {
    /// Create a source that repeats a value indefinitely
    pub fn new(value: T) -> Self {
        Self {
            value,
            remaining: None,
        }
    }

    /// Create a source that repeats a value n times
    pub fn times(value: T, count: usize) -> Self {
        Self {
            value,
            remaining: Some(count),
        }
    }
}

impl<T: Clone + Send + 'static> Source for RepeatSource<T> {
    type Item = T;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        if let Some(ref mut rem) = self.remaining {
            if *rem == 0 {
                return Ok(None);
            }
            *rem -= 1;
        }
        Ok(Some(self.value.clone()))
    }

    fn size_hint(&self) -> SizeHint {
        match self.remaining {
            Some(n) => SizeHint::Exact(n),
            None => SizeHint::Unknown,
        }
    }
}

/// Create a generator source from a closure.
///
/// The closure is called once per pull; the first `None` ends the source for
/// good.
pub fn from_fn<F, T>(f: F) -> FnSource<F>
where
    F: FnMut() -> Option<T>,
    T: Send + 'static,
{
    FnSource { f, done: false }
}

/// A source created from a function, see [`from_fn`]
pub struct FnSource<F> {
    f: F,
    done: bool,
}

impl<F, T> Source for FnSource<F>
where
    F: FnMut() -> Option<T>,
    T: Send + 'static,
{
    type Item = T;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        if self.done {
            return Ok(None);
        }
        let item = (self.f)();
        self.done = item.is_none();
        Ok(item)
    }
}

/// A source that yields the lines of a reader, without line terminators
pub struct LinesSource<R> {
    reader: R,
    done: bool,
}

impl<R: BufRead> LinesSource<R> {
    /// Create a new lines source
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
        }
    }
}

impl<R: BufRead> Source for LinesSource<R> {
    type Item = String;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        if self.done {
            return Ok(None);
        }
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            self.done = true;
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<S: Source>(mut source: S) -> Vec<S::Item> {
        let mut items = Vec::new();
        while let Some(item) = source.next().unwrap() {
            items.push(item);
        }
        items
    }

    #[test]
    fn test_vec_source_split_is_prefix_then_suffix() {
        let mut source = VecSource::new((1..=7).collect());
        let prefix = source.try_split().unwrap();
        assert_eq!(prefix.size_hint(), SizeHint::Exact(3));
        assert_eq!(source.size_hint(), SizeHint::Exact(4));
        assert_eq!(drain(prefix), vec![1, 2, 3]);
        assert_eq!(drain(source), vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_vec_source_single_element_does_not_split() {
        let mut source = VecSource::new(vec![1]);
        assert!(!source.can_split());
        assert!(source.try_split().is_none());
    }

    #[test]
    fn test_range_source_split_and_advance() {
        let mut source = RangeSource::new(0..10);
        let prefix = source.try_split().unwrap();
        assert_eq!(drain(prefix), vec![0, 1, 2, 3, 4]);
        assert_eq!(source.advance_by(3).unwrap(), 3);
        assert_eq!(drain(source), vec![8, 9]);
    }

    #[test]
    fn test_range_source_full_width() {
        let mut source = RangeSource::new(i64::MIN..i64::MAX);
        assert_eq!(source.size_hint(), SizeHint::Exact(usize::MAX));
        assert!(source.can_split());

        let mut prefix = source.try_split().unwrap();
        assert_eq!(source.next().unwrap(), Some(-1));
        assert_eq!(prefix.advance_by(3).unwrap(), 3);
        assert_eq!(prefix.next().unwrap(), Some(i64::MIN + 3));

        let mut tail = RangeSource::new(i64::MAX - 2..i64::MAX);
        assert_eq!(tail.advance_by(usize::MAX).unwrap(), 2);
        assert_eq!(tail.next().unwrap(), None);
    }

    #[test]
    fn test_range_source_empty() {
        let mut source = RangeSource::new(5..1);
        assert_eq!(source.size_hint(), SizeHint::Exact(0));
        assert_eq!(source.next().unwrap(), None);
    }

    #[test]
    fn test_iter_source_size_hint() {
        let source = IterSource::new(vec!["a", "b"]);
        assert_eq!(source.size_hint(), SizeHint::Exact(2));

        let filtered = IterSource::new((0..10).filter(|x| x % 2 == 0));
        assert_eq!(filtered.size_hint(), SizeHint::Unknown);
    }

    #[test]
    fn test_repeat_source() {
        assert_eq!(drain(RepeatSource::times('x', 3)), vec!['x', 'x', 'x']);
        let mut forever = RepeatSource::new(1);
        assert_eq!(forever.size_hint(), SizeHint::Unknown);
        assert_eq!(forever.advance_by(1000).unwrap(), 1000);
    }

    #[test]
    fn test_fn_source_is_fused() {
        let mut calls = 0;
        let mut source = from_fn(move || {
            calls += 1;
            // resumes after the first None, which must be ignored
            if calls == 3 {
                None
            } else {
                Some(calls)
            }
        });
        assert_eq!(source.next().unwrap(), Some(1));
        assert_eq!(source.next().unwrap(), Some(2));
        assert_eq!(source.next().unwrap(), None);
        assert_eq!(source.next().unwrap(), None);
    }

    #[test]
    fn test_lines_source_strips_terminators() {
        let source = LinesSource::new("I\r\nlove\nyou".as_bytes());
        assert_eq!(drain(source), vec!["I", "love", "you"]);
    }
}
