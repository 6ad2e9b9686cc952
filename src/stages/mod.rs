//! Stage descriptors and the sinks that execute them.
//!
//! A pipeline records its intermediate operations as descriptors:
//! [`StageKind`] for operations that keep the element type and [`Transform`]
//! for the ones that change it. When a terminal operation runs, each
//! descriptor is instantiated as a sink ([`Stage`] or [`TransformStage`])
//! wrapping the sink of the next stage, with fresh per-evaluation state.

pub(crate) mod chain;

use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use crate::core::{BoxSink, Result, SizeHint, Sink};

pub(crate) type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
pub(crate) type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;
pub(crate) type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;
pub(crate) type Mapper<T, U> = Arc<dyn Fn(T) -> U + Send + Sync>;
pub(crate) type Expander<T, U> = Arc<dyn Fn(T) -> Box<dyn Iterator<Item = U>> + Send + Sync>;

/// Remembers which elements a `distinct` stage has already forwarded.
pub(crate) trait SeenSet<T>: Send {
    /// Record `item`, returning true the first time it is seen.
    fn first_sight(&mut self, item: &T) -> bool;
}

impl<T: Eq + Hash + Clone + Send> SeenSet<T> for HashSet<T> {
    fn first_sight(&mut self, item: &T) -> bool {
        if self.contains(item) {
            false
        } else {
            self.insert(item.clone());
            true
        }
    }
}

pub(crate) fn hash_seen_set<T: Eq + Hash + Clone + Send + 'static>() -> Box<dyn SeenSet<T>> {
    Box::new(HashSet::<T>::new())
}

/// A type-preserving intermediate operation.
pub(crate) enum StageKind<T> {
    Filter(Predicate<T>),
    Tap(Observer<T>),
    Distinct(fn() -> Box<dyn SeenSet<T>>),
    Sorted(Comparator<T>),
    Limit(usize),
    Skip(usize),
}

impl<T> StageKind<T> {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            StageKind::Filter(_) => "filter",
            StageKind::Tap(_) => "tap",
            StageKind::Distinct(_) => "distinct",
            StageKind::Sorted(_) => "sorted",
            StageKind::Limit(_) => "limit",
            StageKind::Skip(_) => "skip",
        }
    }

    /// Whether the stage depends on encounter order across the whole
    /// sequence, so parallel partitions must be merged before it.
    pub(crate) fn is_barrier(&self) -> bool {
        !matches!(self, StageKind::Filter(_) | StageKind::Tap(_))
    }
}

/// A type-changing intermediate operation.
pub(crate) enum Transform<T, U> {
    Map(Mapper<T, U>),
    FlatMap(Expander<T, U>),
}

impl<T, U> Transform<T, U> {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Transform::Map(_) => "map",
            Transform::FlatMap(_) => "flat_map",
        }
    }
}

/// Per-evaluation state of a [`Stage`].
enum Op<'a, T> {
    Filter(&'a Predicate<T>),
    Tap(&'a Observer<T>),
    Distinct(Box<dyn SeenSet<T>>),
    Sorted {
        cmp: &'a Comparator<T>,
        buffer: Vec<T>,
    },
    Limit {
        limit: usize,
        passed: usize,
    },
    Skip {
        skip: usize,
        dropped: usize,
    },
}

/// A running instance of a [`StageKind`].
pub(crate) struct Stage<'a, T> {
    op: Op<'a, T>,
    downstream: BoxSink<'a, T>,
}

impl<'a, T> Stage<'a, T> {
    pub(crate) fn new(kind: &'a StageKind<T>, downstream: BoxSink<'a, T>) -> Self {
        let op = match kind {
            StageKind::Filter(predicate) => Op::Filter(predicate),
            StageKind::Tap(observer) => Op::Tap(observer),
            StageKind::Distinct(new_set) => Op::Distinct(new_set()),
            StageKind::Sorted(cmp) => Op::Sorted {
                cmp,
                buffer: Vec::new(),
            },
            StageKind::Limit(limit) => Op::Limit {
                limit: *limit,
                passed: 0,
            },
            StageKind::Skip(skip) => Op::Skip {
                skip: *skip,
                dropped: 0,
            },
        };
        Self { op, downstream }
    }
}

impl<'a, T: Send> Sink<T> for Stage<'a, T> {
    fn begin(&mut self, size: SizeHint) {
        match &mut self.op {
            Op::Filter(_) | Op::Distinct(_) => self.downstream.begin(size.inexact()),
            Op::Tap(_) => self.downstream.begin(size),
            // downstream begins once the buffer is sorted
            Op::Sorted { buffer, .. } => buffer.reserve(size.capacity()),
            Op::Limit { limit, .. } => self.downstream.begin(size.limited(*limit)),
            Op::Skip { skip, .. } => self.downstream.begin(size.skipped(*skip)),
        }
    }

    fn accept(&mut self, item: T) -> Result<()> {
        match &mut self.op {
            Op::Filter(predicate) => {
                if predicate(&item) {
                    self.downstream.accept(item)?;
                }
                Ok(())
            }
            Op::Tap(observer) => {
                observer(&item);
                self.downstream.accept(item)
            }
            Op::Distinct(seen) => {
                if seen.first_sight(&item) {
                    self.downstream.accept(item)?;
                }
                Ok(())
            }
            Op::Sorted { buffer, .. } => {
                buffer.push(item);
                Ok(())
            }
            Op::Limit { limit, passed } => {
                if *passed < *limit {
                    *passed += 1;
                    self.downstream.accept(item)?;
                }
                Ok(())
            }
            Op::Skip { skip, dropped } => {
                if *dropped < *skip {
                    *dropped += 1;
                    Ok(())
                } else {
                    self.downstream.accept(item)
                }
            }
        }
    }

    fn end(&mut self) -> Result<()> {
        if let Op::Sorted { cmp, buffer } = &mut self.op {
            let mut sorted = std::mem::take(buffer);
            // stable, so equal elements keep encounter order
            sorted.sort_by(|a, b| cmp(a, b));
            self.downstream.begin(SizeHint::Exact(sorted.len()));
            for item in sorted {
                if self.downstream.cancellation_requested() {
                    break;
                }
                self.downstream.accept(item)?;
            }
        }
        self.downstream.end()
    }

    fn cancellation_requested(&self) -> bool {
        match &self.op {
            // a sort has to see every element before it can emit the first
            Op::Sorted { .. } => false,
            Op::Limit { limit, passed } => passed >= limit || self.downstream.cancellation_requested(),
            _ => self.downstream.cancellation_requested(),
        }
    }
}

/// A running instance of a [`Transform`].
pub(crate) struct TransformStage<'a, T, U> {
    transform: &'a Transform<T, U>,
    downstream: BoxSink<'a, U>,
}

impl<'a, T, U> TransformStage<'a, T, U> {
    pub(crate) fn new(transform: &'a Transform<T, U>, downstream: BoxSink<'a, U>) -> Self {
        Self {
            transform,
            downstream,
        }
    }
}

impl<'a, T, U> Sink<T> for TransformStage<'a, T, U> {
    fn begin(&mut self, size: SizeHint) {
        match self.transform {
            Transform::Map(_) => self.downstream.begin(size),
            Transform::FlatMap(_) => self.downstream.begin(SizeHint::Unknown),
        }
    }

    fn accept(&mut self, item: T) -> Result<()> {
        match self.transform {
            Transform::Map(f) => self.downstream.accept(f(item)),
            Transform::FlatMap(f) => {
                for member in f(item) {
                    if self.downstream.cancellation_requested() {
                        break;
                    }
                    self.downstream.accept(member)?;
                }
                Ok(())
            }
        }
    }

    fn end(&mut self) -> Result<()> {
        self.downstream.end()
    }

    fn cancellation_requested(&self) -> bool {
        self.downstream.cancellation_requested()
    }
}
