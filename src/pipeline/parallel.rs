//! Parallel split-and-merge evaluation.
//!
//! The source is split into disjoint leaves, every leaf is driven by its own
//! driver through its own instance of the stage chain, and the partial results
//! are combined pairwise with `rayon::join` in partition order. Combine
//! functions must be associative; that is a precondition, not something this
//! module can check.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::core::{Result, Sink, Source};
use crate::pipeline::{driver, PipelineConfig};
use crate::sinks::BufferSink;
use crate::sources::VecSource;
use crate::stages::{Comparator, Stage, StageKind, Transform, TransformStage};

/// Settings and shared cancellation for one parallel evaluation.
pub(crate) struct ParallelContext {
    pub(crate) split_threshold: usize,
    pub(crate) max_partitions: usize,
    pub(crate) ordered: bool,
    pub(crate) cancel: CancellationToken,
}

impl ParallelContext {
    pub(crate) fn new(config: &PipelineConfig) -> Self {
        Self {
            split_threshold: config.split_threshold,
            max_partitions: config.max_partitions.max(1),
            ordered: config.ordered,
            cancel: CancellationToken::new(),
        }
    }
}

/// One disjoint slice of the work, able to push its elements into a sink.
pub(crate) trait Partition<T>: Send {
    fn drive(self: Box<Self>, sink: &mut (dyn Sink<T> + Send), cancel: &CancellationToken)
        -> Result<()>;
}

pub(crate) type BoxPartition<'a, T> = Box<dyn Partition<T> + 'a>;

/// A leaf partition: a sub-source pulled by its own driver.
pub(crate) struct SourcePartition<S> {
    source: S,
}

impl<S> SourcePartition<S> {
    pub(crate) fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: Source + Send> Partition<S::Item> for SourcePartition<S> {
    fn drive(
        mut self: Box<Self>,
        sink: &mut (dyn Sink<S::Item> + Send),
        cancel: &CancellationToken,
    ) -> Result<()> {
        driver::run(&mut self.source, sink, Some(cancel))
    }
}

/// A partition seen through one stateless stage.
pub(crate) struct StagePartition<'a, T> {
    inner: BoxPartition<'a, T>,
    kind: &'a StageKind<T>,
}

impl<'a, T> StagePartition<'a, T> {
    pub(crate) fn new(inner: BoxPartition<'a, T>, kind: &'a StageKind<T>) -> Self {
        Self { inner, kind }
    }
}

impl<'a, T: Send> Partition<T> for StagePartition<'a, T> {
    fn drive(self: Box<Self>, sink: &mut (dyn Sink<T> + Send), cancel: &CancellationToken) -> Result<()> {
        let StagePartition { inner, kind } = *self;
        let mut stage = Stage::new(kind, Box::new(sink));
        inner.drive(&mut stage, cancel)
    }
}

/// A partition seen through one map or flat-map stage.
pub(crate) struct TransformPartition<'a, T, U> {
    inner: BoxPartition<'a, T>,
    transform: &'a Transform<T, U>,
}

impl<'a, T, U> TransformPartition<'a, T, U> {
    pub(crate) fn new(inner: BoxPartition<'a, T>, transform: &'a Transform<T, U>) -> Self {
        Self { inner, transform }
    }
}

impl<'a, T, U> Partition<U> for TransformPartition<'a, T, U> {
    fn drive(self: Box<Self>, sink: &mut (dyn Sink<U> + Send), cancel: &CancellationToken) -> Result<()> {
        let TransformPartition { inner, transform } = *self;
        let mut stage = TransformStage::new(transform, Box::new(sink));
        inner.drive(&mut stage, cancel)
    }
}

/// Split `source` into leaves in encounter order.
pub(crate) fn split_source<S: Source>(source: S, ctx: &ParallelContext) -> Vec<S> {
    let mut leaves = Vec::new();
    split_into(source, ctx.max_partitions, ctx.split_threshold, &mut leaves);
    #[cfg(feature = "tracing")]
    tracing::trace!(partitions = leaves.len(), "split source");
    #[cfg(feature = "metrics")]
    crate::metrics::record_partitions(leaves.len());
    leaves
}

fn split_into<S: Source>(mut source: S, budget: usize, threshold: usize, leaves: &mut Vec<S>) {
    let worth_splitting = budget > 1
        && source.can_split()
        && source
            .size_hint()
            .estimate()
            .map_or(false, |remaining| remaining > threshold);
    if worth_splitting {
        if let Some(prefix) = source.try_split() {
            let left = budget / 2;
            split_into(prefix, left, threshold, leaves);
            split_into(source, budget - left, threshold, leaves);
            return;
        }
    }
    leaves.push(source);
}

/// Turn merged barrier output back into partitions for the stages after it.
pub(crate) fn resplit<'a, T: Send + 'static>(
    items: Vec<T>,
    ctx: &ParallelContext,
) -> Vec<BoxPartition<'a, T>> {
    split_source(VecSource::new(items), ctx)
        .into_iter()
        .map(|leaf| Box::new(SourcePartition::new(leaf)) as BoxPartition<'a, T>)
        .collect()
}

/// Evaluate an order-dependent stage across partitions.
///
/// Each partition first applies the stage locally where that is sound
/// (sorting, de-duplicating, or capping its own run), then the runs are merged
/// into the sequence the stage would have produced over the whole input.
pub(crate) fn merge_barrier<'a, T: Send + 'static>(
    kind: &StageKind<T>,
    parts: Vec<BoxPartition<'a, T>>,
    ctx: &ParallelContext,
) -> Result<Vec<T>> {
    #[cfg(feature = "tracing")]
    tracing::trace!(stage = kind.name(), partitions = parts.len(), "merging barrier");

    let runs: Vec<Vec<T>> = match kind {
        StageKind::Limit(limit) if !ctx.ordered => drain_unordered_limit(*limit, parts, ctx)?,
        StageKind::Limit(limit) => drain_ordered_limit(*limit, parts, ctx)?,
        // dropping has to happen against the global order
        StageKind::Skip(_) => parts
            .into_par_iter()
            .map(|part| {
                let mut buffer = BufferSink::default();
                part.drive(&mut buffer, &ctx.cancel)?;
                Ok(buffer.into_items())
            })
            .collect::<Result<_>>()?,
        _ => parts
            .into_par_iter()
            .map(|part| {
                let mut buffer = BufferSink::default();
                {
                    let mut stage = Stage::new(kind, Box::new(&mut buffer));
                    part.drive(&mut stage, &ctx.cancel)?;
                }
                Ok(buffer.into_items())
            })
            .collect::<Result<_>>()?,
    };

    Ok(match kind {
        StageKind::Sorted(cmp) => merge_sorted(runs, cmp),
        StageKind::Distinct(new_set) => {
            let mut seen = new_set();
            runs.into_iter()
                .flatten()
                .filter(|item| seen.first_sight(item))
                .collect()
        }
        StageKind::Limit(limit) => runs.into_iter().flatten().take(*limit).collect(),
        StageKind::Skip(skip) => runs.into_iter().flatten().skip(*skip).collect(),
        StageKind::Filter(_) | StageKind::Tap(_) => runs.into_iter().flatten().collect(),
    })
}

/// Stable k-way merge: on ties the run from the earlier partition wins.
fn merge_sorted<T>(runs: Vec<Vec<T>>, cmp: &Comparator<T>) -> Vec<T> {
    let total = runs.iter().map(Vec::len).sum();
    let mut runs: Vec<VecDeque<T>> = runs.into_iter().map(VecDeque::from).collect();
    let mut merged = Vec::with_capacity(total);
    loop {
        let mut best: Option<usize> = None;
        for (index, run) in runs.iter().enumerate() {
            let Some(head) = run.front() else {
                continue;
            };
            let replace = match best.and_then(|b| runs[b].front()) {
                Some(current) => cmp(head, current) == Ordering::Less,
                None => true,
            };
            if replace {
                best = Some(index);
            }
        }
        match best.and_then(|index| runs[index].pop_front()) {
            Some(item) => merged.push(item),
            None => break,
        }
    }
    merged
}

/// Keeps every partition pulling until `limit` elements exist in total.
struct GlobalLimit<'s, T> {
    limit: usize,
    produced: &'s AtomicUsize,
    token: &'s CancellationToken,
    inner: &'s mut BufferSink<T>,
}

impl<'s, T: Send> Sink<T> for GlobalLimit<'s, T> {
    fn accept(&mut self, item: T) -> Result<()> {
        let ticket = self.produced.fetch_add(1, AtomicOrdering::SeqCst);
        if ticket < self.limit {
            self.inner.accept(item)?;
        }
        if ticket + 1 >= self.limit {
            self.token.cancel();
        }
        Ok(())
    }

    fn cancellation_requested(&self) -> bool {
        self.token.is_cancelled()
    }
}

fn drain_unordered_limit<'a, T: Send + 'static>(
    limit: usize,
    parts: Vec<BoxPartition<'a, T>>,
    ctx: &ParallelContext,
) -> Result<Vec<Vec<T>>> {
    let produced = AtomicUsize::new(0);
    let token = ctx.cancel.child_token();
    if limit == 0 {
        token.cancel();
    }
    parts
        .into_par_iter()
        .map(|part| {
            let mut buffer = BufferSink::default();
            {
                let mut counted = GlobalLimit {
                    limit,
                    produced: &produced,
                    token: &token,
                    inner: &mut buffer,
                };
                part.drive(&mut counted, &token)?;
            }
            Ok(buffer.into_items())
        })
        .collect()
}

/// Caps one partition at `limit` and stops every later partition once the
/// partitions before it hold `limit` elements between them.
struct PrefixLimit<'s, T> {
    index: usize,
    limit: usize,
    produced: &'s [AtomicUsize],
    tokens: &'s [CancellationToken],
    inner: &'s mut BufferSink<T>,
}

impl<'s, T> PrefixLimit<'s, T> {
    // partitions past the first prefix holding `limit` elements can never
    // contribute to the merged output
    fn cancel_beyond_boundary(&self) {
        let mut prefix = 0;
        for (index, produced) in self.produced.iter().enumerate() {
            if prefix >= self.limit {
                for token in &self.tokens[index..] {
                    token.cancel();
                }
                return;
            }
            prefix += produced.load(AtomicOrdering::SeqCst);
        }
    }
}

impl<'s, T: Send> Sink<T> for PrefixLimit<'s, T> {
    fn accept(&mut self, item: T) -> Result<()> {
        let own = &self.produced[self.index];
        if own.load(AtomicOrdering::SeqCst) >= self.limit {
            self.tokens[self.index].cancel();
            return Ok(());
        }
        self.inner.accept(item)?;
        if own.fetch_add(1, AtomicOrdering::SeqCst) + 1 >= self.limit {
            self.tokens[self.index].cancel();
        }
        self.cancel_beyond_boundary();
        Ok(())
    }

    fn cancellation_requested(&self) -> bool {
        self.tokens[self.index].is_cancelled()
    }
}

fn drain_ordered_limit<'a, T: Send + 'static>(
    limit: usize,
    parts: Vec<BoxPartition<'a, T>>,
    ctx: &ParallelContext,
) -> Result<Vec<Vec<T>>> {
    let produced: Vec<AtomicUsize> = parts.iter().map(|_| AtomicUsize::new(0)).collect();
    let tokens: Vec<CancellationToken> = parts.iter().map(|_| ctx.cancel.child_token()).collect();
    if limit == 0 {
        tokens.iter().for_each(CancellationToken::cancel);
    }
    parts
        .into_par_iter()
        .enumerate()
        .map(|(index, part)| {
            let mut buffer = BufferSink::default();
            {
                let mut capped = PrefixLimit {
                    index,
                    limit,
                    produced: &produced,
                    tokens: &tokens,
                    inner: &mut buffer,
                };
                part.drive(&mut capped, &tokens[index])?;
            }
            Ok(buffer.into_items())
        })
        .collect()
}

/// Evaluate every partition with `leaf` and fold the results pairwise with
/// `combine`, keeping partition order.
pub(crate) fn join_partitions<'a, T, A, F, C, E>(
    mut parts: Vec<BoxPartition<'a, T>>,
    leaf: &F,
    combine: &C,
    empty: &E,
) -> Result<A>
where
    A: Send,
    F: Fn(BoxPartition<'a, T>) -> Result<A> + Sync,
    C: Fn(A, A) -> Result<A> + Sync,
    E: Fn() -> Result<A> + Sync,
{
    match parts.len() {
        0 => empty(),
        1 => leaf(parts.remove(0)),
        len => {
            let right = parts.split_off(len / 2);
            let (left, right) = rayon::join(
                || join_partitions(parts, leaf, combine, empty),
                || join_partitions(right, leaf, combine, empty),
            );
            combine(left?, right?)
        }
    }
}
