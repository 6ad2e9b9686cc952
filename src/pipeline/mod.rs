//! Pipeline construction and evaluation.
//!
//! A [`Pipeline`] pairs a source with a recorded chain of stages. Intermediate
//! operations (`filter`, `map`, `limit`, ...) only record descriptors and
//! return a new pipeline; nothing touches the source until a terminal
//! operation (`collect`, `fold`, `for_each`, ...) runs. The terminal builds a
//! fresh sink chain, drives the source through it and consumes the pipeline.
//!
//! Evaluation is sequential on the calling thread unless
//! [`Pipeline::parallel`] is set, in which case the source is split into
//! partitions evaluated on rayon and the partial results are combined in
//! partition order.

pub(crate) mod driver;
pub(crate) mod parallel;
pub(crate) mod stream;

use std::cmp::Ordering;
use std::hash::Hash;
use std::ops::Range;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::collectors::{self, Collector};
use crate::core::{AsyncSource, Error, Origin, Result, Sink, Source, Streamed};
use crate::sinks::{BufferSink, CollectorSink, FirstSink, FoldSink, ForEachSink, MatchSink, ReduceSink};
use crate::sources::{from_fn, FnSource, IterSource, RangeSource, VecSource};
use crate::stages::chain::{Head, Link, Mapped, StageChain};
use crate::stages::{hash_seen_set, StageKind, Transform};

use parallel::{BoxPartition, ParallelContext, SourcePartition};

/// Configuration for pipeline evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Evaluate by splitting the source into partitions
    pub parallel: bool,
    /// Keep encounter order across partitions
    pub ordered: bool,
    /// Sources at or below this many elements are not split further
    pub split_threshold: usize,
    /// Upper bound on the number of partitions
    pub max_partitions: usize,
    /// Elements requested per demand from an async source
    pub demand_batch_size: usize,
    /// Maximum time a single async demand may take
    pub operation_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let cores = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self {
            parallel: false,
            ordered: true,
            split_threshold: 1024,
            max_partitions: cores * 4,
            demand_batch_size: 100,
            operation_timeout: None,
        }
    }
}

/// A lazily evaluated chain of stages over a source.
///
/// # Examples
///
/// ```rust
/// use lazyweld::prelude::*;
///
/// let words = Pipeline::from_vec(vec!["I", "love", "you", "too"])
///     .filter(|s| s.len() > 1)
///     .map(|s| s.to_uppercase())
///     .collect(collectors::joining_with(" "))
///     .unwrap();
/// assert_eq!(words, "LOVE YOU TOO");
/// ```
pub struct Pipeline<S: Origin, T> {
    source: Option<S>,
    chain: Box<dyn StageChain<S::Item, Out = T>>,
    config: PipelineConfig,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl<S: Origin> Pipeline<S, S::Item> {
    /// Create a pipeline with no stages over `source`
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
            chain: Box::new(Head::new()),
            config: PipelineConfig::default(),
            pool: None,
        }
    }
}

impl<T: Send + 'static> Pipeline<VecSource<T>, T> {
    /// Create a pipeline over the elements of a vector
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::new(VecSource::new(items))
    }
}

impl Pipeline<RangeSource, i64> {
    /// Create a pipeline over a half-open integer range
    pub fn range(range: Range<i64>) -> Self {
        Self::new(RangeSource::new(range))
    }
}

impl<I> Pipeline<IterSource<I>, I::Item>
where
    I: Iterator,
    I::Item: Send + 'static,
{
    /// Create a pipeline pulling from any iterator
    pub fn of<C: IntoIterator<IntoIter = I>>(items: C) -> Self {
        Self::new(IterSource::new(items))
    }
}

/// Create an unbounded pipeline calling `f` for every element.
///
/// Only short-circuiting stages or terminals make such a pipeline finish.
pub fn generate<T, F>(mut f: F) -> Pipeline<FnSource<impl FnMut() -> Option<T>>, T>
where
    T: Send + 'static,
    F: FnMut() -> T,
{
    Pipeline::new(from_fn(move || Some(f())))
}

/// Create an unbounded pipeline `seed, f(seed), f(f(seed)), ...`
pub fn iterate<T, F>(seed: T, f: F) -> Pipeline<FnSource<impl FnMut() -> Option<T>>, T>
where
    T: Send + 'static,
    F: Fn(&T) -> T,
{
    let mut next = Some(seed);
    Pipeline::new(from_fn(move || {
        let current = next.take()?;
        next = Some(f(&current));
        Some(current)
    }))
}

impl<A: AsyncSource> Pipeline<Streamed<A>, A::Item> {
    /// Create a pipeline over an async source, evaluated by the async
    /// terminal operations
    pub fn from_async(source: A) -> Self {
        Self::new(Streamed(source))
    }
}

// Intermediate operations and configuration
impl<S: Origin, T: Send + 'static> Pipeline<S, T> {
    fn attach(self, kind: StageKind<T>) -> Self {
        Pipeline {
            source: self.source,
            chain: Box::new(Link::new(self.chain, kind)),
            config: self.config,
            pool: self.pool,
        }
    }

    fn transform<U: Send + 'static>(self, transform: Transform<T, U>) -> Pipeline<S, U> {
        Pipeline {
            source: self.source,
            chain: Box::new(Mapped::new(self.chain, transform)),
            config: self.config,
            pool: self.pool,
        }
    }

    /// Keep only elements matching `predicate`
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.attach(StageKind::Filter(Arc::new(predicate)))
    }

    /// Transform every element
    pub fn map<U, F>(self, f: F) -> Pipeline<S, U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.transform(Transform::Map(Arc::new(f)))
    }

    /// Replace every element with the members of `f(element)`, in order
    pub fn flat_map<U, I, F>(self, f: F) -> Pipeline<S, U>
    where
        U: Send + 'static,
        I: IntoIterator<Item = U>,
        I::IntoIter: 'static,
        F: Fn(T) -> I + Send + Sync + 'static,
    {
        self.transform(Transform::FlatMap(Arc::new(move |item: T| {
            Box::new(f(item).into_iter()) as Box<dyn Iterator<Item = U>>
        })))
    }

    /// Observe every element as it passes
    pub fn tap<F>(self, observer: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.attach(StageKind::Tap(Arc::new(observer)))
    }

    /// Alias for [`Pipeline::tap`]
    pub fn peek<F>(self, observer: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.tap(observer)
    }

    /// Drop elements equal to an earlier one
    pub fn distinct(self) -> Self
    where
        T: Eq + Hash + Clone,
    {
        self.attach(StageKind::Distinct(hash_seen_set::<T>))
    }

    /// Sort elements by their natural order. The sort is stable.
    pub fn sorted(self) -> Self
    where
        T: Ord,
    {
        self.sorted_by(|a: &T, b: &T| a.cmp(b))
    }

    /// Sort elements with a comparator. The sort is stable.
    pub fn sorted_by<F>(self, cmp: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.attach(StageKind::Sorted(Arc::new(cmp)))
    }

    /// Sort elements by a key. The sort is stable.
    pub fn sorted_by_key<K, F>(self, f: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.sorted_by(move |a, b| f(a).cmp(&f(b)))
    }

    /// Keep at most the first `n` elements
    pub fn limit(self, n: usize) -> Self {
        self.attach(StageKind::Limit(n))
    }

    /// Drop the first `n` elements
    pub fn skip(self, n: usize) -> Self {
        self.attach(StageKind::Skip(n))
    }

    /// Evaluate by splitting the source into partitions
    pub fn parallel(mut self) -> Self {
        self.config.parallel = true;
        self
    }

    /// Evaluate on the calling thread
    pub fn sequential(mut self) -> Self {
        self.config.parallel = false;
        self
    }

    /// Drop the encounter order guarantee, letting `limit` stop all
    /// partitions as soon as enough elements exist anywhere
    pub fn unordered(mut self) -> Self {
        self.config.ordered = false;
        self
    }

    /// Set the size below which sources are not split
    pub fn split_threshold(mut self, threshold: usize) -> Self {
        self.config.split_threshold = threshold;
        self
    }

    /// Set the maximum number of partitions
    pub fn max_partitions(mut self, max: usize) -> Self {
        self.config.max_partitions = max;
        self
    }

    /// Run parallel evaluation on `pool` instead of the global rayon pool
    pub fn thread_pool(mut self, pool: Arc<rayon::ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Set the demand batch size for async evaluation
    pub fn demand_batch_size(mut self, size: usize) -> Self {
        self.config.demand_batch_size = size;
        self
    }

    /// Bound every async demand request by `timeout`
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.config.operation_timeout = Some(timeout);
        self
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// The current configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Names of the recorded stages, in declaration order
    pub fn stage_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        self.chain.describe(&mut names);
        names
    }

    /// Whether a terminal operation already ran
    pub fn is_consumed(&self) -> bool {
        self.source.is_none()
    }
}

// Synchronous terminal operations
impl<S, T> Pipeline<S, T>
where
    S: Source + Send,
    T: Send + 'static,
{
    /// Push every element into `sink` on the calling thread, consuming the
    /// source.
    ///
    /// The pipeline itself stays usable for inspection, but every later
    /// terminal operation fails with [`Error::PipelineConsumed`].
    pub fn drive_into(&mut self, sink: &mut (dyn Sink<T> + Send)) -> Result<()> {
        let mut source = self.source.take().ok_or(Error::PipelineConsumed)?;
        let mut head = self.chain.wrap(Box::new(sink));
        driver::run(&mut source, &mut head, None)
    }

    /// Call `f` with every element.
    ///
    /// In parallel mode `f` is called from pool threads, one call at a time,
    /// in no particular order.
    pub fn for_each<F>(self, f: F) -> Result<()>
    where
        F: FnMut(T) + Send,
    {
        let f = Mutex::new(f);
        self.evaluate(
            "for_each",
            |_| {
                ForEachSink::new(|item: T| {
                    let mut f = f.lock().unwrap_or_else(PoisonError::into_inner);
                    (*f)(item)
                })
            },
            |_| Ok(()),
            |_, _| Ok(()),
        )
    }

    /// Reduce the elements with a collector
    pub fn collect<A, R>(self, collector: Collector<T, A, R>) -> Result<R>
    where
        A: Send,
    {
        let container = self.evaluate(
            "collect",
            |_| CollectorSink::new(&collector),
            |sink| Ok(sink.into_container()),
            |left, right| collector.combine(left, right),
        )?;
        collector.finish(container)
    }

    /// Reduce the elements into a container built by the given functions
    pub fn collect_with<A, P, F, C>(self, supplier: P, accumulator: F, combiner: C) -> Result<A>
    where
        A: Send + 'static,
        P: Fn() -> A + Send + Sync + 'static,
        F: Fn(&mut A, T) + Send + Sync + 'static,
        C: Fn(A, A) -> A + Send + Sync + 'static,
    {
        self.collect(Collector::of(supplier, accumulator, combiner))
    }

    /// Collect the elements into a `Vec` in encounter order
    pub fn to_vec(self) -> Result<Vec<T>> {
        self.evaluate(
            "to_vec",
            |_| BufferSink::new(),
            |sink| Ok(sink.into_items()),
            |mut left, right| {
                left.extend(right);
                Ok(left)
            },
        )
    }

    /// Left-fold the elements seeded by the first, `None` when empty
    pub fn reduce<F>(self, op: F) -> Result<Option<T>>
    where
        F: Fn(T, T) -> T + Sync,
    {
        self.evaluate(
            "reduce",
            |_| ReduceSink::new(&op),
            |sink| Ok(sink.into_result()),
            |left, right| {
                Ok(match (left, right) {
                    (Some(l), Some(r)) => Some(op(l, r)),
                    (l, r) => l.or(r),
                })
            },
        )
    }

    /// Left-fold the elements starting from `seed`.
    ///
    /// In parallel mode every partition starts from `seed`, so it must be
    /// an identity for `op`.
    pub fn fold<F>(self, seed: T, op: F) -> Result<T>
    where
        T: Clone + Sync,
        F: Fn(T, T) -> T + Sync,
    {
        self.fold_with(seed, &op, &op)
    }

    /// Fold the elements into another type.
    ///
    /// `combiner` merges the folds of adjacent partitions in parallel mode,
    /// where every partition starts from `seed`.
    pub fn fold_with<U, F, C>(self, seed: U, accumulator: F, combiner: C) -> Result<U>
    where
        U: Clone + Send + Sync,
        F: Fn(U, T) -> U + Sync,
        C: Fn(U, U) -> U + Sync,
    {
        self.evaluate(
            "fold",
            |_| FoldSink::new(seed.clone(), &accumulator),
            |sink| {
                sink.into_result()
                    .ok_or_else(|| Error::custom("fold accumulator was not restored"))
            },
            |left, right| Ok(combiner(left, right)),
        )
    }

    /// Count the elements
    pub fn count(self) -> Result<u64> {
        self.collect(collectors::counting())
    }

    /// The smallest element by `cmp`; the earliest wins ties
    pub fn min_by<F>(self, cmp: F) -> Result<Option<T>>
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + Clone + 'static,
    {
        self.collect(collectors::min_by(cmp))
    }

    /// The largest element by `cmp`; the earliest wins ties
    pub fn max_by<F>(self, cmp: F) -> Result<Option<T>>
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + Clone + 'static,
    {
        self.collect(collectors::max_by(cmp))
    }

    /// The smallest element
    pub fn min(self) -> Result<Option<T>>
    where
        T: Ord,
    {
        self.min_by(|a: &T, b: &T| a.cmp(b))
    }

    /// The largest element
    pub fn max(self) -> Result<Option<T>>
    where
        T: Ord,
    {
        self.max_by(|a: &T, b: &T| a.cmp(b))
    }

    /// The first element in encounter order, pulling nothing after it.
    ///
    /// Unordered parallel pipelines return whichever element a partition
    /// found first.
    pub fn find_first(self) -> Result<Option<T>> {
        let ordered = self.config.ordered;
        self.evaluate(
            "find_first",
            // in order, an earlier partition may still hold the answer
            |cancel| FirstSink::new(if ordered { None } else { cancel.cloned() }),
            |sink| Ok(sink.into_result()),
            |left, right| Ok(left.or(right)),
        )
    }

    /// Whether any element matches, stopping at the first that does
    pub fn any_match<P>(self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Sync,
    {
        self.decide("any_match", predicate, true)
    }

    /// Whether every element matches, stopping at the first that does not
    pub fn all_match<P>(self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Sync,
    {
        self.decide("all_match", predicate, false).map(|found| !found)
    }

    /// Whether no element matches, stopping at the first that does
    pub fn none_match<P>(self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Sync,
    {
        self.decide("none_match", predicate, true).map(|found| !found)
    }

    // whether some element's predicate result equals `decisive`
    fn decide<P>(self, terminal: &'static str, predicate: P, decisive: bool) -> Result<bool>
    where
        P: Fn(&T) -> bool + Sync,
    {
        self.evaluate(
            terminal,
            |cancel| MatchSink::new(&predicate, decisive, cancel.cloned()),
            |sink| Ok(sink.decided()),
            |left, right| Ok(left || right),
        )
    }

    /// Run one evaluation.
    ///
    /// `make` creates a terminal sink (one per partition in parallel mode,
    /// given the token that stops all partitions), `extract` turns a drained
    /// sink into a partial result and `combine` merges the partial results
    /// of adjacent partitions.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn evaluate<K, A, M, X, C>(self, terminal: &'static str, make: M, extract: X, combine: C) -> Result<A>
    where
        K: Sink<T> + Send,
        A: Send,
        M: Fn(Option<&CancellationToken>) -> K + Sync,
        X: Fn(K) -> Result<A> + Sync,
        C: Fn(A, A) -> Result<A> + Sync,
    {
        let Pipeline {
            source,
            chain,
            config,
            pool,
        } = self;
        let mut source = source.ok_or(Error::PipelineConsumed)?;
        let mode = if config.parallel { "parallel" } else { "sequential" };

        #[cfg(feature = "metrics")]
        crate::metrics::record_evaluation(mode);
        #[cfg(feature = "tracing")]
        let span = {
            let mut names = Vec::new();
            chain.describe(&mut names);
            crate::tracing_support::evaluation_span(terminal, mode, &names)
        };
        #[cfg(feature = "tracing")]
        let _entered = span.enter();

        let result = if config.parallel {
            let mut ctx = ParallelContext::new(&config);
            ctx.ordered &= source.is_ordered();
            let work = || -> Result<A> {
                let leaves = parallel::split_source(source, &ctx)
                    .into_iter()
                    .map(|leaf| Box::new(SourcePartition::new(leaf)) as BoxPartition<'_, S::Item>)
                    .collect();
                let parts = chain.partitions(leaves, &ctx)?;
                parallel::join_partitions(
                    parts,
                    &|part| {
                        let mut sink = make(Some(&ctx.cancel));
                        part.drive(&mut sink, &ctx.cancel)?;
                        extract(sink)
                    },
                    &combine,
                    &|| extract(make(Some(&ctx.cancel))),
                )
            };
            match &pool {
                Some(pool) => pool.install(work),
                None => work(),
            }
        } else {
            let mut sink = make(None);
            {
                let mut head = chain.wrap(Box::new(&mut sink));
                driver::run(&mut source, &mut head, None)?;
            }
            extract(sink)
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(ok = result.is_ok(), "evaluation finished");
        result
    }
}

// Async terminal operations
impl<A, T> Pipeline<Streamed<A>, T>
where
    A: AsyncSource,
    T: Send + 'static,
{
    async fn evaluate_async<K>(self, mut sink: K) -> Result<K>
    where
        K: Sink<T> + Send,
    {
        let Pipeline {
            source,
            chain,
            config,
            ..
        } = self;
        let Streamed(mut source) = source.ok_or(Error::PipelineConsumed)?;

        #[cfg(feature = "metrics")]
        crate::metrics::record_evaluation("async");
        #[cfg(feature = "tracing")]
        tracing::debug!(
            batch = config.demand_batch_size,
            timeout = ?config.operation_timeout,
            "async evaluation started"
        );

        {
            let mut head = chain.wrap(Box::new(&mut sink));
            stream::run(
                &mut source,
                &mut head,
                config.demand_batch_size,
                config.operation_timeout,
            )
            .await?;
        }
        Ok(sink)
    }

    /// Reduce the elements with a collector
    pub async fn collect_async<C, R>(self, collector: Collector<T, C, R>) -> Result<R>
    where
        C: Send,
    {
        let sink = self.evaluate_async(CollectorSink::new(&collector)).await?;
        collector.finish(sink.into_container())
    }

    /// Collect the elements into a `Vec` in encounter order
    pub async fn to_vec_async(self) -> Result<Vec<T>> {
        Ok(self.evaluate_async(BufferSink::new()).await?.into_items())
    }

    /// Call `f` with every element
    pub async fn for_each_async<F>(self, f: F) -> Result<()>
    where
        F: FnMut(T) + Send,
    {
        self.evaluate_async(ForEachSink::new(f)).await.map(|_| ())
    }

    /// Left-fold the elements starting from `seed`
    pub async fn fold_async<U, F>(self, seed: U, f: F) -> Result<U>
    where
        U: Send,
        F: Fn(U, T) -> U + Sync,
    {
        self.evaluate_async(FoldSink::new(seed, &f))
            .await?
            .into_result()
            .ok_or_else(|| Error::custom("fold accumulator was not restored"))
    }

    /// Left-fold the elements seeded by the first, `None` when empty
    pub async fn reduce_async<F>(self, op: F) -> Result<Option<T>>
    where
        F: Fn(T, T) -> T + Sync,
    {
        Ok(self.evaluate_async(ReduceSink::new(&op)).await?.into_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    #[test]
    fn test_config_defaults() {
        let config = PipelineConfig::default();
        assert!(!config.parallel);
        assert!(config.ordered);
        assert_eq!(config.split_threshold, 1024);
        assert!(config.max_partitions >= 4);
        assert_eq!(config.demand_batch_size, 100);
        assert_eq!(config.operation_timeout, None);
    }

    #[test]
    fn test_builder_settings() {
        let pipeline = Pipeline::range(0..10)
            .parallel()
            .unordered()
            .split_threshold(2)
            .max_partitions(3)
            .demand_batch_size(7)
            .operation_timeout(Duration::from_millis(20));
        let config = pipeline.config();
        assert!(config.parallel);
        assert!(!config.ordered);
        assert_eq!(config.split_threshold, 2);
        assert_eq!(config.max_partitions, 3);
        assert_eq!(config.demand_batch_size, 7);
        assert_eq!(config.operation_timeout, Some(Duration::from_millis(20)));
        assert!(!pipeline.sequential().config().parallel);
    }

    #[test]
    fn test_stage_names_in_declaration_order() {
        let pipeline = Pipeline::range(0..10)
            .filter(|n| n % 2 == 0)
            .map(|n| n.to_string())
            .sorted()
            .limit(2);
        assert_eq!(pipeline.stage_names(), vec!["filter", "map", "sorted", "limit"]);
    }

    #[test]
    fn test_construction_is_lazy() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulls);
        let pipeline = generate(move || counter.fetch_add(1, AtomicOrdering::SeqCst))
            .map(|n| n * 2)
            .limit(3);
        assert_eq!(pulls.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(pipeline.to_vec().unwrap(), vec![0, 2, 4]);
        assert_eq!(pulls.load(AtomicOrdering::SeqCst), 3);
    }

    #[test]
    fn test_reuse_after_terminal_fails() {
        let mut pipeline = Pipeline::from_vec(vec![1, 2, 3]);
        let mut buffer = BufferSink::new();
        pipeline.drive_into(&mut buffer).unwrap();
        assert_eq!(buffer.into_items(), vec![1, 2, 3]);
        assert!(pipeline.is_consumed());

        let mut again = BufferSink::new();
        assert!(matches!(
            pipeline.drive_into(&mut again),
            Err(Error::PipelineConsumed)
        ));

        // stages attached afterwards carry the consumed state forward
        let err = pipeline.map(|n| n + 1).count().unwrap_err();
        assert!(matches!(err, Error::PipelineConsumed));
    }

    #[test]
    fn test_iterate() {
        let powers = iterate(1u64, |n| n * 2).limit(5).to_vec().unwrap();
        assert_eq!(powers, vec![1, 2, 4, 8, 16]);
    }

    #[test]
    fn test_parallel_uses_supplied_pool() {
        let pool = Arc::new(rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap());
        let sum = Pipeline::range(0..10_000)
            .parallel()
            .split_threshold(100)
            .thread_pool(pool)
            .fold(0, |a, b| a + b)
            .unwrap();
        assert_eq!(sum, (0..10_000).sum::<i64>());
    }

    #[test]
    fn test_parallel_find_first_is_ordered() {
        let first = Pipeline::range(0..10_000)
            .parallel()
            .split_threshold(10)
            .filter(|n| n % 1000 == 999)
            .find_first()
            .unwrap();
        assert_eq!(first, Some(999));
    }

    #[test]
    fn test_parallel_match_short_circuits() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let found = Pipeline::range(0..1_000_000)
            .parallel()
            .split_threshold(1000)
            .tap(move |_| {
                counter.fetch_add(1, AtomicOrdering::SeqCst);
            })
            .any_match(|n| *n == 10)
            .unwrap();
        assert!(found);
        assert!(seen.load(AtomicOrdering::SeqCst) < 1_000_000);
    }
}
