//! The recorded stage chain of a pipeline.
//!
//! Each intermediate operation wraps the chain built so far in a new node, so
//! the outermost node is the last declared stage. Instantiating the chain
//! walks back from that node: every node wraps the sink it is given in its own
//! stage and hands the result to its upstream node, leaving the first declared
//! stage at the head where the driver pushes elements.

use std::marker::PhantomData;

use crate::core::{BoxSink, Result};
use crate::pipeline::parallel::{self, BoxPartition, ParallelContext, StagePartition, TransformPartition};
use crate::stages::{Stage, StageKind, Transform, TransformStage};

/// A chain of stages from elements of type `In` to `Self::Out`.
pub(crate) trait StageChain<In>: Send + Sync {
    type Out: Send + 'static;

    /// Instantiate every stage with fresh state, ending in `sink`.
    fn wrap<'a>(&'a self, sink: BoxSink<'a, Self::Out>) -> BoxSink<'a, In>;

    /// Run the chain over independent partitions for parallel evaluation.
    ///
    /// Stateless stages are layered onto each partition lazily; barrier
    /// stages drain and merge their upstream partitions before returning.
    fn partitions<'a>(
        &'a self,
        leaves: Vec<BoxPartition<'a, In>>,
        ctx: &ParallelContext,
    ) -> Result<Vec<BoxPartition<'a, Self::Out>>>;

    /// Stage names in declaration order.
    fn describe(&self, names: &mut Vec<&'static str>);
}

/// The empty chain.
pub(crate) struct Head<T> {
    _phantom: PhantomData<fn(T) -> T>,
}

impl<T> Head<T> {
    pub(crate) fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T: Send + 'static> StageChain<T> for Head<T> {
    type Out = T;

    fn wrap<'a>(&'a self, sink: BoxSink<'a, T>) -> BoxSink<'a, T> {
        sink
    }

    fn partitions<'a>(
        &'a self,
        leaves: Vec<BoxPartition<'a, T>>,
        _ctx: &ParallelContext,
    ) -> Result<Vec<BoxPartition<'a, T>>> {
        Ok(leaves)
    }

    fn describe(&self, _names: &mut Vec<&'static str>) {}
}

/// A chain extended by one type-preserving stage.
pub(crate) struct Link<In, T> {
    upstream: Box<dyn StageChain<In, Out = T>>,
    kind: StageKind<T>,
}

impl<In, T> Link<In, T> {
    pub(crate) fn new(upstream: Box<dyn StageChain<In, Out = T>>, kind: StageKind<T>) -> Self {
        Self { upstream, kind }
    }
}

impl<In, T: Send + 'static> StageChain<In> for Link<In, T> {
    type Out = T;

    fn wrap<'a>(&'a self, sink: BoxSink<'a, T>) -> BoxSink<'a, In> {
        self.upstream.wrap(Box::new(Stage::new(&self.kind, sink)))
    }

    fn partitions<'a>(
        &'a self,
        leaves: Vec<BoxPartition<'a, In>>,
        ctx: &ParallelContext,
    ) -> Result<Vec<BoxPartition<'a, T>>> {
        let upstream = self.upstream.partitions(leaves, ctx)?;
        if self.kind.is_barrier() {
            let merged = parallel::merge_barrier(&self.kind, upstream, ctx)?;
            return Ok(parallel::resplit(merged, ctx));
        }
        Ok(upstream
            .into_iter()
            .map(|inner| Box::new(StagePartition::new(inner, &self.kind)) as BoxPartition<'a, T>)
            .collect())
    }

    fn describe(&self, names: &mut Vec<&'static str>) {
        self.upstream.describe(names);
        names.push(self.kind.name());
    }
}

/// A chain extended by one type-changing stage.
pub(crate) struct Mapped<In, T, U> {
    upstream: Box<dyn StageChain<In, Out = T>>,
    transform: Transform<T, U>,
}

impl<In, T, U> Mapped<In, T, U> {
    pub(crate) fn new(
        upstream: Box<dyn StageChain<In, Out = T>>,
        transform: Transform<T, U>,
    ) -> Self {
        Self {
            upstream,
            transform,
        }
    }
}

impl<In, T, U> StageChain<In> for Mapped<In, T, U>
where
    T: Send + 'static,
    U: Send + 'static,
{
    type Out = U;

    fn wrap<'a>(&'a self, sink: BoxSink<'a, U>) -> BoxSink<'a, In> {
        self.upstream
            .wrap(Box::new(TransformStage::new(&self.transform, sink)))
    }

    fn partitions<'a>(
        &'a self,
        leaves: Vec<BoxPartition<'a, In>>,
        ctx: &ParallelContext,
    ) -> Result<Vec<BoxPartition<'a, U>>> {
        Ok(self
            .upstream
            .partitions(leaves, ctx)?
            .into_iter()
            .map(|inner| {
                Box::new(TransformPartition::new(inner, &self.transform)) as BoxPartition<'a, U>
            })
            .collect())
    }

    fn describe(&self, names: &mut Vec<&'static str>) {
        self.upstream.describe(names);
        names.push(self.transform.name());
    }
}
