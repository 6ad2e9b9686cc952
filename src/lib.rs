//! # Lazy, composable sequence pipelines for Rust
//!
//! This crate provides lazily evaluated pipelines over sequences of elements,
//! with short-circuiting stages and a composable collector protocol for
//! reducing the result into scalars, containers, grouped maps and text.
//!
//! ## Core Concepts
//!
//! - **Source**: Produces elements on demand, optionally splitting for parallel evaluation
//! - **Stage**: One deferred transformation (filter, map, flat_map, tap, distinct, sorted, limit, skip)
//! - **Pipeline**: A source plus its recorded stages, consumed by exactly one terminal operation
//! - **Collector**: A reduction described by supplier, accumulator, combiner and finisher
//!
//! Stages are recorded when declared and run only when a terminal operation
//! pulls the source, one element at a time, until the source is exhausted or
//! a stage such as `limit` has seen enough.
//!
//! ## Example
//!
//! ```rust
//! use lazyweld::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let evens = Pipeline::range(1..101)
//!         .filter(|n| n % 2 == 0)
//!         .skip(3)
//!         .limit(4)
//!         .to_vec()?;
//!     assert_eq!(evens, vec![8, 10, 12, 14]);
//!
//!     let sentence = Pipeline::from_vec(vec!["I", "love", "you"])
//!         .collect(collectors::joining_full(",", "{", "}"))?;
//!     assert_eq!(sentence, "{I,love,you}");
//!     Ok(())
//! }
//! ```

pub mod collectors;
pub mod core;
pub mod pipeline;
pub mod sinks;
pub mod sources;
mod stages;

// Re-export commonly used items
pub mod prelude {
    pub use crate::collectors::{self, Collector, Text};
    pub use crate::core::{AsyncSource, Error, Result, SizeHint, Sink, Source};
    pub use crate::pipeline::{generate, iterate, Pipeline, PipelineConfig};
    pub use crate::sources::{
        from_fn, IterSource, LinesSource, RangeSource, RepeatSource, StreamSource, TryStreamSource,
        VecSource,
    };
}

// Re-export main error type
pub use crate::core::{Error, Result};

// Feature flags for optional dependencies
#[cfg(feature = "metrics")]
pub mod metrics;

#[cfg(feature = "tracing")]
mod tracing_support;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
