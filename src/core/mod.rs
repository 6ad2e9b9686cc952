//! Core traits and types for the lazyweld library.
//!
//! This module contains the fundamental traits and error types that define
//! the lazyweld evaluation model.

pub mod error;
pub mod traits;

// Re-export core items
pub use error::{Error, IntoError, Result};
pub use traits::{AsyncSource, BoxSink, Origin, SizeHint, Sink, Source, Streamed};
