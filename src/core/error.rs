//! Error types for pipeline evaluation.

use std::sync::Arc;

/// The main error type for pipeline evaluation.
///
/// Every variant is fatal to the evaluation that raised it: the driver stops
/// pulling, no partial result is returned, and nothing is retried.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A terminal operation was invoked on a pipeline that was already consumed
    #[error("pipeline has already been consumed by a terminal operation")]
    PipelineConsumed,

    /// Two elements mapped to the same key and no merge function was supplied
    #[error("duplicate key {key}")]
    DuplicateKey { key: String },

    /// An absent element reached an operation that cannot accept it
    #[error("absent element passed to {operation}")]
    AbsentElement { operation: &'static str },

    /// A caller-supplied accumulate or merge function failed
    #[error("accumulation failed: {0}")]
    Accumulation(Arc<dyn std::error::Error + Send + Sync>),

    /// The element source failed to produce an element
    #[error("source error: {0}")]
    Source(Arc<dyn std::error::Error + Send + Sync>),

    /// An async demand request timed out
    #[error("operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// A custom error with a message
    #[error("{0}")]
    Custom(String),
}

// Convenience constructors
impl Error {
    /// Create a source error from any error type
    pub fn source_error<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Source(Arc::new(error))
    }

    /// Create an accumulation error from any error type
    pub fn accumulation<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Accumulation(Arc::new(error))
    }

    /// Create a duplicate key error, rendering the key with its `Debug` form
    pub fn duplicate_key<K: std::fmt::Debug>(key: &K) -> Self {
        Error::DuplicateKey {
            key: format!("{:?}", key),
        }
    }

    /// Create an absent element error for the named operation
    pub fn absent(operation: &'static str) -> Self {
        Error::AbsentElement { operation }
    }

    /// Create a timeout error
    pub fn timeout(duration_ms: u64) -> Self {
        Error::Timeout { duration_ms }
    }

    /// Create a custom error with a message
    pub fn custom<S: Into<String>>(message: S) -> Self {
        Error::Custom(message.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::source_error(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Custom(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Custom(s.to_string())
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Helper trait for converting foreign errors into our Error type
pub trait IntoError<T> {
    fn into_source_error(self) -> Result<T>;
    fn into_accumulation_error(self) -> Result<T>;
}

impl<T, E> IntoError<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_source_error(self) -> Result<T> {
        self.map_err(Error::source_error)
    }

    fn into_accumulation_error(self) -> Result<T> {
        self.map_err(Error::accumulation)
    }
}
