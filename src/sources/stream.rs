//! Async sources backed by `futures` streams.

use async_trait::async_trait;
use futures_core::Stream;
use tokio_stream::StreamExt;

use crate::core::{AsyncSource, Error, Result};

/// An async source that drains a stream in demand-sized batches
///
/// Wrap a `tokio::sync::mpsc::Receiver` in
/// `tokio_stream::wrappers::ReceiverStream` to feed a pipeline from a channel.
pub struct StreamSource<St> {
    stream: St,
    done: bool,
}

impl<St> StreamSource<St> {
    /// Create a new stream source
    pub fn new(stream: St) -> Self {
        Self {
            stream,
            done: false,
        }
    }
}

#[async_trait]
impl<St> AsyncSource for StreamSource<St>
where
    St: Stream + Unpin + Send,
    St::Item: Send + 'static,
{
    type Item = St::Item;

    async fn handle_demand(&mut self, demand: usize) -> Result<Vec<Self::Item>> {
        let mut items = Vec::with_capacity(demand);
        while !self.done && items.len() < demand {
            match self.stream.next().await {
                Some(item) => items.push(item),
                None => self.done = true,
            }
        }
        Ok(items)
    }
}

/// An async source over a stream of results
///
/// The first `Err` aborts evaluation as an [`Error::Source`]; elements already
/// handed out in earlier batches stay delivered.
pub struct TryStreamSource<St> {
    stream: St,
    done: bool,
}

impl<St> TryStreamSource<St> {
    /// Create a new fallible stream source
    pub fn new(stream: St) -> Self {
        Self {
            stream,
            done: false,
        }
    }
}

#[async_trait]
impl<St, T, E> AsyncSource for TryStreamSource<St>
where
    St: Stream<Item = std::result::Result<T, E>> + Unpin + Send,
    T: Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = T;

    async fn handle_demand(&mut self, demand: usize) -> Result<Vec<Self::Item>> {
        let mut items = Vec::with_capacity(demand);
        while !self.done && items.len() < demand {
            match self.stream.next().await {
                Some(Ok(item)) => items.push(item),
                Some(Err(e)) => {
                    self.done = true;
                    return Err(Error::source_error(e));
                }
                None => self.done = true,
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_source_batches() {
        let mut source = StreamSource::new(tokio_stream::iter(1..=5));
        assert_eq!(source.handle_demand(2).await.unwrap(), vec![1, 2]);
        assert_eq!(source.handle_demand(10).await.unwrap(), vec![3, 4, 5]);
        assert!(source.handle_demand(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_try_stream_source_surfaces_error() {
        let items: Vec<std::result::Result<u8, std::io::Error>> = vec![
            Ok(1),
            Err(std::io::Error::new(std::io::ErrorKind::Other, "feed dropped")),
        ];
        let mut source = TryStreamSource::new(tokio_stream::iter(items));
        let err = source.handle_demand(4).await.unwrap_err();
        assert!(matches!(err, Error::Source(_)));
        assert!(source.handle_demand(4).await.unwrap().is_empty());
    }
}
