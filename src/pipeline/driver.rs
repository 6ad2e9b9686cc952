//! The sequential evaluation driver.

use tokio_util::sync::CancellationToken;

use crate::core::{Result, Sink, Source};

/// Pull every element of `source` into `sink` until exhaustion or
/// cancellation.
///
/// Cancellation is checked before every pull, so a short-circuiting chain
/// never causes one element more than it needs to be pulled. The optional
/// token lets parallel partitions stop each other.
pub(crate) fn run<S, K>(source: &mut S, sink: &mut K, cancel: Option<&CancellationToken>) -> Result<()>
where
    S: Source + ?Sized,
    K: Sink<S::Item> + ?Sized,
{
    sink.begin(source.size_hint());

    #[cfg(feature = "metrics")]
    let mut pulled = 0u64;

    loop {
        if sink.cancellation_requested() || cancel.map_or(false, CancellationToken::is_cancelled) {
            #[cfg(feature = "metrics")]
            crate::metrics::record_short_circuit();
            break;
        }
        match source.next()? {
            Some(item) => {
                #[cfg(feature = "metrics")]
                {
                    pulled += 1;
                }
                sink.accept(item)?;
            }
            None => break,
        }
    }

    #[cfg(feature = "metrics")]
    crate::metrics::record_pulled(pulled);

    sink.end()
}
