//! The async evaluation driver.
//!
//! Elements are requested from an [`AsyncSource`] in demand-sized batches and
//! pushed through the same sink chain the synchronous driver uses. Demand
//! stops as soon as the chain reports cancellation, so a short-circuiting
//! pipeline over-requests by at most one batch.

use std::time::Duration;

use crate::core::{AsyncSource, Error, Result, Sink};

pub(crate) async fn run<A, K>(
    source: &mut A,
    sink: &mut K,
    demand: usize,
    timeout: Option<Duration>,
) -> Result<()>
where
    A: AsyncSource + ?Sized,
    K: Sink<A::Item> + Send + ?Sized,
{
    let demand = demand.max(1);
    sink.begin(source.size_hint());

    'demand: loop {
        if sink.cancellation_requested() {
            #[cfg(feature = "metrics")]
            crate::metrics::record_short_circuit();
            break;
        }

        let batch = match timeout {
            Some(limit) => tokio::time::timeout(limit, source.handle_demand(demand))
                .await
                .map_err(|_| Error::timeout(limit.as_millis() as u64))??,
            None => source.handle_demand(demand).await?,
        };
        if batch.is_empty() {
            break;
        }

        #[cfg(feature = "metrics")]
        crate::metrics::record_pulled(batch.len() as u64);

        for item in batch {
            if sink.cancellation_requested() {
                break 'demand;
            }
            sink.accept(item)?;
        }
    }

    sink.end()
}
