//! Single consumer between the discovery stream and the indexer

use crate::error::{Error, Result};
use crate::indexer::Indexer;
use crate::resource::{Resource, ResourceType};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// What a drain did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub indexed: usize,

    /// Stored but not searchable.
    pub inconsistent: usize,

    pub by_type: BTreeMap<ResourceType, usize>,
}

/// Index everything received on `rx` until the channel closes.
///
/// A search-side failure is logged and counted, the resource is store-durable.
/// Any other indexing failure stops the consumer and is returned; the producer
/// then sees a closed stream.
pub async fn drain_into_indexer<R, I>(
    mut rx: mpsc::Receiver<R>,
    indexer: Arc<I>,
    cancel: CancellationToken,
) -> Result<DrainSummary>
where
    R: Resource,
    I: Indexer<R> + ?Sized,
{
    let mut summary = DrainSummary::default();

    loop {
        let resource = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            next = rx.recv() => match next {
                Some(resource) => resource,
                None => break,
            },
        };

        let meta = resource.metadata();
        match indexer.index(&resource).await {
            Ok(()) => {}
            Err(Error::StoreInconsistency { id, reason }) => {
                warn!(resource_id = %id, error = %reason, "indexed resource is not searchable");
                summary.inconsistent += 1;
            }
            Err(e) => {
                error!(
                    resource_id = %meta.id,
                    num_resources = summary.indexed,
                    error = %e,
                    "failed to index resource"
                );
                return Err(e);
            }
        }

        summary.indexed += 1;
        *summary.by_type.entry(meta.resource_type).or_default() += 1;
    }

    info!(
        num_resources = summary.indexed,
        inconsistent = summary.inconsistent,
        "finished indexing"
    );
    Ok(summary)
}
