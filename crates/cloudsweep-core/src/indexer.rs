//! Dual write into the store and the search index
//!
//! The store is the system of record, the search index a derived structure. A
//! write always goes to the store first. When the store write fails the search
//! index is left untouched. When the search write fails afterwards the resource
//! is stored but not searchable until it is indexed again, or until
//! [`Index::reindex_from_store`] rebuilds the search side.

use crate::backend::{Searcher, Storer};
use crate::error::{Error, Result};
use crate::resource::Resource;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Every mutation path (discovery, delete, actions, job run polling) goes
/// through this.
#[async_trait]
pub trait Indexer<R: Resource>: Send + Sync {
    async fn index(&self, resource: &R) -> Result<()>;

    async fn deindex(&self, resource: &R) -> Result<()>;
}

/// Store-then-search [`Indexer`].
pub struct Index<R, S, Q> {
    store: Arc<S>,
    search: Arc<Q>,
    _resource: PhantomData<fn() -> R>,
}

impl<R, S, Q> Index<R, S, Q>
where
    R: Resource,
    S: Storer<R>,
    Q: Searcher<R>,
{
    pub fn new(store: Arc<S>, search: Arc<Q>) -> Self {
        Self {
            store,
            search,
            _resource: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn search(&self) -> &Arc<Q> {
        &self.search
    }

    /// Re-feed every stored resource into the search index in one batch.
    ///
    /// Returns how many resources were indexed.
    pub async fn reindex_from_store(&self) -> Result<usize> {
        let resources = self.store.list_all_resources().await?;
        let indexed = self.search.index_all(&resources)?;

        info!(
            num_resources = resources.len(),
            indexed, "rebuilt search index from store"
        );
        Ok(indexed)
    }
}

impl<R, S, Q> Clone for Index<R, S, Q> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            search: Arc::clone(&self.search),
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R, S, Q> Indexer<R> for Index<R, S, Q>
where
    R: Resource,
    S: Storer<R>,
    Q: Searcher<R>,
{
    async fn index(&self, resource: &R) -> Result<()> {
        let id = resource.id();
        self.store.store(resource).await?;

        if let Err(e) = self.search.index(resource) {
            warn!(resource_id = %id, error = %e, "resource stored but not searchable");
            return Err(Error::StoreInconsistency {
                id,
                reason: e.to_string(),
            });
        }

        debug!(resource_id = %id, "indexed resource");
        Ok(())
    }

    async fn deindex(&self, resource: &R) -> Result<()> {
        let id = resource.id();
        self.store.delete_resource(resource).await?;

        if let Err(e) = self.search.deindex(resource) {
            warn!(resource_id = %id, error = %e, "resource deleted but still searchable");
            return Err(Error::StoreInconsistency {
                id,
                reason: e.to_string(),
            });
        }

        debug!(resource_id = %id, "deindexed resource");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locality::Locality;
    use crate::resource::ResourceType;
    use crate::testing::{MemorySearch, MemoryStore, TestResource};

    fn index() -> Index<TestResource, MemoryStore<TestResource>, MemorySearch<TestResource>> {
        Index::new(Arc::new(MemoryStore::new()), Arc::new(MemorySearch::new()))
    }

    fn instance(id: &str, name: &str) -> TestResource {
        TestResource::new(id, name, ResourceType::Instance, Locality::zone("fr-par-1"))
            .in_project("p-1")
    }

    #[tokio::test]
    async fn test_index_then_deindex_leaves_no_trace() {
        let index = index();
        let res = instance("i-1", "web");

        index.index(&res).await.unwrap();
        assert_eq!(index.store().len(), 1);
        assert!(index.search().search("web").unwrap().contains("i-1"));

        index.deindex(&res).await.unwrap();
        assert_eq!(index.store().len(), 0);
        assert!(index.search().search("web").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let index = index();
        index.index(&instance("i-1", "before")).await.unwrap();
        index.index(&instance("i-1", "after")).await.unwrap();

        let stored = index.store().get_resource("i-1").await.unwrap();
        assert_eq!(stored.name, "after");
        assert!(index.search().search("before").unwrap().is_empty());
        assert!(index.search().search("after").unwrap().contains("i-1"));
    }

    #[tokio::test]
    async fn test_store_failure_leaves_search_untouched() {
        let index = index();
        index.store().set_failing(true);

        let err = index.index(&instance("i-1", "web")).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert!(index.search().is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_is_store_inconsistency() {
        let index = index();
        index.search().set_failing(true);

        let err = index.index(&instance("i-1", "web")).await.unwrap_err();
        assert!(matches!(err, Error::StoreInconsistency { ref id, .. } if id == "i-1"));
        // store-durable anyway
        assert!(index.store().get_resource("i-1").await.is_ok());

        index.search().set_failing(false);
        assert_eq!(index.reindex_from_store().await.unwrap(), 1);
        assert!(index.search().search("web").unwrap().contains("i-1"));
    }

    #[tokio::test]
    async fn test_deindex_missing_is_not_found() {
        let index = index();
        let err = index.deindex(&instance("ghost", "x")).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
