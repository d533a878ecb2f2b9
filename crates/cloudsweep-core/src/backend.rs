//! Collaborator contracts: persistent store, search index and log source

use crate::error::Result;
use crate::resource::{Resource, ResourceType, SetOfIds};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Predicate used by [`Storer::find_typed_by_predicate_in_project`].
pub type Predicate<'a, R> = &'a (dyn Fn(&R) -> bool + Send + Sync);

/// The system of record for discovered resources.
///
/// `store` is an idempotent upsert keyed by `Metadata::id`: storing the same id
/// twice leaves only the second snapshot.
#[async_trait]
pub trait Storer<R: Resource>: Send + Sync {
    async fn store(&self, resource: &R) -> Result<()>;

    /// Returns [`Error::ResourceNotFound`](crate::Error::ResourceNotFound) when
    /// nothing was stored under the resource's id.
    async fn delete_resource(&self, resource: &R) -> Result<()>;

    async fn get_resource(&self, id: &str) -> Result<R>;

    async fn list_all_resources(&self) -> Result<Vec<R>>;

    /// Unknown ids are skipped.
    async fn list_resources_by_ids(&self, ids: &[String]) -> Result<Vec<R>>;

    async fn find_typed_by_predicate_in_project(
        &self,
        resource_type: ResourceType,
        project_id: &str,
        predicate: Predicate<'_, R>,
    ) -> Result<Vec<R>>;
}

/// Derived full-text index over the stored resources.
pub trait Searcher<R: Resource>: Send + Sync {
    /// Replaces any previous document with the same id.
    fn index(&self, resource: &R) -> Result<()>;

    fn deindex(&self, resource: &R) -> Result<()>;

    /// Indexes many resources at once and returns how many made it in.
    /// Failures on single resources are logged and skipped.
    fn index_all(&self, resources: &[R]) -> Result<usize> {
        let mut indexed = 0;
        for resource in resources {
            match self.index(resource) {
                Ok(()) => indexed += 1,
                Err(e) => warn!(
                    resource_id = %resource.id(),
                    error = %e,
                    "failed to index resource"
                ),
            }
        }
        Ok(indexed)
    }

    /// Ids matching `query`. A blank query matches nothing.
    fn search(&self, query: &str) -> Result<SetOfIds>;
}

/// One log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub line: String,
}

/// Source of logs for resources that support it.
#[async_trait]
pub trait Monitorer<R: Resource>: Send + Sync {
    /// Empty, not an error, when the resource cannot produce logs.
    async fn logs(&self, resource: &R) -> Result<Vec<LogEntry>>;
}
