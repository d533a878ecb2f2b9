//! In-memory doubles for tests
//!
//! Enabled for this crate's own tests and, through the `testing` feature, for
//! downstream crates.

use crate::backend::{Predicate, Searcher, Storer};
use crate::error::{Error, Result};
use crate::locality::Locality;
use crate::resource::{Metadata, Resource, ResourceType, SetOfIds};
use crate::status::Status;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Minimal resource with just the common fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResource {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub resource_type: ResourceType,
    pub locality: Locality,
    pub status: Option<Status>,
    pub tags: Vec<String>,
}

impl TestResource {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        resource_type: ResourceType,
        locality: Locality,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            project_id: String::new(),
            resource_type,
            locality,
            status: None,
            tags: Vec::new(),
        }
    }

    pub fn in_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<Status>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

impl Resource for TestResource {
    fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new(
            self.id.clone(),
            self.name.clone(),
            self.resource_type,
            self.locality.clone(),
        )
        .with_project(self.project_id.clone())
        .with_tags(self.tags.clone());
        meta.status = self.status.clone();
        meta
    }
}

/// [`Storer`] over a map, with switchable failure.
pub struct MemoryStore<R> {
    resources: Mutex<BTreeMap<String, R>>,
    failing: AtomicBool,
}

impl<R: Resource> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            resources: Mutex::new(BTreeMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.resources.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Store("memory store is failing".into()));
        }
        Ok(())
    }
}

impl<R: Resource> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Resource> Storer<R> for MemoryStore<R> {
    async fn store(&self, resource: &R) -> Result<()> {
        self.check()?;
        let meta = resource.metadata();
        let mut resources = self.resources.lock();

        if let Some(previous) = resources.get(&meta.id) {
            let before = previous.metadata().locality;
            if before.kind_str() != meta.locality.kind_str() {
                return Err(Error::LocalityChanged {
                    id: meta.id,
                    from: before.kind_str().to_string(),
                    to: meta.locality.kind_str().to_string(),
                });
            }
        }

        resources.insert(meta.id, resource.clone());
        Ok(())
    }

    async fn delete_resource(&self, resource: &R) -> Result<()> {
        self.check()?;
        let id = resource.id();
        match self.resources.lock().remove(&id) {
            Some(_) => Ok(()),
            None => Err(Error::ResourceNotFound(id)),
        }
    }

    async fn get_resource(&self, id: &str) -> Result<R> {
        self.check()?;
        self.resources
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::ResourceNotFound(id.to_string()))
    }

    async fn list_all_resources(&self) -> Result<Vec<R>> {
        self.check()?;
        Ok(self.resources.lock().values().cloned().collect())
    }

    async fn list_resources_by_ids(&self, ids: &[String]) -> Result<Vec<R>> {
        self.check()?;
        let resources = self.resources.lock();
        Ok(ids.iter().filter_map(|id| resources.get(id).cloned()).collect())
    }

    async fn find_typed_by_predicate_in_project(
        &self,
        resource_type: ResourceType,
        project_id: &str,
        predicate: Predicate<'_, R>,
    ) -> Result<Vec<R>> {
        self.check()?;
        Ok(self
            .resources
            .lock()
            .values()
            .filter(|r| {
                let meta = r.metadata();
                meta.resource_type == resource_type && meta.project_id == project_id
            })
            .filter(|r| predicate(r))
            .cloned()
            .collect())
    }
}

/// [`Searcher`] doing case-insensitive substring matching on every term.
pub struct MemorySearch<R> {
    documents: Mutex<BTreeMap<String, String>>,
    failing: AtomicBool,
    _resource: std::marker::PhantomData<fn() -> R>,
}

impl<R: Resource> MemorySearch<R> {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(BTreeMap::new()),
            failing: AtomicBool::new(false),
            _resource: std::marker::PhantomData,
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.documents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Search("memory search is failing".into()));
        }
        Ok(())
    }
}

impl<R: Resource> Default for MemorySearch<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> Searcher<R> for MemorySearch<R> {
    fn index(&self, resource: &R) -> Result<()> {
        self.check()?;
        let meta = resource.metadata();
        let haystack = [
            meta.id.as_str(),
            meta.name.as_str(),
            meta.project_id.as_str(),
            meta.resource_type.as_str(),
            meta.tags.join(" ").as_str(),
        ]
        .join(" ")
        .to_lowercase();

        self.documents.lock().insert(meta.id, haystack);
        Ok(())
    }

    fn deindex(&self, resource: &R) -> Result<()> {
        self.check()?;
        self.documents.lock().remove(&resource.id());
        Ok(())
    }

    fn search(&self, query: &str) -> Result<SetOfIds> {
        self.check()?;
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Ok(SetOfIds::new());
        }

        Ok(self
            .documents
            .lock()
            .iter()
            .filter(|(_, haystack)| terms.iter().all(|t| haystack.contains(t.as_str())))
            .map(|(id, _)| id.clone())
            .collect())
    }
}
