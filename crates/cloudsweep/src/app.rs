//! Wiring shared by every subcommand: the cache, the search index and the
//! provider behind them.

use crate::config::AppConfig;
use anyhow::Context;
use cloudsweep_core::{
    Discoverer, DrainSummary, Index, Indexer, Monitorer, Resource, ResourceType, Status, Storer,
    SupervisorRegistry, drain_into_indexer,
};
use cloudsweep_scaleway::{
    ActionContext, Client, CockpitMonitor, DemoDiscoverer, DemoMonitor, ScalewayDiscoverer,
    ScalewayResource, profile,
};
use cloudsweep_search::SearchIndex;
use cloudsweep_store::SqliteStore;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub type Store = SqliteStore<ScalewayResource>;
pub type ResourceIndex = Index<ScalewayResource, Store, SearchIndex>;

/// Where resources come from.
#[derive(Debug, Clone)]
pub enum Source {
    Scaleway { profile: Option<String> },
    Demo,
}

pub struct App {
    config: AppConfig,
    source: Source,
    index: Arc<ResourceIndex>,
    supervisors: Arc<SupervisorRegistry<ScalewayResource>>,
}

impl App {
    /// Opens the cache at `db` and rebuilds the search index from it.
    pub async fn open(config: AppConfig, source: Source, db: PathBuf) -> anyhow::Result<Self> {
        let store = Store::open(&db)
            .with_context(|| format!("failed to open resource cache {}", db.display()))?;
        let search = SearchIndex::new(config.search.clone())?;
        let index = Arc::new(Index::new(Arc::new(store), Arc::new(search)));
        let supervisors = Arc::new(SupervisorRegistry::new(config.supervisor.clone()));

        let app = Self {
            config,
            source,
            index,
            supervisors,
        };
        app.reload_search().await?;
        Ok(app)
    }

    pub fn store(&self) -> &Store {
        self.index.store()
    }

    pub fn search(&self) -> &SearchIndex {
        self.index.search()
    }

    pub fn supervisors(&self) -> &SupervisorRegistry<ScalewayResource> {
        &self.supervisors
    }

    pub fn is_demo(&self) -> bool {
        matches!(self.source, Source::Demo)
    }

    /// Project names from the cache, then every cached resource re-indexed.
    pub async fn reload_search(&self) -> anyhow::Result<usize> {
        let names = self.project_names().await?;
        self.search().set_project_names(names);
        let count = self.index.reindex_from_store().await?;
        debug!(num_resources = count, "rebuilt search index from cache");
        Ok(count)
    }

    /// Project id → name, from the cached projects.
    pub async fn project_names(&self) -> anyhow::Result<HashMap<String, String>> {
        let resources = self.store().list_all_resources().await?;
        Ok(resources
            .iter()
            .map(Resource::metadata)
            .filter(|meta| meta.resource_type == ResourceType::Project)
            .map(|meta| (meta.id, meta.name))
            .collect())
    }

    fn client(&self) -> anyhow::Result<Client> {
        match &self.source {
            Source::Scaleway { profile: name } => {
                let profile = profile::load(name.as_deref())
                    .context("failed to load the Scaleway profile")?;
                Ok(Client::new(profile)?)
            }
            Source::Demo => anyhow::bail!("no Scaleway client in demo mode"),
        }
    }

    fn discoverer(&self) -> anyhow::Result<Box<dyn Discoverer<ScalewayResource>>> {
        let config = self.config.discovery.clone();
        Ok(match self.source {
            Source::Scaleway { .. } => Box::new(ScalewayDiscoverer::new(self.client()?, config)),
            Source::Demo => Box::new(DemoDiscoverer::new(config)),
        })
    }

    pub fn monitor(&self) -> anyhow::Result<Box<dyn Monitorer<ScalewayResource>>> {
        Ok(match self.source {
            Source::Scaleway { .. } => Box::new(CockpitMonitor::new(self.client()?)),
            Source::Demo => Box::new(DemoMonitor),
        })
    }

    pub fn action_context(&self) -> anyhow::Result<Arc<ActionContext>> {
        let indexer: Arc<dyn Indexer<ScalewayResource>> = self.index.clone();
        Ok(Arc::new(ActionContext::new(
            self.client()?,
            indexer,
            Arc::clone(&self.supervisors),
        )))
    }

    /// Discover everything and index it as it arrives.
    pub async fn scan(&self, cancel: CancellationToken) -> anyhow::Result<DrainSummary> {
        let discoverer = self.discoverer()?;
        let (tx, rx) = mpsc::channel(self.config.discovery.output_buffer);

        let consumer = tokio::spawn(drain_into_indexer(
            rx,
            Arc::clone(&self.index),
            cancel.clone(),
        ));
        let discovered = discoverer.discover(cancel, tx).await;
        let drained = consumer.await.context("indexing task panicked")?;

        // a failed consumer closes the stream under the producer, so its error wins
        let summary = match (discovered, drained) {
            (_, Err(e)) | (Err(e), Ok(_)) => return Err(e.into()),
            (Ok(()), Ok(summary)) => summary,
        };

        // resources indexed before their project carry no project name yet
        self.reload_search().await?;
        info!(num_resources = summary.indexed, "scan finished");
        Ok(summary)
    }

    pub async fn get(&self, id: &str) -> anyhow::Result<ScalewayResource> {
        self.store().get_resource(id).await.map_err(|e| {
            if e.is_not_found() {
                anyhow::anyhow!("no resource with id '{}' in the cache, run a scan first", id)
            } else {
                e.into()
            }
        })
    }

    /// Status of the cached snapshot, if the resource is cached and has one.
    pub async fn last_status(&self, id: &str) -> Option<Status> {
        self.store().get_resource(id).await.ok()?.metadata().status
    }

    /// Deletes remotely then locally. Demo resources only leave the cache.
    pub async fn delete(&self, resource: &ScalewayResource) -> anyhow::Result<()> {
        match self.source {
            Source::Demo => self.index.deindex(resource).await?,
            Source::Scaleway { .. } => resource.delete(&*self.action_context()?).await?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn demo_app(dir: &tempfile::TempDir) -> App {
        let mut config = AppConfig::default();
        config.discovery.retry_delay_ms = 0;
        App::open(config, Source::Demo, dir.path().join("demo.db"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_demo_scan_fills_cache_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let app = demo_app(&dir).await;

        let summary = app.scan(CancellationToken::new()).await.unwrap();
        assert!(summary.indexed > 0);
        assert_eq!(summary.inconsistent, 0);
        assert_eq!(app.store().count().unwrap(), summary.indexed);
        assert_eq!(summary.by_type[&ResourceType::Project], 3);

        // project names reach the search index after the scan
        assert!(!app.search().query("project:webshop").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let indexed = {
            let app = demo_app(&dir).await;
            app.scan(CancellationToken::new()).await.unwrap().indexed
        };

        let app = demo_app(&dir).await;
        assert_eq!(app.search().len() as usize, indexed);
        assert_eq!(app.project_names().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_demo_delete_only_touches_cache() {
        let dir = tempfile::tempdir().unwrap();
        let app = demo_app(&dir).await;
        app.scan(CancellationToken::new()).await.unwrap();

        let searchable = app.search().len();
        let victim = app
            .store()
            .list_all_resources()
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.metadata().resource_type == ResourceType::Instance)
            .unwrap();
        app.delete(&victim).await.unwrap();

        assert!(app.get(&victim.id()).await.is_err());
        assert_eq!(app.search().len(), searchable - 1);
    }

    #[tokio::test]
    async fn test_last_status_comes_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let app = demo_app(&dir).await;
        assert_eq!(app.last_status("run-unknown").await, None);

        app.scan(CancellationToken::new()).await.unwrap();
        let run = app
            .store()
            .list_all_resources()
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.metadata().resource_type == ResourceType::JobRun)
            .unwrap();

        let status = app.last_status(&run.id()).await.unwrap();
        assert_eq!(Some(status), run.metadata().status);
        assert_eq!(app.supervisors().wait(&run.id()).await, None);
    }

    #[tokio::test]
    async fn test_cancelled_scan() {
        let dir = tempfile::tempdir().unwrap();
        let app = demo_app(&dir).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = app.scan(cancel).await.unwrap_err();
        let err = err.downcast_ref::<cloudsweep_core::Error>().unwrap();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_no_client_in_demo_mode() {
        let dir = tempfile::tempdir().unwrap();
        let app = demo_app(&dir).await;
        assert!(app.action_context().is_err());
        assert!(app.monitor().is_ok());
    }
}
