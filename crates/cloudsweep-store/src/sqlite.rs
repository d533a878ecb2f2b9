//! SQLite-backed resource cache

use crate::error::{Result, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use cloudsweep_core::{Error, Predicate, Resource, ResourceType, Storer};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS resources (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    project_id TEXT NOT NULL DEFAULT '',
    description TEXT,
    tags TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL,
    locality TEXT NOT NULL,
    locality_kind TEXT NOT NULL,
    data TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_resources_project ON resources(project_id);
CREATE INDEX IF NOT EXISTS idx_resources_type ON resources(type);
"#;

/// Resource cache in a single `resources` table.
///
/// The common metadata is kept in columns for filtering, the full snapshot as
/// JSON in `data`.
pub struct SqliteStore<R> {
    conn: Arc<Mutex<Connection>>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for SqliteStore<R> {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> SqliteStore<R> {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        let store = Self::with_connection(conn)?;

        info!("Opened resource cache at {:?}", path);
        Ok(store)
    }

    /// In-memory database, gone when the store is dropped.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            _resource: PhantomData,
        })
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn upsert(&self, resource: &R) -> std::result::Result<(), Error> {
        let meta = resource.metadata();
        let data = serde_json::to_string(resource).map_err(|source| StoreError::Encode {
            id: meta.id.clone(),
            source,
        })?;

        let conn = self.conn.lock();
        let changed = conn
            .execute(
                r#"
                INSERT INTO resources
                    (id, name, project_id, description, tags, type, locality, locality_kind, data, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    project_id = excluded.project_id,
                    description = excluded.description,
                    tags = excluded.tags,
                    type = excluded.type,
                    locality = excluded.locality,
                    data = excluded.data,
                    updated_at = excluded.updated_at
                WHERE resources.locality_kind = excluded.locality_kind
                "#,
                params![
                    meta.id,
                    meta.name,
                    meta.project_id,
                    meta.description,
                    meta.tags.join(","),
                    meta.resource_type.as_str(),
                    meta.locality.to_string(),
                    meta.locality.kind_str(),
                    data,
                    Utc::now().timestamp(),
                ],
            )
            .map_err(StoreError::from)?;

        if changed == 0 {
            let from: Option<String> = conn
                .query_row(
                    "SELECT locality_kind FROM resources WHERE id = ?1",
                    params![meta.id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::from)?;

            return Err(Error::LocalityChanged {
                id: meta.id,
                from: from.unwrap_or_default(),
                to: meta.locality.kind_str().to_string(),
            });
        }

        debug!(resource_id = %meta.id, "stored resource");
        Ok(())
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<R>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut resources = Vec::new();
        for row in rows {
            let (id, data) = row?;
            resources.push(decode(&id, &data)?);
        }
        Ok(resources)
    }
}

fn decode<R: Resource>(id: &str, data: &str) -> Result<R> {
    serde_json::from_str(data).map_err(|source| StoreError::Decode {
        id: id.to_string(),
        source,
    })
}

#[async_trait]
impl<R: Resource> Storer<R> for SqliteStore<R> {
    async fn store(&self, resource: &R) -> cloudsweep_core::Result<()> {
        self.upsert(resource)
    }

    async fn delete_resource(&self, resource: &R) -> cloudsweep_core::Result<()> {
        let id = resource.id();
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM resources WHERE id = ?1", params![id])
            .map_err(StoreError::from)?;

        if deleted == 0 {
            return Err(Error::ResourceNotFound(id));
        }
        debug!(resource_id = %id, "deleted resource");
        Ok(())
    }

    async fn get_resource(&self, id: &str) -> cloudsweep_core::Result<R> {
        let found = self.query("SELECT id, data FROM resources WHERE id = ?1", params![id])?;
        found
            .into_iter()
            .next()
            .ok_or_else(|| Error::ResourceNotFound(id.to_string()))
    }

    async fn list_all_resources(&self) -> cloudsweep_core::Result<Vec<R>> {
        Ok(self.query("SELECT id, data FROM resources ORDER BY type, name", [])?)
    }

    async fn list_resources_by_ids(&self, ids: &[String]) -> cloudsweep_core::Result<Vec<R>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, data FROM resources WHERE id IN ({}) ORDER BY type, name",
            placeholders
        );
        Ok(self.query(&sql, params_from_iter(ids.iter()))?)
    }

    async fn find_typed_by_predicate_in_project(
        &self,
        resource_type: ResourceType,
        project_id: &str,
        predicate: Predicate<'_, R>,
    ) -> cloudsweep_core::Result<Vec<R>> {
        let candidates = self.query(
            "SELECT id, data FROM resources WHERE type = ?1 AND project_id = ?2 ORDER BY name",
            params![resource_type.as_str(), project_id],
        )?;
        Ok(candidates.into_iter().filter(|r| predicate(r)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsweep_core::Locality;
    use cloudsweep_core::testing::TestResource;
    use tempfile::TempDir;

    fn memory() -> SqliteStore<TestResource> {
        SqliteStore::open_memory().unwrap()
    }

    fn instance(id: &str, name: &str, project_id: &str) -> TestResource {
        TestResource::new(id, name, ResourceType::Instance, Locality::zone("fr-par-1"))
            .in_project(project_id)
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let store = memory();
        let res = instance("i-1", "web", "p-1").with_tags(&["prod", "eu"]);

        store.store(&res).await.unwrap();
        let back: TestResource = store.get_resource("i-1").await.unwrap();
        assert_eq!(back, res);
        assert_eq!(back.tags, vec!["prod", "eu"]);
    }

    #[tokio::test]
    async fn test_upsert_is_last_write_wins() {
        let store = memory();
        store.store(&instance("i-1", "before", "p-1")).await.unwrap();
        store.store(&instance("i-1", "after", "p-1")).await.unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get_resource("i-1").await.unwrap().name, "after");
    }

    #[tokio::test]
    async fn test_locality_kind_cannot_change() {
        let store = memory();
        store.store(&instance("i-1", "web", "p-1")).await.unwrap();

        let moved = TestResource::new("i-1", "web", ResourceType::Instance, Locality::region("fr-par"));
        let err = store.store(&moved).await.unwrap_err();
        assert!(matches!(err, Error::LocalityChanged { ref from, ref to, .. } if from == "zone" && to == "region"));

        // another zone is fine
        let other_zone =
            TestResource::new("i-1", "web", ResourceType::Instance, Locality::zone("fr-par-2"));
        store.store(&other_zone).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = memory();
        let err = store.delete_resource(&instance("ghost", "x", "")).await.unwrap_err();
        assert!(err.is_not_found());

        let err = store.get_resource("ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_by_ids_skips_unknown() {
        let store = memory();
        store.store(&instance("i-1", "a", "p-1")).await.unwrap();
        store.store(&instance("i-2", "b", "p-1")).await.unwrap();

        let found = store
            .list_resources_by_ids(&["i-2".to_string(), "nope".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "i-2");
        assert!(store.list_resources_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_typed_by_predicate_in_project() {
        let store = memory();
        store.store(&instance("i-1", "web-1", "p-1")).await.unwrap();
        store.store(&instance("i-2", "db-1", "p-1")).await.unwrap();
        store.store(&instance("i-3", "web-2", "p-2")).await.unwrap();
        store
            .store(&TestResource::new("c-1", "web", ResourceType::Container, Locality::region("fr-par")).in_project("p-1"))
            .await
            .unwrap();

        let web = store
            .find_typed_by_predicate_in_project(ResourceType::Instance, "p-1", &|r: &TestResource| {
                r.name.starts_with("web")
            })
            .await
            .unwrap();
        assert_eq!(web.len(), 1);
        assert_eq!(web[0].id, "i-1");
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.db");

        {
            let store: SqliteStore<TestResource> = SqliteStore::open(&path).unwrap();
            store.store(&instance("i-1", "web", "p-1")).await.unwrap();
        }

        let store: SqliteStore<TestResource> = SqliteStore::open(&path).unwrap();
        assert_eq!(store.list_all_resources().await.unwrap().len(), 1);
    }
}
