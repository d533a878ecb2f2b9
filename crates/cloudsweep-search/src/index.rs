//! Tantivy-backed resource index

use crate::error::{Result, SearchError};
use cloudsweep_core::{Locality, Metadata, Resource, ResourceType, SetOfIds};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, STORED, STRING, Schema, TEXT, Value};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::debug;

/// One indexing thread is enough for our volumes; tantivy needs at least
/// 15MB of heap per thread.
const WRITER_HEAP_BYTES: usize = 20_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of ids returned by one search.
    pub result_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { result_limit: 1000 }
    }
}

#[derive(Debug, Clone, Copy)]
struct Fields {
    id: Field,
    name: Field,
    project_id: Field,
    project: Field,
    description: Field,
    tags: Field,
    resource_type: Field,
    status: Field,
    region: Field,
    zone: Field,
}

impl Fields {
    fn searchable(&self) -> Vec<Field> {
        vec![
            self.id,
            self.name,
            self.project_id,
            self.project,
            self.description,
            self.tags,
            self.resource_type,
            self.status,
            self.region,
            self.zone,
        ]
    }
}

fn build_schema() -> (Schema, Fields) {
    let mut builder = Schema::builder();
    let fields = Fields {
        id: builder.add_text_field("id", STRING | STORED),
        name: builder.add_text_field("name", TEXT),
        project_id: builder.add_text_field("project_id", TEXT),
        project: builder.add_text_field("project", TEXT),
        description: builder.add_text_field("description", TEXT),
        tags: builder.add_text_field("tags", TEXT),
        resource_type: builder.add_text_field("type", TEXT),
        status: builder.add_text_field("status", TEXT),
        region: builder.add_text_field("region", TEXT),
        zone: builder.add_text_field("zone", TEXT),
    };
    (builder.build(), fields)
}

/// In-memory full-text index of resource metadata.
pub struct SearchIndex {
    index: Index,
    fields: Fields,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    project_names: RwLock<HashMap<String, String>>,
    config: SearchConfig,
}

impl SearchIndex {
    pub fn new(config: SearchConfig) -> Result<Self> {
        if config.result_limit == 0 {
            return Err(SearchError::InvalidConfig(
                "result_limit must be at least 1".into(),
            ));
        }

        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        let writer = index.writer_with_num_threads(1, WRITER_HEAP_BYTES)?;

        Ok(Self {
            index,
            fields,
            reader,
            writer: Mutex::new(writer),
            project_names: RwLock::new(HashMap::new()),
            config,
        })
    }

    /// Project id → name map used to fill the `project` field of documents
    /// indexed from now on.
    pub fn set_project_names(&self, names: HashMap<String, String>) {
        *self.project_names.write() = names;
    }

    /// Replace the document for `meta.id`.
    pub fn index_metadata(&self, meta: &Metadata) -> Result<()> {
        let doc = self.to_document(meta);

        let mut writer = self.writer.lock();
        writer.delete_term(Term::from_field_text(self.fields.id, &meta.id));
        writer.add_document(doc)?;
        writer.commit()?;
        drop(writer);

        self.reader.reload()?;
        debug!(resource_id = %meta.id, "indexed document");
        Ok(())
    }

    /// Replace the documents of every entry with a single commit.
    pub fn index_metadata_batch(&self, metas: &[Metadata]) -> Result<usize> {
        let mut writer = self.writer.lock();
        for meta in metas {
            writer.delete_term(Term::from_field_text(self.fields.id, &meta.id));
            writer.add_document(self.to_document(meta))?;
        }
        writer.commit()?;
        drop(writer);

        self.reader.reload()?;
        debug!(num_documents = metas.len(), "indexed batch");
        Ok(metas.len())
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.delete_term(Term::from_field_text(self.fields.id, id));
        writer.commit()?;
        drop(writer);

        self.reader.reload()?;
        debug!(resource_id = %id, "removed document");
        Ok(())
    }

    /// Ids of documents matching `query`, at most `result_limit` of them.
    ///
    /// Field selectors such as `type:instance` or `region:fr-par` are
    /// supported. Malformed parts of the query are ignored rather than
    /// rejected.
    pub fn query(&self, query: &str) -> Result<SetOfIds> {
        if query.trim().is_empty() {
            return Ok(SetOfIds::new());
        }

        let parser = QueryParser::for_index(&self.index, self.fields.searchable());
        let (parsed, errors) = parser.parse_query_lenient(query);
        if let Some(first_error) = errors.first() {
            debug!(
                error_count = errors.len(),
                first_error = %first_error,
                "lenient query parse produced warnings"
            );
        }

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&*parsed, &TopDocs::with_limit(self.config.result_limit))?;

        let mut ids = SetOfIds::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(id) = doc.get_first(self.fields.id).and_then(|v| v.as_str()) {
                ids.insert(id.to_string());
            }
        }
        Ok(ids)
    }

    /// Number of searchable documents.
    pub fn len(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn to_document(&self, meta: &Metadata) -> TantivyDocument {
        let f = &self.fields;
        let mut doc = TantivyDocument::new();

        doc.add_text(f.id, &meta.id);
        doc.add_text(f.name, &meta.name);
        doc.add_text(f.resource_type, meta.resource_type.as_str());

        // a project is found by its own id like everything it owns
        let project_id = if meta.resource_type == ResourceType::Project {
            meta.id.as_str()
        } else {
            meta.project_id.as_str()
        };
        if !project_id.is_empty() {
            doc.add_text(f.project_id, project_id);
            if let Some(name) = self.project_names.read().get(project_id) {
                doc.add_text(f.project, name);
            }
        }

        if let Some(description) = &meta.description {
            doc.add_text(f.description, description);
        }
        for tag in &meta.tags {
            doc.add_text(f.tags, tag);
        }
        if let Some(status) = &meta.status {
            doc.add_text(f.status, status.as_str());
        }

        match &meta.locality {
            Locality::Region(code) => doc.add_text(f.region, code),
            Locality::Zone(code) => {
                doc.add_text(f.zone, code);
                if let Some(region) = parent_region(code) {
                    doc.add_text(f.region, region);
                }
            }
            Locality::Global => {}
        }

        doc
    }
}

/// `fr-par-1` → `fr-par`.
fn parent_region(zone: &str) -> Option<&str> {
    let (region, suffix) = zone.rsplit_once('-')?;
    if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
        Some(region)
    } else {
        None
    }
}

impl<R: Resource> cloudsweep_core::Searcher<R> for SearchIndex {
    fn index(&self, resource: &R) -> cloudsweep_core::Result<()> {
        Ok(self.index_metadata(&resource.metadata())?)
    }

    fn deindex(&self, resource: &R) -> cloudsweep_core::Result<()> {
        Ok(self.remove(&resource.id())?)
    }

    fn index_all(&self, resources: &[R]) -> cloudsweep_core::Result<usize> {
        let metas: Vec<Metadata> = resources.iter().map(Resource::metadata).collect();
        Ok(self.index_metadata_batch(&metas)?)
    }

    fn search(&self, query: &str) -> cloudsweep_core::Result<SetOfIds> {
        Ok(self.query(query)?)
    }
}
