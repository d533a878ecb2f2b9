//! Registry, databases, Kubernetes and virtual machines

use super::{non_empty, with_status};
use chrono::{DateTime, Utc};
use cloudsweep_core::{Locality, Metadata, ObservabilityMetadata, ResourceType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryNamespace {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub description: String,
    pub status: String,
    pub endpoint: String,
    pub is_public: bool,
    pub image_count: u32,
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub region: String,
}

impl RegistryNamespace {
    pub fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new(
            &self.id,
            &self.name,
            ResourceType::RegistryNamespace,
            Locality::region(&self.region),
        )
        .with_project(&self.project_id)
        .with_created_at(self.created_at);
        meta.description = non_empty(&self.description);
        with_status(meta, &self.status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RdbInstance {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub status: String,
    pub engine: String,
    pub node_type: String,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub region: String,
}

impl RdbInstance {
    pub fn metadata(&self) -> Metadata {
        let meta = Metadata::new(
            &self.id,
            &self.name,
            ResourceType::RdbInstance,
            Locality::region(&self.region),
        )
        .with_project(&self.project_id)
        .with_tags(self.tags.clone())
        .with_created_at(self.created_at);
        with_status(meta, &self.status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KapsuleCluster {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub status: String,
    pub description: String,
    pub version: String,
    pub cni: String,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub region: String,
}

impl KapsuleCluster {
    pub fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new(
            &self.id,
            &self.name,
            ResourceType::KapsuleCluster,
            Locality::region(&self.region),
        )
        .with_project(&self.project_id)
        .with_tags(self.tags.clone())
        .with_created_at(self.created_at);
        meta.description = non_empty(&self.description);
        with_status(meta, &self.status)
    }

    pub fn observability(&self) -> ObservabilityMetadata {
        ObservabilityMetadata::by_name("kubernetes_cluster", &self.name)
    }
}

/// A virtual machine. The Instance API names a few fields differently from
/// the other products.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instance {
    pub id: String,
    pub name: String,
    #[serde(alias = "project")]
    pub project_id: String,
    #[serde(alias = "state")]
    pub status: String,
    pub commercial_type: String,
    pub tags: Vec<String>,
    #[serde(alias = "creation_date")]
    pub created_at: Option<DateTime<Utc>>,
    pub zone: String,
}

impl Instance {
    pub fn metadata(&self) -> Metadata {
        let meta = Metadata::new(
            &self.id,
            &self.name,
            ResourceType::Instance,
            Locality::zone(&self.zone),
        )
        .with_project(&self.project_id)
        .with_tags(self.tags.clone())
        .with_created_at(self.created_at);
        with_status(meta, &self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_instance_from_api_names() {
        let server: Instance = serde_json::from_value(json!({
            "id": "srv-1",
            "name": "web-1",
            "project": "p-1",
            "organization": "org-1",
            "state": "running",
            "commercial_type": "DEV1-S",
            "tags": ["prod", "web"],
            "creation_date": "2024-03-01T12:00:00+00:00",
            "zone": "fr-par-2"
        }))
        .unwrap();

        let meta = server.metadata();
        assert_eq!(meta.project_id, "p-1");
        assert_eq!(meta.status.unwrap().as_str(), "running");
        assert_eq!(meta.tags, vec!["prod", "web"]);
        assert_eq!(meta.locality, Locality::zone("fr-par-2"));
        assert!(meta.created_at.is_some());
    }

    #[test]
    fn test_rdb_instance_is_regional() {
        let db = RdbInstance {
            id: "db-1".into(),
            name: "orders".into(),
            region: "pl-waw".into(),
            ..Default::default()
        };
        let meta = db.metadata();
        assert_eq!(meta.locality, Locality::region("pl-waw"));
        assert_eq!(meta.status, None);
    }

    #[test]
    fn test_kapsule_logs_by_cluster_name() {
        let cluster = KapsuleCluster {
            id: "k8s-1".into(),
            name: "prod-cluster".into(),
            ..Default::default()
        };
        let obs = cluster.observability();
        assert_eq!(obs.resource_type, "kubernetes_cluster");
        assert_eq!(obs.resource_name, "prod-cluster");
    }
}
