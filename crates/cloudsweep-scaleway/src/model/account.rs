//! Account-wide kinds: projects, IAM applications and Cockpit

use super::non_empty;
use chrono::{DateTime, Utc};
use cloudsweep_core::{Locality, Metadata, ResourceType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub organization_id: String,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Project {
    /// A project belongs to itself, so searching its id also finds it.
    pub fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new(&self.id, &self.name, ResourceType::Project, Locality::Global)
            .with_project(&self.id)
            .with_created_at(self.created_at);
        meta.description = non_empty(&self.description);
        meta
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IamApplication {
    pub id: String,
    pub name: String,
    pub organization_id: String,
    pub description: String,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl IamApplication {
    pub fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new(
            &self.id,
            &self.name,
            ResourceType::IamApplication,
            Locality::Global,
        )
        .with_tags(self.tags.clone())
        .with_created_at(self.created_at);
        meta.description = non_empty(&self.description);
        meta
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CockpitEndpoints {
    pub metrics_url: String,
    pub logs_url: String,
    pub alertmanager_url: String,
    pub grafana_url: String,
    pub traces_url: String,
}

/// Observability stack of one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cockpit {
    pub project_id: String,
    pub status: String,
    pub endpoints: Option<CockpitEndpoints>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Cockpit {
    /// The API keys a cockpit by project id, which is already the project's own
    /// id in the store.
    pub fn id(&self) -> String {
        format!("{}/cockpit", self.project_id)
    }

    pub fn logs_url(&self) -> Option<&str> {
        self.endpoints
            .as_ref()
            .map(|e| e.logs_url.as_str())
            .filter(|url| !url.is_empty())
    }

    pub fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new(
            self.id(),
            &self.project_id,
            ResourceType::Cockpit,
            Locality::Global,
        )
        .with_project(&self.project_id)
        .with_created_at(self.created_at);
        if !self.status.is_empty() {
            meta = meta.with_status(self.status.as_str());
        }
        meta
    }
}
