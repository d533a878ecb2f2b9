//! Serverless kinds: functions, containers and jobs

use super::{non_empty, with_status};
use chrono::{DateTime, Utc};
use cloudsweep_core::{Locality, Metadata, ObservabilityMetadata, ResourceType};
use serde::{Deserialize, Serialize};

/// `https://myfunc-abc123.functions.fnc.fr-par.scw.cloud` → `myfunc-abc123`,
/// the name logs are labelled with.
fn serverless_name(domain_name: &str) -> String {
    domain_name
        .trim_start_matches("https://")
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionNamespace {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub status: String,
    pub description: Option<String>,
    pub region: String,
}

impl FunctionNamespace {
    pub fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new(
            &self.id,
            &self.name,
            ResourceType::FunctionNamespace,
            Locality::region(&self.region),
        )
        .with_project(&self.project_id);
        meta.description = self.description.as_deref().and_then(non_empty);
        with_status(meta, &self.status)
    }
}

/// A function, with the namespace it was listed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Function {
    pub id: String,
    pub name: String,
    pub namespace_id: String,
    pub status: String,
    pub description: Option<String>,
    pub domain_name: String,
    pub runtime: String,
    pub region: String,
    pub namespace: FunctionNamespace,
}

impl Function {
    pub fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new(
            &self.id,
            &self.name,
            ResourceType::Function,
            Locality::region(&self.region),
        )
        .with_project(&self.namespace.project_id);
        meta.description = self.description.as_deref().and_then(non_empty);
        with_status(meta, &self.status)
    }

    pub fn observability(&self) -> ObservabilityMetadata {
        ObservabilityMetadata::by_name("serverless_function", serverless_name(&self.domain_name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerNamespace {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub status: String,
    pub description: Option<String>,
    pub region: String,
}

impl ContainerNamespace {
    pub fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new(
            &self.id,
            &self.name,
            ResourceType::ContainerNamespace,
            Locality::region(&self.region),
        )
        .with_project(&self.project_id);
        meta.description = self.description.as_deref().and_then(non_empty);
        with_status(meta, &self.status)
    }
}

/// A serverless container, with the namespace it was listed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Container {
    pub id: String,
    pub name: String,
    pub namespace_id: String,
    pub status: String,
    pub description: Option<String>,
    pub domain_name: String,
    pub registry_image: String,
    pub region: String,
    pub namespace: ContainerNamespace,
}

impl Container {
    pub fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new(
            &self.id,
            &self.name,
            ResourceType::Container,
            Locality::region(&self.region),
        )
        .with_project(&self.namespace.project_id);
        meta.description = self.description.as_deref().and_then(non_empty);
        with_status(meta, &self.status)
    }

    pub fn observability(&self) -> ObservabilityMetadata {
        ObservabilityMetadata::by_name("serverless_container", serverless_name(&self.domain_name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDefinition {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub description: String,
    pub image_uri: String,
    pub command: String,
    pub cpu_limit: u32,
    pub memory_limit: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub region: String,
}

impl JobDefinition {
    pub fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new(
            &self.id,
            &self.name,
            ResourceType::JobDefinition,
            Locality::region(&self.region),
        )
        .with_project(&self.project_id)
        .with_created_at(self.created_at);
        meta.description = non_empty(&self.description);
        meta
    }
}

/// One execution of a job definition. Runs are named after their id and
/// owned by their definition's project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRun {
    pub id: String,
    pub job_definition_id: String,
    #[serde(alias = "state")]
    pub status: String,
    pub exit_code: Option<i32>,
    pub error_message: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub terminated_at: Option<DateTime<Utc>>,
    pub region: String,
    pub definition: JobDefinition,
}

impl JobRun {
    pub fn metadata(&self) -> Metadata {
        let mut meta = Metadata::new(
            &self.id,
            &self.id,
            ResourceType::JobRun,
            Locality::region(&self.region),
        )
        .with_project(&self.definition.project_id)
        .with_created_at(self.created_at);
        meta.description = self.error_message.as_deref().and_then(non_empty);
        with_status(meta, &self.status)
    }

    pub fn observability(&self) -> ObservabilityMetadata {
        ObservabilityMetadata::by_id("serverless_job", &self.id)
    }

    pub fn with_definition(mut self, definition: JobDefinition) -> Self {
        self.definition = definition;
        self
    }
}
