//! The shared resource model

use crate::locality::Locality;
use crate::status::Status;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Set of resource ids, as returned by a search.
pub type SetOfIds = HashSet<String>;

/// A discoverable cloud resource.
///
/// Each observation is a full snapshot: a resource is never patched, only
/// replaced by a newer snapshot with the same id.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn metadata(&self) -> Metadata;

    /// How the log collaborator should query logs for this resource, if at all.
    fn observability(&self) -> ObservabilityMetadata {
        ObservabilityMetadata::default()
    }

    fn id(&self) -> String {
        self.metadata().id
    }
}

/// Fields every resource kind exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Provider-assigned, unique across kinds.
    pub id: String,

    pub name: String,

    /// Owning project. Empty for account-wide resources.
    pub project_id: String,

    pub status: Option<Status>,

    pub description: Option<String>,

    pub created_at: Option<DateTime<Utc>>,

    /// Provider order is preserved.
    pub tags: Vec<String>,

    #[serde(rename = "type")]
    pub resource_type: ResourceType,

    pub locality: Locality,
}

impl Metadata {
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
            status: None,
            description: None,
            created_at: None,
            tags: Vec::new(),
            resource_type,
            locality,
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<Status>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Tells the log collaborator how to look up logs for a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityMetadata {
    pub can_view_logs: bool,
    pub resource_name: String,
    pub resource_id: String,
    pub resource_type: String,
}

impl ObservabilityMetadata {
    pub fn by_name(resource_type: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            can_view_logs: true,
            resource_name: resource_name.into(),
            resource_id: String::new(),
            resource_type: resource_type.into(),
        }
    }

    pub fn by_id(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            can_view_logs: true,
            resource_name: String::new(),
            resource_id: resource_id.into(),
            resource_type: resource_type.into(),
        }
    }
}

/// The closed set of resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Project,
    IamApplication,
    Cockpit,
    FunctionNamespace,
    Function,
    ContainerNamespace,
    Container,
    RegistryNamespace,
    RdbInstance,
    KapsuleCluster,
    Instance,
    JobDefinition,
    JobRun,
}

impl ResourceType {
    pub const ALL: [ResourceType; 13] = [
        ResourceType::Project,
        ResourceType::IamApplication,
        ResourceType::Cockpit,
        ResourceType::FunctionNamespace,
        ResourceType::Function,
        ResourceType::ContainerNamespace,
        ResourceType::Container,
        ResourceType::RegistryNamespace,
        ResourceType::RdbInstance,
        ResourceType::KapsuleCluster,
        ResourceType::Instance,
        ResourceType::JobDefinition,
        ResourceType::JobRun,
    ];

    /// Stable key used in the store and in search queries (`type:job_run`).
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Project => "project",
            ResourceType::IamApplication => "iam_application",
            ResourceType::Cockpit => "cockpit",
            ResourceType::FunctionNamespace => "function_namespace",
            ResourceType::Function => "function",
            ResourceType::ContainerNamespace => "container_namespace",
            ResourceType::Container => "container",
            ResourceType::RegistryNamespace => "registry_namespace",
            ResourceType::RdbInstance => "rdb_instance",
            ResourceType::KapsuleCluster => "kapsule_cluster",
            ResourceType::Instance => "instance",
            ResourceType::JobDefinition => "job_definition",
            ResourceType::JobRun => "job_run",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::Project => write!(f, "Project"),
            ResourceType::IamApplication => write!(f, "IAM Application"),
            ResourceType::Cockpit => write!(f, "Cockpit"),
            ResourceType::FunctionNamespace => write!(f, "Function Namespace"),
            ResourceType::Function => write!(f, "Function"),
            ResourceType::ContainerNamespace => write!(f, "Container Namespace"),
            ResourceType::Container => write!(f, "Container"),
            ResourceType::RegistryNamespace => write!(f, "Registry Namespace"),
            ResourceType::RdbInstance => write!(f, "RDB Instance"),
            ResourceType::KapsuleCluster => write!(f, "Kapsule Cluster"),
            ResourceType::Instance => write!(f, "Instance"),
            ResourceType::JobDefinition => write!(f, "Job Definition"),
            ResourceType::JobRun => write!(f, "Job Run"),
        }
    }
}

impl FromStr for ResourceType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| crate::Error::Store(format!("unknown resource type: {}", s)))
    }
}
