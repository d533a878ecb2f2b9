//! Scaleway resource kinds
//!
//! One struct per kind, decoded straight from the API and stored as-is. The
//! closed [`ScalewayResource`] union is what flows through discovery, the
//! store and the search index.

mod account;
mod infra;
mod serverless;

pub use account::{Cockpit, CockpitEndpoints, IamApplication, Project};
pub use infra::{Instance, KapsuleCluster, RdbInstance, RegistryNamespace};
pub use serverless::{
    Container, ContainerNamespace, Function, FunctionNamespace, JobDefinition, JobRun,
};

use cloudsweep_core::{Metadata, ObservabilityMetadata, Resource};
use serde::{Deserialize, Serialize};

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn with_status(meta: Metadata, status: &str) -> Metadata {
    if status.is_empty() {
        meta
    } else {
        meta.with_status(status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ScalewayResource {
    Project(Project),
    IamApplication(IamApplication),
    Cockpit(Cockpit),
    FunctionNamespace(FunctionNamespace),
    Function(Function),
    ContainerNamespace(ContainerNamespace),
    Container(Container),
    RegistryNamespace(RegistryNamespace),
    RdbInstance(RdbInstance),
    KapsuleCluster(KapsuleCluster),
    Instance(Instance),
    JobDefinition(JobDefinition),
    JobRun(JobRun),
}

macro_rules! impl_from_kind {
    ($($kind:ident),* $(,)?) => {
        $(impl From<$kind> for ScalewayResource {
            fn from(value: $kind) -> Self {
                ScalewayResource::$kind(value)
            }
        })*
    };
}

impl_from_kind!(
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
);

impl Resource for ScalewayResource {
    fn metadata(&self) -> Metadata {
        match self {
            ScalewayResource::Project(r) => r.metadata(),
            ScalewayResource::IamApplication(r) => r.metadata(),
            ScalewayResource::Cockpit(r) => r.metadata(),
            ScalewayResource::FunctionNamespace(r) => r.metadata(),
            ScalewayResource::Function(r) => r.metadata(),
            ScalewayResource::ContainerNamespace(r) => r.metadata(),
            ScalewayResource::Container(r) => r.metadata(),
            ScalewayResource::RegistryNamespace(r) => r.metadata(),
            ScalewayResource::RdbInstance(r) => r.metadata(),
            ScalewayResource::KapsuleCluster(r) => r.metadata(),
            ScalewayResource::Instance(r) => r.metadata(),
            ScalewayResource::JobDefinition(r) => r.metadata(),
            ScalewayResource::JobRun(r) => r.metadata(),
        }
    }

    fn observability(&self) -> ObservabilityMetadata {
        match self {
            ScalewayResource::Function(r) => r.observability(),
            ScalewayResource::Container(r) => r.observability(),
            ScalewayResource::KapsuleCluster(r) => r.observability(),
            ScalewayResource::JobRun(r) => r.observability(),
            _ => ObservabilityMetadata::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsweep_core::{Locality, ResourceType};

    #[test]
    fn test_union_round_trips_through_json() {
        let instance = ScalewayResource::from(Instance {
            id: "srv-1".into(),
            name: "web".into(),
            project_id: "p-1".into(),
            status: "running".into(),
            zone: "fr-par-1".into(),
            ..Default::default()
        });

        let json = serde_json::to_value(&instance).unwrap();
        assert_eq!(json["kind"], "instance");

        let back: ScalewayResource = serde_json::from_value(json).unwrap();
        assert_eq!(back, instance);
        let meta = back.metadata();
        assert_eq!(meta.resource_type, ResourceType::Instance);
        assert_eq!(meta.locality, Locality::zone("fr-par-1"));
    }

    #[test]
    fn test_only_some_kinds_have_logs() {
        let project = ScalewayResource::from(Project::default());
        assert!(!project.observability().can_view_logs);

        let run = ScalewayResource::from(JobRun {
            id: "run-1".into(),
            ..Default::default()
        });
        assert!(run.observability().can_view_logs);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" x "), Some("x".to_string()));
    }
}
