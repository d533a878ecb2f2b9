//! Synthetic account for trying cloudsweep without credentials
//!
//! The demo discoverer fabricates a fixed set of projects and resources of
//! every kind and feeds them through the same coordinator as the real one.
//! Output only depends on the locality plan, so two scans produce the same
//! inventory.

use crate::error::ScalewayError;
use crate::locality::SCALEWAY;
use crate::model::{
    Cockpit, CockpitEndpoints, Container, ContainerNamespace, Function, FunctionNamespace,
    IamApplication, Instance, JobDefinition, JobRun, KapsuleCluster, Project, RdbInstance,
    RegistryNamespace, ScalewayResource,
};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use cloudsweep_core::{
    Coordinator, Discoverer, DiscoveryConfig, Error, FetchTask, LocalityPlan, LogEntry, Monitorer,
    Resource,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

const PROJECT_NAMES: [&str; 3] = ["webshop", "data-platform", "sandbox"];
const ADJECTIVES: [&str; 6] = ["brave", "quiet", "rapid", "lucid", "frosty", "gentle"];
const NOUNS: [&str; 6] = ["otter", "falcon", "maple", "comet", "harbor", "pebble"];
const RUN_STATES: [&str; 4] = ["succeeded", "failed", "running", "succeeded"];

type DemoTask = FetchTask<ScalewayResource, ScalewayError>;

fn project_id(index: usize) -> String {
    format!("0d3m0000-0000-4000-8000-{:012}", index + 1)
}

fn name(seed: usize) -> String {
    format!(
        "{}-{}",
        ADJECTIVES[seed % ADJECTIVES.len()],
        NOUNS[(seed / ADJECTIVES.len()) % NOUNS.len()]
    )
}

fn created(seed: usize) -> Option<chrono::DateTime<Utc>> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).single()?;
    Some(base + ChronoDuration::hours(seed as i64 * 7))
}

pub fn demo_projects() -> Vec<Project> {
    PROJECT_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| Project {
            id: project_id(i),
            name: name.to_string(),
            organization_id: "0d3m0000-0000-4000-8000-000000000000".into(),
            description: format!("Demo project {}", name),
            created_at: created(i),
        })
        .collect()
}

fn regional(region: &str, seed: usize) -> Vec<ScalewayResource> {
    let mut out: Vec<ScalewayResource> = Vec::new();

    for (p, project) in demo_projects().iter().enumerate() {
        let seed = seed * 31 + p;
        let pid = &project.id;

        let fn_ns = FunctionNamespace {
            id: format!("fnns-{}-{}", region, p),
            name: format!("functions-{}", project.name),
            project_id: pid.clone(),
            status: "ready".into(),
            description: None,
            region: region.into(),
        };
        for i in 0..2 {
            let fname = name(seed + i);
            out.push(
                Function {
                    id: format!("fn-{}-{}-{}", region, p, i),
                    name: fname.clone(),
                    namespace_id: fn_ns.id.clone(),
                    status: if i == 0 { "ready" } else { "error" }.into(),
                    description: None,
                    domain_name: format!("{}{}.functions.fnc.{}.scw.cloud", fname, p, region),
                    runtime: "python311".into(),
                    region: region.into(),
                    namespace: fn_ns.clone(),
                }
                .into(),
            );
        }
        out.push(fn_ns.into());

        let ct_ns = ContainerNamespace {
            id: format!("ctns-{}-{}", region, p),
            name: format!("containers-{}", project.name),
            project_id: pid.clone(),
            status: "ready".into(),
            description: None,
            region: region.into(),
        };
        let cname = name(seed + 3);
        out.push(
            Container {
                id: format!("ct-{}-{}", region, p),
                name: cname.clone(),
                namespace_id: ct_ns.id.clone(),
                status: "ready".into(),
                description: Some(format!("API for {}", project.name)),
                domain_name: format!("https://{}{}.functions.fnc.{}.scw.cloud", cname, p, region),
                registry_image: format!("rg.{}.scw.cloud/{}/api:latest", region, project.name),
                region: region.into(),
                namespace: ct_ns.clone(),
            }
            .into(),
        );
        out.push(ct_ns.into());

        out.push(
            RegistryNamespace {
                id: format!("rg-{}-{}", region, p),
                name: format!("{}-images", project.name),
                project_id: pid.clone(),
                status: "ready".into(),
                endpoint: format!("rg.{}.scw.cloud/{}-images", region, project.name),
                image_count: (seed % 9) as u32,
                created_at: created(seed),
                region: region.into(),
                ..Default::default()
            }
            .into(),
        );

        if p != 2 {
            out.push(
                RdbInstance {
                    id: format!("rdb-{}-{}", region, p),
                    name: format!("{}-db", project.name),
                    project_id: pid.clone(),
                    status: "ready".into(),
                    engine: "PostgreSQL-15".into(),
                    node_type: "db-dev-s".into(),
                    tags: vec!["demo".into(), project.name.clone()],
                    created_at: created(seed + 1),
                    region: region.into(),
                }
                .into(),
            );
        }

        if p == 1 {
            out.push(
                KapsuleCluster {
                    id: format!("k8s-{}-{}", region, p),
                    name: format!("{}-cluster", project.name),
                    project_id: pid.clone(),
                    status: "ready".into(),
                    version: "1.29.1".into(),
                    cni: "cilium".into(),
                    tags: vec!["demo".into()],
                    created_at: created(seed + 2),
                    region: region.into(),
                    ..Default::default()
                }
                .into(),
            );
        }

        let definition = JobDefinition {
            id: format!("jd-{}-{}", region, p),
            name: format!("nightly-{}", name(seed + 5)),
            project_id: pid.clone(),
            description: "Nightly batch".into(),
            image_uri: "docker.io/library/alpine:latest".into(),
            command: "echo hello".into(),
            cpu_limit: 140,
            memory_limit: 256,
            created_at: created(seed + 4),
            region: region.into(),
        };
        for i in 0..2 {
            out.push(
                JobRun {
                    id: format!("run-{}-{}-{}", region, p, i),
                    job_definition_id: definition.id.clone(),
                    status: RUN_STATES[(seed + i) % RUN_STATES.len()].into(),
                    created_at: created(seed + 10 + i),
                    region: region.into(),
                    ..Default::default()
                }
                .with_definition(definition.clone())
                .into(),
            );
        }
        out.push(definition.into());
    }

    out
}

fn zonal(zone: &str, seed: usize) -> Vec<ScalewayResource> {
    demo_projects()
        .iter()
        .enumerate()
        .filter(|(p, _)| (seed + p) % 2 == 0)
        .map(|(p, project)| {
            Instance {
                id: format!("srv-{}-{}", zone, p),
                name: name(seed * 7 + p),
                project_id: project.id.clone(),
                status: if p == 2 { "stopped" } else { "running" }.into(),
                commercial_type: "DEV1-S".into(),
                tags: vec!["demo".into()],
                created_at: created(seed + p),
                zone: zone.into(),
            }
            .into()
        })
        .collect()
}

fn global() -> Vec<ScalewayResource> {
    let mut out: Vec<ScalewayResource> = demo_projects()
        .iter()
        .take(2)
        .map(|project| {
            Cockpit {
                project_id: project.id.clone(),
                status: "ready".into(),
                endpoints: Some(CockpitEndpoints {
                    logs_url: "https://logs.cockpit.fr-par.scw.cloud".into(),
                    ..Default::default()
                }),
                created_at: project.created_at,
            }
            .into()
        })
        .collect();

    for i in 0..2 {
        out.push(
            IamApplication {
                id: format!("iam-app-{}", i),
                name: format!("ci-{}", name(i + 11)),
                organization_id: "0d3m0000-0000-4000-8000-000000000000".into(),
                description: "Deploys from CI".into(),
                created_at: created(i),
                ..Default::default()
            }
            .into(),
        );
    }
    out
}

/// Fabricated account, scanned like the real one.
pub struct DemoDiscoverer {
    coordinator: Coordinator,
    plan: LocalityPlan,
}

impl DemoDiscoverer {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            coordinator: Coordinator::new(config),
            plan: LocalityPlan::resolve(&SCALEWAY, None, None),
        }
    }

    pub fn with_plan(mut self, plan: LocalityPlan) -> Self {
        self.plan = plan;
        self
    }

    fn tasks(&self) -> Vec<DemoTask> {
        let mut tasks: Vec<DemoTask> =
            vec![FetchTask::new("demo/global", || async { Ok(global()) })];

        for (i, region) in self.plan.regions.iter().enumerate() {
            let region = region.clone();
            tasks.push(FetchTask::new(format!("demo/{}", region), move || {
                let found = regional(&region, i);
                async move { Ok(found) }
            }));
        }
        for (i, zone) in self.plan.zones.iter().enumerate() {
            let zone = zone.clone();
            tasks.push(FetchTask::new(format!("demo/{}", zone), move || {
                let found = zonal(&zone, i);
                async move { Ok(found) }
            }));
        }
        tasks
    }
}

impl Default for DemoDiscoverer {
    fn default() -> Self {
        Self::new(DiscoveryConfig::default())
    }
}

#[async_trait]
impl Discoverer<ScalewayResource> for DemoDiscoverer {
    async fn discover(
        &self,
        cancel: CancellationToken,
        out: mpsc::Sender<ScalewayResource>,
    ) -> cloudsweep_core::Result<()> {
        for project in demo_projects() {
            out.send(project.into())
                .await
                .map_err(|_| Error::StreamClosed)?;
        }
        info!(num_regions = self.plan.regions.len(), num_zones = self.plan.zones.len(), "running demo discovery");
        self.coordinator.run(self.tasks(), cancel, out).await
    }
}

/// Canned log lines for resources that have logs.
#[derive(Debug, Clone, Default)]
pub struct DemoMonitor;

#[async_trait]
impl<R: Resource> Monitorer<R> for DemoMonitor {
    async fn logs(&self, resource: &R) -> cloudsweep_core::Result<Vec<LogEntry>> {
        let obs = resource.observability();
        if !obs.can_view_logs {
            return Ok(Vec::new());
        }

        let start = Utc::now() - ChronoDuration::minutes(30);
        let subject = resource.metadata().name;
        let lines = [
            format!("starting {}", subject),
            "listening on :8080".to_string(),
            "GET /healthz 200 1.2ms".to_string(),
            "GET /api/orders 200 38.4ms".to_string(),
            format!("{} shutting down", subject),
        ];

        Ok(lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| LogEntry {
                timestamp: start + ChronoDuration::minutes(i as i64 * 5),
                line,
            })
            .collect())
    }
}
