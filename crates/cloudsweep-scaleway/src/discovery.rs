//! Scaleway discovery
//!
//! Projects are listed first, since almost every product API is queried per
//! project. The remaining work is split into one fetch task per product and
//! locality: Cockpit and IAM globally, six products per region, Instance per
//! zone. Each task walks every project, and a project whose listing returns
//! 404 is skipped instead of failing the task.

use crate::api;
use crate::client::Client;
use crate::error::{Result, ScalewayError};
use crate::locality::plan_for;
use crate::model::{Project, ScalewayResource};
use async_trait::async_trait;
use cloudsweep_core::{Coordinator, Discoverer, DiscoveryConfig, Error, FetchTask, LocalityPlan};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub type ScalewayTask = FetchTask<ScalewayResource, ScalewayError>;

/// What every fetch task needs: the client and the ids of the projects to walk.
#[derive(Clone)]
struct TaskContext {
    client: Client,
    projects: Arc<Vec<String>>,
}

fn task<F, Fut>(label: String, ctx: &TaskContext, scope: &str, fetch: F) -> ScalewayTask
where
    F: Fn(TaskContext, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<ScalewayResource>>> + Send + 'static,
{
    let ctx = ctx.clone();
    let scope = scope.to_string();
    FetchTask::new(label, move || fetch(ctx.clone(), scope.clone()))
}

/// Treat a vanished project like an empty one.
fn skip_missing<T>(project_id: &str, listed: Result<Vec<T>>) -> Result<Vec<T>> {
    match listed {
        Err(e) if e.is_not_found() => {
            debug!(project_id, "project vanished during listing, skipping");
            Ok(Vec::new())
        }
        other => other,
    }
}

fn into_resources<T: Into<ScalewayResource>>(items: Vec<T>) -> impl Iterator<Item = ScalewayResource> {
    items.into_iter().map(Into::into)
}

pub struct ScalewayDiscoverer {
    client: Client,
    coordinator: Coordinator,
    plan: LocalityPlan,
}

impl ScalewayDiscoverer {
    /// Scans the localities resolved from the client's profile defaults.
    pub fn new(client: Client, config: DiscoveryConfig) -> Self {
        let plan = plan_for(client.profile());
        Self {
            client,
            coordinator: Coordinator::new(config),
            plan,
        }
    }

    pub fn with_plan(mut self, plan: LocalityPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn plan(&self) -> &LocalityPlan {
        &self.plan
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        api::list_projects(&self.client).await
    }

    /// Every fetch task of one scan over `projects`.
    pub fn tasks(&self, projects: &[Project]) -> Vec<ScalewayTask> {
        let ctx = TaskContext {
            client: self.client.clone(),
            projects: Arc::new(projects.iter().map(|p| p.id.clone()).collect()),
        };

        let mut tasks = vec![task("cockpits".into(), &ctx, "global", discover_cockpits)];
        match self.client.default_organization_id() {
            Some(org) => tasks.push(task(
                "iam/applications".into(),
                &ctx,
                org,
                discover_iam_applications,
            )),
            None => info!("no default organization configured, skipping IAM applications"),
        }

        for region in &self.plan.regions {
            tasks.push(task(format!("registry/{}", region), &ctx, region, discover_registry));
            tasks.push(task(format!("containers/{}", region), &ctx, region, discover_containers));
            tasks.push(task(format!("functions/{}", region), &ctx, region, discover_functions));
            tasks.push(task(format!("rdb/{}", region), &ctx, region, discover_rdb));
            tasks.push(task(format!("k8s/{}", region), &ctx, region, discover_kapsule));
            tasks.push(task(format!("jobs/{}", region), &ctx, region, discover_jobs));
        }
        for zone in &self.plan.zones {
            tasks.push(task(format!("instances/{}", zone), &ctx, zone, discover_instances));
        }

        tasks
    }
}

#[async_trait]
impl Discoverer<ScalewayResource> for ScalewayDiscoverer {
    async fn discover(
        &self,
        cancel: CancellationToken,
        out: mpsc::Sender<ScalewayResource>,
    ) -> cloudsweep_core::Result<()> {
        let projects = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            projects = self.list_projects() => projects?,
        };
        info!(num_projects = projects.len(), "listed projects");

        for project in &projects {
            out.send(project.clone().into())
                .await
                .map_err(|_| Error::StreamClosed)?;
        }

        let tasks = self.tasks(&projects);
        self.coordinator.run(tasks, cancel, out).await
    }
}

async fn discover_cockpits(ctx: TaskContext, _scope: String) -> Result<Vec<ScalewayResource>> {
    let mut found = Vec::new();
    for project_id in ctx.projects.iter() {
        match api::get_cockpit(&ctx.client, project_id).await {
            Ok(cockpit) => found.push(cockpit.into()),
            Err(e) if e.is_not_found() => {
                debug!(project_id = %project_id, "no cockpit for project");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(found)
}

async fn discover_iam_applications(ctx: TaskContext, organization_id: String) -> Result<Vec<ScalewayResource>> {
    let apps = api::list_iam_applications(&ctx.client, &organization_id).await?;
    Ok(into_resources(apps).collect())
}

async fn discover_registry(ctx: TaskContext, region: String) -> Result<Vec<ScalewayResource>> {
    let mut found = Vec::new();
    for project_id in ctx.projects.iter() {
        let listed = api::list_registry_namespaces(&ctx.client, &region, project_id).await;
        found.extend(into_resources(skip_missing(project_id, listed)?));
    }
    Ok(found)
}

async fn discover_containers(ctx: TaskContext, region: String) -> Result<Vec<ScalewayResource>> {
    let mut found = Vec::new();
    for project_id in ctx.projects.iter() {
        let listed = api::list_container_namespaces(&ctx.client, &region, project_id).await;
        for namespace in skip_missing(project_id, listed)? {
            let containers = api::list_containers(&ctx.client, &namespace).await;
            let containers = skip_missing(project_id, containers)?;
            found.push(namespace.into());
            found.extend(into_resources(containers));
        }
    }
    Ok(found)
}

async fn discover_functions(ctx: TaskContext, region: String) -> Result<Vec<ScalewayResource>> {
    let mut found = Vec::new();
    for project_id in ctx.projects.iter() {
        let listed = api::list_function_namespaces(&ctx.client, &region, project_id).await;
        for namespace in skip_missing(project_id, listed)? {
            let functions = api::list_functions(&ctx.client, &namespace).await;
            let functions = skip_missing(project_id, functions)?;
            found.push(namespace.into());
            found.extend(into_resources(functions));
        }
    }
    Ok(found)
}

async fn discover_rdb(ctx: TaskContext, region: String) -> Result<Vec<ScalewayResource>> {
    let mut found = Vec::new();
    for project_id in ctx.projects.iter() {
        let listed = api::list_rdb_instances(&ctx.client, &region, project_id).await;
        found.extend(into_resources(skip_missing(project_id, listed)?));
    }
    Ok(found)
}

async fn discover_kapsule(ctx: TaskContext, region: String) -> Result<Vec<ScalewayResource>> {
    let mut found = Vec::new();
    for project_id in ctx.projects.iter() {
        let listed = api::list_kapsule_clusters(&ctx.client, &region, project_id).await;
        found.extend(into_resources(skip_missing(project_id, listed)?));
    }
    Ok(found)
}

async fn discover_jobs(ctx: TaskContext, region: String) -> Result<Vec<ScalewayResource>> {
    let mut found = Vec::new();
    for project_id in ctx.projects.iter() {
        let listed = api::list_job_definitions(&ctx.client, &region, project_id).await;
        for definition in skip_missing(project_id, listed)? {
            let runs = api::list_job_runs(&ctx.client, &definition).await;
            let runs = skip_missing(project_id, runs)?;
            found.push(definition.into());
            found.extend(into_resources(runs));
        }
    }
    Ok(found)
}

async fn discover_instances(ctx: TaskContext, zone: String) -> Result<Vec<ScalewayResource>> {
    let mut found = Vec::new();
    for project_id in ctx.projects.iter() {
        let listed = api::list_instances(&ctx.client, &zone, project_id).await;
        found.extend(into_resources(skip_missing(project_id, listed)?));
    }
    Ok(found)
}
