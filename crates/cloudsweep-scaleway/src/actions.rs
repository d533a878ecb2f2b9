//! Delete and named actions
//!
//! Both change the remote account first and then push the outcome through the
//! indexer, so the store and the search index follow.

use crate::api;
use crate::client::Client;
use crate::error::Result;
use crate::model::{JobDefinition, JobRun, Project, ScalewayResource};
use cloudsweep_core::{Action, Error as CoreError, Indexer, Resource, SupervisorRegistry};
use std::sync::Arc;
use tracing::{debug, info};

/// Everything an action needs.
pub struct ActionContext {
    pub client: Client,
    pub indexer: Arc<dyn Indexer<ScalewayResource>>,
    pub supervisors: Arc<SupervisorRegistry<ScalewayResource>>,
}

impl ActionContext {
    pub fn new(
        client: Client,
        indexer: Arc<dyn Indexer<ScalewayResource>>,
        supervisors: Arc<SupervisorRegistry<ScalewayResource>>,
    ) -> Self {
        Self {
            client,
            indexer,
            supervisors,
        }
    }

    /// Poll `run` in the background until it terminates. False if it is
    /// already supervised.
    pub fn supervise(&self, run: JobRun) -> bool {
        let client = self.client.clone();
        let template = run.clone();
        self.supervisors
            .spawn(run.into(), Arc::clone(&self.indexer), move |_run_id| {
                let client = client.clone();
                let template = template.clone();
                async move {
                    let fresh = api::get_job_run(&client, &template).await?;
                    Ok::<_, CoreError>(ScalewayResource::from(fresh))
                }
            })
    }

    async fn index(&self, resource: impl Into<ScalewayResource>) -> Result<()> {
        self.indexer.index(&resource.into()).await?;
        Ok(())
    }
}

impl ScalewayResource {
    /// Delete the resource remotely, then drop it from the index.
    ///
    /// Job runs live and die with their definition, so deleting one does nothing.
    pub async fn delete(&self, ctx: &ActionContext) -> Result<()> {
        let client = &ctx.client;
        match self {
            ScalewayResource::Project(r) => api::delete_project(client, r).await?,
            ScalewayResource::IamApplication(r) => api::delete_iam_application(client, r).await?,
            ScalewayResource::Cockpit(r) => {
                api::deactivate_cockpit(client, &r.project_id).await?;
            }
            ScalewayResource::FunctionNamespace(r) => {
                api::delete_function_namespace(client, r).await?
            }
            ScalewayResource::Function(r) => api::delete_function(client, r).await?,
            ScalewayResource::ContainerNamespace(r) => {
                api::delete_container_namespace(client, r).await?
            }
            ScalewayResource::Container(r) => api::delete_container(client, r).await?,
            ScalewayResource::RegistryNamespace(r) => {
                api::delete_registry_namespace(client, r).await?
            }
            ScalewayResource::RdbInstance(r) => api::delete_rdb_instance(client, r).await?,
            ScalewayResource::KapsuleCluster(r) => api::delete_kapsule_cluster(client, r).await?,
            ScalewayResource::Instance(r) => api::delete_instance(client, r).await?,
            ScalewayResource::JobDefinition(r) => api::delete_job_definition(client, r).await?,
            ScalewayResource::JobRun(r) => {
                debug!(run_id = %r.id, "job runs cannot be deleted, ignoring");
                return Ok(());
            }
        }

        ctx.indexer.deindex(self).await?;
        info!(resource_id = %self.id(), "deleted resource");
        Ok(())
    }

    /// Named actions offered on top of delete.
    pub fn actions(&self) -> Vec<Action<ActionContext>> {
        match self {
            ScalewayResource::JobDefinition(definition) => {
                let definition = definition.clone();
                vec![Action::new("Start", move |ctx: Arc<ActionContext>| {
                    let definition = definition.clone();
                    async move { start_job(&ctx, &definition).await.map_err(CoreError::from) }
                })]
            }
            ScalewayResource::JobRun(run) => {
                let retried = run.definition.clone();
                let mut actions = vec![Action::new("Retry", move |ctx: Arc<ActionContext>| {
                    let definition = retried.clone();
                    async move { start_job(&ctx, &definition).await.map_err(CoreError::from) }
                })];

                let terminal = self.metadata().status.is_some_and(|s| s.is_terminal());
                if !terminal {
                    let run = run.clone();
                    actions.push(Action::new("Cancel", move |ctx: Arc<ActionContext>| {
                        let run = run.clone();
                        async move { cancel_job_run(&ctx, &run).await.map_err(CoreError::from) }
                    }));
                }
                actions
            }
            ScalewayResource::Project(project) => {
                let project = project.clone();
                vec![Action::new("Activate Cockpit", move |ctx: Arc<ActionContext>| {
                    let project = project.clone();
                    async move { activate_cockpit(&ctx, &project).await.map_err(CoreError::from) }
                })]
            }
            _ => Vec::new(),
        }
    }
}

/// Start a run of `definition`, index it and supervise it.
async fn start_job(ctx: &ActionContext, definition: &JobDefinition) -> Result<()> {
    let run = api::start_job_definition(&ctx.client, definition).await?;
    info!(
        job_definition_id = %definition.id,
        run_id = %run.id,
        state = %run.status,
        "started job run"
    );

    ctx.index(run.clone()).await?;
    ctx.supervise(run);
    Ok(())
}

async fn cancel_job_run(ctx: &ActionContext, run: &JobRun) -> Result<()> {
    let stopped = api::stop_job_run(&ctx.client, run).await?;
    info!(run_id = %stopped.id, state = %stopped.status, "stopped job run");
    ctx.index(stopped).await
}

async fn activate_cockpit(ctx: &ActionContext, project: &Project) -> Result<()> {
    let cockpit = api::activate_cockpit(&ctx.client, &project.id).await?;
    info!(project_id = %project.id, status = %cockpit.status, "activated cockpit");
    ctx.index(cockpit).await
}
