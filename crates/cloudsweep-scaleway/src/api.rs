//! Per-product Scaleway API calls

use crate::client::{Client, PageStyle};
use crate::error::{Result, ScalewayError};
use crate::model::{
    Cockpit, Container, ContainerNamespace, Function, FunctionNamespace, IamApplication, Instance,
    JobDefinition, JobRun, KapsuleCluster, Project, RdbInstance, RegistryNamespace,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

fn by_project(project_id: &str) -> Vec<(&'static str, String)> {
    vec![("project_id", project_id.to_string())]
}

// Account

pub async fn list_projects(client: &Client) -> Result<Vec<Project>> {
    let mut query = Vec::new();
    if let Some(org) = client.default_organization_id() {
        query.push(("organization_id", org.to_string()));
    }
    client
        .list_all("account/v3/projects", "projects", &query, PageStyle::PageSize)
        .await
}

pub async fn delete_project(client: &Client, project: &Project) -> Result<()> {
    client
        .delete(&format!("account/v3/projects/{}", project.id), &[])
        .await
}

pub async fn list_iam_applications(client: &Client, organization_id: &str) -> Result<Vec<IamApplication>> {
    client
        .list_all(
            "iam/v1alpha1/applications",
            "applications",
            &[("organization_id", organization_id.to_string())],
            PageStyle::PageSize,
        )
        .await
}

pub async fn delete_iam_application(client: &Client, app: &IamApplication) -> Result<()> {
    client
        .delete(&format!("iam/v1alpha1/applications/{}", app.id), &[])
        .await
}

// Cockpit

pub async fn get_cockpit(client: &Client, project_id: &str) -> Result<Cockpit> {
    client
        .get("cockpit/v1beta1/cockpit", &by_project(project_id))
        .await
}

pub async fn activate_cockpit(client: &Client, project_id: &str) -> Result<Cockpit> {
    client
        .post("cockpit/v1beta1/activate", &json!({ "project_id": project_id }))
        .await
}

pub async fn deactivate_cockpit(client: &Client, project_id: &str) -> Result<Cockpit> {
    client
        .post("cockpit/v1beta1/deactivate", &json!({ "project_id": project_id }))
        .await
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CockpitToken {
    pub id: String,
    pub name: String,
    pub project_id: String,
    /// Only returned when the token is created.
    pub secret_key: Option<String>,
}

#[derive(Serialize)]
struct TokenScopes {
    query_logs: bool,
}

#[derive(Serialize)]
struct CreateToken<'a> {
    project_id: &'a str,
    name: &'a str,
    scopes: TokenScopes,
}

pub async fn list_cockpit_tokens(client: &Client, project_id: &str) -> Result<Vec<CockpitToken>> {
    client
        .list_all(
            "cockpit/v1beta1/tokens",
            "tokens",
            &by_project(project_id),
            PageStyle::PageSize,
        )
        .await
}

/// New token allowed to query logs.
pub async fn create_cockpit_token(client: &Client, project_id: &str, name: &str) -> Result<CockpitToken> {
    let body = CreateToken {
        project_id,
        name,
        scopes: TokenScopes { query_logs: true },
    };
    client.post("cockpit/v1beta1/tokens", &body).await
}

pub async fn delete_cockpit_token(client: &Client, token_id: &str) -> Result<()> {
    client
        .delete(&format!("cockpit/v1beta1/tokens/{}", token_id), &[])
        .await
}

// Serverless Functions

pub async fn list_function_namespaces(
    client: &Client,
    region: &str,
    project_id: &str,
) -> Result<Vec<FunctionNamespace>> {
    client
        .list_all(
            &format!("functions/v1beta1/regions/{}/namespaces", region),
            "namespaces",
            &by_project(project_id),
            PageStyle::PageSize,
        )
        .await
}

pub async fn list_functions(client: &Client, namespace: &FunctionNamespace) -> Result<Vec<Function>> {
    let functions: Vec<Function> = client
        .list_all(
            &format!("functions/v1beta1/regions/{}/functions", namespace.region),
            "functions",
            &[("namespace_id", namespace.id.clone())],
            PageStyle::PageSize,
        )
        .await?;

    Ok(functions
        .into_iter()
        .map(|f| Function {
            namespace: namespace.clone(),
            ..f
        })
        .collect())
}

pub async fn delete_function_namespace(client: &Client, ns: &FunctionNamespace) -> Result<()> {
    client
        .delete(
            &format!("functions/v1beta1/regions/{}/namespaces/{}", ns.region, ns.id),
            &[],
        )
        .await
}

pub async fn delete_function(client: &Client, function: &Function) -> Result<()> {
    client
        .delete(
            &format!("functions/v1beta1/regions/{}/functions/{}", function.region, function.id),
            &[],
        )
        .await
}

// Serverless Containers

pub async fn list_container_namespaces(
    client: &Client,
    region: &str,
    project_id: &str,
) -> Result<Vec<ContainerNamespace>> {
    client
        .list_all(
            &format!("containers/v1beta1/regions/{}/namespaces", region),
            "namespaces",
            &by_project(project_id),
            PageStyle::PageSize,
        )
        .await
}

pub async fn list_containers(client: &Client, namespace: &ContainerNamespace) -> Result<Vec<Container>> {
    let containers: Vec<Container> = client
        .list_all(
            &format!("containers/v1beta1/regions/{}/containers", namespace.region),
            "containers",
            &[("namespace_id", namespace.id.clone())],
            PageStyle::PageSize,
        )
        .await?;

    Ok(containers
        .into_iter()
        .map(|c| Container {
            namespace: namespace.clone(),
            ..c
        })
        .collect())
}

pub async fn delete_container_namespace(client: &Client, ns: &ContainerNamespace) -> Result<()> {
    client
        .delete(
            &format!("containers/v1beta1/regions/{}/namespaces/{}", ns.region, ns.id),
            &[],
        )
        .await
}

pub async fn delete_container(client: &Client, container: &Container) -> Result<()> {
    client
        .delete(
            &format!("containers/v1beta1/regions/{}/containers/{}", container.region, container.id),
            &[],
        )
        .await
}

// Container Registry

pub async fn list_registry_namespaces(
    client: &Client,
    region: &str,
    project_id: &str,
) -> Result<Vec<RegistryNamespace>> {
    client
        .list_all(
            &format!("registry/v1/regions/{}/namespaces", region),
            "namespaces",
            &by_project(project_id),
            PageStyle::PageSize,
        )
        .await
}

pub async fn delete_registry_namespace(client: &Client, ns: &RegistryNamespace) -> Result<()> {
    client
        .delete(
            &format!("registry/v1/regions/{}/namespaces/{}", ns.region, ns.id),
            &[],
        )
        .await
}

// Managed Databases

pub async fn list_rdb_instances(client: &Client, region: &str, project_id: &str) -> Result<Vec<RdbInstance>> {
    client
        .list_all(
            &format!("rdb/v1/regions/{}/instances", region),
            "instances",
            &by_project(project_id),
            PageStyle::PageSize,
        )
        .await
}

pub async fn delete_rdb_instance(client: &Client, instance: &RdbInstance) -> Result<()> {
    client
        .delete(
            &format!("rdb/v1/regions/{}/instances/{}", instance.region, instance.id),
            &[],
        )
        .await
}

// Kapsule

pub async fn list_kapsule_clusters(
    client: &Client,
    region: &str,
    project_id: &str,
) -> Result<Vec<KapsuleCluster>> {
    client
        .list_all(
            &format!("k8s/v1/regions/{}/clusters", region),
            "clusters",
            &by_project(project_id),
            PageStyle::PageSize,
        )
        .await
}

pub async fn delete_kapsule_cluster(client: &Client, cluster: &KapsuleCluster) -> Result<()> {
    client
        .delete(
            &format!("k8s/v1/regions/{}/clusters/{}", cluster.region, cluster.id),
            &[("with_additional_resources", "false".to_string())],
        )
        .await
}

// Instance

pub async fn list_instances(client: &Client, zone: &str, project_id: &str) -> Result<Vec<Instance>> {
    client
        .list_all(
            &format!("instance/v1/zones/{}/servers", zone),
            "servers",
            &[("project", project_id.to_string())],
            PageStyle::PerPage,
        )
        .await
}

pub async fn delete_instance(client: &Client, instance: &Instance) -> Result<()> {
    client
        .delete(
            &format!("instance/v1/zones/{}/servers/{}", instance.zone, instance.id),
            &[],
        )
        .await
}

// Serverless Jobs

pub async fn list_job_definitions(
    client: &Client,
    region: &str,
    project_id: &str,
) -> Result<Vec<JobDefinition>> {
    client
        .list_all(
            &format!("serverless-jobs/v1alpha1/regions/{}/job-definitions", region),
            "job_definitions",
            &by_project(project_id),
            PageStyle::PageSize,
        )
        .await
}

pub async fn list_job_runs(client: &Client, definition: &JobDefinition) -> Result<Vec<JobRun>> {
    let runs: Vec<JobRun> = client
        .list_all(
            &format!("serverless-jobs/v1alpha1/regions/{}/job-runs", definition.region),
            "job_runs",
            &[("job_definition_id", definition.id.clone())],
            PageStyle::PageSize,
        )
        .await?;

    Ok(runs
        .into_iter()
        .map(|run| run.with_definition(definition.clone()))
        .collect())
}

/// Answer of the start call: newer API versions wrap the run in a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum StartedRuns {
    Wrapped { job_runs: Vec<JobRun> },
    Bare(JobRun),
}

pub async fn start_job_definition(client: &Client, definition: &JobDefinition) -> Result<JobRun> {
    let started: StartedRuns = client
        .post(
            &format!(
                "serverless-jobs/v1alpha1/regions/{}/job-definitions/{}/start",
                definition.region, definition.id
            ),
            &json!({}),
        )
        .await?;

    let run = match started {
        StartedRuns::Wrapped { job_runs } => job_runs.into_iter().next().ok_or_else(|| {
            ScalewayError::UnexpectedResponse(format!(
                "starting job definition {} returned no run",
                definition.id
            ))
        })?,
        StartedRuns::Bare(run) => run,
    };
    Ok(run.with_definition(definition.clone()))
}

pub async fn get_job_run(client: &Client, run: &JobRun) -> Result<JobRun> {
    let fresh: JobRun = client
        .get(
            &format!("serverless-jobs/v1alpha1/regions/{}/job-runs/{}", run.region, run.id),
            &[],
        )
        .await?;
    Ok(fresh.with_definition(run.definition.clone()))
}

pub async fn stop_job_run(client: &Client, run: &JobRun) -> Result<JobRun> {
    let stopped: JobRun = client
        .post(
            &format!("serverless-jobs/v1alpha1/regions/{}/job-runs/{}/stop", run.region, run.id),
            &json!({}),
        )
        .await?;
    Ok(stopped.with_definition(run.definition.clone()))
}

pub async fn delete_job_definition(client: &Client, definition: &JobDefinition) -> Result<()> {
    client
        .delete(
            &format!(
                "serverless-jobs/v1alpha1/regions/{}/job-definitions/{}",
                definition.region, definition.id
            ),
            &[],
        )
        .await
}
