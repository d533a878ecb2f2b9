//! Delete, actions and Cockpit logs against a fake Scaleway API

mod common;

use axum::http::Method;
use cloudsweep_core::testing::{MemorySearch, MemoryStore};
use cloudsweep_core::{
    Index, Indexer, Monitorer, Resource, RunOutcome, Searcher, Status, Storer, SupervisorRegistry,
    find_action,
};
use cloudsweep_scaleway::model::{Container, ContainerNamespace, JobDefinition, JobRun, Project};
use cloudsweep_scaleway::{ActionContext, CockpitMonitor, ScalewayResource};
use common::{FakeScaleway, Reply};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

type MemoryIndex =
    Index<ScalewayResource, MemoryStore<ScalewayResource>, MemorySearch<ScalewayResource>>;

struct Harness {
    fake: FakeScaleway,
    index: Arc<MemoryIndex>,
    ctx: Arc<ActionContext>,
}

async fn harness() -> Harness {
    let fake = FakeScaleway::start().await;
    let index: Arc<MemoryIndex> = Arc::new(Index::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemorySearch::new()),
    ));
    let indexer: Arc<dyn Indexer<ScalewayResource>> = index.clone();
    let supervisors = Arc::new(SupervisorRegistry::with_interval(Duration::from_millis(20)));
    let ctx = Arc::new(ActionContext::new(fake.client(), indexer, supervisors));
    Harness { fake, index, ctx }
}

fn definition() -> JobDefinition {
    JobDefinition {
        id: "jd-1".into(),
        name: "nightly".into(),
        project_id: "p-1".into(),
        region: "fr-par".into(),
        ..Default::default()
    }
}

fn run(state: &str) -> JobRun {
    JobRun {
        id: "run-1".into(),
        job_definition_id: "jd-1".into(),
        status: state.into(),
        region: "fr-par".into(),
        ..Default::default()
    }
    .with_definition(definition())
}

fn names(resource: &ScalewayResource) -> Vec<String> {
    resource
        .actions()
        .iter()
        .map(|a| a.name().to_string())
        .collect()
}

#[tokio::test]
async fn test_start_indexes_run_and_supervises_it_to_completion() {
    let h = harness().await;
    h.fake.on(
        Method::POST,
        "/serverless-jobs/v1alpha1/regions/fr-par/job-definitions/jd-1/start",
        |_| Reply::json(json!({ "job_runs": [{ "id": "run-1", "job_definition_id": "jd-1", "state": "queued", "region": "fr-par" }] })),
    );
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&polls);
    h.fake.on(
        Method::GET,
        "/serverless-jobs/v1alpha1/regions/fr-par/job-runs/run-1",
        move |_| {
            let state = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                "running"
            } else {
                "succeeded"
            };
            Reply::json(json!({ "id": "run-1", "job_definition_id": "jd-1", "state": state, "region": "fr-par" }))
        },
    );

    let resource = ScalewayResource::from(definition());
    let actions = resource.actions();
    let start = find_action(&actions, "start").unwrap();
    start.run(Arc::clone(&h.ctx)).await.unwrap();

    let queued = h.index.store().get_resource("run-1").await.unwrap();
    assert_eq!(queued.metadata().project_id, "p-1");
    assert!(h.ctx.supervisors.is_supervising("run-1"));

    let outcome = h.ctx.supervisors.wait("run-1").await;
    assert_eq!(outcome, Some(RunOutcome::Terminal(Status::new("succeeded"))));
    assert_eq!(polls.load(Ordering::SeqCst), 2);

    let done = h.index.store().get_resource("run-1").await.unwrap();
    assert_eq!(done.metadata().status, Some(Status::new("succeeded")));
    assert!(h.ctx.supervisors.active().is_empty());
}

#[tokio::test]
async fn test_cancel_only_offered_for_live_runs() {
    let h = harness().await;
    assert_eq!(names(&run("running").into()), vec!["Retry", "Cancel"]);
    assert_eq!(names(&run("failed").into()), vec!["Retry"]);
    assert_eq!(names(&definition().into()), vec!["Start"]);
    assert_eq!(names(&Project::default().into()), vec!["Activate Cockpit"]);
    assert!(names(&ScalewayResource::from(Container::default())).is_empty());

    h.fake.on(
        Method::POST,
        "/serverless-jobs/v1alpha1/regions/fr-par/job-runs/run-1/stop",
        |_| Reply::json(json!({ "id": "run-1", "job_definition_id": "jd-1", "state": "canceled", "region": "fr-par" })),
    );
    let live: ScalewayResource = run("running").into();
    let actions = live.actions();
    find_action(&actions, "cancel")
        .unwrap()
        .run(Arc::clone(&h.ctx))
        .await
        .unwrap();

    let stopped = h.index.store().get_resource("run-1").await.unwrap();
    assert_eq!(stopped.metadata().status, Some(Status::new("canceled")));
    assert!(matches!(stopped, ScalewayResource::JobRun(ref r) if r.definition.id == "jd-1"));
}

#[tokio::test]
async fn test_activate_cockpit_indexes_it() {
    let h = harness().await;
    h.fake.on(Method::POST, "/cockpit/v1beta1/activate", |_| {
        Reply::json(json!({ "project_id": "p-1", "status": "creating" }))
    });

    let project: ScalewayResource = Project {
        id: "p-1".into(),
        name: "webshop".into(),
        ..Default::default()
    }
    .into();
    let actions = project.actions();
    find_action(&actions, "Activate Cockpit")
        .unwrap()
        .run(Arc::clone(&h.ctx))
        .await
        .unwrap();

    let cockpit = h.index.store().get_resource("p-1/cockpit").await.unwrap();
    assert_eq!(cockpit.metadata().status, Some(Status::new("creating")));
}

#[tokio::test]
async fn test_delete_removes_remote_then_local() {
    let h = harness().await;
    let container: ScalewayResource = Container {
        id: "c-1".into(),
        name: "api".into(),
        region: "fr-par".into(),
        namespace: ContainerNamespace {
            project_id: "p-1".into(),
            ..Default::default()
        },
        ..Default::default()
    }
    .into();
    h.index.index(&container).await.unwrap();
    h.fake.on(Method::DELETE, "/containers/v1beta1/regions/fr-par/containers/c-1", |_| {
        Reply::json(json!({ "id": "c-1", "status": "deleting" }))
    });

    container.delete(&h.ctx).await.unwrap();

    assert_eq!(h.fake.requests("/containers/v1beta1/regions/fr-par/containers/c-1").len(), 1);
    assert!(h.index.store().get_resource("c-1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_failed_remote_delete_keeps_resource() {
    let h = harness().await;
    let container: ScalewayResource = Container {
        id: "c-1".into(),
        region: "fr-par".into(),
        ..Default::default()
    }
    .into();
    h.index.index(&container).await.unwrap();
    h.fake.on(Method::DELETE, "/containers/v1beta1/regions/fr-par/containers/c-1", |_| {
        Reply::error(403, "permission denied")
    });

    let err = container.delete(&h.ctx).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert!(h.index.store().get_resource("c-1").await.is_ok());
}

#[tokio::test]
async fn test_project_with_children_stays_indexed() {
    let h = harness().await;
    let project: ScalewayResource = Project {
        id: "p-1".into(),
        name: "webshop".into(),
        ..Default::default()
    }
    .into();
    h.index.index(&project).await.unwrap();
    h.fake.on(Method::DELETE, "/account/v3/projects/p-1", |_| {
        Reply::error(412, "project still has resources")
    });

    let err = project.delete(&h.ctx).await.unwrap_err();
    assert!(err.to_string().contains("still has resources"));
    assert!(h.index.store().get_resource("p-1").await.is_ok());
    assert!(h.index.search().search("p-1").unwrap().contains("p-1"));
}

#[tokio::test]
async fn test_deleting_a_job_run_is_a_no_op() {
    let h = harness().await;
    let job_run: ScalewayResource = run("succeeded").into();
    h.index.index(&job_run).await.unwrap();

    job_run.delete(&h.ctx).await.unwrap();
    assert!(h.index.store().get_resource("run-1").await.is_ok());
}

fn cockpit_routes(fake: &FakeScaleway) -> Arc<AtomicUsize> {
    let logs_url = fake.url.clone();
    fake.on(Method::GET, "/cockpit/v1beta1/cockpit", move |_| {
        Reply::json(json!({ "project_id": "p-1", "status": "ready", "endpoints": { "logs_url": logs_url.as_str() } }))
    });
    fake.on(Method::GET, "/cockpit/v1beta1/tokens", |_| {
        Reply::json(json!({
            "tokens": [
                { "id": "tok-old", "name": "cloudsweep", "project_id": "p-1" },
                { "id": "tok-other", "name": "grafana", "project_id": "p-1" }
            ],
            "total_count": 2
        }))
    });
    fake.on(Method::DELETE, "/cockpit/v1beta1/tokens/tok-old", |_| Reply::json(json!({})));

    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);
    fake.on(Method::POST, "/cockpit/v1beta1/tokens", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Reply::json(json!({ "id": "tok-new", "name": "cloudsweep", "project_id": "p-1", "secret_key": "s3cr3t" }))
    });
    fake.on(Method::GET, "/loki/api/v1/query_range", |_| {
        Reply::json(json!({
            "status": "success",
            "data": {
                "resultType": "streams",
                "result": [{
                    "stream": { "resource_id": "run-1" },
                    "values": [["1700000001000000000", "hello"], ["1700000002000000000", "bye"]]
                }]
            }
        }))
    });
    created
}

#[tokio::test]
async fn test_cockpit_logs_for_job_run() {
    let fake = FakeScaleway::start().await;
    let created = cockpit_routes(&fake);
    let monitor = CockpitMonitor::new(fake.client());
    let job_run: ScalewayResource = run("succeeded").into();

    let entries = monitor.logs(&job_run).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].line, "hello");

    // address and token come from the cache the second time
    monitor.logs(&job_run).await.unwrap();
    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(fake.requests("/cockpit/v1beta1/cockpit").len(), 1);
    assert_eq!(fake.requests("/cockpit/v1beta1/tokens/tok-old").len(), 1);
    assert!(fake.requests("/cockpit/v1beta1/tokens/tok-other").is_empty());

    let queries = fake.requests("/loki/api/v1/query_range");
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].header("X-Token"), Some("s3cr3t"));
    assert_eq!(queries[0].header("X-Datasource"), Some("product"));
    assert_eq!(queries[0].param("limit"), Some("5000"));
    assert!(queries[0].param("query").unwrap().contains(r#"resource_id="run-1""#));
}

#[tokio::test]
async fn test_no_logs_without_observability() {
    let fake = FakeScaleway::start().await;
    let monitor = CockpitMonitor::new(fake.client());
    let project: ScalewayResource = Project::default().into();

    assert!(monitor.logs(&project).await.unwrap().is_empty());
    assert!(fake.requests("/cockpit/v1beta1/cockpit").is_empty());
}

#[tokio::test]
async fn test_logs_need_an_activated_cockpit() {
    let fake = FakeScaleway::start().await;
    let monitor = CockpitMonitor::new(fake.client());
    let job_run: ScalewayResource = run("running").into();

    let err = monitor.logs(&job_run).await.unwrap_err();
    assert!(err.to_string().contains("not activated"));
}
