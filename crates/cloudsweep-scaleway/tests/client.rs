//! REST client behaviour against a fake Scaleway API

mod common;

use axum::http::Method;
use cloudsweep_core::{Classify, ErrorClass};
use cloudsweep_scaleway::api;
use cloudsweep_scaleway::model::Instance;
use cloudsweep_scaleway::{PageStyle, ScalewayError};
use common::{FakeScaleway, Reply, SECRET};
use serde_json::json;

fn page_of(recorded: &common::Recorded) -> usize {
    recorded.param("page").and_then(|p| p.parse().ok()).unwrap_or(1)
}

#[tokio::test]
async fn test_list_projects_follows_total_count() {
    let fake = FakeScaleway::start().await;
    fake.on(Method::GET, "/account/v3/projects", |req| {
        let page = page_of(req);
        let size: usize = req.param("page_size").unwrap().parse().unwrap();
        let projects: Vec<_> = (0..250)
            .skip((page - 1) * size)
            .take(size)
            .map(|i| json!({ "id": format!("p-{}", i), "name": format!("project-{}", i) }))
            .collect();
        Reply::json(json!({ "projects": projects, "total_count": 250 }))
    });

    let projects = api::list_projects(&fake.client()).await.unwrap();
    assert_eq!(projects.len(), 250);
    assert_eq!(projects[249].id, "p-249");

    let requests = fake.requests("/account/v3/projects");
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].header("X-Auth-Token"), Some(SECRET));
    assert_eq!(requests[0].param("organization_id"), Some("org-1"));
}

#[tokio::test]
async fn test_instances_page_with_per_page_and_header_total() {
    let fake = FakeScaleway::start().await;
    fake.on(Method::GET, "/instance/v1/zones/fr-par-1/servers", |req| {
        let servers = match page_of(req) {
            1 => (0..100)
                .map(|i| json!({ "id": format!("srv-{}", i), "project": "p-1", "state": "running", "zone": "fr-par-1" }))
                .collect::<Vec<_>>(),
            _ => vec![json!({ "id": "srv-100", "project": "p-1", "state": "stopped", "zone": "fr-par-1" })],
        };
        Reply::json(json!({ "servers": servers })).header("X-Total-Count", "101")
    });

    let servers: Vec<Instance> = fake
        .client()
        .list_all(
            "instance/v1/zones/fr-par-1/servers",
            "servers",
            &[("project", "p-1".to_string())],
            PageStyle::PerPage,
        )
        .await
        .unwrap();

    assert_eq!(servers.len(), 101);
    assert_eq!(servers[100].status, "stopped");

    let requests = fake.requests("/instance/v1/zones/fr-par-1/servers");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].param("per_page"), Some("100"));
    assert_eq!(requests[0].param("page_size"), None);
}

#[tokio::test]
async fn test_errors_carry_status_and_message() {
    let fake = FakeScaleway::start().await;
    fake.on(Method::GET, "/rdb/v1/regions/fr-par/instances", |_| {
        Reply::error(429, "quota exceeded, slow down")
    });

    let client = fake.client();
    let err = api::list_rdb_instances(&client, "fr-par", "p-1").await.unwrap_err();
    match &err {
        ScalewayError::Api { status, message } => {
            assert_eq!(*status, 429);
            assert_eq!(message, "quota exceeded, slow down");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.classify(), ErrorClass::Retryable);

    // nothing registered for this path
    let err = api::get_cockpit(&client, "p-1").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.classify(), ErrorClass::Ignorable);
}

#[tokio::test]
async fn test_unreachable_api_is_fatal() {
    let fake = FakeScaleway::start().await;
    let mut profile = fake.profile();
    profile.api_url = Some("http://127.0.0.1:1".into());
    let client = cloudsweep_scaleway::Client::new(profile).unwrap();

    let err = api::list_projects(&client).await.unwrap_err();
    assert!(matches!(err, ScalewayError::Http(_)));
    assert_eq!(err.classify(), ErrorClass::Fatal);
}

#[tokio::test]
async fn test_start_job_accepts_wrapped_and_bare_runs() {
    let fake = FakeScaleway::start().await;
    let definition = cloudsweep_scaleway::model::JobDefinition {
        id: "jd-1".into(),
        name: "nightly".into(),
        project_id: "p-1".into(),
        region: "fr-par".into(),
        ..Default::default()
    };
    let path = "/serverless-jobs/v1alpha1/regions/fr-par/job-definitions/jd-1/start";

    fake.on(Method::POST, path, |_| {
        Reply::json(json!({ "job_runs": [{ "id": "run-1", "state": "queued", "region": "fr-par" }] }))
    });
    let run = api::start_job_definition(&fake.client(), &definition).await.unwrap();
    assert_eq!(run.id, "run-1");
    assert_eq!(run.definition.name, "nightly");

    fake.on(Method::POST, path, |_| {
        Reply::json(json!({ "id": "run-2", "state": "queued", "region": "fr-par" }))
    });
    let run = api::start_job_definition(&fake.client(), &definition).await.unwrap();
    assert_eq!(run.id, "run-2");
}
