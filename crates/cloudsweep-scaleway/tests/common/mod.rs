//! A scriptable stand-in for the Scaleway API, served by axum on a random port

#![allow(dead_code)]

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use cloudsweep_scaleway::{Client, Profile};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const SECRET: &str = "11111111-2222-3333-4444-555555555555";

/// A request as the fake server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
}

impl Recorded {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: Value,
}

impl Reply {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body,
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: json!({ "message": message, "type": "error" }),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

type Responder = Box<dyn Fn(&Recorded) -> Reply + Send + Sync>;

#[derive(Default)]
struct FakeState {
    routes: Mutex<Vec<(Method, String, Responder)>>,
    requests: Mutex<Vec<Recorded>>,
}

pub struct FakeScaleway {
    state: Arc<FakeState>,
    pub url: String,
}

impl FakeScaleway {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            url: format!("http://{}", addr),
        }
    }

    /// Answer `method path` with `respond`. Later registrations win.
    pub fn on<F>(&self, method: Method, path: &str, respond: F)
    where
        F: Fn(&Recorded) -> Reply + Send + Sync + 'static,
    {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(0, (method, path.to_string(), Box::new(respond)));
    }

    /// Answer with an empty list under `key`.
    pub fn empty(&self, path: &str, key: &str) {
        let key = key.to_string();
        self.on(Method::GET, path, move |_| {
            Reply::json(json!({ key.as_str(): [], "total_count": 0 }))
        });
    }

    pub fn requests(&self, path: &str) -> Vec<Recorded> {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn profile(&self) -> Profile {
        Profile {
            secret_key: Some(SECRET.to_string()),
            default_organization_id: Some("org-1".to_string()),
            api_url: Some(self.url.clone()),
            ..Default::default()
        }
    }

    pub fn client(&self) -> Client {
        Client::new(self.profile()).unwrap()
    }
}

async fn handle(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let request = Recorded {
        method,
        path: uri.path().to_string(),
        query,
        headers,
    };
    state.requests.lock().unwrap().push(request.clone());

    let reply = {
        let routes = state.routes.lock().unwrap();
        routes
            .iter()
            .find(|(m, p, _)| *m == request.method && *p == request.path)
            .map(|(_, _, respond)| respond(&request))
    }
    .unwrap_or_else(|| Reply::error(404, &format!("no route for {}", request.path)));

    let mut response = (
        StatusCode::from_u16(reply.status).unwrap(),
        Json(reply.body),
    )
        .into_response();
    for (name, value) in reply.headers {
        response.headers_mut().insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(&value).unwrap(),
        );
    }
    response
}
