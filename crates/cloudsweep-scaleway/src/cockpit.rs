//! Logs from Cockpit, Scaleway's hosted Loki
//!
//! Every project has its own Loki endpoint. Reading it needs a Cockpit token
//! whose secret is only returned at creation, so the monitor creates one per
//! project under a fixed name (removing older ones with that name) and keeps
//! endpoint and secret in TTL caches.

use crate::api;
use crate::client::{Client, check};
use crate::error::{Result, ScalewayError};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, TimeZone, Utc};
use cloudsweep_core::{LogEntry, Monitorer, ObservabilityMetadata, Resource, TtlCache};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const TOKEN_NAME: &str = "cloudsweep";
const QUERY_LIMIT: u32 = 5000;
const LOOKBACK_HOURS: i64 = 24;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Loki query selecting JSON log lines of one resource and keeping only their
/// `message`.
pub fn build_query(obs: &ObservabilityMetadata) -> String {
    let (label, value) = if obs.resource_id.is_empty() {
        ("resource_name", obs.resource_name.as_str())
    } else {
        ("resource_id", obs.resource_id.as_str())
    };
    format!(
        r#"{{{}="{}", resource_type="{}"}} |~ "^{{.*}}$" | json | line_format "{{{{.message}}}}""#,
        label, value, obs.resource_type
    )
}

#[derive(Deserialize)]
struct QueryResponse {
    data: QueryData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    result_type: String,
    #[serde(default)]
    result: Value,
}

#[derive(Deserialize)]
struct Stream {
    #[serde(default)]
    values: Vec<(String, String)>,
}

/// Flatten a `query_range` answer of type `streams` into log entries, oldest
/// first.
fn parse_streams(response: QueryResponse) -> Result<Vec<LogEntry>> {
    if response.data.result_type != "streams" {
        return Err(ScalewayError::UnexpectedResponse(format!(
            "unexpected Loki result type: {}",
            response.data.result_type
        )));
    }

    let streams: Vec<Stream> = serde_json::from_value(response.data.result)?;
    let mut entries = Vec::new();
    for stream in streams {
        for (ns, line) in stream.values {
            let ns: i64 = ns.parse().map_err(|_| {
                ScalewayError::UnexpectedResponse(format!("invalid Loki timestamp: {}", ns))
            })?;
            entries.push(LogEntry {
                timestamp: Utc.timestamp_nanos(ns),
                line,
            });
        }
    }
    entries.sort_by_key(|e| e.timestamp);
    Ok(entries)
}

pub struct CockpitMonitor {
    client: Client,
    addresses: TtlCache<String, String>,
    tokens: TtlCache<String, String>,
}

impl CockpitMonitor {
    pub fn new(client: Client) -> Self {
        Self::with_ttl(client, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(client: Client, ttl: Duration) -> Self {
        Self {
            client,
            addresses: TtlCache::new(ttl),
            tokens: TtlCache::new(ttl),
        }
    }

    async fn logs_address(&self, project_id: &str) -> Result<String> {
        let key = project_id.to_string();
        if let Some(address) = self.addresses.get(&key) {
            return Ok(address);
        }

        let cockpit = match api::get_cockpit(&self.client, project_id).await {
            Ok(cockpit) => cockpit,
            Err(e) if e.is_not_found() => {
                return Err(ScalewayError::CockpitNotActivated(key));
            }
            Err(e) => return Err(e),
        };
        let address = cockpit
            .logs_url()
            .ok_or_else(|| ScalewayError::CockpitNotActivated(key.clone()))?
            .trim_end_matches('/')
            .to_string();

        self.addresses.insert(key, address.clone());
        Ok(address)
    }

    async fn token_secret(&self, project_id: &str) -> Result<String> {
        let key = project_id.to_string();
        if let Some(secret) = self.tokens.get(&key) {
            return Ok(secret);
        }

        if let Err(e) = self.delete_stale_tokens(project_id).await {
            warn!(project_id, error = %e, "failed to remove old cockpit tokens");
        }

        let token = api::create_cockpit_token(&self.client, project_id, TOKEN_NAME).await?;
        let secret = token.secret_key.ok_or_else(|| {
            ScalewayError::UnexpectedResponse("cockpit token created without a secret key".into())
        })?;
        info!(project_id, token_id = %token.id, "created cockpit token");

        self.tokens.insert(key, secret.clone());
        Ok(secret)
    }

    async fn delete_stale_tokens(&self, project_id: &str) -> Result<()> {
        let tokens = api::list_cockpit_tokens(&self.client, project_id).await?;
        for token in tokens.iter().filter(|t| t.name == TOKEN_NAME) {
            api::delete_cockpit_token(&self.client, &token.id).await?;
            debug!(project_id, token_id = %token.id, "deleted old cockpit token");
        }
        Ok(())
    }

    /// Logs of the last 24 hours for the resource described by `obs`.
    pub async fn query(&self, project_id: &str, obs: &ObservabilityMetadata) -> Result<Vec<LogEntry>> {
        if !obs.can_view_logs {
            return Ok(Vec::new());
        }

        let address = self.logs_address(project_id).await?;
        let secret = self.token_secret(project_id).await?;

        let end: DateTime<Utc> = Utc::now();
        let start = end - ChronoDuration::hours(LOOKBACK_HOURS);
        let query = build_query(obs);
        debug!(project_id, query = %query, "querying cockpit logs");

        let response = self
            .client
            .http()
            .get(format!("{}/loki/api/v1/query_range", address))
            .header("X-Token", &secret)
            .header("X-Datasource", "product")
            .query(&[
                ("query", query),
                ("limit", QUERY_LIMIT.to_string()),
                ("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("end", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ])
            .send()
            .await?;

        let response = match check(response).await {
            Ok(response) => response,
            Err(e) => {
                if matches!(e.status(), Some(401 | 403)) {
                    self.tokens.invalidate(&project_id.to_string());
                }
                return Err(e);
            }
        };

        parse_streams(response.json().await?)
    }
}

#[async_trait]
impl<R: Resource> Monitorer<R> for CockpitMonitor {
    async fn logs(&self, resource: &R) -> cloudsweep_core::Result<Vec<LogEntry>> {
        let obs = resource.observability();
        if !obs.can_view_logs {
            return Ok(Vec::new());
        }
        let project_id = resource.metadata().project_id;
        Ok(self.query(&project_id, &obs).await?)
    }
}
