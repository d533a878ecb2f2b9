//! Scaleway REST client
//!
//! Thin wrapper over `reqwest`: authentication header, error mapping and
//! pagination. The per-product calls live in [`crate::api`].

use crate::error::{Result, ScalewayError};
use crate::profile::Profile;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const AUTH_HEADER: &str = "X-Auth-Token";
const TOTAL_COUNT_HEADER: &str = "X-Total-Count";
const PAGE_SIZE: u32 = 100;

/// Name of the page size query parameter; the Instance API differs from the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStyle {
    PageSize,
    PerPage,
}

impl PageStyle {
    fn param(self) -> &'static str {
        match self {
            PageStyle::PageSize => "page_size",
            PageStyle::PerPage => "per_page",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
    profile: Profile,
}

impl Client {
    pub fn new(profile: Profile) -> Result<Self> {
        let secret_key = profile.secret_key()?.to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("cloudsweep/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: profile.api_url().trim_end_matches('/').to_string(),
            secret_key,
            profile,
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn default_organization_id(&self) -> Option<&str> {
        self.profile.default_organization_id.as_deref()
    }

    /// Raw HTTP client, for calls to non-API endpoints (log backends).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .http
            .get(self.url(path))
            .header(AUTH_HEADER, &self.secret_key)
            .query(query)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .http
            .post(self.url(path))
            .header(AUTH_HEADER, &self.secret_key)
            .json(body)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn delete(&self, path: &str, query: &[(&str, String)]) -> Result<()> {
        let response = self
            .http
            .delete(self.url(path))
            .header(AUTH_HEADER, &self.secret_key)
            .query(query)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Fetch every page of a list endpoint and return the items under `key`.
    ///
    /// Stops when `total_count` (body or `X-Total-Count` header) items were
    /// collected, or on a short page.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        query: &[(&str, String)],
        style: PageStyle,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let mut params: Vec<(&str, String)> = query.to_vec();
            params.push(("page", page.to_string()));
            params.push((style.param(), PAGE_SIZE.to_string()));

            let response = self
                .http
                .get(self.url(path))
                .header(AUTH_HEADER, &self.secret_key)
                .query(&params)
                .send()
                .await?;
            let response = check(response).await?;

            let header_total = response
                .headers()
                .get(TOTAL_COUNT_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<usize>().ok());
            let mut body: Value = response.json().await?;

            let body_total = body
                .get("total_count")
                .and_then(Value::as_u64)
                .map(|n| n as usize);
            let batch = match body.get_mut(key).map(Value::take) {
                Some(Value::Array(batch)) => batch,
                Some(Value::Null) | None => Vec::new(),
                Some(other) => {
                    return Err(ScalewayError::UnexpectedResponse(format!(
                        "expected an array under '{}' in {}, got {}",
                        key, path, other
                    )));
                }
            };

            let received = batch.len();
            for item in batch {
                items.push(serde_json::from_value(item)?);
            }

            let total = body_total.or(header_total);
            debug!(path, page, received, total = ?total, "listed page");

            let done = match total {
                Some(total) => items.len() >= total,
                None => received < PAGE_SIZE as usize,
            };
            if done || received == 0 {
                return Ok(items);
            }
            page += 1;
        }
    }
}

/// Turn a non-2xx response into [`ScalewayError::Api`], using the API's
/// `message` field when there is one.
pub(crate) async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(text);

    Err(ScalewayError::Api {
        status: status.as_u16(),
        message,
    })
}
