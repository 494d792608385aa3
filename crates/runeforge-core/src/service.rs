// HTTP client for the local companion service.
//
// `LocalService` is the seam between the client and the service's request
// endpoints; `HttpService` is the reqwest implementation used at runtime and
// tests substitute an in-memory one.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::tier_list::TierList;

pub const IMPORT_RUNES_PATH: &str = "/import-runes";
pub const IMPORT_ITEMS_PATH: &str = "/import-items";
pub const TIER_LIST_PATH: &str = "/tier-list";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request to {path} failed: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} answered with status {status}")]
    Status { path: String, status: u16 },
}

/// What the service answered to a POST. The body is only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: String,
}

impl ServiceResponse {
    pub fn is_success(&self) -> bool {
        is_success_status(self.status)
    }
}

/// Whether an HTTP status means the service accepted the request.
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait]
pub trait LocalService: Send + Sync {
    /// POST a JSON body. Any status is a response, not an error.
    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<ServiceResponse, ServiceError>;

    /// GET the tier list.
    async fn fetch_tier_list(&self) -> Result<TierList, ServiceError>;
}

// ---------------------------------------------------------------------------
// HttpService
// ---------------------------------------------------------------------------

pub struct HttpService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpService {
    /// Create a client for the service rooted at `base_url`
    /// (e.g. `http://127.0.0.1:4246`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ServiceError::Http {
                path: String::new(),
                source,
            })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl LocalService for HttpService {
    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<ServiceResponse, ServiceError> {
        let http_err = |source| ServiceError::Http {
            path: path.to_string(),
            source,
        };

        debug!("POST {}", self.url(path));
        let response = self
            .http
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(http_err)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(http_err)?;
        Ok(ServiceResponse { status, body })
    }

    async fn fetch_tier_list(&self) -> Result<TierList, ServiceError> {
        let http_err = |source| ServiceError::Http {
            path: TIER_LIST_PATH.to_string(),
            source,
        };

        debug!("GET {}", self.url(TIER_LIST_PATH));
        let response = self
            .http
            .get(self.url(TIER_LIST_PATH))
            .send()
            .await
            .map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                path: TIER_LIST_PATH.to_string(),
                status: status.as_u16(),
            });
        }
        response.json::<TierList>().await.map_err(http_err)
    }
}
