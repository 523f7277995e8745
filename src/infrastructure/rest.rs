//! REST backend over HTTP
//!
//! Endpoints (relative to `api.base_url`):
//! - `GET    industries/`              list
//! - `POST   industries/`              create `{name, category, parent}`
//! - `PATCH  industries/{id}/`         rename `{name}` or reparent `{parent}`
//! - `POST   industries/{id}/rename/`  legacy rename `{name}`
//! - `DELETE industries/{id}/`         delete (cascades server-side)

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::config::ApiConfig;
use crate::domain::{IndustryNode, NewIndustry, NodeId};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::{BackendError, BackendResult, IndustryBackend};

/// Retry schedule for idempotent reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub attempts: u32,
    /// Delay before the first retry, doubled for each further retry
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }

    fn should_retry(error: &BackendError) -> bool {
        match error {
            BackendError::Transport { .. } => true,
            BackendError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<&ApiConfig> for RetryPolicy {
    fn from(api: &ApiConfig) -> Self {
        Self {
            attempts: api.retry_attempts.max(1),
            backoff: Duration::from_millis(api.retry_backoff_ms),
        }
    }
}

pub struct RestBackend {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl RestBackend {
    pub fn new(api: &ApiConfig) -> InfraResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .map_err(|e| InfraError::Http {
                message: format!("build http client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::from(api),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn send(&self, request: RequestBuilder, what: &str) -> BackendResult<Response> {
        let response = request.send().map_err(|e| BackendError::Transport {
            message: e.to_string(),
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound {
                what: what.to_string(),
            });
        }
        let body = response.text().unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            detail: parse_detail(&body),
        })
    }

    fn with_retry<T>(&self, op: impl Fn() -> BackendResult<T>) -> BackendResult<T> {
        let mut attempt = 1;
        loop {
            match op() {
                Err(e) if attempt < self.retry.attempts && RetryPolicy::should_retry(&e) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!("attempt {} failed ({}), retrying in {:?}", attempt, e, delay);
                    thread::sleep(delay);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn decode<T: serde::de::DeserializeOwned>(response: Response) -> BackendResult<T> {
        response.json::<T>().map_err(|e| BackendError::Decode {
            message: e.to_string(),
        })
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": "..."}`, `{"error": "..."}` and field error maps
/// such as `{"name": ["This field may not be blank."]}`.
pub fn parse_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;
    for key in ["detail", "error", "message"] {
        if let Some(text) = object.get(key).and_then(Value::as_str) {
            return Some(text.to_string());
        }
    }
    object.values().find_map(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(Value::as_str).map(str::to_string),
        _ => None,
    })
}

impl IndustryBackend for RestBackend {
    #[instrument(level = "debug", skip(self))]
    fn list_industries(&self) -> BackendResult<Vec<IndustryNode>> {
        self.with_retry(|| {
            let response = self.send(self.client.get(self.url("industries/")), "industries")?;
            Self::decode(response)
        })
    }

    #[instrument(level = "debug", skip(self))]
    fn create_industry(&self, new: &NewIndustry) -> BackendResult<IndustryNode> {
        let response = self.send(
            self.client.post(self.url("industries/")).json(new),
            "industries",
        )?;
        Self::decode(response)
    }

    #[instrument(level = "debug", skip(self))]
    fn rename_industry(&self, id: NodeId, name: &str) -> BackendResult<IndustryNode> {
        let response = self.send(
            self.client
                .patch(self.url(&format!("industries/{}/", id)))
                .json(&json!({ "name": name })),
            &format!("industry {}", id),
        )?;
        Self::decode(response)
    }

    #[instrument(level = "debug", skip(self))]
    fn rename_industry_legacy(&self, id: NodeId, name: &str) -> BackendResult<IndustryNode> {
        debug!("using legacy rename endpoint for {}", id);
        let response = self.send(
            self.client
                .post(self.url(&format!("industries/{}/rename/", id)))
                .json(&json!({ "name": name })),
            &format!("industry {}", id),
        )?;
        Self::decode(response)
    }

    #[instrument(level = "debug", skip(self))]
    fn delete_industry(&self, id: NodeId) -> BackendResult<()> {
        self.send(
            self.client.delete(self.url(&format!("industries/{}/", id))),
            &format!("industry {}", id),
        )
        .map(|_| ())
    }

    #[instrument(level = "debug", skip(self))]
    fn reparent_industry(&self, id: NodeId, new_parent: Option<NodeId>) -> BackendResult<()> {
        self.send(
            self.client
                .patch(self.url(&format!("industries/{}/", id)))
                .json(&json!({ "parent": new_parent.map(|p| p.0) })),
            &format!("industry {}", id),
        )
        .map(|_| ())
    }
}
