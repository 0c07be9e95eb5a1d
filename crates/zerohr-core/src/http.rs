//! reqwest-backed [`TaskBackend`] talking to the ZeroHR HTTP API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{BackendError, TaskBackend};
use crate::config::Config;
use crate::types::{FinalizeReport, ResetOptions, StatusReport, TaskId};

#[derive(Serialize)]
struct StartRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct StartResponse {
    #[serde(default)]
    task_id: Option<Value>,
}

/// HTTP client for the task endpoints.
///
/// All calls share one [`Client`] with a cookie store, so session cookies set by
/// the backend are sent back on every subsequent request.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a backend from the resolved configuration.
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(&config.base_url, client))
    }

    /// Use an existing client (tests, custom TLS setups).
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL for `prefix/{segment}` with the segment percent-encoded.
    pub(crate) fn url_with_segment(&self, prefix: &str, segment: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            prefix,
            urlencoding::encode(segment)
        )
    }
}

/// Accept the id as a JSON string or number; anything else is "no id".
fn task_id_from(value: Option<Value>) -> Option<TaskId> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(TaskId::new(s)),
        Value::Number(n) => Some(TaskId::new(n.to_string())),
        _ => None,
    }
}

#[async_trait]
impl TaskBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.base_url
    }

    async fn start_task(&self, question: &str) -> Result<TaskId, BackendError> {
        let resp = self
            .client
            .post(self.url("/main"))
            .json(&StartRequest { question })
            .send()
            .await?
            .error_for_status()?;

        let body: StartResponse = resp.json().await?;
        task_id_from(body.task_id).ok_or(BackendError::MissingTaskId)
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<StatusReport, BackendError> {
        let resp = self
            .client
            .get(self.url_with_segment("/task_status", task_id.as_str()))
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json().await?)
    }

    async fn finalize(&self, task_id: &TaskId) -> Result<FinalizeReport, BackendError> {
        let resp = self
            .client
            .post(self.url_with_segment("/finalize", task_id.as_str()))
            .send()
            .await?
            .error_for_status()?;

        // The body is informational only; an unreadable one still counts as sent.
        let report = match resp.bytes().await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(e) => {
                log::debug!("finalize {task_id}: unreadable body: {e}");
                FinalizeReport::default()
            }
        };
        Ok(report)
    }

    async fn reset(&self, options: &ResetOptions) -> Result<(), BackendError> {
        self.client
            .post(self.url("/admin/reset"))
            .json(options)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
