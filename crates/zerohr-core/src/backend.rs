//! The seam between the polling controller and the remote task service.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{FinalizeReport, ResetOptions, StatusReport, TaskId};

/// Errors returned by a [`TaskBackend`], split by whether a retry makes sense.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status}")]
    Status { status: u16 },
    /// The request never produced a response (connection refused, reset, timeout).
    #[error("network error: {0}")]
    Network(String),
    /// A response arrived but its body could not be read as expected.
    #[error("malformed response: {0}")]
    Decode(String),
    /// `POST /main` succeeded without a usable `task_id`.
    #[error("no task_id returned")]
    MissingTaskId,
}

impl BackendError {
    /// Transport and decoding failures are retried by the poll loop; a status
    /// reported by the server is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Decode(_))
    }

    /// HTTP status code, if the server reported one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            BackendError::Status {
                status: status.as_u16(),
            }
        } else if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Network(e.to_string())
        }
    }
}

/// The four calls the task lifecycle needs from the backend.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// `POST /main`: create a task for the given request text.
    async fn start_task(&self, question: &str) -> Result<TaskId, BackendError>;

    /// `GET /task_status/{id}`: current progress or final result.
    async fn task_status(&self, task_id: &TaskId) -> Result<StatusReport, BackendError>;

    /// `POST /finalize/{id}`: release backend resources after the result is consumed.
    async fn finalize(&self, task_id: &TaskId) -> Result<FinalizeReport, BackendError>;

    /// `POST /admin/reset`: abort outstanding work and reseed for the next request.
    async fn reset(&self, options: &ResetOptions) -> Result<(), BackendError>;
}
