//! Maintenance endpoints outside the task lifecycle: kill, seed and workflow
//! inspection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::BackendError;
use crate::http::HttpBackend;
use crate::types::{KillMode, StatusMap};

#[derive(Serialize)]
struct KillRequest {
    mode: KillMode,
}

#[derive(Serialize)]
struct SeedRequest<'a> {
    status_all: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_map: Option<&'a StatusMap>,
}

/// One row of the backend's per-section workflow table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkflowRow {
    pub id: i64,
    pub section: u32,
    pub status: String,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Deserialize)]
struct DebugState {
    #[serde(default)]
    workflow: Vec<WorkflowRow>,
}

impl HttpBackend {
    /// `POST /admin/kill`: revoke running tasks. Returns the backend's stats blob.
    pub async fn kill(&self, mode: KillMode) -> Result<Value, BackendError> {
        let resp = self
            .client()
            .post(self.url("/admin/kill"))
            .json(&KillRequest { mode })
            .send()
            .await?
            .error_for_status()?;
        let body: Value = resp.json().await?;
        Ok(body.get("killed").cloned().unwrap_or(Value::Null))
    }

    /// `POST /admin/seed`: reseed the workflow table without killing anything.
    pub async fn seed(
        &self,
        status_all: &str,
        status_map: Option<&StatusMap>,
    ) -> Result<(), BackendError> {
        self.client()
            .post(self.url("/admin/seed"))
            .json(&SeedRequest {
                status_all,
                status_map,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// `GET /debug/state`: the workflow rows ordered by section.
    pub async fn workflow_state(&self) -> Result<Vec<WorkflowRow>, BackendError> {
        let resp = self
            .client()
            .get(self.url("/debug/state"))
            .send()
            .await?
            .error_for_status()?;
        let state: DebugState = resp.json().await?;
        Ok(state.workflow)
    }
}
