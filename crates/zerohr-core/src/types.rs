//! Wire and domain types shared by the backend client, the controller and the
//! front-ends.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Fixed maximum of the quality score reported by the backend.
pub const SCORE_MAX: u32 = 10;

/// Workflow status the backend reseeds every section with on reset.
pub const DEFAULT_SEED_STATUS: &str = "da_generare";

/// Opaque task identifier issued by `POST /main`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `GET /task_status/{id}`.
///
/// The backend answers with zeroed fields while the task is pending, so every
/// field falls back to its default when missing or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub final_cv: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attempts: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub feedback: String,
}

impl StatusReport {
    /// A non-empty document means the task is complete.
    pub fn is_final(&self) -> bool {
        !self.final_cv.is_empty()
    }

    /// Text shown while the task is still running.
    pub fn progress_text(&self) -> &str {
        if self.feedback.is_empty() {
            "In progress..."
        } else {
            &self.feedback
        }
    }

    /// Convert into a [`TaskResult`] if this report carries the final document.
    pub fn into_result(self) -> Option<TaskResult> {
        if !self.is_final() {
            return None;
        }
        Some(TaskResult {
            document: self.final_cv,
            score: self.score,
            attempts_made: self.attempts,
            feedback: self.feedback,
        })
    }
}

/// The generated document with its validation outcome. Immutable once received.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub document: String,
    pub score: f64,
    pub attempts_made: u32,
    pub feedback: String,
}

impl TaskResult {
    /// Score rendered against the fixed maximum, e.g. `8 / 10`.
    pub fn score_label(&self) -> String {
        format!("{} / {}", self.score, SCORE_MAX)
    }
}

/// Response of `POST /finalize/{id}`. Anything unparseable reads as "not reloaded".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FinalizeReport {
    #[serde(default)]
    pub uvicorn_reloaded: bool,
}

/// How the post-completion cleanup went. Only affects display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    Reloaded,
    Sent,
    Unconfirmed,
}

impl FinalizeOutcome {
    pub fn message(self) -> &'static str {
        match self {
            Self::Reloaded => "Completed. Reset and reload performed.",
            Self::Sent => "Completed. Reset sent.",
            Self::Unconfirmed => "Completed. Reset not confirmed.",
        }
    }
}

/// Whether the backend should stop workers cooperatively or terminate them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KillMode {
    #[default]
    Soft,
    Hard,
}

impl fmt::Display for KillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Soft => f.write_str("soft"),
            Self::Hard => f.write_str("hard"),
        }
    }
}

impl FromStr for KillMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(Self::Soft),
            "hard" => Ok(Self::Hard),
            other => Err(format!("unknown kill mode '{other}' (expected soft or hard)")),
        }
    }
}

/// Section number (as a string key, the way TOML and JSON tables carry it) to status.
pub type StatusMap = BTreeMap<String, String>;

/// Body of `POST /admin/reset`: kill current work, purge queues, flush the
/// result backend and reseed the workflow for the next request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetOptions {
    pub reseed: bool,
    pub status_all: String,
    /// Per-section overrides, keyed by section number ("1", "2", ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_map: Option<StatusMap>,
    pub purge: bool,
    pub flush_backend: bool,
    pub kill_mode: KillMode,
}

impl Default for ResetOptions {
    fn default() -> Self {
        Self {
            reseed: true,
            status_all: DEFAULT_SEED_STATUS.to_string(),
            status_map: None,
            purge: true,
            flush_backend: true,
            kill_mode: KillMode::Soft,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
