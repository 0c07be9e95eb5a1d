use thiserror::Error;

pub mod admin;
pub mod backend;
pub mod config;
pub mod controller;
pub mod http;
pub mod state;
pub mod types;

// Re-export for convenience
pub use backend::{BackendError, TaskBackend};
pub use config::{Config, ConfigError};
pub use controller::{ControllerEvent, TaskController, TaskEvent};
pub use http::HttpBackend;
pub use state::{Phase, TaskState};
pub use types::{
    FinalizeOutcome, FinalizeReport, KillMode, ResetOptions, SCORE_MAX, StatusMap, StatusReport,
    TaskId, TaskResult,
};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Enter the details needed for the hiring document.")]
    EmptyRequest,
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Returns true if `question` has nothing but whitespace.
pub fn is_blank(question: &str) -> bool {
    question.trim().is_empty()
}
