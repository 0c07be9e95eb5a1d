//! Display state of one task session, driven by [`ControllerEvent`]s.

use crate::CoreError;
use crate::backend::BackendError;
use crate::controller::{ControllerEvent, TaskEvent};
use crate::types::{TaskId, TaskResult};

/// Where the session is in the task lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completing,
    Done,
    CancelledByUser,
    Error,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Submitting => "Submitting...",
            Self::Polling => "Polling...",
            Self::Completing => "Completing...",
            Self::Done => "Done",
            Self::CancelledByUser => "Cancelled",
            Self::Error => "Error",
        }
    }

    /// Phases in which the controller still has a live context to cancel.
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Submitting | Self::Polling)
    }
}

/// Everything the front-ends render about the current task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskState {
    pub phase: Phase,
    pub task_id: Option<TaskId>,
    pub status: String,
    pub result: Option<TaskResult>,
    /// A backend reset requested by a cancel has not answered yet.
    pub reset_pending: bool,
    pub(crate) generation: u64,
}

impl TaskState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Status line text; "Ready" before anything happened.
    pub fn status_text(&self) -> &str {
        if self.status.is_empty() {
            "Ready"
        } else {
            &self.status
        }
    }

    /// Whether a loading indicator should be shown.
    pub fn is_loading(&self) -> bool {
        self.reset_pending || matches!(self.phase, Phase::Submitting | Phase::Polling)
    }

    pub fn can_cancel(&self) -> bool {
        self.phase.is_cancellable()
    }

    /// Show a local validation failure. Task state is untouched.
    pub fn reject(&mut self, error: &CoreError) {
        self.status = error.to_string();
    }

    /// Apply an event. Returns `false` if it came from a stale context and was ignored.
    pub fn apply(&mut self, msg: ControllerEvent) -> bool {
        if msg.opens_generation() {
            if msg.generation < self.generation {
                return false;
            }
            self.generation = msg.generation;
        } else if msg.generation != self.generation {
            log::debug!(
                "dropping stale event from generation {} (current {})",
                msg.generation,
                self.generation
            );
            return false;
        }

        match msg.event {
            TaskEvent::Submitting => {
                self.phase = Phase::Submitting;
                self.task_id = None;
                self.result = None;
                self.reset_pending = false;
                self.status = "Sending request...".into();
            }
            TaskEvent::Started { task_id } => {
                self.phase = Phase::Polling;
                self.task_id = Some(task_id);
                self.status = "Task started. Monitoring progress...".into();
            }
            TaskEvent::StartFailed { error } => {
                self.phase = Phase::Idle;
                self.task_id = None;
                self.status = start_failure_text(&error);
            }
            TaskEvent::Progress { feedback } => {
                self.status = feedback;
            }
            TaskEvent::TransientFailure { .. } => {
                self.status = "Network error during polling".into();
            }
            TaskEvent::PollFailed { error } => {
                self.phase = Phase::Error;
                self.status = match error.status() {
                    Some(code) => format!("Polling error ({code})"),
                    None => format!("Polling error: {error}"),
                };
            }
            TaskEvent::Completed { result } => {
                self.phase = Phase::Completing;
                self.status = if result.feedback.is_empty() {
                    "In progress...".into()
                } else {
                    result.feedback.clone()
                };
                self.result = Some(result);
            }
            TaskEvent::Finalized { outcome } => {
                self.phase = Phase::Done;
                self.status = outcome.message().into();
            }
            TaskEvent::Cancelling { .. } => {
                self.phase = Phase::CancelledByUser;
                self.task_id = None;
                self.reset_pending = true;
                self.status = "Cancelling...".into();
            }
            TaskEvent::Cancelled { task_id, confirmed } => {
                self.reset_pending = false;
                let base = match task_id {
                    Some(id) => format!("Task {id} cancelled."),
                    None => "Operation cancelled.".to_string(),
                };
                self.status = if confirmed {
                    base
                } else {
                    format!("{base} Backend reset not confirmed.")
                };
            }
            TaskEvent::Cleared => {
                *self = TaskState {
                    generation: self.generation,
                    ..TaskState::default()
                };
            }
        }
        true
    }
}

fn start_failure_text(error: &BackendError) -> String {
    match error {
        BackendError::Status { status } => format!("Failed to start task ({status})"),
        BackendError::MissingTaskId => "No task_id returned".into(),
        BackendError::Network(_) | BackendError::Decode(_) => "Failed to start task".into(),
    }
}
