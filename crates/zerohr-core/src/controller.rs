//! Task lifecycle driver: submit, poll, finalize, cancel.
//!
//! A [`TaskController`] owns at most one polling context at a time. Each
//! context runs as a single spawned task that alternates between a status
//! request and one inter-poll sleep, so there is never more than one pending
//! timer. Every context carries a generation number and a
//! [`CancellationToken`]; the token is checked after each suspension point and
//! the generation lets [`TaskState`](crate::TaskState) drop anything a stale
//! context manages to send.
//!
//! Finalize and reset are fire-and-forget: their outcome only feeds a display
//! string and never decides the state of the task.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendError, TaskBackend};
use crate::config::Config;
use crate::types::{FinalizeOutcome, ResetOptions, TaskId, TaskResult};
use crate::{CoreError, is_blank};

/// What happened, as seen by the owner of the task state.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// A new request is being sent.
    Submitting,
    /// The backend accepted the request; polling begins.
    Started { task_id: TaskId },
    /// The request could not be created. No polling follows.
    StartFailed { error: BackendError },
    /// A non-final status arrived.
    Progress { feedback: String },
    /// A poll failed at the transport level; another one is scheduled.
    TransientFailure { error: BackendError },
    /// The server rejected a poll. Polling has stopped.
    PollFailed { error: BackendError },
    /// The final document arrived. Polling has stopped; finalize is in flight.
    Completed { result: TaskResult },
    /// The finalize call returned (or failed).
    Finalized { outcome: FinalizeOutcome },
    /// The user cancelled. Local polling is already stopped.
    Cancelling { task_id: Option<TaskId> },
    /// The backend reset returned (or failed).
    Cancelled {
        task_id: Option<TaskId>,
        confirmed: bool,
    },
    /// The session was reset; all displayed state should be cleared.
    Cleared,
}

/// A [`TaskEvent`] stamped with the generation of the context that sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerEvent {
    pub generation: u64,
    pub event: TaskEvent,
}

impl ControllerEvent {
    /// Events emitted synchronously by the controller when it starts a new generation.
    pub fn opens_generation(&self) -> bool {
        matches!(
            self.event,
            TaskEvent::Submitting | TaskEvent::Cancelling { .. } | TaskEvent::Cleared
        )
    }
}

/// The one polling context that may be alive.
struct ActiveTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    task_id: Arc<OnceLock<TaskId>>,
}

/// Owns the polling context and the channel its events are sent on.
pub struct TaskController {
    backend: Arc<dyn TaskBackend>,
    poll_interval: Duration,
    retry_interval: Duration,
    reset_options: ResetOptions,
    tx: mpsc::UnboundedSender<ControllerEvent>,
    generation: u64,
    active: Option<ActiveTask>,
}

impl TaskController {
    /// Create a controller and the receiver its events arrive on.
    pub fn new(
        backend: Arc<dyn TaskBackend>,
        config: &Config,
    ) -> (Self, mpsc::UnboundedReceiver<ControllerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            backend,
            poll_interval: config.poll_interval,
            retry_interval: config.retry_interval,
            reset_options: config.reset.clone(),
            tx,
            generation: 0,
            active: None,
        };
        (controller, rx)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True while a request is being created or polled.
    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| !a.handle.is_finished())
    }

    /// Id of the task owned by the current context, once the backend issued one.
    pub fn current_task(&self) -> Option<TaskId> {
        self.active.as_ref().and_then(|a| a.task_id.get().cloned())
    }

    /// Start a new task for `question`, invalidating any previous context.
    ///
    /// Blank input is rejected without touching the network. Must be called
    /// from within a Tokio runtime.
    pub fn submit(&mut self, question: &str) -> Result<(), CoreError> {
        if is_blank(question) {
            return Err(CoreError::EmptyRequest);
        }

        self.release();
        let generation = self.next_generation();
        self.emit(generation, TaskEvent::Submitting);

        let cancel = CancellationToken::new();
        let task_id = Arc::new(OnceLock::new());
        let ctx = PollContext {
            backend: self.backend.clone(),
            tx: self.tx.clone(),
            generation,
            cancel: cancel.clone(),
            task_id: task_id.clone(),
            poll_interval: self.poll_interval,
            retry_interval: self.retry_interval,
        };
        let handle = tokio::spawn(ctx.run(question.to_string()));

        self.active = Some(ActiveTask {
            cancel,
            handle,
            task_id,
        });
        Ok(())
    }

    /// Stop polling now and ask the backend to abort its work.
    ///
    /// Returns `false` (and sends nothing) if no request is in progress. The
    /// local loop stops before this returns; the reset call runs detached and
    /// its outcome only changes the final status text.
    pub fn cancel(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }

        let task_id = self.release();
        let generation = self.next_generation();
        self.emit(
            generation,
            TaskEvent::Cancelling {
                task_id: task_id.clone(),
            },
        );
        log::info!(
            "cancelling task {} ({} kill)",
            task_id.as_ref().map_or("<pending>", TaskId::as_str),
            self.reset_options.kill_mode
        );

        let backend = self.backend.clone();
        let options = self.reset_options.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let confirmed = match backend.reset(&options).await {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("{}: reset failed: {e}", backend.name());
                    false
                }
            };
            let _ = tx.send(ControllerEvent {
                generation,
                event: TaskEvent::Cancelled { task_id, confirmed },
            });
        });
        true
    }

    /// Drop the current context and start over with a blank session.
    ///
    /// If a task id is known the backend is told to finalize it; that call is
    /// best-effort and reports nothing back.
    pub fn clear(&mut self) {
        if let Some(task_id) = self.release() {
            let backend = self.backend.clone();
            tokio::spawn(async move {
                if let Err(e) = backend.finalize(&task_id).await {
                    log::warn!("{}: finalize {task_id} on reset failed: {e}", backend.name());
                }
            });
        }
        let generation = self.next_generation();
        self.emit(generation, TaskEvent::Cleared);
    }

    /// Cancel the local context without contacting the backend.
    fn release(&mut self) -> Option<TaskId> {
        let active = self.active.take()?;
        active.cancel.cancel();
        active.handle.abort();
        active.task_id.get().cloned()
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn emit(&self, generation: u64, event: TaskEvent) {
        let _ = self.tx.send(ControllerEvent { generation, event });
    }
}

impl Drop for TaskController {
    fn drop(&mut self) {
        self.release();
    }
}

/// Everything one polling context needs, moved into its task.
struct PollContext {
    backend: Arc<dyn TaskBackend>,
    tx: mpsc::UnboundedSender<ControllerEvent>,
    generation: u64,
    cancel: CancellationToken,
    task_id: Arc<OnceLock<TaskId>>,
    poll_interval: Duration,
    retry_interval: Duration,
}

impl PollContext {
    fn emit(&self, event: TaskEvent) {
        if self.cancel.is_cancelled() {
            return;
        }
        let _ = self.tx.send(ControllerEvent {
            generation: self.generation,
            event,
        });
    }

    async fn run(self, question: String) {
        let started = self.backend.start_task(&question).await;
        if self.cancel.is_cancelled() {
            return;
        }

        let task_id = match started {
            Ok(id) => id,
            Err(error) => {
                log::warn!("{}: failed to start task: {error}", self.backend.name());
                self.emit(TaskEvent::StartFailed { error });
                return;
            }
        };

        let _ = self.task_id.set(task_id.clone());
        log::info!("task {task_id} started");
        self.emit(TaskEvent::Started {
            task_id: task_id.clone(),
        });

        loop {
            let fetched = self.backend.task_status(&task_id).await;
            if self.cancel.is_cancelled() {
                return;
            }

            let delay = match fetched {
                Ok(report) => {
                    let feedback = report.progress_text().to_string();
                    match report.into_result() {
                        Some(result) => {
                            log::info!("task {task_id} complete (score {})", result.score);
                            self.emit(TaskEvent::Completed { result });
                            self.spawn_finalize(task_id);
                            return;
                        }
                        None => {
                            log::debug!("task {task_id}: {feedback}");
                            self.emit(TaskEvent::Progress { feedback });
                            self.poll_interval
                        }
                    }
                }
                Err(error) if error.is_transient() => {
                    log::warn!(
                        "task {task_id}: poll failed ({error}), retrying in {:.1}s",
                        self.retry_interval.as_secs_f64()
                    );
                    self.emit(TaskEvent::TransientFailure { error });
                    self.retry_interval
                }
                Err(error) => {
                    log::warn!("task {task_id}: polling stopped: {error}");
                    self.emit(TaskEvent::PollFailed { error });
                    return;
                }
            };

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn spawn_finalize(&self, task_id: TaskId) {
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let outcome = match backend.finalize(&task_id).await {
                Ok(report) if report.uvicorn_reloaded => FinalizeOutcome::Reloaded,
                Ok(_) => FinalizeOutcome::Sent,
                Err(e) => {
                    log::warn!("{}: finalize {task_id} failed: {e}", backend.name());
                    FinalizeOutcome::Unconfirmed
                }
            };
            let _ = tx.send(ControllerEvent {
                generation,
                event: TaskEvent::Finalized { outcome },
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::state::{Phase, TaskState};
    use crate::types::{FinalizeReport, StatusReport};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Start(String),
        Status(TaskId),
        Finalize(TaskId),
        Reset(ResetOptions),
    }

    /// In-memory backend that replays scripted answers and records every call.
    struct Scripted {
        start: Mutex<Result<TaskId, BackendError>>,
        statuses: Mutex<VecDeque<Result<StatusReport, BackendError>>>,
        finalize: Mutex<Result<FinalizeReport, BackendError>>,
        reset: Mutex<Result<(), BackendError>>,
        /// Simulated latency of each status request.
        status_latency: Duration,
        calls: Mutex<Vec<(Call, Instant)>>,
    }

    impl Scripted {
        fn new() -> Self {
            Self {
                start: Mutex::new(Ok(TaskId::new("abc"))),
                statuses: Mutex::new(VecDeque::new()),
                finalize: Mutex::new(Ok(FinalizeReport::default())),
                reset: Mutex::new(Ok(())),
                status_latency: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_statuses(self, statuses: Vec<Result<StatusReport, BackendError>>) -> Self {
            *self.statuses.lock().unwrap() = statuses.into();
            self
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push((call, Instant::now()));
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
        }

        fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls().iter().filter(|c| pred(c)).count()
        }

        fn status_times(&self) -> Vec<Instant> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(c, _)| matches!(c, Call::Status(_)))
                .map(|(_, t)| *t)
                .collect()
        }
    }

    #[async_trait]
    impl TaskBackend for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn start_task(&self, question: &str) -> Result<TaskId, BackendError> {
            self.record(Call::Start(question.to_string()));
            self.start.lock().unwrap().clone()
        }

        async fn task_status(&self, task_id: &TaskId) -> Result<StatusReport, BackendError> {
            self.record(Call::Status(task_id.clone()));
            if !self.status_latency.is_zero() {
                tokio::time::sleep(self.status_latency).await;
            }
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(pending("still working")))
        }

        async fn finalize(&self, task_id: &TaskId) -> Result<FinalizeReport, BackendError> {
            self.record(Call::Finalize(task_id.clone()));
            self.finalize.lock().unwrap().clone()
        }

        async fn reset(&self, options: &ResetOptions) -> Result<(), BackendError> {
            self.record(Call::Reset(options.clone()));
            self.reset.lock().unwrap().clone()
        }
    }

    fn pending(feedback: &str) -> StatusReport {
        StatusReport {
            feedback: feedback.to_string(),
            ..Default::default()
        }
    }

    fn done(doc: &str, score: f64, feedback: &str) -> StatusReport {
        StatusReport {
            final_cv: doc.to_string(),
            score,
            attempts: 1,
            feedback: feedback.to_string(),
        }
    }

    fn setup(backend: Scripted) -> (Arc<Scripted>, TaskController, mpsc::UnboundedReceiver<ControllerEvent>) {
        let backend = Arc::new(backend);
        let (controller, rx) = TaskController::new(backend.clone(), &Config::default());
        (backend, controller, rx)
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<ControllerEvent>) -> ControllerEvent {
        tokio::time::timeout(Duration::from_secs(120), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("channel closed")
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<ControllerEvent>) -> TaskEvent {
        next(rx).await.event
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ControllerEvent>) -> Vec<TaskEvent> {
        let mut out = Vec::new();
        while let Ok(e) = rx.try_recv() {
            out.push(e.event);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_makes_no_calls() {
        let (backend, mut controller, mut rx) = setup(Scripted::new());

        for input in ["", "   ", "\n\t "] {
            assert!(matches!(controller.submit(input), Err(CoreError::EmptyRequest)));
        }
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(backend.calls().is_empty());
        assert!(drain(&mut rx).is_empty());
        assert!(!controller.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn happy_path_polls_until_document_then_finalizes_once() {
        let (backend, mut controller, mut rx) = setup(Scripted::new().with_statuses(vec![
            Ok(pending("step 1")),
            Ok(done("DOC...", 8.0, "ok")),
        ]));
        let mut state = TaskState::default();

        controller
            .submit("Mario Rossi, Livello 3, RAL 28000")
            .unwrap();

        let mut events = Vec::new();
        loop {
            let e = next(&mut rx).await;
            events.push(e.event.clone());
            state.apply(e);
            if state.phase == Phase::Done {
                break;
            }
        }

        assert_eq!(
            events,
            vec![
                TaskEvent::Submitting,
                TaskEvent::Started {
                    task_id: TaskId::new("abc")
                },
                TaskEvent::Progress {
                    feedback: "step 1".into()
                },
                TaskEvent::Completed {
                    result: TaskResult {
                        document: "DOC...".into(),
                        score: 8.0,
                        attempts_made: 1,
                        feedback: "ok".into(),
                    }
                },
                TaskEvent::Finalized {
                    outcome: FinalizeOutcome::Sent
                },
            ]
        );
        let result = state.result.as_ref().unwrap();
        assert_eq!(result.score_label(), "8 / 10");
        assert_eq!(result.document, "DOC...");

        // Nothing polls that task again.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(
            backend.calls(),
            vec![
                Call::Start("Mario Rossi, Livello 3, RAL 28000".into()),
                Call::Status(TaskId::new("abc")),
                Call::Status(TaskId::new("abc")),
                Call::Finalize(TaskId::new("abc")),
            ]
        );
        assert!(!controller.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn progress_uses_short_delay_and_network_errors_use_long_delay() {
        let (backend, mut controller, mut rx) = setup(Scripted::new().with_statuses(vec![
            Ok(pending("a")),
            Err(BackendError::Network("connection reset".into())),
            Ok(pending("")),
            Ok(done("DOC", 9.0, "")),
        ]));

        controller.submit("request").unwrap();
        while !matches!(next_event(&mut rx).await, TaskEvent::Completed { .. }) {}

        let times = backend.status_times();
        assert_eq!(times.len(), 4);
        let gaps: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
        let within = |gap: Duration, ms: u64| {
            gap >= Duration::from_millis(ms) && gap < Duration::from_millis(ms + 50)
        };
        assert!(within(gaps[0], 2500), "after progress: {:?}", gaps[0]);
        assert!(within(gaps[1], 3500), "after network error: {:?}", gaps[1]);
        assert!(within(gaps[2], 2500), "after empty feedback: {:?}", gaps[2]);
    }

    #[tokio::test(start_paused = true)]
    async fn decode_errors_are_retried() {
        let (backend, mut controller, mut rx) = setup(Scripted::new().with_statuses(vec![
            Err(BackendError::Decode("expected value at line 1".into())),
            Ok(done("DOC", 7.0, "fine")),
        ]));

        controller.submit("request").unwrap();
        let mut saw_transient = false;
        loop {
            match next_event(&mut rx).await {
                TaskEvent::TransientFailure { .. } => saw_transient = true,
                TaskEvent::Completed { .. } => break,
                _ => {}
            }
        }
        assert!(saw_transient);
        assert_eq!(backend.count(|c| matches!(c, Call::Status(_))), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn start_failure_with_status_sets_no_task() {
        let backend = Scripted::new();
        *backend.start.lock().unwrap() = Err(BackendError::Status { status: 500 });
        let (backend, mut controller, mut rx) = setup(backend);
        let mut state = TaskState::default();

        controller.submit("request").unwrap();
        state.apply(next(&mut rx).await);
        state.apply(next(&mut rx).await);

        assert_eq!(state.phase, Phase::Idle);
        assert!(state.task_id.is_none());
        assert!(state.status_text().contains("500"));
        assert!(!state.is_loading());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.count(|c| matches!(c, Call::Status(_))), 0);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_while_polling_is_fatal() {
        let (backend, mut controller, mut rx) = setup(Scripted::new().with_statuses(vec![
            Ok(pending("working")),
            Err(BackendError::Status { status: 500 }),
        ]));
        let mut state = TaskState::default();

        controller.submit("request").unwrap();
        while state.phase != Phase::Error {
            state.apply(next(&mut rx).await);
        }
        assert_eq!(state.status_text(), "Polling error (500)");
        assert!(!state.is_loading());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.count(|c| matches!(c, Call::Status(_))), 2);
        assert_eq!(backend.count(|c| matches!(c, Call::Finalize(_))), 0);
        assert!(!controller.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_mid_poll_stops_timer_and_resets_once() {
        let (backend, mut controller, mut rx) = setup(Scripted::new());
        let mut state = TaskState::default();

        controller.submit("request").unwrap();
        // Submitting, Started, first Progress; the loop is now sleeping.
        for _ in 0..3 {
            state.apply(next(&mut rx).await);
        }
        assert_eq!(state.phase, Phase::Polling);
        let polls_before = backend.count(|c| matches!(c, Call::Status(_)));

        assert!(controller.cancel());
        state.apply(next(&mut rx).await);
        assert_eq!(state.phase, Phase::CancelledByUser);

        state.apply(next(&mut rx).await);
        assert_eq!(state.status_text(), "Task abc cancelled.");
        assert!(!state.is_loading());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.count(|c| matches!(c, Call::Status(_))), polls_before);
        assert_eq!(
            backend.count(|c| matches!(c, Call::Reset(_))),
            1,
            "exactly one reset call"
        );
        assert!(backend.calls().contains(&Call::Reset(ResetOptions::default())));
        assert!(drain(&mut rx).is_empty());
        assert!(!controller.cancel(), "second cancel is a no-op");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reset_still_reaches_cancelled() {
        let backend = Scripted::new();
        *backend.reset.lock().unwrap() = Err(BackendError::Network("refused".into()));
        let (_backend, mut controller, mut rx) = setup(backend);
        let mut state = TaskState::default();

        controller.submit("request").unwrap();
        for _ in 0..3 {
            state.apply(next(&mut rx).await);
        }
        controller.cancel();
        state.apply(next(&mut rx).await);
        state.apply(next(&mut rx).await);

        assert_eq!(state.phase, Phase::CancelledByUser);
        assert!(state.status_text().contains("abc"));
        assert!(state.status_text().contains("not confirmed"));
        assert!(!state.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_poll_result_is_discarded_after_cancel() {
        let mut backend = Scripted::new().with_statuses(vec![Ok(done("LATE", 5.0, ""))]);
        backend.status_latency = Duration::from_secs(2);
        let (backend, mut controller, mut rx) = setup(backend);

        controller.submit("request").unwrap();
        assert_eq!(next_event(&mut rx).await, TaskEvent::Submitting);
        assert!(matches!(next_event(&mut rx).await, TaskEvent::Started { .. }));

        // The first status request is now in flight.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(backend.count(|c| matches!(c, Call::Status(_))), 1);
        controller.cancel();

        tokio::time::sleep(Duration::from_secs(30)).await;
        let events = drain(&mut rx);
        assert!(
            events
                .iter()
                .all(|e| matches!(e, TaskEvent::Cancelling { .. } | TaskEvent::Cancelled { .. })),
            "unexpected events: {events:?}"
        );
        assert_eq!(backend.count(|c| matches!(c, Call::Finalize(_))), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_while_submitting_has_no_task_id() {
        let (_backend, mut controller, mut rx) = setup(Scripted::new());
        let mut state = TaskState::default();

        controller.submit("request").unwrap();
        // Cancel before the spawned context gets to run.
        assert!(controller.cancel());
        loop {
            let e = next(&mut rx).await;
            let finished = matches!(e.event, TaskEvent::Cancelled { .. });
            state.apply(e);
            if finished {
                break;
            }
        }
        assert_eq!(state.status_text(), "Operation cancelled.");
    }

    #[tokio::test(start_paused = true)]
    async fn resubmit_invalidates_previous_context() {
        let backend = Scripted::new();
        let (backend, mut controller, mut rx) = setup(backend);
        let mut state = TaskState::default();

        controller.submit("first").unwrap();
        for _ in 0..3 {
            state.apply(next(&mut rx).await);
        }
        let first_generation = controller.generation();

        *backend.start.lock().unwrap() = Ok(TaskId::new("def"));
        controller.submit("second").unwrap();
        assert!(controller.generation() > first_generation);

        tokio::time::sleep(Duration::from_secs(10)).await;
        while let Ok(e) = rx.try_recv() {
            state.apply(e);
        }
        assert_eq!(state.task_id, Some(TaskId::new("def")));
        assert_eq!(state.phase, Phase::Polling);

        // After the switch, only the new task is ever polled.
        let calls = backend.calls();
        let switch = calls
            .iter()
            .position(|c| *c == Call::Start("second".into()))
            .unwrap();
        assert!(
            calls[switch..]
                .iter()
                .all(|c| !matches!(c, Call::Status(id) if id.as_str() == "abc"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_controller_stops_polling() {
        let (backend, mut controller, mut rx) = setup(Scripted::new());

        controller.submit("request").unwrap();
        for _ in 0..3 {
            next(&mut rx).await;
        }
        let polls = backend.count(|c| matches!(c, Call::Status(_)));
        drop(controller);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.count(|c| matches!(c, Call::Status(_))), polls);
        assert_eq!(backend.count(|c| matches!(c, Call::Reset(_))), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn finalize_outcome_only_changes_text() {
        for (finalize, expected) in [
            (
                Ok(FinalizeReport {
                    uvicorn_reloaded: true,
                }),
                "Completed. Reset and reload performed.",
            ),
            (
                Err(BackendError::Network("gone".into())),
                "Completed. Reset not confirmed.",
            ),
        ] {
            let backend = Scripted::new().with_statuses(vec![Ok(done("DOC", 6.0, "meh"))]);
            *backend.finalize.lock().unwrap() = finalize;
            let (_backend, mut controller, mut rx) = setup(backend);
            let mut state = TaskState::default();

            controller.submit("request").unwrap();
            while state.phase != Phase::Done {
                state.apply(next(&mut rx).await);
            }
            assert_eq!(state.status_text(), expected);
            assert!(state.result.is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn clear_finalizes_known_task_and_blanks_state() {
        let (backend, mut controller, mut rx) = setup(Scripted::new());
        let mut state = TaskState::default();

        controller.submit("request").unwrap();
        for _ in 0..3 {
            state.apply(next(&mut rx).await);
        }
        assert_eq!(controller.current_task(), Some(TaskId::new("abc")));

        controller.clear();
        state.apply(next(&mut rx).await);
        assert_eq!(state, TaskState {
            generation: controller.generation(),
            ..TaskState::default()
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.count(|c| *c == Call::Finalize(TaskId::new("abc"))), 1);
        assert_eq!(backend.count(|c| matches!(c, Call::Reset(_))), 0);
        assert!(!controller.is_active());
    }
}
