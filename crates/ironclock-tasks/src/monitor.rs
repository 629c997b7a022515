//! Lifecycle tracking for one asynchronous task.
//!
//! A [`TaskMonitor`] wraps a task body and moves through
//! `Created -> (Waiting) -> Running -> Successful | Failed | Canceled`.
//! A task that has not started yet can be canceled straight from
//! `Created` or `Waiting`. Callbacks fire once the task reaches a terminal
//! state, and a completion gate is released exactly once afterwards.

use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, resume_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::{TaskError, panic_message};
use crate::message::{DefaultMessageResolver, INCORRECT_CANCEL_TOKEN, MessageResolver};
use crate::pool::WorkerPool;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum TaskState {
    Created = 0,
    Waiting = 1,
    Running = 2,
    Successful = 3,
    Failed = 4,
    Canceled = 5,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Successful | TaskState::Failed | TaskState::Canceled
        )
    }
}

impl From<u8> for TaskState {
    fn from(v: u8) -> Self {
        match v {
            1 => TaskState::Waiting,
            2 => TaskState::Running,
            3 => TaskState::Successful,
            4 => TaskState::Failed,
            5 => TaskState::Canceled,
            _ => TaskState::Created,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Created => "CREATED",
            TaskState::Waiting => "WAITING",
            TaskState::Running => "RUNNING",
            TaskState::Successful => "SUCCESSFUL",
            TaskState::Failed => "FAILED",
            TaskState::Canceled => "CANCELED",
        };
        f.write_str(s)
    }
}

/// Task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Secret handed to the task's creator; only its holder may cancel.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancelKey(Uuid);

impl CancelKey {
    fn generate() -> Self {
        CancelKey(Uuid::new_v4())
    }
}

impl fmt::Debug for CancelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CancelKey(..)")
    }
}

/// Who asked for a task to be run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestContext {
    pub node_id: String,
    pub session_id: Option<String>,
}

impl RequestContext {
    pub fn new(node_id: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            node_id: node_id.into(),
            session_id,
        }
    }
}

/// Progress reported by a running task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub completed: u64,
    pub total: Option<u64>,
    pub message: Option<String>,
}

/// Point-in-time view of a task, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub state: TaskState,
    pub requester: Option<RequestContext>,
    pub started_at: DateTime<Utc>,
    pub progress: TaskProgress,
}

/// What a task body gets to observe cancellation and report progress.
#[derive(Clone)]
pub struct TaskContext {
    task_id: TaskId,
    cancellation: CancellationToken,
    progress: Arc<RwLock<TaskProgress>>,
}

impl TaskContext {
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Completes when cancellation is requested.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn set_progress(&self, progress: TaskProgress) {
        *self.progress.write() = progress;
    }

    pub fn update_progress(&self, update: impl FnOnce(&mut TaskProgress)) {
        update(&mut self.progress.write());
    }
}

type Body<T> = Box<dyn FnOnce(TaskContext) -> BoxFuture<'static, Result<T, TaskError>> + Send>;
type SuccessCallback<T> = Box<dyn Fn(&T) + Send + Sync>;
type FailureCallback = Box<dyn Fn(&TaskError) + Send + Sync>;
type CancellationCallback = Box<dyn Fn() + Send + Sync>;

struct Callbacks<T> {
    success: Vec<SuccessCallback<T>>,
    failure: Vec<FailureCallback>,
    cancellation: Vec<CancellationCallback>,
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Self {
            success: Vec::new(),
            failure: Vec::new(),
            cancellation: Vec::new(),
        }
    }
}

struct Shared<T> {
    id: TaskId,
    cancel_key: CancelKey,
    requester: Option<RequestContext>,
    started_at: DateTime<Utc>,
    state: AtomicU8,
    cancellation: CancellationToken,
    progress: Arc<RwLock<TaskProgress>>,
    body: Mutex<Option<Body<T>>>,
    callbacks: Mutex<Callbacks<T>>,
    outcome: Mutex<Option<Result<T, TaskError>>>,
    completion: watch::Sender<bool>,
    messages: Arc<dyn MessageResolver>,
}

impl<T: Clone> Shared<T> {
    fn state(&self) -> TaskState {
        TaskState::from(self.state.load(Ordering::SeqCst))
    }

    fn transition(&self, from: TaskState, to: TaskState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn release(&self) {
        self.completion.send_replace(true);
    }

    /// Record the terminal state and outcome, then fire the matching
    /// callbacks. Holds the callbacks lock while recording so a callback is
    /// either drained here or registered against the recorded outcome.
    fn settle(&self, state: TaskState, outcome: Result<T, TaskError>) {
        let pending = {
            let mut callbacks = self.callbacks.lock();
            self.state.store(state as u8, Ordering::SeqCst);
            *self.outcome.lock() = Some(outcome.clone());
            std::mem::take(&mut *callbacks)
        };
        self.fire(state, &outcome, pending);
    }

    /// Queue callbacks, or fire them at once if the task already settled.
    fn register(&self, callbacks: Callbacks<T>) {
        let (state, outcome) = {
            let mut registered = self.callbacks.lock();
            let settled = self.outcome.lock().clone();
            match settled {
                Some(outcome) => (self.state(), outcome),
                None => {
                    registered.success.extend(callbacks.success);
                    registered.failure.extend(callbacks.failure);
                    registered.cancellation.extend(callbacks.cancellation);
                    return;
                }
            }
        };
        debug!(task_id = %self.id, state = %state, "Task already settled; firing callback now");
        self.fire(state, &outcome, callbacks);
    }

    fn fire(&self, state: TaskState, outcome: &Result<T, TaskError>, callbacks: Callbacks<T>) {
        match (state, outcome) {
            (TaskState::Successful, Ok(value)) => {
                for callback in callbacks.success {
                    self.guarded("Success", || callback(value));
                }
            }
            (TaskState::Canceled, _) => {
                for callback in callbacks.cancellation {
                    self.guarded("Cancellation", || callback());
                }
            }
            (_, Err(cause)) => {
                for callback in callbacks.failure {
                    self.guarded("Failure", || callback(cause));
                }
            }
            (_, Ok(_)) => {}
        }
    }

    fn guarded(&self, kind: &str, callback: impl FnOnce()) {
        if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(callback)) {
            error!(task_id = %self.id, "{} callback panicked: {}", kind, panic_message(payload.as_ref()));
        }
    }

    /// Record a fault raised while running: canceled if cancellation was
    /// requested, failed otherwise.
    fn finish_with_fault(&self, cause: &TaskError) {
        if self.cancellation.is_cancelled() {
            debug!(task_id = %self.id, "Task canceled");
            self.settle(TaskState::Canceled, Err(TaskError::Canceled));
        } else {
            warn!(task_id = %self.id, "Task failed: {}", cause);
            self.settle(TaskState::Failed, Err(cause.clone()));
        }
    }
}

/// Releases the completion gate when a run ends, however it ends.
struct CompletionGuard<'a, T: Clone> {
    shared: &'a Shared<T>,
}

impl<T: Clone> Drop for CompletionGuard<'_, T> {
    fn drop(&mut self) {
        let abandoned = self.shared.outcome.lock().is_none();
        if abandoned {
            // run future dropped before the body finished
            warn!(task_id = %self.shared.id, "Task abandoned while running");
            self.shared.settle(TaskState::Canceled, Err(TaskError::Canceled));
        }
        self.shared.release();
    }
}

/// Handle to one monitored task. Clones share the same task.
pub struct TaskMonitor<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for TaskMonitor<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> TaskMonitor<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a monitor in the `Created` state.
    pub fn new<F, Fut>(requester: Option<RequestContext>, body: F) -> Self
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        Self::with_message_resolver(requester, Arc::new(DefaultMessageResolver), body)
    }

    pub fn with_message_resolver<F, Fut>(
        requester: Option<RequestContext>,
        messages: Arc<dyn MessageResolver>,
        body: F,
    ) -> Self
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    {
        let body: Body<T> = Box::new(move |context| body(context).boxed());
        let (completion, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                id: TaskId(Uuid::new_v4()),
                cancel_key: CancelKey::generate(),
                requester,
                started_at: Utc::now(),
                state: AtomicU8::new(TaskState::Created as u8),
                cancellation: CancellationToken::new(),
                progress: Arc::new(RwLock::new(TaskProgress::default())),
                body: Mutex::new(Some(body)),
                callbacks: Mutex::new(Callbacks::default()),
                outcome: Mutex::new(None),
                completion,
                messages,
            }),
        }
    }

    pub fn id(&self) -> TaskId {
        self.shared.id
    }

    pub fn cancel_key(&self) -> CancelKey {
        self.shared.cancel_key
    }

    pub fn state(&self) -> TaskState {
        self.shared.state()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.shared.started_at
    }

    pub fn requester(&self) -> Option<&RequestContext> {
        self.shared.requester.as_ref()
    }

    /// Whether `context` is the one that requested this task. Two absent
    /// contexts match.
    pub fn is_requested_by(&self, context: Option<&RequestContext>) -> bool {
        self.shared.requester.as_ref() == context
    }

    pub fn progress(&self) -> TaskProgress {
        self.shared.progress.read().clone()
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.shared.id,
            state: self.state(),
            requester: self.shared.requester.clone(),
            started_at: self.shared.started_at,
            progress: self.progress(),
        }
    }

    /// Called with the value once the task succeeds. Fires immediately if
    /// it already has.
    pub fn on_success(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> &Self {
        let mut callbacks = Callbacks::default();
        callbacks.success.push(Box::new(callback) as SuccessCallback<T>);
        self.shared.register(callbacks);
        self
    }

    pub fn on_failure(&self, callback: impl Fn(&TaskError) + Send + Sync + 'static) -> &Self {
        let mut callbacks = Callbacks::default();
        callbacks.failure.push(Box::new(callback) as FailureCallback);
        self.shared.register(callbacks);
        self
    }

    /// Called once the task is canceled, including when its run is
    /// abandoned mid-flight.
    pub fn on_cancellation(&self, callback: impl Fn() + Send + Sync + 'static) -> &Self {
        let mut callbacks = Callbacks::default();
        callbacks
            .cancellation
            .push(Box::new(callback) as CancellationCallback);
        self.shared.register(callbacks);
        self
    }

    /// Mark the task `Waiting` and queue it on `pool`.
    ///
    /// The handle resolves to the result of [`run`](Self::run); a panic in
    /// the body surfaces as the handle's `JoinError`.
    pub fn submit_to(
        &self,
        pool: &WorkerPool,
    ) -> Result<JoinHandle<Result<(), TaskError>>, TaskError> {
        let queued = self.shared.transition(TaskState::Created, TaskState::Waiting);
        let monitor = self.clone();
        match pool.execute(async move { monitor.run().await }) {
            Ok(handle) => {
                debug!(task_id = %self.shared.id, "Task submitted");
                Ok(handle)
            }
            Err(e) => {
                if queued {
                    self.shared.transition(TaskState::Waiting, TaskState::Created);
                }
                Err(e)
            }
        }
    }

    /// Run the body on the current task.
    ///
    /// Skipped with a warning unless the task is `Created` or `Waiting`.
    /// Returns the body's error after failure or cancellation callbacks have
    /// fired. A panicking body is recorded as [`TaskError::Panicked`] and the
    /// panic is then resumed.
    pub async fn run(&self) -> Result<(), TaskError> {
        let shared = self.shared.as_ref();
        if !shared.transition(TaskState::Waiting, TaskState::Running)
            && !shared.transition(TaskState::Created, TaskState::Running)
        {
            warn!(task_id = %shared.id, state = %shared.state(), "Task is not runnable; skipping");
            return Ok(());
        }

        let _release = CompletionGuard { shared };
        let Some(body) = shared.body.lock().take() else {
            let cause = TaskError::failed("task body already consumed");
            shared.finish_with_fault(&cause);
            return Err(cause);
        };

        let context = TaskContext {
            task_id: shared.id,
            cancellation: shared.cancellation.clone(),
            progress: shared.progress.clone(),
        };
        debug!(task_id = %shared.id, "Task running");

        match AssertUnwindSafe(body(context)).catch_unwind().await {
            Ok(Ok(value)) => {
                debug!(task_id = %shared.id, "Task successful");
                shared.settle(TaskState::Successful, Ok(value));
                Ok(())
            }
            Ok(Err(cause)) => {
                shared.finish_with_fault(&cause);
                Err(cause)
            }
            Err(payload) => {
                let cause = TaskError::Panicked(panic_message(payload.as_ref()));
                shared.finish_with_fault(&cause);
                resume_unwind(payload)
            }
        }
    }

    /// Cancel the task.
    ///
    /// `key` must be this task's [`CancelKey`]. A task that has not started
    /// is canceled immediately and `true` is returned. Otherwise the body is
    /// asked to stop and this waits up to `timeout` for it to finish,
    /// returning whether it ended up canceled.
    pub async fn cancel(&self, key: CancelKey, timeout: Duration) -> Result<bool, TaskError> {
        let shared = self.shared.as_ref();
        if key != shared.cancel_key {
            let message = shared
                .messages
                .text(INCORRECT_CANCEL_TOKEN, &[shared.id.to_string()]);
            warn!(task_id = %shared.id, "{}", message);
            return Err(TaskError::IncorrectCancelToken(message));
        }

        shared.cancellation.cancel();
        if shared.transition(TaskState::Waiting, TaskState::Canceled)
            || shared.transition(TaskState::Created, TaskState::Canceled)
        {
            debug!(task_id = %shared.id, "Task canceled before starting");
            shared.body.lock().take();
            shared.settle(TaskState::Canceled, Err(TaskError::Canceled));
            shared.release();
            return Ok(true);
        }

        let mut completion = shared.completion.subscribe();
        if tokio::time::timeout(timeout, completion.wait_for(|done| *done))
            .await
            .is_err()
        {
            debug!(task_id = %shared.id, "Task did not stop within {:?}", timeout);
        }
        Ok(shared.state() == TaskState::Canceled)
    }

    /// Wait for the task to reach a terminal state and return its result.
    pub async fn await_completion(&self) -> Result<T, TaskError> {
        let mut completion = self.shared.completion.subscribe();
        // the sender lives as long as `self`, so this cannot fail
        let _ = completion.wait_for(|done| *done).await;
        match &*self.shared.outcome.lock() {
            Some(outcome) => outcome.clone(),
            None => Err(TaskError::Canceled),
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
