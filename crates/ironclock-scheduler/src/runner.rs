//! Job runner contract.

use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::JobRunnerError;
use crate::job::JobConfig;
use crate::running::RunningJob;
use crate::types::{JobId, RunOutcome};

/// Executable logic registered under a [`JobRunnerKey`](crate::JobRunnerKey).
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Run one firing of a job.
    ///
    /// `Ok(None)` counts as success. Errors and panics are recorded as a
    /// `FAILED` run; they never reach the caller of the launcher.
    async fn run_job(
        &self,
        request: &JobRunnerRequest,
    ) -> Result<Option<JobRunnerResponse>, JobRunnerError>;
}

/// What a runner sees of the firing it is executing.
#[derive(Debug, Clone)]
pub struct JobRunnerRequest {
    running_job: Arc<RunningJob>,
}

impl JobRunnerRequest {
    pub(crate) fn new(running_job: Arc<RunningJob>) -> Self {
        Self { running_job }
    }

    pub fn fired_at(&self) -> DateTime<Utc> {
        self.running_job.fired_at()
    }

    pub fn job_id(&self) -> &JobId {
        self.running_job.job_id()
    }

    pub fn job_config(&self) -> &JobConfig {
        self.running_job.job_config()
    }

    /// Whether the scheduler has asked this job to stop.
    pub fn is_cancellation_requested(&self) -> bool {
        self.running_job.is_cancellation_requested()
    }

    /// Token that completes when cancellation is requested.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.running_job.cancellation_token()
    }
}

/// Outcome a runner reports for its firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRunnerResponse {
    outcome: RunOutcome,
    message: Option<String>,
}

impl JobRunnerResponse {
    pub fn new(outcome: RunOutcome, message: Option<String>) -> Self {
        Self { outcome, message }
    }

    pub fn success() -> Self {
        Self::new(RunOutcome::Success, None)
    }

    pub fn success_with(message: impl Into<String>) -> Self {
        Self::new(RunOutcome::Success, Some(message.into()))
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(RunOutcome::Failed, Some(message.into()))
    }

    /// Failed response whose message lists the error and its sources.
    pub fn failed_with_error(error: &dyn Error) -> Self {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str("\nCaused by: ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::new(RunOutcome::Failed, Some(message))
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(RunOutcome::Aborted, Some(message.into()))
    }

    pub fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub(crate) fn into_parts(self) -> (RunOutcome, Option<String>) {
        (self.outcome, self.message)
    }
}
