//! Built-in job runners.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use ironclock_scheduler::{
    JobRunner, JobRunnerError, JobRunnerKey, JobRunnerRequest, JobRunnerResponse,
    SchedulerService,
};

pub(crate) const LOG_RUNNER: &str = "log";
pub(crate) const SLEEP_RUNNER: &str = "sleep";

const DEFAULT_SLEEP_MILLIS: u64 = 1000;

/// Register every built-in runner with the service.
pub(crate) fn register_builtin_runners(service: &SchedulerService) {
    service.register_job_runner(JobRunnerKey::of(LOG_RUNNER), Arc::new(LogJobRunner));
    service.register_job_runner(JobRunnerKey::of(SLEEP_RUNNER), Arc::new(SleepJobRunner));
}

/// Logs each firing with its parameters. The `message` parameter becomes
/// the run message.
pub(crate) struct LogJobRunner;

#[async_trait]
impl JobRunner for LogJobRunner {
    async fn run_job(
        &self,
        request: &JobRunnerRequest,
    ) -> Result<Option<JobRunnerResponse>, JobRunnerError> {
        let message = request
            .job_config()
            .parameters()
            .get("message")
            .and_then(|value| value.as_str())
            .unwrap_or("tick");

        info!(
            job_id = %request.job_id(),
            fired_at = %request.fired_at(),
            parameters = ?request.job_config().parameters(),
            "{}",
            message
        );
        Ok(Some(JobRunnerResponse::success_with(message)))
    }
}

/// Sleeps for the `millis` parameter, stopping early when cancelled.
pub(crate) struct SleepJobRunner;

impl SleepJobRunner {
    fn duration(request: &JobRunnerRequest) -> Result<Duration, JobRunnerError> {
        match request.job_config().parameters().get("millis") {
            None => Ok(Duration::from_millis(DEFAULT_SLEEP_MILLIS)),
            Some(value) => value.as_u64().map(Duration::from_millis).ok_or_else(|| {
                JobRunnerError::Incompatible(format!(
                    "'millis' must be a non-negative integer, got {}",
                    value
                ))
            }),
        }
    }
}

#[async_trait]
impl JobRunner for SleepJobRunner {
    async fn run_job(
        &self,
        request: &JobRunnerRequest,
    ) -> Result<Option<JobRunnerResponse>, JobRunnerError> {
        let duration = Self::duration(request)?;
        let token = request.cancellation_token();

        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(None),
            _ = token.cancelled() => Ok(Some(JobRunnerResponse::aborted(format!(
                "Cancelled before {:?} elapsed",
                duration
            )))),
        }
    }
}
