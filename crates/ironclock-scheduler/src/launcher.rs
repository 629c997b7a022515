//! Executes one firing of a scheduled job.
//!
//! A [`JobLauncher`] is built per firing and consumed by
//! [`launch`](JobLauncher::launch). Validation failures, a missing runner
//! and runner faults all become a recorded [`RunOutcome`]; only backend
//! failures and enter/leave mismatches are returned as errors.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::error::{SchedulerError, SchedulerResult};
use crate::job::JobDetails;
use crate::runner::{JobRunnerRequest, JobRunnerResponse};
use crate::running::RunningJob;
use crate::service::SchedulerService;
use crate::types::{JobId, RunDetails, RunMode, RunOutcome};

/// Message recorded when the job no longer exists.
pub const NO_JOB_DETAILS_MESSAGE: &str = "No corresponding job details";

/// Message recorded when the job is already running on this node.
pub const ALREADY_RUNNING_MESSAGE: &str = "Already running";

/// Result of one launch.
#[derive(Debug, Clone)]
pub struct LaunchReport {
    job_id: JobId,
    outcome: RunOutcome,
    message: Option<String>,
    run_details: Option<RunDetails>,
}

impl LaunchReport {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The record written to the run history, if recording succeeded.
    pub fn run_details(&self) -> Option<&RunDetails> {
        self.run_details.as_ref()
    }
}

/// Single-use launcher for one job firing.
pub struct JobLauncher {
    service: Arc<SchedulerService>,
    expected_run_mode: RunMode,
    fired_at: DateTime<Utc>,
    job_id: JobId,
    job_details: Option<JobDetails>,
}

impl JobLauncher {
    /// Create a launcher. `fired_at` defaults to now; `job_details` is looked
    /// up from the job store when not supplied.
    pub fn new(
        service: Arc<SchedulerService>,
        expected_run_mode: RunMode,
        fired_at: Option<DateTime<Utc>>,
        job_id: JobId,
        job_details: Option<JobDetails>,
    ) -> Self {
        Self {
            service,
            expected_run_mode,
            fired_at: fired_at.unwrap_or_else(Utc::now),
            job_id,
            job_details,
        }
    }

    /// Validate, run and record the job.
    pub async fn launch(mut self) -> SchedulerResult<LaunchReport> {
        debug!(job_id = %self.job_id, fired_at = %self.fired_at, "Launching job");

        let details = match self.job_details.take() {
            Some(details) => Some(details),
            None => self.service.job_details(&self.job_id).await?,
        };

        let (outcome, message) = match &details {
            None => (RunOutcome::Aborted, Some(NO_JOB_DETAILS_MESSAGE.to_string())),
            Some(details) => match self.launch_job(details).await {
                Ok(result) => result,
                Err(e @ SchedulerError::JobRunnerNotRegistered(_)) => {
                    warn!(job_id = %self.job_id, "Job runner unavailable: {}", e);
                    (RunOutcome::Unavailable, Some(e.to_string()))
                }
                Err(e) => return Err(e),
            },
        };

        info!(
            job_id = %self.job_id,
            outcome = %outcome,
            run_message = message.as_deref().unwrap_or(""),
            "Job run complete"
        );

        let run_details = match self
            .service
            .add_run_details(&self.job_id, self.fired_at, outcome, message.clone())
            .await
        {
            Ok(run_details) => Some(run_details),
            Err(e) => {
                warn!(job_id = %self.job_id, "Failed to record run details: {}", e);
                None
            }
        };

        if let Some(details) = &details {
            if details.schedule().is_run_once() {
                debug!(job_id = %self.job_id, "Unscheduling run-once job");
                if let Err(e) = self.service.unschedule_job(&self.job_id).await {
                    warn!(job_id = %self.job_id, "Failed to unschedule run-once job: {}", e);
                }
            }
        }

        Ok(LaunchReport {
            job_id: self.job_id,
            outcome,
            message,
            run_details,
        })
    }

    async fn launch_job(
        &self,
        details: &JobDetails,
    ) -> SchedulerResult<(RunOutcome, Option<String>)> {
        if details.run_mode() != self.expected_run_mode {
            return Ok((
                RunOutcome::Aborted,
                Some(format!(
                    "Inconsistent run mode: expected '{}' got: '{}'",
                    self.expected_run_mode,
                    details.run_mode()
                )),
            ));
        }

        let job_runner = self
            .service
            .job_runner(details.job_runner_key())
            .ok_or_else(|| SchedulerError::JobRunnerNotRegistered(details.job_runner_key().clone()))?;

        let job_config = match details.job_config() {
            Ok(config) => config,
            Err(e) => {
                warn!(job_id = %self.job_id, "Cannot rebuild job config: {}", e);
                return Ok((RunOutcome::Aborted, Some(details.to_string())));
            }
        };

        let running_job = RunningJob::new(self.fired_at, self.job_id.clone(), job_config);
        if self
            .service
            .enter_job(self.job_id.clone(), running_job.clone())
            .is_some()
        {
            debug!(job_id = %self.job_id, "Job is already running; skipping");
            return Ok((RunOutcome::Aborted, Some(ALREADY_RUNNING_MESSAGE.to_string())));
        }

        let backend = self.service.backend();
        backend.pre_job();
        let request = JobRunnerRequest::new(running_job.clone());
        let result = AssertUnwindSafe(job_runner.run_job(&request))
            .catch_unwind()
            .await;
        let left = self.service.leave_job(&self.job_id, &running_job);
        backend.post_job();

        if let Err(e) = left {
            error!(job_id = %self.job_id, "Running job bookkeeping is inconsistent: {}", e);
            return Err(e);
        }

        Ok(match result {
            Ok(Ok(Some(response))) => response.into_parts(),
            Ok(Ok(None)) => (RunOutcome::Success, None),
            Ok(Err(e)) => {
                warn!(job_id = %self.job_id, "Job runner failed: {}", e);
                JobRunnerResponse::failed_with_error(&e).into_parts()
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(job_id = %self.job_id, "Job runner panicked: {}", message);
                (RunOutcome::Failed, Some(message))
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job runner panicked".to_string()
    }
}
