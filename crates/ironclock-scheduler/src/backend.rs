//! Collaborators the scheduler core calls into.
//!
//! Job persistence, run history and tenant discovery are owned elsewhere;
//! the core only depends on these traits. Implementations must tolerate
//! concurrent calls from many launches.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SchedulerResult;
use crate::job::{JobConfig, JobDetails};
use crate::types::{JobId, JobRunnerKey, RunDetails, RunOutcome};

/// Stores scheduled jobs.
#[async_trait]
pub trait JobDetailsStore: Send + Sync {
    /// Look up a job. `Ok(None)` when it does not exist.
    async fn get_job_details(&self, job_id: &JobId) -> SchedulerResult<Option<JobDetails>>;

    /// Create or replace a job.
    async fn schedule_job(&self, job_id: &JobId, config: &JobConfig) -> SchedulerResult<()>;

    /// Remove a job. Removing a missing job is not an error.
    async fn unschedule_job(&self, job_id: &JobId) -> SchedulerResult<()>;

    /// All jobs using the given runner key.
    async fn jobs_by_job_runner_key(&self, key: &JobRunnerKey) -> SchedulerResult<Vec<JobDetails>>;
}

/// Records the outcome of every firing.
#[async_trait]
pub trait RunHistory: Send + Sync {
    async fn add_run_details(
        &self,
        job_id: &JobId,
        started_at: DateTime<Utc>,
        outcome: RunOutcome,
        message: Option<String>,
    ) -> SchedulerResult<RunDetails>;

    async fn last_run(&self, job_id: &JobId) -> SchedulerResult<Option<RunDetails>>;

    async fn last_successful_run(&self, job_id: &JobId) -> SchedulerResult<Option<RunDetails>>;
}

/// Reports whether any tenant exists to own scheduled jobs.
pub trait TenantAccessor: Send + Sync {
    fn has_available_tenant(&self) -> bool;
}
