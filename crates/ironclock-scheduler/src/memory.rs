//! In-process implementations of the scheduler collaborators.
//!
//! Suitable for a single node and for tests. Nothing is persisted.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::backend::{JobDetailsStore, RunHistory, TenantAccessor};
use crate::error::SchedulerResult;
use crate::job::{JobConfig, JobDetails};
use crate::types::{JobId, JobRunnerKey, RunDetails, RunMode, RunOutcome};

struct StoredJob {
    details: JobDetails,
    next_run: Option<DateTime<Utc>>,
}

/// A job whose next run time has been reached.
#[derive(Debug, Clone)]
pub struct DueJob {
    pub details: JobDetails,
    pub scheduled_at: DateTime<Utc>,
}

/// Job store backed by a map, tracking each job's next run time.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, StoredJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every job of `run_mode` due at `now` and advance its next run
    /// time. Jobs of the other mode are left untouched.
    ///
    /// A job is returned at most once per scheduled slot. Jobs whose
    /// schedule will not fire again stay stored but are never due.
    pub fn due_jobs(&self, now: DateTime<Utc>, run_mode: RunMode) -> Vec<DueJob> {
        let mut jobs = self.jobs.write();
        let mut due = Vec::new();

        for stored in jobs.values_mut() {
            if stored.details.run_mode() != run_mode {
                continue;
            }
            let Some(scheduled_at) = stored.next_run.filter(|next| *next <= now) else {
                continue;
            };

            stored.next_run = match stored.details.schedule().next_run_time(now, Some(scheduled_at)) {
                Ok(next) => next,
                Err(e) => {
                    warn!(job_id = %stored.details.job_id(), "Cannot compute next run time: {}", e);
                    None
                }
            };
            due.push(DueJob {
                details: stored.details.clone(),
                scheduled_at,
            });
        }

        due.sort_by_key(|job| job.scheduled_at);
        due
    }

    /// Next run time of a stored job.
    pub fn next_run_time(&self, job_id: &JobId) -> Option<DateTime<Utc>> {
        self.jobs.read().get(job_id).and_then(|stored| stored.next_run)
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}

#[async_trait]
impl JobDetailsStore for MemoryJobStore {
    async fn get_job_details(&self, job_id: &JobId) -> SchedulerResult<Option<JobDetails>> {
        Ok(self.jobs.read().get(job_id).map(|stored| stored.details.clone()))
    }

    async fn schedule_job(&self, job_id: &JobId, config: &JobConfig) -> SchedulerResult<()> {
        let details = JobDetails::from_config(job_id.clone(), config)?;
        let next_run = config.schedule().next_run_time(Utc::now(), None)?;
        debug!(job_id = %job_id, next_run = ?next_run, "Storing job");

        self.jobs
            .write()
            .insert(job_id.clone(), StoredJob { details, next_run });
        Ok(())
    }

    async fn unschedule_job(&self, job_id: &JobId) -> SchedulerResult<()> {
        self.jobs.write().remove(job_id);
        Ok(())
    }

    async fn jobs_by_job_runner_key(&self, key: &JobRunnerKey) -> SchedulerResult<Vec<JobDetails>> {
        let mut jobs: Vec<JobDetails> = self
            .jobs
            .read()
            .values()
            .filter(|stored| stored.details.job_runner_key() == key)
            .map(|stored| stored.details.clone())
            .collect();
        jobs.sort_by(|a, b| a.job_id().cmp(b.job_id()));
        Ok(jobs)
    }
}

#[derive(Default)]
struct JobHistory {
    last_run: Option<RunDetails>,
    last_success: Option<RunDetails>,
}

/// Run history keeping the latest and latest successful run of each job.
#[derive(Default)]
pub struct MemoryRunHistory {
    runs: RwLock<HashMap<JobId, JobHistory>>,
}

impl MemoryRunHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunHistory for MemoryRunHistory {
    async fn add_run_details(
        &self,
        job_id: &JobId,
        started_at: DateTime<Utc>,
        outcome: RunOutcome,
        message: Option<String>,
    ) -> SchedulerResult<RunDetails> {
        let details = RunDetails::completed_now(started_at, outcome, message);

        let mut runs = self.runs.write();
        let history = runs.entry(job_id.clone()).or_default();
        if outcome == RunOutcome::Success {
            history.last_success = Some(details.clone());
        }
        history.last_run = Some(details.clone());
        Ok(details)
    }

    async fn last_run(&self, job_id: &JobId) -> SchedulerResult<Option<RunDetails>> {
        Ok(self.runs.read().get(job_id).and_then(|h| h.last_run.clone()))
    }

    async fn last_successful_run(&self, job_id: &JobId) -> SchedulerResult<Option<RunDetails>> {
        Ok(self
            .runs
            .read()
            .get(job_id)
            .and_then(|h| h.last_success.clone()))
    }
}

/// Fixed list of tenants.
#[derive(Debug, Clone, Default)]
pub struct StaticTenants {
    tenants: Vec<String>,
}

impl StaticTenants {
    pub fn new(tenants: Vec<String>) -> Self {
        Self { tenants }
    }

    pub fn tenants(&self) -> &[String] {
        &self.tenants
    }
}

impl TenantAccessor for StaticTenants {
    fn has_available_tenant(&self) -> bool {
        !self.tenants.is_empty()
    }
}
