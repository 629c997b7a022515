//! Jobs currently executing in this process.
//!
//! The [`RunningJobTracker`] holds at most one [`RunningJob`] per job ID.
//! `enter` and `leave` must be called in matching pairs; a `leave` that does
//! not find the exact handle passed to `enter` is an internal consistency
//! fault and is reported as an error.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{SchedulerError, SchedulerResult};
use crate::job::JobConfig;
use crate::types::JobId;

/// Live handle for one job execution.
#[derive(Debug)]
pub struct RunningJob {
    job_id: JobId,
    job_config: JobConfig,
    fired_at: DateTime<Utc>,
    cancellation: CancellationToken,
}

impl RunningJob {
    pub fn new(fired_at: DateTime<Utc>, job_id: JobId, job_config: JobConfig) -> Arc<Self> {
        Arc::new(Self {
            job_id,
            job_config,
            fired_at,
            cancellation: CancellationToken::new(),
        })
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn job_config(&self) -> &JobConfig {
        &self.job_config
    }

    pub fn fired_at(&self) -> DateTime<Utc> {
        self.fired_at
    }

    /// Request cooperative cancellation. Does not wait for the job to stop.
    pub fn cancel(&self) {
        if !self.cancellation.is_cancelled() {
            debug!(job_id = %self.job_id, "Cancellation requested for running job");
        }
        self.cancellation.cancel();
    }

    pub fn is_cancellation_requested(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Token a runner can await to observe cancellation.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }
}

/// Thread-safe set of running jobs with wait-until-idle support.
pub struct RunningJobTracker {
    jobs: DashMap<JobId, Arc<RunningJob>>,
    idle: Notify,
}

impl RunningJobTracker {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
            idle: Notify::new(),
        }
    }

    /// Register `job` under `job_id` unless a job is already registered.
    ///
    /// Returns the existing occupant when there is one; the caller must then
    /// not run the job.
    pub fn enter(&self, job_id: JobId, job: Arc<RunningJob>) -> Option<Arc<RunningJob>> {
        match self.jobs.entry(job_id) {
            Entry::Occupied(occupied) => Some(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                debug!(job_id = %vacant.key(), "Job entered");
                vacant.insert(job);
                None
            }
        }
    }

    /// Remove `job` from `job_id`, which must hold exactly that handle.
    pub fn leave(&self, job_id: &JobId, job: &Arc<RunningJob>) -> SchedulerResult<()> {
        if self
            .jobs
            .remove_if(job_id, |_, current| Arc::ptr_eq(current, job))
            .is_none()
        {
            let reason = if self.jobs.contains_key(job_id) {
                "a different job is registered under this ID"
            } else {
                "no job is registered under this ID"
            };
            return Err(SchedulerError::RunningJobMismatch {
                job_id: job_id.clone(),
                reason: reason.to_string(),
            });
        }

        debug!(job_id = %job_id, "Job left");
        if self.jobs.is_empty() {
            self.idle.notify_waiters();
        }
        Ok(())
    }

    /// Wait until no job is running, up to `timeout`.
    ///
    /// Returns `true` once the tracker is empty and `false` if jobs are still
    /// running when the timeout elapses. Dropping the returned future leaves
    /// the tracker untouched.
    pub async fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.jobs.is_empty() {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.jobs.is_empty();
            }
        }
    }

    /// Point-in-time copy of the running jobs.
    pub fn snapshot(&self) -> Vec<Arc<RunningJob>> {
        self.jobs.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn get(&self, job_id: &JobId) -> Option<Arc<RunningJob>> {
        self.jobs.get(job_id).map(|entry| entry.value().clone())
    }

    /// Request cancellation of every running job. Returns how many were asked.
    pub fn cancel_all(&self) -> usize {
        let jobs = self.snapshot();
        for job in &jobs {
            job.cancel();
        }
        if !jobs.is_empty() {
            info!(count = jobs.len(), "Requested cancellation of running jobs");
        }
        jobs.len()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl Default for RunningJobTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "running_tests.rs"]
mod tests;
