//! Polling trigger that fires due jobs onto the worker pool.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use ironclock_config::{ConfigError, JobEntry, JobRunMode};
use ironclock_scheduler::{
    CronSchedule, IntervalSchedule, JobConfig, JobId, JobLauncher, JobRunnerKey, MemoryJobStore,
    RunMode, Schedule, SchedulerService, SchedulerState,
};
use ironclock_tasks::WorkerPool;

/// Build the scheduler's view of a configured job.
pub(crate) fn job_config_from_entry(entry: &JobEntry) -> Result<(JobId, JobConfig), ConfigError> {
    let interval = entry
        .interval_ms
        .map(|millis| IntervalSchedule::new(entry.first_run, millis));
    let cron = entry
        .cron
        .as_ref()
        .map(|expression| CronSchedule::new(expression.clone(), entry.time_zone.clone()));
    let schedule =
        Schedule::from_parts(interval, cron).map_err(|e| ConfigError::InvalidJobSchedule {
            job_id: entry.id.clone(),
            message: e.to_string(),
        })?;

    let run_mode = match entry.run_mode {
        JobRunMode::RunOncePerCluster => RunMode::RunOncePerCluster,
        JobRunMode::RunLocally => RunMode::RunLocally,
    };

    let config = JobConfig::for_job_runner_key(JobRunnerKey::of(entry.runner.clone()))
        .with_run_mode(run_mode)
        .with_schedule(schedule)
        .with_parameters(entry.parameters.clone());
    Ok((JobId::of(entry.id.clone()), config))
}

/// Fires jobs of one run mode from a [`MemoryJobStore`] once their next
/// run time is reached. Launches expect the trigger's mode, not the job's.
pub(crate) struct PollingTrigger {
    service: Arc<SchedulerService>,
    store: Arc<MemoryJobStore>,
    pool: Arc<WorkerPool>,
    run_mode: RunMode,
    tick_interval: Duration,
}

impl PollingTrigger {
    pub(crate) fn new(
        service: Arc<SchedulerService>,
        store: Arc<MemoryJobStore>,
        pool: Arc<WorkerPool>,
        run_mode: RunMode,
        tick_interval: Duration,
    ) -> Self {
        Self {
            service,
            store,
            pool,
            run_mode,
            tick_interval,
        }
    }

    /// Poll until `shutdown` is cancelled.
    pub(crate) async fn run(&self, shutdown: CancellationToken) {
        info!(run_mode = %self.run_mode, tick_interval = ?self.tick_interval, "Trigger started");
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick(Utc::now());
                }
            }
        }
        info!(run_mode = %self.run_mode, "Trigger stopped");
    }

    /// Launch every job of this trigger's mode due at `now`. Nothing fires
    /// unless the scheduler is started.
    pub(crate) fn tick(&self, now: DateTime<Utc>) -> Vec<JoinHandle<()>> {
        if self.service.state() != SchedulerState::Started {
            return Vec::new();
        }

        let mut launched = Vec::new();
        for due in self.store.due_jobs(now, self.run_mode) {
            let job_id = due.details.job_id().clone();
            debug!(job_id = %job_id, scheduled_at = %due.scheduled_at, "Job is due");

            let launcher = JobLauncher::new(
                self.service.clone(),
                self.run_mode,
                Some(due.scheduled_at),
                job_id.clone(),
                Some(due.details),
            );
            let submitted = self.pool.execute(async move {
                if let Err(e) = launcher.launch().await {
                    error!(job_id = %job_id, "Job launch failed: {}", e);
                }
            });
            match submitted {
                Ok(handle) => launched.push(handle),
                Err(e) => {
                    warn!("Cannot submit due job: {}", e);
                    break;
                }
            }
        }
        launched
    }
}
