//! Scheduler service: lifecycle state machine plus the registries it owns.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::{JobDetailsStore, RunHistory, TenantAccessor};
use crate::error::{SchedulerError, SchedulerResult};
use crate::job::{JobConfig, JobDetails};
use crate::lifecycle::{SchedulerBackend, SchedulerState};
use crate::registry::JobRunnerRegistry;
use crate::runner::JobRunner;
use crate::running::{RunningJob, RunningJobTracker};
use crate::types::{JobId, JobRunnerKey, RunDetails, RunOutcome};

/// One scheduler instance.
///
/// Owns the job runner registry and the running-job tracker, and drives the
/// `Standby -> Started -> Standby -> ... -> Shutdown` lifecycle. The three
/// transition methods hold a single gate for their whole duration, hook
/// included, so transitions never interleave.
pub struct SchedulerService {
    state: AtomicU8,
    transition_gate: Mutex<()>,
    backend: Arc<dyn SchedulerBackend>,
    store: Arc<dyn JobDetailsStore>,
    history: Arc<dyn RunHistory>,
    tenants: Arc<dyn TenantAccessor>,
    registry: JobRunnerRegistry,
    running: RunningJobTracker,
}

impl SchedulerService {
    /// Create a service in the `Standby` state.
    pub fn new(
        backend: Arc<dyn SchedulerBackend>,
        store: Arc<dyn JobDetailsStore>,
        history: Arc<dyn RunHistory>,
        tenants: Arc<dyn TenantAccessor>,
    ) -> Self {
        Self {
            state: AtomicU8::new(SchedulerState::Standby as u8),
            transition_gate: Mutex::new(()),
            backend,
            store,
            history,
            tenants,
            registry: JobRunnerRegistry::new(),
            running: RunningJobTracker::new(),
        }
    }

    /// Get current state.
    pub fn state(&self) -> SchedulerState {
        SchedulerState::from(self.state.load(Ordering::SeqCst))
    }

    /// Start executing jobs.
    ///
    /// No-op when already started; fails after shutdown. If the backend
    /// hook fails the state does not change.
    pub async fn start(&self) -> SchedulerResult<()> {
        let _gate = self.transition_gate.lock().await;
        match self.state() {
            SchedulerState::Started => return Ok(()),
            SchedulerState::Shutdown => return Err(SchedulerError::SchedulerShutDown),
            SchedulerState::Standby => {}
        }

        info!("Scheduler starting...");
        self.backend.start().await?;
        self.set_state(SchedulerState::Started);
        info!("Scheduler started");
        Ok(())
    }

    /// Stop executing jobs without shutting down.
    ///
    /// Asks every running job to cancel but does not wait for them.
    pub async fn standby(&self) -> SchedulerResult<()> {
        let _gate = self.transition_gate.lock().await;
        match self.state() {
            SchedulerState::Standby => return Ok(()),
            SchedulerState::Shutdown => return Err(SchedulerError::SchedulerShutDown),
            SchedulerState::Started => {}
        }

        info!("Scheduler entering standby...");
        self.running.cancel_all();
        self.backend.standby().await?;
        self.set_state(SchedulerState::Standby);
        info!("Scheduler in standby");
        Ok(())
    }

    /// Shut down permanently. Idempotent.
    ///
    /// The state is recorded as `Shutdown` before the backend hook runs, and
    /// stays so if the hook fails.
    pub async fn shutdown(&self) {
        let _gate = self.transition_gate.lock().await;
        if self.state() == SchedulerState::Shutdown {
            return;
        }

        info!("Scheduler shutting down...");
        self.running.cancel_all();
        self.set_state(SchedulerState::Shutdown);
        if let Err(e) = self.backend.shutdown().await {
            warn!("Scheduler backend shutdown hook failed: {}", e);
        }
        info!("Scheduler shut down");
    }

    fn set_state(&self, state: SchedulerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    // Job runners

    /// Register a runner, replacing any previous runner for `key`.
    pub fn register_job_runner(&self, key: JobRunnerKey, runner: Arc<dyn JobRunner>) {
        if self.registry.register(key.clone(), runner).is_some() {
            debug!(job_runner_key = %key, "Replaced existing job runner");
        }
    }

    pub fn unregister_job_runner(&self, key: &JobRunnerKey) {
        self.registry.unregister(key);
    }

    pub fn job_runner(&self, key: &JobRunnerKey) -> Option<Arc<dyn JobRunner>> {
        self.registry.get(key)
    }

    pub fn registered_job_runner_keys(&self) -> BTreeSet<JobRunnerKey> {
        self.registry.registered_keys()
    }

    // Running jobs

    /// Mark a job as running. Returns the existing occupant if the job is
    /// already running, in which case it must not be run again.
    pub fn enter_job(&self, job_id: JobId, job: Arc<RunningJob>) -> Option<Arc<RunningJob>> {
        self.running.enter(job_id, job)
    }

    /// Mark a job as finished. Must be paired with a successful `enter_job`.
    pub fn leave_job(&self, job_id: &JobId, job: &Arc<RunningJob>) -> SchedulerResult<()> {
        self.running.leave(job_id, job)
    }

    /// Snapshot of the jobs running in this process.
    pub fn locally_running_jobs(&self) -> Vec<Arc<RunningJob>> {
        self.running.snapshot()
    }

    /// Wait for all running jobs to finish, up to `timeout`.
    pub async fn wait_until_idle(&self, timeout: Duration) -> bool {
        self.running.wait_until_idle(timeout).await
    }

    // Scheduling

    /// Schedule a job under `job_id`, replacing any job with that ID.
    pub async fn schedule_job(&self, job_id: &JobId, config: &JobConfig) -> SchedulerResult<()> {
        if !self.tenants.has_available_tenant() {
            return Err(SchedulerError::NoTenantAvailable(job_id.clone()));
        }
        if self.state() == SchedulerState::Shutdown {
            return Err(SchedulerError::SchedulerShutDown);
        }

        self.store.schedule_job(job_id, config).await?;
        info!(
            job_id = %job_id,
            job_runner_key = %config.job_runner_key(),
            run_mode = %config.run_mode(),
            schedule = %config.schedule(),
            "Job scheduled"
        );
        Ok(())
    }

    /// Schedule a job under a freshly generated, unused ID.
    pub async fn schedule_job_with_generated_id(
        &self,
        config: &JobConfig,
    ) -> SchedulerResult<JobId> {
        let job_id = loop {
            let candidate = JobId::generate();
            if self.store.get_job_details(&candidate).await?.is_none() {
                break candidate;
            }
            debug!(job_id = %candidate, "Generated job ID already in use, retrying");
        };
        self.schedule_job(&job_id, config).await?;
        Ok(job_id)
    }

    pub async fn unschedule_job(&self, job_id: &JobId) -> SchedulerResult<()> {
        self.store.unschedule_job(job_id).await?;
        info!(job_id = %job_id, "Job unscheduled");
        Ok(())
    }

    pub async fn job_details(&self, job_id: &JobId) -> SchedulerResult<Option<JobDetails>> {
        self.store.get_job_details(job_id).await
    }

    pub async fn jobs_by_job_runner_key(
        &self,
        key: &JobRunnerKey,
    ) -> SchedulerResult<Vec<JobDetails>> {
        self.store.jobs_by_job_runner_key(key).await
    }

    // Run history

    pub async fn last_run(&self, job_id: &JobId) -> SchedulerResult<Option<RunDetails>> {
        self.history.last_run(job_id).await
    }

    pub async fn last_successful_run(&self, job_id: &JobId) -> SchedulerResult<Option<RunDetails>> {
        self.history.last_successful_run(job_id).await
    }

    pub(crate) async fn add_run_details(
        &self,
        job_id: &JobId,
        started_at: DateTime<Utc>,
        outcome: RunOutcome,
        message: Option<String>,
    ) -> SchedulerResult<RunDetails> {
        self.history
            .add_run_details(job_id, started_at, outcome, message)
            .await
    }

    pub(crate) fn backend(&self) -> &dyn SchedulerBackend {
        self.backend.as_ref()
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
