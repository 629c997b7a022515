//! Job configuration and stored job details.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchedulerResult;
use crate::schedule::Schedule;
use crate::types::{JobId, JobRunnerKey, RunMode};

/// Ordered job parameters. Every value is JSON so it can be persisted and
/// replicated by any backend.
pub type JobParameters = BTreeMap<String, serde_json::Value>;

/// Immutable description of what a job runs and when.
///
/// The `with_*` methods return a modified copy and leave `self` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    job_runner_key: JobRunnerKey,
    run_mode: RunMode,
    schedule: Schedule,
    #[serde(default)]
    parameters: JobParameters,
}

impl JobConfig {
    /// A run-once, clustered job with no parameters.
    pub fn for_job_runner_key(job_runner_key: JobRunnerKey) -> Self {
        Self {
            job_runner_key,
            run_mode: RunMode::RunOncePerCluster,
            schedule: Schedule::run_once(None),
            parameters: JobParameters::new(),
        }
    }

    pub fn job_runner_key(&self) -> &JobRunnerKey {
        &self.job_runner_key
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn parameters(&self) -> &JobParameters {
        &self.parameters
    }

    pub fn with_job_runner_key(&self, job_runner_key: JobRunnerKey) -> Self {
        Self {
            job_runner_key,
            ..self.clone()
        }
    }

    pub fn with_run_mode(&self, run_mode: RunMode) -> Self {
        Self {
            run_mode,
            ..self.clone()
        }
    }

    pub fn with_schedule(&self, schedule: Schedule) -> Self {
        Self {
            schedule,
            ..self.clone()
        }
    }

    pub fn with_parameters(&self, parameters: JobParameters) -> Self {
        Self {
            parameters,
            ..self.clone()
        }
    }
}

/// A job as stored by the backend.
///
/// Parameters are kept in serialized form; decoding happens when the
/// launcher rebuilds the [`JobConfig`] and may fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetails {
    job_id: JobId,
    job_runner_key: JobRunnerKey,
    run_mode: RunMode,
    schedule: Schedule,
    raw_parameters: Vec<u8>,
}

impl JobDetails {
    pub fn new(
        job_id: JobId,
        job_runner_key: JobRunnerKey,
        run_mode: RunMode,
        schedule: Schedule,
        raw_parameters: Vec<u8>,
    ) -> Self {
        Self {
            job_id,
            job_runner_key,
            run_mode,
            schedule,
            raw_parameters,
        }
    }

    /// Serialize a config into stored details.
    pub fn from_config(job_id: JobId, config: &JobConfig) -> SchedulerResult<Self> {
        let raw_parameters = serde_json::to_vec(&config.parameters)?;
        Ok(Self::new(
            job_id,
            config.job_runner_key.clone(),
            config.run_mode,
            config.schedule.clone(),
            raw_parameters,
        ))
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn job_runner_key(&self) -> &JobRunnerKey {
        &self.job_runner_key
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn raw_parameters(&self) -> &[u8] {
        &self.raw_parameters
    }

    /// Decode the stored parameters.
    pub fn parameters(&self) -> SchedulerResult<JobParameters> {
        if self.raw_parameters.is_empty() {
            return Ok(JobParameters::new());
        }
        Ok(serde_json::from_slice(&self.raw_parameters)?)
    }

    /// Rebuild the job config these details were stored from.
    pub fn job_config(&self) -> SchedulerResult<JobConfig> {
        Ok(JobConfig::for_job_runner_key(self.job_runner_key.clone())
            .with_run_mode(self.run_mode)
            .with_schedule(self.schedule.clone())
            .with_parameters(self.parameters()?))
    }
}

impl fmt::Display for JobDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JobDetails[jobId={},jobRunnerKey={},runMode={},schedule={},rawParameters=({} bytes)]",
            self.job_id,
            self.job_runner_key,
            self.run_mode,
            self.schedule,
            self.raw_parameters.len()
        )
    }
}
