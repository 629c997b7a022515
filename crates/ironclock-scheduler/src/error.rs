//! Scheduler errors.

use thiserror::Error;

use crate::types::{JobId, JobRunnerKey};

/// Errors raised synchronously by the scheduler core.
///
/// Per-job outcomes (aborted, failed, unavailable runs) are not errors; they
/// are recorded as [`RunOutcome`](crate::RunOutcome) values through the run
/// history. Only lifecycle misuse, internal consistency faults and
/// collaborator failures surface here.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `start()` or `standby()` called after `shutdown()`.
    #[error("Scheduler has been shut down")]
    SchedulerShutDown,

    /// No handler is registered for the job's runner key.
    #[error("Job runner key '{0}' is not registered")]
    JobRunnerNotRegistered(JobRunnerKey),

    /// `enter`/`leave` were not called in matching pairs.
    #[error("Running job mismatch for job '{job_id}': {reason}")]
    RunningJobMismatch { job_id: JobId, reason: String },

    /// Scheduling attempted before any tenant is available.
    #[error("No tenant is available to schedule job '{0}'")]
    NoTenantAvailable(JobId),

    /// Schedule built with zero or two variants.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Cron expression could not be parsed.
    #[error("Invalid cron expression '{expression}': {message}")]
    InvalidCronExpression { expression: String, message: String },

    /// Time zone name could not be resolved.
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    /// Job parameters could not be serialized or deserialized.
    #[error("Parameter serialization error: {0}")]
    Parameters(#[from] serde_json::Error),

    /// A lifecycle hook of the backend failed.
    #[error("Lifecycle hook failed: {0}")]
    LifecycleHook(String),

    /// The job store or run history failed.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Fault returned by a job runner.
///
/// The launcher converts any of these into a `FAILED` run outcome.
#[derive(Debug, Error)]
pub enum JobRunnerError {
    /// Job logic failed.
    #[error("{0}")]
    Failed(String),

    /// The runner could not work with the job's configuration or environment.
    #[error("Incompatible job runner: {0}")]
    Incompatible(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_registered_names_key() {
        let err = SchedulerError::JobRunnerNotRegistered(JobRunnerKey::of("reindex"));
        assert_eq!(err.to_string(), "Job runner key 'reindex' is not registered");
    }

    #[test]
    fn test_mismatch_display() {
        let err = SchedulerError::RunningJobMismatch {
            job_id: JobId::of("job-1"),
            reason: "no job is registered".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("job-1"));
        assert!(display.contains("no job is registered"));
    }

    #[test]
    fn test_runner_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err = JobRunnerError::from(io_err);
        assert!(err.to_string().contains("missing file"));
    }
}
