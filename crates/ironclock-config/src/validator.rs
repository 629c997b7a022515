//! Configuration validation.

use std::collections::HashSet;
use std::fmt;

use crate::error::ConfigError;
use crate::schema::{Config, JobEntry};

/// Tick intervals below this are allowed but flagged.
const MIN_RECOMMENDED_TICK_MS: u64 = 100;

/// Longest accepted job interval, one hundred years.
const MAX_INTERVAL_MS: u64 = 3_155_760_000_000;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_scheduler(config, &mut result);
        Self::validate_tasks(config, &mut result);
        Self::validate_logging(config, &mut result);
        Self::validate_jobs(config, &mut result);

        Ok(result)
    }

    fn validate_scheduler(config: &Config, result: &mut ValidationResult) {
        let scheduler = &config.scheduler;

        if scheduler.tick_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "scheduler.tick_interval_ms",
                "tick_interval_ms must be greater than 0",
            ));
        } else if scheduler.tick_interval_ms < MIN_RECOMMENDED_TICK_MS {
            result.add_warning(ValidationWarning::new(
                "scheduler.tick_interval_ms",
                format!(
                    "tick_interval_ms is very low (<{}ms), the trigger will poll constantly",
                    MIN_RECOMMENDED_TICK_MS
                ),
            ));
        }

        if scheduler.node_id.trim().is_empty() {
            result.add_error(ValidationError::new(
                "scheduler.node_id",
                "node_id cannot be empty",
            ));
        }

        if scheduler.tenants.is_empty() {
            result.add_warning(ValidationWarning::new(
                "scheduler.tenants",
                "No tenants configured, scheduling jobs will fail",
            ));
        }
    }

    fn validate_tasks(config: &Config, result: &mut ValidationResult) {
        if config.tasks.max_workers == 0 {
            result.add_error(ValidationError::new(
                "tasks.max_workers",
                "max_workers must be greater than 0",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        if config.logging.file_prefix.trim().is_empty() {
            result.add_error(ValidationError::new(
                "logging.file_prefix",
                "file_prefix cannot be empty",
            ));
        }

        if config.logging.max_log_files == 0 {
            result.add_warning(ValidationWarning::new(
                "logging.max_log_files",
                "max_log_files is 0, log files will never be pruned",
            ));
        }
    }

    fn validate_jobs(config: &Config, result: &mut ValidationResult) {
        let mut seen = HashSet::new();

        for (i, job) in config.jobs.iter().enumerate() {
            let path = format!("jobs[{}]", i);

            if job.id.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.id", path),
                    "Job id cannot be empty",
                ));
            } else if !seen.insert(job.id.as_str()) {
                result.add_error(ValidationError::new(
                    format!("{}.id", path),
                    format!("Duplicate job id '{}'", job.id),
                ));
            }

            if job.runner.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.runner", path),
                    "Job runner cannot be empty",
                ));
            }

            Self::validate_job_schedule(&path, job, result);
        }
    }

    fn validate_job_schedule(path: &str, job: &JobEntry, result: &mut ValidationResult) {
        match (job.interval_ms, &job.cron) {
            (Some(_), Some(_)) => result.add_error(ValidationError::new(
                path,
                "Only one of interval_ms and cron may be set",
            )),
            (None, None) => result.add_error(ValidationError::new(
                path,
                "One of interval_ms and cron must be set",
            )),
            (Some(interval_ms), None) => {
                if interval_ms > MAX_INTERVAL_MS {
                    result.add_error(ValidationError::new(
                        format!("{}.interval_ms", path),
                        format!("interval_ms must not exceed {}", MAX_INTERVAL_MS),
                    ));
                }
                if job.time_zone.is_some() {
                    result.add_error(ValidationError::new(
                        format!("{}.time_zone", path),
                        "time_zone only applies to cron jobs",
                    ));
                }
            }
            (None, Some(cron)) => {
                if cron.trim().is_empty() {
                    result.add_error(ValidationError::new(
                        format!("{}.cron", path),
                        "cron expression cannot be empty",
                    ));
                }
                if job.first_run.is_some() {
                    result.add_warning(ValidationWarning::new(
                        format!("{}.first_run", path),
                        "first_run is ignored for cron jobs",
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
