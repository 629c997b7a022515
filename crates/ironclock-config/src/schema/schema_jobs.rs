//! Job definitions scheduled at startup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Run mode of a configured job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobRunMode {
    #[default]
    RunOncePerCluster,
    RunLocally,
}

/// A job definition.
///
/// Exactly one of `interval_ms` and `cron` must be set. `interval_ms = 0`
/// runs the job once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEntry {
    /// Unique job ID.
    pub id: String,

    /// Key of the job runner that executes the job.
    pub runner: String,

    #[serde(default)]
    pub run_mode: JobRunMode,

    /// Interval between runs in milliseconds.
    #[serde(default)]
    pub interval_ms: Option<u64>,

    /// Cron expression (seconds field first).
    #[serde(default)]
    pub cron: Option<String>,

    /// First run of an interval job, as an RFC 3339 string.
    #[serde(default)]
    pub first_run: Option<DateTime<Utc>>,

    /// Time zone for a cron job, e.g. `Europe/Berlin`.
    #[serde(default)]
    pub time_zone: Option<String>,

    /// Parameters passed to the runner.
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
}
