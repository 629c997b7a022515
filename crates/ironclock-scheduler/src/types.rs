//! Identifiers, run modes and run outcomes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a registered job runner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobRunnerKey(String);

impl JobRunnerKey {
    /// Create a key from its string form.
    pub fn of(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobRunnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Create a job ID from its string form.
    pub fn of(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a random job ID.
    ///
    /// Callers that store the ID must still check it for collisions.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where and how often a job may execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    /// Persisted; each firing runs on exactly one cluster node.
    RunOncePerCluster,
    /// Node-private; not persisted.
    RunLocally,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::RunOncePerCluster => f.write_str("RUN_ONCE_PER_CLUSTER"),
            RunMode::RunLocally => f.write_str("RUN_LOCALLY"),
        }
    }
}

/// Result of one firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    /// The runner completed.
    Success,
    /// The runner reported or raised a fault.
    Failed,
    /// The firing was rejected before the runner was invoked.
    Aborted,
    /// No runner is registered for the job.
    Unavailable,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Success => f.write_str("SUCCESS"),
            RunOutcome::Failed => f.write_str("FAILED"),
            RunOutcome::Aborted => f.write_str("ABORTED"),
            RunOutcome::Unavailable => f.write_str("UNAVAILABLE"),
        }
    }
}

/// Immutable record of one completed firing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDetails {
    started_at: DateTime<Utc>,
    outcome: RunOutcome,
    duration_millis: u64,
    message: String,
}

impl RunDetails {
    /// Longest message kept in a run record, in characters.
    pub const MAXIMUM_MESSAGE_LENGTH: usize = 255;

    pub fn new(
        started_at: DateTime<Utc>,
        outcome: RunOutcome,
        duration_millis: u64,
        message: Option<String>,
    ) -> Self {
        Self {
            started_at,
            outcome,
            duration_millis,
            message: truncate_message(message.unwrap_or_default()),
        }
    }

    /// Build a record for a run that started at `started_at` and ends now.
    pub fn completed_now(
        started_at: DateTime<Utc>,
        outcome: RunOutcome,
        message: Option<String>,
    ) -> Self {
        let duration_millis = (Utc::now() - started_at).num_milliseconds().max(0) as u64;
        Self::new(started_at, outcome, duration_millis, message)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    pub fn duration_millis(&self) -> u64 {
        self.duration_millis
    }

    /// The run message; empty when none was given.
    pub fn message(&self) -> &str {
        &self.message
    }
}

fn truncate_message(message: String) -> String {
    if message.chars().count() <= RunDetails::MAXIMUM_MESSAGE_LENGTH {
        return message;
    }
    message.chars().take(RunDetails::MAXIMUM_MESSAGE_LENGTH).collect()
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
