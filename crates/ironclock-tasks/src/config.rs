//! Worker pool configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPoolConfig {
    /// Maximum number of tasks running at once.
    #[serde(default = "default_max_workers")]
    pub max_workers: u32,

    /// How long shutdown waits for in-flight tasks, in seconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,

    /// Default wait for a running task to observe cancellation, in milliseconds.
    #[serde(default = "default_cancel_timeout")]
    pub cancel_timeout_ms: u64,
}

fn default_max_workers() -> u32 {
    4
}

fn default_shutdown_grace() -> u64 {
    30
}

fn default_cancel_timeout() -> u64 {
    5000
}

impl TaskPoolConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn cancel_timeout(&self) -> Duration {
        Duration::from_millis(self.cancel_timeout_ms)
    }
}

impl Default for TaskPoolConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            shutdown_grace_secs: default_shutdown_grace(),
            cancel_timeout_ms: default_cancel_timeout(),
        }
    }
}
