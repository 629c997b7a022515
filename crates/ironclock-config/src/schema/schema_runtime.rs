//! Runtime configuration types (scheduler, task pool, logging).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::loader::ConfigLoader;

/// Scheduler service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Name of this node in logs and task ownership.
    #[serde(default = "default_node_id")]
    pub node_id: String,

    /// How often the trigger looks for due jobs, in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// How long shutdown waits for running jobs, in seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Tenants that may own jobs. Empty means none is available.
    #[serde(default = "default_tenants")]
    pub tenants: Vec<String>,
}

fn default_node_id() -> String {
    "local".to_string()
}

fn default_tick_interval() -> u64 {
    1000
}

fn default_idle_timeout() -> u64 {
    30
}

fn default_tenants() -> Vec<String> {
    vec!["default".to_string()]
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            tick_interval_ms: default_tick_interval(),
            idle_timeout_secs: default_idle_timeout(),
            tenants: default_tenants(),
        }
    }
}

/// Worker pool configuration for job execution and ad-hoc tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Maximum number of concurrent workers.
    #[serde(default = "default_max_workers")]
    pub max_workers: u32,

    /// Shutdown grace period in seconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,

    /// How long a cancel request waits for a running task, in milliseconds.
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

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            shutdown_grace_secs: default_shutdown_grace(),
            cancel_timeout_ms: default_cancel_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rolling log files.
    #[serde(default = "default_directory")]
    pub directory: String,

    /// File name prefix for log files.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Number of daily log files to keep.
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,

    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_directory() -> String {
    "~/.ironclock/logs".to_string()
}

fn default_file_prefix() -> String {
    "ironclock".to_string()
}

fn default_max_log_files() -> usize {
    30
}

impl LoggingConfig {
    /// Log directory with `~` expanded.
    pub fn directory_path(&self) -> PathBuf {
        PathBuf::from(ConfigLoader::expand_path(&self.directory))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: default_directory(),
            file_prefix: default_file_prefix(),
            max_log_files: default_max_log_files(),
            json: false,
        }
    }
}
