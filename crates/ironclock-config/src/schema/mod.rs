//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_jobs;
mod schema_runtime;

pub use schema_jobs::*;
pub use schema_runtime::*;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub tasks: TasksConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Jobs scheduled at startup.
    #[serde(default)]
    pub jobs: Vec<JobEntry>,
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
