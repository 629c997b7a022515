//! # ironclock-scheduler
//!
//! Scheduling core for ironclock.
//!
//! ## Components
//!
//! - [`JobRunnerRegistry`]: maps runner keys to job runners
//! - [`RunningJobTracker`]: jobs currently executing in this process
//! - [`SchedulerService`]: `Standby`/`Started`/`Shutdown` lifecycle owning both
//! - [`JobLauncher`]: runs one firing of a job and records its outcome
//!
//! Persistence, run history and tenant discovery are reached through the
//! traits in [`backend`]; [`memory`] provides in-process implementations.

pub mod backend;
pub mod error;
pub mod job;
pub mod launcher;
pub mod lifecycle;
pub mod memory;
pub mod registry;
pub mod runner;
pub mod running;
pub mod schedule;
pub mod service;
pub mod types;

pub use backend::{JobDetailsStore, RunHistory, TenantAccessor};
pub use error::{JobRunnerError, SchedulerError, SchedulerResult};
pub use job::{JobConfig, JobDetails, JobParameters};
pub use launcher::{JobLauncher, LaunchReport};
pub use lifecycle::{NoopSchedulerBackend, SchedulerBackend, SchedulerState};
pub use memory::{DueJob, MemoryJobStore, MemoryRunHistory, StaticTenants};
pub use registry::JobRunnerRegistry;
pub use runner::{JobRunner, JobRunnerRequest, JobRunnerResponse};
pub use running::{RunningJob, RunningJobTracker};
pub use schedule::{CronSchedule, IntervalSchedule, Schedule};
pub use service::SchedulerService;
pub use types::{JobId, JobRunnerKey, RunDetails, RunMode, RunOutcome};
