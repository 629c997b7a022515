//! # ironclock-tasks
//!
//! Ad-hoc asynchronous tasks for ironclock, separate from timer-fired jobs.
//!
//! - [`WorkerPool`]: bounded pool with a drain-on-shutdown grace period
//! - [`TaskMonitor`]: lifecycle, cancellation and callbacks for one task
//! - [`TaskProcessor`]: runs a batch of tasks and fans results back in

pub mod config;
pub mod error;
pub mod message;
pub mod monitor;
pub mod pool;
pub mod processor;

pub use config::TaskPoolConfig;
pub use error::TaskError;
pub use message::{DefaultMessageResolver, MessageResolver};
pub use monitor::{
    CancelKey, RequestContext, TaskContext, TaskId, TaskMonitor, TaskProgress, TaskSnapshot,
    TaskState,
};
pub use pool::WorkerPool;
pub use processor::{ResultAggregator, TaskProcessor};
