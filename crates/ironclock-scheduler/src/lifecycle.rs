//! Scheduler lifecycle states and the backend hooks behind them.
//!
//! The state machine itself lives on
//! [`SchedulerService`](crate::SchedulerService); this module defines the
//! states and the [`SchedulerBackend`] strategy the service delegates to.

use async_trait::async_trait;
use tracing::debug;

use crate::error::SchedulerResult;

/// Scheduler lifecycle state.
///
/// `Standby` is initial; `Shutdown` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    /// Not executing jobs.
    Standby = 0,
    /// Accepting and executing jobs.
    Started = 1,
    /// Permanently stopped.
    Shutdown = 2,
}

impl From<u8> for SchedulerState {
    fn from(v: u8) -> Self {
        match v {
            1 => SchedulerState::Started,
            2 => SchedulerState::Shutdown,
            _ => SchedulerState::Standby,
        }
    }
}

/// Start/stop behaviour of a concrete scheduler implementation.
///
/// Every method runs while the service holds its transition gate, so at
/// most one hook is in flight per service.
#[async_trait]
pub trait SchedulerBackend: Send + Sync {
    /// Begin firing jobs. A failure leaves the service in its previous state.
    async fn start(&self) -> SchedulerResult<()>;

    /// Stop firing jobs. Running jobs have already been asked to cancel.
    async fn standby(&self) -> SchedulerResult<()>;

    /// Release resources. The service is already marked shut down; a
    /// failure is logged and otherwise ignored.
    async fn shutdown(&self) -> SchedulerResult<()>;

    /// Called before a job runner is invoked.
    fn pre_job(&self) {}

    /// Called after a job runner returns, after the job has left the
    /// running-job tracker.
    fn post_job(&self) {}
}

/// Backend with no behaviour of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSchedulerBackend;

#[async_trait]
impl SchedulerBackend for NoopSchedulerBackend {
    async fn start(&self) -> SchedulerResult<()> {
        debug!("Noop backend started");
        Ok(())
    }

    async fn standby(&self) -> SchedulerResult<()> {
        debug!("Noop backend in standby");
        Ok(())
    }

    async fn shutdown(&self) -> SchedulerResult<()> {
        debug!("Noop backend shut down");
        Ok(())
    }
}
