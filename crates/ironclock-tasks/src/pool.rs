//! Bounded worker pool.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::config::TaskPoolConfig;
use crate::error::TaskError;

/// Worker pool running at most `max_workers` tasks concurrently.
///
/// Submitted tasks are spawned immediately and wait for a permit before
/// running, so submission never blocks the caller.
pub struct WorkerPool {
    config: TaskPoolConfig,
    semaphore: Arc<Semaphore>,
    tracker: TaskTracker,
    total_completed: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Create a new worker pool.
    pub fn new(config: TaskPoolConfig) -> Self {
        let permits = config.max_workers.max(1) as usize;
        debug!("Worker pool created with {} workers", permits);
        Self {
            config,
            semaphore: Arc::new(Semaphore::new(permits)),
            tracker: TaskTracker::new(),
            total_completed: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &TaskPoolConfig {
        &self.config
    }

    /// Check if the pool has been shut down.
    pub fn is_shut_down(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Get number of idle workers.
    pub fn available_workers(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Tasks submitted and not yet finished, queued ones included.
    pub fn pending_tasks(&self) -> usize {
        self.tracker.len()
    }

    /// Get total finished task count.
    pub fn total_completed(&self) -> u64 {
        self.total_completed.load(Ordering::SeqCst)
    }

    /// Submit a future for execution.
    ///
    /// The returned handle yields the future's output, or a `JoinError`
    /// carrying its panic.
    pub fn execute<F>(&self, task: F) -> Result<JoinHandle<F::Output>, TaskError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        if self.is_shut_down() {
            return Err(TaskError::PoolShutDown);
        }

        let semaphore = self.semaphore.clone();
        let total_completed = self.total_completed.clone();
        Ok(self.tracker.spawn(async move {
            // The semaphore is never closed.
            let _permit = semaphore.acquire_owned().await.ok();
            let output = task.await;
            total_completed.fetch_add(1, Ordering::SeqCst);
            output
        }))
    }

    /// Stop accepting work and wait up to the grace period for in-flight
    /// tasks. Returns `false` if tasks were still running when it elapsed;
    /// those are left to finish on their own.
    pub async fn shutdown(&self) -> bool {
        self.tracker.close();
        info!("Worker pool shutting down, {} tasks pending", self.pending_tasks());

        let grace = self.config.shutdown_grace();
        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                info!("Worker pool stopped");
                true
            }
            Err(_) => {
                warn!(
                    pending = self.pending_tasks(),
                    "Worker pool grace period of {:?} elapsed; abandoning remaining tasks",
                    grace
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn pool(max_workers: u32, shutdown_grace_secs: u64) -> WorkerPool {
        WorkerPool::new(TaskPoolConfig {
            max_workers,
            shutdown_grace_secs,
            ..Default::default()
        })
    }

    #[test]
    fn test_worker_pool_new() {
        let pool = pool(4, 1);
        assert!(!pool.is_shut_down());
        assert_eq!(pool.available_workers(), 4);
        assert_eq!(pool.total_completed(), 0);
    }

    #[tokio::test]
    async fn test_execute_returns_output() {
        let pool = pool(2, 1);
        let handle = pool.execute(async { 21 * 2 }).unwrap();
        assert_eq!(handle.await.unwrap(), 42);
        assert_eq!(pool.total_completed(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let pool = pool(2, 5);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let active = active.clone();
                let peak = peak.clone();
                pool.execute(async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
                .unwrap()
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.total_completed(), 8);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_work() {
        let pool = pool(1, 1);
        assert!(pool.shutdown().await);
        assert!(pool.is_shut_down());
        assert_eq!(pool.execute(async {}).err(), Some(TaskError::PoolShutDown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_after_grace() {
        let pool = pool(1, 1);
        pool.execute(tokio::time::sleep(Duration::from_secs(60))).unwrap();

        assert!(!pool.shutdown().await);
        assert_eq!(pool.pending_tasks(), 1);
    }
}
