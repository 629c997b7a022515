//! Batch execution on the worker pool.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::TaskPoolConfig;
use crate::error::{TaskError, panic_message};
use crate::pool::WorkerPool;

/// Receives task results as they complete.
pub trait ResultAggregator<T> {
    fn accept(&mut self, result: Result<T, TaskError>);
}

impl<T, F> ResultAggregator<T> for F
where
    F: FnMut(Result<T, TaskError>),
{
    fn accept(&mut self, result: Result<T, TaskError>) {
        self(result)
    }
}

/// Runs batches of independent tasks on a bounded worker pool.
pub struct TaskProcessor {
    pool: WorkerPool,
}

impl TaskProcessor {
    pub fn new(config: TaskPoolConfig) -> Self {
        Self {
            pool: WorkerPool::new(config),
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Run every task and feed each result to `aggregator` in completion
    /// order. Returns once all submitted tasks have reported.
    ///
    /// Waiting happens on the caller; no worker is held while results are
    /// collected. A panicking task is reported as [`TaskError::Panicked`].
    /// If the pool shuts down part-way, results of the tasks already
    /// submitted are still collected before the error is returned.
    pub async fn run_and_wait<I, F, T, A>(
        &self,
        tasks: I,
        aggregator: &mut A,
    ) -> Result<usize, TaskError>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = Result<T, TaskError>> + Send + 'static,
        T: Send + 'static,
        A: ResultAggregator<T> + ?Sized,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut submitted = 0usize;
        let mut rejected = None;

        for task in tasks {
            let tx = tx.clone();
            let submission = self.pool.execute(async move {
                let result = match AssertUnwindSafe(task).catch_unwind().await {
                    Ok(result) => result,
                    Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
                };
                // receiver only goes away if the caller stopped waiting
                let _ = tx.send(result);
            });
            match submission {
                Ok(_) => submitted += 1,
                Err(e) => {
                    warn!("Task batch cut short after {} tasks: {}", submitted, e);
                    rejected = Some(e);
                    break;
                }
            }
        }
        drop(tx);
        debug!("Waiting for {} tasks", submitted);

        let mut received = 0usize;
        while let Some(result) = rx.recv().await {
            aggregator.accept(result);
            received += 1;
        }
        if received < submitted {
            warn!("{} of {} tasks never reported a result", submitted - received, submitted);
        }

        match rejected {
            Some(e) => Err(e),
            None => Ok(received),
        }
    }

    /// Stop accepting work and wait out the grace period.
    pub async fn shutdown(&self) -> bool {
        self.pool.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn processor(max_workers: u32) -> TaskProcessor {
        TaskProcessor::new(TaskPoolConfig {
            max_workers,
            shutdown_grace_secs: 1,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_results_arrive_in_completion_order() {
        let processor = processor(4);
        let tasks = [80_u64, 0, 40].map(|delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok::<_, TaskError>(delay)
        });

        let mut seen = Vec::new();
        let count = processor
            .run_and_wait(tasks, &mut |result: Result<u64, TaskError>| {
                seen.push(result.unwrap())
            })
            .await
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(seen, vec![0, 40, 80]);
    }

    #[tokio::test]
    async fn test_failures_and_panics_are_aggregated() {
        struct Tally {
            ok: usize,
            failed: Vec<TaskError>,
        }

        impl ResultAggregator<u8> for Tally {
            fn accept(&mut self, result: Result<u8, TaskError>) {
                match result {
                    Ok(_) => self.ok += 1,
                    Err(e) => self.failed.push(e),
                }
            }
        }

        fn explode() -> Result<u8, TaskError> {
            panic!("worker blew up")
        }

        let processor = processor(2);
        let tasks: Vec<futures::future::BoxFuture<'static, Result<u8, TaskError>>> = vec![
            async { Ok::<u8, TaskError>(1) }.boxed(),
            async { Err::<u8, _>(TaskError::failed("bad input")) }.boxed(),
            async { explode() }.boxed(),
        ];

        let mut tally = Tally {
            ok: 0,
            failed: Vec::new(),
        };
        processor.run_and_wait(tasks, &mut tally).await.unwrap();

        assert_eq!(tally.ok, 1);
        assert_eq!(tally.failed.len(), 2);
        assert!(tally.failed.contains(&TaskError::failed("bad input")));
        assert!(
            tally
                .failed
                .contains(&TaskError::Panicked("worker blew up".into()))
        );
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let processor = processor(1);
        let tasks: Vec<futures::future::Ready<Result<(), TaskError>>> = Vec::new();
        let count = processor
            .run_and_wait(tasks, &mut |_: Result<(), TaskError>| {})
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_run_after_shutdown_is_rejected() {
        let processor = processor(1);
        assert!(processor.shutdown().await);

        let result = processor
            .run_and_wait([async { Ok::<_, TaskError>(()) }], &mut |_: Result<(), TaskError>| {})
            .await;
        assert_eq!(result, Err(TaskError::PoolShutDown));
    }
}
