use super::*;
use std::sync::atomic::AtomicUsize;

use async_trait::async_trait;

use crate::memory::{MemoryJobStore, MemoryRunHistory, StaticTenants};
use crate::schedule::Schedule;

#[derive(Default)]
struct CountingBackend {
    starts: AtomicUsize,
    standbys: AtomicUsize,
    shutdowns: AtomicUsize,
    fail_start: bool,
    fail_shutdown: bool,
}

#[async_trait]
impl SchedulerBackend for CountingBackend {
    async fn start(&self) -> SchedulerResult<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            return Err(SchedulerError::LifecycleHook("start refused".into()));
        }
        Ok(())
    }

    async fn standby(&self) -> SchedulerResult<()> {
        self.standbys.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn shutdown(&self) -> SchedulerResult<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if self.fail_shutdown {
            return Err(SchedulerError::LifecycleHook("shutdown refused".into()));
        }
        Ok(())
    }
}

fn service_with(backend: Arc<CountingBackend>, tenants: Vec<String>) -> SchedulerService {
    SchedulerService::new(
        backend,
        Arc::new(MemoryJobStore::new()),
        Arc::new(MemoryRunHistory::new()),
        Arc::new(StaticTenants::new(tenants)),
    )
}

fn service(backend: Arc<CountingBackend>) -> SchedulerService {
    service_with(backend, vec!["default".to_string()])
}

#[tokio::test]
async fn test_lifecycle_sequence() {
    let backend = Arc::new(CountingBackend::default());
    let service = service(backend.clone());
    assert_eq!(service.state(), SchedulerState::Standby);

    service.start().await.unwrap();
    assert_eq!(service.state(), SchedulerState::Started);
    service.standby().await.unwrap();
    assert_eq!(service.state(), SchedulerState::Standby);
    service.start().await.unwrap();
    assert_eq!(service.state(), SchedulerState::Started);
    service.shutdown().await;
    assert_eq!(service.state(), SchedulerState::Shutdown);

    assert_eq!(backend.starts.load(Ordering::SeqCst), 2);
    assert_eq!(backend.standbys.load(Ordering::SeqCst), 1);
    assert_eq!(backend.shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_redundant_transitions_skip_hooks() {
    let backend = Arc::new(CountingBackend::default());
    let service = service(backend.clone());

    service.standby().await.unwrap();
    service.start().await.unwrap();
    service.start().await.unwrap();

    assert_eq!(backend.starts.load(Ordering::SeqCst), 1);
    assert_eq!(backend.standbys.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_start_and_standby_after_shutdown_fail() {
    let backend = Arc::new(CountingBackend::default());
    let service = service(backend.clone());
    service.shutdown().await;

    assert!(matches!(
        service.start().await,
        Err(SchedulerError::SchedulerShutDown)
    ));
    assert!(matches!(
        service.standby().await,
        Err(SchedulerError::SchedulerShutDown)
    ));
    assert_eq!(service.state(), SchedulerState::Shutdown);
    assert_eq!(backend.starts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let backend = Arc::new(CountingBackend::default());
    let service = service(backend.clone());

    service.shutdown().await;
    service.shutdown().await;

    assert_eq!(backend.shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_start_hook_keeps_state() {
    let backend = Arc::new(CountingBackend {
        fail_start: true,
        ..Default::default()
    });
    let service = service(backend.clone());

    assert!(service.start().await.is_err());
    assert_eq!(service.state(), SchedulerState::Standby);
}

#[tokio::test]
async fn test_failed_shutdown_hook_still_shuts_down() {
    let backend = Arc::new(CountingBackend {
        fail_shutdown: true,
        ..Default::default()
    });
    let service = service(backend.clone());

    service.shutdown().await;
    assert_eq!(service.state(), SchedulerState::Shutdown);
}

#[tokio::test]
async fn test_standby_cancels_running_jobs() {
    let service = service(Arc::new(CountingBackend::default()));
    service.start().await.unwrap();

    let id = JobId::of("long");
    let job = RunningJob::new(
        Utc::now(),
        id.clone(),
        JobConfig::for_job_runner_key(JobRunnerKey::of("sleep")),
    );
    assert!(service.enter_job(id.clone(), job.clone()).is_none());

    service.standby().await.unwrap();
    assert!(job.is_cancellation_requested());
    // still tracked until the runner returns
    assert_eq!(service.locally_running_jobs().len(), 1);

    service.leave_job(&id, &job).unwrap();
    assert!(service.wait_until_idle(Duration::from_millis(10)).await);
}

#[tokio::test]
async fn test_schedule_requires_tenant() {
    let service = service_with(Arc::new(CountingBackend::default()), Vec::new());
    let id = JobId::of("job");
    let config = JobConfig::for_job_runner_key(JobRunnerKey::of("reindex"));

    let result = service.schedule_job(&id, &config).await;
    assert!(matches!(result, Err(SchedulerError::NoTenantAvailable(ref job)) if *job == id));
    assert!(service.job_details(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_schedule_after_shutdown_fails() {
    let service = service(Arc::new(CountingBackend::default()));
    service.shutdown().await;

    let config = JobConfig::for_job_runner_key(JobRunnerKey::of("reindex"));
    assert!(matches!(
        service.schedule_job(&JobId::of("job"), &config).await,
        Err(SchedulerError::SchedulerShutDown)
    ));
}

#[tokio::test]
async fn test_schedule_and_query_jobs() {
    let service = service(Arc::new(CountingBackend::default()));
    let config = JobConfig::for_job_runner_key(JobRunnerKey::of("reindex"))
        .with_schedule(Schedule::for_interval(60_000, None));

    let generated = service.schedule_job_with_generated_id(&config).await.unwrap();
    service.schedule_job(&JobId::of("fixed"), &config).await.unwrap();

    let details = service.job_details(&generated).await.unwrap().unwrap();
    assert_eq!(details.schedule(), config.schedule());

    let jobs = service
        .jobs_by_job_runner_key(&JobRunnerKey::of("reindex"))
        .await
        .unwrap();
    assert_eq!(jobs.len(), 2);

    service.unschedule_job(&generated).await.unwrap();
    assert!(service.job_details(&generated).await.unwrap().is_none());
}

#[tokio::test]
async fn test_job_runner_registration() {
    struct Noop;

    #[async_trait]
    impl JobRunner for Noop {
        async fn run_job(
            &self,
            _request: &crate::runner::JobRunnerRequest,
        ) -> Result<Option<crate::runner::JobRunnerResponse>, crate::error::JobRunnerError> {
            Ok(None)
        }
    }

    let service = service(Arc::new(CountingBackend::default()));
    let key = JobRunnerKey::of("noop");
    service.register_job_runner(key.clone(), Arc::new(Noop));
    service.register_job_runner(key.clone(), Arc::new(Noop));

    assert!(service.job_runner(&key).is_some());
    assert_eq!(service.registered_job_runner_keys().len(), 1);

    service.unregister_job_runner(&key);
    assert!(service.job_runner(&key).is_none());
}
