//! Scheduler startup, shutdown and configuration checks.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ironclock_config::{Config, ConfigValidator, LoggingConfig, TasksConfig, ValidationResult};
use ironclock_scheduler::{
    MemoryJobStore, MemoryRunHistory, NoopSchedulerBackend, RunMode, SchedulerService,
    StaticTenants,
};
use ironclock_tasks::{TaskPoolConfig, WorkerPool};

use crate::runners::register_builtin_runners;
use crate::trigger::{job_config_from_entry, PollingTrigger};

/// Base directory for ironclock state (~/.ironclock).
pub(crate) fn ironclock_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".ironclock"))
        .unwrap_or_else(|| PathBuf::from(".ironclock"))
}

/// Initialize tracing with console and file output.
///
/// Log files rotate daily in the configured directory.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = logging.directory_path();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(logging.file_prefix.as_str())
        .filename_suffix("log")
        .max_log_files(logging.max_log_files)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keeps the file writer flushing until the process exits.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    let json = logging.json;
    tracing_subscriber::registry()
        .with(env_filter)
        .with((!json).then(|| fmt::layer().with_target(true).with_ansi(true)))
        .with(json.then(|| fmt::layer().json().with_current_span(false)))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()?;

    Ok(())
}

fn task_pool_config(tasks: &TasksConfig) -> TaskPoolConfig {
    TaskPoolConfig {
        max_workers: tasks.max_workers,
        shutdown_grace_secs: tasks.shutdown_grace_secs,
        cancel_timeout_ms: tasks.cancel_timeout_ms,
    }
}

fn log_validation(result: &ValidationResult) {
    for warning in &result.warnings {
        warn!("Config warning: {}", warning);
    }
    for err in &result.errors {
        error!("Config error: {}", err);
    }
}

/// Run the scheduler until Ctrl-C.
pub(crate) async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting ironclock v{}", env!("CARGO_PKG_VERSION"));
    info!("Node: {}", config.scheduler.node_id);

    let validation = ConfigValidator::validate(&config)?;
    log_validation(&validation);
    if !validation.is_valid() {
        return Err(format!("{} configuration error(s)", validation.errors.len()).into());
    }

    let store = Arc::new(MemoryJobStore::new());
    let service = Arc::new(SchedulerService::new(
        Arc::new(NoopSchedulerBackend),
        store.clone(),
        Arc::new(MemoryRunHistory::new()),
        Arc::new(StaticTenants::new(config.scheduler.tenants.clone())),
    ));
    register_builtin_runners(&service);

    for entry in &config.jobs {
        let (job_id, job_config) = job_config_from_entry(entry)?;
        service.schedule_job(&job_id, &job_config).await?;
    }
    info!("{} job(s) scheduled", store.len());

    let pool = Arc::new(WorkerPool::new(task_pool_config(&config.tasks)));
    service.start().await?;

    // This node is the whole cluster, so it also fires clustered jobs.
    let shutdown = CancellationToken::new();
    let trigger_tasks: Vec<_> = [RunMode::RunLocally, RunMode::RunOncePerCluster]
        .into_iter()
        .map(|run_mode| {
            let trigger = PollingTrigger::new(
                service.clone(),
                store.clone(),
                pool.clone(),
                run_mode,
                config.scheduler.tick_interval(),
            );
            let shutdown = shutdown.clone();
            tokio::spawn(async move { trigger.run(shutdown).await })
        })
        .collect();

    info!("ironclock ready, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    shutdown.cancel();
    for trigger_task in trigger_tasks {
        if let Err(e) = trigger_task.await {
            error!("Trigger task failed: {}", e);
        }
    }

    service.standby().await?;
    let idle_timeout = config.scheduler.idle_timeout();
    if !service.wait_until_idle(idle_timeout).await {
        warn!(
            running = service.locally_running_jobs().len(),
            "Jobs still running after {:?}",
            idle_timeout
        );
    }
    service.shutdown().await;
    pool.shutdown().await;

    info!("ironclock stopped");
    Ok(())
}

/// Validate the configuration and print a summary.
pub(crate) fn check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let validation = ConfigValidator::validate(config)?;

    for warning in &validation.warnings {
        println!("warning: {}", warning);
    }
    for err in &validation.errors {
        println!("error: {}", err);
    }
    if !validation.is_valid() {
        return Err(format!("{} configuration error(s)", validation.errors.len()).into());
    }

    println!("{} job(s) configured", config.jobs.len());
    for entry in &config.jobs {
        let (job_id, job_config) = job_config_from_entry(entry)?;
        println!(
            "  {:<24} {:<12} {:<22} {}",
            job_id.as_str(),
            job_config.job_runner_key().as_str(),
            job_config.run_mode().to_string(),
            job_config.schedule()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironclock_config::ConfigLoader;

    #[test]
    fn test_task_pool_config_mapping() {
        let tasks = TasksConfig {
            max_workers: 2,
            shutdown_grace_secs: 3,
            cancel_timeout_ms: 400,
        };
        let pool = task_pool_config(&tasks);
        assert_eq!(pool.max_workers, 2);
        assert_eq!(pool.shutdown_grace_secs, 3);
        assert_eq!(pool.cancel_timeout_ms, 400);
    }

    #[test]
    fn test_check_accepts_valid_config() {
        let config = ConfigLoader::load_str(
            r#"
            [[jobs]]
            id = "heartbeat"
            runner = "log"
            interval_ms = 1000
            "#,
        )
        .unwrap();
        assert!(check(&config).is_ok());
    }

    #[test]
    fn test_check_rejects_invalid_config() {
        let config = ConfigLoader::load_str(
            r#"
            [[jobs]]
            id = "broken"
            runner = "log"
            "#,
        )
        .unwrap();
        assert!(check(&config).is_err());
    }

    #[test]
    fn test_ironclock_dir() {
        assert!(ironclock_dir().ends_with(".ironclock"));
    }
}
