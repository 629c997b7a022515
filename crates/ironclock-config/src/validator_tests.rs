    use super::*;
    use crate::schema::{JobEntry, JobRunMode};
    use std::collections::BTreeMap;

    fn interval_job(id: &str, runner: &str) -> JobEntry {
        JobEntry {
            id: id.to_string(),
            runner: runner.to_string(),
            run_mode: JobRunMode::RunOncePerCluster,
            interval_ms: Some(1000),
            cron: None,
            first_run: None,
            time_zone: None,
            parameters: BTreeMap::new(),
        }
    }

    fn cron_job(id: &str, expression: &str) -> JobEntry {
        JobEntry {
            interval_ms: None,
            cron: Some(expression.to_string()),
            ..interval_job(id, "log")
        }
    }

    fn has_error(result: &ValidationResult, path: &str) -> bool {
        result.errors.iter().any(|e| e.path == path)
    }

    fn has_warning(result: &ValidationResult, path: &str) -> bool {
        result.warnings.iter().any(|w| w.path == path)
    }

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_zero_tick_interval_is_error() {
        let mut config = Config::default();
        config.scheduler.tick_interval_ms = 0;
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!result.is_valid());
        assert!(has_error(&result, "scheduler.tick_interval_ms"));
    }

    #[test]
    fn test_small_tick_interval_is_warning() {
        let mut config = Config::default();
        config.scheduler.tick_interval_ms = 10;
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(has_warning(&result, "scheduler.tick_interval_ms"));
    }

    #[test]
    fn test_empty_tenants_is_warning() {
        let mut config = Config::default();
        config.scheduler.tenants.clear();
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
        assert!(has_warning(&result, "scheduler.tenants"));
    }

    #[test]
    fn test_empty_node_id_is_error() {
        let mut config = Config::default();
        config.scheduler.node_id = "  ".to_string();
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(has_error(&result, "scheduler.node_id"));
    }

    #[test]
    fn test_zero_workers_is_error() {
        let mut config = Config::default();
        config.tasks.max_workers = 0;
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(has_error(&result, "tasks.max_workers"));
    }

    #[test]
    fn test_logging_checks() {
        let mut config = Config::default();
        config.logging.file_prefix = String::new();
        config.logging.max_log_files = 0;
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(has_error(&result, "logging.file_prefix"));
        assert!(has_warning(&result, "logging.max_log_files"));
    }

    #[test]
    fn test_valid_jobs() {
        let mut config = Config::default();
        config.jobs = vec![interval_job("a", "log"), cron_job("b", "0 * * * * *")];
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_duplicate_job_ids() {
        let mut config = Config::default();
        config.jobs = vec![interval_job("same", "log"), interval_job("same", "sleep")];
        let result = ConfigValidator::validate(&config).unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "jobs[1].id");
        assert!(result.errors[0].message.contains("same"));
    }

    #[test]
    fn test_empty_id_and_runner() {
        let mut config = Config::default();
        config.jobs = vec![interval_job("", "")];
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(has_error(&result, "jobs[0].id"));
        assert!(has_error(&result, "jobs[0].runner"));
    }

    #[test]
    fn test_both_schedules_set() {
        let mut job = interval_job("a", "log");
        job.cron = Some("0 * * * * *".to_string());
        let mut config = Config::default();
        config.jobs = vec![job];
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(has_error(&result, "jobs[0]"));
    }

    #[test]
    fn test_no_schedule_set() {
        let mut job = interval_job("a", "log");
        job.interval_ms = None;
        let mut config = Config::default();
        config.jobs = vec![job];
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(has_error(&result, "jobs[0]"));
    }

    #[test]
    fn test_time_zone_on_interval_job() {
        let mut job = interval_job("a", "log");
        job.time_zone = Some("Europe/Berlin".to_string());
        let mut config = Config::default();
        config.jobs = vec![job];
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(has_error(&result, "jobs[0].time_zone"));
    }

    #[test]
    fn test_interval_beyond_limit_is_error() {
        let mut config = Config::default();
        let mut job = interval_job("a", "log");
        job.interval_ms = Some(MAX_INTERVAL_MS);
        config.jobs = vec![job.clone()];
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(!has_error(&result, "jobs[0].interval_ms"));

        job.interval_ms = Some(u64::MAX);
        config.jobs = vec![job];
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(has_error(&result, "jobs[0].interval_ms"));
    }

    #[test]
    fn test_cron_job_checks() {
        let mut with_first_run = cron_job("b", "0 * * * * *");
        with_first_run.first_run = Some(chrono::Utc::now());
        let mut config = Config::default();
        config.jobs = vec![cron_job("a", " "), with_first_run];
        let result = ConfigValidator::validate(&config).unwrap();
        assert!(has_error(&result, "jobs[0].cron"));
        assert!(has_warning(&result, "jobs[1].first_run"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("jobs[0].id", "Job id cannot be empty");
        assert_eq!(err.to_string(), "jobs[0].id: Job id cannot be empty");
        let warning = ValidationWarning::new("scheduler.tenants", "none");
        assert_eq!(warning.to_string(), "scheduler.tenants: none");
    }
