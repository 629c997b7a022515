//! Errors raised while loading a config file or turning its jobs into
//! scheduler jobs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// The `${VAR}` pattern used for substitution could not be built.
    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    /// A `${VAR}` reference names an unset environment variable.
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    /// A `[[jobs]]` entry has no usable schedule.
    #[error("Job '{job_id}' has an invalid schedule: {message}")]
    InvalidJobSchedule { job_id: String, message: String },

    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse config file: {0}")]
    TomlParse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_the_path() {
        let err = ConfigError::NotFound("/etc/ironclock/config.toml".to_string());
        assert_eq!(
            err.to_string(),
            "Config file not found: /etc/ironclock/config.toml"
        );
    }

    #[test]
    fn test_invalid_job_schedule_names_the_job() {
        let err = ConfigError::InvalidJobSchedule {
            job_id: "nightly".to_string(),
            message: "cron expression cannot be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Job 'nightly' has an invalid schedule: cron expression cannot be empty"
        );
    }

    #[test]
    fn test_env_var_not_set_names_the_variable() {
        let err = ConfigError::EnvVarNotSet("IRONCLOCK_NODE".to_string());
        assert!(err.to_string().ends_with("IRONCLOCK_NODE"));
    }

    #[test]
    fn test_io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConfigError = io_err.into();
        assert!(matches!(err, ConfigError::Io(_)));
        assert_eq!(err.to_string(), "Cannot read config file: denied");
    }

    #[test]
    fn test_toml_error_converts() {
        let toml_err = toml::from_str::<toml::Value>("jobs = [").unwrap_err();
        let err: ConfigError = toml_err.into();
        assert!(matches!(err, ConfigError::TomlParse(_)));
        assert!(err.to_string().starts_with("Cannot parse config file"));
    }
}
