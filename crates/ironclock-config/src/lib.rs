//! # ironclock config
//!
//! TOML configuration for the ironclock scheduler: scheduler and worker
//! pool settings, logging, and the jobs scheduled at startup.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
