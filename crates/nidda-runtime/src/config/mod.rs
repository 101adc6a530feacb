//! Configuration module for the Nidda runtime.
//!
//! Layered loading (defaults, files, environment, overrides) through
//! figment, plus validation of the loaded values.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, load_config, load_config_from_file};
pub use schema::{
    BotSettings, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, NiddaConfig,
    SpanEvents,
};
pub use validation::validate_config;
