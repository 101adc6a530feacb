//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use nidda_core::CacheConfig;
use nidda_core::content::DEFAULT_COMMAND_PREFIX;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NiddaConfig {
    /// Message handling settings.
    #[serde(default)]
    pub bot: BotSettings,

    /// Context cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How inbound messages are parsed and filtered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Prefix that marks a message as a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// The bot's own user id, used to detect direct mentions.
    #[serde(default)]
    pub bot_id: Option<String>,

    /// Drop messages written by bots.
    #[serde(default = "default_true")]
    pub ignore_bots: bool,

    /// Log a line for every processed message.
    #[serde(default = "default_true")]
    pub echo: bool,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            bot_id: None,
            ignore_bots: true,
            echo: true,
        }
    }
}

fn default_command_prefix() -> String {
    DEFAULT_COMMAND_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `Full` without it.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which events of the `dispatch` span are logged.
///
/// Every dispatch, including each nested router, runs inside a `dispatch`
/// span carrying the router name and the remaining path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanEvents {
    #[default]
    None,
    /// One line when a dispatch opens and one with its timing when it closes.
    Lifecycle,
    /// Lifecycle plus every enter and exit.
    Full,
}

/// How often the log file is rolled over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    pub span_events: SpanEvents,
    pub thread_ids: bool,
    /// Include file names and line numbers.
    pub file_location: bool,
    /// Log file for `output = "file"`.
    pub file_path: Option<PathBuf>,
    pub rotation: LogRotation,
    /// Rolled files to keep; all of them when unset.
    pub max_files: Option<usize>,
    /// Per-target levels, e.g. `nidda_framework = "trace"`.
    pub filters: HashMap<String, LogLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NiddaConfig::default();
        assert_eq!(config.bot.command_prefix, "!");
        assert!(config.bot.ignore_bots);
        assert!(config.bot.echo);
        assert!(config.bot.bot_id.is_none());
        assert!(!config.cache.dedupe_in_flight);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: NiddaConfig = serde_json::from_str(
            r#"{"bot":{"bot_id":"42"},"logging":{"level":"debug","filters":{"nidda_framework":"trace"}}}"#,
        )
        .unwrap();
        assert_eq!(config.bot.bot_id.as_deref(), Some("42"));
        assert_eq!(config.bot.command_prefix, "!");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(
            config.logging.filters.get("nidda_framework"),
            Some(&LogLevel::Trace)
        );
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.rotation, LogRotation::Never);
    }

    #[test]
    fn test_rotation_settings() {
        let config: NiddaConfig = serde_json::from_str(
            r#"{"logging":{"output":"file","file_path":"logs/nidda.log","rotation":"daily","max_files":7,"span_events":"lifecycle"}}"#,
        )
        .unwrap();
        assert_eq!(config.logging.rotation, LogRotation::Daily);
        assert_eq!(config.logging.max_files, Some(7));
        assert_eq!(config.logging.span_events, SpanEvents::Lifecycle);
    }

    #[test]
    fn test_level_conversion() {
        assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
        assert_eq!(LogLevel::Trace.to_string(), "trace");
    }
}
