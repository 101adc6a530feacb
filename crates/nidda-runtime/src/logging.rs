//! Logging setup for Nidda hosts.
//!
//! One fmt layer in the configured layout behind an [`EnvFilter`] (`RUST_LOG`
//! wins over the configured level). Routers open a `dispatch` span per
//! dispatch with `router` and `path` fields; [`SpanEvents`] decides whether
//! those spans show up as log lines, which is the easiest way to follow a
//! message through nested routers.
//!
//! ```rust,ignore
//! let config = nidda_runtime::config::load_config()?;
//! nidda_runtime::logging::init_from_config(&config.logging)?;
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SpanEvents};

const DEFAULT_LOG_FILE: &str = "nidda.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to open log file: {0}")]
    File(#[from] InitError),

    #[error(transparent)]
    Init(#[from] TryInitError),
}

impl SpanEvents {
    fn fmt_span(self) -> FmtSpan {
        match self {
            Self::None => FmtSpan::NONE,
            Self::Lifecycle => FmtSpan::NEW | FmtSpan::CLOSE,
            Self::Full => FmtSpan::FULL,
        }
    }
}

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Never => Rotation::NEVER,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
        }
    }
}

/// A log file and how it rolls over.
#[derive(Debug, Clone)]
struct FileSink {
    path: PathBuf,
    rotation: LogRotation,
    max_files: Option<usize>,
}

impl FileSink {
    fn appender(&self) -> Result<RollingFileAppender, InitError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let name = self
            .path
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or(DEFAULT_LOG_FILE);

        let mut builder = RollingFileAppender::builder()
            .rotation(self.rotation.into())
            .filename_prefix(name);
        if let Some(max) = self.max_files {
            builder = builder.max_log_files(max);
        }
        builder.build(dir)
    }
}

/// Installs the subscriber described by `config`.
///
/// Fails if a global subscriber is already set or the log file cannot be
/// opened.
pub fn init_from_config(config: &LoggingConfig) -> Result<(), LoggingError> {
    LoggingBuilder::from_config(config).try_init()
}

/// A builder for the global tracing subscriber.
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: LogLevel,
    directives: Vec<String>,
    format: LogFormat,
    span_events: SpanEvents,
    thread_ids: bool,
    location: bool,
    file: Option<FileSink>,
    stderr: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            directives: Vec::new(),
            format: LogFormat::Compact,
            span_events: SpanEvents::None,
            thread_ids: false,
            location: false,
            file: None,
            stderr: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        // Sorted so the filter does not depend on map order.
        let mut filters: Vec<_> = config.filters.iter().collect();
        filters.sort_by(|a, b| a.0.cmp(b.0));

        let file = match (config.output, &config.file_path) {
            (LogOutput::File, Some(path)) => Some(FileSink {
                path: path.clone(),
                rotation: config.rotation,
                max_files: config.max_files,
            }),
            _ => None,
        };

        Self {
            level: config.level,
            directives: filters
                .into_iter()
                .map(|(target, level)| format!("{target}={level}"))
                .collect(),
            format: config.format,
            span_events: config.span_events,
            thread_ids: config.thread_ids,
            location: config.file_location,
            file,
            stderr: config.output == LogOutput::Stderr,
        }
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Adds a filter directive such as `nidda_framework=trace`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Logs the `dispatch` spans opened by routers.
    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()));

        for directive in &self.directives {
            match directive.parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(e) => eprintln!("Ignoring invalid log directive {directive:?}: {e}"),
            }
        }
        filter
    }

    fn writer(&self) -> Result<BoxMakeWriter, InitError> {
        Ok(match &self.file {
            Some(sink) => BoxMakeWriter::new(sink.appender()?),
            None if self.stderr => BoxMakeWriter::new(std::io::stderr),
            None => BoxMakeWriter::new(std::io::stdout),
        })
    }

    fn layer(&self, writer: BoxMakeWriter) -> BoxedLayer {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_span_events(self.span_events.fmt_span())
            .with_thread_ids(self.thread_ids)
            .with_file(self.location)
            .with_line_number(self.location)
            // File output has no terminal to color.
            .with_ansi(self.file.is_none());

        match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
            // Without `json-log`, JSON falls back to the full layout.
            _ => layer.boxed(),
        }
    }

    /// Installs the subscriber, failing if one is already set.
    pub fn try_init(self) -> Result<(), LoggingError> {
        let layer = self.layer(self.writer()?);
        tracing_subscriber::registry()
            .with(layer)
            .with(self.filter())
            .try_init()?;
        Ok(())
    }
}
