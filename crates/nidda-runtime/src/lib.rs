//! Nidda Runtime - configuration, logging and the message bootstrap.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `NiddaConfig`)
//! - Logging setup (`LoggingBuilder`, `init_from_config`)
//! - The [`Bootstrap`] that turns inbound platform messages into dispatches
//!   and dispatch errors into replies
//! - Message counters (`DispatchStats`)
//!
//! ```rust,ignore
//! use nidda_runtime::Bootstrap;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bootstrap = Bootstrap::builder()
//!         .router(router)
//!         .resolver(resolver)
//!         .build()?;
//!
//!     let (tx, rx) = tokio::sync::mpsc::channel(64);
//!     spawn_platform_client(tx);
//!
//!     // Run until Ctrl+C
//!     bootstrap.run(rx).await?;
//!     Ok(())
//! }
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;
pub mod stats;

// Re-exports
pub use bootstrap::{Bootstrap, BootstrapBuilder, MessageOutcome};
pub use config::{
    BotSettings, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, NiddaConfig, SpanEvents,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, LoggingError, init_from_config};
pub use stats::{DispatchStats, StatsSnapshot};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// Provides the logging macros alongside the bootstrap types.
pub mod prelude {
    pub use super::{Bootstrap, MessageOutcome, NiddaConfig};
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
