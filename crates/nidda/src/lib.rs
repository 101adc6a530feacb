//! # Nidda
//!
//! An ordered-route middleware core for chat bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────────────┐     ┌──────────────────────────┐
//! │   Platform   │────▶│ Bootstrap                 │────▶│ Router                   │
//! │   client     │     │  parse → session → cache  │     │  route "*"   → audit     │
//! └──────────────┘     └───────────────────────────┘     │  nest "admin" → Router   │
//!        ▲                                               │  route "ping" → handler  │
//!        └──────────────── reply / send ─────────────────└──────────────────────────┘
//! ```
//!
//! - **Content parser**: splits raw text into words, flags, named arguments,
//!   mentions, emoji and URLs
//! - **Sessions**: one mutable bag per guild (or channel outside guilds)
//! - **Context cache**: memoized user/server lookups through a `Resolver`
//! - **Router**: ordered routes, nested routers, sequential handler chains
//! - **Bootstrap**: configuration, logging and the message loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nidda::prelude::*;
//!
//! async fn ping() -> &'static str {
//!     "pong"
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let router = Router::new().route("ping", ping);
//!     let bootstrap = Bootstrap::builder().router(router).build()?;
//!
//!     let (tx, rx) = tokio::sync::mpsc::channel(64);
//!     spawn_platform_client(tx);
//!     bootstrap.run(rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: `nidda.toml` configuration files
//! - `yaml-config`: `nidda.yaml` configuration files
//! - `json-log`: JSON log output

pub use nidda_core as core;
pub use nidda_framework as framework;
pub use nidda_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use nidda::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use nidda_runtime::{Bootstrap, MessageOutcome, NiddaConfig};

    // Routing
    pub use nidda_framework::{
        CurrentServer, CurrentUser, Module, Outcome, PathSpec, RouteData, RouteOptions, Router,
        Scope, Text, Tokens, Trigger,
    };

    // Messages, context and state
    pub use nidda_core::{
        BotError, BotResult, BoxedMessage, ChannelKind, GuildRef, IncomingMessage, MessageContext,
        ParsedContent, Payload, Resolver, Server, Session, User,
    };

    // Logging macros
    pub use nidda_runtime::tracing::{debug, error, info, trace, warn};
}
