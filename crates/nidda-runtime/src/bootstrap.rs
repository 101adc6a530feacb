//! Message bootstrap: the glue between a platform client and the router.
//!
//! For every inbound message the [`Bootstrap`]:
//!
//! 1. Drops messages written by bots (unless `bot.ignore_bots = false`)
//! 2. Parses the content with the configured command prefix and bot id
//! 3. Attaches the scope's session and, with a resolver, the cached
//!    user/server context
//! 4. Dispatches through the root [`Router`]
//! 5. Turns a dispatch error into a reply and updates the counters
//!
//! ```rust,ignore
//! use nidda_runtime::Bootstrap;
//!
//! let bootstrap = Bootstrap::builder()
//!     .config_file("nidda.toml")
//!     .router(router)
//!     .resolver(Arc::new(MyDatabase::connect().await?))
//!     .build()?;
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(64);
//! platform.forward_messages_to(tx);
//! bootstrap.run(rx).await?;
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use nidda_core::{
    BotError, BoxedMessage, ContextCache, MessageContext, ParseOptions, Resolver, ResolvedContext,
    SessionStore, parse,
};
use nidda_framework::{Module, Router};

use crate::config::{ConfigLoader, NiddaConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging::{self, LoggingError};
use crate::stats::{DispatchStats, StatsSnapshot};

/// What happened to one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Dropped before parsing.
    Ignored,
    /// The router ran to completion.
    Dispatched,
    /// Context resolution or dispatch failed; the author got an error reply.
    Failed,
}

struct BootstrapInner {
    config: NiddaConfig,
    router: Router,
    sessions: Arc<SessionStore>,
    cache: Option<Arc<ContextCache>>,
    parse_options: ParseOptions,
    stats: DispatchStats,
}

/// Runs inbound messages through parsing, context resolution and dispatch.
///
/// Cloning is cheap; clones share the session store, cache and counters.
#[derive(Clone)]
pub struct Bootstrap {
    inner: Arc<BootstrapInner>,
}

impl Bootstrap {
    pub fn builder() -> BootstrapBuilder {
        BootstrapBuilder::new()
    }

    pub fn config(&self) -> &NiddaConfig {
        &self.inner.config
    }

    pub fn router(&self) -> &Router {
        &self.inner.router
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.inner.sessions
    }

    pub fn cache(&self) -> Option<&Arc<ContextCache>> {
        self.inner.cache.as_ref()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Processes one message to completion.
    pub async fn handle_message(&self, message: BoxedMessage) -> MessageOutcome {
        let inner = &self.inner;
        inner.stats.record_received();

        if inner.config.bot.ignore_bots && message.author_is_bot() {
            debug!(message_id = message.id(), author = message.author_id(), "Ignoring bot message");
            inner.stats.record_ignored();
            return MessageOutcome::Ignored;
        }

        let started = Instant::now();
        let options = inner.parse_options.clone().channel_kind(message.channel_kind());
        let content = parse(message.content(), &options);
        let session = inner.sessions.for_message(message.as_ref());
        let ctx = Arc::new(MessageContext::new(Arc::clone(&message), content, session));

        let resolved = match &inner.cache {
            Some(cache) => cache.apply(&ctx).await.map(|_| ()),
            None => {
                ctx.set_resolved(ResolvedContext {
                    guild: message.guild().cloned(),
                    ..Default::default()
                });
                Ok(())
            }
        };

        let result = match resolved {
            Ok(()) => inner.router.dispatch_message(Arc::clone(&ctx)).await,
            Err(err) => Err(err),
        };

        let outcome = match result {
            Ok(()) => {
                inner.stats.record_dispatched();
                MessageOutcome::Dispatched
            }
            Err(err) => {
                inner.stats.record_failed();
                self.report_error(&ctx, &err).await;
                MessageOutcome::Failed
            }
        };

        if inner.config.bot.echo {
            info!(
                message_id = message.id(),
                author = message.author_id(),
                channel = message.channel_id(),
                command = ctx.content().command.as_deref().unwrap_or(""),
                outcome = ?outcome,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Message processed"
            );
        }

        outcome
    }

    /// Logs a failed dispatch and tells the author.
    async fn report_error(&self, ctx: &MessageContext, err: &BotError) {
        let message = ctx.message();
        if err.is_internal() {
            error!(message_id = message.id(), error = %err, "Dispatch failed");
        } else {
            warn!(message_id = message.id(), error = %err, "Dispatch rejected");
        }

        if let Err(reply_err) = ctx.reply(&err.user_message()).await {
            error!(
                message_id = message.id(),
                error = %reply_err,
                "Failed to send error reply"
            );
        }
    }

    /// Processes messages from `inbound` until Ctrl+C or until the channel
    /// closes.
    pub async fn run(&self, inbound: mpsc::Receiver<BoxedMessage>) -> RuntimeResult<()> {
        let token = CancellationToken::new();

        let watcher = {
            let token = token.clone();
            async move {
                tokio::select! {
                    res = signal::ctrl_c() => {
                        token.cancel();
                        res.map(|()| info!("Received Ctrl+C, shutting down"))
                    }
                    _ = token.cancelled() => Ok(()),
                }
            }
        };

        let serve = async {
            self.run_until(inbound, token.clone()).await;
            token.cancel();
        };

        info!("Nidda bootstrap is now running. Press Ctrl+C to stop.");
        let (signal_result, ()) = tokio::join!(watcher, serve);
        signal_result?;
        Ok(())
    }

    /// Processes messages until `shutdown` is cancelled or the channel
    /// closes.
    ///
    /// Each message runs in its own task. After shutdown no new messages are
    /// taken, and messages already being handled run to completion.
    pub async fn run_until(
        &self,
        mut inbound: mpsc::Receiver<BoxedMessage>,
        shutdown: CancellationToken,
    ) {
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, no longer accepting messages");
                    break;
                }
                message = inbound.recv() => match message {
                    Some(message) => {
                        let this = self.clone();
                        tasks.spawn(async move { this.handle_message(message).await });
                    }
                    None => {
                        info!("Inbound channel closed");
                        break;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Message task failed");
                    }
                }
            }
        }

        if !tasks.is_empty() {
            debug!(in_flight = tasks.len(), "Waiting for in-flight messages");
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Message task failed");
            }
        }

        info!(stats = %self.stats(), "Bootstrap stopped");
    }
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("router", &self.inner.router)
            .field("sessions", &self.inner.sessions.len())
            .field("cache", &self.inner.cache.is_some())
            .field("stats", &self.stats())
            .finish()
    }
}

// =============================================================================
// BootstrapBuilder
// =============================================================================

/// Builder for a [`Bootstrap`].
///
/// Without an explicit [`config`](Self::config) the configuration is loaded
/// through a [`ConfigLoader`] searching the current directory.
pub struct BootstrapBuilder {
    config_loader: ConfigLoader,
    config: Option<NiddaConfig>,
    router: Router,
    resolver: Option<Arc<dyn Resolver>>,
    sessions: Option<Arc<SessionStore>>,
    init_logging: bool,
}

impl BootstrapBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            config: None,
            router: Router::new(),
            resolver: None,
            sessions: None,
            init_logging: true,
        }
    }

    /// Uses a ready configuration instead of loading one.
    pub fn config(mut self, config: NiddaConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Sets the root router, replacing any routes added so far.
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Lets a module register routes on the root router.
    pub fn module<M: Module + ?Sized>(mut self, module: &M) -> Self {
        self.router = self.router.module(module);
        self
    }

    /// Enables the context cache backed by `resolver`.
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Shares an existing session store.
    pub fn sessions(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Leaves the global tracing subscriber alone.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    pub fn build(self) -> RuntimeResult<Bootstrap> {
        let config = match self.config {
            Some(config) => {
                validate_config(&config)?;
                config
            }
            None => self.config_loader.load()?,
        };

        if self.init_logging {
            match logging::init_from_config(&config.logging) {
                // A subscriber installed by the host is kept.
                Ok(()) | Err(LoggingError::Init(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }

        let mut parse_options = ParseOptions::default().command_prefix(&config.bot.command_prefix);
        if let Some(bot_id) = &config.bot.bot_id {
            parse_options = parse_options.bot_id(bot_id);
        }

        let cache = self
            .resolver
            .map(|resolver| Arc::new(ContextCache::with_config(resolver, config.cache.clone())));

        info!(
            routes = self.router.len(),
            command_prefix = %config.bot.command_prefix,
            cache = cache.is_some(),
            "Bootstrap initialized"
        );

        Ok(Bootstrap {
            inner: Arc::new(BootstrapInner {
                router: self.router,
                sessions: self.sessions.unwrap_or_default(),
                cache,
                parse_options,
                stats: DispatchStats::new(),
                config,
            }),
        })
    }
}

impl Default for BootstrapBuilder {
    fn default() -> Self {
        Self::new()
    }
}
