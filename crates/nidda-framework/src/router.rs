//! Ordered-route router for the Nidda framework.
//!
//! A [`Router`] holds route entries in registration order. Dispatching a
//! message:
//!
//! 1. Filters the entries whose [`RouteOptions`] admit the message
//! 2. Keeps those whose [`PathSpec`] matches the remaining text
//! 3. Runs the survivors one after another:
//!    - a nested router is dispatched with the derived route data and
//!      awaited, then the chain continues
//!    - a handler's [`Outcome`] decides: `Handled` stops, `Continue`
//!      advances, an error aborts and propagates
//!
//! ```rust,ignore
//! use nidda_framework::prelude::*;
//!
//! let admin = Router::named("admin")
//!     .route("kick", kick)
//!     .route("ban", ban);
//!
//! let router = Router::new()
//!     .route("*", audit)
//!     .route_with("ping", ping, RouteOptions::new().trigger(Trigger::Either))
//!     .nest("admin", admin)
//!     .route("*", fallback);
//!
//! router.dispatch_message(ctx).await?;
//! ```
//!
//! # Tower Service Integration
//!
//! `Router` implements `tower::Service<DispatchRequest>`, so timeouts, rate
//! limits and other middleware can wrap a whole router:
//!
//! ```rust,ignore
//! let service = ServiceBuilder::new()
//!     .layer(TimeoutLayer::new(Duration::from_secs(10)))
//!     .service(router);
//! ```

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use tower::Service;
use tracing::{Instrument, debug, debug_span, trace};

use nidda_core::{BotError, BotResult, MessageContext};

use crate::handler::{Handler, Outcome, into_handler};
use crate::module::Module;
use crate::path::{PathSpec, RouteData};
use crate::route::{RouteEntry, RouteOptions, RouteTarget};

#[derive(Clone, Default)]
struct RouterInner {
    name: Option<String>,
    entries: Vec<RouteEntry>,
}

/// An ordered collection of route entries.
///
/// Cloning is cheap; registration methods copy the entry list only when the
/// router is shared.
#[derive(Clone, Default)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router with a name used in log output.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                name: Some(name.into()),
                entries: Vec::new(),
            }),
        }
    }

    fn inner_mut(&mut self) -> &mut RouterInner {
        Arc::make_mut(&mut self.inner)
    }

    /// Registers a handler for `path`.
    pub fn route<H, T>(self, path: impl Into<PathSpec>, handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.route_with(path, handler, RouteOptions::default())
    }

    /// Registers a handler for `path` with options.
    pub fn route_with<H, T>(
        self,
        path: impl Into<PathSpec>,
        handler: H,
        options: RouteOptions,
    ) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        let target = RouteTarget::Handler(into_handler(handler));
        self.add(RouteEntry::new(path, target).with_options(options))
    }

    /// Mounts a nested router under `path`.
    pub fn nest(self, path: impl Into<PathSpec>, router: Router) -> Self {
        self.nest_with(path, router, RouteOptions::default())
    }

    /// Mounts a nested router under `path` with options.
    pub fn nest_with(
        self,
        path: impl Into<PathSpec>,
        router: Router,
        options: RouteOptions,
    ) -> Self {
        self.add(RouteEntry::new(path, RouteTarget::Router(router)).with_options(options))
    }

    /// Appends a prebuilt entry.
    pub fn add(mut self, entry: RouteEntry) -> Self {
        self.inner_mut().entries.push(entry);
        self
    }

    /// Lets a module register its routes.
    pub fn module<M: Module + ?Sized>(self, module: &M) -> Self {
        debug!(module = module.name(), "Registering module");
        module.register(self)
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    fn display_name(&self) -> &str {
        self.name().unwrap_or("unnamed")
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.inner.entries
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Dispatches a freshly parsed message from the top of its path.
    pub fn dispatch_message(&self, ctx: Arc<MessageContext>) -> BoxFuture<'static, BotResult<()>> {
        let route = RouteData::from_content(ctx.content());
        self.dispatch(route, ctx)
    }

    /// Dispatches `route` through this router.
    ///
    /// Resolves with `Ok(())` when a handler finished the chain, when the
    /// chain ran out, or when nothing matched. Errors from handlers and
    /// nested routers are returned unchanged.
    pub fn dispatch(
        &self,
        route: RouteData,
        ctx: Arc<MessageContext>,
    ) -> BoxFuture<'static, BotResult<()>> {
        let router = self.clone();
        let span = debug_span!("dispatch", router = router.display_name(), path = %route.text());
        Box::pin(async move { router.run(route, ctx).await }.instrument(span))
    }

    /// The entries that apply to `route`, each with the route data it sees.
    fn matched(&self, route: &RouteData, ctx: &MessageContext) -> Vec<(&RouteEntry, RouteData)> {
        let content = ctx.content();
        self.inner
            .entries
            .iter()
            .filter(|entry| entry.options.admits(content))
            .filter_map(|entry| {
                entry
                    .path
                    .match_text(route.text())
                    .map(|m| (entry, route.derive(m)))
            })
            .collect()
    }

    async fn run(&self, route: RouteData, ctx: Arc<MessageContext>) -> BotResult<()> {
        let matched = self.matched(&route, &ctx);
        if matched.is_empty() {
            trace!("No route matched");
            return Ok(());
        }

        debug!(matched = matched.len(), "Running route chain");

        for (index, (entry, derived)) in matched.into_iter().enumerate() {
            match &entry.target {
                RouteTarget::Router(router) => {
                    trace!(index, path = %entry.path, "Entering nested router");
                    router.dispatch(derived, Arc::clone(&ctx)).await?;
                }
                RouteTarget::Handler(handler) => {
                    trace!(index, path = %entry.path, "Executing handler");
                    let call = handler(derived, Arc::clone(&ctx));
                    let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                        Ok(result) => result?,
                        Err(panic) => return Err(BotError::Panicked(panic_message(panic))),
                    };
                    if outcome == Outcome::Handled {
                        debug!(index, path = %entry.path, "Route handled message");
                        return Ok(());
                    }
                }
            }
        }

        Ok(())
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        String::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("name", &self.inner.name)
            .field("entries", &self.inner.entries.len())
            .finish()
    }
}

// ============================================================================
// Tower Service Implementation for Router
// ============================================================================

/// A dispatch request for the router's `Service` implementation.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub route: RouteData,
    pub ctx: Arc<MessageContext>,
}

impl DispatchRequest {
    /// A request starting at the top of the message's path.
    pub fn new(ctx: Arc<MessageContext>) -> Self {
        Self {
            route: RouteData::from_content(ctx.content()),
            ctx,
        }
    }
}

impl Service<DispatchRequest> for Router {
    type Response = ();
    type Error = BotError;
    type Future = BoxFuture<'static, BotResult<()>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: DispatchRequest) -> Self::Future {
        self.dispatch(req.route, req.ctx)
    }
}
