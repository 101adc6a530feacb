//! Memoizing resolver for users and servers.
//!
//! [`ContextCache`] turns platform ids into domain objects through an
//! injected [`Resolver`] and keeps every object it resolved, keyed by
//! `"{kind}:{id}"`. Entries never expire.
//!
//! Concurrent misses for the same key each call the resolver unless
//! [`CacheConfig::dedupe_in_flight`] is set, in which case later callers
//! await the fetch that is already running.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::context::{MessageContext, ResolvedContext};
use crate::error::{BotError, BotResult};
use crate::model::{Server, User};

/// The persistence collaborator the cache resolves through.
#[async_trait]
pub trait Resolver: Send + Sync + 'static {
    /// Looks up a user. `Ok(None)` means the user is unknown.
    async fn resolve_user(&self, id: &str) -> BotResult<Option<User>>;

    /// Looks up a server. `Ok(None)` means the server is unknown.
    async fn resolve_server(&self, id: &str) -> BotResult<Option<Server>>;
}

/// What a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    User,
    Server,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the `"{kind}:{id}"` cache key.
pub fn cache_key(kind: CacheKind, id: &str) -> String {
    format!("{kind}:{id}")
}

/// A resolved domain object.
#[derive(Debug, Clone)]
pub enum CachedObject {
    User(Arc<User>),
    Server(Arc<Server>),
}

impl CachedObject {
    pub fn into_user(self) -> Option<Arc<User>> {
        match self {
            Self::User(user) => Some(user),
            Self::Server(_) => None,
        }
    }

    pub fn into_server(self) -> Option<Arc<Server>> {
        match self {
            Self::Server(server) => Some(server),
            Self::User(_) => None,
        }
    }
}

/// Cache behaviour switches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Share one resolver call between concurrent misses for the same key.
    pub dedupe_in_flight: bool,
}

type Fetch = Shared<BoxFuture<'static, BotResult<Option<CachedObject>>>>;

/// Memoizing user/server resolver.
pub struct ContextCache {
    resolver: Arc<dyn Resolver>,
    config: CacheConfig,
    entries: RwLock<HashMap<String, CachedObject>>,
    in_flight: Mutex<HashMap<String, Fetch>>,
}

impl ContextCache {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self::with_config(resolver, CacheConfig::default())
    }

    pub fn with_config(resolver: Arc<dyn Resolver>, config: CacheConfig) -> Self {
        Self {
            resolver,
            config,
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Number of cached objects.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the cached object for `kind`/`id`, resolving it on a miss.
    ///
    /// Unknown ids (`Ok(None)` from the resolver) are not cached, so they are
    /// looked up again next time.
    pub async fn get(&self, kind: CacheKind, id: &str) -> BotResult<Option<CachedObject>> {
        let key = cache_key(kind, id);
        if let Some(hit) = self.entries.read().get(&key).cloned() {
            trace!(%key, "Cache hit");
            return Ok(Some(hit));
        }

        debug!(%key, "Cache miss, resolving");
        if self.config.dedupe_in_flight {
            return self.fetch_shared(&key, kind, id).await;
        }

        let result = fetch(Arc::clone(&self.resolver), kind, id.to_string()).await;
        self.store(&key, &result);
        result
    }

    fn store(&self, key: &str, result: &BotResult<Option<CachedObject>>) {
        if let Ok(Some(object)) = result {
            self.entries.write().insert(key.to_string(), object.clone());
        }
    }

    /// Resolves a user.
    pub async fn user(&self, id: &str) -> BotResult<Option<Arc<User>>> {
        Ok(self
            .get(CacheKind::User, id)
            .await?
            .and_then(CachedObject::into_user))
    }

    /// Resolves a server.
    pub async fn server(&self, id: &str) -> BotResult<Option<Arc<Server>>> {
        Ok(self
            .get(CacheKind::Server, id)
            .await?
            .and_then(CachedObject::into_server))
    }

    /// Resolves the author and guild of a message and attaches them.
    ///
    /// Server and user are fetched concurrently. The member and channel are
    /// looked up inside the resolved server without further resolver calls.
    pub async fn apply(&self, ctx: &MessageContext) -> BotResult<ResolvedContext> {
        let message = ctx.message();
        let guild = message.guild().cloned();
        let author = message.author_id();

        let server = async {
            match &guild {
                Some(guild) => self.server(&guild.id).await,
                None => Ok(None),
            }
        };
        let (server, user) = futures::try_join!(server, self.user(author))?;

        let member = server.as_ref().and_then(|s| s.member(author).cloned());
        let channel = server
            .as_ref()
            .and_then(|s| s.channel(message.channel_id()).cloned());

        let resolved = ResolvedContext {
            server,
            user,
            member,
            guild,
            channel,
        };
        ctx.set_resolved(resolved.clone());
        Ok(resolved)
    }

    async fn fetch_shared(
        &self,
        key: &str,
        kind: CacheKind,
        id: &str,
    ) -> BotResult<Option<CachedObject>> {
        let pending = {
            let mut in_flight = self.in_flight.lock();
            // A fetch may have finished between the miss and taking the lock.
            if let Some(hit) = self.entries.read().get(key).cloned() {
                return Ok(Some(hit));
            }
            match in_flight.get(key) {
                Some(pending) => {
                    trace!(%key, "Joining in-flight fetch");
                    pending.clone()
                }
                None => {
                    let pending = fetch(Arc::clone(&self.resolver), kind, id.to_string())
                        .boxed()
                        .shared();
                    in_flight.insert(key.to_string(), pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;

        // Cache first, then retire the fetch.
        self.store(key, &result);
        let mut in_flight = self.in_flight.lock();
        if in_flight.get(key).is_some_and(|current| current.ptr_eq(&pending)) {
            in_flight.remove(key);
        }
        result
    }
}

impl fmt::Debug for ContextCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextCache")
            .field("config", &self.config)
            .field("entries", &self.entries.read().len())
            .finish_non_exhaustive()
    }
}

async fn fetch(
    resolver: Arc<dyn Resolver>,
    kind: CacheKind,
    id: String,
) -> BotResult<Option<CachedObject>> {
    let result = match kind {
        CacheKind::User => resolver
            .resolve_user(&id)
            .await
            .map(|user| user.map(|u| CachedObject::User(Arc::new(u)))),
        CacheKind::Server => resolver
            .resolve_server(&id)
            .await
            .map(|server| server.map(|s| CachedObject::Server(Arc::new(s)))),
    };

    result.map_err(|err| match err {
        upstream @ BotError::Upstream { .. } => upstream,
        other => BotError::Upstream {
            context: format!("resolve {}", cache_key(kind, &id)),
            source: Arc::new(other),
        },
    })
}
