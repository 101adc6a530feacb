//! Per-scope session state.
//!
//! A [`SessionStore`] maps a scope key (a guild id, or a channel id outside
//! guilds) to a free-form [`Session`]. Sessions are created empty on first
//! access and live for as long as the store does; there is no expiry and
//! nothing is persisted.
//!
//! The store is an ordinary value: build one at startup and share it by
//! `Arc`. Concurrent dispatches for the same scope see the same session, so
//! handlers must expect other chains to touch it in between their awaits.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::error::BotResult;
use crate::message::IncomingMessage;

/// The record behind a session.
pub type SessionBag = HashMap<String, Value>;

/// A shared handle to one scope's session.
///
/// Cloning is cheap; every clone points at the same bag.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<SessionBag>>,
}

impl Session {
    /// Returns a clone of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().get(key).cloned()
    }

    /// Deserializes the value stored under `key`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> BotResult<Option<T>> {
        match self.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Stores a value, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.lock().insert(key.into(), value.into())
    }

    /// Serializes and stores a value.
    pub fn set_as<T: Serialize>(&self, key: impl Into<String>, value: &T) -> BotResult<()> {
        let value = serde_json::to_value(value)?;
        self.inner.lock().insert(key.into(), value);
        Ok(())
    }

    /// Removes a value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.lock().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Runs `f` with exclusive access to the bag.
    ///
    /// Use this for read-modify-write sequences that must not interleave
    /// with other dispatches.
    pub fn update<R>(&self, f: impl FnOnce(&mut SessionBag) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Locks the bag directly. Do not hold the guard across an `.await`.
    pub fn lock(&self) -> MutexGuard<'_, SessionBag> {
        self.inner.lock()
    }

    /// Returns `true` if both handles point at the same bag.
    pub fn ptr_eq(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Process-wide map from scope key to [`Session`].
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `scope`, creating an empty one on first use.
    pub fn get_or_create(&self, scope: &str) -> Session {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get(scope) {
            return session.clone();
        }

        trace!(scope, "Creating session");
        let session = Session::default();
        sessions.insert(scope.to_string(), session.clone());
        session
    }

    /// Returns the session of the scope `message` was posted in.
    pub fn for_message(&self, message: &dyn IncomingMessage) -> Session {
        self.get_or_create(scope_key(message))
    }

    /// Returns the session for `scope` without creating it.
    pub fn get(&self, scope: &str) -> Option<Session> {
        self.sessions.lock().get(scope).cloned()
    }

    /// Number of scopes seen so far.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

/// The scope a message belongs to: its guild, or its channel outside guilds.
pub fn scope_key(message: &dyn IncomingMessage) -> &str {
    match message.guild() {
        Some(guild) => &guild.id,
        None => message.channel_id(),
    }
}
