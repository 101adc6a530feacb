//! The per-message context shared by a whole dispatch chain.
//!
//! One [`MessageContext`] is created for each inbound message and wrapped in
//! an `Arc` that every handler (and every nested router) receives. It holds:
//!
//! - the platform message, which doubles as the reply sink,
//! - the [`ParsedContent`] computed once before dispatch,
//! - the scope's [`Session`],
//! - the [`ResolvedContext`] filled in by the context cache,
//! - a typed state map for handlers to pass data down the chain.
//!
//! The routing position (remaining path, arguments) is *not* here; it travels
//! separately so a nested router can see a shortened path without affecting
//! its parent.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::content::ParsedContent;
use crate::error::BotResult;
use crate::message::{BoxedMessage, GuildRef, Payload};
use crate::model::{Channel, Member, Server, User};
use crate::session::Session;

/// Domain objects attached to a message before dispatch.
#[derive(Debug, Clone, Default)]
pub struct ResolvedContext {
    pub server: Option<Arc<Server>>,
    pub user: Option<Arc<User>>,
    /// The author's membership in `server`.
    pub member: Option<Member>,
    /// The platform's view of the guild.
    pub guild: Option<GuildRef>,
    /// The channel the message was posted in, looked up in `server`.
    pub channel: Option<Channel>,
}

/// The shared context for one message.
pub struct MessageContext {
    message: BoxedMessage,
    content: ParsedContent,
    session: Session,
    resolved: RwLock<ResolvedContext>,
    state: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl MessageContext {
    pub fn new(message: BoxedMessage, content: ParsedContent, session: Session) -> Self {
        Self {
            message,
            content,
            session,
            resolved: RwLock::new(ResolvedContext::default()),
            state: Mutex::new(HashMap::new()),
        }
    }

    // ─── Message ──────────────────────────────────────────────────────────────

    pub fn message(&self) -> &BoxedMessage {
        &self.message
    }

    pub fn content(&self) -> &ParsedContent {
        &self.content
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns `true` if the bot was mentioned directly.
    pub fn is_bot_mentioned(&self) -> bool {
        self.content.is_bot_mentioned
    }

    /// Replies to the message.
    pub async fn reply(&self, text: &str) -> BotResult<()> {
        self.message.reply(text).await
    }

    /// Sends a payload to the message's channel.
    pub async fn send(&self, payload: Payload) -> BotResult<()> {
        self.message.send_to_channel(payload).await
    }

    // ─── Resolved domain objects ──────────────────────────────────────────────

    /// Replaces the resolved context.
    pub fn set_resolved(&self, resolved: ResolvedContext) {
        *self.resolved.write() = resolved;
    }

    /// Returns a snapshot of the resolved context.
    pub fn resolved(&self) -> ResolvedContext {
        self.resolved.read().clone()
    }

    pub fn user(&self) -> Option<Arc<User>> {
        self.resolved.read().user.clone()
    }

    pub fn server(&self) -> Option<Arc<Server>> {
        self.resolved.read().server.clone()
    }

    pub fn member(&self) -> Option<Member> {
        self.resolved.read().member.clone()
    }

    pub fn channel(&self) -> Option<Channel> {
        self.resolved.read().channel.clone()
    }

    pub fn guild(&self) -> Option<GuildRef> {
        self.resolved.read().guild.clone()
    }

    // ─── Typed state ──────────────────────────────────────────────────────────

    /// Stores a value for later handlers in this chain.
    ///
    /// Only one value per type is kept; later calls overwrite.
    pub fn set_state<T: Send + Sync + 'static>(&self, value: T) {
        self.state.lock().insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a clone of a stored value.
    pub fn get_state<T: Clone + 'static>(&self) -> Option<T> {
        self.state
            .lock()
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    pub fn has_state<T: 'static>(&self) -> bool {
        self.state.lock().contains_key(&TypeId::of::<T>())
    }

    /// Removes and returns a stored value.
    pub fn take_state<T: 'static>(&self) -> Option<T> {
        self.state
            .lock()
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }
}

impl std::fmt::Debug for MessageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageContext")
            .field("message", &self.message)
            .field("content", &self.content.raw_text)
            .field("resolved", &*self.resolved.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;

    use super::*;
    use crate::message::{ChannelKind, IncomingMessage};

    /// An in-memory message that records what was sent back.
    #[derive(Debug, Default)]
    pub struct RecordingMessage {
        pub content: String,
        pub author: String,
        pub channel: String,
        pub guild: Option<GuildRef>,
        pub replies: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl IncomingMessage for RecordingMessage {
        fn id(&self) -> &str {
            "m1"
        }

        fn content(&self) -> &str {
            &self.content
        }

        fn author_id(&self) -> &str {
            &self.author
        }

        fn channel_id(&self) -> &str {
            &self.channel
        }

        fn channel_kind(&self) -> ChannelKind {
            if self.guild.is_some() {
                ChannelKind::Guild
            } else {
                ChannelKind::Private
            }
        }

        fn guild(&self) -> Option<&GuildRef> {
            self.guild.as_ref()
        }

        async fn reply(&self, text: &str) -> BotResult<()> {
            self.replies.lock().push(text.to_string());
            Ok(())
        }

        async fn send_to_channel(&self, payload: Payload) -> BotResult<()> {
            self.replies.lock().push(payload.content.unwrap_or_default());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingMessage;
    use super::*;
    use crate::content::{ParseOptions, parse};

    fn context(text: &str) -> (Arc<RecordingMessage>, MessageContext) {
        let message = Arc::new(RecordingMessage {
            content: text.into(),
            author: "7".into(),
            channel: "c1".into(),
            ..Default::default()
        });
        let content = parse(text, &ParseOptions::default());
        let ctx = MessageContext::new(message.clone(), content, Session::default());
        (message, ctx)
    }

    #[tokio::test]
    async fn test_reply_goes_to_message() {
        let (message, ctx) = context("hi");
        ctx.reply("hello").await.unwrap();
        ctx.send(Payload::text("again")).await.unwrap();
        assert_eq!(*message.replies.lock(), vec!["hello", "again"]);
    }

    #[test]
    fn test_typed_state() {
        let (_, ctx) = context("hi");
        assert!(!ctx.has_state::<u32>());
        ctx.set_state(5u32);
        ctx.set_state(String::from("x"));
        assert_eq!(ctx.get_state::<u32>(), Some(5));
        assert_eq!(ctx.take_state::<String>(), Some("x".into()));
        assert!(!ctx.has_state::<String>());
    }

    #[test]
    fn test_resolved_roundtrip() {
        let (_, ctx) = context("hi");
        assert!(ctx.user().is_none());
        ctx.set_resolved(ResolvedContext {
            user: Some(Arc::new(User::new("7", "ann"))),
            ..Default::default()
        });
        assert_eq!(ctx.user().unwrap().name, "ann");
        assert!(ctx.server().is_none());
    }
}
