//! # Nidda Core
//!
//! The state-carrying half of the Nidda chat-bot middleware.
//!
//! - **Content parsing**: [`content::parse`] tokenizes raw chat text into a
//!   routing path, named arguments, mentions, emoji and URLs
//! - **Sessions**: [`SessionStore`] hands out one mutable [`Session`] per
//!   guild (or channel outside guilds)
//! - **Context cache**: [`ContextCache`] resolves users and servers through a
//!   [`Resolver`] and memoizes them
//! - **Message context**: [`MessageContext`] bundles all of the above with the
//!   platform message for one dispatch chain
//!
//! Routing lives in `nidda-framework`; wiring and lifecycle in
//! `nidda-runtime`.
//!
//! ```text
//! IncomingMessage ──▶ parse ──▶ MessageContext ◀── SessionStore
//!                                     ▲
//!                                     └────────── ContextCache ◀── Resolver
//! ```

pub mod cache;
pub mod content;
pub mod context;
pub mod error;
pub mod message;
pub mod model;
pub mod session;

pub use cache::{CacheConfig, CacheKind, CachedObject, ContextCache, Resolver, cache_key};
pub use content::{EmojiRef, NamedArgs, ParseOptions, ParsedContent, parse};
pub use context::{MessageContext, ResolvedContext};
pub use error::{BotError, BotResult, SharedError};
pub use message::{BoxedMessage, ChannelKind, GuildRef, IncomingMessage, Payload};
pub use model::{Channel, Member, Server, User};
pub use session::{Session, SessionBag, SessionStore, scope_key};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        BotError, BotResult, ChannelKind, ContextCache, IncomingMessage, MessageContext,
        ParsedContent, Payload, Resolver, Session, SessionStore,
    };
}
