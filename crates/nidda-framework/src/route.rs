//! Route entries and their admission options.

use std::fmt;

use serde::{Deserialize, Serialize};

use nidda_core::{ChannelKind, ParsedContent};

use crate::handler::BoxedHandler;
use crate::path::PathSpec;
use crate::router::Router;

/// How a message must address the bot for a route to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// The bot must be mentioned.
    Mentioned,
    /// The message must start with the command prefix.
    Command,
    /// Mentioned or command-prefixed.
    Either,
    #[default]
    Any,
}

impl Trigger {
    pub fn admits(self, content: &ParsedContent) -> bool {
        match self {
            Self::Mentioned => content.is_bot_mentioned,
            Self::Command => content.is_command_prefixed,
            Self::Either => content.is_bot_mentioned || content.is_command_prefixed,
            Self::Any => true,
        }
    }
}

/// Where a message must be posted for a route to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Guild channels only.
    Public,
    /// Direct messages only.
    Private,
}

impl Scope {
    pub fn admits(self, content: &ParsedContent) -> bool {
        match self {
            Self::Public => content.channel_kind == ChannelKind::Guild,
            Self::Private => content.channel_kind == ChannelKind::Private,
        }
    }
}

/// Filters applied to a route entry before its path is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteOptions {
    pub only_mentioned: bool,
    pub trigger: Trigger,
    pub scope: Option<Scope>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn only_mentioned(mut self, only_mentioned: bool) -> Self {
        self.only_mentioned = only_mentioned;
        self
    }

    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Returns `true` if a message with this content may reach the entry.
    pub fn admits(&self, content: &ParsedContent) -> bool {
        if self.only_mentioned && !content.is_bot_mentioned {
            return false;
        }
        self.trigger.admits(content) && self.scope.is_none_or(|scope| scope.admits(content))
    }
}

/// What a route entry runs when it matches.
#[derive(Clone)]
pub enum RouteTarget {
    Handler(BoxedHandler),
    Router(Router),
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Handler"),
            Self::Router(router) => f.debug_tuple("Router").field(router).finish(),
        }
    }
}

/// A single registration: a path, a target and its options.
///
/// Entries are immutable once added to a router.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub path: PathSpec,
    pub target: RouteTarget,
    pub options: RouteOptions,
}

impl RouteEntry {
    pub fn new(path: impl Into<PathSpec>, target: RouteTarget) -> Self {
        Self {
            path: path.into(),
            target,
            options: RouteOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RouteOptions) -> Self {
        self.options = options;
        self
    }

    pub fn is_router(&self) -> bool {
        matches!(self.target, RouteTarget::Router(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(mentioned: bool, prefixed: bool, kind: ChannelKind) -> ParsedContent {
        ParsedContent {
            is_bot_mentioned: mentioned,
            is_command_prefixed: prefixed,
            channel_kind: kind,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_options_admit_everything() {
        let options = RouteOptions::default();
        assert!(options.admits(&content(false, false, ChannelKind::Other)));
        assert!(options.admits(&content(true, true, ChannelKind::Guild)));
    }

    #[test]
    fn test_only_mentioned() {
        let options = RouteOptions::new().only_mentioned(true);
        assert!(!options.admits(&content(false, true, ChannelKind::Guild)));
        assert!(options.admits(&content(true, false, ChannelKind::Guild)));
    }

    #[test]
    fn test_triggers() {
        let plain = content(false, false, ChannelKind::Guild);
        let mention = content(true, false, ChannelKind::Guild);
        let command = content(false, true, ChannelKind::Guild);

        assert!(Trigger::Mentioned.admits(&mention));
        assert!(!Trigger::Mentioned.admits(&command));
        assert!(Trigger::Command.admits(&command));
        assert!(!Trigger::Command.admits(&plain));
        assert!(Trigger::Either.admits(&mention) && Trigger::Either.admits(&command));
        assert!(!Trigger::Either.admits(&plain));
        assert!(Trigger::Any.admits(&plain));
    }

    #[test]
    fn test_scope() {
        let options = RouteOptions::new().scope(Scope::Private);
        assert!(options.admits(&content(false, false, ChannelKind::Private)));
        assert!(!options.admits(&content(false, false, ChannelKind::Guild)));
        assert!(!RouteOptions::new()
            .scope(Scope::Public)
            .admits(&content(false, false, ChannelKind::Other)));
    }

    #[test]
    fn test_options_deserialize() {
        let options: RouteOptions =
            serde_json::from_str(r#"{"trigger":"either","scope":"public"}"#).unwrap();
        assert_eq!(options.trigger, Trigger::Either);
        assert_eq!(options.scope, Some(Scope::Public));
        assert!(!options.only_mentioned);
    }
}
