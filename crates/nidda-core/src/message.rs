//! Inbound message abstraction.
//!
//! The platform client wraps each chat message in a type implementing
//! [`IncomingMessage`]. Besides exposing the raw fields the core needs for
//! parsing and context resolution, it is the only way handlers produce
//! observable output: [`reply`](IncomingMessage::reply) and
//! [`send_to_channel`](IncomingMessage::send_to_channel).

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BotResult;

/// The kind of channel a message was posted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// A text channel inside a guild.
    Guild,
    /// A direct message.
    Private,
    /// Anything else (group DMs, threads the platform reports oddly, ...).
    #[default]
    Other,
}

/// The guild a message was posted in, as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRef {
    /// Platform guild id.
    pub id: String,
    /// Display name at the time of the message.
    pub name: String,
}

impl GuildRef {
    /// Creates a new guild reference.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A structured payload for [`IncomingMessage::send_to_channel`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    /// Plain text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Platform-specific rich embeds, passed through untouched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Value>,
}

impl Payload {
    /// Creates a text-only payload.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
        }
    }

    /// Adds an embed.
    pub fn embed(mut self, embed: Value) -> Self {
        self.embeds.push(embed);
        self
    }
}

/// A chat message delivered by the host platform.
#[async_trait]
pub trait IncomingMessage: Debug + Send + Sync + 'static {
    /// Platform message id.
    fn id(&self) -> &str;

    /// Raw text content.
    fn content(&self) -> &str;

    /// Id of the author.
    fn author_id(&self) -> &str;

    /// Whether the author is a bot account.
    fn author_is_bot(&self) -> bool {
        false
    }

    /// Id of the channel the message was posted in.
    fn channel_id(&self) -> &str;

    /// Kind of that channel.
    fn channel_kind(&self) -> ChannelKind;

    /// The guild, if the message was posted in one.
    fn guild(&self) -> Option<&GuildRef>;

    /// Replies to the message.
    async fn reply(&self, text: &str) -> BotResult<()>;

    /// Sends a payload to the channel the message came from.
    async fn send_to_channel(&self, payload: Payload) -> BotResult<()>;
}

/// A shared, type-erased message.
pub type BoxedMessage = Arc<dyn IncomingMessage>;
