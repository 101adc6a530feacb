//! Test doubles shared by the framework's unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use nidda_core::{
    BotResult, ChannelKind, GuildRef, IncomingMessage, MessageContext, ParseOptions, Payload,
    Session, parse,
};

pub const BOT_ID: &str = "999";

#[derive(Debug, Default)]
pub struct MockMessage {
    pub content: String,
    pub kind: ChannelKind,
    pub replies: Mutex<Vec<String>>,
}

#[async_trait]
impl IncomingMessage for MockMessage {
    fn id(&self) -> &str {
        "m1"
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn author_id(&self) -> &str {
        "1"
    }

    fn channel_id(&self) -> &str {
        "c1"
    }

    fn channel_kind(&self) -> ChannelKind {
        self.kind
    }

    fn guild(&self) -> Option<&GuildRef> {
        None
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

/// Builds a context for `text` posted in a guild channel.
pub fn context(text: &str) -> (Arc<MockMessage>, Arc<MessageContext>) {
    context_in(text, ChannelKind::Guild)
}

pub fn context_in(text: &str, kind: ChannelKind) -> (Arc<MockMessage>, Arc<MessageContext>) {
    let message = Arc::new(MockMessage {
        content: text.to_string(),
        kind,
        ..Default::default()
    });
    let options = ParseOptions::default().bot_id(BOT_ID).channel_kind(kind);
    let content = parse(text, &options);
    let ctx = MessageContext::new(message.clone(), content, Session::default());
    (message, Arc::new(ctx))
}
