//! Token classification.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::split::FLAG_MARKER;

static EMOJI_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<(a?):([A-Za-z0-9_~]+):(\d+)>$").expect("Failed to compile emoji regex")
});

static USER_MENTION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<@!?(\d+)>$").expect("Failed to compile user mention regex"));

static ROLE_MENTION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<@&(\d+)>$").expect("Failed to compile role mention regex"));

// scheme://..., localhost, IPv4-like hosts and bare domain.tld, each with an
// optional port and path.
static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)^(?:
            [a-z][a-z0-9+.\-]*://\S+
            | (?:localhost | \d{1,3}(?:\.\d{1,3}){3} | (?:[a-z0-9](?:[a-z0-9\-]*[a-z0-9])?\.)+[a-z]{2,})
              (?::\d{1,5})? (?:[/?\#]\S*)?
        )$",
    )
    .expect("Failed to compile url regex")
});

/// A custom platform emoji, e.g. `<:wave:1234>` or `<a:spin:5678>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmojiRef {
    pub name: String,
    pub id: String,
    pub animated: bool,
}

/// What a single token turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `--key` or `--key=value`.
    Flag,
    /// A raw `@name` marker; dropped from the content.
    Marker,
    Emoji(EmojiRef),
    Url,
    UserMention(String),
    RoleMention(String),
    /// Anything else: part of the routing path.
    Word,
}

/// Classifies a token. The first rule that applies wins.
pub fn classify(token: &str) -> TokenKind {
    if token.starts_with(FLAG_MARKER) {
        return TokenKind::Flag;
    }
    if token.starts_with('@') {
        return TokenKind::Marker;
    }
    if let Some(caps) = EMOJI_REGEX.captures(token) {
        return TokenKind::Emoji(EmojiRef {
            animated: !caps[1].is_empty(),
            name: caps[2].to_string(),
            id: caps[3].to_string(),
        });
    }
    if URL_REGEX.is_match(token) {
        return TokenKind::Url;
    }
    if let Some(caps) = USER_MENTION_REGEX.captures(token) {
        return TokenKind::UserMention(caps[1].to_string());
    }
    if let Some(caps) = ROLE_MENTION_REGEX.captures(token) {
        return TokenKind::RoleMention(caps[1].to_string());
    }
    TokenKind::Word
}
