//! Message content parsing.
//!
//! [`parse`] turns the raw text of a chat message into a [`ParsedContent`]:
//! the routing path, the command word and its arguments, named `--flags`,
//! mentions, custom emoji and URLs. Parsing is pure and never fails;
//! malformed input simply yields fewer recognised parts.
//!
//! ```rust,ignore
//! use nidda_core::content::{parse, ParseOptions};
//!
//! let content = parse("roll --max=50 about dice", &ParseOptions::default());
//! assert_eq!(content.command.as_deref(), Some("roll"));
//! assert_eq!(content.cleaned_tokens, ["about", "dice"]);
//! assert_eq!(content.arg("max"), Some(&serde_json::json!(50)));
//! ```

pub mod args;
pub mod patterns;
pub mod split;

use serde::Serialize;
use serde_json::Value;

pub use args::{MAX_SAFE_INTEGER, NamedArgs, named_args, parse_flag, parse_value};
pub use patterns::{EmojiRef, TokenKind, classify};
pub use split::{FLAG_MARKER, quote_split, tokenize};

use crate::message::ChannelKind;

/// Default command prefix.
pub const DEFAULT_COMMAND_PREFIX: &str = "!";

/// Platform facts the parser needs.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// The bot's own user id, used to detect direct mentions.
    pub bot_id: Option<String>,
    /// Prefix that marks a message as a command.
    pub command_prefix: String,
    /// Kind of channel the text was posted in.
    pub channel_kind: ChannelKind,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            bot_id: None,
            command_prefix: DEFAULT_COMMAND_PREFIX.to_string(),
            channel_kind: ChannelKind::Other,
        }
    }
}

impl ParseOptions {
    pub fn bot_id(mut self, id: impl Into<String>) -> Self {
        self.bot_id = Some(id.into());
        self
    }

    pub fn command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    pub fn channel_kind(mut self, kind: ChannelKind) -> Self {
        self.channel_kind = kind;
        self
    }
}

/// Structured view of one message's text. Read-only once built.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedContent {
    pub raw_text: String,
    /// Every token, flags included, in order.
    pub tokens: Vec<String>,
    /// Tokens left after removing flags, `@` markers, emoji, mentions and
    /// URLs. The command prefix is stripped from the leading word.
    pub words: Vec<String>,
    /// The leading word, if any.
    pub command: Option<String>,
    /// The words after the command.
    pub cleaned_tokens: Vec<String>,
    pub flags: Vec<String>,
    pub named_args: NamedArgs,
    pub emojis: Vec<EmojiRef>,
    pub urls: Vec<String>,
    pub mentioned_ids: Vec<String>,
    pub role_ids: Vec<String>,
    pub channel_kind: ChannelKind,
    pub is_bot_mentioned: bool,
    pub is_command_prefixed: bool,
}

impl ParsedContent {
    /// The routing text: the words joined by single spaces.
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    /// Looks up a named argument's value.
    ///
    /// Returns `None` both for missing flags and for presence-only flags;
    /// use [`has_flag`](Self::has_flag) to tell them apart.
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.named_args
            .get(&key.to_lowercase())
            .and_then(Option::as_ref)
    }

    /// Returns `true` if `--key` or `--key=...` was given.
    pub fn has_flag(&self, key: &str) -> bool {
        self.named_args.contains_key(&key.to_lowercase())
    }

    /// Returns `true` if the given user id was mentioned.
    pub fn mentions(&self, user_id: &str) -> bool {
        self.mentioned_ids.iter().any(|id| id == user_id)
    }
}

/// Parses raw message text.
pub fn parse(raw_text: &str, options: &ParseOptions) -> ParsedContent {
    let tokens = tokenize(raw_text);

    let is_command_prefixed = !options.command_prefix.is_empty()
        && tokens
            .first()
            .is_some_and(|t| t.starts_with(&options.command_prefix));

    let mut content = ParsedContent {
        raw_text: raw_text.to_string(),
        channel_kind: options.channel_kind,
        is_command_prefixed,
        ..Default::default()
    };

    for (index, token) in tokens.iter().enumerate() {
        match classify(token) {
            TokenKind::Flag => push_unique(&mut content.flags, token.clone()),
            TokenKind::Marker => {}
            TokenKind::Emoji(emoji) => push_unique(&mut content.emojis, emoji),
            TokenKind::Url => push_unique(&mut content.urls, token.clone()),
            TokenKind::UserMention(id) => push_unique(&mut content.mentioned_ids, id),
            TokenKind::RoleMention(id) => push_unique(&mut content.role_ids, id),
            TokenKind::Word if index == 0 && is_command_prefixed => {
                let word = &token[options.command_prefix.len()..];
                if !word.is_empty() {
                    content.words.push(word.to_string());
                }
            }
            TokenKind::Word => content.words.push(token.clone()),
        }
    }

    content.named_args = named_args(content.flags.iter().map(String::as_str));
    content.command = content.words.first().cloned();
    content.cleaned_tokens = content.words.iter().skip(1).cloned().collect();
    content.is_bot_mentioned = options
        .bot_id
        .as_deref()
        .is_some_and(|id| content.mentions(id));
    content.tokens = tokens;

    content
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts() -> ParseOptions {
        ParseOptions::default().bot_id("42").channel_kind(ChannelKind::Guild)
    }

    #[test]
    fn test_parse_named_numeric_arg() {
        let content = parse("roll --max=50 about dice", &opts());
        assert_eq!(content.arg("max"), Some(&json!(50)));
        assert_eq!(content.cleaned_tokens, vec!["about", "dice"]);
        assert_eq!(content.command.as_deref(), Some("roll"));
        assert!(content.tokens.contains(&"--max=50".to_string()));
        assert_eq!(content.text(), "roll about dice");
    }

    #[test]
    fn test_parse_mention() {
        let content = parse("<@42> hello <@!77> there <@42>", &opts());
        assert_eq!(content.mentioned_ids, vec!["42", "77"]);
        assert!(content.is_bot_mentioned);
        assert_eq!(content.words, vec!["hello", "there"]);
        assert_eq!(content.cleaned_tokens, vec!["there"]);
        assert!(!content.cleaned_tokens.iter().any(|t| t.contains("<@")));
    }

    #[test]
    fn test_other_user_mention_is_not_bot_mention() {
        let content = parse("<@77> hi", &opts());
        assert!(!content.is_bot_mentioned);
        assert_eq!(content.mentioned_ids, vec!["77"]);
    }

    #[test]
    fn test_command_prefix() {
        let content = parse("!ping now", &opts());
        assert!(content.is_command_prefixed);
        assert_eq!(content.words, vec!["ping", "now"]);
        assert_eq!(content.command.as_deref(), Some("ping"));
        assert_eq!(content.tokens[0], "!ping");
    }

    #[test]
    fn test_custom_prefix() {
        let options = opts().command_prefix("?");
        assert!(parse("?help", &options).is_command_prefixed);
        assert!(!parse("!help", &options).is_command_prefixed);
    }

    #[test]
    fn test_bare_prefix_is_dropped() {
        let content = parse("! ping", &opts());
        assert!(content.is_command_prefixed);
        assert_eq!(content.words, vec!["ping"]);
    }

    #[test]
    fn test_categories_are_deduplicated_words_are_not() {
        let content = parse(
            "go go https://a.io https://a.io <:x:1> <:x:1> --f --f @here",
            &opts(),
        );
        assert_eq!(content.words, vec!["go", "go"]);
        assert_eq!(content.urls, vec!["https://a.io"]);
        assert_eq!(content.emojis.len(), 1);
        assert_eq!(content.flags, vec!["--f"]);
        assert!(content.has_flag("f"));
        assert_eq!(content.arg("f"), None);
    }

    #[test]
    fn test_role_mentions() {
        let content = parse("ping <@&900>", &opts());
        assert_eq!(content.role_ids, vec!["900"]);
        assert!(content.mentioned_ids.is_empty());
        assert_eq!(content.words, vec!["ping"]);
    }

    #[test]
    fn test_quoted_flag_value() {
        let content = parse(r#"greet "big crowd"--name="Jane Doe""#, &opts());
        assert_eq!(content.words, vec!["greet", "big crowd"]);
        assert_eq!(content.arg("name"), Some(&json!("Jane Doe")));
    }

    #[test]
    fn test_empty_input() {
        let content = parse("", &opts());
        assert!(content.tokens.is_empty());
        assert!(content.command.is_none());
        assert_eq!(content.text(), "");
        assert_eq!(content.channel_kind, ChannelKind::Guild);
    }
}
