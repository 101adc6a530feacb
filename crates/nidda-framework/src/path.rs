//! Route path specifications and the remaining-path view.
//!
//! A [`PathSpec`] decides whether a route applies to the text a router still
//! has to route, and whether matching it *consumes* part of that text:
//!
//! | Spec | Matches when | Consumes |
//! |------|--------------|----------|
//! | `Wildcard` (`"*"`) | always | nothing |
//! | `Literal("")` | remaining text is empty | nothing |
//! | `Literal(p)` | remaining text starts with `p` (case-insensitive) | `p` |
//! | `Pattern(re)` | `re` matches the remaining text | nothing |
//! | `AnyOf([..])` | any element matches | what the first matching element consumes |

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use nidda_core::{NamedArgs, ParsedContent};

/// The wildcard path.
pub const WILDCARD: &str = "*";

/// How a route's path is matched.
#[derive(Clone)]
pub enum PathSpec {
    Literal(String),
    Wildcard,
    Pattern(Regex),
    AnyOf(Vec<PathSpec>),
}

/// The result of a successful match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatch<'a> {
    /// The route sees the path unchanged.
    Passthrough,
    /// The route sees the path with this literal removed.
    Literal(&'a str),
}

impl PathSpec {
    /// Creates a literal path; `"*"` becomes [`PathSpec::Wildcard`].
    pub fn literal(path: impl Into<String>) -> Self {
        let path = path.into();
        if path == WILDCARD {
            Self::Wildcard
        } else {
            Self::Literal(path)
        }
    }

    /// Compiles a regex path.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    /// Matches the spec against the remaining text.
    pub fn match_text(&self, text: &str) -> Option<PathMatch<'_>> {
        match self {
            Self::Wildcard => Some(PathMatch::Passthrough),
            Self::Literal(path) if path == WILDCARD => Some(PathMatch::Passthrough),
            Self::Literal(path) if path.is_empty() => {
                text.is_empty().then_some(PathMatch::Literal(path))
            }
            Self::Literal(path) => {
                strip_prefix_ignore_case(text, path).map(|_| PathMatch::Literal(path))
            }
            Self::Pattern(re) => re.is_match(text).then_some(PathMatch::Passthrough),
            Self::AnyOf(specs) => specs.iter().find_map(|spec| spec.match_text(text)),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.match_text(text).is_some()
    }
}

impl fmt::Debug for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(path) => write!(f, "{path:?}"),
            Self::Wildcard => f.write_str(WILDCARD),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
            Self::AnyOf(specs) => {
                f.write_str("[")?;
                for (i, spec) in specs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{spec}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for PathSpec {
    fn from(path: &str) -> Self {
        Self::literal(path)
    }
}

impl From<String> for PathSpec {
    fn from(path: String) -> Self {
        Self::literal(path)
    }
}

impl From<Regex> for PathSpec {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

impl<T: Into<PathSpec>> From<Vec<T>> for PathSpec {
    fn from(specs: Vec<T>) -> Self {
        Self::AnyOf(specs.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PathSpec>, const N: usize> From<[T; N]> for PathSpec {
    fn from(specs: [T; N]) -> Self {
        Self::AnyOf(specs.into_iter().map(Into::into).collect())
    }
}

/// Strips `prefix` from the start of `text`, comparing case-insensitively.
pub fn strip_prefix_ignore_case<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    let mut text_chars = text.char_indices();
    let mut end = 0;
    for pc in prefix.chars() {
        let (i, tc) = text_chars.next()?;
        if pc != tc && !pc.to_lowercase().eq(tc.to_lowercase()) {
            return None;
        }
        end = i + tc.len_utf8();
    }
    Some(&text[end..])
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

// =============================================================================
// RouteData - the remaining path as seen by one route
// =============================================================================

/// The part of a message a router still has to route.
///
/// Routers never mutate the `RouteData` they were given; matching a literal
/// produces a new, shorter copy via [`consume`](Self::consume).
#[derive(Debug, Clone, Default)]
pub struct RouteData {
    tokens: Vec<String>,
    text: String,
    args: Arc<NamedArgs>,
}

impl RouteData {
    pub fn new(tokens: Vec<String>, text: impl Into<String>, args: Arc<NamedArgs>) -> Self {
        Self {
            tokens,
            text: text.into(),
            args,
        }
    }

    /// The full routing path of a freshly parsed message.
    pub fn from_content(content: &ParsedContent) -> Self {
        Self {
            tokens: content.words.clone(),
            text: content.text(),
            args: Arc::new(content.named_args.clone()),
        }
    }

    /// Remaining tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// First remaining token.
    pub fn head(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// Remaining raw text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn args(&self) -> &NamedArgs {
        &self.args
    }

    /// Looks up a named argument's value.
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(&key.to_lowercase()).and_then(Option::as_ref)
    }

    /// Returns `true` if `--key` was given, with or without a value.
    pub fn has_flag(&self, key: &str) -> bool {
        self.args.contains_key(&key.to_lowercase())
    }

    /// Returns the route data a route matched by `m` should see.
    pub fn derive(&self, m: PathMatch<'_>) -> RouteData {
        match m {
            PathMatch::Passthrough => self.clone(),
            PathMatch::Literal(literal) => self.consume(literal),
        }
    }

    /// Removes a matched literal.
    ///
    /// The first token equal to `literal` is dropped, and the literal plus
    /// the whitespace after it is stripped from the front of the text.
    pub fn consume(&self, literal: &str) -> RouteData {
        let mut tokens = self.tokens.clone();
        if let Some(pos) = tokens.iter().position(|t| eq_ignore_case(t, literal)) {
            tokens.remove(pos);
        }

        let text = match strip_prefix_ignore_case(&self.text, literal) {
            Some(rest) => rest.trim_start().to_string(),
            None => self.text.clone(),
        };

        RouteData {
            tokens,
            text,
            args: Arc::clone(&self.args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(text: &str) -> RouteData {
        RouteData::new(
            text.split_whitespace().map(str::to_string).collect(),
            text,
            Arc::default(),
        )
    }

    #[test]
    fn test_star_is_wildcard() {
        assert!(matches!(PathSpec::from("*"), PathSpec::Wildcard));
        assert_eq!(
            PathSpec::from("*").match_text("anything"),
            Some(PathMatch::Passthrough)
        );
        assert!(PathSpec::Wildcard.matches(""));
    }

    #[test]
    fn test_literal_prefix_match() {
        let spec = PathSpec::from("join");
        assert_eq!(spec.match_text("join #general"), Some(PathMatch::Literal("join")));
        assert!(spec.matches("JOIN now"));
        // Prefix equality on the whole text, not token equality.
        assert!(spec.matches("joiner"));
        assert!(!spec.matches("rejoin"));
        assert!(!spec.matches(""));
    }

    #[test]
    fn test_empty_literal_only_matches_empty_text() {
        let spec = PathSpec::from("");
        assert_eq!(spec.match_text(""), Some(PathMatch::Literal("")));
        assert!(!spec.matches("ping"));
    }

    #[test]
    fn test_pattern_match() {
        let spec = PathSpec::pattern(r"^\d+d\d+$").unwrap();
        assert_eq!(spec.match_text("2d6"), Some(PathMatch::Passthrough));
        assert!(!spec.matches("roll 2d6"));
        assert!(PathSpec::pattern("(").is_err());
    }

    #[test]
    fn test_any_of_first_matching_element_decides() {
        let spec = PathSpec::from(["help", "h"]);
        assert_eq!(spec.match_text("help me"), Some(PathMatch::Literal("help")));
        assert_eq!(spec.match_text("h"), Some(PathMatch::Literal("h")));
        assert!(!spec.matches("status"));

        let mixed = PathSpec::AnyOf(vec![
            PathSpec::pattern("^x").unwrap(),
            PathSpec::from("xy"),
        ]);
        assert_eq!(mixed.match_text("xy z"), Some(PathMatch::Passthrough));
    }

    #[test]
    fn test_display() {
        let spec = PathSpec::AnyOf(vec!["a".into(), PathSpec::Wildcard]);
        assert_eq!(spec.to_string(), r#"["a", *]"#);
    }

    #[test]
    fn test_consume_literal() {
        let route = data("join #general extra");
        let derived = route.consume("join");
        assert_eq!(derived.text(), "#general extra");
        assert_eq!(derived.tokens(), ["#general", "extra"]);
        assert_eq!(derived.head(), Some("#general"));
        // The parent is untouched.
        assert_eq!(route.text(), "join #general extra");
        assert_eq!(route.tokens().len(), 3);
    }

    #[test]
    fn test_consume_is_case_insensitive() {
        let derived = data("JOIN   lobby").consume("join");
        assert_eq!(derived.text(), "lobby");
        assert_eq!(derived.tokens(), ["lobby"]);
    }

    #[test]
    fn test_consume_whole_text() {
        let derived = data("ping").consume("ping");
        assert!(derived.is_empty());
        assert!(derived.tokens().is_empty());
    }

    #[test]
    fn test_passthrough_keeps_route() {
        let route = data("a b");
        let derived = route.derive(PathMatch::Passthrough);
        assert_eq!(derived.text(), "a b");
        assert_eq!(derived.tokens(), route.tokens());
    }

    #[test]
    fn test_strip_prefix_unicode() {
        assert_eq!(strip_prefix_ignore_case("ÉCOLE x", "école"), Some(" x"));
        assert_eq!(strip_prefix_ignore_case("ab", "abc"), None);
    }
}
