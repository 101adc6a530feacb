/// The marker that starts a named-argument token.
pub const FLAG_MARKER: &str = "--";

/// Splits raw message text into tokens.
///
/// Text without a double quote is split on whitespace. Otherwise the
/// quote-aware splitter runs: a `"..."` span stays one token, and a new
/// token starts right before every `--` marker even when no whitespace
/// precedes it.
pub fn tokenize(input: &str) -> Vec<String> {
    if input.contains('"') {
        quote_split(input)
    } else {
        input.split_whitespace().map(str::to_string).collect()
    }
}

/// Quote-aware splitting.
///
/// - Whitespace outside quotes separates tokens.
/// - A token that is exactly one quoted span loses its surrounding quotes.
/// - Quotes inside a token (`--name="a b"`) are kept verbatim.
/// - An unterminated quote runs to the end of the input.
pub fn quote_split(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                in_quote = !in_quote;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_quote => {
                push_token(&mut tokens, &mut current);
            }
            '-' if !in_quote && !current.is_empty() && chars.peek() == Some(&'-') => {
                // `word--flag` becomes `word`, `--flag`
                push_token(&mut tokens, &mut current);
                current.push(ch);
            }
            _ => current.push(ch),
        }
    }

    push_token(&mut tokens, &mut current);
    tokens
}

fn push_token(tokens: &mut Vec<String>, current: &mut String) {
    if current.is_empty() {
        return;
    }

    let token = std::mem::take(current);
    match strip_quotes(&token) {
        Some(inner) if !inner.is_empty() => tokens.push(inner.to_string()),
        Some(_) => {}
        None => tokens.push(token),
    }
}

/// Returns the inside of a token that is exactly one quoted span.
fn strip_quotes(token: &str) -> Option<&str> {
    let inner = token.strip_prefix('"')?.strip_suffix('"')?;
    if inner.contains('"') { None } else { Some(inner) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        let tokens = tokenize("join  #general\textra");
        assert_eq!(tokens, vec!["join", "#general", "extra"]);
    }

    #[test]
    fn test_split_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t  ").is_empty());
    }

    #[test]
    fn test_unquoted_text_keeps_glued_flags() {
        // Only the quote-aware splitter breaks before `--`.
        let tokens = tokenize("hello--world");
        assert_eq!(tokens, vec!["hello--world"]);
    }

    #[test]
    fn test_split_quoted_span() {
        let tokens = tokenize(r#"say "hello world" twice"#);
        assert_eq!(tokens, vec!["say", "hello world", "twice"]);
    }

    #[test]
    fn test_split_before_flag_marker() {
        let tokens = tokenize(r#"remind "buy milk"--at=5"#);
        assert_eq!(tokens, vec!["remind", "buy milk", "--at=5"]);
    }

    #[test]
    fn test_quoted_flag_value_keeps_quotes() {
        let tokens = tokenize(r#"greet --name="Jane Doe" now"#);
        assert_eq!(tokens, vec!["greet", r#"--name="Jane Doe""#, "now"]);
    }

    #[test]
    fn test_dashes_inside_quotes_are_kept() {
        let tokens = tokenize(r#"echo "a--b" c"#);
        assert_eq!(tokens, vec!["echo", "a--b", "c"]);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        let tokens = tokenize(r#"echo "never closed here"#);
        assert_eq!(tokens, vec!["echo", r#""never closed here"#]);
    }

    #[test]
    fn test_empty_quotes_are_dropped() {
        let tokens = tokenize(r#"echo "" done"#);
        assert_eq!(tokens, vec!["echo", "done"]);
    }
}
