use std::collections::HashMap;

use serde_json::Value;

use super::split::FLAG_MARKER;

/// Largest integer a double represents exactly (2^53 - 1).
///
/// Numeric flag values beyond this are kept as text so large platform ids
/// survive untouched.
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// Named arguments keyed by lower-cased flag name.
///
/// `None` marks a presence-only flag (`--verbose`).
pub type NamedArgs = HashMap<String, Option<Value>>;

/// Builds the named-argument map from flag tokens.
///
/// Later flags overwrite earlier ones with the same key.
pub fn named_args<'a>(flags: impl IntoIterator<Item = &'a str>) -> NamedArgs {
    let mut args = NamedArgs::new();
    for flag in flags {
        let (key, value) = parse_flag(flag);
        args.insert(key, value);
    }
    args
}

/// Parses one `--key[=value]` token.
pub fn parse_flag(flag: &str) -> (String, Option<Value>) {
    let body = flag.strip_prefix(FLAG_MARKER).unwrap_or(flag);
    match body.split_once('=') {
        Some((key, raw)) => (key.to_lowercase(), Some(parse_value(raw))),
        None => (body.to_lowercase(), None),
    }
}

/// Parses a flag value as JSON, keeping the literal text when that fails or
/// would lose precision.
pub fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Number(n)) if !is_safe_number(&n) => Value::String(raw.to_string()),
        Ok(value) => value,
        Err(_) => Value::String(raw.to_string()),
    }
}

fn is_safe_number(n: &serde_json::Number) -> bool {
    if let Some(i) = n.as_i64() {
        i.unsigned_abs() <= MAX_SAFE_INTEGER
    } else if let Some(u) = n.as_u64() {
        u <= MAX_SAFE_INTEGER
    } else {
        n.as_f64()
            .is_some_and(|f| f.is_finite() && f.abs() <= MAX_SAFE_INTEGER as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_value() {
        assert_eq!(parse_flag("--max=50"), ("max".into(), Some(json!(50))));
    }

    #[test]
    fn test_key_is_lowercased() {
        assert_eq!(parse_flag("--Mode=fast").0, "mode");
    }

    #[test]
    fn test_presence_flag() {
        assert_eq!(parse_flag("--verbose"), ("verbose".into(), None));
    }

    #[test]
    fn test_json_values() {
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("[1,2]"), json!([1, 2]));
        assert_eq!(parse_value(r#""Jane Doe""#), json!("Jane Doe"));
        assert_eq!(parse_value("1.5"), json!(1.5));
    }

    #[test]
    fn test_unparseable_value_stays_literal() {
        assert_eq!(parse_value("hello"), json!("hello"));
        assert_eq!(parse_value(""), json!(""));
    }

    #[test]
    fn test_large_ids_stay_literal() {
        assert_eq!(
            parse_value("123456789012345678"),
            json!("123456789012345678")
        );
        assert_eq!(parse_value("9007199254740991"), json!(9_007_199_254_740_991u64));
        assert_eq!(parse_value("-9007199254740992"), json!("-9007199254740992"));
    }

    #[test]
    fn test_split_on_first_equals_only() {
        assert_eq!(parse_flag("--expr=a=b"), ("expr".into(), Some(json!("a=b"))));
    }

    #[test]
    fn test_later_flag_wins() {
        let args = named_args(["--n=1", "--N=2"]);
        assert_eq!(args.len(), 1);
        assert_eq!(args["n"], Some(json!(2)));
    }
}
