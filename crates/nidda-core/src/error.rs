//! Unified error type for the Nidda core.
//!
//! Every failure that can travel through a dispatch chain is a [`BotError`].
//! The router never inspects the variant; it only hands the value back to
//! whoever started the dispatch. Rendering an error for the user is the job
//! of the outermost caller, via [`BotError::user_message`].

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Shared, cloneable error source.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// Reply used when the real cause must not be shown to the user.
pub const UPSTREAM_APOLOGY: &str =
    "sorry, something went wrong while talking to an upstream service";

/// Reply used for errors that carry no message of their own.
pub const GENERIC_FALLBACK: &str = "sorry, something unexpected happened";

/// Errors raised while handling a message.
#[derive(Debug, Clone, Error)]
pub enum BotError {
    /// Bad user input.
    #[error("{0}")]
    Validation(String),

    /// An authorization check inside a handler failed.
    #[error("{0}")]
    AccessDenied(String),

    /// An external resolver or API failed.
    #[error("upstream failure: {context}")]
    Upstream {
        /// What was being attempted.
        context: String,
        /// The original error, logged but never shown.
        #[source]
        source: SharedError,
    },

    /// A handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// A bug surfaced at runtime, such as stored state of the wrong type.
    #[error("internal error: {0}")]
    Internal(SharedError),

    /// Any other error raised by a handler.
    #[error(transparent)]
    Other(SharedError),
}

impl BotError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an access-denied error.
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied(message.into())
    }

    /// Wraps an upstream failure.
    pub fn upstream<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Upstream {
            context: context.into(),
            source: Arc::new(source),
        }
    }

    /// Wraps an arbitrary error.
    pub fn other<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Other(Arc::new(source))
    }

    /// Returns `true` for errors whose message must stay out of replies.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Upstream { .. } | Self::Panicked(_) | Self::Internal(_)
        )
    }

    /// The text the bot replies with when this error ends a dispatch.
    ///
    /// User-facing variants reply with their own message, lower-cased.
    /// Upstream failures get a generic apology, and anything without a
    /// message falls back to [`GENERIC_FALLBACK`].
    pub fn user_message(&self) -> String {
        match self {
            Self::Upstream { .. } => UPSTREAM_APOLOGY.to_string(),
            Self::Panicked(_) | Self::Internal(_) => GENERIC_FALLBACK.to_string(),
            other => {
                let message = other.to_string();
                if message.trim().is_empty() {
                    GENERIC_FALLBACK.to_string()
                } else {
                    message.to_lowercase()
                }
            }
        }
    }
}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        Self::other(err)
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(Arc::new(err))
    }
}

/// Result type for core operations.
pub type BotResult<T> = Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("")]
    struct Silent;

    #[test]
    fn test_validation_message_is_lowercased() {
        let err = BotError::validation("Missing Channel Name");
        assert_eq!(err.user_message(), "missing channel name");
    }

    #[test]
    fn test_upstream_message_is_hidden() {
        let io = std::io::Error::other("db password leaked in here");
        let err = BotError::upstream("resolve user 42", io);
        assert!(err.is_internal());
        assert_eq!(err.user_message(), UPSTREAM_APOLOGY);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_empty_message_falls_back() {
        let err = BotError::other(Silent);
        assert_eq!(err.user_message(), GENERIC_FALLBACK);
    }

    #[test]
    fn test_json_errors_are_internal() {
        let json = serde_json::from_str::<u32>(r#""x""#).unwrap_err();
        let err = BotError::from(json);
        assert!(err.is_internal());
        assert_eq!(err.user_message(), GENERIC_FALLBACK);
    }

    #[test]
    fn test_panicked_uses_fallback() {
        let err = BotError::Panicked("index out of bounds".into());
        assert_eq!(err.user_message(), GENERIC_FALLBACK);
    }
}
