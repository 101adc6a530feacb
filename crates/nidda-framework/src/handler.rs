//! Handler system for the Nidda framework.
//!
//! Handlers are plain async functions. Any function whose parameters all
//! implement [`FromDispatch`] and whose return type implements
//! [`IntoOutcome`] is a [`Handler`]:
//!
//! ```rust,ignore
//! // Finishes the chain by replying.
//! async fn ping() -> &'static str {
//!     "pong"
//! }
//!
//! // Lets later routes run too.
//! async fn audit(ctx: Arc<MessageContext>) -> Outcome {
//!     tracing::info!(author = ctx.message().author_id(), "command seen");
//!     Outcome::Continue
//! }
//!
//! // Aborts the chain with an error the bootstrap turns into a reply.
//! async fn kick(Tokens(args): Tokens) -> BotResult<String> {
//!     let target = args.first().ok_or_else(|| BotError::validation("Who?"))?;
//!     Ok(format!("kicked {target}"))
//! }
//! ```
//!
//! The return value is the continuation: [`Outcome::Handled`] stops the
//! chain, [`Outcome::Continue`] advances it, and `Err` aborts it.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use nidda_core::{BotError, BotResult, MessageContext, Payload};

use crate::extractor::FromDispatch;
use crate::path::RouteData;

/// What the router does after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    /// The response is final; no further routes run.
    #[default]
    Handled,
    /// Run the next matched route.
    Continue,
}

// ============================================================================
// IntoOutcome - Handle handler return values
// ============================================================================

/// Types a handler may return.
#[async_trait]
pub trait IntoOutcome: Send {
    async fn into_outcome(self, ctx: &MessageContext) -> BotResult<Outcome>;
}

/// `()` finishes the chain.
#[async_trait]
impl IntoOutcome for () {
    async fn into_outcome(self, _ctx: &MessageContext) -> BotResult<Outcome> {
        Ok(Outcome::Handled)
    }
}

#[async_trait]
impl IntoOutcome for Outcome {
    async fn into_outcome(self, _ctx: &MessageContext) -> BotResult<Outcome> {
        Ok(self)
    }
}

/// Text is sent as a reply, then the chain finishes.
#[async_trait]
impl IntoOutcome for String {
    async fn into_outcome(self, ctx: &MessageContext) -> BotResult<Outcome> {
        ctx.reply(&self).await?;
        Ok(Outcome::Handled)
    }
}

#[async_trait]
impl IntoOutcome for &'static str {
    async fn into_outcome(self, ctx: &MessageContext) -> BotResult<Outcome> {
        ctx.reply(self).await?;
        Ok(Outcome::Handled)
    }
}

/// A payload is sent to the channel, then the chain finishes.
#[async_trait]
impl IntoOutcome for Payload {
    async fn into_outcome(self, ctx: &MessageContext) -> BotResult<Outcome> {
        ctx.send(self).await?;
        Ok(Outcome::Handled)
    }
}

/// `None` passes the message on to the next route.
#[async_trait]
impl<T: IntoOutcome> IntoOutcome for Option<T> {
    async fn into_outcome(self, ctx: &MessageContext) -> BotResult<Outcome> {
        match self {
            Some(t) => t.into_outcome(ctx).await,
            None => Ok(Outcome::Continue),
        }
    }
}

/// `Err` aborts the chain with the error.
#[async_trait]
impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<BotError> + Send,
{
    async fn into_outcome(self, ctx: &MessageContext) -> BotResult<Outcome> {
        match self {
            Ok(t) => t.into_outcome(ctx).await,
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// A route handler.
///
/// Implemented for async functions of up to eight [`FromDispatch`]
/// parameters returning an [`IntoOutcome`].
pub trait Handler<T>: Clone + Send + Sync + 'static {
    fn call(
        self,
        route: RouteData,
        ctx: Arc<MessageContext>,
    ) -> BoxFuture<'static, BotResult<Outcome>>;
}

/// A type-erased handler that can be stored in a route entry.
pub type BoxedHandler = Arc<
    dyn Fn(RouteData, Arc<MessageContext>) -> BoxFuture<'static, BotResult<Outcome>> + Send + Sync,
>;

/// Converts a handler function into a boxed handler.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T>,
    T: 'static,
{
    Arc::new(move |route, ctx| f.clone().call(route, ctx))
}

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_variables)]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: IntoOutcome + 'static,
            $( $ty: FromDispatch + Send + 'static, )*
        {
            fn call(
                self,
                route: RouteData,
                ctx: Arc<MessageContext>,
            ) -> BoxFuture<'static, BotResult<Outcome>> {
                Box::pin(async move {
                    $(
                        let $ty = $ty::from_dispatch(&route, &ctx)?;
                    )*

                    let res = (self)($($ty,)*).await;
                    res.into_outcome(&ctx).await
                })
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Text;
    use crate::testing::context;

    fn route(ctx: &MessageContext) -> RouteData {
        RouteData::from_content(ctx.content())
    }

    #[tokio::test]
    async fn test_string_reply_finishes() {
        let (message, ctx) = context("echo hi");
        let handler = into_handler(|Text(text): Text| async move { text });
        let outcome = handler(route(&ctx), ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(*message.replies.lock(), vec!["echo hi"]);
    }

    #[tokio::test]
    async fn test_unit_and_outcome() {
        let (_, ctx) = context("x");
        let unit = into_handler(|| async {});
        assert_eq!(unit(route(&ctx), ctx.clone()).await.unwrap(), Outcome::Handled);

        let cont = into_handler(|| async { Outcome::Continue });
        assert_eq!(cont(route(&ctx), ctx).await.unwrap(), Outcome::Continue);
    }

    #[tokio::test]
    async fn test_result_err_propagates() {
        let (message, ctx) = context("x");
        let handler =
            into_handler(|| async { Err::<String, _>(BotError::validation("Bad input")) });
        let err = handler(route(&ctx), ctx).await.unwrap_err();
        assert!(matches!(err, BotError::Validation(_)));
        assert!(message.replies.lock().is_empty());
    }

    #[tokio::test]
    async fn test_payload_is_sent() {
        let (message, ctx) = context("x");
        let handler = into_handler(|| async { Payload::text("embed body") });
        handler(route(&ctx), ctx).await.unwrap();
        assert_eq!(*message.replies.lock(), vec!["embed body"]);
    }
}
