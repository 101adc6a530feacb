//! Handler parameter extraction.
//!
//! Every handler parameter implements [`FromDispatch`]; the router builds the
//! arguments from the route's [`RouteData`] and the shared
//! [`MessageContext`] before calling the handler. An extraction error aborts
//! the chain exactly like an error returned by the handler itself.

use std::sync::Arc;

use nidda_core::{BotError, BotResult, MessageContext, ResolvedContext, Server, Session, User};

use crate::path::RouteData;

/// Types that can be built from a dispatch.
pub trait FromDispatch: Sized {
    fn from_dispatch(route: &RouteData, ctx: &Arc<MessageContext>) -> BotResult<Self>;
}

impl FromDispatch for RouteData {
    fn from_dispatch(route: &RouteData, _ctx: &Arc<MessageContext>) -> BotResult<Self> {
        Ok(route.clone())
    }
}

impl FromDispatch for Arc<MessageContext> {
    fn from_dispatch(_route: &RouteData, ctx: &Arc<MessageContext>) -> BotResult<Self> {
        Ok(Arc::clone(ctx))
    }
}

impl FromDispatch for Session {
    fn from_dispatch(_route: &RouteData, ctx: &Arc<MessageContext>) -> BotResult<Self> {
        Ok(ctx.session().clone())
    }
}

impl FromDispatch for ResolvedContext {
    fn from_dispatch(_route: &RouteData, ctx: &Arc<MessageContext>) -> BotResult<Self> {
        Ok(ctx.resolved())
    }
}

/// The remaining tokens of the route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens(pub Vec<String>);

impl FromDispatch for Tokens {
    fn from_dispatch(route: &RouteData, _ctx: &Arc<MessageContext>) -> BotResult<Self> {
        Ok(Self(route.tokens().to_vec()))
    }
}

/// The remaining text of the route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text(pub String);

impl FromDispatch for Text {
    fn from_dispatch(route: &RouteData, _ctx: &Arc<MessageContext>) -> BotResult<Self> {
        Ok(Self(route.text().to_string()))
    }
}

/// The resolved author. Fails with `AccessDenied` for unknown users.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Arc<User>);

impl FromDispatch for CurrentUser {
    fn from_dispatch(_route: &RouteData, ctx: &Arc<MessageContext>) -> BotResult<Self> {
        ctx.user()
            .map(Self)
            .ok_or_else(|| BotError::access_denied("You need an account to use this command"))
    }
}

/// The resolved server. Fails with `Validation` outside servers.
#[derive(Debug, Clone)]
pub struct CurrentServer(pub Arc<Server>);

impl FromDispatch for CurrentServer {
    fn from_dispatch(_route: &RouteData, ctx: &Arc<MessageContext>) -> BotResult<Self> {
        ctx.server()
            .map(Self)
            .ok_or_else(|| BotError::validation("This command only works in a server"))
    }
}
