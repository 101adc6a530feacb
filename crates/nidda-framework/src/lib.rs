//! # Nidda Framework
//!
//! The routing half of the Nidda chat-bot middleware.
//!
//! This layer provides:
//! - [`Router`]: ordered route entries, nested routers and sequential chain
//!   execution
//! - [`PathSpec`] and [`RouteData`]: path matching and the remaining-path
//!   view handed to each route
//! - [`Handler`]: Axum-style async function handlers with [`FromDispatch`]
//!   extractors and [`IntoOutcome`] return values
//! - [`Module`]: plugin-style registration

pub mod extractor;
pub mod handler;
pub mod module;
pub mod path;
pub mod route;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

pub use extractor::{CurrentServer, CurrentUser, FromDispatch, Text, Tokens};
pub use handler::{BoxedHandler, Handler, IntoOutcome, Outcome, into_handler};
pub use module::Module;
pub use path::{PathMatch, PathSpec, RouteData, WILDCARD};
pub use route::{RouteEntry, RouteOptions, RouteTarget, Scope, Trigger};
pub use router::{DispatchRequest, Router};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        CurrentServer, CurrentUser, Module, Outcome, PathSpec, RouteData, RouteOptions, Router,
        Scope, Text, Tokens, Trigger,
    };
}
