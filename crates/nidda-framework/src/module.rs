//! Plugin-style route registration.
//!
//! A [`Module`] bundles a feature's routes so the host can mount it with one
//! call:
//!
//! ```rust,ignore
//! struct Dice;
//!
//! impl Module for Dice {
//!     fn name(&self) -> &str {
//!         "dice"
//!     }
//!
//!     fn register(&self, router: Router) -> Router {
//!         router.nest("roll", Router::named("dice").route("*", roll))
//!     }
//! }
//!
//! let router = Router::new().module(&Dice);
//! ```

use crate::router::Router;

/// A feature that contributes routes.
pub trait Module: Send + Sync {
    /// Name used in log output.
    fn name(&self) -> &str;

    /// Appends this module's routes to `router`.
    fn register(&self, router: Router) -> Router;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::context;

    struct Greeter;

    impl Module for Greeter {
        fn name(&self) -> &str {
            "greeter"
        }

        fn register(&self, router: Router) -> Router {
            router.route("hi", || async { "hello" })
        }
    }

    #[tokio::test]
    async fn test_module_registers_routes() {
        let modules: Vec<Box<dyn Module>> = vec![Box::new(Greeter)];
        let router = modules
            .iter()
            .fold(Router::new(), |router, module| router.module(module.as_ref()));
        assert_eq!(router.len(), 1);

        let (message, ctx) = context("hi there");
        router.dispatch_message(ctx).await.unwrap();
        assert_eq!(*message.replies.lock(), vec!["hello"]);
    }
}
