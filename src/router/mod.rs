//! The application router.
//!
//! [`AppRouter`] assembles the route table once, in three steps:
//!
//! 1. the two policy groups ([`AppRouter::setup_open_group`] and
//!    [`AppRouter::setup_enforced_group`]), each wrapped in its own
//!    [`SecurityPolicy`](crate::SecurityPolicy)
//! 2. the not-found fallback
//! 3. the middleware chain ([`AppRouter::setup_middleware`]), which wraps
//!    every route of both groups and the fallback
//!
//! Nothing can be routed after [`AppRouter::serve`] has taken the router.
//!
//! ```rust,no_run
//! use graphql_server::{AppContext, AppRouter, Collaborators, Config, UnconfiguredSchema};
//! use std::sync::Arc;
//!
//! # async fn example() -> graphql_server::Result<()> {
//! let config = Config::load()?;
//! let context = AppContext::new(&config, Collaborators::new(Arc::new(UnconfiguredSchema)))?;
//!
//! AppRouter::new(config, context)?
//!     .setup_routes()?
//!     .setup_middleware()?
//!     .start()
//!     .await
//! # }
//! ```
mod builder;
mod chain;
mod groups;
mod handlers;
mod real_ip;
mod shutdown;

#[cfg(test)]
mod tests;

pub use groups::RouteGroup;
pub use handlers::*;
pub use real_ip::client_ip_from_headers;

use {
    crate::{AppContext, Config, Result},
    axum::Router,
    tokio_util::sync::CancellationToken,
};

pub struct AppRouter {
    pub(crate) config: Config,
    pub(crate) context: AppContext,
    pub(crate) inner: Router<AppContext>,
    pub(crate) shutdown: CancellationToken,
}

impl AppRouter {
    /// Validates the configuration and starts an empty route table.
    pub fn new(config: Config, context: AppContext) -> Result<Self> {
        config.validate()?;
        Ok(AppRouter {
            config,
            context,
            inner: Router::new(),
            shutdown: CancellationToken::new(),
        })
    }

    /// Both policy groups and the not-found page.
    pub fn setup_routes(self) -> Result<Self> {
        Ok(self
            .setup_open_group()?
            .setup_enforced_group()?
            .setup_not_found())
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Cancelled when shutdown begins. Cancelling it starts a graceful
    /// shutdown of [`AppRouter::serve`].
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
