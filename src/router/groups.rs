use {
    super::{AppRouter, handlers},
    crate::{Result, SecurityPolicy, admin, apply_policy, auth, graphql, observability},
    axum::{
        Router,
        extract::DefaultBodyLimit,
        routing::{get, post},
    },
};

/// The two disjoint partitions of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    /// Never forces TLS.
    Open,
    /// TLS only, outside development mode.
    Enforced,
}

impl AppRouter {
    pub(crate) fn policy_for(&self, group: RouteGroup) -> Result<SecurityPolicy> {
        let (security, mode) = (&self.config.security, self.config.mode);
        match group {
            RouteGroup::Open => SecurityPolicy::open(security, mode),
            RouteGroup::Enforced => SecurityPolicy::enforced(security, mode),
        }
    }

    /// Health probe and metrics scrape. Never redirected to TLS: probes may
    /// run over plain HTTP inside a private network.
    pub fn setup_open_group(mut self) -> Result<Self> {
        let policy = self.policy_for(RouteGroup::Open)?;
        let open = Router::new()
            .route("/healthz", get(handlers::healthz))
            .route("/metrics", get(observability::scrape));

        self.inner = self.inner.merge(apply_policy(open, policy));
        Ok(self)
    }

    /// Everything user-facing: the query console, GraphQL execution, and
    /// the `/auth` and `/admin` sub-routers.
    pub fn setup_enforced_group(mut self) -> Result<Self> {
        let policy = self.policy_for(RouteGroup::Enforced)?;
        let body_limit =
            usize::try_from(self.config.http.max_graphql_payload.as_u64()).unwrap_or(usize::MAX);

        let enforced = Router::new()
            .route("/", get(graphql::playground))
            .route(
                "/graphql",
                post(graphql::execute).layer(DefaultBodyLimit::max(body_limit)),
            )
            .merge(auth::routes())
            .merge(admin::routes(self.context.clone()));

        self.inner = self.inner.merge(apply_policy(enforced, policy));
        Ok(self)
    }

    #[must_use]
    pub fn setup_not_found(mut self) -> Self {
        self.inner = self.inner.fallback(handlers::not_found);
        self
    }
}
