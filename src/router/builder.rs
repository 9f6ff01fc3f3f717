//! Serving and late routes: start(), serve(), route(), into_inner().

use {
    super::{AppRouter, RouteGroup, shutdown::shutdown_signal},
    crate::{AppContext, Result, apply_policy},
    axum::{Router, routing::MethodRouter},
    std::net::SocketAddr,
    tokio::net::TcpListener,
};

impl AppRouter {
    /// Binds `http.bind_addr:http.bind_port` and serves until SIGINT or
    /// SIGTERM.
    ///
    /// # Errors
    ///
    /// Fails when the listener cannot be bound.
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.http.full_bind_addr();
        let listener = TcpListener::bind(&bind_addr).await.inspect_err(|err| {
            tracing::error!(addr = %bind_addr, error = %err, "Failed to bind listener");
        })?;
        tracing::info!("Bound to {}", &bind_addr);

        let token = self.cancellation_token();
        tokio::spawn(async move {
            shutdown_signal().await;
            token.cancel();
        });

        self.serve(listener).await
    }

    /// Serves on `listener` until the cancellation token is cancelled, then
    /// drains in-flight requests for at most `http.shutdown_timeout`.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let AppRouter {
            config,
            context,
            inner,
            shutdown,
        } = self;

        let _reporting = context.exporters().spawn_reporting(shutdown.clone());
        let service = inner
            .with_state(context)
            .into_make_service_with_connect_info::<SocketAddr>();

        let shutdown_timeout = config.http.shutdown_timeout;
        let graceful = shutdown.clone();
        let serve_future = axum::serve(listener, service).with_graceful_shutdown(async move {
            graceful.cancelled().await;
            tracing::info!(
                "Shutdown signal received, starting graceful shutdown (timeout: {}s)",
                shutdown_timeout.as_secs()
            );
        });

        tracing::info!("Waiting for connections");

        // the timeout only starts once shutdown has begun
        tokio::select! {
            result = serve_future => {
                tracing::info!("Graceful shutdown completed");
                result?;
            }
            _ = async {
                shutdown.cancelled().await;
                tokio::time::sleep(shutdown_timeout).await;
            } => {
                tracing::warn!("Graceful shutdown timeout expired, forcing shutdown");
            }
        }

        Ok(())
    }

    /// Adds a route to one of the two policy groups. Call before
    /// [`AppRouter::setup_middleware`] so the chain covers it.
    pub fn route(
        mut self,
        group: RouteGroup,
        path: &str,
        route: MethodRouter<AppContext>,
    ) -> Result<Self> {
        let policy = self.policy_for(group)?;
        let routed = apply_policy(Router::new().route(path, route), policy);
        self.inner = self.inner.merge(routed);
        Ok(self)
    }

    /// The assembled router with its state applied.
    pub fn into_inner(self) -> Router {
        self.inner.with_state(self.context)
    }
}
