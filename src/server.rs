use crate::{AppContext, AppRouter, Collaborators, Config, Result};

/// The startup sequence: validate, build and freeze the exporters, build
/// the context, assemble the router, bind and serve.
///
/// Any error returned before the listener is bound is startup-fatal.
///
/// ```rust,no_run
/// use graphql_server::{Collaborators, Config, UnconfiguredSchema, server};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> graphql_server::Result<()> {
///     let config = Config::load()?;
///     let _guard = config.setup_tracing()?;
///     server::run(config, Collaborators::new(Arc::new(UnconfiguredSchema))).await
/// }
/// ```
pub async fn run(config: Config, collaborators: Collaborators) -> Result<()> {
    const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    tracing::info!(
        mode = ?config.mode,
        revision = %config.build.revision,
        "Starting {PACKAGE_NAME} version {VERSION}..."
    );

    config.validate()?;
    let context = AppContext::new(&config, collaborators)?;
    tracing::debug!(
        sinks = ?context.exporters().sink_names(),
        "Exporter registry frozen"
    );

    AppRouter::new(config, context)?
        .setup_routes()?
        .setup_middleware()?
        .start()
        .await
}
