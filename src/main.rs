use {
    graphql_server::{Collaborators, Config, InMemoryIdentityStore, UnconfiguredSchema, server},
    std::{process::ExitCode, sync::Arc},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            // no subscriber yet
            eprintln!("Failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let _telemetry = match config.setup_tracing() {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Failed to initialize tracing: {err}");
            return ExitCode::FAILURE;
        }
    };

    let collaborators = Collaborators::new(Arc::new(UnconfiguredSchema))
        .with_identity_store(Arc::new(InMemoryIdentityStore::from_config(&config.auth)));

    match server::run(config, collaborators).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(kind = %err.kind(), error = %err, "Server terminated");
            ExitCode::FAILURE
        }
    }
}
