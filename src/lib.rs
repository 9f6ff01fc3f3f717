//! # graphql-server
//!
//! The network-facing front of a GraphQL service, built on axum.
//!
//! Every request passes through one middleware chain (metrics, request id,
//! real client IP, logging, panic recovery, session, CORS). It then reaches
//! one of two route groups, each guarded by its own security policy:
//!
//! | Method | Path | Group |
//! |--------|------|-------|
//! | GET | `/healthz` | open |
//! | GET | `/metrics` | open |
//! | ANY | `/auth/*` | enforced |
//! | ANY | `/admin/*` | enforced |
//! | GET | `/` | enforced |
//! | POST | `/graphql` | enforced |
//!
//! The *open* group never forces TLS. The *enforced* group redirects plain
//! requests to HTTPS and sends Strict-Transport-Security, except in
//! development mode. Unmatched paths get a rendered 404 page.
//!
//! The GraphQL schema, the identity store, the view renderer and extra
//! measurement sinks are collaborators injected through [`Collaborators`].
//! The schema always runs inside [`PanicIsolated`], so a panicking resolver
//! produces a logged backtrace and a generic GraphQL error instead of a
//! dropped connection.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use graphql_server::{Collaborators, Config, UnconfiguredSchema, server};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> graphql_server::Result<()> {
//!     let config = Config::load()?; // DATABASE_URL, PORT, NAT_ENV, ...
//!     let _guard = config.setup_tracing()?;
//!     server::run(config, Collaborators::new(Arc::new(UnconfiguredSchema))).await
//! }
//! ```
//!
//! # Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`](Config) | Layered configuration and validation |
//! | [`error`](Error) | Error kinds and the JSON error response |
//! | [`graphql`] | Schema contract, panic isolation, execution handler |
//! | [`auth`] | Credential verification and the `/auth` routes |
//! | [`admin`] | Admin authorization extension point and `/admin` routes |
//! | [`observability`] | Metrics exporter, sinks, trace exporter |
//! | [`render`] | View rendering |
//! | [`server`] | Startup sequence |
mod config;
mod context;
mod error;
mod router;
mod security;
mod utils;

pub mod admin;
pub mod auth;
pub mod graphql;
pub mod observability;
pub mod render;
pub mod server;

pub use config::*;
pub use context::*;
pub use error::*;
pub use router::*;
pub use security::*;
pub use utils::*;

pub use admin::{AccessDecision, AdminAuthorizer, AlwaysAllowForDevelopment, DenyAll};
pub use auth::{
    AuthFailure, CredentialVerifier, Credentials, Identity, IdentityStore, InMemoryIdentityStore,
    PasswordVerifier,
};
pub use graphql::{
    ExecutableSchema, ExecutionContext, GraphQLError, GraphQLRequest, GraphQLResponse,
    PanicIsolated, UnconfiguredSchema,
};
pub use observability::{
    ExporterRegistry, ExporterRegistryBuilder, HttpMetrics, MeasurementSink, TelemetryGuard,
};
pub use render::{BuiltinViews, Renderer};

pub type Result<T> = std::result::Result<T, Error>;
