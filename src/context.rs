//! The dependency-injection context built once at startup.
//!
//! [`AppContext`] carries every collaborator a handler may need (renderer,
//! schema, credential verifier, admin authorizer, exporters) plus the health
//! record. It is cheap to clone and shared as the router state; tests build
//! their own isolated instances.

use {
    crate::{
        Config, DeploymentMode, Result,
        admin::{AdminAuthorizer, AlwaysAllowForDevelopment, DenyAll},
        auth::{CredentialVerifier, IDENTITY_KEY, Identity, IdentityStore, InMemoryIdentityStore},
        graphql::{ExecutableSchema, PanicIsolated},
        observability::{ExporterRegistry, ExporterRegistryBuilder, MeasurementSink},
        render::{BuiltinViews, Renderer},
    },
    axum::extract::FromRequestParts,
    http::request::Parts,
    serde::Serialize,
    std::{convert::Infallible, net::IpAddr, sync::Arc},
    tower_http::request_id::RequestId,
    tower_sessions::Session,
};

/// External collaborators supplied by the embedding application.
pub struct Collaborators {
    schema: Arc<dyn ExecutableSchema>,
    renderer: Arc<dyn Renderer>,
    identity_store: Arc<dyn IdentityStore>,
    admin: Option<Arc<dyn AdminAuthorizer>>,
    sinks: Vec<Arc<dyn MeasurementSink>>,
}

impl Collaborators {
    /// Built-in views, an empty identity store, and the mode's default
    /// admin authorizer.
    pub fn new(schema: Arc<dyn ExecutableSchema>) -> Self {
        Collaborators {
            schema,
            renderer: Arc::new(BuiltinViews::default()),
            identity_store: Arc::new(InMemoryIdentityStore::default()),
            admin: None,
            sinks: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    #[must_use]
    pub fn with_identity_store(mut self, store: Arc<dyn IdentityStore>) -> Self {
        self.identity_store = store;
        self
    }

    #[must_use]
    pub fn with_admin_authorizer(mut self, authorizer: Arc<dyn AdminAuthorizer>) -> Self {
        self.admin = Some(authorizer);
        self
    }

    /// Adds a measurement sink. Sinks receive snapshots in the order added.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn MeasurementSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

/// The `GET /healthz` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthRecord {
    pub healthy: &'static str,
    pub revision: String,
    pub tag: String,
    pub branch: String,
}

#[derive(Clone)]
pub struct AppContext {
    inner: Arc<Inner>,
}

struct Inner {
    mode: DeploymentMode,
    renderer: Arc<dyn Renderer>,
    schema: PanicIsolated,
    verifier: CredentialVerifier,
    admin: Arc<dyn AdminAuthorizer>,
    exporters: Arc<ExporterRegistry>,
    health: HealthRecord,
}

impl AppContext {
    /// Builds the context and freezes the exporter registry. Fails when the
    /// metrics exporter cannot be created.
    pub fn new(config: &Config, collaborators: Collaborators) -> Result<Self> {
        let Collaborators {
            schema,
            renderer,
            identity_store,
            admin,
            sinks,
        } = collaborators;

        let exporters = sinks
            .into_iter()
            .fold(ExporterRegistryBuilder::new(&config.metrics)?, |builder, sink| {
                builder.register(sink)
            })
            .freeze();

        let admin = admin.unwrap_or_else(|| default_authorizer(config.mode));

        Ok(AppContext {
            inner: Arc::new(Inner {
                mode: config.mode,
                renderer,
                schema: PanicIsolated::new(schema),
                verifier: CredentialVerifier::password(identity_store),
                admin,
                exporters: Arc::new(exporters),
                health: HealthRecord {
                    healthy: "true",
                    revision: config.build.revision.clone(),
                    tag: config.build.tag.clone(),
                    branch: config.build.branch.clone(),
                },
            }),
        })
    }

    pub fn mode(&self) -> DeploymentMode {
        self.inner.mode
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.inner.renderer.as_ref()
    }

    /// The schema, already wrapped in panic isolation.
    pub fn schema(&self) -> &PanicIsolated {
        &self.inner.schema
    }

    pub fn verifier(&self) -> &CredentialVerifier {
        &self.inner.verifier
    }

    pub fn admin(&self) -> &dyn AdminAuthorizer {
        self.inner.admin.as_ref()
    }

    pub fn exporters(&self) -> &Arc<ExporterRegistry> {
        &self.inner.exporters
    }

    pub fn health(&self) -> &HealthRecord {
        &self.inner.health
    }
}

fn default_authorizer(mode: DeploymentMode) -> Arc<dyn AdminAuthorizer> {
    if mode.is_development() {
        tracing::warn!("Admin routes are open: using the always-allow development authorizer");
        Arc::new(AlwaysAllowForDevelopment)
    } else {
        Arc::new(DenyAll)
    }
}

/// Originating client address, resolved by the real-IP link of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

/// Per-request view assembled from what the middleware chain attached.
/// Never fails: missing pieces are `None`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Option<String>,
    pub client_ip: Option<IpAddr>,
    pub session: Option<Session>,
}

impl RequestContext {
    /// The identity stored in the session by a successful login.
    pub async fn identity(&self) -> Option<Identity> {
        let session = self.session.as_ref()?;
        match session.get::<Identity>(IDENTITY_KEY).await {
            Ok(identity) => identity,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load session identity");
                None
            }
        }
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(RequestContext {
            request_id: parts
                .extensions
                .get::<RequestId>()
                .and_then(|id| id.header_value().to_str().ok())
                .map(str::to_owned),
            client_ip: parts.extensions.get::<ClientIp>().map(|ip| ip.0),
            session: parts.extensions.get::<Session>().cloned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BuildInfo, graphql::UnconfiguredSchema};

    fn context(mode: DeploymentMode) -> AppContext {
        let config = Config::default()
            .with_mode(mode)
            .with_build_info(BuildInfo::new("abc123", "v1.2.0", "main"));
        AppContext::new(&config, Collaborators::new(Arc::new(UnconfiguredSchema))).unwrap()
    }

    fn parts() -> Parts {
        http::Request::builder().body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_health_record_from_build_info() {
        let ctx = context(DeploymentMode::Production);
        assert_eq!(
            ctx.health(),
            &HealthRecord {
                healthy: "true",
                revision: "abc123".into(),
                tag: "v1.2.0".into(),
                branch: "main".into(),
            }
        );
    }

    #[test]
    fn test_default_authorizer_follows_mode() {
        let dev = context(DeploymentMode::Development);
        let prod = context(DeploymentMode::Production);
        assert_eq!(dev.admin().authorize(&parts()), crate::AccessDecision::Allow);
        assert_eq!(prod.admin().authorize(&parts()), crate::AccessDecision::Deny);
    }

    #[test]
    fn test_injected_authorizer_wins() {
        let config = Config::default();
        let ctx = AppContext::new(
            &config,
            Collaborators::new(Arc::new(UnconfiguredSchema))
                .with_admin_authorizer(Arc::new(DenyAll)),
        )
        .unwrap();
        assert_eq!(ctx.admin().authorize(&parts()), crate::AccessDecision::Deny);
    }

    #[test]
    fn test_invalid_metrics_namespace_is_fatal() {
        let mut config = Config::default();
        config.metrics.namespace = String::new();
        let result = AppContext::new(&config, Collaborators::new(Arc::new(UnconfiguredSchema)));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_request_context_from_extensions() {
        let mut request = http::Request::builder().body(()).unwrap();
        request
            .extensions_mut()
            .insert(RequestId::new(http::HeaderValue::from_static("req-1")));
        request
            .extensions_mut()
            .insert(ClientIp("203.0.113.7".parse().unwrap()));
        let (mut parts, _) = request.into_parts();

        let ctx = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.request_id.as_deref(), Some("req-1"));
        assert_eq!(ctx.client_ip, Some("203.0.113.7".parse().unwrap()));
        assert!(ctx.session.is_none());
        assert!(ctx.identity().await.is_none());
    }
}
