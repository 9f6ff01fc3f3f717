//! The middleware chain shared by every route.
//!
//! Order, outermost first:
//!
//! 1. HTTP server metrics
//! 2. request id (assigned, then propagated to the response)
//! 3. real client IP
//! 4. request logging
//! 5. panic recovery
//! 6. session handle
//! 7. cross-origin policy
//!
//! Logging must stay inside request-id assignment so every log line of a
//! request carries its id. Layers are added innermost first.

use {
    super::{AppRouter, real_ip},
    crate::{ClientIp, Error, Result, utils::RequestIdGenerator},
    axum::{body::Body, middleware},
    http::{HeaderName, HeaderValue, Method, Request, Response, StatusCode},
    std::sync::Arc,
    tower_http::{
        catch_panic::CatchPanicLayer,
        cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
        request_id::{PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
        trace::{DefaultOnResponse, TraceLayer},
    },
    tower_sessions::{
        Expiry, MemoryStore, SessionManagerLayer,
        cookie::{SameSite, time::Duration as CookieDuration},
    },
    tracing::Level,
};

#[cfg(feature = "opentelemetry")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

impl AppRouter {
    /// Wraps everything routed so far in the middleware chain.
    pub fn setup_middleware(self) -> Result<Self> {
        Ok(self
            .setup_cors() // 7. cross-origin policy
            .setup_session_handling() // 6. session handle
            .setup_catch_panic() // 5. panic recovery
            .setup_logging() // 4. request logging
            .setup_real_ip()? // 3. real client IP
            .setup_request_id() // 2. request id
            .setup_http_metrics()) // 1. outermost
    }

    /// Credentials are allowed. Unconfigured origins, methods and headers
    /// mirror the request, so preflights always succeed; they are answered
    /// here and never reach a route.
    #[must_use]
    pub fn setup_cors(mut self) -> Self {
        let config = &self.config.http.cors;

        let mut cors = CorsLayer::new();
        cors = match &config.allowed_origins {
            Some(origins) => cors.allow_origin(AllowOrigin::list(
                origins
                    .iter()
                    .filter_map(|origin| HeaderValue::from_str(origin).ok()),
            )),
            None => cors.allow_origin(AllowOrigin::mirror_request()),
        };
        cors = match &config.allowed_methods {
            Some(methods) => {
                cors.allow_methods(methods.iter().map(|m| m.0.clone()).collect::<Vec<Method>>())
            }
            None => cors.allow_methods(AllowMethods::mirror_request()),
        };
        cors = match &config.allowed_headers {
            Some(headers) => cors.allow_headers(
                headers
                    .iter()
                    .map(|h| h.0.clone())
                    .collect::<Vec<HeaderName>>(),
            ),
            None => cors.allow_headers(AllowHeaders::mirror_request()),
        };
        if !config.exposed_headers.is_empty() {
            cors = cors.expose_headers(
                config
                    .exposed_headers
                    .iter()
                    .map(|h| h.0.clone())
                    .collect::<Vec<HeaderName>>(),
            );
        }
        if let Some(max_age) = config.max_age {
            cors = cors.max_age(max_age);
        }
        // must come after origins and headers
        if config.allow_credentials {
            cors = cors.allow_credentials(true);
        }

        self.inner = self.inner.layer(cors);
        self
    }

    /// In-memory cookie sessions. The cookie is `Secure` outside
    /// development.
    #[must_use]
    pub fn setup_session_handling(mut self) -> Self {
        let config = &self.config.http.session;
        let inactivity = i64::try_from(config.inactivity_timeout.as_secs()).unwrap_or(i64::MAX);

        let session_layer = SessionManagerLayer::new(MemoryStore::default())
            .with_name(config.cookie_name.clone())
            .with_secure(!self.config.mode.is_development())
            .with_same_site(SameSite::Lax)
            .with_expiry(Expiry::OnInactivity(CookieDuration::seconds(inactivity)));
        self.inner = self.inner.layer(session_layer);
        self
    }

    /// Chain-level recovery for panics outside GraphQL execution (which has
    /// its own boundary). Answers 500 and keeps serving.
    #[must_use]
    pub fn setup_catch_panic(mut self) -> Self {
        self.inner = self.inner.layer(CatchPanicLayer::custom(
            |err: Box<dyn std::any::Any + Send + 'static>| {
                let msg = if let Some(s) = err.downcast_ref::<String>() {
                    s.as_str()
                } else if let Some(s) = err.downcast_ref::<&str>() {
                    s
                } else {
                    "non-string panic payload"
                };
                tracing::error!(panic = %msg, "Handler panicked");

                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
                    .body("Internal Server Error".to_string())
                    .unwrap_or_else(|_| Response::new("Internal Server Error".to_string()))
            },
        ));
        self
    }

    /// Opens the `http_request` span every log line of the request is
    /// nested in, and logs the response status and latency.
    #[must_use]
    pub fn setup_logging(mut self) -> Self {
        self.inner = self.inner.layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestId>()
                        .and_then(|id| id.header_value().to_str().ok())
                        .unwrap_or("unknown");
                    let client_ip = request
                        .extensions()
                        .get::<ClientIp>()
                        .map(|ip| ip.0.to_string())
                        .unwrap_or_default();

                    let span = tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                        client_ip = %client_ip,
                    );

                    #[cfg(feature = "opentelemetry")]
                    {
                        use opentelemetry::propagation::Extractor;

                        struct HeaderExtractor<'a>(&'a http::HeaderMap);

                        impl Extractor for HeaderExtractor<'_> {
                            fn get(&self, key: &str) -> Option<&str> {
                                self.0.get(key).and_then(|v| v.to_str().ok())
                            }

                            fn keys(&self) -> Vec<&str> {
                                self.0.keys().map(|k| k.as_str()).collect()
                            }
                        }

                        let parent = opentelemetry::global::get_text_map_propagator(|propagator| {
                            propagator.extract(&HeaderExtractor(request.headers()))
                        });
                        span.set_parent(parent).ok();
                    }

                    span
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );
        self
    }

    pub fn setup_real_ip(mut self) -> Result<Self> {
        let trusted = self
            .config
            .http
            .real_ip_headers
            .iter()
            .map(|name| {
                HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| Error::config(format!("invalid real IP header {name:?}")))
            })
            .collect::<Result<Vec<_>>>()?;

        self.inner = self.inner.layer(middleware::from_fn_with_state(
            Arc::<[HeaderName]>::from(trusted),
            real_ip::resolve_client_ip,
        ));
        Ok(self)
    }

    /// Keeps an inbound `x-request-id` or mints a UUIDv7, and echoes it on
    /// the response.
    #[must_use]
    pub fn setup_request_id(mut self) -> Self {
        // the setter must be outside the propagator
        self.inner = self
            .inner
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(RequestIdGenerator));
        self
    }

    #[must_use]
    pub fn setup_http_metrics(mut self) -> Self {
        let metrics = self.context.exporters().http_metrics().clone();
        self.inner = self.inner.layer(middleware::from_fn_with_state(
            metrics,
            crate::observability::record_http_metrics,
        ));
        self
    }
}
