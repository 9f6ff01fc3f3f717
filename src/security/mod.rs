//! Route-group security policies.
//!
//! Every route belongs to exactly one group, and every group is layered with
//! exactly one [`SecurityPolicy`] before it is merged into the application
//! router. The layers of a group, outermost first:
//!
//! 1. transport enforcement: the TLS redirect for plain requests and
//!    Strict-Transport-Security for secure ones
//! 2. `X-XSS-Protection: 1; mode=block`
//! 3. helmet: `X-Frame-Options: DENY` and `X-Content-Type-Options: nosniff`
//!
//! A redirect short-circuits before the header layers run.
mod policy;

pub use policy::*;

use {
    crate::Error,
    axum::{
        Router,
        extract::{Request, State},
        middleware::{self, Next},
        response::{IntoResponse, Response},
    },
    axum_helmet::{Helmet, HelmetLayer},
    http::{
        HeaderValue, StatusCode,
        header::{LOCATION, STRICT_TRANSPORT_SECURITY, X_XSS_PROTECTION},
    },
    std::sync::Arc,
    tower_http::set_header::SetResponseHeaderLayer,
};

/// Wraps every route of `router` in `policy`.
pub fn apply_policy<S>(router: Router<S>, policy: SecurityPolicy) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let mut helmet = Helmet::new();
    if policy.content_type_nosniff {
        helmet = helmet.add(helmet_core::XContentTypeOptions::nosniff());
    }
    if policy.frame_deny {
        helmet = helmet.add(axum_helmet::XFrameOptions::Deny);
    }
    let mut router = router.layer(
        HelmetLayer::try_from(helmet).expect("static helmet headers are valid"),
    );

    if policy.browser_xss_filter {
        router = router.layer(SetResponseHeaderLayer::overriding(
            X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ));
    }

    router.layer(middleware::from_fn_with_state(
        Arc::new(policy),
        enforce_transport,
    ))
}

async fn enforce_transport(
    State(policy): State<Arc<SecurityPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    if !policy.enforces_transport() {
        return next.run(request).await;
    }

    let secure = policy.is_secure(request.uri(), request.headers());
    if !secure && policy.ssl_redirect {
        return match policy.redirect_location(request.uri(), request.headers()) {
            Some(location) => {
                tracing::debug!(policy = policy.name, %location, "Redirecting to https");
                (StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response()
            }
            None => {
                tracing::warn!(
                    policy = policy.name,
                    uri = %request.uri(),
                    "Insecure request without a host, refusing"
                );
                Error::invalid_input("https required and the request names no host")
                    .into_response()
            }
        };
    }

    let mut response = next.run(request).await;
    if secure && let Some(value) = policy.sts_header_value() {
        response.headers_mut().insert(STRICT_TRANSPORT_SECURITY, value);
    }
    response
}
