//! The `/admin` sub-router and its authorization extension point.
//!
//! No real admin policy exists yet. The check is an explicit
//! [`AdminAuthorizer`] so that the gap stays visible: development wiring
//! uses [`AlwaysAllowForDevelopment`], production wiring defaults to
//! [`DenyAll`] until an authorizer is injected.

use {
    crate::{AppContext, Error, RequestContext, Result, not_found, render::render_html},
    axum::{
        Router,
        extract::{Request, State},
        middleware::{self, Next},
        response::Response,
        routing::{any, get},
    },
    http::{StatusCode, request::Parts},
    serde_json::json,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny,
}

pub trait AdminAuthorizer: Send + Sync + 'static {
    fn authorize(&self, request: &Parts) -> AccessDecision;
}

/// Permits every request. Only for local development.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllowForDevelopment;

impl AdminAuthorizer for AlwaysAllowForDevelopment {
    fn authorize(&self, _request: &Parts) -> AccessDecision {
        AccessDecision::Allow
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl AdminAuthorizer for DenyAll {
    fn authorize(&self, _request: &Parts) -> AccessDecision {
        AccessDecision::Deny
    }
}

/// Every path under `/admin`, gated by the context's authorizer.
///
/// The dashboard answers on `/admin` and `/admin/`. Any other sub-path is
/// a not-found page, served behind the same gate.
pub fn routes(ctx: AppContext) -> Router<AppContext> {
    Router::new()
        .route("/admin", get(dashboard))
        .route("/admin/", get(dashboard))
        .route("/admin/{*rest}", any(not_found))
        .layer(middleware::from_fn_with_state(ctx, require_admin))
}

async fn require_admin(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let (parts, body) = request.into_parts();
    match ctx.admin().authorize(&parts) {
        AccessDecision::Allow => Ok(next.run(Request::from_parts(parts, body)).await),
        AccessDecision::Deny => {
            tracing::warn!(path = %parts.uri.path(), "Admin access denied");
            Err(Error::authorization("admin access denied"))
        }
    }
}

async fn dashboard(State(ctx): State<AppContext>, request_ctx: RequestContext) -> Response {
    let login = request_ctx
        .identity()
        .await
        .map(|identity| identity.login)
        .unwrap_or_else(|| "anonymous".to_owned());
    render_html(
        ctx.renderer(),
        StatusCode::OK,
        "admin",
        &json!({ "Title": "Admin", "Login": login }),
    )
}
