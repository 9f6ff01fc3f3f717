use {
    crate::{AppContext, HealthRecord, render::render_html},
    axum::{Json, extract::State, response::Response},
    http::{StatusCode, Uri},
    serde_json::json,
};

pub const NOT_FOUND_TITLE: &str = "404: This page could not be found";

/// `GET /healthz`: the build record captured at startup.
pub async fn healthz(State(ctx): State<AppContext>) -> Json<HealthRecord> {
    Json(ctx.health().clone())
}

/// Serves every path no route matched.
pub async fn not_found(State(ctx): State<AppContext>, uri: Uri) -> Response {
    tracing::debug!(path = %uri.path(), "No route matched");
    render_html(
        ctx.renderer(),
        StatusCode::NOT_FOUND,
        "404",
        &json!({ "Title": NOT_FOUND_TITLE }),
    )
}
