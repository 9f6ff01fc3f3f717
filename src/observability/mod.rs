//! Exporters: the metrics registry behind `/metrics`, additional measurement
//! sinks, the HTTP server views and the optional trace exporter.
mod http_metrics;
mod registry;
mod telemetry;

pub use http_metrics::*;
pub use registry::*;
pub use telemetry::*;

use {
    crate::{AppContext, Result},
    axum::{
        extract::State,
        response::{IntoResponse, Response},
    },
    http::header::CONTENT_TYPE,
};

/// `GET /metrics`: the default exporter's text exposition.
pub async fn scrape(State(ctx): State<AppContext>) -> Result<Response> {
    let (content_type, body) = ctx.exporters().render()?;
    Ok(([(CONTENT_TYPE, content_type)], body).into_response())
}
