use {
    crate::Result,
    axum::{
        extract::{MatchedPath, Request, State},
        middleware::Next,
        response::Response,
    },
    prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry},
    std::time::Instant,
};

const LABELS: [&str; 3] = ["method", "route", "status"];

/// Request count and latency for every request the server answers,
/// labelled by method, matched route and status.
#[derive(Clone)]
pub struct HttpMetrics {
    requests: IntCounterVec,
    latency: HistogramVec,
}

impl HttpMetrics {
    pub(crate) fn register(registry: &Registry) -> Result<Self> {
        let requests = IntCounterVec::new(
            Opts::new(
                "http_server_requests_total",
                "Number of HTTP requests answered",
            ),
            &LABELS,
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new(
                "http_server_latency_seconds",
                "Time from the first byte of the request to the response head",
            ),
            &LABELS,
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(latency.clone()))?;
        Ok(HttpMetrics { requests, latency })
    }

    pub fn observe(&self, method: &str, route: &str, status: u16, seconds: f64) {
        let status = status.to_string();
        let labels = [method, route, status.as_str()];
        self.requests.with_label_values(&labels).inc();
        self.latency.with_label_values(&labels).observe(seconds);
    }

    pub fn request_count(&self, method: &str, route: &str, status: u16) -> u64 {
        let status = status.to_string();
        self.requests
            .with_label_values(&[method, route, status.as_str()])
            .get()
    }
}

/// Outermost link: times the whole chain, including the security groups.
pub async fn record_http_metrics(
    State(metrics): State<HttpMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(request).await;

    metrics.observe(
        &method,
        &route,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}
