use serde::Deserialize;

/// OTLP trace exporter endpoint.
///
/// ```toml
/// [logging.opentelemetry]
/// endpoint = "http://localhost:4317"
/// service_name = "graphql-server"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct OpenTelemetryConfig {
    pub endpoint: String,

    #[serde(default)]
    pub service_name: Option<String>,
}

impl OpenTelemetryConfig {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            service_name: Some(env!("CARGO_PKG_NAME").into()),
        }
    }

    pub fn service_name(&self) -> String {
        self.service_name
            .clone()
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
    }
}
