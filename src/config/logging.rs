use {crate::Result, serde::Deserialize};

#[cfg(feature = "opentelemetry")]
use crate::config::opentelemetry::OpenTelemetryConfig;

/// Log output settings. The level filter comes from `RUST_LOG`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,

    /// Trace exporter; also activated by `OTEL_EXPORTER_OTLP_ENDPOINT`.
    #[cfg(feature = "opentelemetry")]
    #[serde(default)]
    pub opentelemetry: Option<OpenTelemetryConfig>,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        #[cfg(feature = "opentelemetry")]
        if let Some(otel) = &self.opentelemetry
            && otel.endpoint.trim().is_empty()
        {
            return Err(crate::Error::config(
                "logging.opentelemetry.endpoint must not be empty",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Default,
    Compact,
    Pretty,
}
