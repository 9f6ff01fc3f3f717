use {
    crate::{Error, Result},
    serde::Deserialize,
    std::time::Duration,
};

/// Settings for the default metrics exporter and sink reporting.
///
/// ```toml
/// [metrics]
/// namespace = "graphql"
/// reporting_interval = "60s"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Prefix for every exported metric name.
    #[serde(default = "MetricsConfig::default_namespace")]
    pub namespace: String,

    /// How often registered sinks receive a snapshot.
    #[serde(
        default = "MetricsConfig::default_reporting_interval",
        with = "humantime_serde"
    )]
    pub reporting_interval: Duration,
}

impl MetricsConfig {
    fn default_namespace() -> String {
        "graphql".into()
    }

    fn default_reporting_interval() -> Duration {
        Duration::from_secs(60)
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(Error::config("metrics.namespace must not be empty"));
        }
        if self.reporting_interval.is_zero() {
            return Err(Error::config("metrics.reporting_interval must be > 0"));
        }
        Ok(())
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            namespace: Self::default_namespace(),
            reporting_interval: Self::default_reporting_interval(),
        }
    }
}
