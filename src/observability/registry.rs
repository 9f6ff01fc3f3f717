use {
    super::HttpMetrics,
    crate::{MetricsConfig, Result},
    prometheus::{Encoder, Registry, TextEncoder, proto::MetricFamily},
    std::{sync::Arc, time::Duration},
    tokio_util::{sync::CancellationToken, task::AbortOnDropHandle},
};

/// A destination for periodic metric snapshots.
pub trait MeasurementSink: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn export(&self, families: &[MetricFamily]) -> Result<()>;
}

/// Collects exporters before the server starts.
///
/// The builder owns the metrics registry and the HTTP server views; nothing
/// can be registered once [`ExporterRegistryBuilder::freeze`] has run.
pub struct ExporterRegistryBuilder {
    registry: Registry,
    http: HttpMetrics,
    sinks: Vec<Arc<dyn MeasurementSink>>,
    reporting_interval: Duration,
}

impl ExporterRegistryBuilder {
    /// Creates the default exporter. Fails when the namespace is empty or the
    /// HTTP views cannot be registered.
    pub fn new(config: &MetricsConfig) -> Result<Self> {
        let registry = Registry::new_custom(Some(config.namespace.clone()), None)?;
        let http = HttpMetrics::register(&registry)?;
        Ok(ExporterRegistryBuilder {
            registry,
            http,
            sinks: Vec::new(),
            reporting_interval: config.reporting_interval,
        })
    }

    /// Appends a sink. Sinks receive snapshots in registration order.
    #[must_use]
    pub fn register(mut self, sink: Arc<dyn MeasurementSink>) -> Self {
        tracing::debug!(sink = sink.name(), "Registered measurement sink");
        self.sinks.push(sink);
        self
    }

    pub fn freeze(self) -> ExporterRegistry {
        ExporterRegistry {
            registry: self.registry,
            http: self.http,
            sinks: self.sinks.into(),
            reporting_interval: self.reporting_interval,
        }
    }
}

/// The frozen set of exporters, shared read-only by every request.
pub struct ExporterRegistry {
    registry: Registry,
    http: HttpMetrics,
    sinks: Arc<[Arc<dyn MeasurementSink>]>,
    reporting_interval: Duration,
}

impl ExporterRegistry {
    pub fn http_metrics(&self) -> &HttpMetrics {
        &self.http
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|sink| sink.name()).collect()
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Text exposition of the default exporter, with its content type.
    pub fn render(&self) -> Result<(String, Vec<u8>)> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.gather(), &mut buffer)?;
        Ok((encoder.format_type().to_owned(), buffer))
    }

    /// Pushes one snapshot to every sink. A failing sink is logged and does
    /// not stop the others.
    pub fn report(&self) {
        if self.sinks.is_empty() {
            return;
        }
        let families = self.gather();
        for sink in self.sinks.iter() {
            if let Err(err) = sink.export(&families) {
                tracing::warn!(sink = sink.name(), error = %err, "Measurement export failed");
            }
        }
    }

    /// Reports at the configured interval until `token` is cancelled or the
    /// handle is dropped.
    pub fn spawn_reporting(self: &Arc<Self>, token: CancellationToken) -> AbortOnDropHandle<()> {
        let exporters = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(exporters.reporting_interval);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::debug!("Measurement reporting stopped");
                        break;
                    }
                    _ = interval.tick() => exporters.report(),
                }
            }
        });
        AbortOnDropHandle::new(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        snapshots: Mutex<Vec<usize>>,
    }

    impl MeasurementSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        fn export(&self, families: &[MetricFamily]) -> Result<()> {
            self.snapshots.lock().unwrap().push(families.len());
            Ok(())
        }
    }

    struct FailingSink;

    impl MeasurementSink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        fn export(&self, _families: &[MetricFamily]) -> Result<()> {
            Err(Error::metrics("backend unreachable"))
        }
    }

    fn metrics_config() -> MetricsConfig {
        MetricsConfig::default()
    }

    #[test]
    fn test_render_uses_namespace() {
        let registry = ExporterRegistryBuilder::new(&metrics_config())
            .unwrap()
            .freeze();
        registry.http_metrics().observe("GET", "/healthz", 200, 0.001);

        let (content_type, body) = registry.render().unwrap();
        let text = String::from_utf8(body).unwrap();
        assert!(content_type.starts_with("text/plain"));
        assert!(text.contains("graphql_http_server_requests_total"));
        assert!(text.contains("route=\"/healthz\""));
    }

    #[test]
    fn test_empty_namespace_is_fatal() {
        let config = MetricsConfig {
            namespace: String::new(),
            ..MetricsConfig::default()
        };
        let err = ExporterRegistryBuilder::new(&config).err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::Metrics);
    }

    #[test]
    fn test_sinks_keep_registration_order() {
        let registry = ExporterRegistryBuilder::new(&metrics_config())
            .unwrap()
            .register(Arc::new(RecordingSink::default()))
            .register(Arc::new(FailingSink))
            .freeze();
        assert_eq!(registry.sink_names(), vec!["recording", "failing"]);
    }

    #[test]
    fn test_failing_sink_does_not_stop_others() {
        let recording = Arc::new(RecordingSink::default());
        let registry = ExporterRegistryBuilder::new(&metrics_config())
            .unwrap()
            .register(Arc::new(FailingSink))
            .register(recording.clone())
            .freeze();
        registry.http_metrics().observe("GET", "/", 200, 0.001);

        registry.report();
        assert_eq!(recording.snapshots.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reporting_task_stops_on_cancel() {
        let recording = Arc::new(RecordingSink::default());
        let registry = Arc::new(
            ExporterRegistryBuilder::new(&metrics_config())
                .unwrap()
                .register(recording.clone())
                .freeze(),
        );
        let token = CancellationToken::new();
        let handle = registry.spawn_reporting(token.clone());

        tokio::time::sleep(Duration::from_secs(130)).await;
        assert_eq!(recording.snapshots.lock().unwrap().len(), 2);

        token.cancel();
        handle.await.unwrap();
    }
}
