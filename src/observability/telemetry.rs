//! Optional OTLP trace exporter.

#[cfg(feature = "opentelemetry")]
use {
    crate::{Error, LoggingConfig, Result},
    opentelemetry::{global, trace::TracerProvider},
    opentelemetry_otlp::WithExportConfig,
    opentelemetry_sdk::{
        Resource,
        trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
    },
    tracing_subscriber::{Layer, registry::LookupSpan},
};

/// Keeps the trace exporter alive. Dropping it flushes and shuts down the
/// exporter; hold it until the server has stopped.
#[derive(Default)]
#[must_use]
pub struct TelemetryGuard {
    #[cfg(feature = "opentelemetry")]
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    pub fn is_exporting(&self) -> bool {
        #[cfg(feature = "opentelemetry")]
        {
            self.provider.is_some()
        }
        #[cfg(not(feature = "opentelemetry"))]
        {
            false
        }
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "opentelemetry")]
        if let Some(provider) = self.provider.take()
            && let Err(err) = provider.shutdown()
        {
            eprintln!("trace exporter shutdown failed: {err}");
        }
    }
}

/// Builds the OTLP layer when an endpoint is configured, with W3C trace
/// context propagation and `AlwaysOn` sampling.
#[cfg(feature = "opentelemetry")]
#[allow(clippy::type_complexity)]
pub(crate) fn trace_exporter<S>(
    logging: &LoggingConfig,
) -> Result<(Option<Box<dyn Layer<S> + Send + Sync + 'static>>, TelemetryGuard)>
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
{
    let Some(otel_config) = &logging.opentelemetry else {
        return Ok((None, TelemetryGuard::default()));
    };
    let service_name = otel_config.service_name();

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&otel_config.endpoint)
        .build()
        .map_err(|e| Error::telemetry(format!("Failed to create OTLP exporter: {e}")))?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_id_generator(RandomIdGenerator::default())
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(
            Resource::builder()
                .with_service_name(service_name.clone())
                .build(),
        )
        .build();

    global::set_tracer_provider(provider.clone());
    global::set_text_map_propagator(opentelemetry_sdk::propagation::TraceContextPropagator::new());

    let tracer = provider.tracer(service_name);
    let layer = tracing_opentelemetry::layer().with_tracer(tracer).boxed();

    Ok((
        Some(layer),
        TelemetryGuard {
            provider: Some(provider),
        },
    ))
}
