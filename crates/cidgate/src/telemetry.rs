//! Logging and OpenTelemetry setup for `cidgate serve`.
//!
//! With an OTLP endpoint configured, spans, logs and metrics are exported over
//! gRPC alongside the fmt layer. Without one, logging is fmt-only.

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use gateconf::TelemetryConfig;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Timeout for OTLP exports - prevents blocking on unavailable endpoints
const EXPORT_TIMEOUT: Duration = Duration::from_secs(5);

const SERVICE_NAME: &str = "cidgate";

/// Provider handles kept for [`shutdown`]. Unset when logging is fmt-only.
struct Providers {
    tracer: SdkTracerProvider,
    logger: SdkLoggerProvider,
    meter: SdkMeterProvider,
}

static PROVIDERS: OnceLock<Providers> = OnceLock::new();

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|e| {
        eprintln!("invalid log filter {:?} ({}), using \"info\"", log_level, e);
        EnvFilter::new("info")
    })
}

/// Install the global subscriber according to `config`.
pub fn init(config: &TelemetryConfig) -> Result<()> {
    if config.otlp_enabled() {
        init_otlp(&config.otlp_endpoint, &config.log_level)
    } else {
        tracing_subscriber::registry()
            .with(env_filter(&config.log_level))
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("Failed to install tracing subscriber")?;
        Ok(())
    }
}

fn init_otlp(otlp_endpoint: &str, log_level: &str) -> Result<()> {
    let resource = Resource::builder_empty()
        .with_service_name(SERVICE_NAME)
        .with_attributes(vec![KeyValue::new(
            "service.version",
            env!("CARGO_PKG_VERSION"),
        )])
        .build();

    let endpoint = if otlp_endpoint.starts_with("http") {
        otlp_endpoint.to_string()
    } else {
        format!("http://{}", otlp_endpoint)
    };

    let trace_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .with_timeout(EXPORT_TIMEOUT)
        .build()
        .context("Failed to create OTLP span exporter")?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_span_processor(
            opentelemetry_sdk::trace::BatchSpanProcessor::builder(trace_exporter).build(),
        )
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource.clone())
        .build();

    let tracer = tracer_provider.tracer(SERVICE_NAME);
    global::set_tracer_provider(tracer_provider.clone());

    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .with_timeout(EXPORT_TIMEOUT)
        .build()
        .context("Failed to create OTLP log exporter")?;

    let logger_provider = SdkLoggerProvider::builder()
        .with_log_processor(
            opentelemetry_sdk::logs::BatchLogProcessor::builder(log_exporter).build(),
        )
        .with_resource(resource.clone())
        .build();

    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(EXPORT_TIMEOUT)
        .build()
        .context("Failed to create OTLP metric exporter")?;

    let meter_provider = SdkMeterProvider::builder()
        .with_reader(opentelemetry_sdk::metrics::PeriodicReader::builder(metric_exporter).build())
        .with_resource(resource)
        .build();

    global::set_meter_provider(meter_provider.clone());

    let log_appender =
        opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge::new(&logger_provider);

    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(log_appender)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    let _ = PROVIDERS.set(Providers {
        tracer: tracer_provider,
        logger: logger_provider,
        meter: meter_provider,
    });

    tracing::info!(endpoint = %otlp_endpoint, "OpenTelemetry initialized");

    Ok(())
}

/// Flush and stop the OTLP providers at the end of `serve`.
///
/// Batched spans, logs and metrics are exported before this returns, bounded
/// by [`EXPORT_TIMEOUT`] per exporter. A no-op when logging is fmt-only.
pub fn shutdown() -> Result<()> {
    let Some(providers) = PROVIDERS.get() else {
        return Ok(());
    };
    tracing::info!("Shutting down telemetry");

    // Logs last so the lines above still reach the collector.
    let results = [
        ("tracer", providers.tracer.shutdown()),
        ("meter", providers.meter.shutdown()),
        ("logger", providers.logger.shutdown()),
    ];
    let failed: Vec<String> = results
        .into_iter()
        .filter_map(|(name, result)| result.err().map(|e| format!("{}: {}", name, e)))
        .collect();

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("telemetry shutdown failed ({})", failed.join(", "))
    }
}
