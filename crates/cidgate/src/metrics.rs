//! OpenTelemetry instruments for the gateway.
//!
//! Instruments come from the global meter, so they are no-ops until
//! `telemetry::init` installs an OTLP meter provider.

use cas::CacheStats;
use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Meter},
    KeyValue,
};

pub const METER_NAME: &str = "cidgate";

#[derive(Clone)]
pub struct GatewayMetrics {
    /// Successful uploads
    pub uploads: Counter<u64>,
    /// Bytes accepted by `/upload`
    pub upload_bytes: Counter<u64>,
    /// Successful retrievals, labelled `cache = hit | miss`
    pub retrievals: Counter<u64>,
    /// Failed backend calls, labelled by operation
    pub backend_errors: Counter<u64>,
    /// Entries currently cached
    pub cache_entries: Gauge<u64>,
    /// Entries dropped by eviction since start
    pub cache_evictions: Gauge<u64>,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::with_meter(&global::meter(METER_NAME))
    }

    pub fn with_meter(meter: &Meter) -> Self {
        Self {
            uploads: meter
                .u64_counter("gateway.uploads")
                .with_description("Successful uploads")
                .build(),
            upload_bytes: meter
                .u64_counter("gateway.upload.bytes")
                .with_unit("By")
                .with_description("Bytes accepted by upload")
                .build(),
            retrievals: meter
                .u64_counter("gateway.retrievals")
                .with_description("Successful retrievals by cache outcome")
                .build(),
            backend_errors: meter
                .u64_counter("gateway.backend.errors")
                .with_description("Failed storage backend calls")
                .build(),
            cache_entries: meter
                .u64_gauge("cache.entries")
                .with_description("Entries currently cached")
                .build(),
            cache_evictions: meter
                .u64_gauge("cache.evictions")
                .with_description("Entries evicted since start")
                .build(),
        }
    }

    pub fn record_upload(&self, size: u64) {
        self.uploads.add(1, &[]);
        self.upload_bytes.add(size, &[]);
    }

    pub fn record_retrieval(&self, cache_hit: bool) {
        let outcome = if cache_hit { "hit" } else { "miss" };
        self.retrievals.add(1, &[KeyValue::new("cache", outcome)]);
    }

    pub fn record_backend_error(&self, operation: &'static str) {
        self.backend_errors
            .add(1, &[KeyValue::new("operation", operation)]);
    }

    pub fn record_cache(&self, stats: &CacheStats) {
        self.cache_entries.record(stats.entries as u64, &[]);
        self.cache_evictions.record(stats.evictions, &[]);
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::metrics::MeterProvider as _;
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};

    #[test]
    fn test_instruments_export_under_their_names() {
        let exporter = InMemoryMetricExporter::default();
        let provider = SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(exporter.clone()).build())
            .build();
        let metrics = GatewayMetrics::with_meter(&provider.meter(METER_NAME));

        metrics.record_upload(42);
        metrics.record_retrieval(true);
        metrics.record_retrieval(false);
        metrics.record_backend_error("fetch");
        metrics.record_cache(&CacheStats {
            entries: 3,
            hits: 1,
            misses: 1,
            evictions: 7,
        });

        provider.force_flush().unwrap();
        let exported = exporter.get_finished_metrics().unwrap();
        let names: Vec<String> = exported
            .iter()
            .flat_map(|rm| rm.scope_metrics.iter())
            .flat_map(|sm| sm.metrics.iter())
            .map(|m| m.name.to_string())
            .collect();

        for expected in [
            "gateway.uploads",
            "gateway.upload.bytes",
            "gateway.retrievals",
            "gateway.backend.errors",
            "cache.entries",
            "cache.evictions",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_noop_without_provider() {
        // The global meter is a no-op until telemetry installs one.
        let metrics = GatewayMetrics::new();
        metrics.record_upload(1);
        metrics.record_retrieval(false);
    }
}
