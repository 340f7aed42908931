//! OTEL metric exporter
//!
//! Defines a [MetricExporter] to send metric data to backend via OTEL protocol.

use crate::exporter::http::{HttpExporterBuilder, OtlpHttpClient, SignalConfig};
use crate::{
    ExporterBuildError, HasExportConfig, HasHttpConfig, HttpExporterBuilderSet,
    NoExporterBuilderSet,
};
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::metrics::data::ResourceMetrics;
use opentelemetry_sdk::metrics::Temporality;
use std::fmt::Debug;
use std::time::Duration;

/// Target to which the exporter is going to send metrics, used as is.
/// Learn about the relationship between this constant and default/logs at
/// <https://github.com/open-telemetry/opentelemetry-specification/blob/main/specification/protocol/exporter.md#endpoint-urls-for-otlphttp>
pub const OTEL_EXPORTER_OTLP_METRICS_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_METRICS_ENDPOINT";
/// Max waiting time for the backend to process each metrics batch, defaults to 10s.
pub const OTEL_EXPORTER_OTLP_METRICS_TIMEOUT: &str = "OTEL_EXPORTER_OTLP_METRICS_TIMEOUT";
/// Compression algorithm to use, `gzip` or `none`.
pub const OTEL_EXPORTER_OTLP_METRICS_COMPRESSION: &str = "OTEL_EXPORTER_OTLP_METRICS_COMPRESSION";
/// Key-value pairs to be used as headers associated with HTTP requests for sending metrics.
/// Example: `k1=v1,k2=v2`
pub const OTEL_EXPORTER_OTLP_METRICS_HEADERS: &str = "OTEL_EXPORTER_OTLP_METRICS_HEADERS";
/// Certificate authority used to verify the metrics collector.
pub const OTEL_EXPORTER_OTLP_METRICS_CERTIFICATE: &str = "OTEL_EXPORTER_OTLP_METRICS_CERTIFICATE";

const METRICS_SIGNAL: SignalConfig = SignalConfig {
    endpoint_var: OTEL_EXPORTER_OTLP_METRICS_ENDPOINT,
    path: "/v1/metrics",
    timeout_var: OTEL_EXPORTER_OTLP_METRICS_TIMEOUT,
    headers_var: OTEL_EXPORTER_OTLP_METRICS_HEADERS,
    compression_var: OTEL_EXPORTER_OTLP_METRICS_COMPRESSION,
    certificate_var: OTEL_EXPORTER_OTLP_METRICS_CERTIFICATE,
};

/// A builder for creating a new [MetricExporter].
#[derive(Debug, Default, Clone)]
pub struct MetricExporterBuilder<C> {
    client: C,
    temporality: Temporality,
}

impl MetricExporterBuilder<NoExporterBuilderSet> {
    /// Create a new [MetricExporterBuilder] with default settings.
    pub fn new() -> Self {
        MetricExporterBuilder::default()
    }

    /// With the HTTP transport.
    pub fn with_http(self) -> MetricExporterBuilder<HttpExporterBuilderSet> {
        MetricExporterBuilder {
            client: HttpExporterBuilderSet(HttpExporterBuilder::default()),
            temporality: self.temporality,
        }
    }
}

impl<C> MetricExporterBuilder<C> {
    /// Set the temporality for the metrics.
    pub fn with_temporality(self, temporality: Temporality) -> MetricExporterBuilder<C> {
        MetricExporterBuilder {
            client: self.client,
            temporality,
        }
    }
}

impl MetricExporterBuilder<HttpExporterBuilderSet> {
    /// Build the [MetricExporter] with the HTTP transport.
    pub fn build(self) -> Result<MetricExporter, ExporterBuildError> {
        let mut builder = self.client.0;
        let client = builder.build_client(METRICS_SIGNAL)?;
        Ok(MetricExporter {
            client,
            temporality: self.temporality,
        })
    }
}

impl HasExportConfig for MetricExporterBuilder<HttpExporterBuilderSet> {
    fn export_config(&mut self) -> &mut crate::ExportConfig {
        &mut self.client.0.exporter_config
    }
}

impl HasHttpConfig for MetricExporterBuilder<HttpExporterBuilderSet> {
    fn http_client_config(&mut self) -> &mut crate::HttpConfig {
        &mut self.client.0.http_config
    }
}

/// Export metrics in OTEL format.
#[derive(Debug)]
pub struct MetricExporter {
    client: OtlpHttpClient,
    temporality: Temporality,
}

impl MetricExporter {
    /// Obtain a builder to configure a [MetricExporter].
    pub fn builder() -> MetricExporterBuilder<NoExporterBuilderSet> {
        MetricExporterBuilder::default()
    }
}

impl opentelemetry_sdk::metrics::MetricExporter for MetricExporter {
    fn export(&self, metrics: &ResourceMetrics, timeout: Option<Duration>) -> OTelSdkResult {
        self.client.export_metrics(metrics, timeout)
    }

    fn force_flush(&self, _timeout: Option<Duration>) -> OTelSdkResult {
        self.client.force_flush()
    }

    fn shutdown(&self, _timeout: Option<Duration>) -> OTelSdkResult {
        self.client.shutdown()
    }

    fn temporality(&self) -> Temporality {
        self.temporality
    }
}
