//! The OTLP Exporter supports exporting logs and metrics in the OTLP
//! format to the OpenTelemetry collector or other compatible backend.
//!
//! The OpenTelemetry Collector offers a vendor-agnostic implementation on how
//! to receive, process, and export telemetry data. In addition, it removes
//! the need to run, operate, and maintain multiple agents/collectors in
//! order to support open-source telemetry data formats (e.g. Jaeger,
//! Prometheus, etc.) sending to multiple open-source or commercial back-ends.
//!
//! This crate sends OTLP over HTTP with binary protobuf payloads
//! (`application/x-protobuf`), gzip-compressed by default.
//!
//! ## Quickstart
//!
//! ```no_run
//! # #[cfg(all(feature = "logs", feature = "metrics"))]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use opentelemetry_otlp::WithExportConfig;
//! use opentelemetry_sdk::logs::{BatchLogProcessor, SdkLoggerProvider};
//! use opentelemetry_sdk::metrics::SdkMeterProvider;
//!
//! let log_exporter = opentelemetry_otlp::LogExporter::builder()
//!     .with_http()
//!     .with_endpoint("http://localhost:4318/v1/logs")
//!     .build()?;
//! let logger_provider = SdkLoggerProvider::builder()
//!     .with_log_processor(BatchLogProcessor::builder(log_exporter).build())
//!     .build();
//!
//! let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
//!     .with_http()
//!     .build()?;
//! let meter_provider = SdkMeterProvider::builder()
//!     .with_exporter(metric_exporter)
//!     .build();
//!
//! let requests = meter_provider.meter("my-app").u64_counter("requests").build();
//! requests.add(1, &[]);
//!
//! meter_provider.shutdown(None)?;
//! logger_provider.shutdown(None)?;
//! # Ok(())
//! # }
//! # #[cfg(not(all(feature = "logs", feature = "metrics")))]
//! # fn main() {}
//! ```
//!
//! ## Configuration
//!
//! Every setting can be given in code, through `OTEL_EXPORTER_OTLP_*`
//! environment variables, or left to its default, in that order. Signal
//! specific variables such as [`OTEL_EXPORTER_OTLP_LOGS_ENDPOINT`] replace the
//! generic ones. Invalid values are reported by `build()`.
//!
//! Failed exports are retried with exponential backoff when the failure is
//! transient (timeouts, refused connections, HTTP 429, 502, 503 and 504),
//! within the export timeout. See [`RetryPolicy`].
//!
//! ## Crate Feature Flags
//!
//! * `logs`: Includes the logs exporter.
//! * `metrics`: Includes the metrics exporter.
//! * `internal-logs`: Emits the exporter's own diagnostics through `tracing`.
//! * `reqwest-blocking-client`: Use reqwest blocking http client as the default client.
//! * `gzip-http`: Gzip compression for request bodies.
//! * `tls`: Certificate settings for the default client, using rustls.
//! * `tls-roots`: Adds system trust roots to rustls-based HTTP clients.
//! * `tls-webpki-roots`: Embeds Mozilla's trust roots to rustls-based HTTP clients.
//!
//! The following feature flags are enabled by default: `reqwest-blocking-client`,
//! `gzip-http`, `logs`, `metrics`, `internal-logs`.
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![allow(elided_lifetimes_in_paths)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod exporter;
#[cfg(feature = "logs")]
mod logs;
#[cfg(feature = "metrics")]
mod metric;
mod retry;
mod retry_classification;

pub use crate::exporter::http::{HasHttpConfig, HttpConfig, HttpExporterBuilder, WithHttpConfig};
pub use crate::exporter::{
    Compression, ExportConfig, ExporterBuildError, HasExportConfig, WithExportConfig,
    OTEL_EXPORTER_OTLP_CERTIFICATE, OTEL_EXPORTER_OTLP_COMPRESSION, OTEL_EXPORTER_OTLP_ENDPOINT,
    OTEL_EXPORTER_OTLP_ENDPOINT_DEFAULT, OTEL_EXPORTER_OTLP_HEADERS,
    OTEL_EXPORTER_OTLP_SSL_VERIFY_NONE, OTEL_EXPORTER_OTLP_SSL_VERIFY_PEER,
    OTEL_EXPORTER_OTLP_TIMEOUT, OTEL_EXPORTER_OTLP_TIMEOUT_DEFAULT,
};
pub use crate::retry::RetryPolicy;

#[cfg(feature = "logs")]
pub use crate::logs::{
    LogExporter, LogExporterBuilder, OTEL_EXPORTER_OTLP_LOGS_CERTIFICATE,
    OTEL_EXPORTER_OTLP_LOGS_COMPRESSION, OTEL_EXPORTER_OTLP_LOGS_ENDPOINT,
    OTEL_EXPORTER_OTLP_LOGS_HEADERS, OTEL_EXPORTER_OTLP_LOGS_TIMEOUT,
};

#[cfg(feature = "metrics")]
pub use crate::metric::{
    MetricExporter, MetricExporterBuilder, OTEL_EXPORTER_OTLP_METRICS_CERTIFICATE,
    OTEL_EXPORTER_OTLP_METRICS_COMPRESSION, OTEL_EXPORTER_OTLP_METRICS_ENDPOINT,
    OTEL_EXPORTER_OTLP_METRICS_HEADERS, OTEL_EXPORTER_OTLP_METRICS_TIMEOUT,
};

/// Type to indicate the builder does not have a transport set yet.
#[derive(Debug, Default, Clone)]
pub struct NoExporterBuilderSet;

/// Type to hold the [HttpExporterBuilder] and indicate it has been set.
///
/// Allowing access to [HttpExporterBuilder] specific configuration methods.
#[derive(Debug, Default, Clone)]
pub struct HttpExporterBuilderSet(HttpExporterBuilder);
