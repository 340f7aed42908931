//! OTLP - Log Exporter
//!
//! Defines a [LogExporter] to send logs via the OpenTelemetry Protocol (OTLP)

use crate::exporter::http::{HttpExporterBuilder, OtlpHttpClient, SignalConfig};
use crate::{
    ExporterBuildError, HasExportConfig, HasHttpConfig, HttpExporterBuilderSet,
    NoExporterBuilderSet,
};
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::logs::LogBatch;
use std::fmt::Debug;
use std::time::Duration;

/// Compression algorithm to use, defaults to `gzip` when the `gzip-http`
/// feature is on.
pub const OTEL_EXPORTER_OTLP_LOGS_COMPRESSION: &str = "OTEL_EXPORTER_OTLP_LOGS_COMPRESSION";

/// Target to which the exporter is going to send logs. Used as is.
pub const OTEL_EXPORTER_OTLP_LOGS_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_LOGS_ENDPOINT";

/// Maximum time the OTLP exporter will wait for each batch logs export.
pub const OTEL_EXPORTER_OTLP_LOGS_TIMEOUT: &str = "OTEL_EXPORTER_OTLP_LOGS_TIMEOUT";

/// Key-value pairs to be used as headers associated with HTTP requests
/// for sending logs.
/// Example: `k1=v1,k2=v2`
pub const OTEL_EXPORTER_OTLP_LOGS_HEADERS: &str = "OTEL_EXPORTER_OTLP_LOGS_HEADERS";

/// Certificate authority used to verify the logs collector.
pub const OTEL_EXPORTER_OTLP_LOGS_CERTIFICATE: &str = "OTEL_EXPORTER_OTLP_LOGS_CERTIFICATE";

const LOGS_SIGNAL: SignalConfig = SignalConfig {
    endpoint_var: OTEL_EXPORTER_OTLP_LOGS_ENDPOINT,
    path: "/v1/logs",
    timeout_var: OTEL_EXPORTER_OTLP_LOGS_TIMEOUT,
    headers_var: OTEL_EXPORTER_OTLP_LOGS_HEADERS,
    compression_var: OTEL_EXPORTER_OTLP_LOGS_COMPRESSION,
    certificate_var: OTEL_EXPORTER_OTLP_LOGS_CERTIFICATE,
};

/// Builder for [`LogExporter`]; pick a transport with
/// [`with_http`](LogExporterBuilder::with_http).
#[derive(Debug, Default, Clone)]
pub struct LogExporterBuilder<C> {
    client: C,
}

impl LogExporterBuilder<NoExporterBuilderSet> {
    /// A builder with no transport selected.
    pub fn new() -> Self {
        LogExporterBuilder::default()
    }

    /// Send logs over HTTP with protobuf payloads.
    pub fn with_http(self) -> LogExporterBuilder<HttpExporterBuilderSet> {
        LogExporterBuilder {
            client: HttpExporterBuilderSet(HttpExporterBuilder::default()),
        }
    }
}

impl LogExporterBuilder<HttpExporterBuilderSet> {
    /// Resolve the configuration and build the exporter.
    ///
    /// Invalid endpoints, headers, timeouts or compression settings, whether
    /// programmatic or from the environment, are reported here.
    pub fn build(self) -> Result<LogExporter, ExporterBuildError> {
        let mut builder = self.client.0;
        let client = builder.build_client(LOGS_SIGNAL)?;
        Ok(LogExporter { client })
    }
}

impl HasExportConfig for LogExporterBuilder<HttpExporterBuilderSet> {
    fn export_config(&mut self) -> &mut crate::ExportConfig {
        &mut self.client.0.exporter_config
    }
}

impl HasHttpConfig for LogExporterBuilder<HttpExporterBuilderSet> {
    fn http_client_config(&mut self) -> &mut crate::HttpConfig {
        &mut self.client.0.http_config
    }
}

/// OTLP exporter that sends log data over HTTP with protobuf payloads.
///
/// Retries transient failures within the export timeout. After
/// [`shutdown`](opentelemetry_sdk::logs::LogExporter::shutdown) every export
/// fails without contacting the collector.
#[derive(Debug)]
pub struct LogExporter {
    client: OtlpHttpClient,
}

impl LogExporter {
    /// Obtain a builder to configure a [LogExporter].
    pub fn builder() -> LogExporterBuilder<NoExporterBuilderSet> {
        LogExporterBuilder::default()
    }
}

impl opentelemetry_sdk::logs::LogExporter for LogExporter {
    fn export(&self, batch: LogBatch<'_>, timeout: Option<Duration>) -> OTelSdkResult {
        self.client.export_logs(batch, timeout)
    }

    fn force_flush(&self, _timeout: Option<Duration>) -> OTelSdkResult {
        self.client.force_flush()
    }

    fn shutdown(&self, _timeout: Option<Duration>) -> OTelSdkResult {
        self.client.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::tests::run_env_test;
    use crate::{WithExportConfig, WithHttpConfig};

    #[test]
    fn builds_with_defaults() {
        run_env_test(vec![], || {
            assert!(LogExporter::builder().with_http().build().is_ok());
        });
    }

    #[test]
    fn invalid_env_settings_fail_the_build() {
        for (var, value) in [
            (OTEL_EXPORTER_OTLP_LOGS_TIMEOUT, "soon"),
            (OTEL_EXPORTER_OTLP_LOGS_HEADERS, "this is not a header"),
            (OTEL_EXPORTER_OTLP_LOGS_COMPRESSION, "flate"),
            (OTEL_EXPORTER_OTLP_LOGS_ENDPOINT, "not a url"),
        ] {
            run_env_test(vec![(var, value)], || {
                let result = LogExporter::builder().with_http().build();
                assert!(result.is_err(), "{var}={value} should be rejected");
            });
        }
    }

    #[test]
    fn programmatic_settings_win_over_env() {
        run_env_test(
            vec![
                (OTEL_EXPORTER_OTLP_LOGS_TIMEOUT, "soon"),
                (OTEL_EXPORTER_OTLP_LOGS_ENDPOINT, "not a url"),
            ],
            || {
                let result = LogExporter::builder()
                    .with_http()
                    .with_endpoint("http://collector:4318/v1/logs")
                    .with_timeout(Duration::from_secs(3))
                    .without_compression()
                    .build();
                assert!(result.is_ok(), "{result:?}");
            },
        );
    }
}
