//! OTLP exporter builder and configurations.
//!
//! The exporters in this crate send OTLP over HTTP with protobuf payloads.
//! Every setting can be given programmatically, through environment
//! variables, or left to its default, in that order of precedence.

use crate::exporter::http::HttpExporterBuilder;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Target to which the exporter is going to send signals, defaults to http://localhost:4318.
/// Learn about the relationship between this constant and metrics/logs at
/// <https://github.com/open-telemetry/opentelemetry-specification/blob/main/specification/protocol/exporter.md#endpoint-urls-for-otlphttp>
pub const OTEL_EXPORTER_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
/// Default target to which the exporter is going to send signals.
pub const OTEL_EXPORTER_OTLP_ENDPOINT_DEFAULT: &str = "http://localhost:4318";
/// Key-value pairs to be used as headers associated with HTTP requests.
/// Example: `k1=v1,k2=v2`
pub const OTEL_EXPORTER_OTLP_HEADERS: &str = "OTEL_EXPORTER_OTLP_HEADERS";
/// Compression algorithm to use, `gzip` or `none`.
pub const OTEL_EXPORTER_OTLP_COMPRESSION: &str = "OTEL_EXPORTER_OTLP_COMPRESSION";
/// Max waiting time for the backend to process each signal batch, in seconds.
/// Fractional values such as `2.5` are accepted.
pub const OTEL_EXPORTER_OTLP_TIMEOUT: &str = "OTEL_EXPORTER_OTLP_TIMEOUT";
/// Default max waiting time for the backend to process each signal batch.
pub const OTEL_EXPORTER_OTLP_TIMEOUT_DEFAULT: Duration = Duration::from_secs(10);
/// Path to a PEM file with the certificate authority used to verify the collector.
pub const OTEL_EXPORTER_OTLP_CERTIFICATE: &str = "OTEL_EXPORTER_OTLP_CERTIFICATE";
/// When `true`, the collector's certificate is not verified.
pub const OTEL_EXPORTER_OTLP_SSL_VERIFY_NONE: &str = "OTEL_EXPORTER_OTLP_SSL_VERIFY_NONE";
/// When `true`, the collector's certificate is verified. Takes precedence over
/// [`OTEL_EXPORTER_OTLP_SSL_VERIFY_NONE`].
pub const OTEL_EXPORTER_OTLP_SSL_VERIFY_PEER: &str = "OTEL_EXPORTER_OTLP_SSL_VERIFY_PEER";

pub(crate) mod http;

/// Configuration for the OTLP exporter.
#[derive(Debug, Default, Clone)]
pub struct ExportConfig {
    /// The address of the OTLP collector.
    /// Default address will be used if not set.
    ///
    /// Note: Programmatically setting this will override any value set via the environment variable.
    pub endpoint: Option<String>,

    /// The timeout to the collector.
    /// The default value is 10 seconds.
    ///
    /// Note: Programmatically setting this will override any value set via the environment variable.
    pub timeout: Option<Duration>,
}

#[derive(Error, Debug)]
/// Errors that can occur while building an exporter.
#[non_exhaustive]
pub enum ExporterBuildError {
    /// Spawning a new thread failed.
    #[error("Spawning a new thread failed. Unable to create Reqwest-Blocking client.")]
    ThreadSpawnFailed,

    /// Feature required to use the specified compression algorithm.
    #[error("feature '{0}' is required to use the compression algorithm '{1}'")]
    FeatureRequiredForCompressionAlgorithm(&'static str, Compression),

    /// Feature required to use the specified configuration.
    #[error("feature '{0}' is required to use '{1}'")]
    FeatureRequired(&'static str, &'static str),

    /// No Http client specified.
    #[error("no http client specified")]
    NoHttpClient,

    /// Unsupported compression algorithm.
    #[error("unsupported compression algorithm '{0}'")]
    UnsupportedCompressionAlgorithm(String),

    /// Invalid URI.
    #[error("invalid URI {0}. Reason {1}")]
    InvalidUri(String, String),

    /// Invalid configuration.
    #[error("{name}: {reason}")]
    InvalidConfig {
        /// The configuration name.
        name: String,
        /// The reason the configuration is invalid.
        reason: String,
    },

    /// Failed due to an internal error.
    /// The error message is intended for logging purposes only and should not
    /// be used to make programmatic decisions.
    #[error("Reason: {0}")]
    InternalFailure(String),
}

/// The compression algorithm to use when sending data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Compression {
    /// Compresses data using gzip.
    Gzip,
}

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::Gzip => write!(f, "gzip"),
        }
    }
}

impl FromStr for Compression {
    type Err = ExporterBuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gzip" => Ok(Compression::Gzip),
            _ => Err(ExporterBuildError::UnsupportedCompressionAlgorithm(
                s.to_string(),
            )),
        }
    }
}

/// Parse a compression setting where `none` turns compression off.
fn parse_compression(value: &str) -> Result<Option<Compression>, ExporterBuildError> {
    if value.trim() == "none" {
        Ok(None)
    } else {
        value.parse().map(Some)
    }
}

/// Compression used when nothing is configured: gzip when it is compiled in.
fn default_compression() -> Option<Compression> {
    if cfg!(feature = "gzip-http") {
        Some(Compression::Gzip)
    } else {
        None
    }
}

/// Resolve compression with priority:
/// 1. Provided config value
/// 2. Signal-specific environment variable
/// 3. Generic OTEL_EXPORTER_OTLP_COMPRESSION
/// 4. gzip if the `gzip-http` feature is on, none otherwise
fn resolve_compression(
    config_compression: Option<Option<Compression>>,
    signal_env_var: &str,
) -> Result<Option<Compression>, ExporterBuildError> {
    let compression = if let Some(compression) = config_compression {
        compression
    } else if let Ok(compression) = std::env::var(signal_env_var) {
        parse_compression(&compression)?
    } else if let Ok(compression) = std::env::var(OTEL_EXPORTER_OTLP_COMPRESSION) {
        parse_compression(&compression)?
    } else {
        default_compression()
    };

    #[cfg(not(feature = "gzip-http"))]
    if compression == Some(Compression::Gzip) {
        return Err(ExporterBuildError::FeatureRequiredForCompressionAlgorithm(
            "gzip-http",
            Compression::Gzip,
        ));
    }

    Ok(compression)
}

/// Product token identifying this exporter.
pub(crate) fn user_agent() -> &'static str {
    concat!("OTel-OTLP-Exporter-Rust/", env!("CARGO_PKG_VERSION"))
}

/// Provide access to the [ExportConfig] field within the exporter builders.
pub trait HasExportConfig {
    /// Return a mutable reference to the [ExportConfig] within the exporter builders.
    fn export_config(&mut self) -> &mut ExportConfig;
}

/// Provide [ExportConfig] access to the [HttpExporterBuilder].
impl HasExportConfig for HttpExporterBuilder {
    fn export_config(&mut self) -> &mut ExportConfig {
        &mut self.exporter_config
    }
}

/// Expose methods to override [ExportConfig].
///
/// This trait will be implemented for every struct that implemented [`HasExportConfig`] trait.
///
/// ## Examples
/// ```
/// # #[cfg(feature = "logs")]
/// # {
/// use opentelemetry_otlp::WithExportConfig;
/// let exporter_builder = opentelemetry_otlp::LogExporter::builder()
///     .with_http()
///     .with_endpoint("http://localhost:7201");
/// # }
/// ```
pub trait WithExportConfig {
    /// Set the address of the OTLP collector. If not set or set to empty string, the default address is used.
    ///
    /// Note: Programmatically setting this will override any value set via the environment variable.
    fn with_endpoint<T: Into<String>>(self, endpoint: T) -> Self;
    /// Set the timeout to the collector.
    ///
    /// Note: Programmatically setting this will override any value set via the environment variable.
    fn with_timeout(self, timeout: Duration) -> Self;
    /// Set export config. This will override all previous configurations.
    ///
    /// Note: Programmatically setting this will override any value set via environment variables.
    fn with_export_config(self, export_config: ExportConfig) -> Self;
}

impl<B: HasExportConfig> WithExportConfig for B {
    fn with_endpoint<T: Into<String>>(mut self, endpoint: T) -> Self {
        self.export_config().endpoint = Some(endpoint.into());
        self
    }

    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.export_config().timeout = Some(timeout);
        self
    }

    fn with_export_config(mut self, exporter_config: ExportConfig) -> Self {
        self.export_config().endpoint = exporter_config.endpoint;
        self.export_config().timeout = exporter_config.timeout;
        self
    }
}

/// Seconds, possibly fractional, as a duration. Negative, infinite and
/// unparsable values are rejected.
fn parse_timeout_secs(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

fn resolve_timeout(
    signal_timeout_var: &str,
    provided_timeout: Option<&Duration>,
) -> Result<Duration, ExporterBuildError> {
    // programmatic configuration overrides any value set via environment variables
    if let Some(timeout) = provided_timeout {
        return Ok(*timeout);
    }

    // the signal variable replaces the generic one, it is not merged with it
    for var in [signal_timeout_var, OTEL_EXPORTER_OTLP_TIMEOUT] {
        if let Ok(value) = std::env::var(var) {
            return parse_timeout_secs(&value).ok_or_else(|| ExporterBuildError::InvalidConfig {
                name: var.to_string(),
                reason: format!("'{value}' is not a number of seconds"),
            });
        }
    }

    Ok(OTEL_EXPORTER_OTLP_TIMEOUT_DEFAULT)
}

/// Parse `k1=v1,k2=v2`. Keys and values are trimmed and percent-decoded;
/// an entry without a key or a value, or one that is not valid UTF-8 once
/// decoded, rejects the whole string.
fn parse_header_string(value: &str) -> Result<Vec<(String, String)>, ExporterBuildError> {
    value
        .split(',')
        .map(|entry| {
            parse_header_key_value_string(entry).ok_or_else(|| ExporterBuildError::InvalidConfig {
                name: "headers".to_string(),
                reason: format!("invalid header entry '{entry}' in '{value}'"),
            })
        })
        .collect()
}

fn url_decode(value: &str) -> Option<String> {
    percent_encoding::percent_decode_str(value)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

fn parse_header_key_value_string(key_value_string: &str) -> Option<(String, String)> {
    let (key, value) = key_value_string.split_once('=')?;
    let key = url_decode(key.trim())?;
    let value = url_decode(value.trim())?;
    (!key.is_empty() && !value.is_empty()).then_some((key, value))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;

    pub(crate) fn run_env_test<T, F>(env_vars: T, f: F)
    where
        F: FnOnce(),
        T: Into<Vec<(&'static str, &'static str)>>,
    {
        let mut vars: Vec<(&'static str, Option<&'static str>)> = ALL_VARS
            .iter()
            .map(|&k| (k, None))
            .collect();
        for (k, v) in env_vars.into() {
            match vars.iter_mut().find(|(name, _)| *name == k) {
                Some(entry) => entry.1 = Some(v),
                None => vars.push((k, Some(v))),
            }
        }
        temp_env::with_vars(vars, f)
    }

    const LOGS_COMPRESSION: &str = "OTEL_EXPORTER_OTLP_LOGS_COMPRESSION";
    const LOGS_TIMEOUT: &str = "OTEL_EXPORTER_OTLP_LOGS_TIMEOUT";

    // Cleared for every test so the host environment cannot leak in.
    const ALL_VARS: &[&str] = &[
        OTEL_EXPORTER_OTLP_ENDPOINT,
        OTEL_EXPORTER_OTLP_HEADERS,
        OTEL_EXPORTER_OTLP_COMPRESSION,
        OTEL_EXPORTER_OTLP_TIMEOUT,
        OTEL_EXPORTER_OTLP_CERTIFICATE,
        OTEL_EXPORTER_OTLP_SSL_VERIFY_NONE,
        OTEL_EXPORTER_OTLP_SSL_VERIFY_PEER,
        "OTEL_EXPORTER_OTLP_LOGS_ENDPOINT",
        "OTEL_EXPORTER_OTLP_LOGS_HEADERS",
        "OTEL_EXPORTER_OTLP_LOGS_COMPRESSION",
        "OTEL_EXPORTER_OTLP_LOGS_TIMEOUT",
        "OTEL_EXPORTER_OTLP_LOGS_CERTIFICATE",
        "OTEL_EXPORTER_OTLP_METRICS_ENDPOINT",
        "OTEL_EXPORTER_OTLP_METRICS_HEADERS",
        "OTEL_EXPORTER_OTLP_METRICS_COMPRESSION",
        "OTEL_EXPORTER_OTLP_METRICS_TIMEOUT",
        "OTEL_EXPORTER_OTLP_METRICS_CERTIFICATE",
    ];

    #[test]
    fn test_default_http_endpoint() {
        let exporter_builder = crate::HttpExporterBuilder::default();

        assert_eq!(exporter_builder.exporter_config.endpoint, None);
    }

    #[cfg(feature = "logs")]
    #[test]
    fn export_builder_error_invalid_http_endpoint() {
        use crate::{LogExporter, WithExportConfig};

        run_env_test(vec![], || {
            let ex_config = ExportConfig {
                endpoint: Some("invalid_uri/something".to_string()),
                timeout: Some(Duration::from_secs(10)),
            };

            let exporter_result = LogExporter::builder()
                .with_http()
                .with_export_config(ex_config)
                .build();

            assert!(
                matches!(exporter_result, Err(ExporterBuildError::InvalidUri(_, _))),
                "Expected InvalidUri error, but got {exporter_result:?}"
            );
        });
    }

    #[test]
    fn test_url_decode() {
        let test_cases = vec![
            // Format: (encoded, expected_decoded)
            ("v%201", Some("v 1")),
            ("v 1", Some("v 1")),
            ("%C3%B6%C3%A0%C2%A7%C3%96abcd%C3%84", Some("öà§ÖabcdÄ")),
            ("v%FF1", None),
        ];

        for (encoded, expected_decoded) in test_cases {
            assert_eq!(url_decode(encoded), expected_decoded.map(|v| v.to_string()))
        }
    }

    #[rstest]
    #[case("k1=v1", vec![("k1", "v1")])]
    #[case("k1=v1,k2=v2", vec![("k1", "v1"), ("k2", "v2")])]
    #[case("a=b, c=d==, e=f", vec![("a", "b"), ("c", "d=="), ("e", "f")])]
    #[case(" a = b ,c=d", vec![("a", "b"), ("c", "d")])]
    #[case("token=%C3%BCber", vec![("token", "über")])]
    #[case("%C3%BCber=token", vec![("über", "token")])]
    fn test_parse_header_string(#[case] input: &str, #[case] expected: Vec<(&str, &str)>) {
        assert_eq!(
            parse_header_string(input).unwrap(),
            expected
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    #[rstest]
    #[case("a = ")]
    #[case(",")]
    #[case("c=hi%F3")]
    #[case("this is not a header")]
    #[case("k1=v1,,k2=v2")]
    fn test_malformed_header_string_is_rejected(#[case] input: &str) {
        assert!(matches!(
            parse_header_string(input),
            Err(ExporterBuildError::InvalidConfig { name, .. }) if name == "headers"
        ));
    }

    #[rstest]
    #[case("k1=v1", Some(("k1", "v1")))]
    #[case("Authentication=Basic AAA", Some(("Authentication", "Basic AAA")))]
    #[case("Authentication=Basic%20AAA", Some(("Authentication", "Basic AAA")))]
    #[case("k1=%XX", Some(("k1", "%XX")))]
    #[case("", None)]
    #[case("=v1", None)]
    #[case("k1=", None)]
    fn test_parse_header_key_value_string(
        #[case] input: &str,
        #[case] expected: Option<(&str, &str)>,
    ) {
        assert_eq!(
            parse_header_key_value_string(input),
            expected.map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    #[rstest]
    #[case("gzip", Ok(Some(Compression::Gzip)))]
    #[case("none", Ok(None))]
    #[case("zstd", Err("zstd"))]
    #[case("", Err(""))]
    fn test_parse_compression(
        #[case] input: &str,
        #[case] expected: Result<Option<Compression>, &str>,
    ) {
        match (parse_compression(input), expected) {
            (Ok(actual), Ok(expected)) => assert_eq!(actual, expected),
            (Err(ExporterBuildError::UnsupportedCompressionAlgorithm(actual)), Err(expected)) => {
                assert_eq!(actual, expected)
            }
            (actual, expected) => panic!("got {actual:?}, expected {expected:?}"),
        }
    }

    #[test]
    fn test_signal_compression_env_replaces_generic() {
        run_env_test(
            vec![
                (LOGS_COMPRESSION, "none"),
                (OTEL_EXPORTER_OTLP_COMPRESSION, "gzip"),
            ],
            || {
                let compression =
                    resolve_compression(None, LOGS_COMPRESSION).unwrap();
                assert_eq!(compression, None);
            },
        );
    }

    #[test]
    fn test_invalid_compression_env_is_an_error() {
        run_env_test(vec![(OTEL_EXPORTER_OTLP_COMPRESSION, "brotli")], || {
            let result = resolve_compression(None, LOGS_COMPRESSION);
            assert!(matches!(
                result,
                Err(ExporterBuildError::UnsupportedCompressionAlgorithm(value)) if value == "brotli"
            ));
        });
    }

    #[cfg(feature = "gzip-http")]
    #[test]
    fn test_gzip_is_the_default_compression() {
        run_env_test(vec![], || {
            assert_eq!(
                resolve_compression(None, LOGS_COMPRESSION).unwrap(),
                Some(Compression::Gzip)
            );
        });
    }

    #[test]
    fn test_priority_of_signal_env_over_generic_env_for_timeout() {
        run_env_test(
            vec![
                (LOGS_TIMEOUT, "3"),
                (OTEL_EXPORTER_OTLP_TIMEOUT, "2"),
            ],
            || {
                let timeout = resolve_timeout(LOGS_TIMEOUT, None).unwrap();
                assert_eq!(timeout.as_millis(), 3000);
            },
        );
    }

    #[test]
    fn test_fractional_timeout_seconds() {
        run_env_test(vec![(OTEL_EXPORTER_OTLP_TIMEOUT, "2.5")], || {
            let timeout = resolve_timeout(LOGS_TIMEOUT, None).unwrap();
            assert_eq!(timeout, Duration::from_millis(2500));
        });
    }

    #[rstest]
    #[case("abc")]
    #[case("-1")]
    fn test_invalid_timeout_env_is_an_error(#[case] value: &'static str) {
        run_env_test(vec![(OTEL_EXPORTER_OTLP_TIMEOUT, value)], || {
            let result = resolve_timeout(LOGS_TIMEOUT, None);
            assert!(matches!(result, Err(ExporterBuildError::InvalidConfig { .. })));
        });
    }

    #[test]
    fn test_priority_of_code_based_config_over_envs_for_timeout() {
        run_env_test(
            vec![
                (LOGS_TIMEOUT, "3"),
                (OTEL_EXPORTER_OTLP_TIMEOUT, "2"),
            ],
            || {
                let timeout = resolve_timeout(
                    LOGS_TIMEOUT,
                    Some(&Duration::from_millis(1000)),
                )
                .unwrap();
                assert_eq!(timeout.as_millis(), 1000);
            },
        );
    }

    #[test]
    fn test_use_default_when_others_missing_for_timeout() {
        run_env_test(vec![], || {
            let timeout = resolve_timeout(LOGS_TIMEOUT, None).unwrap();
            assert_eq!(timeout.as_millis(), 10_000);
        });
    }
}
