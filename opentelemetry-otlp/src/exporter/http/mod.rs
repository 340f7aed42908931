use super::{
    parse_header_string, resolve_compression, resolve_timeout, url_decode, user_agent,
    Compression, ExportConfig, ExporterBuildError, OTEL_EXPORTER_OTLP_CERTIFICATE,
    OTEL_EXPORTER_OTLP_ENDPOINT, OTEL_EXPORTER_OTLP_ENDPOINT_DEFAULT, OTEL_EXPORTER_OTLP_HEADERS,
    OTEL_EXPORTER_OTLP_SSL_VERIFY_NONE, OTEL_EXPORTER_OTLP_SSL_VERIFY_PEER,
};
use crate::retry::{as_millis_u64, retry_with_backoff, RetryPolicy};
use crate::retry_classification::{classify_http_error, classify_transport_error, RetryErrorType};
use http::header::{CONTENT_ENCODING, CONTENT_TYPE, RETRY_AFTER, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use opentelemetry::{otel_debug, otel_error, otel_warn};
use opentelemetry_http::{Bytes, HttpClient, RequestTimeout, TransportError, TransportErrorKind};
use opentelemetry_proto::rpc::Status;
use opentelemetry_sdk::error::{OTelSdkError, OTelSdkResult};
use prost::Message;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

#[cfg(feature = "metrics")]
mod metrics;

#[cfg(feature = "logs")]
mod logs;

/// Configuration of the http transport
#[derive(Debug, Default, Clone)]
pub struct HttpConfig {
    /// Select the HTTP client
    client: Option<Arc<dyn HttpClient>>,

    /// Additional headers to send to the collector.
    headers: Option<HashMap<String, String>>,

    /// `Some(None)` turns compression off.
    compression: Option<Option<Compression>>,

    /// PEM file of the certificate authority trusted for the collector.
    certificate: Option<PathBuf>,

    /// Whether the collector's certificate is verified.
    verify_peer: Option<bool>,

    retry_policy: Option<RetryPolicy>,
}

/// Configuration for the OTLP HTTP exporter.
///
/// ## Examples
///
/// ```no_run
/// # #[cfg(feature = "logs")]
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
///
/// // Create a log exporter you can use when configuring logger providers
/// let log_exporter = opentelemetry_otlp::LogExporter::builder()
///     .with_http()
///     .with_endpoint("https://collector.example.com:4318/v1/logs")
///     .with_timeout(std::time::Duration::from_secs(5))
///     .build()?;
/// # Ok(())
/// # }
/// # #[cfg(not(feature = "logs"))]
/// # fn main() {}
/// ```
#[derive(Debug, Default, Clone)]
pub struct HttpExporterBuilder {
    pub(crate) exporter_config: ExportConfig,
    pub(crate) http_config: HttpConfig,
}

/// Environment variables and default path of one signal.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SignalConfig {
    pub(crate) endpoint_var: &'static str,
    pub(crate) path: &'static str,
    pub(crate) timeout_var: &'static str,
    pub(crate) headers_var: &'static str,
    pub(crate) compression_var: &'static str,
    pub(crate) certificate_var: &'static str,
}

impl HttpExporterBuilder {
    pub(crate) fn build_client(
        &mut self,
        signal: SignalConfig,
    ) -> Result<OtlpHttpClient, ExporterBuildError> {
        let endpoint = resolve_endpoint(
            signal.endpoint_var,
            signal.path,
            self.exporter_config.endpoint.as_deref(),
        )?;
        let timeout = resolve_timeout(signal.timeout_var, self.exporter_config.timeout.as_ref())?;
        let compression = resolve_compression(self.http_config.compression, signal.compression_var)?;
        let headers = resolve_headers(signal.headers_var, self.http_config.headers.take())?;
        let tls = resolve_tls(
            signal.certificate_var,
            self.http_config.certificate.take(),
            self.http_config.verify_peer,
        );

        let http_client = match self.http_config.client.take() {
            Some(client) => {
                if !tls.is_default() {
                    otel_warn!(
                        name: "OtlpHttpExporter.TlsConfigIgnored",
                        reason = "certificate settings only apply to the built-in client"
                    );
                }
                client
            }
            None => default_client(tls)?,
        };

        otel_debug!(
            name: "OtlpHttpExporter.Built",
            endpoint = endpoint.to_string(),
            timeout_ms = as_millis_u64(timeout),
            compression = compression.map_or("none".to_string(), |c| c.to_string())
        );

        Ok(OtlpHttpClient::new(
            http_client,
            endpoint,
            headers,
            compression,
            timeout,
            self.http_config.retry_policy.unwrap_or_default(),
        ))
    }
}

/// Certificate settings for the built-in client.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TlsConfig {
    certificate: Option<PathBuf>,
    verify_peer: bool,
}

impl TlsConfig {
    fn is_default(&self) -> bool {
        self.certificate.is_none() && self.verify_peer
    }
}

fn env_flag(var: &str) -> bool {
    env::var(var).is_ok_and(|value| value.trim().eq_ignore_ascii_case("true"))
}

fn resolve_tls(
    signal_certificate_var: &str,
    provided_certificate: Option<PathBuf>,
    provided_verify_peer: Option<bool>,
) -> TlsConfig {
    let certificate = provided_certificate.or_else(|| {
        env::var(signal_certificate_var)
            .or_else(|_| env::var(OTEL_EXPORTER_OTLP_CERTIFICATE))
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
    });
    // VERIFY_PEER wins over VERIFY_NONE when both are set
    let verify_peer = provided_verify_peer.unwrap_or_else(|| {
        env_flag(OTEL_EXPORTER_OTLP_SSL_VERIFY_PEER) || !env_flag(OTEL_EXPORTER_OTLP_SSL_VERIFY_NONE)
    });
    TlsConfig {
        certificate,
        verify_peer,
    }
}

#[cfg(feature = "reqwest-blocking-client")]
fn default_client(tls: TlsConfig) -> Result<Arc<dyn HttpClient>, ExporterBuildError> {
    #[cfg(not(feature = "tls"))]
    if !tls.is_default() {
        return Err(ExporterBuildError::FeatureRequired(
            "tls",
            "certificate verification settings",
        ));
    }
    #[cfg(feature = "tls")]
    let root_certificate = tls.certificate.as_deref().map(load_certificate).transpose()?;

    // reqwest's blocking client cannot be built on an async runtime's thread.
    let client = std::thread::Builder::new()
        .name("OpenTelemetry.Otlp.HttpClient".to_string())
        .spawn(move || {
            let builder = reqwest::blocking::Client::builder();
            #[cfg(feature = "tls")]
            let builder = {
                let builder = builder.danger_accept_invalid_certs(!tls.verify_peer);
                match root_certificate {
                    Some(certificate) => builder.add_root_certificate(certificate),
                    None => builder,
                }
            };
            builder.build()
        })
        .map_err(|_| ExporterBuildError::ThreadSpawnFailed)?
        .join()
        .map_err(|_| ExporterBuildError::ThreadSpawnFailed)?
        .map_err(|e| ExporterBuildError::InternalFailure(e.to_string()))?;

    Ok(Arc::new(client))
}

#[cfg(not(feature = "reqwest-blocking-client"))]
fn default_client(_tls: TlsConfig) -> Result<Arc<dyn HttpClient>, ExporterBuildError> {
    Err(ExporterBuildError::NoHttpClient)
}

#[cfg(feature = "tls")]
fn load_certificate(path: &std::path::Path) -> Result<reqwest::Certificate, ExporterBuildError> {
    let invalid = |reason: String| ExporterBuildError::InvalidConfig {
        name: "certificate".to_string(),
        reason: format!("{}: {reason}", path.display()),
    };
    let pem = std::fs::read(path).map_err(|e| invalid(e.to_string()))?;
    reqwest::Certificate::from_pem(&pem).map_err(|e| invalid(e.to_string()))
}

/// Expose interface for modifying builder config.
pub trait HasHttpConfig {
    /// Return a mutable reference to the config within the exporter builders.
    fn http_client_config(&mut self) -> &mut HttpConfig;
}

/// Expose interface for modifying builder config.
impl HasHttpConfig for HttpExporterBuilder {
    fn http_client_config(&mut self) -> &mut HttpConfig {
        &mut self.http_config
    }
}

/// This trait will be implemented for every struct that implemented [`HasHttpConfig`] trait.
///
/// ## Examples
/// ```
/// # #[cfg(feature = "logs")]
/// # {
/// use opentelemetry_otlp::WithHttpConfig;
/// let exporter_builder = opentelemetry_otlp::LogExporter::builder()
///     .with_http()
///     .with_headers([("authorization".to_string(), "Bearer token".to_string())].into())
///     .without_compression();
/// # }
/// ```
pub trait WithHttpConfig {
    /// Assign client implementation
    fn with_http_client<T: HttpClient + 'static>(self, client: T) -> Self;

    /// Set additional headers to send to the collector. Values are
    /// percent-decoded. They take precedence over headers from environment
    /// variables; a `User-Agent` is put in front of the exporter's own.
    fn with_headers(self, headers: HashMap<String, String>) -> Self;

    /// Compress request bodies with the given algorithm.
    fn with_compression(self, compression: Compression) -> Self;

    /// Send request bodies uncompressed.
    fn without_compression(self) -> Self;

    /// Trust the certificate authority in the given PEM file. Applies to the
    /// built-in client and needs the `tls` feature.
    fn with_certificate<P: Into<PathBuf>>(self, path: P) -> Self;

    /// Whether to verify the collector's certificate. Applies to the built-in
    /// client and needs the `tls` feature to turn verification off.
    fn with_ssl_verify_peer(self, verify: bool) -> Self;

    /// Set how failed requests are retried.
    fn with_retry_policy(self, policy: RetryPolicy) -> Self;
}

impl<B: HasHttpConfig> WithHttpConfig for B {
    fn with_http_client<T: HttpClient + 'static>(mut self, client: T) -> Self {
        self.http_client_config().client = Some(Arc::new(client));
        self
    }

    fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        // headers will be wrapped, so we must do some logic to unwrap first.
        let http_client_headers = self
            .http_client_config()
            .headers
            .get_or_insert(HashMap::new());
        headers.into_iter().for_each(|(key, value)| {
            http_client_headers.insert(key, url_decode(&value).unwrap_or(value));
        });
        self
    }

    fn with_compression(mut self, compression: Compression) -> Self {
        self.http_client_config().compression = Some(Some(compression));
        self
    }

    fn without_compression(mut self) -> Self {
        self.http_client_config().compression = Some(None);
        self
    }

    fn with_certificate<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.http_client_config().certificate = Some(path.into());
        self
    }

    fn with_ssl_verify_peer(mut self, verify: bool) -> Self {
        self.http_client_config().verify_peer = Some(verify);
        self
    }

    fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.http_client_config().retry_policy = Some(policy);
        self
    }
}

/// Why a single export attempt failed.
#[derive(Debug, Error)]
pub(crate) enum ExportError {
    #[error("unexpected error in OTLP exporter while encoding: {0}")]
    Encode(String),

    #[error("{kind} error while sending OTLP request: {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    #[error("OTLP exporter received http.code=404 for uri: '{path}'")]
    NotFound { path: String },

    #[error("OTLP exporter received http.code={status}, {}", describe_response(.rpc_status.as_ref(), .body))]
    Status {
        status: u16,
        retry_after: Option<String>,
        rpc_status: Option<Status>,
        body: String,
    },
}

fn describe_response(rpc_status: Option<&Status>, body: &str) -> String {
    match rpc_status {
        Some(status) => describe_rpc_status(status),
        None => format!("body: {body:?}"),
    }
}

fn describe_rpc_status(status: &Status) -> String {
    let details: Vec<String> = status
        .details
        .iter()
        .map(|detail| {
            format!(
                "{}: {}",
                detail.type_url,
                String::from_utf8_lossy(&detail.value)
            )
        })
        .collect();
    format!(
        "rpc.Status{{message={}, details=[{}]}}",
        status.message,
        details.join(", ")
    )
}

impl ExportError {
    fn from_response(path: &str, response: http::Response<Bytes>) -> Self {
        let status = response.status().as_u16();
        if status == 404 {
            return ExportError::NotFound {
                path: path.to_string(),
            };
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        let body = response.into_body();
        // A collector is not required to send an rpc.Status, so decoding is best effort.
        let rpc_status = Status::decode(body.clone())
            .ok()
            .filter(|status| *status != Status::default());

        ExportError::Status {
            status,
            retry_after,
            rpc_status,
            body: String::from_utf8_lossy(&body).into_owned(),
        }
    }

    fn classify(&self) -> RetryErrorType {
        match self {
            ExportError::Encode(_) | ExportError::NotFound { .. } => RetryErrorType::NonRetryable,
            ExportError::Transport { kind, .. } => classify_transport_error(*kind),
            ExportError::Status {
                status,
                retry_after,
                ..
            } => classify_http_error(*status, retry_after.as_deref()),
        }
    }

    /// Report the failure of one attempt.
    fn log(&self) {
        match self {
            ExportError::Encode(error) => {
                otel_error!(name: "OtlpHttpExporter.EncodeFailed", error = error.as_str());
            }
            ExportError::Transport {
                kind: TransportErrorKind::Tls,
                message,
            } => {
                otel_error!(name: "OtlpHttpExporter.TlsFailed", error = message.as_str());
            }
            ExportError::Transport { kind, message }
                if matches!(kind, TransportErrorKind::Timeout | TransportErrorKind::Connect) =>
            {
                otel_warn!(
                    name: "OtlpHttpExporter.TransportFailed",
                    kind = kind.to_string(),
                    error = message.as_str()
                );
            }
            ExportError::Transport { message, .. } => {
                otel_error!(name: "OtlpHttpExporter.UnexpectedError", error = message.as_str());
            }
            ExportError::NotFound { path } => {
                otel_error!(name: "OtlpHttpExporter.NotFound", status = 404u16, path = path.as_str());
            }
            ExportError::Status {
                status,
                rpc_status: Some(rpc_status),
                ..
            } => {
                otel_error!(
                    name: "OtlpHttpExporter.RpcStatus",
                    status = *status,
                    message = rpc_status.message.as_str(),
                    details = describe_rpc_status(rpc_status)
                );
            }
            ExportError::Status { status, body, .. } => {
                otel_error!(name: "OtlpHttpExporter.HttpStatus", status = *status, body = body.as_str());
            }
        }
    }
}

/// Sends encoded export requests to one collector endpoint.
#[derive(Debug)]
pub(crate) struct OtlpHttpClient {
    client: Arc<dyn HttpClient>,
    stopped: Mutex<bool>,
    collector_endpoint: Uri,
    headers: HeaderMap,
    compression: Option<Compression>,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl OtlpHttpClient {
    fn new(
        client: Arc<dyn HttpClient>,
        collector_endpoint: Uri,
        headers: HeaderMap,
        compression: Option<Compression>,
        timeout: Duration,
        retry_policy: RetryPolicy,
    ) -> Self {
        OtlpHttpClient {
            client,
            stopped: Mutex::new(false),
            collector_endpoint,
            headers,
            compression,
            timeout,
            retry_policy,
        }
    }

    fn is_stopped(&self) -> bool {
        *self
            .stopped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stop the client. Idempotent.
    pub(crate) fn shutdown(&self) -> OTelSdkResult {
        *self
            .stopped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = true;
        Ok(())
    }

    /// Nothing is buffered; succeeds even after shutdown.
    pub(crate) fn force_flush(&self) -> OTelSdkResult {
        Ok(())
    }

    /// POST `body` to the collector, retrying transient failures until
    /// `timeout` (capped by the configured timeout) runs out. Returns the body
    /// of the successful response.
    pub(crate) fn export_payload(
        &self,
        body: Vec<u8>,
        timeout: Option<Duration>,
    ) -> Result<Bytes, OTelSdkError> {
        if self.is_stopped() {
            otel_debug!(name: "OtlpHttpExporter.ExportAfterShutdown");
            return Err(OTelSdkError::AlreadyShutdown);
        }

        let timeout = timeout.map_or(self.timeout, |t| t.min(self.timeout));
        if timeout.is_zero() {
            return Err(OTelSdkError::Timeout(timeout));
        }
        let deadline = Instant::now() + timeout;

        let body = match self.compress(body) {
            Ok(body) => Bytes::from(body),
            Err(err) => {
                err.log();
                return Err(OTelSdkError::InternalFailure(err.to_string()));
            }
        };

        retry_with_backoff(
            &self.retry_policy,
            deadline,
            ExportError::classify,
            "OtlpHttpExporter.Export",
            |remaining| {
                let result = self.send_once(body.clone(), remaining);
                if let Err(err) = &result {
                    err.log();
                }
                result
            },
        )
        .map_err(|err| OTelSdkError::InternalFailure(err.to_string()))
    }

    fn send_once(&self, body: Bytes, remaining: Duration) -> Result<Bytes, ExportError> {
        let mut request_builder = http::Request::builder()
            .method(Method::POST)
            .uri(&self.collector_endpoint)
            .header(CONTENT_TYPE, "application/x-protobuf");
        if let Some(compression) = self.compression {
            request_builder = request_builder.header(CONTENT_ENCODING, compression.to_string());
        }
        let mut request = request_builder
            .body(body)
            .map_err(|e| ExportError::Encode(e.to_string()))?;
        request.headers_mut().extend(self.headers.clone());
        request.extensions_mut().insert(RequestTimeout(remaining));

        otel_debug!(name: "OtlpHttpExporter.ExportStarted", endpoint = self.collector_endpoint.to_string());
        let response = futures_executor::block_on(self.client.send_bytes(request)).map_err(
            |err| ExportError::Transport {
                kind: TransportError::kind_of(&err),
                message: err.to_string(),
            },
        )?;

        if response.status().is_success() {
            otel_debug!(name: "OtlpHttpExporter.ExportSucceeded", status = response.status().as_u16());
            Ok(response.into_body())
        } else {
            Err(ExportError::from_response(
                self.collector_endpoint.path(),
                response,
            ))
        }
    }

    fn compress(&self, body: Vec<u8>) -> Result<Vec<u8>, ExportError> {
        match self.compression {
            #[cfg(feature = "gzip-http")]
            Some(Compression::Gzip) => {
                use flate2::write::GzEncoder;
                use std::io::Write;

                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder
                    .write_all(&body)
                    .and_then(|_| encoder.finish())
                    .map_err(|e| ExportError::Encode(format!("gzip: {e}")))
            }
            #[cfg(not(feature = "gzip-http"))]
            Some(Compression::Gzip) => Err(ExportError::Encode(
                "gzip compression requires the gzip-http feature".to_string(),
            )),
            None => Ok(body),
        }
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Uri, ExporterBuildError> {
    let uri: Uri = endpoint
        .parse()
        .map_err(|e: http::uri::InvalidUri| {
            ExporterBuildError::InvalidUri(endpoint.to_string(), e.to_string())
        })?;
    match uri.scheme_str() {
        Some("http") | Some("https") if uri.authority().is_some() => Ok(uri),
        _ => Err(ExporterBuildError::InvalidUri(
            endpoint.to_string(),
            "expected an absolute http or https URL".to_string(),
        )),
    }
}

fn build_endpoint_uri(endpoint: &str, path: &str) -> Result<Uri, ExporterBuildError> {
    parse_endpoint(&format!("{}{path}", endpoint.trim_end_matches('/')))
}

// see https://github.com/open-telemetry/opentelemetry-specification/blob/main/specification/protocol/exporter.md#endpoint-urls-for-otlphttp
fn resolve_endpoint(
    signal_endpoint_var: &str,
    signal_endpoint_path: &str,
    provided_endpoint: Option<&str>,
) -> Result<Uri, ExporterBuildError> {
    // programmatic configuration overrides any value set via environment variables,
    // and is used as is
    if let Some(endpoint) = provided_endpoint.filter(|s| !s.is_empty()) {
        return parse_endpoint(endpoint);
    }

    // per signal env var is not modified
    if let Some(endpoint) = env::var(signal_endpoint_var)
        .ok()
        .filter(|s| !s.is_empty())
    {
        return parse_endpoint(&endpoint);
    }

    // if signal env var is not set, then we check if the OTEL_EXPORTER_OTLP_ENDPOINT is set
    if let Some(endpoint) = env::var(OTEL_EXPORTER_OTLP_ENDPOINT)
        .ok()
        .filter(|s| !s.is_empty())
    {
        return build_endpoint_uri(&endpoint, signal_endpoint_path);
    }

    build_endpoint_uri(OTEL_EXPORTER_OTLP_ENDPOINT_DEFAULT, signal_endpoint_path)
}

fn invalid_header(key: &str, reason: impl ToString) -> ExporterBuildError {
    ExporterBuildError::InvalidConfig {
        name: "headers".to_string(),
        reason: format!("'{key}': {}", reason.to_string()),
    }
}

/// Headers from the environment, then the provided ones, with the exporter's
/// `User-Agent` appended to any supplied one.
fn resolve_headers(
    signal_headers_var: &str,
    provided_headers: Option<HashMap<String, String>>,
) -> Result<HeaderMap, ExporterBuildError> {
    let mut entries = Vec::new();
    // read headers from env var - signal specific env var is preferred over general
    if let Ok(input) =
        env::var(signal_headers_var).or_else(|_| env::var(OTEL_EXPORTER_OTLP_HEADERS))
    {
        entries.extend(parse_header_string(&input)?);
    }
    entries.extend(provided_headers.into_iter().flatten());

    let mut headers = HeaderMap::new();
    for (key, value) in entries {
        let name = HeaderName::from_str(&key).map_err(|e| invalid_header(&key, e))?;
        let value = HeaderValue::from_bytes(value.as_bytes()).map_err(|e| invalid_header(&key, e))?;
        headers.insert(name, value);
    }

    let agent = match headers.get(USER_AGENT) {
        Some(supplied) => [supplied.as_bytes(), b" ", user_agent().as_bytes()].concat(),
        None => user_agent().as_bytes().to_vec(),
    };
    headers.insert(
        USER_AGENT,
        HeaderValue::from_bytes(&agent).map_err(|e| invalid_header("User-Agent", e))?,
    );
    Ok(headers)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::exporter::tests::run_env_test;
    use async_trait::async_trait;
    use opentelemetry_http::{HttpError, Request, Response};
    use opentelemetry_proto::rpc::Any;
    use std::collections::VecDeque;

    const LOGS_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_LOGS_ENDPOINT";
    const LOGS_HEADERS: &str = "OTEL_EXPORTER_OTLP_LOGS_HEADERS";
    const LOGS_CERTIFICATE: &str = "OTEL_EXPORTER_OTLP_LOGS_CERTIFICATE";

    /// What the mock collector does with one request.
    #[derive(Debug)]
    pub(crate) enum Reply {
        Status(u16),
        StatusWithBody(u16, Vec<u8>),
        StatusWithHeader(u16, &'static str, &'static str),
        Fail(TransportErrorKind),
    }

    /// A collector double replaying scripted replies, then answering 200.
    #[derive(Debug, Default)]
    pub(crate) struct MockCollector {
        replies: Mutex<VecDeque<Reply>>,
        pub(crate) requests: Mutex<Vec<Request<Bytes>>>,
    }

    impl MockCollector {
        pub(crate) fn replying(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
            Arc::new(MockCollector {
                replies: Mutex::new(replies.into_iter().collect()),
                requests: Mutex::default(),
            })
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpClient for MockCollector {
        async fn send_bytes(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            self.requests.lock().unwrap().push(request);
            let reply = self.replies.lock().unwrap().pop_front();
            let response = match reply.unwrap_or(Reply::Status(200)) {
                Reply::Status(status) => Response::builder().status(status).body(Bytes::new()),
                Reply::StatusWithBody(status, body) => {
                    Response::builder().status(status).body(Bytes::from(body))
                }
                Reply::StatusWithHeader(status, name, value) => Response::builder()
                    .status(status)
                    .header(name, value)
                    .body(Bytes::new()),
                Reply::Fail(kind) => {
                    return Err(Box::new(TransportError::new(kind, format!("{kind} failure"))))
                }
            };
            Ok(response?)
        }
    }

    #[derive(Debug)]
    struct SharedCollector(Arc<MockCollector>);

    #[async_trait]
    impl HttpClient for SharedCollector {
        async fn send_bytes(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            self.0.send_bytes(request).await
        }
    }

    pub(crate) fn fast_retries() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter: Duration::from_millis(1),
        }
    }

    pub(crate) fn client_for(collector: &Arc<MockCollector>) -> OtlpHttpClient {
        OtlpHttpClient::new(
            Arc::new(SharedCollector(Arc::clone(collector))),
            Uri::from_static("http://localhost:4318/v1/logs"),
            HeaderMap::new(),
            None,
            Duration::from_secs(10),
            fast_retries(),
        )
    }

    #[test]
    fn test_append_signal_path_to_generic_env() {
        run_env_test(vec![(OTEL_EXPORTER_OTLP_ENDPOINT, "http://example.com")], || {
            let endpoint = resolve_endpoint(LOGS_ENDPOINT, "/v1/logs", None).unwrap();
            assert_eq!(endpoint, "http://example.com/v1/logs");
        })
    }

    #[test]
    fn test_not_append_signal_path_to_signal_env() {
        run_env_test(vec![(LOGS_ENDPOINT, "http://example.com")], || {
            let endpoint = resolve_endpoint(LOGS_ENDPOINT, "/v1/logs", None).unwrap();
            assert_eq!(endpoint, "http://example.com/");
        })
    }

    #[test]
    fn test_priority_of_signal_env_over_generic_env() {
        run_env_test(
            vec![
                (LOGS_ENDPOINT, "http://example.com/custom"),
                (OTEL_EXPORTER_OTLP_ENDPOINT, "http://wrong.com"),
            ],
            || {
                let endpoint = resolve_endpoint(LOGS_ENDPOINT, "/v1/logs", None).unwrap();
                assert_eq!(endpoint, "http://example.com/custom");
            },
        );
    }

    #[test]
    fn test_provided_endpoint_is_used_as_is() {
        run_env_test(vec![(LOGS_ENDPOINT, "http://wrong.com")], || {
            let endpoint =
                resolve_endpoint(LOGS_ENDPOINT, "/v1/logs", Some("https://localhost/custom/path"))
                    .unwrap();
            assert_eq!(endpoint.path(), "/custom/path");
        });
    }

    #[test]
    fn test_use_default_when_others_missing() {
        run_env_test(vec![], || {
            let endpoint = resolve_endpoint(LOGS_ENDPOINT, "/v1/logs", None).unwrap();
            assert_eq!(endpoint, "http://localhost:4318/v1/logs");
        });
    }

    #[test]
    fn test_build_endpoint_uri() {
        let uri = build_endpoint_uri("https://example.com", "/v1/logs").unwrap();
        assert_eq!(uri, "https://example.com/v1/logs");

        // Should be no duplicate slashes:
        let uri = build_endpoint_uri("https://example.com/", "/v1/logs").unwrap();
        assert_eq!(uri, "https://example.com/v1/logs");

        // Append paths properly:
        let uri = build_endpoint_uri("https://example.com/additional/path/", "/v1/logs").unwrap();
        assert_eq!(uri, "https://example.com/additional/path/v1/logs");
    }

    #[test]
    fn test_invalid_endpoints_are_rejected() {
        run_env_test(vec![(LOGS_ENDPOINT, "-*/*-/*-//-/-/invalid-uri")], || {
            assert!(matches!(
                resolve_endpoint(LOGS_ENDPOINT, "/v1/logs", None),
                Err(ExporterBuildError::InvalidUri(_, _))
            ));
        });
        for endpoint in ["not a url", "localhost:4318", "ftp://example.com"] {
            assert!(
                matches!(parse_endpoint(endpoint), Err(ExporterBuildError::InvalidUri(_, _))),
                "{endpoint} should be rejected"
            );
        }
    }

    #[test]
    fn test_user_agent_is_the_default_header() {
        run_env_test(vec![], || {
            let headers = resolve_headers(LOGS_HEADERS, None).unwrap();
            assert_eq!(headers.len(), 1);
            assert_eq!(headers[USER_AGENT], user_agent());
            assert!(user_agent().starts_with("OTel-OTLP-Exporter-Rust/"));
        });
    }

    #[test]
    fn test_headers_from_env_and_code() {
        run_env_test(
            vec![
                (LOGS_HEADERS, "a=b,token=%C3%BCber"),
                (OTEL_EXPORTER_OTLP_HEADERS, "ignored=1"),
            ],
            || {
                let provided = HashMap::from([("a".to_string(), "from-code".to_string())]);
                let headers = resolve_headers(LOGS_HEADERS, Some(provided)).unwrap();

                assert_eq!(headers["a"], "from-code");
                assert_eq!(headers["token"].as_bytes(), "über".as_bytes());
                assert!(headers.get("ignored").is_none());
            },
        );
    }

    #[test]
    fn test_user_agent_is_appended_to() {
        run_env_test(
            vec![(OTEL_EXPORTER_OTLP_HEADERS, "User-Agent=%C3%BCber/3.2.1")],
            || {
                let headers = resolve_headers(LOGS_HEADERS, None).unwrap();
                let expected = format!("über/3.2.1 {}", user_agent());
                assert_eq!(headers[USER_AGENT].as_bytes(), expected.as_bytes());
            },
        );
    }

    #[test]
    fn test_malformed_headers_fail_the_build() {
        run_env_test(vec![(LOGS_HEADERS, "a = ")], || {
            assert!(resolve_headers(LOGS_HEADERS, None).is_err());
        });
        run_env_test(vec![], || {
            let provided = HashMap::from([("bad header".to_string(), "v".to_string())]);
            assert!(resolve_headers(LOGS_HEADERS, Some(provided)).is_err());
        });
    }

    #[test]
    fn test_ssl_verify_env() {
        run_env_test(vec![(OTEL_EXPORTER_OTLP_SSL_VERIFY_NONE, "true")], || {
            assert!(!resolve_tls(LOGS_CERTIFICATE, None, None).verify_peer);
        });
        run_env_test(vec![(OTEL_EXPORTER_OTLP_SSL_VERIFY_PEER, "true")], || {
            assert!(resolve_tls(LOGS_CERTIFICATE, None, None).verify_peer);
        });
        run_env_test(
            vec![
                (OTEL_EXPORTER_OTLP_SSL_VERIFY_NONE, "true"),
                (OTEL_EXPORTER_OTLP_SSL_VERIFY_PEER, "true"),
            ],
            || {
                assert!(resolve_tls(LOGS_CERTIFICATE, None, None).verify_peer);
            },
        );
        run_env_test(vec![(OTEL_EXPORTER_OTLP_SSL_VERIFY_NONE, "true")], || {
            assert!(resolve_tls(LOGS_CERTIFICATE, None, Some(true)).verify_peer);
        });
    }

    #[test]
    fn test_signal_certificate_env_replaces_generic() {
        run_env_test(
            vec![
                (LOGS_CERTIFICATE, "/etc/otel/logs.pem"),
                (OTEL_EXPORTER_OTLP_CERTIFICATE, "/etc/otel/ca.pem"),
            ],
            || {
                let tls = resolve_tls(LOGS_CERTIFICATE, None, None);
                assert_eq!(tls.certificate, Some(PathBuf::from("/etc/otel/logs.pem")));
                assert!(!tls.is_default());
            },
        );
    }

    #[test]
    fn request_carries_protocol_headers() {
        let collector = MockCollector::replying([]);
        let mut client = client_for(&collector);
        run_env_test(vec![], || {
            client.headers = resolve_headers(LOGS_HEADERS, None).unwrap();
        });

        client.export_payload(vec![1, 2, 3], None).unwrap();

        let requests = collector.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri(), "http://localhost:4318/v1/logs");
        assert_eq!(request.headers()[CONTENT_TYPE], "application/x-protobuf");
        assert!(request.headers().get(CONTENT_ENCODING).is_none());
        assert_eq!(request.headers()[USER_AGENT], user_agent());
        assert_eq!(request.body().as_ref(), [1, 2, 3]);
        let RequestTimeout(timeout) = *request.extensions().get::<RequestTimeout>().unwrap();
        assert!(timeout <= Duration::from_secs(10));
    }

    #[cfg(feature = "gzip-http")]
    #[test]
    fn gzip_compresses_the_body() {
        use flate2::read::GzDecoder;
        use std::io::Read;

        let collector = MockCollector::replying([]);
        let mut client = client_for(&collector);
        client.compression = Some(Compression::Gzip);
        let payload = b"hello hello hello hello".to_vec();

        client.export_payload(payload.clone(), None).unwrap();

        let requests = collector.requests.lock().unwrap();
        assert_eq!(requests[0].headers()[CONTENT_ENCODING], "gzip");
        let mut decoded = Vec::new();
        GzDecoder::new(requests[0].body().as_ref())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn zero_timeout_short_circuits_without_io() {
        let collector = MockCollector::replying([]);
        let client = client_for(&collector);

        let result = client.export_payload(vec![1], Some(Duration::ZERO));

        assert_eq!(result, Err(OTelSdkError::Timeout(Duration::ZERO)));
        assert_eq!(collector.request_count(), 0);
    }

    #[test]
    fn retries_a_timeout_then_succeeds() {
        let collector = MockCollector::replying([Reply::Fail(TransportErrorKind::Timeout)]);
        let client = client_for(&collector);

        assert!(client.export_payload(vec![1], None).is_ok());
        assert_eq!(collector.request_count(), 2);
    }

    #[test]
    fn retries_transient_statuses() {
        let collector = MockCollector::replying([
            Reply::Status(503),
            Reply::StatusWithHeader(429, "retry-after", "0"),
            Reply::Fail(TransportErrorKind::Connect),
        ]);
        let client = client_for(&collector);

        assert!(client.export_payload(vec![1], None).is_ok());
        assert_eq!(collector.request_count(), 4);
    }

    #[test]
    fn exhausted_retries_fail() {
        let collector = MockCollector::replying((0..10).map(|_| Reply::Status(502)));
        let client = client_for(&collector);

        let result = client.export_payload(vec![1], None);

        assert!(matches!(result, Err(OTelSdkError::InternalFailure(_))));
        assert_eq!(collector.request_count(), 4);
    }

    #[test]
    fn retry_budget_is_bounded_by_the_timeout() {
        let collector = MockCollector::replying((0..1000).map(|_| Reply::Status(503)));
        let mut client = client_for(&collector);
        client.retry_policy = RetryPolicy {
            max_retries: 1000,
            initial_delay: Duration::from_millis(30),
            max_delay: Duration::from_millis(30),
            jitter: Duration::ZERO,
        };
        let started = Instant::now();

        let result = client.export_payload(vec![1], Some(Duration::from_millis(100)));

        assert!(matches!(result, Err(OTelSdkError::InternalFailure(_))));
        assert!(collector.request_count() <= 4);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn permanent_failures_are_not_retried() {
        for reply in [
            Reply::Status(400),
            Reply::Status(404),
            Reply::Fail(TransportErrorKind::Tls),
            Reply::Fail(TransportErrorKind::Other),
        ] {
            let collector = MockCollector::replying([reply]);
            let client = client_for(&collector);

            assert!(client.export_payload(vec![1], None).is_err());
            assert_eq!(collector.request_count(), 1);
        }
    }

    #[test]
    fn rpc_status_body_is_decoded() {
        let status = Status {
            code: 3,
            message: "bad request".to_string(),
            details: vec![Any {
                type_url: "type.googleapis.com/google.rpc.ErrorInfo".to_string(),
                value: b"you are a bad request".to_vec(),
            }],
        };
        let collector = MockCollector::replying([Reply::StatusWithBody(400, status.encode_to_vec())]);
        let client = client_for(&collector);

        let Err(OTelSdkError::InternalFailure(message)) = client.export_payload(vec![1], None)
        else {
            panic!("expected a failure");
        };

        assert!(message.contains("http.code=400"), "{message}");
        assert!(message.contains("rpc.Status{message=bad request"), "{message}");
        assert!(message.contains("you are a bad request"), "{message}");
    }

    #[test]
    fn not_found_reports_the_request_path() {
        let collector =
            MockCollector::replying([Reply::StatusWithBody(404, b"Not Found\n".to_vec())]);
        let client = client_for(&collector);

        let Err(OTelSdkError::InternalFailure(message)) = client.export_payload(vec![1], None)
        else {
            panic!("expected a failure");
        };

        assert_eq!(
            message,
            "OTLP exporter received http.code=404 for uri: '/v1/logs'"
        );
    }

    #[test]
    fn shutdown_stops_exports_without_io() {
        let collector = MockCollector::replying([]);
        let client = client_for(&collector);

        assert!(client.shutdown().is_ok());
        assert!(client.shutdown().is_ok());
        assert!(client.force_flush().is_ok());

        assert_eq!(
            client.export_payload(vec![1], None),
            Err(OTelSdkError::AlreadyShutdown)
        );
        assert_eq!(collector.request_count(), 0);
    }

    #[test]
    fn caller_timeout_is_capped_by_the_configured_timeout() {
        let collector = MockCollector::replying([]);
        let mut client = client_for(&collector);
        client.timeout = Duration::from_secs(2);

        client
            .export_payload(vec![1], Some(Duration::from_secs(30)))
            .unwrap();

        let requests = collector.requests.lock().unwrap();
        let RequestTimeout(timeout) = *requests[0].extensions().get::<RequestTimeout>().unwrap();
        assert!(timeout <= Duration::from_secs(2));
    }

    #[cfg(not(feature = "tls"))]
    #[test]
    fn tls_settings_need_the_tls_feature() {
        let tls = TlsConfig {
            certificate: Some(PathBuf::from("/etc/otel/ca.pem")),
            verify_peer: true,
        };
        assert!(matches!(
            default_client(tls),
            Err(ExporterBuildError::FeatureRequired("tls", _)) | Err(ExporterBuildError::NoHttpClient)
        ));
    }

    #[cfg(feature = "tls")]
    #[test]
    fn missing_certificate_file_fails_the_build() {
        let tls = TlsConfig {
            certificate: Some(PathBuf::from("/nonexistent/otel/ca.pem")),
            verify_peer: true,
        };
        assert!(matches!(
            default_client(tls),
            Err(ExporterBuildError::InvalidConfig { name, .. }) if name == "certificate"
        ));
    }
}
