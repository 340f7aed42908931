//! HTTP plumbing shared by the OpenTelemetry exporters.
//!
//! Exporters talk to their collector through the [`HttpClient`] trait so that
//! applications can bring their own client. A blocking [`reqwest`]
//! implementation is provided behind the `reqwest-blocking` feature.
//!
//! Clients return non-2xx responses as regular responses; the caller decides
//! what a status means. Failures below HTTP are reported as a
//! [`TransportError`] so callers can tell a timeout from a refused connection
//! or a TLS handshake failure.
//!
//! [`reqwest`]: https://docs.rs/reqwest
use async_trait::async_trait;
use std::fmt::{self, Debug, Display};
use std::time::Duration;

#[doc(no_inline)]
pub use bytes::Bytes;
#[doc(no_inline)]
pub use http::{Request, Response};

/// Error returned by an [`HttpClient`].
pub type HttpError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A minimal interface necessary for sending requests over HTTP.
///
/// Used by the OTLP exporters to deliver encoded payloads. Implementations
/// should honour a [`RequestTimeout`] found in the request extensions.
#[async_trait]
pub trait HttpClient: Debug + Send + Sync {
    /// Send the specified HTTP request with `Bytes` payload.
    ///
    /// Returns the HTTP response including the status code and body, whatever
    /// the status.
    ///
    /// Returns an error if it can't connect to the server or the request could not be completed,
    /// e.g. because of a timeout, infinite redirects, or a loss of connection.
    async fn send_bytes(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError>;
}

/// Upper bound for a single request, carried in the request extensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTimeout(pub Duration);

/// Broad cause of a failure that happened before an HTTP response arrived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TransportErrorKind {
    /// The request did not complete in time.
    Timeout,
    /// The connection could not be established.
    Connect,
    /// The TLS handshake or certificate validation failed.
    Tls,
    /// Anything else.
    Other,
}

impl Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Tls => "tls",
            TransportErrorKind::Other => "other",
        })
    }
}

/// A failure below HTTP, tagged with its [`TransportErrorKind`].
#[derive(Debug)]
pub struct TransportError {
    kind: TransportErrorKind,
    source: HttpError,
}

impl TransportError {
    /// Wrap `source` as a failure of the given kind.
    pub fn new(kind: TransportErrorKind, source: impl Into<HttpError>) -> Self {
        TransportError {
            kind,
            source: source.into(),
        }
    }

    /// What went wrong.
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// The kind of an error returned by [`HttpClient::send_bytes`].
    ///
    /// Errors that are not a [`TransportError`] are [`TransportErrorKind::Other`].
    pub fn kind_of(err: &HttpError) -> TransportErrorKind {
        err.downcast_ref::<TransportError>()
            .map_or(TransportErrorKind::Other, TransportError::kind)
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.source)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

#[cfg(all(feature = "reqwest-blocking", not(target_arch = "wasm32")))]
mod reqwest {
    use opentelemetry::otel_debug;
    use std::error::Error;

    use super::{
        async_trait, Bytes, HttpClient, HttpError, Request, RequestTimeout, Response,
        TransportError, TransportErrorKind,
    };

    #[async_trait]
    impl HttpClient for reqwest::blocking::Client {
        async fn send_bytes(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            otel_debug!(name: "ReqwestBlockingClient.Send");
            let timeout = request.extensions().get::<RequestTimeout>().copied();
            let mut request: reqwest::blocking::Request = request.try_into()?;
            if let Some(RequestTimeout(timeout)) = timeout {
                *request.timeout_mut() = Some(timeout);
            }

            let mut response = self.execute(request).map_err(transport_error)?;
            let headers = std::mem::take(response.headers_mut());
            let status = response.status();
            let body = response.bytes().map_err(transport_error)?;

            let mut http_response = Response::builder().status(status).body(body)?;
            *http_response.headers_mut() = headers;
            Ok(http_response)
        }
    }

    fn transport_error(err: reqwest::Error) -> TransportError {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if mentions_tls(&err) {
            TransportErrorKind::Tls
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Other
        };
        TransportError::new(kind, err)
    }

    // reqwest does not expose TLS failures as a category, so look through the
    // source chain for a TLS library's message.
    fn mentions_tls(err: &(dyn Error + 'static)) -> bool {
        let mut current = Some(err);
        while let Some(err) = current {
            let message = err.to_string().to_ascii_lowercase();
            if ["certificate", "tls", "ssl"]
                .iter()
                .any(|needle| message.contains(needle))
            {
                return true;
            }
            current = err.source();
        }
        false
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn kind_of_reads_through_the_boxed_error() {
        let timeout: HttpError = Box::new(TransportError::new(
            TransportErrorKind::Timeout,
            "operation timed out",
        ));
        let plain: HttpError = "something else".into();

        assert_eq!(TransportError::kind_of(&timeout), TransportErrorKind::Timeout);
        assert_eq!(TransportError::kind_of(&plain), TransportErrorKind::Other);
        assert_eq!(timeout.to_string(), "timeout error: operation timed out");
    }

    #[derive(Debug, Default)]
    struct RecordingClient {
        timeouts: Mutex<Vec<Option<RequestTimeout>>>,
    }

    #[async_trait]
    impl HttpClient for RecordingClient {
        async fn send_bytes(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
            self.timeouts
                .lock()
                .unwrap()
                .push(request.extensions().get::<RequestTimeout>().copied());
            Ok(Response::builder().status(503).body(Bytes::new())?)
        }
    }

    #[test]
    fn request_timeout_travels_in_extensions() {
        let client = RecordingClient::default();
        let mut request = Request::builder()
            .uri("http://localhost:4318/v1/logs")
            .body(Bytes::from_static(b"payload"))
            .unwrap();
        request
            .extensions_mut()
            .insert(RequestTimeout(Duration::from_millis(1500)));

        let response = futures_executor::block_on(client.send_bytes(request)).unwrap();

        assert_eq!(response.status(), 503);
        assert_eq!(
            *client.timeouts.lock().unwrap(),
            [Some(RequestTimeout(Duration::from_millis(1500)))]
        );
    }
}
