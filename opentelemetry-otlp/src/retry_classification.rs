//! Which failed exports are worth retrying, including server-provided
//! throttling hints carried by the HTTP `Retry-After` header.

use opentelemetry_http::TransportErrorKind;
use std::time::{Duration, SystemTime};

/// Longest throttling delay honoured from a server.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(600);

/// Retry decision for a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryErrorType {
    /// Retrying will not help.
    NonRetryable,
    /// Retry after the policy's backoff.
    Retryable,
    /// Retry after the given server-provided delay.
    Throttled(Duration),
}

/// Classifies HTTP errors based on status code and headers.
///
/// `429 Too Many Requests`, `502 Bad Gateway`, `503 Service Unavailable` and
/// `504 Gateway Timeout` are transient. A `Retry-After` header on any of them
/// turns the retry into a throttled one. Every other status is permanent.
///
/// # Retry-After Header Formats
/// * Seconds: "120"
/// * HTTP Date: "Fri, 31 Dec 1999 23:59:59 GMT"
pub(crate) fn classify_http_error(
    status_code: u16,
    retry_after_header: Option<&str>,
) -> RetryErrorType {
    match status_code {
        429 | 502 | 503 | 504 => retry_after_header
            .and_then(parse_retry_after)
            .map_or(RetryErrorType::Retryable, RetryErrorType::Throttled),
        _ => RetryErrorType::NonRetryable,
    }
}

/// Timeouts and refused connections are transient; TLS and unknown
/// failures are not.
pub(crate) fn classify_transport_error(kind: TransportErrorKind) -> RetryErrorType {
    match kind {
        TransportErrorKind::Timeout | TransportErrorKind::Connect => RetryErrorType::Retryable,
        _ => RetryErrorType::NonRetryable,
    }
}

/// Parses the Retry-After header value, capped at ten minutes.
///
/// Returns None if the value is neither a number of seconds nor an HTTP date.
fn parse_retry_after(retry_after: &str) -> Option<Duration> {
    let retry_after = retry_after.trim();
    let delay = match retry_after.parse::<u64>() {
        Ok(seconds) => Duration::from_secs(seconds),
        Err(_) => {
            let at = httpdate::parse_http_date(retry_after).ok()?;
            // a date in the past means "retry now"
            at.duration_since(SystemTime::now()).unwrap_or_default()
        }
    };
    Some(delay.min(MAX_RETRY_AFTER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_http_429_with_retry_after_seconds() {
        let result = classify_http_error(429, Some("30"));
        assert_eq!(result, RetryErrorType::Throttled(Duration::from_secs(30)));
    }

    #[test]
    fn test_http_429_with_large_retry_after_capped() {
        let result = classify_http_error(429, Some("900")); // 15 minutes
        assert_eq!(result, RetryErrorType::Throttled(Duration::from_secs(600)));
    }

    #[test]
    fn test_http_503_with_retry_after_date() {
        let in_a_minute = httpdate::fmt_http_date(SystemTime::now() + Duration::from_secs(61));
        let RetryErrorType::Throttled(delay) = classify_http_error(503, Some(&in_a_minute)) else {
            panic!("expected a throttled retry");
        };
        assert!(delay > Duration::from_secs(50) && delay <= Duration::from_secs(61));
    }

    #[test]
    fn test_retry_after_date_in_the_past() {
        assert_eq!(
            classify_http_error(429, Some("Fri, 31 Dec 1999 23:59:59 GMT")),
            RetryErrorType::Throttled(Duration::ZERO)
        );
    }

    #[rstest]
    #[case(Some("invalid"))]
    #[case(None)]
    fn test_http_429_without_usable_retry_after(#[case] header: Option<&str>) {
        assert_eq!(classify_http_error(429, header), RetryErrorType::Retryable);
    }

    #[rstest]
    #[case(502)]
    #[case(503)]
    #[case(504)]
    fn test_transient_server_errors(#[case] status: u16) {
        assert_eq!(classify_http_error(status, None), RetryErrorType::Retryable);
    }

    #[rstest]
    #[case(400)]
    #[case(401)]
    #[case(403)]
    #[case(404)]
    #[case(413)]
    #[case(500)]
    #[case(501)]
    fn test_permanent_errors(#[case] status: u16) {
        assert_eq!(classify_http_error(status, None), RetryErrorType::NonRetryable);
    }

    #[rstest]
    #[case(TransportErrorKind::Timeout, RetryErrorType::Retryable)]
    #[case(TransportErrorKind::Connect, RetryErrorType::Retryable)]
    #[case(TransportErrorKind::Tls, RetryErrorType::NonRetryable)]
    #[case(TransportErrorKind::Other, RetryErrorType::NonRetryable)]
    fn test_transport_errors(#[case] kind: TransportErrorKind, #[case] expected: RetryErrorType) {
        assert_eq!(classify_transport_error(kind), expected);
    }
}
