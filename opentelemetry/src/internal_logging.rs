//! Diagnostics emitted by the SDK itself.
//!
//! These macros are meant for the SDK, exporters and processors, not for
//! application logging. Each call names the event (`Component.Event`) and may
//! attach `key = value` pairs. Values must implement both `Display` and
//! `tracing::Value`; pass formatted strings for anything else.
//!
//! Under `cfg(test)` every event is also printed to stdout so failures can be
//! inspected with `--nocapture`.

#[doc(hidden)]
#[macro_export]
macro_rules! __otel_internal_log {
    ($level:ident, name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::$level!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(test)]
        {
            print!("otel_{}: name={}\n", stringify!($level), $name);
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = $name;
        }
    };
    ($level:ident, name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::$level!(
                name: $name,
                target: env!("CARGO_PKG_NAME"),
                name = $name,
                $($key = $value),+
            );
        }

        #[cfg(test)]
        {
            print!("otel_{}: name={}", stringify!($level), $name);
            $(
                print!(", {}={}", stringify!($key), $value);
            )+
            print!("\n");
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = ($name, $($value),+);
        }
    };
}

/// Logs an informational SDK event.
///
/// ```rust
/// use opentelemetry::otel_info;
/// otel_info!(name: "LoggerProvider.Built", processor_count = 2);
/// ```
#[macro_export]
macro_rules! otel_info {
    ($($args:tt)*) => {
        $crate::__otel_internal_log!(info, $($args)*)
    };
}

/// Logs a warning SDK event, e.g. a dropped record or a repeated shutdown.
///
/// ```rust
/// use opentelemetry::otel_warn;
/// otel_warn!(name: "BatchLogProcessor.BufferFull", dropped = 1);
/// ```
#[macro_export]
macro_rules! otel_warn {
    ($($args:tt)*) => {
        $crate::__otel_internal_log!(warn, $($args)*)
    };
}

/// Logs a debug SDK event.
///
/// ```rust
/// use opentelemetry::otel_debug;
/// otel_debug!(name: "OtlpHttpExporter.Sending", uri = "http://localhost:4318/v1/logs");
/// ```
#[macro_export]
macro_rules! otel_debug {
    ($($args:tt)*) => {
        $crate::__otel_internal_log!(debug, $($args)*)
    };
}

/// Logs an SDK failure that was handled, e.g. an export that could not be sent.
///
/// ```rust
/// use opentelemetry::otel_error;
/// otel_error!(name: "OtlpHttpExporter.ExportFailed", status = 404);
/// ```
#[macro_export]
macro_rules! otel_error {
    ($($args:tt)*) => {
        $crate::__otel_internal_log!(error, $($args)*)
    };
}
