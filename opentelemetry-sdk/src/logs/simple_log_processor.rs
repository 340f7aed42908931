//! # Simple Log Processor
//!
//! Exports every record synchronously, on the thread that emitted it. Meant
//! for debugging and tests; use the
//! [`BatchLogProcessor`](crate::logs::BatchLogProcessor) in production.

use crate::error::{OTelSdkError, OTelSdkResult};
use crate::logs::{LogBatch, LogExporter, LogProcessor, SdkLogRecord};
use opentelemetry::{otel_debug, otel_error, otel_warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A [`LogProcessor`] that exports each record as soon as it is emitted.
///
/// ```rust
/// use opentelemetry_sdk::logs::{InMemoryLogExporter, SdkLoggerProvider};
///
/// let exporter = InMemoryLogExporter::default();
/// let provider = SdkLoggerProvider::builder()
///     .with_simple_exporter(exporter)
///     .build();
/// ```
#[derive(Debug)]
pub struct SimpleLogProcessor<T: LogExporter> {
    exporter: Mutex<T>,
    is_shutdown: AtomicBool,
}

impl<T: LogExporter> SimpleLogProcessor<T> {
    /// Create a processor exporting to `exporter`.
    pub fn new(exporter: T) -> Self {
        SimpleLogProcessor {
            exporter: Mutex::new(exporter),
            is_shutdown: AtomicBool::new(false),
        }
    }
}

impl<T: LogExporter> LogProcessor for SimpleLogProcessor<T> {
    fn emit(&self, record: &mut SdkLogRecord) {
        if self.is_shutdown.load(Ordering::Relaxed) {
            otel_debug!(name: "SimpleLogProcessor.Emit.AfterShutdown");
            return;
        }

        let data = [record.to_log_record_data()];
        let result = self
            .exporter
            .lock()
            .map_err(|_| OTelSdkError::InternalFailure("SimpleLogProcessor mutex poison".into()))
            .and_then(|exporter| exporter.export(LogBatch::new(&data), None));
        if let Err(err) = result {
            otel_error!(
                name: "SimpleLogProcessor.Emit.ExportError",
                error = format!("{err}")
            );
        }
    }

    fn force_flush(&self, timeout: Option<Duration>) -> OTelSdkResult {
        if self.is_shutdown.load(Ordering::Relaxed) {
            return Err(OTelSdkError::AlreadyShutdown);
        }
        self.exporter
            .lock()
            .map_err(|_| OTelSdkError::InternalFailure("SimpleLogProcessor mutex poison".into()))
            .and_then(|exporter| exporter.force_flush(timeout))
    }

    fn shutdown(&self, timeout: Option<Duration>) -> OTelSdkResult {
        if self.is_shutdown.swap(true, Ordering::Relaxed) {
            otel_warn!(name: "SimpleLogProcessor.Shutdown.AlreadyShutdown");
            return Err(OTelSdkError::AlreadyShutdown);
        }
        self.exporter
            .lock()
            .map_err(|_| {
                OTelSdkError::InternalFailure("SimpleLogProcessor mutex poison at shutdown".into())
            })
            .and_then(|exporter| exporter.shutdown(timeout))
    }
}
