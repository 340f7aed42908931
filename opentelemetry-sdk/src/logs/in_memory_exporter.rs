use crate::error::{OTelSdkError, OTelSdkResult};
use crate::logs::{LogBatch, LogExporter, LogRecordData};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An in-memory logs exporter that stores logs data in memory.
///
/// This exporter is useful for testing and debugging purposes. It stores
/// exported records in a `Vec<LogRecordData>`, retrievable with
/// [`get_emitted_logs`](InMemoryLogExporter::get_emitted_logs). Clones share
/// the same storage.
///
/// # Example
/// ```
/// use opentelemetry_sdk::logs::{InMemoryLogExporter, SdkLoggerProvider};
///
/// let exporter = InMemoryLogExporter::default();
/// let provider = SdkLoggerProvider::builder()
///     .with_simple_exporter(exporter.clone())
///     .build();
///
/// let logger = provider.logger("example");
/// let mut record = logger.create_log_record();
/// record.set_body("hello".into());
/// logger.emit(record);
///
/// let emitted = exporter.get_emitted_logs().unwrap();
/// assert_eq!(emitted.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryLogExporter {
    logs: Arc<Mutex<Vec<LogRecordData>>>,
    is_shutdown: Arc<AtomicBool>,
    should_reset_on_shutdown: bool,
}

impl Default for InMemoryLogExporter {
    fn default() -> Self {
        InMemoryLogExporterBuilder::new().build()
    }
}

/// Builder for [`InMemoryLogExporter`].
///
/// ```
/// use opentelemetry_sdk::logs::InMemoryLogExporterBuilder;
///
/// let exporter = InMemoryLogExporterBuilder::default()
///     .keep_records_on_shutdown()
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryLogExporterBuilder {
    reset_on_shutdown: bool,
}

impl Default for InMemoryLogExporterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLogExporterBuilder {
    /// Creates a new builder. Records are cleared on shutdown by default.
    pub fn new() -> Self {
        Self {
            reset_on_shutdown: true,
        }
    }

    /// Creates a new instance of `InMemoryLogExporter`.
    pub fn build(&self) -> InMemoryLogExporter {
        InMemoryLogExporter {
            logs: Arc::new(Mutex::new(Vec::new())),
            is_shutdown: Arc::new(AtomicBool::new(false)),
            should_reset_on_shutdown: self.reset_on_shutdown,
        }
    }

    /// Keep the stored records when the exporter shuts down, so they can be
    /// inspected after the provider is gone.
    pub fn keep_records_on_shutdown(self) -> Self {
        Self {
            reset_on_shutdown: false,
        }
    }
}

impl InMemoryLogExporter {
    /// Returns a copy of every record exported so far, in export order.
    ///
    /// ```
    /// use opentelemetry_sdk::logs::InMemoryLogExporterBuilder;
    ///
    /// let exporter = InMemoryLogExporterBuilder::default().build();
    /// assert!(exporter.get_emitted_logs().unwrap().is_empty());
    /// ```
    pub fn get_emitted_logs(&self) -> Result<Vec<LogRecordData>, OTelSdkError> {
        self.logs
            .lock()
            .map(|logs| logs.clone())
            .map_err(|err| OTelSdkError::InternalFailure(format!("{err}")))
    }

    /// Clears the stored records.
    pub fn reset(&self) {
        let _ = self.logs.lock().map(|mut logs| logs.clear());
    }

    /// Whether `shutdown` has been called on this exporter or a clone of it.
    pub fn is_shutdown_called(&self) -> bool {
        self.is_shutdown.load(Ordering::Relaxed)
    }
}

impl LogExporter for InMemoryLogExporter {
    fn export(&self, batch: LogBatch<'_>, _timeout: Option<Duration>) -> OTelSdkResult {
        if self.is_shutdown_called() {
            return Err(OTelSdkError::AlreadyShutdown);
        }
        let mut logs = self
            .logs
            .lock()
            .map_err(|err| OTelSdkError::InternalFailure(format!("{err}")))?;
        logs.extend(batch.iter().cloned());
        Ok(())
    }

    fn shutdown(&self, _timeout: Option<Duration>) -> OTelSdkResult {
        self.is_shutdown.store(true, Ordering::Relaxed);
        if self.should_reset_on_shutdown {
            self.reset();
        }
        Ok(())
    }
}
