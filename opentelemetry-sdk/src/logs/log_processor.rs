//! # Log Processor Interface
//!
//! A `LogProcessor` receives every record an [`SdkLogger`] emits and decides
//! how it reaches an exporter:
//! - [`SimpleLogProcessor`] exports each record on the emitting thread.
//! - [`BatchLogProcessor`] queues records and exports them in batches from a
//!   background thread.
//!
//! ```ascii
//!   +-----+---------------+   +-----------------------+   +-------------------+
//!   |     |               |   |                       |   |                   |
//!   | SDK | Logger.emit() +---> (Simple)LogProcessor  +--->  LogExporter      |
//!   |     |               |   | (Batch)LogProcessor   +--->  (OTLPExporter)   |
//!   +-----+---------------+   +-----------------------+   +-------------------+
//! ```
//!
//! [`SdkLogger`]: crate::logs::SdkLogger
//! [`SimpleLogProcessor`]: crate::logs::SimpleLogProcessor
//! [`BatchLogProcessor`]: crate::logs::BatchLogProcessor

use crate::error::OTelSdkResult;
use crate::logs::SdkLogRecord;
use std::fmt::Debug;
use std::time::Duration;

/// Hooks a [`SdkLoggerProvider`] calls for every emitted record and at the end
/// of the pipeline's life.
///
/// [`SdkLoggerProvider`]: crate::logs::SdkLoggerProvider
pub trait LogProcessor: Send + Sync + Debug {
    /// Take a finished record. Must not block on I/O. Changes made to the
    /// record are visible to the processors registered after this one.
    fn emit(&self, record: &mut SdkLogRecord);

    /// Export everything buffered so far, within `timeout`.
    fn force_flush(&self, timeout: Option<Duration>) -> OTelSdkResult;

    /// Flush, then shut down the exporter. Records emitted afterwards are
    /// dropped. Calling this a second time returns
    /// [`OTelSdkError::AlreadyShutdown`].
    ///
    /// [`OTelSdkError::AlreadyShutdown`]: crate::error::OTelSdkError::AlreadyShutdown
    fn shutdown(&self, timeout: Option<Duration>) -> OTelSdkResult;
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::error::{OTelSdkError, OTelSdkResult};
    use crate::logs::{LogBatch, LogExporter, LogRecordData};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    /// Exporter double that records each batch and can be slowed down or made
    /// to fail.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct RecordingExporter {
        pub(crate) batches: Arc<Mutex<Vec<Vec<LogRecordData>>>>,
        pub(crate) export_delay: Option<Duration>,
        pub(crate) fail_exports: bool,
        pub(crate) shutdown_calls: Arc<AtomicUsize>,
        pub(crate) flush_calls: Arc<AtomicUsize>,
    }

    impl RecordingExporter {
        pub(crate) fn batch_sizes(&self) -> Vec<usize> {
            self.batches.lock().unwrap().iter().map(Vec::len).collect()
        }

        pub(crate) fn exported_bodies(&self) -> Vec<String> {
            self.batches
                .lock()
                .unwrap()
                .iter()
                .flatten()
                .filter_map(|r| r.body().and_then(|b| b.as_str()).map(str::to_owned))
                .collect()
        }
    }

    impl LogExporter for RecordingExporter {
        fn export(&self, batch: LogBatch<'_>, _timeout: Option<Duration>) -> OTelSdkResult {
            if let Some(delay) = self.export_delay {
                thread::sleep(delay);
            }
            self.batches
                .lock()
                .unwrap()
                .push(batch.iter().cloned().collect());
            if self.fail_exports {
                Err(OTelSdkError::InternalFailure("rejected".into()))
            } else {
                Ok(())
            }
        }

        fn force_flush(&self, _timeout: Option<Duration>) -> OTelSdkResult {
            self.flush_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn shutdown(&self, _timeout: Option<Duration>) -> OTelSdkResult {
            self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
