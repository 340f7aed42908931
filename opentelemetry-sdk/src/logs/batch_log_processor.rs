//! # Batch Log Processor
//!
//! The `BatchLogProcessor` buffers emitted records in a bounded queue and
//! exports them in batches from one background thread, so application
//! threads never wait on the network.
//!
//! ```ascii
//!   +-----+---------------+   +-----------------------+   +-------------------+
//!   |     |               |   |                       |   |                   |
//!   | SDK | Logger.emit() +---> (Batch)LogProcessor   +--->  (OTLPExporter)   |
//!   +-----+---------------+   +-----------------------+   +-------------------+
//! ```
//!
//! When the queue is full the *oldest* record is evicted to admit the new one,
//! so under pressure the next export carries the most recent data.

use crate::error::{remaining, worst_of, OTelSdkError, OTelSdkResult};
use crate::logs::{LogBatch, LogExporter, LogProcessor, LogRecordData, SdkLogRecord};
use opentelemetry::{otel_debug, otel_error, otel_warn};
use std::collections::VecDeque;
use std::fmt::{self, Debug, Formatter};
use std::str::FromStr;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use std::{env, thread};
use thiserror::Error;

/// Delay interval between two consecutive exports.
pub(crate) const OTEL_BLRP_SCHEDULE_DELAY: &str = "OTEL_BLRP_SCHEDULE_DELAY";
/// Default delay interval between two consecutive exports.
pub(crate) const OTEL_BLRP_SCHEDULE_DELAY_DEFAULT: Duration = Duration::from_millis(1_000);
/// Maximum allowed time to export data.
pub(crate) const OTEL_BLRP_EXPORT_TIMEOUT: &str = "OTEL_BLRP_EXPORT_TIMEOUT";
/// Default maximum allowed time to export data.
pub(crate) const OTEL_BLRP_EXPORT_TIMEOUT_DEFAULT: Duration = Duration::from_millis(30_000);
/// Maximum queue size.
pub(crate) const OTEL_BLRP_MAX_QUEUE_SIZE: &str = "OTEL_BLRP_MAX_QUEUE_SIZE";
/// Default maximum queue size.
pub(crate) const OTEL_BLRP_MAX_QUEUE_SIZE_DEFAULT: usize = 2_048;
/// Maximum batch size, must be less than or equal to OTEL_BLRP_MAX_QUEUE_SIZE.
pub(crate) const OTEL_BLRP_MAX_EXPORT_BATCH_SIZE: &str = "OTEL_BLRP_MAX_EXPORT_BATCH_SIZE";
/// Default maximum batch size.
pub(crate) const OTEL_BLRP_MAX_EXPORT_BATCH_SIZE_DEFAULT: usize = 512;

/// Invalid batch processor configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BatchConfigError {
    /// The export batch would never fit in the queue.
    #[error("max_export_batch_size ({max_export_batch_size}) must be less than or equal to max_queue_size ({max_queue_size})")]
    BatchLargerThanQueue {
        /// Configured batch size
        max_export_batch_size: usize,
        /// Configured queue size
        max_queue_size: usize,
    },

    /// A size or delay of zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    /// An environment variable held something other than a non-negative integer.
    #[error("invalid value {value:?} for environment variable {name}")]
    InvalidEnvValue {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },
}

#[derive(Debug)]
struct QueueState {
    records: VecDeque<SdkLogRecord>,
    is_shutdown: bool,
    dropped_count: usize,
}

impl QueueState {
    /// Append `record`, evicting the oldest entry when `max_queue_size` is
    /// reached. Returns whether a record was evicted.
    fn push(&mut self, record: SdkLogRecord, max_queue_size: usize) -> bool {
        let evicted = self.records.len() >= max_queue_size;
        if evicted {
            self.records.pop_front();
            self.dropped_count += 1;
        }
        self.records.push_back(record);
        evicted
    }
}

// Lock order: `export_lock` before `state`.
#[derive(Debug)]
struct Shared {
    state: Mutex<QueueState>,
    // Signalled when the queue reaches a batch or the processor shuts down.
    work_available: Condvar,
    // Held from draining the queue until the export returns, so batches reach
    // the exporter in queue order.
    export_lock: Mutex<()>,
    exporter: Box<dyn LogExporter>,
    config: BatchConfig,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_export(&self) -> MutexGuard<'_, ()> {
        self.export_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Caller must hold `export_lock`.
    fn export(&self, records: Vec<SdkLogRecord>, timeout: Option<Duration>) -> OTelSdkResult {
        if records.is_empty() {
            return Ok(());
        }
        let data: Vec<LogRecordData> = records.iter().map(SdkLogRecord::to_log_record_data).collect();
        let result = self.exporter.export(LogBatch::new(&data), timeout);
        if let Err(err) = &result {
            otel_error!(
                name: "BatchLogProcessor.ExportError",
                error = format!("{err}"),
                batch_size = data.len()
            );
        }
        result
    }

    /// Put `records` back at the front of the queue, ahead of anything
    /// emitted meanwhile. Evicts the oldest entries if that overflows.
    fn requeue_front(&self, records: VecDeque<SdkLogRecord>) {
        let mut state = self.lock_state();
        let max = self.config.max_queue_size;
        let overflow = (state.records.len() + records.len()).saturating_sub(max);
        let mut records = records;
        records.drain(..overflow.min(records.len()));
        state.dropped_count += overflow;
        for record in records.into_iter().rev() {
            state.records.push_front(record);
        }
        let excess = state.records.len().saturating_sub(max);
        state.records.drain(..excess);
    }

    /// Export everything currently queued in batches, under one deadline.
    fn flush_all(&self, timeout: Option<Duration>) -> OTelSdkResult {
        let deadline = timeout.map(|t| Instant::now() + t);
        let _export = self.lock_export();
        let mut pending: VecDeque<SdkLogRecord> = std::mem::take(&mut self.lock_state().records);
        let mut result = Ok(());

        while !pending.is_empty() {
            let budget = remaining(deadline);
            if budget == Some(Duration::ZERO) {
                let count = pending.len();
                self.requeue_front(pending);
                otel_debug!(name: "BatchLogProcessor.Flush.Timeout", requeued = count);
                return Err(OTelSdkError::Timeout(timeout.unwrap_or_default()));
            }
            let take = pending.len().min(self.config.max_export_batch_size);
            let batch: Vec<SdkLogRecord> = pending.drain(..take).collect();
            let export_timeout = budget.map_or(self.config.max_export_timeout, |b| {
                b.min(self.config.max_export_timeout)
            });
            result = worst_of(result, self.export(batch, Some(export_timeout)));
        }

        worst_of(result, self.exporter.force_flush(remaining(deadline)))
    }
}

/// A [`LogProcessor`] that exports records in batches from a background thread.
///
/// An export starts when the queue holds `max_export_batch_size` records or
/// `scheduled_delay` has elapsed since the worker last woke, whichever comes
/// first. [`force_flush`] and [`shutdown`] drain the whole queue on the
/// calling thread.
///
/// ```rust
/// use opentelemetry_sdk::logs::{BatchConfigBuilder, BatchLogProcessor, InMemoryLogExporter, SdkLoggerProvider};
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let processor = BatchLogProcessor::builder(InMemoryLogExporter::default())
///     .with_batch_config(
///         BatchConfigBuilder::default()
///             .with_max_queue_size(4096)
///             .with_max_export_batch_size(256)
///             .with_scheduled_delay(Duration::from_millis(500))
///             .build()?,
///     )
///     .build();
///
/// let provider = SdkLoggerProvider::builder()
///     .with_log_processor(processor)
///     .build();
/// # provider.shutdown(None)?;
/// # Ok(())
/// # }
/// ```
///
/// [`force_flush`]: LogProcessor::force_flush
/// [`shutdown`]: LogProcessor::shutdown
pub struct BatchLogProcessor {
    shared: Arc<Shared>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Debug for BatchLogProcessor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchLogProcessor")
            .field("config", &self.shared.config)
            .field("exporter", &self.shared.exporter)
            .finish()
    }
}

impl LogProcessor for BatchLogProcessor {
    fn emit(&self, record: &mut SdkLogRecord) {
        let mut state = self.shared.lock_state();
        if state.is_shutdown {
            return;
        }

        if state.push(record.clone(), self.shared.config.max_queue_size)
            && state.dropped_count == 1
        {
            otel_warn!(
                name: "BatchLogProcessor.BufferFull",
                max_queue_size = self.shared.config.max_queue_size,
                message = "Queue is full, dropping the oldest log records. The total dropped count is reported at shutdown."
            );
        }

        if state.records.len() >= self.shared.config.max_export_batch_size {
            self.shared.work_available.notify_one();
        }
    }

    fn force_flush(&self, timeout: Option<Duration>) -> OTelSdkResult {
        if timeout == Some(Duration::ZERO) {
            return Err(OTelSdkError::Timeout(Duration::ZERO));
        }
        if self.shared.lock_state().is_shutdown {
            otel_debug!(name: "BatchLogProcessor.ForceFlush.AlreadyShutdown");
            return Err(OTelSdkError::AlreadyShutdown);
        }
        self.shared.flush_all(timeout)
    }

    fn shutdown(&self, timeout: Option<Duration>) -> OTelSdkResult {
        let start = Instant::now();
        let dropped = {
            let mut state = self.shared.lock_state();
            if state.is_shutdown {
                otel_warn!(
                    name: "BatchLogProcessor.Shutdown.AlreadyShutdown",
                    message = "Shutdown is being invoked more than once. This is noop, but indicates a potential issue in the application's lifecycle management."
                );
                return Err(OTelSdkError::AlreadyShutdown);
            }
            state.is_shutdown = true;
            state.dropped_count
        };
        self.shared.work_available.notify_all();

        if dropped > 0 {
            otel_warn!(
                name: "BatchLogProcessor.LogsDropped",
                dropped_logs_count = dropped,
                max_queue_size = self.shared.config.max_queue_size
            );
        }

        let deadline = timeout.map(|t| start + t);
        let mut result = if timeout == Some(Duration::ZERO) {
            Err(OTelSdkError::Timeout(Duration::ZERO))
        } else {
            self.shared.flush_all(timeout)
        };

        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                result = worst_of(
                    result,
                    Err(OTelSdkError::InternalFailure(
                        "batch log processor worker panicked".into(),
                    )),
                );
            }
        }

        let exporter_result = match remaining(deadline) {
            Some(Duration::ZERO) => Err(OTelSdkError::Timeout(timeout.unwrap_or_default())),
            budget => self.shared.exporter.shutdown(budget),
        };
        worst_of(result, exporter_result)
    }
}

impl Drop for BatchLogProcessor {
    // Stops the worker of a processor that was never shut down, so the
    // thread and the exporter it holds do not outlive the processor.
    fn drop(&mut self) {
        let handle = self
            .handle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return;
        };
        self.shared.lock_state().is_shutdown = true;
        self.shared.work_available.notify_all();
        if handle.join().is_err() {
            otel_error!(name: "BatchLogProcessor.Drop.WorkerPanicked");
        }
    }
}

impl BatchLogProcessor {
    pub(crate) fn new(exporter: Box<dyn LogExporter>, config: BatchConfig) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                records: VecDeque::with_capacity(config.max_queue_size),
                is_shutdown: false,
                dropped_count: 0,
            }),
            work_available: Condvar::new(),
            export_lock: Mutex::new(()),
            exporter,
            config,
        });

        let worker = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("OpenTelemetry.Logs.BatchProcessor".to_string())
            .spawn(move || run_worker(&worker));
        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                // Records still reach the exporter through force_flush and shutdown.
                otel_error!(
                    name: "BatchLogProcessor.ThreadSpawnFailed",
                    error = format!("{err}")
                );
                None
            }
        };

        BatchLogProcessor {
            shared,
            handle: Mutex::new(handle),
        }
    }

    /// Start building a processor that exports to `exporter`.
    pub fn builder<E>(exporter: E) -> BatchLogProcessorBuilder<E>
    where
        E: LogExporter + 'static,
    {
        BatchLogProcessorBuilder {
            exporter,
            config: None,
        }
    }
}

fn run_worker(shared: &Shared) {
    let config = &shared.config;
    otel_debug!(
        name: "BatchLogProcessor.ThreadStarted",
        interval_in_millisecs = u64::try_from(config.scheduled_delay.as_millis()).unwrap_or(u64::MAX),
        max_export_batch_size = config.max_export_batch_size,
        max_queue_size = config.max_queue_size
    );

    loop {
        {
            let mut state = shared.lock_state();
            let wake_at = Instant::now() + config.scheduled_delay;
            loop {
                if state.is_shutdown {
                    otel_debug!(name: "BatchLogProcessor.ThreadExiting", reason = "ShutdownRequested");
                    return;
                }
                if state.records.len() >= config.max_export_batch_size {
                    otel_debug!(name: "BatchLogProcessor.ExportingDueToBatchSize");
                    break;
                }
                let now = Instant::now();
                if now >= wake_at {
                    break;
                }
                state = shared
                    .work_available
                    .wait_timeout(state, wake_at - now)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            }
        }

        let _export = shared.lock_export();
        let batch: Vec<SdkLogRecord> = {
            let mut state = shared.lock_state();
            let take = state.records.len().min(config.max_export_batch_size);
            state.records.drain(..take).collect()
        };
        // Errors are logged by `export`; the worker keeps going.
        let _ = shared.export(batch, Some(config.max_export_timeout));
    }
}

/// Builder for [`BatchLogProcessor`].
#[derive(Debug)]
pub struct BatchLogProcessorBuilder<E> {
    exporter: E,
    config: Option<BatchConfig>,
}

impl<E> BatchLogProcessorBuilder<E>
where
    E: LogExporter + 'static,
{
    /// Use `config` instead of the defaults and environment.
    pub fn with_batch_config(self, config: BatchConfig) -> Self {
        BatchLogProcessorBuilder {
            config: Some(config),
            ..self
        }
    }

    /// Build the processor and start its worker thread.
    ///
    /// Without an explicit [`BatchConfig`], the configuration comes from the
    /// `OTEL_BLRP_*` environment variables. If those are invalid, a warning is
    /// logged and the defaults are used; call [`BatchConfigBuilder::build`]
    /// yourself to surface the error instead.
    pub fn build(self) -> BatchLogProcessor {
        let config = match self.config {
            Some(config) => config,
            None => BatchConfig::from_env().unwrap_or_else(|err| {
                otel_warn!(
                    name: "BatchLogProcessor.InvalidConfig",
                    error = format!("{err}")
                );
                BatchConfig::default()
            }),
        };
        BatchLogProcessor::new(Box::new(self.exporter), config)
    }
}

/// Batch log processor configuration.
/// Use [`BatchConfigBuilder`] to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Records beyond this count evict the oldest queued record.
    pub(crate) max_queue_size: usize,

    /// Delay between two consecutive exports when the queue stays below a
    /// full batch.
    pub(crate) scheduled_delay: Duration,

    /// Upper bound of records in one export call.
    pub(crate) max_export_batch_size: usize,

    /// Time budget of one export call.
    pub(crate) max_export_timeout: Duration,
}

impl Default for BatchConfig {
    /// The documented defaults, ignoring the environment.
    fn default() -> Self {
        BatchConfig {
            max_queue_size: OTEL_BLRP_MAX_QUEUE_SIZE_DEFAULT,
            scheduled_delay: OTEL_BLRP_SCHEDULE_DELAY_DEFAULT,
            max_export_batch_size: OTEL_BLRP_MAX_EXPORT_BATCH_SIZE_DEFAULT,
            max_export_timeout: OTEL_BLRP_EXPORT_TIMEOUT_DEFAULT,
        }
    }
}

impl BatchConfig {
    /// Defaults overridden by the `OTEL_BLRP_*` environment variables.
    pub fn from_env() -> Result<Self, BatchConfigError> {
        BatchConfigBuilder::default().build()
    }

    /// Maximum number of queued records.
    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    /// Delay between scheduled exports.
    pub fn scheduled_delay(&self) -> Duration {
        self.scheduled_delay
    }

    /// Maximum records per export.
    pub fn max_export_batch_size(&self) -> usize {
        self.max_export_batch_size
    }

    /// Time budget of one export.
    pub fn max_export_timeout(&self) -> Duration {
        self.max_export_timeout
    }
}

/// A builder for [`BatchConfig`].
///
/// Values set on the builder override the `OTEL_BLRP_*` environment
/// variables, which override the defaults.
#[derive(Debug, Default)]
pub struct BatchConfigBuilder {
    max_queue_size: Option<usize>,
    scheduled_delay: Option<Duration>,
    max_export_batch_size: Option<usize>,
    max_export_timeout: Option<Duration>,
}

impl BatchConfigBuilder {
    /// Maximum number of queued records. Default 2048.
    ///
    /// Corresponding environment variable: `OTEL_BLRP_MAX_QUEUE_SIZE`.
    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = Some(max_queue_size);
        self
    }

    /// Delay between two scheduled exports. Default 1000 milliseconds.
    ///
    /// Corresponding environment variable: `OTEL_BLRP_SCHEDULE_DELAY`.
    pub fn with_scheduled_delay(mut self, scheduled_delay: Duration) -> Self {
        self.scheduled_delay = Some(scheduled_delay);
        self
    }

    /// Time budget of one export. Default 30000 milliseconds.
    ///
    /// Corresponding environment variable: `OTEL_BLRP_EXPORT_TIMEOUT`.
    pub fn with_max_export_timeout(mut self, max_export_timeout: Duration) -> Self {
        self.max_export_timeout = Some(max_export_timeout);
        self
    }

    /// Maximum records per export. Default 512; must not exceed the queue size.
    ///
    /// Corresponding environment variable: `OTEL_BLRP_MAX_EXPORT_BATCH_SIZE`.
    pub fn with_max_export_batch_size(mut self, max_export_batch_size: usize) -> Self {
        self.max_export_batch_size = Some(max_export_batch_size);
        self
    }

    /// Build the configuration.
    ///
    /// Fails when `max_export_batch_size` exceeds `max_queue_size`, when either
    /// is zero, or when an environment variable that is not overridden holds
    /// an invalid value.
    pub fn build(self) -> Result<BatchConfig, BatchConfigError> {
        let defaults = BatchConfig::default();

        let max_queue_size = resolve(self.max_queue_size, OTEL_BLRP_MAX_QUEUE_SIZE, defaults.max_queue_size)?;
        let max_export_batch_size = resolve(
            self.max_export_batch_size,
            OTEL_BLRP_MAX_EXPORT_BATCH_SIZE,
            defaults.max_export_batch_size,
        )?;
        let scheduled_delay = match self.scheduled_delay {
            Some(delay) => delay,
            None => env_millis(OTEL_BLRP_SCHEDULE_DELAY)?.unwrap_or(defaults.scheduled_delay),
        };
        let max_export_timeout = match self.max_export_timeout {
            Some(timeout) => timeout,
            None => env_millis(OTEL_BLRP_EXPORT_TIMEOUT)?.unwrap_or(defaults.max_export_timeout),
        };

        if max_queue_size == 0 {
            return Err(BatchConfigError::Zero("max_queue_size"));
        }
        if max_export_batch_size == 0 {
            return Err(BatchConfigError::Zero("max_export_batch_size"));
        }
        if scheduled_delay.is_zero() {
            return Err(BatchConfigError::Zero("scheduled_delay"));
        }
        if max_export_batch_size > max_queue_size {
            return Err(BatchConfigError::BatchLargerThanQueue {
                max_export_batch_size,
                max_queue_size,
            });
        }

        Ok(BatchConfig {
            max_queue_size,
            scheduled_delay,
            max_export_batch_size,
            max_export_timeout,
        })
    }
}

fn env_millis(env_name: &'static str) -> Result<Option<Duration>, BatchConfigError> {
    match env::var(env_name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| BatchConfigError::InvalidEnvValue {
                name: env_name,
                value: raw.clone(),
            }),
        Err(_) => Ok(None),
    }
}

fn resolve<T: FromStr>(
    programmatic: Option<T>,
    env_name: &'static str,
    default: T,
) -> Result<T, BatchConfigError> {
    if let Some(value) = programmatic {
        return Ok(value);
    }
    match env::var(env_name) {
        Ok(raw) => T::from_str(raw.trim()).map_err(|_| BatchConfigError::InvalidEnvValue {
            name: env_name,
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}
