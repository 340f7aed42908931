use super::{BatchLogProcessor, LogProcessor, LogRecordLimits, SdkLogger, SimpleLogProcessor};
use crate::error::{remaining, worst_of, OTelSdkError, OTelSdkResult};
use crate::logs::LogExporter;
use crate::Resource;
use opentelemetry::{otel_debug, otel_info, otel_warn, InstrumentationScope};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

// a no-op logger provider used as placeholder when the provider is shutdown
static NOOP_LOGGER_PROVIDER: OnceLock<SdkLoggerProvider> = OnceLock::new();

#[inline]
fn noop_logger_provider() -> &'static SdkLoggerProvider {
    NOOP_LOGGER_PROVIDER.get_or_init(|| SdkLoggerProvider {
        inner: Arc::new(LoggerProviderInner {
            processors: Vec::new(),
            resource: Resource::empty(),
            limits: LogRecordLimits::new(0, None),
            scopes: Mutex::new(HashMap::new()),
            is_shutdown: AtomicBool::new(true),
        }),
    })
}

/// Handles the creation and coordination of [`SdkLogger`]s.
///
/// All loggers created by a `SdkLoggerProvider` share the same [`Resource`]
/// and attribute limits, and their records flow through the configured
/// processors in registration order. This is a clonable handle; cloning it
/// creates a new reference, not a new provider. Dropping the last reference
/// shuts the provider down, flushing what the processors still hold.
///
/// ```
/// use opentelemetry_sdk::logs::{InMemoryLogExporter, SdkLoggerProvider};
/// use opentelemetry_sdk::Resource;
///
/// let provider = SdkLoggerProvider::builder()
///     .with_resource(Resource::builder().with_service_name("checkout").build())
///     .with_simple_exporter(InMemoryLogExporter::default())
///     .build();
/// let logger = provider.logger("checkout.orders");
/// logger.emit(logger.create_log_record());
/// provider.shutdown(None).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct SdkLoggerProvider {
    inner: Arc<LoggerProviderInner>,
}

type ScopeKey = (Cow<'static, str>, Option<Cow<'static, str>>);

impl SdkLoggerProvider {
    /// Create a new `SdkLoggerProvider` builder.
    pub fn builder() -> LoggerProviderBuilder {
        LoggerProviderBuilder::default()
    }

    /// Get a logger for the library called `name`.
    pub fn logger(&self, name: impl Into<Cow<'static, str>>) -> SdkLogger {
        self.logger_with_scope(InstrumentationScope::builder(name).build())
    }

    /// Get a logger for a fully described instrumentation scope.
    ///
    /// Loggers asked for with the same name and version share one scope; the
    /// attributes and schema URL of the first request win.
    pub fn logger_with_scope(&self, scope: InstrumentationScope) -> SdkLogger {
        // If the provider is shutdown, new logger will refer a no-op logger provider.
        if self.inner.is_shutdown.load(Ordering::Relaxed) {
            otel_debug!(
                name: "LoggerProvider.NoOpLoggerReturned",
                logger_name = scope.name().to_owned()
            );
            return SdkLogger::new(Arc::new(scope), noop_logger_provider().clone());
        }
        if scope.name().is_empty() {
            otel_warn!(
                name: "LoggerProvider.LoggerNameEmpty",
                message = "Logger name is empty; consider providing a meaningful name. Logger will function normally and the provided name will be used as-is."
            );
        }

        let key: ScopeKey = (
            Cow::Owned(scope.name().to_owned()),
            scope.version().map(|v| Cow::Owned(v.to_owned())),
        );
        let scope = {
            let mut scopes = self
                .inner
                .scopes
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(scopes.entry(key).or_insert_with(|| Arc::new(scope)))
        };
        otel_debug!(
            name: "LoggerProvider.NewLoggerReturned",
            logger_name = scope.name().to_owned()
        );
        SdkLogger::new(scope, self.clone())
    }

    pub(crate) fn log_processors(&self) -> &[Box<dyn LogProcessor>] {
        &self.inner.processors
    }

    pub(crate) fn resource(&self) -> &Resource {
        &self.inner.resource
    }

    pub(crate) fn limits(&self) -> &LogRecordLimits {
        &self.inner.limits
    }

    /// Flush all processors, sharing `timeout` between them.
    ///
    /// Succeeds without doing anything once the provider is shut down.
    pub fn force_flush(&self, timeout: Option<Duration>) -> OTelSdkResult {
        if self.inner.is_shutdown.load(Ordering::Relaxed) {
            return Ok(());
        }
        let deadline = timeout.map(|t| Instant::now() + t);
        self.log_processors()
            .iter()
            .fold(Ok(()), |result, processor| {
                let outcome = match remaining(deadline) {
                    Some(Duration::ZERO) => Err(OTelSdkError::Timeout(timeout.unwrap_or_default())),
                    budget => processor.force_flush(budget),
                };
                worst_of(result, outcome)
            })
    }

    /// Shut down all processors, sharing `timeout` between them.
    ///
    /// Only the first call has an effect; later calls return
    /// [`OTelSdkError::AlreadyShutdown`].
    pub fn shutdown(&self, timeout: Option<Duration>) -> OTelSdkResult {
        otel_debug!(name: "LoggerProvider.ShutdownInvokedByUser");
        if self
            .inner
            .is_shutdown
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.inner.shutdown(timeout)
        } else {
            otel_warn!(
                name: "LoggerProvider.Shutdown.AlreadyShutdown",
                message = "Shutdown is being invoked more than once. This is noop, but indicates a potential issue in the application's lifecycle management."
            );
            Err(OTelSdkError::AlreadyShutdown)
        }
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.inner.is_shutdown.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct LoggerProviderInner {
    processors: Vec<Box<dyn LogProcessor>>,
    resource: Resource,
    limits: LogRecordLimits,
    scopes: Mutex<HashMap<ScopeKey, Arc<InstrumentationScope>>>,
    is_shutdown: AtomicBool,
}

impl LoggerProviderInner {
    fn shutdown(&self, timeout: Option<Duration>) -> OTelSdkResult {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut result = Ok(());
        for processor in &self.processors {
            let outcome = match remaining(deadline) {
                Some(Duration::ZERO) => Err(OTelSdkError::Timeout(timeout.unwrap_or_default())),
                budget => processor.shutdown(budget),
            };
            if let Err(err) = &outcome {
                // Also returned to the caller, or non-actionable when shutdown runs from Drop.
                otel_debug!(name: "LoggerProvider.ShutdownError", error = format!("{err}"));
            }
            result = worst_of(result, outcome);
        }
        result
    }
}

impl Drop for LoggerProviderInner {
    fn drop(&mut self) {
        if !self.is_shutdown.swap(true, Ordering::SeqCst) {
            otel_info!(
                name: "LoggerProvider.Drop",
                message = "Last reference of LoggerProvider dropped, initiating shutdown."
            );
            let _ = self.shutdown(None);
        }
    }
}

/// Builder for [`SdkLoggerProvider`].
#[derive(Debug, Default)]
pub struct LoggerProviderBuilder {
    processors: Vec<Box<dyn LogProcessor>>,
    resource: Option<Resource>,
    limits: Option<LogRecordLimits>,
}

impl LoggerProviderBuilder {
    /// Adds a [SimpleLogProcessor] with the given exporter to the pipeline.
    ///
    /// Processors are invoked in the order they are added.
    pub fn with_simple_exporter<T: LogExporter + 'static>(self, exporter: T) -> Self {
        self.with_log_processor(SimpleLogProcessor::new(exporter))
    }

    /// Adds a [BatchLogProcessor] with the given exporter to the pipeline,
    /// configured from the environment.
    ///
    /// Processors are invoked in the order they are added.
    pub fn with_batch_exporter<T: LogExporter + 'static>(self, exporter: T) -> Self {
        let batch = BatchLogProcessor::builder(exporter).build();
        self.with_log_processor(batch)
    }

    /// Adds a custom [LogProcessor] to the pipeline.
    ///
    /// Processors are invoked in the order they are added.
    pub fn with_log_processor<T: LogProcessor + 'static>(self, processor: T) -> Self {
        let mut processors = self.processors;
        processors.push(Box::new(processor));

        LoggerProviderBuilder { processors, ..self }
    }

    /// The `Resource` to be associated with this provider.
    pub fn with_resource(self, resource: Resource) -> Self {
        LoggerProviderBuilder {
            resource: Some(resource),
            ..self
        }
    }

    /// Attribute limits applied to every record. Defaults come from the
    /// `OTEL_LOGRECORD_ATTRIBUTE_*` environment variables.
    pub fn with_log_record_limits(self, limits: LogRecordLimits) -> Self {
        LoggerProviderBuilder {
            limits: Some(limits),
            ..self
        }
    }

    /// Create a new provider from this configuration.
    pub fn build(self) -> SdkLoggerProvider {
        let provider = SdkLoggerProvider {
            inner: Arc::new(LoggerProviderInner {
                processors: self.processors,
                resource: self.resource.unwrap_or_default(),
                limits: self.limits.unwrap_or_default(),
                scopes: Mutex::new(HashMap::new()),
                is_shutdown: AtomicBool::new(false),
            }),
        };

        otel_debug!(
            name: "LoggerProvider.Built",
            processor_count = provider.log_processors().len()
        );
        provider
    }
}
