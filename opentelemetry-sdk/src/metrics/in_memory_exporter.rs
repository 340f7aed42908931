use crate::error::{OTelSdkError, OTelSdkResult};
use crate::metrics::data::ResourceMetrics;
use crate::metrics::exporter::MetricExporter;
use crate::metrics::Temporality;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// An in-memory metrics exporter that stores metrics data in memory.
///
/// This exporter is useful for testing and debugging purposes. Every export
/// appends one [`ResourceMetrics`], retrievable with
/// [`get_finished_metrics`](InMemoryMetricExporter::get_finished_metrics).
/// Clones share the same storage.
///
/// # Example
///
/// ```
/// use opentelemetry::KeyValue;
/// use opentelemetry_sdk::metrics::{InMemoryMetricExporter, SdkMeterProvider};
///
/// let exporter = InMemoryMetricExporter::default();
/// let meter_provider = SdkMeterProvider::builder()
///     .with_exporter(exporter.clone())
///     .build();
///
/// let meter = meter_provider.meter("example");
/// let counter = meter.u64_counter("my_counter").build();
/// counter.add(1, &[KeyValue::new("key", "value")]);
///
/// meter_provider.force_flush(None).unwrap();
///
/// let finished_metrics = exporter.get_finished_metrics().unwrap();
/// assert_eq!(finished_metrics.len(), 1);
/// ```
#[derive(Clone)]
pub struct InMemoryMetricExporter {
    metrics: Arc<Mutex<Vec<ResourceMetrics>>>,
    temporality: Temporality,
    is_shutdown: Arc<AtomicBool>,
}

impl fmt::Debug for InMemoryMetricExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryMetricExporter")
            .field("temporality", &self.temporality)
            .finish()
    }
}

impl Default for InMemoryMetricExporter {
    fn default() -> Self {
        InMemoryMetricExporterBuilder::new().build()
    }
}

/// Builder for [`InMemoryMetricExporter`].
///
/// ```
/// use opentelemetry_sdk::metrics::{InMemoryMetricExporterBuilder, Temporality};
///
/// let exporter = InMemoryMetricExporterBuilder::new()
///     .with_temporality(Temporality::Delta)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct InMemoryMetricExporterBuilder {
    temporality: Option<Temporality>,
}

impl InMemoryMetricExporterBuilder {
    /// Creates a new instance of the `InMemoryMetricExporterBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the [Temporality] reported to the provider.
    pub fn with_temporality(mut self, temporality: Temporality) -> Self {
        self.temporality = Some(temporality);
        self
    }

    /// Creates a new instance of the `InMemoryMetricExporter`.
    pub fn build(self) -> InMemoryMetricExporter {
        InMemoryMetricExporter {
            metrics: Arc::new(Mutex::new(Vec::new())),
            temporality: self.temporality.unwrap_or_default(),
            is_shutdown: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl InMemoryMetricExporter {
    /// Returns every exported `ResourceMetrics`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    pub fn get_finished_metrics(&self) -> Result<Vec<ResourceMetrics>, OTelSdkError> {
        self.metrics
            .lock()
            .map(|metrics| metrics.clone())
            .map_err(|err| OTelSdkError::InternalFailure(format!("Failed to lock metrics: {err}")))
    }

    /// Clears the internal storage of finished metrics.
    pub fn reset(&self) {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Whether `shutdown` was called.
    pub fn is_shutdown_called(&self) -> bool {
        self.is_shutdown.load(Ordering::Relaxed)
    }
}

impl MetricExporter for InMemoryMetricExporter {
    fn export(&self, metrics: &ResourceMetrics, _timeout: Option<Duration>) -> OTelSdkResult {
        if self.is_shutdown_called() {
            return Err(OTelSdkError::AlreadyShutdown);
        }
        self.metrics
            .lock()
            .map(|mut guard| guard.push(metrics.clone()))
            .map_err(|_| OTelSdkError::InternalFailure("Failed to lock metrics".to_string()))
    }

    fn shutdown(&self, _timeout: Option<Duration>) -> OTelSdkResult {
        self.is_shutdown.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn temporality(&self) -> Temporality {
        self.temporality
    }
}
