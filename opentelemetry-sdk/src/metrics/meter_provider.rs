use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use opentelemetry::{otel_debug, otel_info, otel_warn, InstrumentationScope};

use crate::error::{remaining, worst_of, OTelSdkError, OTelSdkResult};
use crate::Resource;

use super::data::ResourceMetrics;
use super::exporter::MetricExporter;
use super::meter::SdkMeter;
use super::pipeline::Pipeline;
use super::view::View;
use super::Temporality;

/// Handles the creation and coordination of [`SdkMeter`]s.
///
/// All meters created by a `SdkMeterProvider` share the same [`Resource`] and
/// views. Metrics are pulled: [`collect`](SdkMeterProvider::collect) returns
/// a snapshot, and [`force_flush`](SdkMeterProvider::force_flush) collects
/// and hands the snapshot to every exporter. This is a clonable handle;
/// dropping the last reference shuts the provider down, exporting one last
/// time.
///
/// ```
/// use opentelemetry::KeyValue;
/// use opentelemetry_sdk::metrics::{InMemoryMetricExporter, SdkMeterProvider};
///
/// let exporter = InMemoryMetricExporter::default();
/// let provider = SdkMeterProvider::builder()
///     .with_exporter(exporter.clone())
///     .build();
/// let requests = provider.meter("http").u64_counter("requests").build();
/// requests.add(1, &[KeyValue::new("route", "/")]);
///
/// provider.shutdown(None).unwrap();
/// assert_eq!(exporter.get_finished_metrics().unwrap().len(), 1);
/// ```
#[derive(Clone)]
pub struct SdkMeterProvider {
    inner: Arc<SdkMeterProviderInner>,
}

impl fmt::Debug for SdkMeterProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkMeterProvider")
            .field("exporters", &self.inner.exporters)
            .field("temporality", &self.inner.pipeline.temporality())
            .field("is_shutdown", &self.inner.is_shutdown)
            .finish()
    }
}

struct SdkMeterProviderInner {
    pipeline: Arc<Pipeline>,
    exporters: Vec<Box<dyn MetricExporter>>,
    is_shutdown: AtomicBool,
}

impl SdkMeterProvider {
    /// Return default [MeterProviderBuilder]
    pub fn builder() -> MeterProviderBuilder {
        MeterProviderBuilder::default()
    }

    /// Get a meter for the library called `name`.
    pub fn meter(&self, name: impl Into<Cow<'static, str>>) -> SdkMeter {
        self.meter_with_scope(InstrumentationScope::builder(name).build())
    }

    /// Get a meter for a fully described instrumentation scope.
    pub fn meter_with_scope(&self, scope: InstrumentationScope) -> SdkMeter {
        if self.inner.is_shutdown.load(Ordering::Relaxed) {
            otel_debug!(
                name: "MeterProvider.NoOpMeterReturned",
                meter_name = scope.name().to_owned()
            );
            return SdkMeter::noop(scope);
        }
        if scope.name().is_empty() {
            otel_warn!(
                name: "MeterProvider.MeterNameEmpty",
                message = "Meter name is empty; consider providing a meaningful name. Meter will function normally and the provided name will be used as-is."
            );
        }
        otel_debug!(
            name: "MeterProvider.NewMeterCreated",
            meter_name = scope.name().to_owned()
        );
        SdkMeter::new(scope, Arc::clone(&self.inner.pipeline))
    }

    /// Snapshot every instrument of every meter.
    ///
    /// Delta streams start a new window with each call, whether it comes from
    /// here, from [`force_flush`](SdkMeterProvider::force_flush) or from
    /// shutdown.
    pub fn collect(&self) -> Result<ResourceMetrics, OTelSdkError> {
        if self.inner.is_shutdown.load(Ordering::Relaxed) {
            return Err(OTelSdkError::AlreadyShutdown);
        }
        Ok(self.inner.pipeline.collect())
    }

    /// Collect and export to every exporter, sharing `timeout` between them.
    pub fn force_flush(&self, timeout: Option<Duration>) -> OTelSdkResult {
        if self.inner.is_shutdown.load(Ordering::Relaxed) {
            return Err(OTelSdkError::AlreadyShutdown);
        }
        self.inner.export_and_flush(timeout)
    }

    /// Export one last time, then shut every exporter down, sharing
    /// `timeout` between them.
    ///
    /// Only the first call has an effect; later calls return
    /// [`OTelSdkError::AlreadyShutdown`].
    pub fn shutdown(&self, timeout: Option<Duration>) -> OTelSdkResult {
        otel_debug!(name: "MeterProvider.ShutdownInvokedByUser");
        if self
            .inner
            .is_shutdown
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.inner.shutdown(timeout)
        } else {
            otel_warn!(
                name: "MeterProvider.Shutdown.AlreadyShutdown",
                message = "Shutdown is being invoked more than once. This is noop, but indicates a potential issue in the application's lifecycle management."
            );
            Err(OTelSdkError::AlreadyShutdown)
        }
    }
}

impl SdkMeterProviderInner {
    fn export_and_flush(&self, timeout: Option<Duration>) -> OTelSdkResult {
        if self.exporters.is_empty() {
            return Ok(());
        }
        let deadline = timeout.map(|t| Instant::now() + t);
        let metrics = self.pipeline.collect();
        let timed_out = || Err(OTelSdkError::Timeout(timeout.unwrap_or_default()));

        let skip_export = metrics.scope_metrics.is_empty();
        if skip_export {
            otel_debug!(name: "MeterProvider.NoMetricsCollected");
        }

        let mut result = Ok(());
        for exporter in &self.exporters {
            if !skip_export {
                let outcome = match remaining(deadline) {
                    Some(Duration::ZERO) => timed_out(),
                    budget => exporter.export(&metrics, budget),
                };
                if let Err(err) = &outcome {
                    otel_debug!(name: "MeterProvider.ExportError", error = format!("{err}"));
                }
                result = worst_of(result, outcome);
            }

            let outcome = match remaining(deadline) {
                Some(Duration::ZERO) => timed_out(),
                budget => exporter.force_flush(budget),
            };
            result = worst_of(result, outcome);
        }
        result
    }

    fn shutdown(&self, timeout: Option<Duration>) -> OTelSdkResult {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut result = self.export_and_flush(timeout);
        for exporter in &self.exporters {
            let outcome = match remaining(deadline) {
                Some(Duration::ZERO) => Err(OTelSdkError::Timeout(timeout.unwrap_or_default())),
                budget => exporter.shutdown(budget),
            };
            if let Err(err) = &outcome {
                otel_debug!(name: "MeterProvider.ShutdownError", error = format!("{err}"));
            }
            result = worst_of(result, outcome);
        }
        result
    }
}

impl Drop for SdkMeterProviderInner {
    fn drop(&mut self) {
        if !self.is_shutdown.swap(true, Ordering::SeqCst) {
            otel_info!(
                name: "MeterProvider.Drop",
                message = "Last reference of MeterProvider dropped, initiating shutdown."
            );
            let _ = self.shutdown(None);
        }
    }
}

/// Configuration options for a [SdkMeterProvider].
#[derive(Default)]
pub struct MeterProviderBuilder {
    resource: Option<Resource>,
    views: Vec<View>,
    exporters: Vec<Box<dyn MetricExporter>>,
    temporality: Option<Temporality>,
}

impl fmt::Debug for MeterProviderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeterProviderBuilder")
            .field("resource", &self.resource)
            .field("views", &self.views)
            .field("exporters", &self.exporters)
            .field("temporality", &self.temporality)
            .finish()
    }
}

impl MeterProviderBuilder {
    /// Associates a [Resource] with a [SdkMeterProvider].
    ///
    /// By default, if this option is not used, the default [Resource] will be used.
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Associates a [View] with a [SdkMeterProvider].
    ///
    /// Views apply to instruments created after the provider is built, in
    /// registration order.
    pub fn with_view(mut self, view: View) -> Self {
        self.views.push(view);
        self
    }

    /// Associates a [MetricExporter] with a [SdkMeterProvider].
    pub fn with_exporter<T: MetricExporter>(mut self, exporter: T) -> Self {
        self.exporters.push(Box::new(exporter));
        self
    }

    /// The [Temporality] of every stream, except up-down counters which are
    /// always cumulative.
    ///
    /// Defaults to the preference of the first exporter, or cumulative.
    pub fn with_temporality(mut self, temporality: Temporality) -> Self {
        self.temporality = Some(temporality);
        self
    }

    /// Construct a new [SdkMeterProvider] with this configuration.
    pub fn build(self) -> SdkMeterProvider {
        let temporality = self
            .temporality
            .or_else(|| self.exporters.first().map(|e| e.temporality()))
            .unwrap_or_default();
        otel_debug!(
            name: "MeterProvider.Building",
            view_count = self.views.len(),
            exporter_count = self.exporters.len()
        );

        SdkMeterProvider {
            inner: Arc::new(SdkMeterProviderInner {
                pipeline: Arc::new(Pipeline::new(
                    self.resource.unwrap_or_default(),
                    self.views,
                    temporality,
                )),
                exporters: self.exporters,
                is_shutdown: AtomicBool::new(false),
            }),
        }
    }
}
