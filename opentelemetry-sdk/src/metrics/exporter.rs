//! Interfaces for exporting metrics
use std::fmt::Debug;
use std::time::Duration;

use crate::error::OTelSdkResult;

use super::data::ResourceMetrics;
use super::Temporality;

/// Exporter handles the delivery of metric data to external receivers.
///
/// The meter provider collects and calls `export` on every
/// [`force_flush`](super::SdkMeterProvider::force_flush) and once more on
/// shutdown.
pub trait MetricExporter: Send + Sync + Debug + 'static {
    /// Export serializes and transmits metric data to a receiver.
    ///
    /// All retry logic must be contained in this function, bounded by
    /// `timeout`. Errors are combined into the result of the provider call
    /// that triggered the export.
    fn export(&self, metrics: &ResourceMetrics, timeout: Option<Duration>) -> OTelSdkResult;

    /// Flushes any metric data held by an exporter.
    fn force_flush(&self, _timeout: Option<Duration>) -> OTelSdkResult {
        Ok(())
    }

    /// Releases any held computational resources.
    ///
    /// After shutdown, calls to `export` must fail without doing I/O.
    fn shutdown(&self, _timeout: Option<Duration>) -> OTelSdkResult {
        Ok(())
    }

    /// The [Temporality] this exporter prefers, used when the provider was
    /// not given one.
    fn temporality(&self) -> Temporality {
        Temporality::Cumulative
    }
}
