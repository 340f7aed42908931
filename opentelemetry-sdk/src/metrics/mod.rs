//! The crust of the OpenTelemetry metrics SDK.
//!
//! ## Configuration
//!
//! The metrics SDK configuration is stored with each [SdkMeterProvider].
//! Configuration for [Resource]s, [View]s, the preferred [Temporality] and
//! the [MetricExporter]s receiving collected data can be specified.
//!
//! ### Example
//!
//! ```
//! use opentelemetry::KeyValue;
//! use opentelemetry_sdk::{metrics::SdkMeterProvider, Resource};
//!
//! // Generate SDK configuration, resource, views, etc
//! let resource = Resource::builder().build(); // default attributes about the current process
//!
//! // Create a meter provider with the desired config
//! let meter_provider = SdkMeterProvider::builder().with_resource(resource).build();
//!
//! // Use the meter provider to create meter instances
//! let meter = meter_provider.meter("my_app");
//!
//! // Create instruments scoped to the meter
//! let counter = meter
//!     .u64_counter("power_consumption")
//!     .with_unit("kWh")
//!     .build();
//!
//! // use instruments to record measurements
//! counter.add(10, &[KeyValue::new("rate", "standard")]);
//!
//! // shutdown the provider at the end of the application to ensure any metrics not yet
//! // exported are flushed.
//! meter_provider.shutdown(None).unwrap();
//! ```
//!
//! [Resource]: crate::Resource

pub(crate) mod aggregation;
pub(crate) mod attribute_set;
pub mod data;
mod error;
pub mod exporter;
mod in_memory_exporter;
pub(crate) mod instrument;
pub(crate) mod internal;
mod meter;
mod meter_provider;
mod pipeline;
mod stream;
mod view;

pub use aggregation::Aggregation;
pub use error::{MetricError, MetricResult};
pub use exporter::MetricExporter;
pub use in_memory_exporter::{InMemoryMetricExporter, InMemoryMetricExporterBuilder};
pub use instrument::{
    Counter, Gauge, Histogram, HistogramBuilder, InstrumentBuilder, InstrumentKind,
    UpDownCounter,
};
pub use meter::SdkMeter;
pub use meter_provider::{MeterProviderBuilder, SdkMeterProvider};
pub use view::{View, ViewBuilder};

/// Defines the window that an aggregation was calculated over.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum Temporality {
    /// A measurement interval that continues to expand forward in time from a
    /// starting point.
    ///
    /// New measurements are added to all previous measurements since a start time.
    #[default]
    Cumulative,

    /// A measurement interval that resets each cycle.
    ///
    /// Measurements from one cycle are recorded independently, measurements from
    /// other cycles do not affect them.
    Delta,
}
