//! Collected metric data, as handed to a [`MetricExporter`].
//!
//! [`MetricExporter`]: crate::metrics::MetricExporter

use std::{borrow::Cow, time::SystemTime};

use opentelemetry::{InstrumentationScope, KeyValue};

use crate::Resource;

use super::{InstrumentKind, Temporality};

/// Everything one collection produced for a provider.
#[derive(Debug, Clone)]
pub struct ResourceMetrics {
    /// Resource of the provider.
    pub resource: Resource,
    /// One entry per meter scope with data, in meter creation order.
    pub scope_metrics: Vec<ScopeMetrics>,
}

/// Metrics of one meter.
#[derive(Default, Debug, Clone)]
pub struct ScopeMetrics {
    /// Scope the meter was created with.
    pub scope: InstrumentationScope,
    /// Streams of the meter that had data points.
    pub metrics: Vec<Metric>,
}

/// One stream of an instrument, as seen through one view.
#[derive(Debug, Clone)]
pub struct Metric {
    /// Instrument name, or the view's rename.
    pub name: Cow<'static, str>,
    /// Instrument description, or the view's override.
    pub description: Cow<'static, str>,
    /// Unit of the recorded values.
    pub unit: Cow<'static, str>,
    /// Kind of the recording instrument.
    pub instrument_kind: InstrumentKind,
    /// The data points, tagged by number type.
    pub data: AggregatedMetrics,
}

/// [`MetricData`] tagged with the instrument's number type.
#[derive(Debug, Clone)]
pub enum AggregatedMetrics {
    /// Recorded by an `f64` instrument.
    F64(MetricData<f64>),
    /// Recorded by a `u64` instrument.
    U64(MetricData<u64>),
    /// Recorded by an `i64` instrument.
    I64(MetricData<i64>),
}

/// Output of one aggregation.
#[derive(Debug, Clone)]
pub enum MetricData<T> {
    /// Last recorded value per attribute set.
    Gauge(Gauge<T>),
    /// Arithmetic sum per attribute set.
    Sum(Sum<T>),
    /// Explicit-bucket histogram per attribute set.
    Histogram(Histogram<T>),
}

impl<T> From<Gauge<T>> for MetricData<T> {
    fn from(gauge: Gauge<T>) -> Self {
        MetricData::Gauge(gauge)
    }
}

impl<T> From<Sum<T>> for MetricData<T> {
    fn from(sum: Sum<T>) -> Self {
        MetricData::Sum(sum)
    }
}

impl<T> From<Histogram<T>> for MetricData<T> {
    fn from(histogram: Histogram<T>) -> Self {
        MetricData::Histogram(histogram)
    }
}

/// Value of one attribute set, used by both sums and gauges.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint<T> {
    /// Attributes identifying the series, after any view allowlist.
    pub attributes: Vec<KeyValue>,
    /// Accumulated or last value.
    pub value: T,
}

/// Last values.
#[derive(Debug, Clone)]
pub struct Gauge<T> {
    /// One point per attribute set.
    pub data_points: Vec<DataPoint<T>>,
    /// Start of the window, as for [`Sum::start_time`].
    pub start_time: Option<SystemTime>,
    /// Collection time.
    pub time: SystemTime,
}

/// Sums.
#[derive(Debug, Clone)]
pub struct Sum<T> {
    /// One point per attribute set.
    pub data_points: Vec<DataPoint<T>>,
    /// Start of the window: the provider start for cumulative sums, the
    /// previous collection for delta sums.
    pub start_time: SystemTime,
    /// Collection time.
    pub time: SystemTime,
    /// Whether points reset after every collection.
    pub temporality: Temporality,
    /// Whether the instrument only ever adds non-negative values.
    pub is_monotonic: bool,
}

/// Histograms.
#[derive(Debug, Clone)]
pub struct Histogram<T> {
    /// One point per attribute set.
    pub data_points: Vec<HistogramDataPoint<T>>,
    /// Start of the window, as for [`Sum::start_time`].
    pub start_time: SystemTime,
    /// Collection time.
    pub time: SystemTime,
    /// Whether points reset after every collection.
    pub temporality: Temporality,
}

/// Bucket counts and summary of one attribute set.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramDataPoint<T> {
    /// Attributes identifying the series, after any view allowlist.
    pub attributes: Vec<KeyValue>,
    /// Number of recorded values.
    pub count: u64,
    /// Inclusive upper bounds; the last bucket is unbounded.
    pub bounds: Vec<f64>,
    /// `bounds.len() + 1` counts.
    pub bucket_counts: Vec<u64>,
    /// Smallest value, when min/max recording is on.
    pub min: Option<T>,
    /// Largest value, when min/max recording is on.
    pub max: Option<T>,
    /// Sum of the values, wrapping for integers.
    pub sum: T,
}

impl<T> MetricData<T> {
    /// Number of data points, whatever the aggregation.
    pub fn data_point_count(&self) -> usize {
        match self {
            MetricData::Gauge(gauge) => gauge.data_points.len(),
            MetricData::Sum(sum) => sum.data_points.len(),
            MetricData::Histogram(histogram) => histogram.data_points.len(),
        }
    }
}

impl AggregatedMetrics {
    /// Number of data points, whatever the number type.
    pub fn data_point_count(&self) -> usize {
        match self {
            AggregatedMetrics::F64(data) => data.data_point_count(),
            AggregatedMetrics::U64(data) => data.data_point_count(),
            AggregatedMetrics::I64(data) => data.data_point_count(),
        }
    }
}
