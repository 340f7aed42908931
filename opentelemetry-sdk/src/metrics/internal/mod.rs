//! Aggregators: the per-view accumulators behind a metric stream.
mod histogram;
mod last_value;
mod sum;

use std::fmt;
use std::time::SystemTime;

use crate::metrics::attribute_set::AttributeSet;
use crate::metrics::data::{AggregatedMetrics, MetricData};
use crate::metrics::{Aggregation, InstrumentKind, Temporality};

pub(crate) use histogram::Histogram;
pub(crate) use last_value::LastValue;
pub(crate) use sum::Sum;

/// A numeric measurement type an instrument can record.
pub(crate) trait Number:
    PartialOrd
    + fmt::Debug
    + fmt::Display
    + Clone
    + Copy
    + PartialEq
    + Default
    + Send
    + Sync
    + 'static
{
    /// Addition that wraps at the numeric bounds instead of panicking.
    fn wrapping_add(self, other: Self) -> Self;

    fn into_float(self) -> f64;

    fn into_aggregated(data: MetricData<Self>) -> AggregatedMetrics;
}

impl Number for i64 {
    fn wrapping_add(self, other: Self) -> Self {
        i64::wrapping_add(self, other)
    }

    fn into_float(self) -> f64 {
        // May have precision loss at high values
        self as f64
    }

    fn into_aggregated(data: MetricData<Self>) -> AggregatedMetrics {
        AggregatedMetrics::I64(data)
    }
}

impl Number for u64 {
    fn wrapping_add(self, other: Self) -> Self {
        u64::wrapping_add(self, other)
    }

    fn into_float(self) -> f64 {
        // May have precision loss at high values
        self as f64
    }

    fn into_aggregated(data: MetricData<Self>) -> AggregatedMetrics {
        AggregatedMetrics::U64(data)
    }
}

impl Number for f64 {
    fn wrapping_add(self, other: Self) -> Self {
        self + other
    }

    fn into_float(self) -> f64 {
        self
    }

    fn into_aggregated(data: MetricData<Self>) -> AggregatedMetrics {
        AggregatedMetrics::F64(data)
    }
}

/// Merges measurements keyed by attribute set and materializes them on collect.
///
/// Callers serialize access; the owning stream holds one lock around every
/// `update` and `collect`.
pub(crate) trait Aggregator<T: Number>: Send + Sync + fmt::Debug {
    fn update(&mut self, attributes: &AttributeSet, value: T);

    /// Snapshot the accumulated state. Delta aggregators start over afterwards.
    fn collect(&mut self, start_time: SystemTime, end_time: SystemTime) -> MetricData<T>;
}

/// Build the aggregator for an already resolved aggregation, `None` for
/// [`Aggregation::Drop`].
pub(crate) fn new_aggregator<T: Number>(
    aggregation: &Aggregation,
    kind: InstrumentKind,
    temporality: Temporality,
) -> Option<Box<dyn Aggregator<T>>> {
    match aggregation.resolve(kind) {
        Aggregation::Drop => None,
        Aggregation::Sum => {
            let monotonic = matches!(
                kind,
                InstrumentKind::Counter | InstrumentKind::ObservableCounter | InstrumentKind::Histogram
            );
            Some(Box::new(Sum::new(temporality, monotonic)))
        }
        Aggregation::LastValue => Some(Box::new(LastValue::new(temporality))),
        Aggregation::ExplicitBucketHistogram {
            boundaries,
            record_min_max,
        } => Some(Box::new(Histogram::new(
            temporality,
            boundaries,
            record_min_max,
        ))),
        // `resolve` never returns `Default`.
        Aggregation::Default => None,
    }
}
