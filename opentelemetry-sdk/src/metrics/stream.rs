use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use opentelemetry::{otel_debug, Key, KeyValue};

use super::attribute_set::AttributeSet;
use super::data::Metric;
use super::instrument::{InstrumentKind, SyncInstrument};
use super::internal::{Aggregator, Number};
use super::Temporality;

/// Everything a pipeline needs to collect a stream without knowing its
/// number type.
pub(crate) trait Collect: Send + Sync {
    fn temporality(&self) -> Temporality;

    fn collect(&self, start_time: SystemTime, end_time: SystemTime) -> Vec<Metric>;
}

/// One output of a stream: the instrument as seen through a single view, or
/// through its default aggregation when no view matched.
pub(crate) struct StreamOutput<T> {
    pub(crate) name: Cow<'static, str>,
    pub(crate) description: Cow<'static, str>,
    pub(crate) allowed_attribute_keys: Option<Arc<HashSet<Key>>>,
    pub(crate) aggregator: Box<dyn Aggregator<T>>,
}

impl<T: Number> fmt::Debug for StreamOutput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOutput")
            .field("name", &self.name)
            .field("aggregator", &self.aggregator)
            .finish()
    }
}

/// The aggregated state of one instrument.
///
/// A single lock guards every output, so a measurement lands in all of them
/// within the same collection window.
pub(crate) struct MetricStream<T> {
    kind: InstrumentKind,
    unit: Cow<'static, str>,
    temporality: Temporality,
    outputs: Mutex<Vec<StreamOutput<T>>>,
}

impl<T: Number> MetricStream<T> {
    pub(crate) fn new(
        kind: InstrumentKind,
        unit: Cow<'static, str>,
        temporality: Temporality,
        outputs: Vec<StreamOutput<T>>,
    ) -> Self {
        MetricStream {
            kind,
            unit,
            temporality,
            outputs: Mutex::new(outputs),
        }
    }

    /// Fold one measurement into every output, each keeping only its allowed
    /// attribute keys.
    pub(crate) fn update(&self, value: T, attributes: &[KeyValue]) {
        let attributes = AttributeSet::from(attributes);
        let mut outputs = self.outputs.lock().unwrap_or_else(PoisonError::into_inner);
        for output in outputs.iter_mut() {
            match &output.allowed_attribute_keys {
                Some(allowed) => output.aggregator.update(&attributes.filter(allowed), value),
                None => output.aggregator.update(&attributes, value),
            }
        }
    }

    fn accepts(&self, value: T) -> bool {
        if value.into_float().is_nan() {
            return false;
        }
        match self.kind {
            InstrumentKind::Counter | InstrumentKind::Histogram => value >= T::default(),
            _ => true,
        }
    }
}

impl<T: Number> SyncInstrument<T> for MetricStream<T> {
    fn measure(&self, value: T, attributes: &[KeyValue]) {
        if !self.accepts(value) {
            otel_debug!(
                name: "MetricStream.MeasurementIgnored",
                value = format!("{value}"),
                reason = "negative or NaN value for this instrument kind"
            );
            return;
        }
        self.update(value, attributes);
    }
}

impl<T: Number> Collect for MetricStream<T> {
    fn temporality(&self) -> Temporality {
        self.temporality
    }

    fn collect(&self, start_time: SystemTime, end_time: SystemTime) -> Vec<Metric> {
        let mut outputs = self.outputs.lock().unwrap_or_else(PoisonError::into_inner);
        outputs
            .iter_mut()
            .map(|output| Metric {
                name: output.name.clone(),
                description: output.description.clone(),
                unit: self.unit.clone(),
                instrument_kind: self.kind,
                data: T::into_aggregated(output.aggregator.collect(start_time, end_time)),
            })
            .collect()
    }
}

impl<T: Number> fmt::Debug for MetricStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricStream")
            .field("kind", &self.kind)
            .field("unit", &self.unit)
            .field("temporality", &self.temporality)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::data::{AggregatedMetrics, MetricData};
    use crate::metrics::internal::new_aggregator;
    use crate::metrics::Aggregation;
    use std::thread;

    fn output(
        name: &'static str,
        aggregation: Aggregation,
        kind: InstrumentKind,
        allowed: Option<&[&'static str]>,
    ) -> StreamOutput<u64> {
        StreamOutput {
            name: name.into(),
            description: "".into(),
            allowed_attribute_keys: allowed
                .map(|keys| Arc::new(keys.iter().map(|k| Key::new(*k)).collect())),
            aggregator: new_aggregator(&aggregation, kind, Temporality::Cumulative)
                .expect("aggregation is not drop"),
        }
    }

    fn sum_points(metric: &Metric) -> Vec<(Vec<KeyValue>, u64)> {
        let AggregatedMetrics::U64(MetricData::Sum(sum)) = &metric.data else {
            panic!("expected a u64 sum, got {:?}", metric.data);
        };
        let mut points: Vec<_> = sum
            .data_points
            .iter()
            .map(|p| (p.attributes.clone(), p.value))
            .collect();
        points.sort_by_key(|(_, value)| *value);
        points
    }

    #[test]
    fn default_output_keeps_all_attributes() {
        let stream = MetricStream::new(
            InstrumentKind::Counter,
            "By".into(),
            Temporality::Cumulative,
            vec![output("bytes", Aggregation::Sum, InstrumentKind::Counter, None)],
        );
        stream.update(1, &[KeyValue::new("a", 1), KeyValue::new("b", 2)]);
        stream.update(2, &[KeyValue::new("b", 2), KeyValue::new("a", 1)]);

        let now = SystemTime::now();
        let metrics = stream.collect(now, now);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].name, "bytes");
        assert_eq!(metrics[0].unit, "By");
        assert_eq!(
            sum_points(&metrics[0]),
            [(vec![KeyValue::new("a", 1), KeyValue::new("b", 2)], 3)]
        );
    }

    #[test]
    fn one_measurement_fans_out_to_every_output() {
        let stream = MetricStream::new(
            InstrumentKind::Counter,
            "".into(),
            Temporality::Cumulative,
            vec![
                output("by_route", Aggregation::Sum, InstrumentKind::Counter, Some(&["route"][..])),
                output("total", Aggregation::Sum, InstrumentKind::Counter, Some(&[][..])),
            ],
        );
        stream.update(1, &[KeyValue::new("route", "/a"), KeyValue::new("code", 200)]);
        stream.update(2, &[KeyValue::new("route", "/b"), KeyValue::new("code", 200)]);
        stream.update(3, &[KeyValue::new("route", "/a"), KeyValue::new("code", 500)]);

        let now = SystemTime::now();
        let metrics = stream.collect(now, now);
        assert_eq!(metrics.len(), 2);
        assert_eq!(
            sum_points(&metrics[0]),
            [
                (vec![KeyValue::new("route", "/b")], 2),
                (vec![KeyValue::new("route", "/a")], 4),
            ]
        );
        assert_eq!(sum_points(&metrics[1]), [(vec![], 6)]);
    }

    #[test]
    fn invalid_measurements_are_ignored() {
        let counter = MetricStream::new(
            InstrumentKind::Counter,
            "".into(),
            Temporality::Cumulative,
            vec![StreamOutput {
                name: "c".into(),
                description: "".into(),
                allowed_attribute_keys: None,
                aggregator: new_aggregator::<f64>(
                    &Aggregation::Sum,
                    InstrumentKind::Counter,
                    Temporality::Cumulative,
                )
                .unwrap(),
            }],
        );
        counter.measure(-1.0, &[]);
        counter.measure(f64::NAN, &[]);
        counter.measure(2.5, &[]);

        let now = SystemTime::now();
        let metrics = counter.collect(now, now);
        let AggregatedMetrics::F64(MetricData::Sum(sum)) = &metrics[0].data else {
            panic!("expected a f64 sum");
        };
        assert_eq!(sum.data_points.len(), 1);
        assert_eq!(sum.data_points[0].value, 2.5);
    }

    #[test]
    fn concurrent_updates_are_all_counted() {
        const THREADS: u64 = 8;
        const UPDATES: u64 = 1_000;

        let stream = Arc::new(MetricStream::new(
            InstrumentKind::Counter,
            "".into(),
            Temporality::Cumulative,
            vec![output("hits", Aggregation::Sum, InstrumentKind::Counter, None)],
        ));

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let stream = Arc::clone(&stream);
                thread::spawn(move || {
                    for _ in 0..UPDATES {
                        stream.update(1, &[KeyValue::new("even", i % 2 == 0)]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let now = SystemTime::now();
        let points = sum_points(&stream.collect(now, now)[0]);
        let total: u64 = points.iter().map(|(_, v)| v).sum();
        assert_eq!(points.len(), 2);
        assert_eq!(total, THREADS * UPDATES);
    }
}
