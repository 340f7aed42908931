use std::collections::HashMap;
use std::time::SystemTime;

use crate::metrics::attribute_set::AttributeSet;
use crate::metrics::data::{self, HistogramDataPoint, MetricData};
use crate::metrics::Temporality;

use super::{Aggregator, Number};

#[derive(Debug, Clone)]
struct Buckets<T> {
    counts: Vec<u64>,
    count: u64,
    total: T,
    min: T,
    max: T,
}

impl<T: Number> Buckets<T> {
    fn new(size: usize, first: T) -> Self {
        Buckets {
            counts: vec![0; size],
            count: 0,
            total: T::default(),
            min: first,
            max: first,
        }
    }

    fn record(&mut self, index: usize, value: T) {
        self.counts[index] = self.counts[index].wrapping_add(1);
        self.count = self.count.wrapping_add(1);
        self.total = self.total.wrapping_add(value);
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }
}

/// Summarizes a set of measurements as a histogram with explicitly defined
/// buckets.
#[derive(Debug)]
pub(crate) struct Histogram<T> {
    values: HashMap<AttributeSet, Buckets<T>>,
    bounds: Vec<f64>,
    record_min_max: bool,
    temporality: Temporality,
}

impl<T: Number> Histogram<T> {
    pub(crate) fn new(temporality: Temporality, bounds: Vec<f64>, record_min_max: bool) -> Self {
        Histogram {
            values: HashMap::new(),
            bounds,
            record_min_max,
            temporality,
        }
    }

    fn data_point(&self, attributes: &AttributeSet, buckets: &Buckets<T>) -> HistogramDataPoint<T> {
        HistogramDataPoint {
            attributes: attributes.to_vec(),
            count: buckets.count,
            bounds: self.bounds.clone(),
            bucket_counts: buckets.counts.clone(),
            min: self.record_min_max.then_some(buckets.min),
            max: self.record_min_max.then_some(buckets.max),
            sum: buckets.total,
        }
    }
}

impl<T: Number> Aggregator<T> for Histogram<T> {
    fn update(&mut self, attributes: &AttributeSet, value: T) {
        let f = value.into_float();
        // Bucket i covers (bounds[i-1], bounds[i]]; the last one is unbounded.
        let index = self.bounds.partition_point(|&x| x < f);
        let size = self.bounds.len() + 1;
        match self.values.get_mut(attributes) {
            Some(buckets) => buckets.record(index, value),
            None => {
                let mut buckets = Buckets::new(size, value);
                buckets.record(index, value);
                self.values.insert(attributes.clone(), buckets);
            }
        }
    }

    fn collect(&mut self, start_time: SystemTime, end_time: SystemTime) -> MetricData<T> {
        let data_points = self
            .values
            .iter()
            .map(|(attributes, buckets)| self.data_point(attributes, buckets))
            .collect();
        if self.temporality == Temporality::Delta {
            self.values.clear();
        }

        data::Histogram {
            data_points,
            start_time,
            time: end_time,
            temporality: self.temporality,
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::aggregation::DEFAULT_HISTOGRAM_BOUNDARIES;
    use rstest::rstest;

    fn single_point(data: MetricData<f64>) -> HistogramDataPoint<f64> {
        let MetricData::Histogram(mut histogram) = data else {
            unreachable!("histogram aggregator produced another aggregation")
        };
        assert_eq!(histogram.data_points.len(), 1);
        histogram.data_points.remove(0)
    }

    #[rstest]
    #[case(-1.0, 0)]
    #[case(0.0, 0)]
    #[case(0.5, 1)]
    #[case(5.0, 1)]
    #[case(5.1, 2)]
    #[case(10000.0, 14)]
    #[case(10000.1, 15)]
    fn bucket_boundaries_are_inclusive_upper(#[case] value: f64, #[case] bucket: usize) {
        let mut histogram =
            Histogram::<f64>::new(Temporality::Cumulative, DEFAULT_HISTOGRAM_BOUNDARIES.to_vec(), true);
        histogram.update(&AttributeSet::default(), value);

        let now = SystemTime::now();
        let point = single_point(histogram.collect(now, now));
        assert_eq!(point.bucket_counts.len(), DEFAULT_HISTOGRAM_BOUNDARIES.len() + 1);
        assert_eq!(point.bucket_counts[bucket], 1);
        assert_eq!(point.bucket_counts.iter().sum::<u64>(), 1);
    }

    #[test]
    fn tracks_count_sum_min_max() {
        let mut histogram = Histogram::<f64>::new(Temporality::Delta, vec![1.0, 10.0], true);
        let attrs = AttributeSet::default();
        for value in [3.0, 0.5, 20.0] {
            histogram.update(&attrs, value);
        }

        let now = SystemTime::now();
        let point = single_point(histogram.collect(now, now));
        assert_eq!(point.count, 3);
        assert_eq!(point.sum, 23.5);
        assert_eq!(point.min, Some(0.5));
        assert_eq!(point.max, Some(20.0));
        assert_eq!(point.bucket_counts, [1, 1, 1]);

        let MetricData::Histogram(empty) = histogram.collect(now, now) else {
            unreachable!()
        };
        assert!(empty.data_points.is_empty());
    }

    #[test]
    fn sum_wraps_instead_of_panicking() {
        let mut histogram = Histogram::<u64>::new(Temporality::Cumulative, vec![10.0], true);
        let attrs = AttributeSet::default();
        histogram.update(&attrs, u64::MAX);
        histogram.update(&attrs, 3);

        let now = SystemTime::now();
        let MetricData::Histogram(mut data) = histogram.collect(now, now) else {
            unreachable!("histogram aggregator produced another aggregation")
        };
        let point = data.data_points.remove(0);
        assert_eq!(point.count, 2);
        assert_eq!(point.sum, 2);
        assert_eq!(point.min, Some(3));
        assert_eq!(point.max, Some(u64::MAX));
        assert_eq!(point.bucket_counts, [1, 1]);
    }

    #[test]
    fn min_max_can_be_disabled() {
        let mut histogram = Histogram::<f64>::new(Temporality::Cumulative, vec![1.0], false);
        histogram.update(&AttributeSet::default(), 2.0);
        let now = SystemTime::now();
        let point = single_point(histogram.collect(now, now));
        assert_eq!(point.min, None);
        assert_eq!(point.max, None);
    }
}
