use std::collections::HashMap;
use std::time::SystemTime;

use crate::metrics::attribute_set::AttributeSet;
use crate::metrics::data::{self, DataPoint, MetricData};
use crate::metrics::Temporality;

use super::{Aggregator, Number};

/// Summarizes a set of measurements as their arithmetic sum.
#[derive(Debug)]
pub(crate) struct Sum<T> {
    values: HashMap<AttributeSet, T>,
    temporality: Temporality,
    monotonic: bool,
}

impl<T: Number> Sum<T> {
    pub(crate) fn new(temporality: Temporality, monotonic: bool) -> Self {
        Sum {
            values: HashMap::new(),
            temporality,
            monotonic,
        }
    }
}

impl<T: Number> Aggregator<T> for Sum<T> {
    fn update(&mut self, attributes: &AttributeSet, value: T) {
        match self.values.get_mut(attributes) {
            Some(total) => *total = total.wrapping_add(value),
            None => {
                self.values.insert(attributes.clone(), value);
            }
        }
    }

    fn collect(&mut self, start_time: SystemTime, end_time: SystemTime) -> MetricData<T> {
        let data_points = match self.temporality {
            Temporality::Delta => self
                .values
                .drain()
                .map(|(attributes, value)| DataPoint {
                    attributes: attributes.to_vec(),
                    value,
                })
                .collect(),
            _ => self
                .values
                .iter()
                .map(|(attributes, value)| DataPoint {
                    attributes: attributes.to_vec(),
                    value: *value,
                })
                .collect(),
        };

        data::Sum {
            data_points,
            start_time,
            time: end_time,
            temporality: self.temporality,
            is_monotonic: self.monotonic,
        }
        .into()
    }
}
