use std::collections::HashMap;
use std::time::SystemTime;

use crate::metrics::attribute_set::AttributeSet;
use crate::metrics::data::{DataPoint, Gauge, MetricData};
use crate::metrics::Temporality;

use super::{Aggregator, Number};

/// Summarizes a set of measurements as the last one made.
#[derive(Debug)]
pub(crate) struct LastValue<T> {
    values: HashMap<AttributeSet, T>,
    temporality: Temporality,
}

impl<T: Number> LastValue<T> {
    pub(crate) fn new(temporality: Temporality) -> Self {
        LastValue {
            values: HashMap::new(),
            temporality,
        }
    }
}

impl<T: Number> Aggregator<T> for LastValue<T> {
    fn update(&mut self, attributes: &AttributeSet, value: T) {
        match self.values.get_mut(attributes) {
            Some(last) => *last = value,
            None => {
                self.values.insert(attributes.clone(), value);
            }
        }
    }

    fn collect(&mut self, start_time: SystemTime, end_time: SystemTime) -> MetricData<T> {
        let data_points = match self.temporality {
            // Only series updated during the window are reported.
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

        Gauge {
            data_points,
            start_time: Some(start_time),
            time: end_time,
        }
        .into()
    }
}
