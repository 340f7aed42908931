//! Collected metrics into `ExportMetricsServiceRequest`.
use crate::collector::metrics::v1::ExportMetricsServiceRequest;
use crate::metrics::v1::{
    metric::Data as ProtoMetricData, number_data_point, AggregationTemporality,
    Gauge as ProtoGauge, Histogram as ProtoHistogram,
    HistogramDataPoint as ProtoHistogramDataPoint, Metric as ProtoMetric, NumberDataPoint,
    ResourceMetrics as ProtoResourceMetrics, ScopeMetrics as ProtoScopeMetrics,
    Sum as ProtoSum,
};
use crate::transform::common::{to_nanos, Attributes};
use opentelemetry_sdk::metrics::data::{
    AggregatedMetrics, Gauge, Histogram, Metric, MetricData, ResourceMetrics, ScopeMetrics, Sum,
};
use opentelemetry_sdk::metrics::Temporality;

/// A measurement type as it is written in a data point.
pub trait ToProtoNumber: Copy {
    /// The value of a number data point.
    fn to_point_value(self) -> number_data_point::Value;

    /// The value as a double, for histogram sums and extremes.
    fn to_double(self) -> f64;
}

impl ToProtoNumber for u64 {
    fn to_point_value(self) -> number_data_point::Value {
        number_data_point::Value::AsInt(i64::try_from(self).unwrap_or(i64::MAX))
    }

    fn to_double(self) -> f64 {
        self as f64
    }
}

impl ToProtoNumber for i64 {
    fn to_point_value(self) -> number_data_point::Value {
        number_data_point::Value::AsInt(self)
    }

    fn to_double(self) -> f64 {
        self as f64
    }
}

impl ToProtoNumber for f64 {
    fn to_point_value(self) -> number_data_point::Value {
        number_data_point::Value::AsDouble(self)
    }

    fn to_double(self) -> f64 {
        self
    }
}

impl From<Temporality> for AggregationTemporality {
    fn from(temporality: Temporality) -> Self {
        match temporality {
            Temporality::Cumulative => AggregationTemporality::Cumulative,
            Temporality::Delta => AggregationTemporality::Delta,
        }
    }
}

impl From<&ResourceMetrics> for ExportMetricsServiceRequest {
    fn from(rm: &ResourceMetrics) -> Self {
        ExportMetricsServiceRequest {
            resource_metrics: vec![ProtoResourceMetrics {
                resource: Some((&rm.resource).into()),
                scope_metrics: rm.scope_metrics.iter().map(Into::into).collect(),
                schema_url: rm
                    .resource
                    .schema_url()
                    .map(Into::into)
                    .unwrap_or_default(),
            }],
        }
    }
}

impl From<&ScopeMetrics> for ProtoScopeMetrics {
    fn from(sm: &ScopeMetrics) -> Self {
        ProtoScopeMetrics {
            scope: Some((&sm.scope).into()),
            metrics: sm.metrics.iter().map(Into::into).collect(),
            schema_url: sm.scope.schema_url().map(ToOwned::to_owned).unwrap_or_default(),
        }
    }
}

impl From<&Metric> for ProtoMetric {
    fn from(metric: &Metric) -> Self {
        ProtoMetric {
            name: metric.name.to_string(),
            description: metric.description.to_string(),
            unit: metric.unit.to_string(),
            metadata: vec![],
            data: Some(match &metric.data {
                AggregatedMetrics::F64(data) => data.into(),
                AggregatedMetrics::U64(data) => data.into(),
                AggregatedMetrics::I64(data) => data.into(),
            }),
        }
    }
}

impl<T: ToProtoNumber> From<&MetricData<T>> for ProtoMetricData {
    fn from(data: &MetricData<T>) -> Self {
        match data {
            MetricData::Gauge(gauge) => ProtoMetricData::Gauge(gauge.into()),
            MetricData::Sum(sum) => ProtoMetricData::Sum(sum.into()),
            MetricData::Histogram(hist) => ProtoMetricData::Histogram(hist.into()),
        }
    }
}

impl<T: ToProtoNumber> From<&Gauge<T>> for ProtoGauge {
    fn from(gauge: &Gauge<T>) -> Self {
        ProtoGauge {
            data_points: gauge
                .data_points
                .iter()
                .map(|dp| NumberDataPoint {
                    attributes: Attributes::from(dp.attributes.as_slice()).0,
                    start_time_unix_nano: gauge.start_time.map(to_nanos).unwrap_or_default(),
                    time_unix_nano: to_nanos(gauge.time),
                    flags: 0,
                    value: Some(dp.value.to_point_value()),
                })
                .collect(),
        }
    }
}

impl<T: ToProtoNumber> From<&Sum<T>> for ProtoSum {
    fn from(sum: &Sum<T>) -> Self {
        ProtoSum {
            data_points: sum
                .data_points
                .iter()
                .map(|dp| NumberDataPoint {
                    attributes: Attributes::from(dp.attributes.as_slice()).0,
                    start_time_unix_nano: to_nanos(sum.start_time),
                    time_unix_nano: to_nanos(sum.time),
                    flags: 0,
                    value: Some(dp.value.to_point_value()),
                })
                .collect(),
            aggregation_temporality: AggregationTemporality::from(sum.temporality).into(),
            is_monotonic: sum.is_monotonic,
        }
    }
}

impl<T: ToProtoNumber> From<&Histogram<T>> for ProtoHistogram {
    fn from(hist: &Histogram<T>) -> Self {
        ProtoHistogram {
            data_points: hist
                .data_points
                .iter()
                .map(|dp| ProtoHistogramDataPoint {
                    attributes: Attributes::from(dp.attributes.as_slice()).0,
                    start_time_unix_nano: to_nanos(hist.start_time),
                    time_unix_nano: to_nanos(hist.time),
                    count: dp.count,
                    sum: Some(dp.sum.to_double()),
                    bucket_counts: dp.bucket_counts.clone(),
                    explicit_bounds: dp.bounds.clone(),
                    flags: 0,
                    min: dp.min.map(ToProtoNumber::to_double),
                    max: dp.max.map(ToProtoNumber::to_double),
                })
                .collect(),
            aggregation_temporality: AggregationTemporality::from(hist.temporality).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use opentelemetry_sdk::Resource;

    fn export_request(record: impl FnOnce(&SdkMeterProvider)) -> ExportMetricsServiceRequest {
        let provider = SdkMeterProvider::builder()
            .with_resource(Resource::builder_empty().with_service_name("svc").build())
            .with_temporality(Temporality::Delta)
            .build();
        record(&provider);
        let collected = provider.collect().expect("provider is running");
        (&collected).into()
    }

    #[test]
    fn sums_and_histograms_are_encoded() {
        let request = export_request(|provider| {
            let meter = provider.meter("shop");
            let counter = meter.u64_counter("orders").with_unit("{order}").build();
            counter.add(3, &[KeyValue::new("region", "eu")]);
            let latency = meter
                .f64_histogram("latency")
                .with_boundaries(vec![1.0, 10.0])
                .build();
            latency.record(0.5, &[]);
            latency.record(12.0, &[]);
        });

        let rm = &request.resource_metrics[0];
        assert_eq!(rm.scope_metrics.len(), 1);
        let scope = &rm.scope_metrics[0];
        assert_eq!(scope.scope.as_ref().unwrap().name, "shop");

        let orders = &scope.metrics[0];
        assert_eq!(orders.unit, "{order}");
        let Some(ProtoMetricData::Sum(sum)) = &orders.data else {
            panic!("expected a sum");
        };
        assert!(sum.is_monotonic);
        assert_eq!(
            sum.aggregation_temporality,
            AggregationTemporality::Delta as i32
        );
        assert_eq!(
            sum.data_points[0].value,
            Some(number_data_point::Value::AsInt(3))
        );
        assert!(sum.data_points[0].start_time_unix_nano <= sum.data_points[0].time_unix_nano);

        let Some(ProtoMetricData::Histogram(hist)) = &scope.metrics[1].data else {
            panic!("expected a histogram");
        };
        let point = &hist.data_points[0];
        assert_eq!(point.count, 2);
        assert_eq!(point.sum, Some(12.5));
        assert_eq!(point.explicit_bounds, [1.0, 10.0]);
        assert_eq!(point.bucket_counts, [1, 0, 1]);
        assert_eq!(point.min, Some(0.5));
        assert_eq!(point.max, Some(12.0));
    }

    #[test]
    fn gauges_keep_the_last_value() {
        let request = export_request(|provider| {
            let gauge = provider.meter("shop").i64_gauge("queue.depth").build();
            gauge.record(7, &[]);
            gauge.record(-2, &[]);
        });

        let metric = &request.resource_metrics[0].scope_metrics[0].metrics[0];
        let Some(ProtoMetricData::Gauge(gauge)) = &metric.data else {
            panic!("expected a gauge");
        };
        assert_eq!(
            gauge.data_points[0].value,
            Some(number_data_point::Value::AsInt(-2))
        );
    }

    #[test]
    fn large_unsigned_values_saturate() {
        assert_eq!(
            u64::MAX.to_point_value(),
            number_data_point::Value::AsInt(i64::MAX)
        );
    }
}
