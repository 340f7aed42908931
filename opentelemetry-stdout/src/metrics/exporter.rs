use chrono::{DateTime, Utc};
use core::fmt;
use opentelemetry::KeyValue;
use opentelemetry_sdk::error::{OTelSdkError, OTelSdkResult};
use opentelemetry_sdk::metrics::data::{
    AggregatedMetrics, Gauge, Histogram, MetricData, ResourceMetrics, ScopeMetrics, Sum,
};
use opentelemetry_sdk::metrics::Temporality;
use std::fmt::{Debug, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

/// An OpenTelemetry exporter that writes to stdout on export.
pub struct MetricExporter {
    is_shutdown: AtomicBool,
    temporality: Temporality,
}

impl MetricExporter {
    /// Create a builder to configure this exporter.
    pub fn builder() -> MetricExporterBuilder {
        MetricExporterBuilder::default()
    }
}

impl Default for MetricExporter {
    fn default() -> Self {
        MetricExporterBuilder::default().build()
    }
}

impl fmt::Debug for MetricExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MetricExporter")
    }
}

impl opentelemetry_sdk::metrics::MetricExporter for MetricExporter {
    /// Write Metrics to stdout
    fn export(&self, metrics: &ResourceMetrics, _timeout: Option<Duration>) -> OTelSdkResult {
        if self.is_shutdown.load(Ordering::SeqCst) {
            return Err(OTelSdkError::AlreadyShutdown);
        }
        let mut out = String::new();
        write_resource_metrics(&mut out, metrics)
            .map_err(|e| OTelSdkError::InternalFailure(e.to_string()))?;
        print!("{out}");
        Ok(())
    }

    fn force_flush(&self, _timeout: Option<Duration>) -> OTelSdkResult {
        // exporter holds no state, nothing to flush
        Ok(())
    }

    fn shutdown(&self, _timeout: Option<Duration>) -> OTelSdkResult {
        self.is_shutdown.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn temporality(&self) -> Temporality {
        self.temporality
    }
}

fn format_time(time: SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn write_resource_metrics(out: &mut impl Write, metrics: &ResourceMetrics) -> fmt::Result {
    writeln!(out, "Metrics")?;
    writeln!(out, "Resource")?;
    if let Some(schema_url) = metrics.resource.schema_url() {
        writeln!(out, "\tResource SchemaUrl: {:?}", schema_url)?;
    }
    for (k, v) in metrics.resource.iter() {
        writeln!(out, "\t ->  {}={:?}", k, v)?;
    }
    for (i, scope_metrics) in metrics.scope_metrics.iter().enumerate() {
        write_scope_metrics(out, i, scope_metrics)?;
    }
    Ok(())
}

fn write_scope_metrics(out: &mut impl Write, index: usize, metrics: &ScopeMetrics) -> fmt::Result {
    writeln!(out, "\tInstrumentation Scope #{}", index)?;
    writeln!(out, "\t\tName         : {}", metrics.scope.name())?;
    if let Some(version) = metrics.scope.version() {
        writeln!(out, "\t\tVersion  : {:?}", version)?;
    }
    if let Some(schema_url) = metrics.scope.schema_url() {
        writeln!(out, "\t\tSchemaUrl: {:?}", schema_url)?;
    }
    for kv in metrics.scope.attributes() {
        writeln!(out, "\t\t\t ->  {}: {}", kv.key, kv.value)?;
    }

    for (i, metric) in metrics.metrics.iter().enumerate() {
        writeln!(out, "Metric #{}", i)?;
        writeln!(out, "\t\tName         : {}", metric.name)?;
        writeln!(out, "\t\tDescription  : {}", metric.description)?;
        writeln!(out, "\t\tUnit         : {}", metric.unit)?;

        match &metric.data {
            AggregatedMetrics::F64(data) => write_metric_data(out, data)?,
            AggregatedMetrics::U64(data) => write_metric_data(out, data)?,
            AggregatedMetrics::I64(data) => write_metric_data(out, data)?,
        }
    }
    Ok(())
}

fn write_metric_data<T: Debug>(out: &mut impl Write, data: &MetricData<T>) -> fmt::Result {
    match data {
        MetricData::Gauge(gauge) => {
            writeln!(out, "\t\tType         : Gauge")?;
            write_gauge(out, gauge)
        }
        MetricData::Sum(sum) => {
            writeln!(out, "\t\tType         : Sum")?;
            write_sum(out, sum)
        }
        MetricData::Histogram(hist) => {
            writeln!(out, "\t\tType         : Histogram")?;
            write_histogram(out, hist)
        }
    }
}

fn write_attributes(out: &mut impl Write, attributes: &[KeyValue]) -> fmt::Result {
    writeln!(out, "\t\t\tAttributes   :")?;
    for kv in attributes {
        writeln!(out, "\t\t\t\t ->  {}: {}", kv.key, kv.value)?;
    }
    Ok(())
}

fn write_sum<T: Debug>(out: &mut impl Write, sum: &Sum<T>) -> fmt::Result {
    writeln!(out, "\t\tSum DataPoints")?;
    writeln!(out, "\t\tMonotonic    : {}", sum.is_monotonic)?;
    writeln!(out, "\t\tTemporality  : {:?}", sum.temporality)?;
    writeln!(out, "\t\tStartTime    : {}", format_time(sum.start_time))?;
    writeln!(out, "\t\tEndTime      : {}", format_time(sum.time))?;
    for (i, data_point) in sum.data_points.iter().enumerate() {
        writeln!(out, "\t\tDataPoint #{}", i)?;
        writeln!(out, "\t\t\tValue        : {:#?}", data_point.value)?;
        write_attributes(out, &data_point.attributes)?;
    }
    Ok(())
}

fn write_gauge<T: Debug>(out: &mut impl Write, gauge: &Gauge<T>) -> fmt::Result {
    writeln!(out, "\t\tGauge DataPoints")?;
    if let Some(start_time) = gauge.start_time {
        writeln!(out, "\t\tStartTime    : {}", format_time(start_time))?;
    }
    writeln!(out, "\t\tEndTime      : {}", format_time(gauge.time))?;
    for (i, data_point) in gauge.data_points.iter().enumerate() {
        writeln!(out, "\t\tDataPoint #{}", i)?;
        writeln!(out, "\t\t\tValue        : {:#?}", data_point.value)?;
        write_attributes(out, &data_point.attributes)?;
    }
    Ok(())
}

fn write_histogram<T: Debug>(out: &mut impl Write, histogram: &Histogram<T>) -> fmt::Result {
    writeln!(out, "\t\tTemporality  : {:?}", histogram.temporality)?;
    writeln!(out, "\t\tStartTime    : {}", format_time(histogram.start_time))?;
    writeln!(out, "\t\tEndTime      : {}", format_time(histogram.time))?;
    writeln!(out, "\t\tHistogram DataPoints")?;
    for (i, data_point) in histogram.data_points.iter().enumerate() {
        writeln!(out, "\t\tDataPoint #{}", i)?;
        writeln!(out, "\t\t\tCount        : {}", data_point.count)?;
        writeln!(out, "\t\t\tSum          : {:?}", data_point.sum)?;
        if let Some(min) = &data_point.min {
            writeln!(out, "\t\t\tMin          : {:?}", min)?;
        }
        if let Some(max) = &data_point.max {
            writeln!(out, "\t\t\tMax          : {:?}", max)?;
        }
        write_attributes(out, &data_point.attributes)?;
        writeln!(out, "\t\t\tBuckets")?;
        let mut lower_bound = f64::NEG_INFINITY;
        for (bound, count) in data_point.bounds.iter().zip(&data_point.bucket_counts) {
            writeln!(out, "\t\t\t\t {} to {} : {}", lower_bound, bound, count)?;
            lower_bound = *bound;
        }
        if let Some(last) = data_point.bucket_counts.get(data_point.bounds.len()) {
            writeln!(out, "\t\t\t\t {} to +Infinity : {}", lower_bound, last)?;
        }
    }
    Ok(())
}

/// Configuration for the stdout metrics exporter
#[derive(Default)]
pub struct MetricExporterBuilder {
    temporality: Option<Temporality>,
}

impl MetricExporterBuilder {
    /// Set the [Temporality] of the exporter.
    pub fn with_temporality(mut self, temporality: Temporality) -> Self {
        self.temporality = Some(temporality);
        self
    }

    /// Create a metrics exporter with the current configuration.
    pub fn build(self) -> MetricExporter {
        MetricExporter {
            is_shutdown: AtomicBool::new(false),
            temporality: self.temporality.unwrap_or_default(),
        }
    }
}

impl fmt::Debug for MetricExporterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MetricExporterBuilder")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_sdk::metrics::{MetricExporter as _, SdkMeterProvider};

    fn collected() -> ResourceMetrics {
        let provider = SdkMeterProvider::builder().build();
        let meter = provider.meter("console");
        meter
            .u64_counter("requests")
            .with_unit("{request}")
            .build()
            .add(5, &[KeyValue::new("route", "/health")]);
        let latency = meter
            .f64_histogram("latency")
            .with_boundaries(vec![1.0, 5.0])
            .build();
        latency.record(0.5, &[]);
        latency.record(7.0, &[]);
        meter.i64_gauge("temperature").build().record(-3, &[]);
        provider.collect().unwrap()
    }

    #[test]
    fn every_kind_of_metric_is_printed() {
        let mut out = String::new();
        write_resource_metrics(&mut out, &collected()).unwrap();

        assert!(out.starts_with("Metrics\nResource\n"), "{out}");
        assert!(out.contains("Name         : console"));
        assert!(out.contains("Name         : requests"));
        assert!(out.contains("Unit         : {request}"));
        assert!(out.contains("Type         : Sum"));
        assert!(out.contains("Monotonic    : true"));
        assert!(out.contains("->  route: /health"));
        assert!(out.contains("Type         : Histogram"));
        assert!(out.contains("Count        : 2"));
        assert!(out.contains("-inf to 1 : 1"));
        assert!(out.contains("5 to +Infinity : 1"));
        assert!(out.contains("Type         : Gauge"));
        assert!(out.contains("Value        : -3"));
    }

    #[test]
    fn temporality_is_configurable() {
        assert_eq!(MetricExporter::default().temporality(), Temporality::Cumulative);
        let exporter = MetricExporter::builder()
            .with_temporality(Temporality::Delta)
            .build();
        assert_eq!(exporter.temporality(), Temporality::Delta);
    }

    #[test]
    fn export_after_shutdown_fails() {
        let exporter = MetricExporter::default();
        let metrics = collected();

        assert!(exporter.export(&metrics, None).is_ok());
        exporter.shutdown(None).unwrap();
        assert_eq!(
            exporter.export(&metrics, None),
            Err(OTelSdkError::AlreadyShutdown)
        );
    }
}
