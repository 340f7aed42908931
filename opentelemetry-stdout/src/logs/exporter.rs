use chrono::{DateTime, Utc};
use core::fmt;
use opentelemetry_sdk::error::{OTelSdkError, OTelSdkResult};
use opentelemetry_sdk::logs::{LogBatch, LogRecordData};
use opentelemetry_sdk::Resource;
use std::fmt::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, UNIX_EPOCH};

/// An OpenTelemetry exporter that writes Logs to stdout on export.
pub struct LogExporter {
    is_shutdown: AtomicBool,
    resource_emitted: AtomicBool,
}

impl Default for LogExporter {
    fn default() -> Self {
        LogExporter {
            is_shutdown: AtomicBool::new(false),
            resource_emitted: AtomicBool::new(false),
        }
    }
}

impl fmt::Debug for LogExporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogExporter")
    }
}

impl opentelemetry_sdk::logs::LogExporter for LogExporter {
    /// Export logs to stdout
    fn export(&self, batch: LogBatch<'_>, _timeout: Option<Duration>) -> OTelSdkResult {
        if self.is_shutdown.load(Ordering::SeqCst) {
            return Err(OTelSdkError::AlreadyShutdown);
        }
        // the resource is printed with the first batch only
        let with_resource = self
            .resource_emitted
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();

        let mut out = String::new();
        write_logs(&mut out, &batch, with_resource)
            .map_err(|e| OTelSdkError::InternalFailure(e.to_string()))?;
        print!("{out}");
        Ok(())
    }

    fn shutdown(&self, _timeout: Option<Duration>) -> OTelSdkResult {
        self.is_shutdown.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) fn format_nanos(nanos: u64) -> String {
    let datetime: DateTime<Utc> = (UNIX_EPOCH + Duration::from_nanos(nanos)).into();
    datetime.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn write_resource(out: &mut impl Write, resource: &Resource) -> fmt::Result {
    writeln!(out, "Resource")?;
    if let Some(schema_url) = resource.schema_url() {
        writeln!(out, "\t Resource SchemaUrl: {:?}", schema_url)?;
    }
    for (k, v) in resource.iter() {
        writeln!(out, "\t ->  {}={:?}", k, v)?;
    }
    Ok(())
}

fn write_logs(out: &mut impl Write, batch: &LogBatch<'_>, with_resource: bool) -> fmt::Result {
    writeln!(out, "Logs")?;
    if with_resource {
        if let Some(record) = batch.iter().next() {
            write_resource(out, record.resource())?;
        }
    }
    for (i, record) in batch.iter().enumerate() {
        writeln!(out, "Log #{}", i)?;
        write_record(out, record)?;
    }
    Ok(())
}

fn write_record(out: &mut impl Write, record: &LogRecordData) -> fmt::Result {
    let scope = record.instrumentation_scope();
    writeln!(out, "\t Instrumentation Scope: {}", scope.name())?;
    if let Some(version) = scope.version() {
        writeln!(out, "\t Instrumentation Scope Version: {}", version)?;
    }
    if let Some(trace_context) = record.trace_context() {
        writeln!(out, "\t TraceId: {}", trace_context.trace_id)?;
        writeln!(out, "\t SpanId: {}", trace_context.span_id)?;
        if let Some(trace_flags) = trace_context.trace_flags {
            writeln!(out, "\t TraceFlags: {:?}", trace_flags)?;
        }
    }
    if let Some(timestamp) = record.timestamp() {
        writeln!(out, "\t Timestamp: {}", format_nanos(timestamp))?;
    }
    writeln!(
        out,
        "\t Observed Timestamp: {}",
        format_nanos(record.observed_timestamp())
    )?;
    if let Some(severity) = record.severity_text() {
        writeln!(out, "\t SeverityText: {:?}", severity)?;
    }
    if let Some(severity) = record.severity_number() {
        writeln!(out, "\t SeverityNumber: {:?}", severity)?;
    }
    if let Some(body) = record.body() {
        writeln!(out, "\t Body: {:?}", body)?;
    }

    writeln!(out, "\t Attributes:")?;
    for (k, v) in record.attributes() {
        writeln!(out, "\t\t ->  {}: {:?}", k, v)?;
    }
    if record.dropped_attributes_count() > 0 {
        writeln!(
            out,
            "\t Dropped Attributes: {}",
            record.dropped_attributes_count()
        )?;
    }
    Ok(())
}
