//! Log records into `ResourceLogs`.
use crate::collector::logs::v1::ExportLogsServiceRequest;
use crate::common::v1::{any_value::Value, AnyValue, ArrayValue, KeyValue, KeyValueList};
use crate::logs::v1::{LogRecord, ResourceLogs, ScopeLogs, SeverityNumber};
use opentelemetry::logs::{AnyValue as LogsAnyValue, Severity};
use opentelemetry::InstrumentationScope;
use opentelemetry_sdk::logs::{LogBatch, LogRecordData};

impl From<&LogsAnyValue> for AnyValue {
    fn from(value: &LogsAnyValue) -> Self {
        AnyValue {
            value: Some(value.into()),
        }
    }
}

impl From<&LogsAnyValue> for Value {
    fn from(value: &LogsAnyValue) -> Self {
        match value {
            LogsAnyValue::Double(f) => Value::DoubleValue(*f),
            LogsAnyValue::Int(i) => Value::IntValue(*i),
            LogsAnyValue::String(s) => Value::StringValue(s.to_string()),
            LogsAnyValue::Boolean(b) => Value::BoolValue(*b),
            LogsAnyValue::ListAny(v) => Value::ArrayValue(ArrayValue {
                values: v.iter().map(Into::into).collect(),
            }),
            LogsAnyValue::Map(m) => Value::KvlistValue(KeyValueList {
                values: m
                    .iter()
                    .map(|(key, value)| KeyValue {
                        key: key.as_str().to_string(),
                        value: Some(value.into()),
                    })
                    .collect(),
            }),
            LogsAnyValue::Bytes(v) => Value::BytesValue(v.clone()),
        }
    }
}

impl From<Severity> for SeverityNumber {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Trace => SeverityNumber::Trace,
            Severity::Trace2 => SeverityNumber::Trace2,
            Severity::Trace3 => SeverityNumber::Trace3,
            Severity::Trace4 => SeverityNumber::Trace4,
            Severity::Debug => SeverityNumber::Debug,
            Severity::Debug2 => SeverityNumber::Debug2,
            Severity::Debug3 => SeverityNumber::Debug3,
            Severity::Debug4 => SeverityNumber::Debug4,
            Severity::Info => SeverityNumber::Info,
            Severity::Info2 => SeverityNumber::Info2,
            Severity::Info3 => SeverityNumber::Info3,
            Severity::Info4 => SeverityNumber::Info4,
            Severity::Warn => SeverityNumber::Warn,
            Severity::Warn2 => SeverityNumber::Warn2,
            Severity::Warn3 => SeverityNumber::Warn3,
            Severity::Warn4 => SeverityNumber::Warn4,
            Severity::Error => SeverityNumber::Error,
            Severity::Error2 => SeverityNumber::Error2,
            Severity::Error3 => SeverityNumber::Error3,
            Severity::Error4 => SeverityNumber::Error4,
            Severity::Fatal => SeverityNumber::Fatal,
            Severity::Fatal2 => SeverityNumber::Fatal2,
            Severity::Fatal3 => SeverityNumber::Fatal3,
            Severity::Fatal4 => SeverityNumber::Fatal4,
        }
    }
}

impl From<&LogRecordData> for LogRecord {
    fn from(log_record: &LogRecordData) -> Self {
        let trace_context = log_record.trace_context();
        let severity_number = log_record
            .severity_number()
            .map_or(SeverityNumber::Unspecified, Into::into);

        LogRecord {
            time_unix_nano: log_record.timestamp().unwrap_or_default(),
            observed_time_unix_nano: log_record.observed_timestamp(),
            severity_number: severity_number.into(),
            severity_text: log_record
                .severity_text()
                .map(ToOwned::to_owned)
                .unwrap_or_default(),
            body: log_record.body().map(Into::into),
            attributes: log_record
                .attributes()
                .map(|(key, value)| KeyValue {
                    key: key.as_str().to_string(),
                    value: Some(value.into()),
                })
                .collect(),
            dropped_attributes_count: log_record.dropped_attributes_count(),
            flags: trace_context
                .and_then(|ctx| ctx.trace_flags)
                .map(|flags| u32::from(flags.to_u8()))
                .unwrap_or_default(),
            trace_id: trace_context
                .map(|ctx| ctx.trace_id.to_bytes().to_vec())
                .unwrap_or_default(),
            span_id: trace_context
                .map(|ctx| ctx.span_id.to_bytes().to_vec())
                .unwrap_or_default(),
            event_name: String::new(),
        }
    }
}

/// Nest the records of `batch` under their resource, then under their
/// instrumentation scope.
///
/// One `ResourceLogs` is produced per distinct resource and one `ScopeLogs`
/// per distinct scope within it, both in order of first appearance. Records
/// keep their batch order within a scope.
pub fn group_logs_by_resource_and_scope(batch: LogBatch<'_>) -> Vec<ResourceLogs> {
    batch
        .group_by_resource()
        .into_iter()
        .map(|(resource, records)| {
            let mut scopes: Vec<(&InstrumentationScope, Vec<LogRecord>)> = Vec::new();
            for record in records {
                let scope = record.instrumentation_scope();
                let proto = LogRecord::from(record);
                match scopes.iter_mut().find(|(s, _)| *s == scope) {
                    Some((_, members)) => members.push(proto),
                    None => scopes.push((scope, vec![proto])),
                }
            }

            ResourceLogs {
                resource: Some(resource.into()),
                scope_logs: scopes
                    .into_iter()
                    .map(|(scope, log_records)| ScopeLogs {
                        schema_url: scope.schema_url().map(ToOwned::to_owned).unwrap_or_default(),
                        scope: Some(scope.into()),
                        log_records,
                    })
                    .collect(),
                schema_url: resource.schema_url().map(ToOwned::to_owned).unwrap_or_default(),
            }
        })
        .collect()
}

impl From<LogBatch<'_>> for ExportLogsServiceRequest {
    fn from(batch: LogBatch<'_>) -> Self {
        ExportLogsServiceRequest {
            resource_logs: group_logs_by_resource_and_scope(batch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{SpanId, TraceFlags, TraceId};
    use opentelemetry_sdk::logs::{InMemoryLogExporter, SdkLoggerProvider};
    use opentelemetry_sdk::Resource;
    use std::collections::HashMap;

    fn emitted(provider_resource: &str, logs: &[(&'static str, &'static str)]) -> Vec<LogRecordData> {
        let exporter = InMemoryLogExporter::default();
        let provider = SdkLoggerProvider::builder()
            .with_resource(
                Resource::builder_empty()
                    .with_service_name(provider_resource.to_string())
                    .build(),
            )
            .with_simple_exporter(exporter.clone())
            .build();
        for (scope, body) in logs {
            let logger = provider.logger(*scope);
            let mut record = logger.create_log_record();
            record.set_body((*body).into());
            logger.emit(record);
        }
        exporter.get_emitted_logs().unwrap()
    }

    #[test]
    fn records_are_nested_by_resource_then_scope() {
        let mut records = emitted("checkout", &[("db", "one"), ("http", "two"), ("db", "three")]);
        records.extend(emitted("billing", &[("db", "four")]));

        let resource_logs = group_logs_by_resource_and_scope(LogBatch::new(&records));

        assert_eq!(resource_logs.len(), 2);
        let checkout = &resource_logs[0];
        assert_eq!(checkout.scope_logs.len(), 2);
        assert_eq!(checkout.scope_logs[0].scope.as_ref().unwrap().name, "db");
        let bodies: Vec<_> = checkout.scope_logs[0]
            .log_records
            .iter()
            .map(|r| r.body.clone().unwrap().value.unwrap())
            .collect();
        assert_eq!(
            bodies,
            [
                Value::StringValue("one".into()),
                Value::StringValue("three".into())
            ]
        );
        assert_eq!(checkout.scope_logs[1].log_records.len(), 1);
        assert_eq!(resource_logs[1].scope_logs[0].log_records.len(), 1);
        assert!(resource_logs[1]
            .resource
            .as_ref()
            .unwrap()
            .attributes
            .iter()
            .any(|kv| kv.value
                == Some(AnyValue {
                    value: Some(Value::StringValue("billing".into()))
                })));
    }

    #[test]
    fn record_fields_are_carried_over() {
        let exporter = InMemoryLogExporter::default();
        let provider = SdkLoggerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let logger = provider.logger("orders");
        let mut record = logger.create_log_record();
        record.set_severity_number(Severity::Warn2);
        record.set_severity_text("WARN2");
        record.set_trace_context(
            TraceId::from_bytes([1; 16]),
            SpanId::from_bytes([2; 8]),
            Some(TraceFlags::SAMPLED),
        );
        record.add_attribute("order.id", 42);
        record.set_body(LogsAnyValue::Map(HashMap::from([(
            "nested".into(),
            LogsAnyValue::ListAny(vec![LogsAnyValue::Boolean(true)]),
        )])));
        logger.emit(record);

        let records = exporter.get_emitted_logs().unwrap();
        let proto = LogRecord::from(&records[0]);

        assert_eq!(proto.severity_number, SeverityNumber::Warn2 as i32);
        assert_eq!(proto.severity_text, "WARN2");
        assert_eq!(proto.trace_id, vec![1; 16]);
        assert_eq!(proto.span_id, vec![2; 8]);
        assert_eq!(proto.flags, 1);
        assert!(proto.observed_time_unix_nano > 0);
        assert_eq!(proto.attributes[0].key, "order.id");
        let Some(Value::KvlistValue(map)) = proto.body.and_then(|b| b.value) else {
            panic!("expected a map body");
        };
        assert_eq!(map.values[0].key, "nested");
    }
}
