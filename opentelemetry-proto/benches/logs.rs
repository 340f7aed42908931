/*
    Conversion of exported log records into OTLP protobuf, then encoding.
    Run with `cargo bench --bench logs`.
*/

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use opentelemetry::logs::{AnyValue, Severity};
use opentelemetry::trace::{SpanId, TraceFlags, TraceId};
use opentelemetry::Key;
use opentelemetry_proto::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::logs::v1::LogRecord as ProtoLogRecord;
use opentelemetry_sdk::logs::{InMemoryLogExporter, LogBatch, LogRecordData, SdkLoggerProvider};
use prost::Message;
use std::collections::HashMap;

fn emit_records(count: usize, attributes: usize, complex_body: bool) -> Vec<LogRecordData> {
    let exporter = InMemoryLogExporter::default();
    let provider = SdkLoggerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    let logger = provider.logger("bench");

    for _ in 0..count {
        let mut record = logger.create_log_record();
        record.set_severity_number(Severity::Info);
        record.set_severity_text("INFO");
        record.set_trace_context(
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(),
            SpanId::from_hex("00f067aa0ba902b7").unwrap(),
            Some(TraceFlags::SAMPLED),
        );
        if complex_body {
            let inner = HashMap::from([
                (Key::new("inner_key1"), AnyValue::String("inner_value1".into())),
                (Key::new("inner_key2"), AnyValue::Int(42)),
            ]);
            record.set_body(AnyValue::Map(HashMap::from([
                (Key::new("nested_map"), AnyValue::Map(inner)),
                (
                    Key::new("array_field"),
                    AnyValue::ListAny(vec![AnyValue::String("item1".into()), AnyValue::Int(100)]),
                ),
            ])));
        } else {
            record.set_body("Log message".into());
        }
        for i in 0..attributes {
            record.add_attribute(format!("attr_{i}"), format!("value_{i}"));
        }
        logger.emit(record);
    }

    exporter.get_emitted_logs().unwrap()
}

fn bench_log_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_record_conversion");

    group.bench_function("basic_with_4_attributes", |b| {
        let records = emit_records(1, 4, false);
        b.iter(|| black_box(ProtoLogRecord::from(black_box(&records[0]))));
    });

    group.bench_function("complex_with_10_attributes", |b| {
        let records = emit_records(1, 10, true);
        b.iter(|| black_box(ProtoLogRecord::from(black_box(&records[0]))));
    });

    group.finish();

    let mut group = c.benchmark_group("log_batch_encoding");

    group.bench_function("512_records_to_bytes", |b| {
        let records = emit_records(512, 4, false);
        b.iter(|| {
            let request = ExportLogsServiceRequest::from(LogBatch::new(black_box(&records)));
            black_box(request.encode_to_vec())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_log_conversion);
criterion_main!(benches);
