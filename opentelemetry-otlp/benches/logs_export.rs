/*
    Log Export Benchmark

    Measures the client-side cost of one OTLP/HTTP log export:
    1. Conversion to protobuf
    2. Serialization and optional gzip compression
    3. HTTP request creation

    The HTTP client answers 200 OK without doing any I/O, so network and
    collector latency are excluded.

    Setup:
    - Batch size: 512 logs (default SDK batch size)
    - 1 InstrumentationScope
    - 4 or 10 attributes per record

    Run benchmarks:
    ```bash
    cargo bench --bench logs_export
    cargo bench --bench logs_export --no-default-features --features logs,reqwest-blocking-client
    ```

    End-to-End with BatchLogProcessor (emit -> batch -> export):
    Uses force_flush() to synchronize; 511 logs stay below
    max_export_batch_size so force_flush is the only export trigger.
*/

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use opentelemetry::logs::Severity;
use opentelemetry::trace::{SpanId, TraceFlags, TraceId};
use opentelemetry_http::{Bytes, HttpClient, HttpError, Request, Response};
use opentelemetry_otlp::{LogExporter as OtlpLogExporter, WithHttpConfig};
use opentelemetry_sdk::logs::{
    BatchConfigBuilder, BatchLogProcessor, InMemoryLogExporter, LogBatch, LogExporter,
    LogRecordData, SdkLoggerProvider,
};
use opentelemetry_sdk::Resource;
use std::time::Duration;

/// Accepts every request.
#[derive(Debug, Clone, Copy)]
struct NoopCollector;

#[async_trait]
impl HttpClient for NoopCollector {
    async fn send_bytes(&self, request: Request<Bytes>) -> Result<Response<Bytes>, HttpError> {
        black_box(request);
        Ok(Response::builder().status(200).body(Bytes::new())?)
    }
}

fn create_log_exporter(gzip: bool) -> OtlpLogExporter {
    let builder = OtlpLogExporter::builder()
        .with_http()
        .with_http_client(NoopCollector);
    let builder = if gzip {
        builder.with_compression(opentelemetry_otlp::Compression::Gzip)
    } else {
        builder.without_compression()
    };
    builder.build().expect("Failed to create log exporter")
}

fn resource() -> Resource {
    Resource::builder()
        .with_service_name("benchmark-service")
        .with_attributes([
            opentelemetry::KeyValue::new("service.version", "1.0.0"),
            opentelemetry::KeyValue::new("deployment.environment", "production"),
            opentelemetry::KeyValue::new("host.name", "benchmark-host"),
        ])
        .build()
}

fn emit_records(provider: &SdkLoggerProvider, count: usize, attribute_count: usize) {
    let logger = provider.logger("opentelemetry-appender-tracing");
    let trace_id = TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap();
    let span_id = SpanId::from_hex("00f067aa0ba902b7").unwrap();

    for _ in 0..count {
        let mut record = logger.create_log_record();
        record.set_severity_number(Severity::Info);
        record.set_severity_text("INFO");
        record.set_body("Benchmark log message".into());
        record.set_trace_context(trace_id, span_id, Some(TraceFlags::SAMPLED));
        for j in 0..attribute_count {
            record.add_attribute(format!("attr_{j}"), format!("value_{j}"));
        }
        logger.emit(record);
    }
}

fn create_log_batch(batch_size: usize, attribute_count: usize) -> Vec<LogRecordData> {
    let exporter = InMemoryLogExporter::default();
    let provider = SdkLoggerProvider::builder()
        .with_resource(resource())
        .with_simple_exporter(exporter.clone())
        .build();
    emit_records(&provider, batch_size, attribute_count);
    exporter.get_emitted_logs().unwrap()
}

fn bench_log_export(c: &mut Criterion) {
    let log_data_4_attrs = create_log_batch(512, 4);
    let log_data_10_attrs = create_log_batch(512, 10);

    for (group_name, gzip) in [("otlp_log_export", false), ("otlp_log_export_gzip", true)] {
        if gzip && !cfg!(feature = "gzip-http") {
            continue;
        }
        let exporter = create_log_exporter(gzip);
        let mut group = c.benchmark_group(group_name);

        group.bench_function("batch_512_with_4_attrs", |b| {
            b.iter(|| {
                let batch = LogBatch::new(black_box(&log_data_4_attrs));
                exporter.export(batch, None).unwrap();
            });
        });

        group.bench_function("batch_512_with_10_attrs", |b| {
            b.iter(|| {
                let batch = LogBatch::new(black_box(&log_data_10_attrs));
                exporter.export(batch, None).unwrap();
            });
        });

        group.finish();
    }
}

fn bench_e2e(c: &mut Criterion) {
    let processor = BatchLogProcessor::builder(create_log_exporter(false))
        .with_batch_config(
            BatchConfigBuilder::default()
                .with_scheduled_delay(Duration::from_secs(3600))
                .build()
                .unwrap(),
        )
        .build();
    let provider = SdkLoggerProvider::builder()
        .with_resource(resource())
        .with_log_processor(processor)
        .build();

    let mut group = c.benchmark_group("otlp_log_export_e2e");
    group.bench_function("e2e_batch_511_with_4_attrs", |b| {
        b.iter(|| {
            emit_records(&provider, 511, 4);
            provider.force_flush(None).unwrap();
        });
    });
    group.finish();

    provider.shutdown(None).unwrap();
}

criterion_group!(benches, bench_log_export, bench_e2e);
criterion_main!(benches);
