#![cfg(feature = "logs")]

use opentelemetry::logs::{AnyValue, Severity};
use opentelemetry::KeyValue;
use opentelemetry_sdk::error::OTelSdkError;
use opentelemetry_sdk::logs::{
    BatchConfigBuilder, BatchLogProcessor, InMemoryLogExporter, InMemoryLogExporterBuilder,
    SdkLoggerProvider,
};
use opentelemetry_sdk::Resource;
use std::time::Duration;

fn batch_provider(exporter: &InMemoryLogExporter, delay: Duration) -> SdkLoggerProvider {
    let config = BatchConfigBuilder::default()
        .with_max_queue_size(16)
        .with_max_export_batch_size(4)
        .with_scheduled_delay(delay)
        .build()
        .unwrap();
    SdkLoggerProvider::builder()
        .with_resource(
            Resource::builder_empty()
                .with_service_name("integration")
                .with_attribute(KeyValue::new("deployment", "test"))
                .build(),
        )
        .with_log_processor(
            BatchLogProcessor::builder(exporter.clone())
                .with_batch_config(config)
                .build(),
        )
        .build()
}

#[test]
fn batched_records_reach_the_exporter_in_order() {
    let exporter = InMemoryLogExporterBuilder::default()
        .keep_records_on_shutdown()
        .build();
    let provider = batch_provider(&exporter, Duration::from_secs(60));
    let logger = provider.logger("integration");

    for i in 0..10 {
        let mut record = logger.create_log_record();
        record.set_severity_number(Severity::Info);
        record.set_body(AnyValue::from(format!("record {i}")));
        logger.emit(record);
    }
    provider.force_flush(Some(Duration::from_secs(5))).unwrap();

    let bodies: Vec<_> = exporter
        .get_emitted_logs()
        .unwrap()
        .iter()
        .map(|log| log.body().cloned())
        .collect();
    let expected: Vec<_> = (0..10)
        .map(|i| Some(AnyValue::from(format!("record {i}"))))
        .collect();
    assert_eq!(bodies, expected);

    provider.shutdown(Some(Duration::from_secs(5))).unwrap();
    assert!(exporter.is_shutdown_called());
}

#[test]
fn overflowing_queue_keeps_newest_records() {
    let exporter = InMemoryLogExporterBuilder::default()
        .keep_records_on_shutdown()
        .build();
    // A queue the producer outruns between worker wakeups.
    let config = BatchConfigBuilder::default()
        .with_max_queue_size(4)
        .with_max_export_batch_size(4)
        .with_scheduled_delay(Duration::from_secs(60))
        .build()
        .unwrap();
    let provider = SdkLoggerProvider::builder()
        .with_log_processor(
            BatchLogProcessor::builder(exporter.clone())
                .with_batch_config(config)
                .build(),
        )
        .build();
    let logger = provider.logger("overflow");

    for i in 0..100 {
        let mut record = logger.create_log_record();
        record.set_body(AnyValue::from(i as i64));
        logger.emit(record);
    }
    provider.shutdown(Some(Duration::from_secs(5))).unwrap();

    let logs = exporter.get_emitted_logs().unwrap();
    assert!(logs.len() <= 100);
    // Whatever was evicted, the newest record always survives.
    assert_eq!(logs.last().and_then(|l| l.body().cloned()), Some(AnyValue::from(99_i64)));
}

#[test]
fn records_after_shutdown_are_dropped() {
    let exporter = InMemoryLogExporterBuilder::default()
        .keep_records_on_shutdown()
        .build();
    let provider = batch_provider(&exporter, Duration::from_millis(10));
    let logger = provider.logger("late");

    provider.shutdown(None).unwrap();
    logger.emit(logger.create_log_record());
    provider.logger("later").emit(logger.create_log_record());

    assert!(exporter.get_emitted_logs().unwrap().is_empty());
    assert_eq!(provider.shutdown(None), Err(OTelSdkError::AlreadyShutdown));
    assert_eq!(provider.force_flush(None), Ok(()));
}

#[test]
fn scheduled_delay_exports_without_flush() {
    let exporter = InMemoryLogExporter::default();
    let provider = batch_provider(&exporter, Duration::from_millis(20));
    let logger = provider.logger("timer");
    logger.emit(logger.create_log_record());

    let mut exported = 0;
    for _ in 0..200 {
        exported = exporter.get_emitted_logs().unwrap().len();
        if exported == 1 {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(exported, 1);

    let log = &exporter.get_emitted_logs().unwrap()[0];
    assert_eq!(log.resource().len(), 2);
    assert_eq!(log.instrumentation_scope().name(), "timer");
}
