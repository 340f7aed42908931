//! # OpenTelemetry Log SDK
//!
//! Records are created by an [`SdkLogger`], trimmed to the provider's
//! [`LogRecordLimits`] on emit, and handed to each registered
//! [`LogProcessor`], which forwards them to a [`LogExporter`].
mod batch_log_processor;
mod export;
mod in_memory_exporter;
pub(crate) mod log_processor;
mod logger;
mod logger_provider;
pub(crate) mod record;
mod simple_log_processor;

pub use batch_log_processor::{
    BatchConfig, BatchConfigBuilder, BatchConfigError, BatchLogProcessor,
    BatchLogProcessorBuilder,
};
pub use export::{LogBatch, LogExporter};
pub use in_memory_exporter::{InMemoryLogExporter, InMemoryLogExporterBuilder};
pub use log_processor::LogProcessor;
pub use logger::SdkLogger;
pub use logger_provider::{LoggerProviderBuilder, SdkLoggerProvider};
pub use record::{LogRecordData, LogRecordLimits, SdkLogRecord, TraceContext};
pub use simple_log_processor::SimpleLogProcessor;
