//! Export telemetry signals to stdout.
//!
//! The output is meant for debugging and learning; its format is not stable
//! and should not be parsed.
//!
//! # Examples
//!
//! ```no_run
//! # #[cfg(all(feature = "metrics", feature = "logs"))]
//! {
//! use opentelemetry_sdk::logs::SdkLoggerProvider;
//! use opentelemetry_sdk::metrics::SdkMeterProvider;
//!
//! fn init_logs() -> SdkLoggerProvider {
//!     let exporter = opentelemetry_stdout::LogExporter::default();
//!     SdkLoggerProvider::builder()
//!         .with_simple_exporter(exporter)
//!         .build()
//! }
//!
//! fn init_metrics() -> SdkMeterProvider {
//!     let exporter = opentelemetry_stdout::MetricExporter::default();
//!     SdkMeterProvider::builder().with_exporter(exporter).build()
//! }
//!
//! let logger_provider = init_logs();
//! let meter_provider = init_metrics();
//!
//! // recorded logs and metrics will now be sent to stdout:
//! let counter = meter_provider.meter("example").u64_counter("hits").build();
//! counter.add(1, &[]);
//! meter_provider.force_flush(None).unwrap();
//!
//! // Metrics
//! // Resource
//! // ...
//! # let _ = logger_provider;
//! # }
//! ```
#![warn(missing_debug_implementations, missing_docs)]

#[cfg(feature = "metrics")]
mod metrics;
#[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
#[cfg(feature = "metrics")]
pub use metrics::*;

#[cfg(feature = "logs")]
mod logs;
#[cfg_attr(docsrs, doc(cfg(feature = "logs")))]
#[cfg(feature = "logs")]
pub use logs::*;
