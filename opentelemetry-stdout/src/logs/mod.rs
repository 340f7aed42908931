//! # Stdout Log Exporter
//!
//! The stdout [`LogExporter`] prints every exported [`LogRecordData`] to
//! stdout in a human readable form. It is meant for debugging and learning
//! purposes; the output format is not stable.
//!
//! [`LogRecordData`]: opentelemetry_sdk::logs::LogRecordData
//!
//! ```
//! use opentelemetry_sdk::logs::SdkLoggerProvider;
//!
//! let provider = SdkLoggerProvider::builder()
//!     .with_simple_exporter(opentelemetry_stdout::LogExporter::default())
//!     .build();
//! ```
mod exporter;
pub use exporter::*;
