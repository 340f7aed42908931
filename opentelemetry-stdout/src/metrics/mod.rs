//! # Stdout Metric Exporter
//!
//! The stdout [`MetricExporter`] prints each collected metric with its data
//! points. It is meant for debugging and learning purposes; the output format
//! is not stable.
mod exporter;
pub use exporter::*;
