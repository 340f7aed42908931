//! Value types for log records.
//!
//! A log body or attribute is an [`AnyValue`]: a scalar, a byte string, or an
//! arbitrarily nested list or map. [`Severity`] is the normalized severity
//! number (1 to 24) defined by the OpenTelemetry log data model.
mod value;

pub use value::{AnyValue, Severity};
