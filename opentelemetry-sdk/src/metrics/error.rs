use std::result;
use thiserror::Error;

/// A specialized `Result` type for metric configuration.
pub type MetricResult<T> = result::Result<T, MetricError>;

/// Errors returned while configuring metrics.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MetricError {
    /// Invalid configuration, e.g. a histogram with unsorted boundaries.
    #[error("Config error {0}")]
    Config(String),
    /// Invalid instrument configuration such as an invalid instrument name or unit.
    #[error("Invalid instrument configuration: {0}")]
    InvalidInstrumentConfiguration(&'static str),
}
