//! Conversions from the SDK's export types into protobuf messages.
pub mod common;

#[cfg(feature = "logs")]
pub mod logs;

#[cfg(feature = "metrics")]
pub mod metrics;
