//! Protobuf messages of the [OTLP] logs and metrics protocols, and the
//! transformations from the SDK's export types into them.
//!
//! The message types under [`collector`], [`common`], [`logs`], [`metrics`],
//! [`resource`] and [`rpc`] are generated by `prost-build` from the
//! [opentelemetry-proto] definitions and checked in. Only the messages the
//! OTLP exporters send or read are included.
//!
//! [OTLP]: https://opentelemetry.io/docs/specs/otlp/
//! [opentelemetry-proto]: https://github.com/open-telemetry/opentelemetry-proto
#![warn(missing_debug_implementations, unreachable_pub)]
#![allow(clippy::derive_partial_eq_without_eq)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod proto;

pub use proto::{collector, common, resource, rpc};
#[cfg(feature = "logs")]
pub use proto::logs;
#[cfg(feature = "metrics")]
pub use proto::metrics;

pub mod transform;
