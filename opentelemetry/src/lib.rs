//! Value types shared by the OpenTelemetry logs and metrics SDK.
//!
//! This crate holds the small vocabulary every other crate in the workspace
//! speaks: attribute [`Key`]s and [`Value`]s, the [`InstrumentationScope`] that
//! identifies the library producing telemetry, the [`logs::AnyValue`] used for
//! log bodies and attributes, and the identifiers used to correlate a log
//! record with a span.
//!
//! It also exports the `otel_debug!`, `otel_info!`, `otel_warn!` and
//! `otel_error!` macros the SDK and exporters use for their own diagnostics.
//! With the `internal-logs` feature enabled (the default) these forward to
//! [`tracing`](https://docs.rs/tracing) events, so applications see SDK
//! diagnostics by installing any `tracing` subscriber.
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod common;
mod internal_logging;

pub use common::{Array, InstrumentationScope, InstrumentationScopeBuilder, Key, KeyValue, Value};

pub mod trace;

#[cfg(feature = "logs")]
#[cfg_attr(docsrs, doc(cfg(feature = "logs")))]
pub mod logs;

#[doc(hidden)]
#[cfg(feature = "internal-logs")]
pub mod _private {
    pub use tracing::{debug, error, info, warn};
}
