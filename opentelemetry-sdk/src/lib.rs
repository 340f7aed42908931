//! # OpenTelemetry SDK
//!
//! This SDK provides the logs and metrics pipelines of OpenTelemetry.
//!
//! * [`logs`]: an [`SdkLoggerProvider`](logs::SdkLoggerProvider) hands out
//!   loggers whose records flow through processors, such as the
//!   [`BatchLogProcessor`](logs::BatchLogProcessor), to a
//!   [`LogExporter`](logs::LogExporter).
//! * [`metrics`]: an [`SdkMeterProvider`](metrics::SdkMeterProvider) hands out
//!   meters whose instruments aggregate measurements into streams, shaped by
//!   [`View`](metrics::View)s and collected into
//!   [`ResourceMetrics`](metrics::data::ResourceMetrics) for a
//!   [`MetricExporter`](metrics::MetricExporter).
//!
//! Every export, flush and shutdown returns an
//! [`OTelSdkResult`](error::OTelSdkResult) and takes an optional timeout.
//! Both providers describe the entity producing telemetry with a
//! [`Resource`].
//!
//! ## Crate Feature Flags
//!
//! * `logs`: Includes the logs SDK.
//! * `metrics`: Includes the metrics SDK.
//! * `internal-logs`: Emits the SDK's own diagnostics as `tracing` events.
//!
//! All three are enabled by default.
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![allow(clippy::needless_doctest_main)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/open-telemetry/opentelemetry-rust/main/assets/logo.svg"
)]

pub mod error;
#[cfg(feature = "logs")]
#[cfg_attr(docsrs, doc(cfg(feature = "logs")))]
pub mod logs;
#[cfg(feature = "metrics")]
#[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
pub mod metrics;
pub mod resource;

pub use resource::Resource;
