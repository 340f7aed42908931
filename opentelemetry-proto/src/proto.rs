#![allow(missing_docs, unreachable_pub)]

/// Request and response messages of the OTLP export services.
pub mod collector {
    /// Logs export service.
    #[cfg(feature = "logs")]
    pub mod logs {
        pub mod v1 {
            include!("proto/generated/opentelemetry.proto.collector.logs.v1.rs");
        }
    }

    /// Metrics export service.
    #[cfg(feature = "metrics")]
    pub mod metrics {
        pub mod v1 {
            include!("proto/generated/opentelemetry.proto.collector.metrics.v1.rs");
        }
    }
}

/// Values, attributes and instrumentation scopes.
pub mod common {
    pub mod v1 {
        include!("proto/generated/opentelemetry.proto.common.v1.rs");
    }
}

/// Log records grouped by resource and scope.
#[cfg(feature = "logs")]
pub mod logs {
    pub mod v1 {
        include!("proto/generated/opentelemetry.proto.logs.v1.rs");
    }
}

/// Metrics grouped by resource and scope.
#[cfg(feature = "metrics")]
pub mod metrics {
    pub mod v1 {
        include!("proto/generated/opentelemetry.proto.metrics.v1.rs");
    }
}

/// The entity producing telemetry.
pub mod resource {
    pub mod v1 {
        include!("proto/generated/opentelemetry.proto.resource.v1.rs");
    }
}

/// `google.rpc.Status`, the body of a rejected OTLP/HTTP request.
pub mod rpc {
    include!("proto/generated/google.rpc.rs");
}
