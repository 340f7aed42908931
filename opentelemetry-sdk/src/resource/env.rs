//! Resource attributes read from the environment.
use super::{Resource, SERVICE_NAME};
use opentelemetry::{Key, KeyValue, Value};
use std::env;

const OTEL_RESOURCE_ATTRIBUTES: &str = "OTEL_RESOURCE_ATTRIBUTES";
const OTEL_SERVICE_NAME: &str = "OTEL_SERVICE_NAME";

/// Parse `OTEL_RESOURCE_ATTRIBUTES` (`k1=v1,k2=v2`). Entries without `=` are
/// skipped.
pub(super) fn resource_from_env() -> Resource {
    match env::var(OTEL_RESOURCE_ATTRIBUTES) {
        Ok(s) if !s.is_empty() => Resource::new(s.split_terminator(',').filter_map(|entry| {
            let (key, value) = entry.split_once('=')?;
            Some(KeyValue::new(key.trim().to_owned(), value.trim().to_owned()))
        })),
        _ => Resource::empty(),
    }
}

/// `OTEL_SERVICE_NAME`, then `service.name` from `OTEL_RESOURCE_ATTRIBUTES`,
/// then `unknown_service`.
pub(super) fn service_name(from_env: &Resource) -> Value {
    env::var(OTEL_SERVICE_NAME)
        .ok()
        .filter(|s| !s.is_empty())
        .map(Value::from)
        .or_else(|| from_env.get(&Key::from_static_str(SERVICE_NAME)))
        .unwrap_or_else(|| "unknown_service".into())
}
