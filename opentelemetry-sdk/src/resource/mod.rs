//! The entity producing telemetry.
//!
//! A [`Resource`] is an immutable set of attributes, such as the service name
//! or host, attached to every log record and metric a provider produces. The
//! OTLP exporters group records by resource before encoding them, so records
//! from different providers sharing one exporter end up in separate
//! `ResourceLogs` entries.
mod env;

use opentelemetry::{Key, KeyValue, Value};
use std::borrow::Cow;
use std::collections::{btree_map, BTreeMap};
use std::sync::Arc;

pub(crate) const SERVICE_NAME: &str = "service.name";
const TELEMETRY_SDK_NAME: &str = "telemetry.sdk.name";
const TELEMETRY_SDK_LANGUAGE: &str = "telemetry.sdk.language";
const TELEMETRY_SDK_VERSION: &str = "telemetry.sdk.version";

#[derive(Debug, Clone, PartialEq)]
struct ResourceInner {
    attrs: BTreeMap<Key, Value>,
    schema_url: Option<Cow<'static, str>>,
}

/// Immutable attributes describing the entity producing telemetry.
///
/// Cloning is cheap; clones share the same attribute storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Resource {
    inner: Arc<ResourceInner>,
}

impl Default for Resource {
    /// The SDK-provided resource: `service.name` (from `OTEL_SERVICE_NAME`,
    /// `OTEL_RESOURCE_ATTRIBUTES` or `unknown_service`), the `telemetry.sdk.*`
    /// attributes, and anything listed in `OTEL_RESOURCE_ATTRIBUTES`.
    fn default() -> Self {
        Resource::builder().build()
    }
}

impl Resource {
    /// Builder seeded with the SDK-provided and environment attributes.
    pub fn builder() -> ResourceBuilder {
        let from_env = env::resource_from_env();
        let service_name = env::service_name(&from_env);
        let sdk = Resource::new([
            KeyValue::new(SERVICE_NAME, service_name),
            KeyValue::new(TELEMETRY_SDK_NAME, "opentelemetry"),
            KeyValue::new(TELEMETRY_SDK_LANGUAGE, "rust"),
            KeyValue::new(TELEMETRY_SDK_VERSION, env!("CARGO_PKG_VERSION")),
        ]);
        ResourceBuilder {
            resource: sdk.merge(&from_env),
        }
    }

    /// Builder starting from a resource with no attributes.
    pub fn builder_empty() -> ResourceBuilder {
        ResourceBuilder {
            resource: Resource::empty(),
        }
    }

    pub(crate) fn empty() -> Self {
        Resource {
            inner: Arc::new(ResourceInner {
                attrs: BTreeMap::new(),
                schema_url: None,
            }),
        }
    }

    /// Later pairs win over earlier pairs with the same key.
    pub(crate) fn new<T: IntoIterator<Item = KeyValue>>(kvs: T) -> Self {
        Resource {
            inner: Arc::new(ResourceInner {
                attrs: kvs.into_iter().map(|kv| (kv.key, kv.value)).collect(),
                schema_url: None,
            }),
        }
    }

    /// Combine two resources. Keys in `other` win, even when their value is
    /// empty. The schema URL survives only when the two agree or one side
    /// has none.
    pub fn merge(&self, other: &Resource) -> Self {
        if Arc::ptr_eq(&self.inner, &other.inner)
            || (other.is_empty() && other.schema_url().is_none())
        {
            return self.clone();
        }
        if self.is_empty() && self.schema_url().is_none() {
            return other.clone();
        }

        let mut attrs = self.inner.attrs.clone();
        attrs.extend(
            other
                .inner
                .attrs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        let schema_url = match (&self.inner.schema_url, &other.inner.schema_url) {
            (Some(a), Some(b)) if a == b => Some(a.clone()),
            (Some(_), Some(_)) => None,
            (Some(url), None) | (None, Some(url)) => Some(url.clone()),
            (None, None) => None,
        };

        Resource {
            inner: Arc::new(ResourceInner { attrs, schema_url }),
        }
    }

    /// Schema URL, if one was set.
    pub fn schema_url(&self) -> Option<&str> {
        self.inner.schema_url.as_deref()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.inner.attrs.len()
    }

    /// Whether the resource has no attributes.
    pub fn is_empty(&self) -> bool {
        self.inner.attrs.is_empty()
    }

    /// Attributes in key order.
    pub fn iter(&self) -> Iter<'_> {
        Iter(self.inner.attrs.iter())
    }

    /// Value for `key`.
    pub fn get(&self, key: &Key) -> Option<Value> {
        self.inner.attrs.get(key).cloned()
    }
}

/// Iterator over the attributes of a [`Resource`].
#[derive(Debug)]
pub struct Iter<'a>(btree_map::Iter<'a, Key, Value>);

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Key, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl<'a> IntoIterator for &'a Resource {
    type Item = (&'a Key, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Builder for [`Resource`].
#[derive(Debug)]
pub struct ResourceBuilder {
    resource: Resource,
}

impl ResourceBuilder {
    /// Add one attribute, replacing any previous value for its key.
    pub fn with_attribute(self, kv: KeyValue) -> Self {
        self.with_attributes([kv])
    }

    /// Add attributes, replacing previous values for the same keys.
    pub fn with_attributes<T: IntoIterator<Item = KeyValue>>(mut self, kvs: T) -> Self {
        self.resource = self.resource.merge(&Resource::new(kvs));
        self
    }

    /// Set `service.name`.
    pub fn with_service_name(self, name: impl Into<Value>) -> Self {
        self.with_attribute(KeyValue::new(SERVICE_NAME, name.into()))
    }

    /// Set the schema URL. An empty string clears it.
    pub fn with_schema_url(mut self, schema_url: impl Into<Cow<'static, str>>) -> Self {
        let schema_url = schema_url.into();
        let inner = Arc::make_mut(&mut self.resource.inner);
        inner.schema_url = if schema_url.is_empty() {
            None
        } else {
            Some(schema_url)
        };
        self
    }

    /// Finish the resource.
    pub fn build(self) -> Resource {
        self.resource
    }
}
