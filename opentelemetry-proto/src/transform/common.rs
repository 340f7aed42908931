//! Attributes, values, scopes and resources.
use crate::common::v1::{any_value, AnyValue, ArrayValue, InstrumentationScope, KeyValue};
use crate::resource::v1::Resource;
use opentelemetry::{Array, Value};
#[cfg(feature = "metrics")]
use std::time::{SystemTime, UNIX_EPOCH};

/// Nanoseconds since the Unix epoch, zero for times before it.
#[cfg(feature = "metrics")]
pub(crate) fn to_nanos(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Wrapper type for Vec<[`KeyValue`](crate::common::v1::KeyValue)>
#[derive(Debug, Default)]
pub struct Attributes(pub ::std::vec::Vec<KeyValue>);

impl From<Vec<opentelemetry::KeyValue>> for Attributes {
    fn from(kvs: Vec<opentelemetry::KeyValue>) -> Self {
        Attributes::from(kvs.as_slice())
    }
}

impl From<&[opentelemetry::KeyValue]> for Attributes {
    fn from(kvs: &[opentelemetry::KeyValue]) -> Self {
        Attributes(
            kvs.iter()
                .map(|api_kv| KeyValue {
                    key: api_kv.key.as_str().to_string(),
                    value: Some(api_kv.value.clone().into()),
                })
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<AnyValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Attributes(
            iter.into_iter()
                .map(|(k, v)| KeyValue {
                    key: k.into(),
                    value: Some(v.into()),
                })
                .collect(),
        )
    }
}

impl From<Value> for AnyValue {
    fn from(value: Value) -> Self {
        AnyValue {
            value: match value {
                Value::Bool(val) => Some(any_value::Value::BoolValue(val)),
                Value::I64(val) => Some(any_value::Value::IntValue(val)),
                Value::F64(val) => Some(any_value::Value::DoubleValue(val)),
                Value::String(val) => Some(any_value::Value::StringValue(val.into_owned())),
                Value::Array(array) => Some(any_value::Value::ArrayValue(match array {
                    Array::Bool(vals) => array_into_proto(vals),
                    Array::I64(vals) => array_into_proto(vals),
                    Array::F64(vals) => array_into_proto(vals),
                    Array::String(vals) => array_into_proto(vals),
                })),
            },
        }
    }
}

fn array_into_proto<T>(vals: Vec<T>) -> ArrayValue
where
    Value: From<T>,
{
    let values = vals
        .into_iter()
        .map(|val| AnyValue::from(Value::from(val)))
        .collect();

    ArrayValue { values }
}

impl From<&opentelemetry::InstrumentationScope> for InstrumentationScope {
    fn from(scope: &opentelemetry::InstrumentationScope) -> Self {
        InstrumentationScope {
            name: scope.name().to_owned(),
            version: scope.version().map(ToOwned::to_owned).unwrap_or_default(),
            attributes: scope
                .attributes()
                .map(|kv| KeyValue {
                    key: kv.key.as_str().to_string(),
                    value: Some(kv.value.clone().into()),
                })
                .collect(),
            dropped_attributes_count: 0,
        }
    }
}

impl From<&opentelemetry_sdk::Resource> for Resource {
    fn from(resource: &opentelemetry_sdk::Resource) -> Self {
        Resource {
            attributes: resource
                .iter()
                .map(|(k, v)| KeyValue {
                    key: k.as_str().to_string(),
                    value: Some(v.clone().into()),
                })
                .collect(),
            dropped_attributes_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::KeyValue as ApiKeyValue;
    use std::borrow::Cow;

    #[test]
    fn arrays_become_array_values() {
        let value: AnyValue = Value::Array(Array::String(vec![
            Cow::Borrowed("a"),
            Cow::Borrowed("b"),
        ]))
        .into();

        let Some(any_value::Value::ArrayValue(array)) = value.value else {
            panic!("expected an array value");
        };
        assert_eq!(
            array.values,
            [
                AnyValue {
                    value: Some(any_value::Value::StringValue("a".into()))
                },
                AnyValue {
                    value: Some(any_value::Value::StringValue("b".into()))
                },
            ]
        );
    }

    #[test]
    fn scope_keeps_version_and_attributes() {
        let scope = opentelemetry::InstrumentationScope::builder("checkout")
            .with_version("1.2.0")
            .with_attributes([ApiKeyValue::new("team", "payments")])
            .build();

        let proto = InstrumentationScope::from(&scope);

        assert_eq!(proto.name, "checkout");
        assert_eq!(proto.version, "1.2.0");
        assert_eq!(proto.attributes.len(), 1);
        assert_eq!(proto.attributes[0].key, "team");
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn times_before_the_epoch_are_zero() {
        let before = UNIX_EPOCH - std::time::Duration::from_secs(1);
        assert_eq!(to_nanos(before), 0);
        assert_eq!(
            to_nanos(UNIX_EPOCH + std::time::Duration::from_nanos(1_500)),
            1_500
        );
    }
}
