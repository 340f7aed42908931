use crate::{Array, Key, Value};
use std::borrow::Cow;
use std::collections::HashMap;

/// Body or attribute value of a log record.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyValue {
    /// Signed integer
    Int(i64),
    /// Floating point number
    Double(f64),
    /// UTF-8 string
    String(Cow<'static, str>),
    /// Boolean
    Boolean(bool),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Ordered list of values, possibly of mixed types
    ListAny(Vec<AnyValue>),
    /// Nested map keyed by string
    Map(HashMap<Key, AnyValue>),
}

impl AnyValue {
    /// The string content when this is [`AnyValue::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! any_value_from {
    ($variant:ident: $($t:ty),+) => {
        $(
            impl From<$t> for AnyValue {
                fn from(value: $t) -> Self {
                    AnyValue::$variant(value.into())
                }
            }
        )+
    };
}

any_value_from!(Int: i8, i16, i32, i64, u8, u16, u32);
any_value_from!(Double: f32, f64);
any_value_from!(String: &'static str, String, Cow<'static, str>);
any_value_from!(Boolean: bool);

impl<T: Into<AnyValue>> FromIterator<T> for AnyValue {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        AnyValue::ListAny(iter.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<Key>, V: Into<AnyValue>> FromIterator<(K, V)> for AnyValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        AnyValue::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Value> for AnyValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => AnyValue::Boolean(b),
            Value::I64(i) => AnyValue::Int(i),
            Value::F64(f) => AnyValue::Double(f),
            Value::String(s) => AnyValue::String(s),
            Value::Array(Array::Bool(items)) => items.into_iter().collect(),
            Value::Array(Array::I64(items)) => items.into_iter().collect(),
            Value::Array(Array::F64(items)) => items.into_iter().collect(),
            Value::Array(Array::String(items)) => items.into_iter().collect(),
        }
    }
}

/// Normalized severity of a log record.
///
/// Each of the six ranges has four levels; the first level of a range carries
/// the plain name (`INFO`) and the others a numeric suffix (`INFO2`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub enum Severity {
    #[allow(missing_docs)]
    Trace = 1,
    #[allow(missing_docs)]
    Trace2 = 2,
    #[allow(missing_docs)]
    Trace3 = 3,
    #[allow(missing_docs)]
    Trace4 = 4,
    #[allow(missing_docs)]
    Debug = 5,
    #[allow(missing_docs)]
    Debug2 = 6,
    #[allow(missing_docs)]
    Debug3 = 7,
    #[allow(missing_docs)]
    Debug4 = 8,
    #[allow(missing_docs)]
    Info = 9,
    #[allow(missing_docs)]
    Info2 = 10,
    #[allow(missing_docs)]
    Info3 = 11,
    #[allow(missing_docs)]
    Info4 = 12,
    #[allow(missing_docs)]
    Warn = 13,
    #[allow(missing_docs)]
    Warn2 = 14,
    #[allow(missing_docs)]
    Warn3 = 15,
    #[allow(missing_docs)]
    Warn4 = 16,
    #[allow(missing_docs)]
    Error = 17,
    #[allow(missing_docs)]
    Error2 = 18,
    #[allow(missing_docs)]
    Error3 = 19,
    #[allow(missing_docs)]
    Error4 = 20,
    #[allow(missing_docs)]
    Fatal = 21,
    #[allow(missing_docs)]
    Fatal2 = 22,
    #[allow(missing_docs)]
    Fatal3 = 23,
    #[allow(missing_docs)]
    Fatal4 = 24,
}

const SEVERITY_NAMES: [&str; 24] = [
    "TRACE", "TRACE2", "TRACE3", "TRACE4", "DEBUG", "DEBUG2", "DEBUG3", "DEBUG4", "INFO",
    "INFO2", "INFO3", "INFO4", "WARN", "WARN2", "WARN3", "WARN4", "ERROR", "ERROR2", "ERROR3",
    "ERROR4", "FATAL", "FATAL2", "FATAL3", "FATAL4",
];

const SEVERITIES: [Severity; 24] = [
    Severity::Trace,
    Severity::Trace2,
    Severity::Trace3,
    Severity::Trace4,
    Severity::Debug,
    Severity::Debug2,
    Severity::Debug3,
    Severity::Debug4,
    Severity::Info,
    Severity::Info2,
    Severity::Info3,
    Severity::Info4,
    Severity::Warn,
    Severity::Warn2,
    Severity::Warn3,
    Severity::Warn4,
    Severity::Error,
    Severity::Error2,
    Severity::Error3,
    Severity::Error4,
    Severity::Fatal,
    Severity::Fatal2,
    Severity::Fatal3,
    Severity::Fatal4,
];

impl Severity {
    /// Short name, e.g. `"WARN2"`.
    pub const fn name(&self) -> &'static str {
        SEVERITY_NAMES[*self as usize - 1]
    }

    /// Severity for a number in `1..=24`.
    pub fn from_number(number: i32) -> Option<Severity> {
        usize::try_from(number)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| SEVERITIES.get(idx).copied())
    }
}
