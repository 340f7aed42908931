use std::borrow::{Borrow, Cow};
use std::fmt;
use std::hash::{self, Hash};

/// Name of an attribute.
///
/// Keys are compared and hashed by their string content, so a key built from
/// a `&'static str` equals one built from an owned `String`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Cow<'static, str>);

impl Key {
    /// Create a new `Key`.
    ///
    /// ```
    /// use opentelemetry::Key;
    ///
    /// let static_key = Key::new("http.method");
    /// let owned_key = Key::new(String::from("http.route"));
    /// assert_ne!(static_key, owned_key);
    /// ```
    pub fn new(value: impl Into<Key>) -> Self {
        value.into()
    }

    /// Create a key from a static string in a `const` context.
    pub const fn from_static_str(value: &'static str) -> Self {
        Key(Cow::Borrowed(value))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key has no characters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&'static str> for Key {
    fn from(key: &'static str) -> Self {
        Key(Cow::Borrowed(key))
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Key(Cow::Owned(key))
    }
}

impl From<Cow<'static, str>> for Key {
    fn from(key: Cow<'static, str>) -> Self {
        Key(key)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0.into_owned()
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// A homogeneous array attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum Array {
    /// Array of booleans
    Bool(Vec<bool>),
    /// Array of integers
    I64(Vec<i64>),
    /// Array of floats
    F64(Vec<f64>),
    /// Array of strings
    String(Vec<Cow<'static, str>>),
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{item}")?;
            }
            f.write_str("]")
        }

        match self {
            Array::Bool(values) => join(f, values),
            Array::I64(values) => join(f, values),
            Array::F64(values) => join(f, values),
            Array::String(values) => {
                let quoted: Vec<String> = values.iter().map(|v| format!("\"{v}\"")).collect();
                join(f, &quoted)
            }
        }
    }
}

impl From<Vec<bool>> for Array {
    fn from(values: Vec<bool>) -> Self {
        Array::Bool(values)
    }
}

impl From<Vec<i64>> for Array {
    fn from(values: Vec<i64>) -> Self {
        Array::I64(values)
    }
}

impl From<Vec<f64>> for Array {
    fn from(values: Vec<f64>) -> Self {
        Array::F64(values)
    }
}

impl From<Vec<Cow<'static, str>>> for Array {
    fn from(values: Vec<Cow<'static, str>>) -> Self {
        Array::String(values)
    }
}

/// Value of a metric or resource attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Boolean value
    Bool(bool),
    /// Signed integer value
    I64(i64),
    /// Floating point value
    F64(f64),
    /// String value
    String(Cow<'static, str>),
    /// Homogeneous array
    Array(Array),
}

impl Value {
    /// String rendering of the value. Allocates unless the value is a string.
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Value::String(s) => Cow::Borrowed(s.as_ref()),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I64(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<&'static str> for Value {
    fn from(v: &'static str) -> Self {
        Value::String(Cow::Borrowed(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Cow::Owned(v))
    }
}

impl From<Cow<'static, str>> for Value {
    fn from(v: Cow<'static, str>) -> Self {
        Value::String(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Value::Array(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Array(v) => write!(f, "{v}"),
        }
    }
}

/// An attribute: a [`Key`] paired with a [`Value`].
#[derive(Clone, Debug, PartialEq)]
pub struct KeyValue {
    /// The attribute name
    pub key: Key,
    /// The attribute value
    pub value: Value,
}

impl KeyValue {
    /// Create a new attribute.
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<Key>,
        V: Into<Value>,
    {
        KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

// Floats hash and compare by bit pattern so attribute sets can key hash maps.
impl Eq for KeyValue {}

impl hash::Hash for KeyValue {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        hash_value(&self.value, state);
    }
}

fn hash_value<H: hash::Hasher>(value: &Value, state: &mut H) {
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Bool(v) => v.hash(state),
        Value::I64(v) => v.hash(state),
        Value::F64(v) => v.to_bits().hash(state),
        Value::String(v) => v.hash(state),
        Value::Array(array) => match array {
            Array::Bool(v) => v.hash(state),
            Array::I64(v) => v.hash(state),
            Array::F64(v) => v.iter().for_each(|f| f.to_bits().hash(state)),
            Array::String(v) => v.hash(state),
        },
    }
}

/// Identifies the library or module that produced a piece of telemetry.
///
/// Two scopes are the same when their name, version and schema URL match;
/// attributes do not take part in identity.
#[derive(Debug, Default, Clone)]
pub struct InstrumentationScope {
    name: Cow<'static, str>,
    version: Option<Cow<'static, str>>,
    schema_url: Option<Cow<'static, str>>,
    attributes: Vec<KeyValue>,
}

impl PartialEq for InstrumentationScope {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.schema_url == other.schema_url
    }
}

impl Eq for InstrumentationScope {}

impl hash::Hash for InstrumentationScope {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
        self.schema_url.hash(state);
    }
}

impl InstrumentationScope {
    /// Start building a scope with the given name.
    pub fn builder(name: impl Into<Cow<'static, str>>) -> InstrumentationScopeBuilder {
        InstrumentationScopeBuilder {
            scope: InstrumentationScope {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    /// Scope name, empty when the caller gave none.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scope version.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Schema URL of the telemetry produced under this scope.
    pub fn schema_url(&self) -> Option<&str> {
        self.schema_url.as_deref()
    }

    /// Attributes attached to the scope.
    pub fn attributes(&self) -> impl Iterator<Item = &KeyValue> {
        self.attributes.iter()
    }
}

/// Builder for [`InstrumentationScope`].
///
/// ```
/// use opentelemetry::{InstrumentationScope, KeyValue};
///
/// let scope = InstrumentationScope::builder("my-crate")
///     .with_version("0.1.0")
///     .with_attributes([KeyValue::new("component", "http")])
///     .build();
/// assert_eq!(scope.version(), Some("0.1.0"));
/// ```
#[derive(Debug)]
pub struct InstrumentationScopeBuilder {
    scope: InstrumentationScope,
}

impl InstrumentationScopeBuilder {
    /// Set the scope version.
    pub fn with_version(mut self, version: impl Into<Cow<'static, str>>) -> Self {
        self.scope.version = Some(version.into());
        self
    }

    /// Set the schema URL.
    pub fn with_schema_url(mut self, schema_url: impl Into<Cow<'static, str>>) -> Self {
        self.scope.schema_url = Some(schema_url.into());
        self
    }

    /// Set the scope attributes, replacing any set before.
    pub fn with_attributes<I>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = KeyValue>,
    {
        self.scope.attributes = attributes.into_iter().collect();
        self
    }

    /// Finish the scope.
    pub fn build(self) -> InstrumentationScope {
        self.scope
    }
}
