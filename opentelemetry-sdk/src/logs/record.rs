use crate::Resource;
use opentelemetry::{
    logs::{AnyValue, Severity},
    otel_warn,
    trace::{SpanId, TraceFlags, TraceId},
    InstrumentationScope, Key,
};
use std::{
    borrow::Cow,
    env,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

/// Maximum number of attributes kept on a log record.
pub(crate) const OTEL_LOGRECORD_ATTRIBUTE_COUNT_LIMIT: &str = "OTEL_LOGRECORD_ATTRIBUTE_COUNT_LIMIT";
/// Maximum length of a string attribute value on a log record.
pub(crate) const OTEL_LOGRECORD_ATTRIBUTE_VALUE_LENGTH_LIMIT: &str =
    "OTEL_LOGRECORD_ATTRIBUTE_VALUE_LENGTH_LIMIT";
/// Generic attribute count limit, used when the log-specific one is unset.
pub(crate) const OTEL_ATTRIBUTE_COUNT_LIMIT: &str = "OTEL_ATTRIBUTE_COUNT_LIMIT";
/// Generic value length limit, used when the log-specific one is unset.
pub(crate) const OTEL_ATTRIBUTE_VALUE_LENGTH_LIMIT: &str = "OTEL_ATTRIBUTE_VALUE_LENGTH_LIMIT";
/// Default attribute count limit.
pub(crate) const OTEL_LOGRECORD_ATTRIBUTE_COUNT_LIMIT_DEFAULT: usize = 128;

const TRUNCATION_SUFFIX: &str = "...";

/// Limits applied to the attributes of every log record a logger emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogRecordLimits {
    /// Attributes beyond this count are dropped, oldest first.
    pub attribute_count_limit: usize,
    /// String values longer than this many characters are truncated. `None`
    /// leaves values untouched.
    pub attribute_length_limit: Option<usize>,
}

impl Default for LogRecordLimits {
    /// Limits from `OTEL_LOGRECORD_ATTRIBUTE_COUNT_LIMIT` and
    /// `OTEL_LOGRECORD_ATTRIBUTE_VALUE_LENGTH_LIMIT`, falling back to the
    /// generic `OTEL_ATTRIBUTE_*` variables, then to 128 attributes of
    /// unlimited length.
    fn default() -> Self {
        LogRecordLimits {
            attribute_count_limit: limit_from_env(
                OTEL_LOGRECORD_ATTRIBUTE_COUNT_LIMIT,
                OTEL_ATTRIBUTE_COUNT_LIMIT,
            )
            .unwrap_or(OTEL_LOGRECORD_ATTRIBUTE_COUNT_LIMIT_DEFAULT),
            attribute_length_limit: limit_from_env(
                OTEL_LOGRECORD_ATTRIBUTE_VALUE_LENGTH_LIMIT,
                OTEL_ATTRIBUTE_VALUE_LENGTH_LIMIT,
            ),
        }
    }
}

impl LogRecordLimits {
    /// Limits with explicit values, ignoring the environment.
    pub fn new(attribute_count_limit: usize, attribute_length_limit: Option<usize>) -> Self {
        LogRecordLimits {
            attribute_count_limit,
            attribute_length_limit,
        }
    }
}

fn limit_from_env(specific: &str, generic: &str) -> Option<usize> {
    [specific, generic].into_iter().find_map(|name| {
        let raw = env::var(name).ok()?;
        match raw.trim().parse::<usize>() {
            Ok(limit) => Some(limit),
            Err(_) => {
                otel_warn!(
                    name: "LogRecordLimits.InvalidEnvValue",
                    variable = name,
                    value = raw.as_str()
                );
                None
            }
        }
    })
}

/// Trace correlation of a log record.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceContext {
    /// Trace id
    pub trace_id: TraceId,
    /// Span id
    pub span_id: SpanId,
    /// Trace flags
    pub trace_flags: Option<TraceFlags>,
}

/// A log record under construction.
///
/// Obtained from [`SdkLogger::create_log_record`], filled in by the caller and
/// handed back through [`SdkLogger::emit`]. The record inherits the resource,
/// instrumentation scope and attribute limits of the logger that created it.
///
/// [`SdkLogger::create_log_record`]: crate::logs::SdkLogger::create_log_record
/// [`SdkLogger::emit`]: crate::logs::SdkLogger::emit
#[derive(Debug, Clone)]
pub struct SdkLogRecord {
    pub(crate) timestamp: Option<SystemTime>,
    pub(crate) observed_timestamp: Option<SystemTime>,
    pub(crate) severity_text: Option<Cow<'static, str>>,
    pub(crate) severity_number: Option<Severity>,
    pub(crate) body: Option<AnyValue>,
    pub(crate) attributes: Vec<(Key, AnyValue)>,
    pub(crate) trace_context: Option<TraceContext>,
    pub(crate) resource: Resource,
    pub(crate) scope: Arc<InstrumentationScope>,
    limits: LogRecordLimits,
    total_recorded_attributes: usize,
}

impl SdkLogRecord {
    pub(crate) fn new(
        resource: Resource,
        scope: Arc<InstrumentationScope>,
        limits: LogRecordLimits,
    ) -> Self {
        SdkLogRecord {
            timestamp: None,
            observed_timestamp: None,
            severity_text: None,
            severity_number: None,
            body: None,
            attributes: Vec::new(),
            trace_context: None,
            resource,
            scope,
            limits,
            total_recorded_attributes: 0,
        }
    }

    /// Time the event occurred.
    pub fn set_timestamp(&mut self, timestamp: SystemTime) {
        self.timestamp = Some(timestamp);
    }

    /// Time the event was observed. Defaults to the timestamp, or the emit time.
    pub fn set_observed_timestamp(&mut self, timestamp: SystemTime) {
        self.observed_timestamp = Some(timestamp);
    }

    /// Severity as reported by the source, e.g. `"warning"`.
    pub fn set_severity_text(&mut self, text: impl Into<Cow<'static, str>>) {
        self.severity_text = Some(text.into());
    }

    /// Normalized severity.
    pub fn set_severity_number(&mut self, number: Severity) {
        self.severity_number = Some(number);
    }

    /// Record body.
    pub fn set_body(&mut self, body: AnyValue) {
        self.body = Some(body);
    }

    /// Correlate the record with a span.
    pub fn set_trace_context(
        &mut self,
        trace_id: TraceId,
        span_id: SpanId,
        trace_flags: Option<TraceFlags>,
    ) {
        self.trace_context = Some(TraceContext {
            trace_id,
            span_id,
            trace_flags,
        });
    }

    /// Add an attribute. Setting a key that is already present replaces its
    /// value and keeps its position.
    pub fn add_attribute<K, V>(&mut self, key: K, value: V)
    where
        K: Into<Key>,
        V: Into<AnyValue>,
    {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => {
                self.total_recorded_attributes += 1;
                self.attributes.push((key, value));
            }
        }
    }

    /// Add several attributes, in order.
    pub fn add_attributes<I, K, V>(&mut self, attributes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<AnyValue>,
    {
        for (key, value) in attributes {
            self.add_attribute(key, value);
        }
    }

    /// Record timestamp.
    pub fn timestamp(&self) -> Option<SystemTime> {
        self.timestamp
    }

    /// Observed timestamp.
    pub fn observed_timestamp(&self) -> Option<SystemTime> {
        self.observed_timestamp
    }

    /// Severity text.
    pub fn severity_text(&self) -> Option<&str> {
        self.severity_text.as_deref()
    }

    /// Severity number.
    pub fn severity_number(&self) -> Option<Severity> {
        self.severity_number
    }

    /// Record body.
    pub fn body(&self) -> Option<&AnyValue> {
        self.body.as_ref()
    }

    /// Attributes in insertion order.
    pub fn attributes_iter(&self) -> impl Iterator<Item = &(Key, AnyValue)> {
        self.attributes.iter()
    }

    /// Value of the attribute with the given key.
    pub fn attribute(&self, key: &Key) -> Option<&AnyValue> {
        self.attributes
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Trace correlation.
    pub fn trace_context(&self) -> Option<&TraceContext> {
        self.trace_context.as_ref()
    }

    /// Scope of the logger that created this record.
    pub fn instrumentation_scope(&self) -> &InstrumentationScope {
        &self.scope
    }

    /// Resource of the provider that created this record.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Fill in the observed timestamp and apply the attribute limits. Called
    /// once, when the record is emitted.
    pub(crate) fn finish(&mut self) {
        if self.observed_timestamp.is_none() {
            self.observed_timestamp = Some(self.timestamp.unwrap_or_else(SystemTime::now));
        }

        self.attributes.retain(|(key, _)| !key.is_empty());

        let excess = self
            .attributes
            .len()
            .saturating_sub(self.limits.attribute_count_limit);
        if excess > 0 {
            self.attributes.drain(..excess);
        }

        if let Some(limit) = self.limits.attribute_length_limit {
            for (_, value) in self.attributes.iter_mut() {
                truncate_value(value, limit);
            }
        }
    }

    /// Attributes recorded but not kept, because of an empty key or the count limit.
    pub fn dropped_attributes_count(&self) -> u32 {
        let dropped = self
            .total_recorded_attributes
            .saturating_sub(self.attributes.len());
        u32::try_from(dropped).unwrap_or(u32::MAX)
    }

    /// Immutable export form of this record.
    pub fn to_log_record_data(&self) -> LogRecordData {
        LogRecordData {
            timestamp: self.timestamp.map(to_nanos),
            observed_timestamp: self
                .observed_timestamp
                .or(self.timestamp)
                .map(to_nanos)
                .unwrap_or_else(|| to_nanos(SystemTime::now())),
            severity_text: self.severity_text.clone(),
            severity_number: self.severity_number,
            body: self.body.clone(),
            attributes: self.attributes.clone(),
            trace_context: self.trace_context.clone(),
            resource: self.resource.clone(),
            scope: Arc::clone(&self.scope),
            dropped_attributes_count: self.dropped_attributes_count(),
        }
    }
}

fn truncate_value(value: &mut AnyValue, limit: usize) {
    match value {
        AnyValue::String(s) => {
            if let Some(truncated) = truncate_str(s, limit) {
                *s = Cow::Owned(truncated);
            }
        }
        AnyValue::ListAny(items) => {
            for item in items.iter_mut() {
                if let AnyValue::String(s) = item {
                    if let Some(truncated) = truncate_str(s, limit) {
                        *s = Cow::Owned(truncated);
                    }
                }
            }
        }
        _ => {}
    }
}

/// `None` when `s` fits. Counts characters, not bytes.
fn truncate_str(s: &str, limit: usize) -> Option<String> {
    if s.chars().count() <= limit {
        return None;
    }
    if limit < TRUNCATION_SUFFIX.len() {
        return Some(s.chars().take(limit).collect());
    }
    let mut truncated: String = s.chars().take(limit - TRUNCATION_SUFFIX.len()).collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    Some(truncated)
}

pub(crate) fn to_nanos(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Export form of a log record.
///
/// Built by the processors right before export and handed to exporters by
/// shared reference; it offers no way to change its contents.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecordData {
    timestamp: Option<u64>,
    observed_timestamp: u64,
    severity_text: Option<Cow<'static, str>>,
    severity_number: Option<Severity>,
    body: Option<AnyValue>,
    attributes: Vec<(Key, AnyValue)>,
    trace_context: Option<TraceContext>,
    resource: Resource,
    scope: Arc<InstrumentationScope>,
    dropped_attributes_count: u32,
}

impl LogRecordData {
    /// Event time in nanoseconds since the Unix epoch.
    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp
    }

    /// Observation time in nanoseconds since the Unix epoch.
    pub fn observed_timestamp(&self) -> u64 {
        self.observed_timestamp
    }

    /// Severity text.
    pub fn severity_text(&self) -> Option<&str> {
        self.severity_text.as_deref()
    }

    /// Severity number.
    pub fn severity_number(&self) -> Option<Severity> {
        self.severity_number
    }

    /// Record body.
    pub fn body(&self) -> Option<&AnyValue> {
        self.body.as_ref()
    }

    /// Attributes after limits were applied.
    pub fn attributes(&self) -> impl Iterator<Item = &(Key, AnyValue)> {
        self.attributes.iter()
    }

    /// Trace correlation.
    pub fn trace_context(&self) -> Option<&TraceContext> {
        self.trace_context.as_ref()
    }

    /// Resource of the producing provider.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Scope of the producing logger.
    pub fn instrumentation_scope(&self) -> &InstrumentationScope {
        &self.scope
    }

    /// Attributes recorded but not kept.
    pub fn dropped_attributes_count(&self) -> u32 {
        self.dropped_attributes_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record_with_limits(limits: LogRecordLimits) -> SdkLogRecord {
        SdkLogRecord::new(
            Resource::empty(),
            Arc::new(InstrumentationScope::builder("test").build()),
            limits,
        )
    }

    #[test]
    fn count_limit_evicts_oldest() {
        let mut record = record_with_limits(LogRecordLimits::new(2, None));
        record.add_attributes([("a", 1), ("b", 2), ("c", 3)]);
        record.finish();

        let keys: Vec<&str> = record.attributes_iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "c"]);
        assert_eq!(record.dropped_attributes_count(), 1);
    }

    #[test]
    fn empty_keys_are_dropped_and_counted() {
        let mut record = record_with_limits(LogRecordLimits::new(10, None));
        record.add_attribute("", "ignored");
        record.add_attribute("kept", "v");
        record.finish();

        assert_eq!(record.attributes_iter().count(), 1);
        assert_eq!(record.dropped_attributes_count(), 1);
    }

    #[test]
    fn updating_a_key_keeps_its_position() {
        let mut record = record_with_limits(LogRecordLimits::new(10, None));
        record.add_attributes([("a", 1), ("b", 2)]);
        record.add_attribute("a", 3);

        let attrs: Vec<_> = record.attributes_iter().cloned().collect();
        assert_eq!(
            attrs,
            [
                (Key::new("a"), AnyValue::Int(3)),
                (Key::new("b"), AnyValue::Int(2))
            ]
        );
        assert_eq!(record.dropped_attributes_count(), 0);
    }

    #[test]
    fn long_strings_are_truncated() {
        let mut record = record_with_limits(LogRecordLimits::new(10, Some(6)));
        record.add_attribute("short", "abc");
        record.add_attribute("long", "abcdefghij");
        record.add_attribute(
            "list",
            AnyValue::ListAny(vec!["0123456789".into(), AnyValue::Int(5)]),
        );
        record.finish();

        assert_eq!(record.attribute(&Key::new("short")), Some(&AnyValue::from("abc")));
        assert_eq!(record.attribute(&Key::new("long")), Some(&AnyValue::from("abc...")));
        assert_eq!(
            record.attribute(&Key::new("list")),
            Some(&AnyValue::ListAny(vec!["012...".into(), AnyValue::Int(5)]))
        );
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_str("héllo wörld", 8).as_deref(), Some("héllo..."));
        assert_eq!(truncate_str("abcdef", 2).as_deref(), Some("ab"));
        assert_eq!(truncate_str("abc", 3), None);
    }

    #[test]
    fn observed_timestamp_falls_back_to_timestamp() {
        let ts = UNIX_EPOCH + Duration::from_nanos(1_500);
        let mut record = record_with_limits(LogRecordLimits::new(10, None));
        record.set_timestamp(ts);
        record.finish();

        let data = record.to_log_record_data();
        assert_eq!(data.timestamp(), Some(1_500));
        assert_eq!(data.observed_timestamp(), 1_500);
    }

    #[test]
    fn observed_timestamp_defaults_to_now() {
        let before = to_nanos(SystemTime::now());
        let mut record = record_with_limits(LogRecordLimits::new(10, None));
        record.finish();
        let data = record.to_log_record_data();

        assert_eq!(data.timestamp(), None);
        assert!(data.observed_timestamp() >= before);
    }

    #[test]
    fn limits_from_env() {
        temp_env::with_vars(
            [
                (OTEL_LOGRECORD_ATTRIBUTE_COUNT_LIMIT, None),
                (OTEL_ATTRIBUTE_COUNT_LIMIT, Some("7")),
                (OTEL_LOGRECORD_ATTRIBUTE_VALUE_LENGTH_LIMIT, Some("32")),
                (OTEL_ATTRIBUTE_VALUE_LENGTH_LIMIT, Some("64")),
            ],
            || {
                let limits = LogRecordLimits::default();
                assert_eq!(limits.attribute_count_limit, 7);
                assert_eq!(limits.attribute_length_limit, Some(32));
            },
        );

        temp_env::with_vars(
            [
                (OTEL_LOGRECORD_ATTRIBUTE_COUNT_LIMIT, Some("many")),
                (OTEL_ATTRIBUTE_COUNT_LIMIT, None),
                (OTEL_LOGRECORD_ATTRIBUTE_VALUE_LENGTH_LIMIT, None),
                (OTEL_ATTRIBUTE_VALUE_LENGTH_LIMIT, None),
            ],
            || {
                let limits = LogRecordLimits::default();
                assert_eq!(
                    limits.attribute_count_limit,
                    OTEL_LOGRECORD_ATTRIBUTE_COUNT_LIMIT_DEFAULT
                );
                assert_eq!(limits.attribute_length_limit, None);
            },
        );
    }
}
