use std::{borrow::Cow, collections::HashSet, fmt, sync::Arc};

use opentelemetry::{InstrumentationScope, Key};
use regex::Regex;

use super::aggregation::Aggregation;
use super::error::{MetricError, MetricResult};
use super::instrument::{InstrumentInfo, InstrumentKind};

/// Used to customize the metrics that are output by the SDK.
///
/// A view selects instruments by name, optionally narrowed by kind and by the
/// name of the meter that created them, and changes how their measurements
/// are aggregated: under which name and description, with which
/// [`Aggregation`], and keeping which attribute keys.
///
/// An instrument matched by several views produces one metric per view, each
/// with its own independently keyed data points. An instrument matched by no
/// view uses its default aggregation.
///
/// # Example
///
/// ```
/// use opentelemetry_sdk::metrics::{Aggregation, InstrumentKind, View};
///
/// let view = View::builder()
///     .with_instrument_name("http.server.*")
///     .with_instrument_kind(InstrumentKind::Histogram)
///     .with_aggregation(Aggregation::ExplicitBucketHistogram {
///         boundaries: vec![0.0, 0.1, 0.5, 1.0],
///         record_min_max: false,
///     })
///     .with_allowed_attribute_keys(["http.route"])
///     .build()
///     .unwrap();
/// # drop(view)
/// ```
#[derive(Clone)]
pub struct View {
    name: Cow<'static, str>,
    name_pattern: Option<Regex>,
    kind: Option<InstrumentKind>,
    meter_name: Option<Cow<'static, str>>,
    rename: Option<Cow<'static, str>>,
    description: Option<Cow<'static, str>>,
    aggregation: Option<Aggregation>,
    allowed_attribute_keys: Option<Arc<HashSet<Key>>>,
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("meter_name", &self.meter_name)
            .field("rename", &self.rename)
            .field("description", &self.description)
            .field("aggregation", &self.aggregation)
            .field("allowed_attribute_keys", &self.allowed_attribute_keys)
            .finish()
    }
}

impl View {
    /// Start configuring a view.
    pub fn builder() -> ViewBuilder {
        ViewBuilder::default()
    }

    pub(crate) fn matches(&self, instrument: &InstrumentInfo, scope: &InstrumentationScope) -> bool {
        let name_matches = match &self.name_pattern {
            Some(pattern) => pattern.is_match(&instrument.name),
            None => self.name == instrument.name,
        };

        name_matches
            && self.kind.map_or(true, |kind| kind == instrument.kind)
            && self
                .meter_name
                .as_ref()
                .map_or(true, |meter| meter.as_ref() == scope.name())
    }

    pub(crate) fn rename(&self) -> Option<&Cow<'static, str>> {
        self.rename.as_ref()
    }

    pub(crate) fn description(&self) -> Option<&Cow<'static, str>> {
        self.description.as_ref()
    }

    pub(crate) fn aggregation(&self) -> Option<&Aggregation> {
        self.aggregation.as_ref()
    }

    pub(crate) fn allowed_attribute_keys(&self) -> Option<&Arc<HashSet<Key>>> {
        self.allowed_attribute_keys.as_ref()
    }
}

/// Builder for [`View`].
#[derive(Default, Debug)]
pub struct ViewBuilder {
    name: Option<Cow<'static, str>>,
    kind: Option<InstrumentKind>,
    meter_name: Option<Cow<'static, str>>,
    rename: Option<Cow<'static, str>>,
    description: Option<Cow<'static, str>>,
    aggregation: Option<Aggregation>,
    allowed_attribute_keys: Option<Arc<HashSet<Key>>>,
}

impl ViewBuilder {
    /// Select instruments by name.
    ///
    /// `*` matches any run of characters and `?` matches exactly one, so
    /// `"*"` selects every instrument.
    pub fn with_instrument_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Only select instruments of this kind.
    pub fn with_instrument_kind(mut self, kind: InstrumentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Only select instruments created by a meter with this name.
    pub fn with_meter_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.meter_name = Some(name.into());
        self
    }

    /// Report the selected instrument under a different name.
    ///
    /// Only valid when the view selects a single instrument name.
    pub fn with_rename(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.rename = Some(name.into());
        self
    }

    /// Replace the instrument's description.
    pub fn with_description(mut self, description: impl Into<Cow<'static, str>>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Aggregate the selected instruments this way instead of their default.
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    /// Only keep these attribute keys on recorded measurements.
    ///
    /// Measurements that differ only in dropped keys are merged into the same
    /// data point. An empty set drops every attribute.
    pub fn with_allowed_attribute_keys<K: Into<Key>>(
        mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Self {
        self.allowed_attribute_keys = Some(Arc::new(keys.into_iter().map(Into::into).collect()));
        self
    }

    /// Validate the configuration and create the view.
    pub fn build(self) -> MetricResult<View> {
        let name = match self.name {
            Some(name) if !name.is_empty() => name,
            _ => {
                return Err(MetricError::Config(
                    "view: an instrument name to match is required".into(),
                ))
            }
        };

        let is_pattern = name.contains(['*', '?']);
        if is_pattern && self.rename.is_some() {
            return Err(MetricError::Config(format!(
                "view: cannot rename instruments matched by the wildcard pattern {name:?}"
            )));
        }

        if let Some(aggregation) = &self.aggregation {
            aggregation.validate()?;
        }

        let name_pattern = if is_pattern {
            Some(wildcard_regex(&name)?)
        } else {
            None
        };

        Ok(View {
            name,
            name_pattern,
            kind: self.kind,
            meter_name: self.meter_name,
            rename: self.rename,
            description: self.description,
            aggregation: self.aggregation,
            allowed_attribute_keys: self.allowed_attribute_keys,
        })
    }
}

fn wildcard_regex(pattern: &str) -> MetricResult<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 2);
    expr.push('^');
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push('$');

    Regex::new(&expr).map_err(|err| MetricError::Config(format!("view: {err}")))
}
