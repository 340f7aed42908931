use std::{borrow::Cow, sync::Arc};

use opentelemetry::{otel_warn, InstrumentationScope};

use super::aggregation::Aggregation;
use super::error::{MetricError, MetricResult};
use super::instrument::{
    Counter, Gauge, HistogramBuilder, InstrumentBuilder, InstrumentInfo, NoopSyncInstrument,
    SyncInstrument, UpDownCounter, INSTRUMENT_NAME_ALLOWED_NON_ALPHANUMERIC_CHARS,
    INSTRUMENT_NAME_EMPTY, INSTRUMENT_NAME_FIRST_ALPHABETIC, INSTRUMENT_NAME_INVALID_CHAR,
    INSTRUMENT_NAME_LENGTH, INSTRUMENT_NAME_MAX_LENGTH, INSTRUMENT_UNIT_INVALID_CHAR,
    INSTRUMENT_UNIT_LENGTH, INSTRUMENT_UNIT_NAME_MAX_LENGTH,
};
use super::internal::Number;
use super::pipeline::Pipeline;

/// Creates instruments on behalf of one instrumentation scope.
///
/// Obtained from [`SdkMeterProvider::meter`](super::SdkMeterProvider::meter).
/// Creating the same instrument (name, description, unit, kind and number
/// type) twice on meters of the same scope returns handles to the same
/// aggregated state.
///
/// A meter obtained after the provider shut down creates instruments that
/// record nothing.
#[derive(Clone)]
pub struct SdkMeter {
    scope: InstrumentationScope,
    pipeline: Option<Arc<Pipeline>>,
}

impl std::fmt::Debug for SdkMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkMeter")
            .field("scope", &self.scope)
            .field("noop", &self.pipeline.is_none())
            .finish()
    }
}

impl SdkMeter {
    pub(crate) fn new(scope: InstrumentationScope, pipeline: Arc<Pipeline>) -> Self {
        SdkMeter {
            scope,
            pipeline: Some(pipeline),
        }
    }

    pub(crate) fn noop(scope: InstrumentationScope) -> Self {
        SdkMeter {
            scope,
            pipeline: None,
        }
    }

    /// The scope this meter was created with.
    pub fn scope(&self) -> &InstrumentationScope {
        &self.scope
    }

    /// creates an instrument builder for recording increasing u64 values.
    pub fn u64_counter(&self, name: impl Into<Cow<'static, str>>) -> InstrumentBuilder<'_, Counter<u64>> {
        InstrumentBuilder::new(self, name.into())
    }

    /// creates an instrument builder for recording increasing f64 values.
    pub fn f64_counter(&self, name: impl Into<Cow<'static, str>>) -> InstrumentBuilder<'_, Counter<f64>> {
        InstrumentBuilder::new(self, name.into())
    }

    /// creates an instrument builder for recording changes of an i64 value.
    pub fn i64_up_down_counter(
        &self,
        name: impl Into<Cow<'static, str>>,
    ) -> InstrumentBuilder<'_, UpDownCounter<i64>> {
        InstrumentBuilder::new(self, name.into())
    }

    /// creates an instrument builder for recording changes of an f64 value.
    pub fn f64_up_down_counter(
        &self,
        name: impl Into<Cow<'static, str>>,
    ) -> InstrumentBuilder<'_, UpDownCounter<f64>> {
        InstrumentBuilder::new(self, name.into())
    }

    /// creates an instrument builder for recording a distribution of u64 values.
    pub fn u64_histogram(&self, name: impl Into<Cow<'static, str>>) -> HistogramBuilder<'_, u64> {
        HistogramBuilder::new(self, name.into())
    }

    /// creates an instrument builder for recording a distribution of f64 values.
    pub fn f64_histogram(&self, name: impl Into<Cow<'static, str>>) -> HistogramBuilder<'_, f64> {
        HistogramBuilder::new(self, name.into())
    }

    /// creates an instrument builder for recording independent u64 values.
    pub fn u64_gauge(&self, name: impl Into<Cow<'static, str>>) -> InstrumentBuilder<'_, Gauge<u64>> {
        InstrumentBuilder::new(self, name.into())
    }

    /// creates an instrument builder for recording independent i64 values.
    pub fn i64_gauge(&self, name: impl Into<Cow<'static, str>>) -> InstrumentBuilder<'_, Gauge<i64>> {
        InstrumentBuilder::new(self, name.into())
    }

    /// creates an instrument builder for recording independent f64 values.
    pub fn f64_gauge(&self, name: impl Into<Cow<'static, str>>) -> InstrumentBuilder<'_, Gauge<f64>> {
        InstrumentBuilder::new(self, name.into())
    }

    pub(crate) fn sync_instrument<T: Number>(
        &self,
        instrument: InstrumentInfo,
        boundaries: Option<Vec<f64>>,
    ) -> Arc<dyn SyncInstrument<T>> {
        let Some(pipeline) = &self.pipeline else {
            return Arc::new(NoopSyncInstrument);
        };

        if let Err(err) = validate_instrument_config(&instrument, boundaries.as_deref()) {
            otel_warn!(
                name: "MeterProvider.InstrumentCreationFailed",
                meter_name = self.scope.name(),
                instrument_name = instrument.name.as_ref(),
                message = "Measurements from this instrument will be ignored.",
                reason = format!("{err}")
            );
            return Arc::new(NoopSyncInstrument);
        }

        pipeline.register::<T>(&self.scope, instrument, boundaries)
    }
}

fn validate_instrument_config(
    instrument: &InstrumentInfo,
    boundaries: Option<&[f64]>,
) -> MetricResult<()> {
    validate_instrument_name(&instrument.name)?;
    validate_instrument_unit(&instrument.unit)?;
    if let Some(boundaries) = boundaries {
        Aggregation::ExplicitBucketHistogram {
            boundaries: boundaries.to_vec(),
            record_min_max: true,
        }
        .validate()?;
    }
    Ok(())
}

fn validate_instrument_name(name: &str) -> MetricResult<()> {
    if name.is_empty() {
        return Err(MetricError::InvalidInstrumentConfiguration(
            INSTRUMENT_NAME_EMPTY,
        ));
    }
    if name.len() > INSTRUMENT_NAME_MAX_LENGTH {
        return Err(MetricError::InvalidInstrumentConfiguration(
            INSTRUMENT_NAME_LENGTH,
        ));
    }
    if name.starts_with(|c: char| !c.is_ascii_alphabetic()) {
        return Err(MetricError::InvalidInstrumentConfiguration(
            INSTRUMENT_NAME_FIRST_ALPHABETIC,
        ));
    }
    if name.contains(|c: char| {
        !c.is_ascii_alphanumeric() && !INSTRUMENT_NAME_ALLOWED_NON_ALPHANUMERIC_CHARS.contains(&c)
    }) {
        return Err(MetricError::InvalidInstrumentConfiguration(
            INSTRUMENT_NAME_INVALID_CHAR,
        ));
    }
    Ok(())
}

fn validate_instrument_unit(unit: &str) -> MetricResult<()> {
    if unit.len() > INSTRUMENT_UNIT_NAME_MAX_LENGTH {
        return Err(MetricError::InvalidInstrumentConfiguration(
            INSTRUMENT_UNIT_LENGTH,
        ));
    }
    if unit.contains(|c: char| !c.is_ascii()) {
        return Err(MetricError::InvalidInstrumentConfiguration(
            INSTRUMENT_UNIT_INVALID_CHAR,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("validateName", None)]
    #[case("_startWithNoneAlphabet", Some(INSTRUMENT_NAME_FIRST_ALPHABETIC))]
    #[case("utf8char锈", Some(INSTRUMENT_NAME_INVALID_CHAR))]
    #[case("a".repeat(255).leak(), None)]
    #[case("a".repeat(256).leak(), Some(INSTRUMENT_NAME_LENGTH))]
    #[case("invalid name", Some(INSTRUMENT_NAME_INVALID_CHAR))]
    #[case("allow/slash", None)]
    #[case("allow_under_score", None)]
    #[case("allow.dots.ok", None)]
    #[case("", Some(INSTRUMENT_NAME_EMPTY))]
    fn instrument_name_validation(#[case] name: &str, #[case] expected: Option<&'static str>) {
        let result = validate_instrument_name(name);
        match expected {
            None => assert!(result.is_ok(), "{name:?} should be valid"),
            Some(reason) => assert_eq!(
                result,
                Err(MetricError::InvalidInstrumentConfiguration(reason))
            ),
        }
    }

    #[rstest]
    #[case("0.0.0.0", None)]
    #[case("ms", None)]
    #[case("", None)]
    #[case("a".repeat(63).leak(), None)]
    #[case("a".repeat(64).leak(), Some(INSTRUMENT_UNIT_LENGTH))]
    #[case("utf8char锈", Some(INSTRUMENT_UNIT_INVALID_CHAR))]
    fn instrument_unit_validation(#[case] unit: &str, #[case] expected: Option<&'static str>) {
        let result = validate_instrument_unit(unit);
        match expected {
            None => assert!(result.is_ok(), "{unit:?} should be valid"),
            Some(reason) => assert_eq!(
                result,
                Err(MetricError::InvalidInstrumentConfiguration(reason))
            ),
        }
    }
}
