use std::{borrow::Cow, fmt, sync::Arc};

use opentelemetry::KeyValue;

use super::meter::SdkMeter;
use super::Temporality;

/// The identifier of a group of instruments that all perform the same function.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum InstrumentKind {
    /// Identifies a group of instruments that record increasing values synchronously
    /// with the code path they are measuring.
    Counter,
    /// A group of instruments that record increasing and decreasing values
    /// synchronously with the code path they are measuring.
    UpDownCounter,
    /// A group of instruments that record a distribution of values synchronously with
    /// the code path they are measuring.
    Histogram,
    /// a group of instruments that record current value synchronously with
    /// the code path they are measuring.
    Gauge,
    /// A group of instruments that record increasing values in an asynchronous
    /// callback.
    ObservableCounter,
    /// A group of instruments that record increasing and decreasing values in an
    /// asynchronous callback.
    ObservableUpDownCounter,
    /// a group of instruments that record current values in an asynchronous callback.
    ObservableGauge,
}

impl InstrumentKind {
    /// Select the [Temporality] used for this kind under the provider's
    /// preference. Up-down counters are always cumulative.
    pub(crate) fn temporality_preference(&self, temporality: Temporality) -> Temporality {
        match temporality {
            Temporality::Cumulative => Temporality::Cumulative,
            Temporality::Delta => match self {
                Self::Counter
                | Self::Histogram
                | Self::ObservableCounter
                | Self::Gauge
                | Self::ObservableGauge => Temporality::Delta,
                Self::UpDownCounter | Self::ObservableUpDownCounter => Temporality::Cumulative,
            },
        }
    }
}

/// Describes an instrument at creation, used to match it against views.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct InstrumentInfo {
    pub(crate) name: Cow<'static, str>,
    pub(crate) description: Cow<'static, str>,
    pub(crate) unit: Cow<'static, str>,
    pub(crate) kind: InstrumentKind,
}

/// The recording half of an instrument.
pub(crate) trait SyncInstrument<T>: Send + Sync {
    fn measure(&self, value: T, attributes: &[KeyValue]);
}

/// Stands in for instruments that failed validation or were created by a
/// meter of a shut down provider.
pub(crate) struct NoopSyncInstrument;

impl<T> SyncInstrument<T> for NoopSyncInstrument {
    fn measure(&self, _value: T, _attributes: &[KeyValue]) {}
}

macro_rules! sync_instrument {
    ($(#[$meta:meta])* $name:ident, $method:ident, $method_doc:literal) => {
        $(#[$meta])*
        pub struct $name<T>(Arc<dyn SyncInstrument<T>>);

        impl<T> $name<T> {
            pub(crate) fn new(inner: Arc<dyn SyncInstrument<T>>) -> Self {
                $name(inner)
            }

            #[doc = $method_doc]
            pub fn $method(&self, value: T, attributes: &[KeyValue]) {
                self.0.measure(value, attributes)
            }
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                $name(Arc::clone(&self.0))
            }
        }

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_fmt(format_args!(
                    "{}<{}>",
                    stringify!($name),
                    std::any::type_name::<T>()
                ))
            }
        }
    };
}

sync_instrument!(
    /// An instrument that records increasing values. Negative values are ignored.
    Counter,
    add,
    "Records an increment to the counter."
);

sync_instrument!(
    /// An instrument that records increasing or decreasing values.
    UpDownCounter,
    add,
    "Records an increment or decrement to the counter."
);

sync_instrument!(
    /// An instrument that records a distribution of values. Negative values
    /// are ignored.
    Histogram,
    record,
    "Adds an additional value to the distribution."
);

sync_instrument!(
    /// An instrument that records independent values, keeping the last one.
    Gauge,
    record,
    "Records the current value of the gauge."
);

/// Configuration for a synchronous instrument, completed by `build`.
pub struct InstrumentBuilder<'a, I> {
    pub(crate) meter: &'a SdkMeter,
    pub(crate) name: Cow<'static, str>,
    pub(crate) description: Option<Cow<'static, str>>,
    pub(crate) unit: Option<Cow<'static, str>>,
    _instrument: std::marker::PhantomData<I>,
}

impl<'a, I> InstrumentBuilder<'a, I> {
    pub(crate) fn new(meter: &'a SdkMeter, name: Cow<'static, str>) -> Self {
        InstrumentBuilder {
            meter,
            name,
            description: None,
            unit: None,
            _instrument: std::marker::PhantomData,
        }
    }

    /// Set the description for this instrument
    pub fn with_description<S: Into<Cow<'static, str>>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the unit for this instrument.
    ///
    /// Unit is case sensitive(`kb` is not the same as `kB`).
    ///
    /// Unit must be:
    /// - ASCII string
    /// - No longer than 63 characters
    pub fn with_unit<S: Into<Cow<'static, str>>>(mut self, unit: S) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub(crate) fn info(&self, kind: InstrumentKind) -> InstrumentInfo {
        InstrumentInfo {
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            unit: self.unit.clone().unwrap_or_default(),
            kind,
        }
    }
}

impl<I> fmt::Debug for InstrumentBuilder<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentBuilder")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("unit", &self.unit)
            .field("kind", &std::any::type_name::<I>())
            .finish()
    }
}

/// Configuration for a histogram, completed by `build`.
pub struct HistogramBuilder<'a, T> {
    pub(crate) builder: InstrumentBuilder<'a, Histogram<T>>,
    pub(crate) boundaries: Option<Vec<f64>>,
}

impl<'a, T> HistogramBuilder<'a, T> {
    pub(crate) fn new(meter: &'a SdkMeter, name: Cow<'static, str>) -> Self {
        HistogramBuilder {
            builder: InstrumentBuilder::new(meter, name),
            boundaries: None,
        }
    }

    /// Set the description for this instrument
    pub fn with_description<S: Into<Cow<'static, str>>>(mut self, description: S) -> Self {
        self.builder = self.builder.with_description(description);
        self
    }

    /// Set the unit for this instrument.
    pub fn with_unit<S: Into<Cow<'static, str>>>(mut self, unit: S) -> Self {
        self.builder = self.builder.with_unit(unit);
        self
    }

    /// Set the bucket boundaries used unless a view overrides the aggregation.
    ///
    /// Boundaries must be finite and strictly increasing, otherwise the
    /// histogram is disabled.
    pub fn with_boundaries(mut self, boundaries: Vec<f64>) -> Self {
        self.boundaries = Some(boundaries);
        self
    }
}

impl<T> fmt::Debug for HistogramBuilder<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistogramBuilder")
            .field("builder", &self.builder)
            .field("boundaries", &self.boundaries)
            .finish()
    }
}

macro_rules! build_instrument {
    ($instrument:ident, $kind:expr, $($ty:ty),+) => {
        $(
            impl InstrumentBuilder<'_, $instrument<$ty>> {
                /// Validate the configuration and create the instrument.
                ///
                /// An invalid name or unit yields an instrument that records
                /// nothing.
                pub fn build(self) -> $instrument<$ty> {
                    $instrument::new(self.meter.sync_instrument::<$ty>(self.info($kind), None))
                }
            }
        )+
    };
}

build_instrument!(Counter, InstrumentKind::Counter, u64, f64);
build_instrument!(UpDownCounter, InstrumentKind::UpDownCounter, i64, f64);
build_instrument!(Gauge, InstrumentKind::Gauge, u64, i64, f64);

macro_rules! build_histogram {
    ($($ty:ty),+) => {
        $(
            impl HistogramBuilder<'_, $ty> {
                /// Validate the configuration and create the histogram.
                ///
                /// An invalid name, unit or boundary list yields a histogram
                /// that records nothing.
                pub fn build(self) -> Histogram<$ty> {
                    let info = self.builder.info(InstrumentKind::Histogram);
                    Histogram::new(self.builder.meter.sync_instrument::<$ty>(info, self.boundaries))
                }
            }
        )+
    };
}

build_histogram!(u64, f64);

pub(crate) const INSTRUMENT_NAME_MAX_LENGTH: usize = 255;
// maximum length of the unit, in bytes
pub(crate) const INSTRUMENT_UNIT_NAME_MAX_LENGTH: usize = 63;
pub(crate) const INSTRUMENT_NAME_ALLOWED_NON_ALPHANUMERIC_CHARS: [char; 4] = ['_', '.', '-', '/'];

pub(crate) const INSTRUMENT_NAME_EMPTY: &str = "instrument name must be non-empty";
pub(crate) const INSTRUMENT_NAME_LENGTH: &str = "instrument name must be less than 256 characters";
pub(crate) const INSTRUMENT_NAME_INVALID_CHAR: &str =
    "characters in instrument name must be ASCII and belong to the alphanumeric characters, '_', '.', '-' and '/'";
pub(crate) const INSTRUMENT_NAME_FIRST_ALPHABETIC: &str =
    "instrument name must start with an alphabetic character";
pub(crate) const INSTRUMENT_UNIT_LENGTH: &str = "instrument unit must be less than 64 characters";
pub(crate) const INSTRUMENT_UNIT_INVALID_CHAR: &str = "characters in instrument unit must be ASCII";
