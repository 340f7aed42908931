use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use opentelemetry::{otel_debug, InstrumentationScope};

use crate::Resource;

use super::aggregation::Aggregation;
use super::data::{ResourceMetrics, ScopeMetrics};
use super::instrument::{InstrumentInfo, InstrumentKind};
use super::internal::{new_aggregator, Number};
use super::stream::{Collect, MetricStream, StreamOutput};
use super::view::View;
use super::Temporality;

/// What makes two instrument registrations the same instrument within a
/// meter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct InstrumentId {
    name: Cow<'static, str>,
    description: Cow<'static, str>,
    unit: Cow<'static, str>,
    kind: InstrumentKind,
    number: TypeId,
}

struct RegisteredStream {
    id: InstrumentId,
    collect: Arc<dyn Collect>,
    typed: Arc<dyn Any + Send + Sync>,
}

#[derive(Default)]
struct ScopeStreams {
    streams: Mutex<Vec<RegisteredStream>>,
}

/// Connects the instruments of every meter to the provider's views and
/// collection.
pub(crate) struct Pipeline {
    pub(crate) resource: Resource,
    views: Vec<View>,
    temporality: Temporality,
    start_time: SystemTime,
    // Also serializes collections.
    last_collect: Mutex<SystemTime>,
    scopes: Mutex<HashMap<InstrumentationScope, Arc<ScopeStreams>>>,
    // Creation order, so collections report scopes deterministically.
    scope_order: Mutex<Vec<InstrumentationScope>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Pipeline {
    pub(crate) fn new(resource: Resource, views: Vec<View>, temporality: Temporality) -> Self {
        let now = SystemTime::now();
        Pipeline {
            resource,
            views,
            temporality,
            start_time: now,
            last_collect: Mutex::new(now),
            scopes: Mutex::new(HashMap::new()),
            scope_order: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn temporality(&self) -> Temporality {
        self.temporality
    }

    fn scope_streams(&self, scope: &InstrumentationScope) -> Arc<ScopeStreams> {
        let mut scopes = lock(&self.scopes);
        if let Some(streams) = scopes.get(scope) {
            return Arc::clone(streams);
        }
        let streams = Arc::new(ScopeStreams::default());
        scopes.insert(scope.clone(), Arc::clone(&streams));
        lock(&self.scope_order).push(scope.clone());
        streams
    }

    /// The stream for `instrument`, shared with any earlier registration of
    /// the same instrument in `scope`.
    pub(crate) fn register<T: Number>(
        &self,
        scope: &InstrumentationScope,
        instrument: InstrumentInfo,
        boundaries: Option<Vec<f64>>,
    ) -> Arc<MetricStream<T>> {
        let id = InstrumentId {
            name: instrument.name.clone(),
            description: instrument.description.clone(),
            unit: instrument.unit.clone(),
            kind: instrument.kind,
            number: TypeId::of::<T>(),
        };

        let scope_streams = self.scope_streams(scope);
        let mut streams = lock(&scope_streams.streams);
        if let Some(existing) = streams.iter().find(|s| s.id == id) {
            if let Ok(stream) = Arc::clone(&existing.typed).downcast::<MetricStream<T>>() {
                return stream;
            }
        }

        let stream = Arc::new(self.new_stream::<T>(scope, &instrument, boundaries));
        streams.push(RegisteredStream {
            id,
            collect: Arc::clone(&stream) as Arc<dyn Collect>,
            typed: Arc::clone(&stream) as Arc<dyn Any + Send + Sync>,
        });
        stream
    }

    fn new_stream<T: Number>(
        &self,
        scope: &InstrumentationScope,
        instrument: &InstrumentInfo,
        boundaries: Option<Vec<f64>>,
    ) -> MetricStream<T> {
        let temporality = instrument.kind.temporality_preference(self.temporality);
        let default_aggregation = match boundaries {
            Some(boundaries) if instrument.kind == InstrumentKind::Histogram => {
                Aggregation::ExplicitBucketHistogram {
                    boundaries,
                    record_min_max: true,
                }
            }
            _ => Aggregation::Default,
        };

        let matching: Vec<&View> = self
            .views
            .iter()
            .filter(|view| view.matches(instrument, scope))
            .collect();

        let outputs = if matching.is_empty() {
            new_aggregator(&default_aggregation, instrument.kind, temporality)
                .map(|aggregator| StreamOutput {
                    name: instrument.name.clone(),
                    description: instrument.description.clone(),
                    allowed_attribute_keys: None,
                    aggregator,
                })
                .into_iter()
                .collect()
        } else {
            matching
                .into_iter()
                .filter_map(|view| {
                    let aggregation = view.aggregation().unwrap_or(&default_aggregation);
                    let aggregator = new_aggregator(aggregation, instrument.kind, temporality);
                    if aggregator.is_none() {
                        otel_debug!(
                            name: "MetricStream.Dropped",
                            instrument_name = instrument.name.as_ref(),
                            meter_name = scope.name()
                        );
                    }
                    aggregator.map(|aggregator| StreamOutput {
                        name: view.rename().unwrap_or(&instrument.name).clone(),
                        description: view
                            .description()
                            .unwrap_or(&instrument.description)
                            .clone(),
                        allowed_attribute_keys: view.allowed_attribute_keys().cloned(),
                        aggregator,
                    })
                })
                .collect()
        };

        MetricStream::new(instrument.kind, instrument.unit.clone(), temporality, outputs)
    }

    /// Snapshot every stream. Cumulative streams report from the pipeline
    /// start, delta streams from the previous collection. Metrics without data
    /// points and scopes without metrics are left out.
    pub(crate) fn collect(&self) -> ResourceMetrics {
        let mut last_collect = lock(&self.last_collect);
        let end_time = SystemTime::now();
        let delta_start = *last_collect;
        *last_collect = end_time;

        let scopes: Vec<(InstrumentationScope, Arc<ScopeStreams>)> = {
            let order = lock(&self.scope_order);
            let map = lock(&self.scopes);
            order
                .iter()
                .filter_map(|scope| map.get(scope).map(|s| (scope.clone(), Arc::clone(s))))
                .collect()
        };

        let mut scope_metrics = Vec::with_capacity(scopes.len());
        for (scope, streams) in scopes {
            let collectors: Vec<Arc<dyn Collect>> = lock(&streams.streams)
                .iter()
                .map(|s| Arc::clone(&s.collect))
                .collect();

            let metrics: Vec<_> = collectors
                .iter()
                .flat_map(|stream| {
                    let start_time = match stream.temporality() {
                        Temporality::Delta => delta_start,
                        Temporality::Cumulative => self.start_time,
                    };
                    stream.collect(start_time, end_time)
                })
                .filter(|metric| metric.data.data_point_count() > 0)
                .collect();

            if !metrics.is_empty() {
                scope_metrics.push(ScopeMetrics { scope, metrics });
            }
        }

        ResourceMetrics {
            resource: self.resource.clone(),
            scope_metrics,
        }
    }
}
