use super::{SdkLogRecord, SdkLoggerProvider};
use opentelemetry::InstrumentationScope;
use std::sync::Arc;

/// Creates and emits [`SdkLogRecord`]s on behalf of one instrumentation scope.
///
/// Obtained from [`SdkLoggerProvider::logger`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SdkLogger {
    scope: Arc<InstrumentationScope>,
    provider: SdkLoggerProvider,
}

impl SdkLogger {
    pub(crate) fn new(scope: Arc<InstrumentationScope>, provider: SdkLoggerProvider) -> Self {
        SdkLogger { scope, provider }
    }

    #[cfg(test)]
    pub(crate) fn scope(&self) -> &Arc<InstrumentationScope> {
        &self.scope
    }

    /// A blank record bound to this logger's resource, scope and limits.
    pub fn create_log_record(&self) -> SdkLogRecord {
        SdkLogRecord::new(
            self.provider.resource().clone(),
            Arc::clone(&self.scope),
            *self.provider.limits(),
        )
    }

    /// Apply attribute limits and hand `record` to every processor, in
    /// registration order. A record emitted after the provider shut down is
    /// discarded.
    pub fn emit(&self, mut record: SdkLogRecord) {
        if self.provider.is_shutdown() {
            return;
        }
        let processors = self.provider.log_processors();
        if processors.is_empty() {
            return;
        }

        record.finish();
        for processor in processors {
            processor.emit(&mut record);
        }
    }
}
