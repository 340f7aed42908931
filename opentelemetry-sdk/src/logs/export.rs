//! Log exporters
use crate::error::OTelSdkResult;
use crate::logs::LogRecordData;
use crate::Resource;
use std::fmt::Debug;
use std::time::Duration;

/// A batch of log records handed to a [`LogExporter`] in one call.
///
/// Records keep the order in which they were emitted. Records from different
/// providers may carry different resources; use [`LogBatch::group_by_resource`]
/// when the destination nests records under their resource.
#[derive(Debug, Clone, Copy)]
pub struct LogBatch<'a> {
    records: &'a [LogRecordData],
}

impl<'a> LogBatch<'a> {
    /// Wrap a slice of records.
    pub fn new(records: &'a [LogRecordData]) -> LogBatch<'a> {
        LogBatch { records }
    }

    /// Records in emission order.
    pub fn iter(&self) -> std::slice::Iter<'a, LogRecordData> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Partition the records by resource, in order of first appearance. Each
    /// group keeps the relative order of its records.
    pub fn group_by_resource(&self) -> Vec<(&'a Resource, Vec<&'a LogRecordData>)> {
        let mut groups: Vec<(&'a Resource, Vec<&'a LogRecordData>)> = Vec::new();
        for record in self.records {
            match groups.iter_mut().find(|(res, _)| *res == record.resource()) {
                Some((_, members)) => members.push(record),
                None => groups.push((record.resource(), vec![record])),
            }
        }
        groups
    }
}

/// Destination of exported log records.
///
/// Calls are blocking. `timeout` bounds the whole call; `None` lets the
/// exporter apply its own default. Implementations must treat a zero timeout
/// as already expired and return [`OTelSdkError::Timeout`] without I/O.
///
/// [`OTelSdkError::Timeout`]: crate::error::OTelSdkError::Timeout
pub trait LogExporter: Send + Sync + Debug {
    /// Export a batch of records.
    fn export(&self, batch: LogBatch<'_>, timeout: Option<Duration>) -> OTelSdkResult;

    /// Flush anything the exporter buffers internally.
    fn force_flush(&self, _timeout: Option<Duration>) -> OTelSdkResult {
        Ok(())
    }

    /// Release resources. Later exports must fail without doing I/O.
    fn shutdown(&self, _timeout: Option<Duration>) -> OTelSdkResult {
        Ok(())
    }
}
