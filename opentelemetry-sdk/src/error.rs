//! Errors and result codes shared by processors, exporters and providers.
use std::time::Duration;
use thiserror::Error;

/// Failure of an export, flush or shutdown operation.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum OTelSdkError {
    /// The component was already shut down. Calling `shutdown` twice lands
    /// here, as does exporting after shutdown.
    #[error("Shutdown already invoked")]
    AlreadyShutdown,

    /// The operation did not finish within its time budget.
    #[error("Operation timed out after {} milliseconds", .0.as_millis())]
    Timeout(Duration),

    /// Any other failure: a rejected export, a transport error, a poisoned lock.
    #[error("Operation failed: {0}")]
    InternalFailure(String),
}

/// Result of an export, flush or shutdown operation.
pub type OTelSdkResult = Result<(), OTelSdkError>;

/// Numeric outcome of an operation, ordered from best to worst.
///
/// When several processors or exporters take part in one call, the combined
/// outcome is the worst (largest) code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExportResult {
    /// Completed.
    Success = 0,
    /// Failed or rejected.
    Failure = 1,
    /// Did not finish in time.
    Timeout = 2,
}

impl From<&OTelSdkResult> for ExportResult {
    fn from(result: &OTelSdkResult) -> Self {
        match result {
            Ok(()) => ExportResult::Success,
            Err(OTelSdkError::Timeout(_)) => ExportResult::Timeout,
            Err(OTelSdkError::AlreadyShutdown | OTelSdkError::InternalFailure(_)) => {
                ExportResult::Failure
            }
        }
    }
}

/// Combine two results, keeping whichever is worse. Ties keep `current`.
pub(crate) fn worst_of(current: OTelSdkResult, next: OTelSdkResult) -> OTelSdkResult {
    if ExportResult::from(&next) > ExportResult::from(&current) {
        next
    } else {
        current
    }
}

/// Time left until `deadline`, or `None` when there is no deadline.
pub(crate) fn remaining(deadline: Option<std::time::Instant>) -> Option<Duration> {
    deadline.map(|d| d.saturating_duration_since(std::time::Instant::now()))
}
