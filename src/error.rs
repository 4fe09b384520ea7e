// =============================================================================
// Error taxonomy — typed, recoverable-by-kind errors for the scanning engine
// =============================================================================
//
// Every variant here maps to a class from the engine's error design:
// NoData / InvalidEvent / NoCandidate / FilterReject / ProviderTimeout are
// all recovered locally by ChainExecutor and never propagate past it.
// Config is the only variant that escapes engine construction; it is fatal.
// =============================================================================

use std::time::Duration;

/// Typed error surfaced by the scanning pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// No quote/holdings record for the requested key at the requested instant.
    #[error("no data for {0} at requested instant")]
    NoData(String),

    /// The detector's post-detection validity check failed.
    #[error("event failed validity check: {0}")]
    InvalidEvent(String),

    /// No holdings entries for the security, or the fund selector returned nothing.
    #[error("no eligible funds for {0}")]
    NoCandidate(String),

    /// A required filter rejected the draft signal.
    #[error("rejected by {filter}: {reason}")]
    FilterReject { filter: String, reason: String },

    /// A provider call exceeded the coordinator's tick budget.
    #[error("provider timed out after {0:?}")]
    ProviderTimeout(Duration),

    /// The chain configuration references an unknown plugin or invalid threshold.
    /// Fatal: the engine does not start.
    #[error("invalid chain configuration: {0}")]
    Config(String),

    /// Persistence failure. Logged; repository in-memory state is unaffected.
    #[error("repository I/O failure: {0}")]
    RepositoryIo(#[source] std::io::Error),
}

impl ScanError {
    /// Collapse a provider timeout into the same recovery path as NoData,
    /// per the spec's "ProviderTimeoutError is treated as NoDataError".
    pub fn as_no_data(&self) -> String {
        match self {
            ScanError::NoData(s) => s.clone(),
            ScanError::ProviderTimeout(d) => format!("timed out after {d:?}"),
            other => other.to_string(),
        }
    }
}
