//! Error taxonomy for a trace run.

use thiserror::Error;

/// Errors and diagnostics raised while building a case file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    /// A record is structurally unusable. Aborts the run.
    #[error("invalid dependency record: {reason}")]
    InvalidRecord { reason: String },

    /// A module lists itself as one of its own leads. Reported through the
    /// diagnostic side channel only, never returned as `Err`.
    #[error("skipping circular dependency {lead} from {suspect}")]
    CircularDependencyDetected { suspect: String, lead: String },
}

impl TraceError {
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            reason: reason.into(),
        }
    }

    /// True for errors that must abort the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidRecord { .. })
    }
}
