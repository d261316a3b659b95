//! Error types for audit persistence.

use governance_canon::HarmLogUse;
use serde_json::Error as SerdeError;
use thiserror::Error;

/// Errors emitted by audit sinks, harm ledgers, and forensic readers.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Underlying I/O failure while reading or writing journal files.
    #[error("i/o error: {source}")]
    Io {
        /// Source [`std::io::Error`].
        #[from]
        source: std::io::Error,
    },
    /// Serialization or deserialization error.
    #[error("serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: SerdeError,
    },
    /// A remote or custom sink rejected the write.
    #[error("audit sink unavailable: {reason}")]
    Unavailable {
        /// Human-readable reason for operators.
        reason: String,
    },
    /// A reader declared a purpose the harm log may not serve.
    #[error("observed-harm log may not be read for {0}")]
    ProhibitedUse(HarmLogUse),
    /// Harm entry failed validation.
    #[error("invalid observed-harm entry: {0}")]
    InvalidEntry(&'static str),
}

impl AuditError {
    /// Helper to construct availability errors.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Result alias for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
