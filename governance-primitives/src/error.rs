//! Shared error definitions for governance primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the governance primitives.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// A UUID-backed identifier could not be parsed.
    #[error("invalid identifier: {source}")]
    InvalidId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// A user key failed validation.
    #[error("invalid user id `{id}`: {reason}")]
    InvalidUserId {
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A consent tier label was not recognised.
    #[error("unknown consent tier `{0}`")]
    UnknownTier(String),
}
