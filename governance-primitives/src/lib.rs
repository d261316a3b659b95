//! Core shared types for the governance gate.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod tier;

/// Error type and result alias shared across the gate crates.
pub use error::{Error, Result};
/// Identifiers for actors, requests, consent subjects, and decision traces.
pub use ids::{ActorId, RequestId, TraceId, UserId};
/// Five-level consent ladder.
pub use tier::ConsentTier;
