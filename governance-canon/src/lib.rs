//! Canonical invariants of the governance gate.
//!
//! Everything here is declarative and versioned. The decision path never
//! evaluates this data; the engine's structure is what upholds it, and traces
//! record which canon version they were produced under.

#![warn(missing_docs, clippy::pedantic)]

mod capture;
mod error;
mod invariants;
mod usage;

pub use capture::{
    CaptureVector, REGIME_CAPTURE_PATTERNS, RegimeCapturePattern, capture_pattern,
    patterns_targeting,
};
pub use error::{CanonError, CanonResult};
pub use invariants::{
    CANON_VERSION, CanonicalInvariantSet, InvariantId, InvariantNode, TemporalPhase, ThreatVector,
};
pub use usage::{CaptureUse, HarmLogUse, PERMITTED_HARM_LOG_USES, PROHIBITED_HARM_LOG_USES};
