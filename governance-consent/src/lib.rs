//! Consent checks for the governance gate.
//!
//! Rule: no named consent, no action. The [`ConsentGate`] selects the single
//! effective record for `(user, scope, domain, tier)` from a read-only
//! [`ConsentRegistry`] and fails closed on every backend error.

#![warn(missing_docs, clippy::pedantic)]

mod gate;
mod record;
mod registry;

pub use gate::{ConsentGate, ConsentQuery, ConsentReason, ConsentVerdict, select_effective};
pub use record::{ConsentId, ConsentKey, ConsentRecord};
pub use registry::{ConsentError, ConsentRegistry, ConsentResult, InMemoryConsentRegistry};
