//! Governance gate facade.
//!
//! Every consequence-bearing action passes through
//! [`kernel::GovernanceEngine::governed_action`], which returns exactly one of
//! `ALLOW`, `DEGRADE`, `BLOCK` or `ESCALATE` and leaves one decision trace
//! behind. This crate bundles the component crates behind feature flags so
//! embedders can depend on just the pieces they need.

#![warn(missing_docs, clippy::pedantic)]

/// Identifiers and consent tiers.
pub use governance_primitives as primitives;

/// Authority contexts and the fail-closed resolver.
pub use governance_authority as authority;

/// Consent records and the consent gate.
pub use governance_consent as consent;

/// Constraint compilation and the execution gate.
pub use governance_policy as policy;

/// Engine orchestration (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use governance_kernel as kernel;

/// Decision traces and the observed-harm ledger (enabled by `audit` feature).
#[cfg(feature = "audit")]
pub use governance_audit as audit;

/// Canonical invariants (enabled by `canon` feature).
#[cfg(feature = "canon")]
pub use governance_canon as canon;

/// Configuration loading (enabled by `config` feature).
#[cfg(feature = "config")]
pub use governance_config as config;

/// Tracing setup and anomaly counters (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use governance_telemetry as telemetry;

#[cfg(feature = "kernel")]
pub use governance_kernel::GovernanceEngine;
pub use governance_policy::{DecisionTraceInput, ExecutionMode, GovernedActionResult, Outcome};
