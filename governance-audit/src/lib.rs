//! Decision traces, append-only audit sinks, and the observed-harm ledger.
//!
//! Every governed action produces one [`DecisionTrace`]. Traces and harm
//! entries flow into write-only sinks; reading them back goes through the
//! [`forensics`] functions, which the decision path never calls.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod forensics;
mod harm;
mod sink;
mod trace;

pub use error::{AuditError, AuditResult};
pub use forensics::{read_harm_ledger, read_journal};
pub use harm::{
    FileHarmLedger, HarmCategory, HarmClassification, HarmLedger, HarmSeverity, HarmSource,
    InMemoryHarmLedger, ObservedHarmEntry,
};
pub use sink::{AuditSink, FileAuditJournal, InMemoryAuditSink};
pub use trace::{DecisionTrace, DecisionTraceBuilder, ResultSummary};
