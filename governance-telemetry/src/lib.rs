//! Observability for the governance gate.
//!
//! Two concerns live here: installing a `tracing` subscriber, and counting
//! operational anomalies such as backend failures. Decision outcomes are
//! never counted.

#![warn(missing_docs, clippy::pedantic)]

mod anomaly;
pub mod tracing_support;

pub use anomaly::{AnomalyCounters, AnomalyKind, AnomalySnapshot};
pub use tracing_support::init_tracing;
