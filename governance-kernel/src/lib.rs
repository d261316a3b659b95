//! Governed-action kernel.
//!
//! [`GovernanceEngine::governed_action`] is the single entry point through
//! which consequence-bearing actions pass. One call resolves authority and
//! checks consent concurrently, compiles constraints, runs the effect through
//! the execution gate, and appends exactly one decision trace.

#![warn(missing_docs, clippy::pedantic)]

mod engine;
mod error;
mod observer;

pub use engine::{GovernanceEngine, GovernanceEngineBuilder};
pub use error::{KernelError, KernelResult};
pub use observer::{CompositeDecisionObserver, DecisionObserver, TracingDecisionObserver};
