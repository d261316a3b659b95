//! Constraint compilation and gated execution.
//!
//! [`ConstraintCompiler`] turns a [`DecisionTraceInput`], a resolved authority
//! snapshot, and a consent verdict into ordered [`CompiledConstraints`]. The
//! [`ExecutionGate`] applies the resulting verdict to the caller's effect.

#![warn(missing_docs, clippy::pedantic)]

pub mod contracts;
pub mod decision;
pub mod engine;
pub mod gate;

pub use contracts::{ActionContext, DecisionTraceInput};
pub use decision::{
    CompiledConstraint, CompiledConstraints, ConstraintKind, ConstraintOrigin, Degradation,
    Outcome, Verdict, reasons,
};
pub use engine::{
    ConstraintCompiler, ConstraintRule, DEFAULT_DEGRADED_SELECTOR, PolicyError, PolicyResult,
    RuleEffect, RuleMatcher, RuleSpec, ScopeMatcher,
};
pub use gate::{ExecutionGate, ExecutionMode, GovernedActionResult};
