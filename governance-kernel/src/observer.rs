//! Decision observers.

use std::sync::Arc;

use governance_audit::DecisionTrace;
use governance_policy::Outcome;
use tracing::{debug, info};

/// Observer invoked once per governed action, after the trace is persisted.
///
/// Observers see finished traces only. Nothing they do can reach the
/// compiler, so they cannot turn refusals into tuning input.
pub trait DecisionObserver: Send + Sync {
    /// Records the finished trace.
    fn on_decision(&self, trace: &DecisionTrace);
}

/// Observer that emits decisions to the tracing system.
#[derive(Debug, Default)]
pub struct TracingDecisionObserver;

impl DecisionObserver for TracingDecisionObserver {
    fn on_decision(&self, trace: &DecisionTrace) {
        match trace.outcome() {
            Outcome::Allow | Outcome::Degrade => {
                debug!(
                    trace_id = %trace.trace_id(),
                    scope = trace.scope(),
                    outcome = %trace.outcome(),
                    "governed action ran"
                );
            }
            Outcome::Block | Outcome::Escalate => {
                info!(
                    trace_id = %trace.trace_id(),
                    scope = trace.scope(),
                    outcome = %trace.outcome(),
                    reason = trace.reason().unwrap_or_default(),
                    approvers = ?trace.approvers(),
                    "governed action refused"
                );
            }
        }
    }
}

/// Forwards decisions to a collection of observers.
#[derive(Default)]
pub struct CompositeDecisionObserver {
    observers: Vec<Arc<dyn DecisionObserver>>,
}

impl CompositeDecisionObserver {
    /// Creates a composite from the supplied observers.
    #[must_use]
    pub fn new<I>(observers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn DecisionObserver>>,
    {
        Self {
            observers: observers.into_iter().collect(),
        }
    }

    /// Adds an observer.
    pub fn push(&mut self, observer: Arc<dyn DecisionObserver>) {
        self.observers.push(observer);
    }
}

impl DecisionObserver for CompositeDecisionObserver {
    fn on_decision(&self, trace: &DecisionTrace) {
        for observer in &self.observers {
            observer.on_decision(trace);
        }
    }
}
