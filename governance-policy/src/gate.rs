//! Execution gate: runs the effect only when the verdict permits it.

use std::future::Future;

use governance_authority::ResolvedAuthority;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::contracts::DecisionTraceInput;
use crate::decision::{CompiledConstraints, Degradation, Outcome, Verdict};

/// Mode handed to the effect when it is allowed to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// No restrictions apply.
    Full,
    /// The effect must honour every selector in the degradation.
    Degraded(Degradation),
}

impl ExecutionMode {
    /// Returns the degradation for degraded runs.
    #[must_use]
    pub fn degradation(&self) -> Option<&Degradation> {
        match self {
            Self::Full => None,
            Self::Degraded(degradation) => Some(degradation),
        }
    }

    /// Returns true for degraded runs.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Result of a governed action.
///
/// A result value exists exactly when the effect ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GovernedActionResult<T> {
    /// The effect ran in full.
    Allow {
        /// Value produced by the effect.
        result: T,
    },
    /// The effect ran under restrictions.
    Degrade {
        /// Value produced by the effect.
        result: T,
        /// Restrictions the effect ran under.
        degradation: Degradation,
    },
    /// The action was refused.
    Block {
        /// Machine-readable reason.
        reason: String,
    },
    /// The action needs human approval.
    Escalate {
        /// Machine-readable reason.
        reason: String,
        /// Who can approve the action, when known.
        approvers: Vec<String>,
    },
}

impl<T> GovernedActionResult<T> {
    /// Returns the outcome.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Allow { .. } => Outcome::Allow,
            Self::Degrade { .. } => Outcome::Degrade,
            Self::Block { .. } => Outcome::Block,
            Self::Escalate { .. } => Outcome::Escalate,
        }
    }

    /// Returns the effect's value, if it ran.
    #[must_use]
    pub fn result(&self) -> Option<&T> {
        match self {
            Self::Allow { result } | Self::Degrade { result, .. } => Some(result),
            Self::Block { .. } | Self::Escalate { .. } => None,
        }
    }

    /// Consumes the outcome and returns the effect's value, if it ran.
    #[must_use]
    pub fn into_result(self) -> Option<T> {
        match self {
            Self::Allow { result } | Self::Degrade { result, .. } => Some(result),
            Self::Block { .. } | Self::Escalate { .. } => None,
        }
    }

    /// Returns the reason for block and escalate outcomes.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Block { reason } | Self::Escalate { reason, .. } => Some(reason),
            Self::Allow { .. } | Self::Degrade { .. } => None,
        }
    }

    /// Returns true when the action was allowed in full.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    /// Returns true when the action ran degraded.
    #[must_use]
    pub fn is_degrade(&self) -> bool {
        matches!(self, Self::Degrade { .. })
    }

    /// Returns true when the action was refused.
    #[must_use]
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    /// Returns true when the action needs approval.
    #[must_use]
    pub fn is_escalate(&self) -> bool {
        matches!(self, Self::Escalate { .. })
    }
}

/// Applies a verdict to an effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionGate;

impl ExecutionGate {
    /// Creates a gate.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes `effect` according to the compiled constraints.
    ///
    /// The effect is invoked at most once and only for `ALLOW` and `DEGRADE`.
    /// It never sees the authority snapshot.
    ///
    /// # Errors
    ///
    /// Returns the effect's own error unchanged. Refusals are not errors.
    pub async fn execute<T, E, F, Fut>(
        &self,
        input: &DecisionTraceInput,
        constraints: &CompiledConstraints,
        authority: &ResolvedAuthority,
        effect: F,
    ) -> Result<GovernedActionResult<T>, E>
    where
        F: FnOnce(ExecutionMode) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match constraints.verdict() {
            Verdict::Block { reason } => {
                warn!(
                    request_id = %input.request_id(),
                    scope = input.scope(),
                    authority = authority.context().authority(),
                    reason = %reason,
                    "action blocked"
                );
                Ok(GovernedActionResult::Block { reason })
            }
            Verdict::Escalate { reason, approvers } => {
                warn!(
                    request_id = %input.request_id(),
                    scope = input.scope(),
                    authority = authority.context().authority(),
                    reason = %reason,
                    approvers = approvers.len(),
                    "action escalated"
                );
                Ok(GovernedActionResult::Escalate { reason, approvers })
            }
            Verdict::Degrade(degradation) => {
                debug!(
                    request_id = %input.request_id(),
                    scope = input.scope(),
                    selectors = ?degradation.selectors(),
                    "running degraded effect"
                );
                let result = effect(ExecutionMode::Degraded(degradation.clone())).await?;
                Ok(GovernedActionResult::Degrade {
                    result,
                    degradation,
                })
            }
            Verdict::Allow => {
                debug!(
                    request_id = %input.request_id(),
                    scope = input.scope(),
                    "running effect"
                );
                let result = effect(ExecutionMode::Full).await?;
                Ok(GovernedActionResult::Allow { result })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{CompiledConstraint, ConstraintOrigin};
    use chrono::Utc;
    use governance_authority::{
        AuthorityConfidence, AuthorityContext, AuthorityInstance, AuthorityStatus,
    };
    use governance_primitives::{ActorId, ConsentTier, UserId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn input() -> DecisionTraceInput {
        DecisionTraceInput::new(
            ActorId::random(),
            UserId::new("u-1").unwrap(),
            "export",
            "external",
            ConsentTier::Execute,
            "export report",
        )
    }

    fn authority() -> ResolvedAuthority {
        let now = Utc::now();
        ResolvedAuthority::new(
            Some(AuthorityInstance::new("USPTO", "PATENTABILITY", now)),
            AuthorityContext::new(
                "USPTO",
                "PATENTABILITY",
                AuthorityStatus::Positive,
                AuthorityConfidence::High,
                now,
            ),
        )
    }

    #[tokio::test]
    async fn refusals_never_invoke_effect() {
        let gate = ExecutionGate::new();
        let calls = AtomicUsize::new(0);
        let cases = [
            CompiledConstraint::deny("d", "no_authority", ConstraintOrigin::Authority),
            CompiledConstraint::escalate("e", "needs_review", ConstraintOrigin::Rule, Vec::new()),
        ];

        for constraint in cases {
            let constraints = CompiledConstraints::new(vec![constraint]);
            let outcome = gate
                .execute(&input(), &constraints, &authority(), |_| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(())
                })
                .await
                .unwrap();
            assert!(outcome.result().is_none());
            assert!(!outcome.outcome().runs_effect());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn degraded_effect_receives_selectors() {
        let constraints = CompiledConstraints::new(vec![CompiledConstraint::degrade(
            "d",
            "authority_medium_confidence",
            ConstraintOrigin::Authority,
            "restricted",
        )]);
        let outcome = ExecutionGate::new()
            .execute(&input(), &constraints, &authority(), |mode| async move {
                Ok::<_, ()>(mode.degradation().map(|d| d.selectors().to_vec()))
            })
            .await
            .unwrap();

        assert!(outcome.is_degrade());
        assert_eq!(
            outcome.into_result(),
            Some(Some(vec!["restricted".to_owned()]))
        );
    }

    #[tokio::test]
    async fn effect_errors_propagate_unchanged() {
        let err = ExecutionGate::new()
            .execute(
                &input(),
                &CompiledConstraints::default(),
                &authority(),
                |mode| async move {
                    assert_eq!(mode, ExecutionMode::Full);
                    Err::<(), _>("smtp down")
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, "smtp down");
    }

    #[test]
    fn result_wire_format_tags_outcome() {
        let outcome: GovernedActionResult<u8> = GovernedActionResult::Escalate {
            reason: "authority_low_confidence".into(),
            approvers: vec!["legal".into()],
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["outcome"], "ESCALATE");
        assert_eq!(value["approvers"][0], "legal");
    }
}
