//! Immutable decision traces.

use chrono::{DateTime, Utc};
use governance_authority::ResolvedAuthority;
use governance_consent::ConsentVerdict;
use governance_policy::{
    ActionContext, CompiledConstraints, DecisionTraceInput, Degradation, GovernedActionResult,
    Outcome, Verdict,
};
use governance_primitives::{ActorId, ConsentTier, RequestId, TraceId, UserId};
use serde::{Deserialize, Serialize};

/// What happened to the effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultSummary {
    /// The effect ran and returned a value.
    Completed,
    /// The effect ran and returned an error.
    EffectFailed {
        /// Display form of the effect's error.
        message: String,
    },
    /// The effect was not invoked.
    NotInvoked,
}

/// Forensic record of one governed action.
///
/// Built once per call through [`DecisionTrace::builder`] and never modified
/// afterwards. Forensic readers deserialize persisted traces; nothing offers
/// setters on either path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTrace {
    trace_id: TraceId,
    request_id: RequestId,
    actor: ActorId,
    user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    workspace_id: Option<String>,
    scope: String,
    domain: String,
    tier: ConsentTier,
    action: String,
    context: ActionContext,
    authority_snapshot: ResolvedAuthority,
    consent_snapshot: ConsentVerdict,
    compiled_constraints: CompiledConstraints,
    outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    approvers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    degradation: Option<Degradation>,
    result_summary: ResultSummary,
    canon_version: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl DecisionTrace {
    /// Starts a trace from the pre-execution snapshot.
    ///
    /// Every builder mints a fresh trace identifier, so reusing an input for
    /// several calls still yields distinct traces sharing one request id.
    #[must_use]
    pub fn builder(
        input: &DecisionTraceInput,
        authority: ResolvedAuthority,
        consent: ConsentVerdict,
        constraints: CompiledConstraints,
    ) -> DecisionTraceBuilder {
        DecisionTraceBuilder {
            trace_id: TraceId::random(),
            input: input.clone(),
            authority,
            consent,
            constraints,
            canon_version: String::new(),
            started_at: None,
        }
    }

    /// Returns the trace identifier.
    #[must_use]
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// Returns the caller's correlation identifier.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the acting agent or session.
    #[must_use]
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Returns the consent subject.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the originating workspace.
    #[must_use]
    pub fn workspace_id(&self) -> Option<&str> {
        self.workspace_id.as_deref()
    }

    /// Returns the action scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the requested tier.
    #[must_use]
    pub fn tier(&self) -> ConsentTier {
        self.tier
    }

    /// Returns the action label.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns the declared action context.
    #[must_use]
    pub fn context(&self) -> &ActionContext {
        &self.context
    }

    /// Returns the authority snapshot used for compilation.
    #[must_use]
    pub fn authority_snapshot(&self) -> &ResolvedAuthority {
        &self.authority_snapshot
    }

    /// Returns the consent verdict used for compilation.
    #[must_use]
    pub fn consent_snapshot(&self) -> &ConsentVerdict {
        &self.consent_snapshot
    }

    /// Returns the compiled constraints.
    #[must_use]
    pub fn compiled_constraints(&self) -> &CompiledConstraints {
        &self.compiled_constraints
    }

    /// Returns the decided outcome.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Returns the block or escalate reason.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns escalation approvers.
    #[must_use]
    pub fn approvers(&self) -> &[String] {
        &self.approvers
    }

    /// Returns the degradation the effect ran under.
    #[must_use]
    pub fn degradation(&self) -> Option<&Degradation> {
        self.degradation.as_ref()
    }

    /// Returns what happened to the effect.
    #[must_use]
    pub fn result_summary(&self) -> &ResultSummary {
        &self.result_summary
    }

    /// Returns the canon version in force.
    #[must_use]
    pub fn canon_version(&self) -> &str {
        &self.canon_version
    }

    /// Returns when evaluation began.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns when evaluation finished.
    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }
}

/// Builder returned by [`DecisionTrace::builder`].
#[derive(Debug)]
pub struct DecisionTraceBuilder {
    trace_id: TraceId,
    input: DecisionTraceInput,
    authority: ResolvedAuthority,
    consent: ConsentVerdict,
    constraints: CompiledConstraints,
    canon_version: String,
    started_at: Option<DateTime<Utc>>,
}

impl DecisionTraceBuilder {
    /// Returns the identifier the finished trace will carry.
    #[must_use]
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// Records the canon version in force.
    #[must_use]
    pub fn canon_version(mut self, version: impl Into<String>) -> Self {
        self.canon_version = version.into();
        self
    }

    /// Records when evaluation began.
    #[must_use]
    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    /// Finishes the trace for a call whose effect returned.
    #[must_use]
    pub fn finish<T>(
        self,
        result: &GovernedActionResult<T>,
        finished_at: DateTime<Utc>,
    ) -> DecisionTrace {
        let summary = if result.outcome().runs_effect() {
            ResultSummary::Completed
        } else {
            ResultSummary::NotInvoked
        };
        let (approvers, degradation) = match result {
            GovernedActionResult::Escalate { approvers, .. } => (approvers.clone(), None),
            GovernedActionResult::Degrade { degradation, .. } => {
                (Vec::new(), Some(degradation.clone()))
            }
            GovernedActionResult::Allow { .. } | GovernedActionResult::Block { .. } => {
                (Vec::new(), None)
            }
        };
        self.build(
            result.outcome(),
            result.reason().map(str::to_owned),
            approvers,
            degradation,
            summary,
            finished_at,
        )
    }

    /// Finishes the trace for a call whose effect ran and failed.
    ///
    /// The outcome is taken from the compiled constraints, which is the
    /// verdict the gate acted on.
    #[must_use]
    pub fn finish_failed(
        self,
        message: impl Into<String>,
        finished_at: DateTime<Utc>,
    ) -> DecisionTrace {
        let verdict = self.constraints.verdict();
        let degradation = match &verdict {
            Verdict::Degrade(degradation) => Some(degradation.clone()),
            _ => None,
        };
        self.build(
            verdict.outcome(),
            None,
            Vec::new(),
            degradation,
            ResultSummary::EffectFailed {
                message: message.into(),
            },
            finished_at,
        )
    }

    fn build(
        self,
        outcome: Outcome,
        reason: Option<String>,
        approvers: Vec<String>,
        degradation: Option<Degradation>,
        result_summary: ResultSummary,
        finished_at: DateTime<Utc>,
    ) -> DecisionTrace {
        let Self {
            trace_id,
            input,
            authority,
            consent,
            constraints,
            canon_version,
            started_at,
        } = self;
        DecisionTrace {
            trace_id,
            request_id: input.request_id(),
            actor: input.actor(),
            user_id: input.user_id().clone(),
            workspace_id: input.workspace_id().map(str::to_owned),
            scope: input.scope().to_owned(),
            domain: input.domain().to_owned(),
            tier: input.tier(),
            action: input.action().to_owned(),
            context: input.context().clone(),
            authority_snapshot: authority,
            consent_snapshot: consent,
            compiled_constraints: constraints,
            outcome,
            reason,
            approvers,
            degradation,
            result_summary,
            canon_version,
            started_at: started_at.unwrap_or(finished_at),
            finished_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use governance_authority::{
        AuthorityConfidence, AuthorityContext, AuthorityInstance, AuthorityStatus,
    };
    use governance_consent::{ConsentId, ConsentReason};
    use governance_policy::{CompiledConstraint, ConstraintOrigin};

    fn sample_input() -> DecisionTraceInput {
        DecisionTraceInput::new(
            ActorId::random(),
            UserId::new("u-1").unwrap(),
            "export",
            "external",
            ConsentTier::Execute,
            "export report",
        )
        .with_workspace("ws-1")
    }

    fn sample_authority() -> ResolvedAuthority {
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

    #[test]
    fn blocked_trace_records_reason_and_not_invoked() {
        let input = sample_input();
        let constraints = CompiledConstraints::new(vec![CompiledConstraint::deny(
            "consent-effective",
            "no_matching_consent",
            ConstraintOrigin::Consent,
        )]);
        let started = Utc::now();
        let trace = DecisionTrace::builder(
            &input,
            sample_authority(),
            ConsentVerdict::deny(ConsentReason::NoMatchingConsent),
            constraints,
        )
        .canon_version("canon/v1")
        .started_at(started)
        .finish(
            &GovernedActionResult::<()>::Block {
                reason: "no_matching_consent".into(),
            },
            started + Duration::milliseconds(3),
        );

        assert_eq!(trace.request_id(), input.request_id());
        assert_eq!(trace.outcome(), Outcome::Block);
        assert_eq!(trace.reason(), Some("no_matching_consent"));
        assert_eq!(trace.result_summary(), &ResultSummary::NotInvoked);
        assert_eq!(trace.workspace_id(), Some("ws-1"));
        assert!(trace.finished_at() >= trace.started_at());
    }

    #[test]
    fn failed_effect_keeps_verdict_outcome() {
        let trace = DecisionTrace::builder(
            &sample_input(),
            sample_authority(),
            ConsentVerdict::allow(ConsentId::random()),
            CompiledConstraints::default(),
        )
        .canon_version("canon/v1")
        .finish_failed("smtp down", Utc::now());

        assert_eq!(trace.outcome(), Outcome::Allow);
        assert_eq!(
            trace.result_summary(),
            &ResultSummary::EffectFailed {
                message: "smtp down".into()
            }
        );
    }

    #[test]
    fn trace_serializes_snapshot_fields() {
        let trace = DecisionTrace::builder(
            &sample_input(),
            sample_authority(),
            ConsentVerdict::allow(ConsentId::random()),
            CompiledConstraints::default(),
        )
        .canon_version("canon/v1")
        .finish(&GovernedActionResult::Allow { result: 7_u8 }, Utc::now());

        let value = serde_json::to_value(&trace).unwrap();
        assert_eq!(value["outcome"], "ALLOW");
        assert_eq!(value["result_summary"]["status"], "completed");
        assert_eq!(value["authority_snapshot"]["context"]["status"], "POSITIVE");
        assert_eq!(value["consent_snapshot"]["allowed"], true);
        assert_eq!(value["canon_version"], "canon/v1");

        let back: DecisionTrace = serde_json::from_value(value).unwrap();
        assert_eq!(back, trace);
    }

    #[test]
    fn reused_input_gets_a_fresh_trace_id_per_build() {
        let input = sample_input();
        let build = || {
            DecisionTrace::builder(
                &input,
                sample_authority(),
                ConsentVerdict::allow(ConsentId::random()),
                CompiledConstraints::default(),
            )
            .finish(&GovernedActionResult::Allow { result: () }, Utc::now())
        };

        let first = build();
        let second = build();

        assert_ne!(first.trace_id(), second.trace_id());
        assert_eq!(first.request_id(), input.request_id());
        assert_eq!(second.request_id(), input.request_id());
    }
}
