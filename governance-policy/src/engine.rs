//! Constraint rules and the deterministic constraint compiler.

use std::collections::BTreeSet;
use std::sync::Arc;

use governance_authority::{AuthorityConfidence, AuthorityStatus, ResolvedAuthority};
use governance_consent::{ConsentReason, ConsentVerdict};
use governance_primitives::ConsentTier;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::contracts::DecisionTraceInput;
use crate::decision::{CompiledConstraint, CompiledConstraints, ConstraintOrigin, reasons};

/// Selector used for medium-confidence degradation unless configured.
pub const DEFAULT_DEGRADED_SELECTOR: &str = "restricted";

/// Errors surfaced while building rules or compilers.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Rule configuration error.
    #[error("invalid policy rule `{name}`: {reason}")]
    InvalidRule {
        /// Name of the offending rule.
        name: String,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// Two rules share a name.
    #[error("duplicate policy rule `{0}`")]
    DuplicateRule(String),
    /// Degraded selector was blank.
    #[error("degraded selector cannot be empty")]
    EmptySelector,
}

impl PolicyError {
    fn invalid_rule(name: &str, reason: &'static str) -> Self {
        Self::InvalidRule {
            name: name.to_owned(),
            reason,
        }
    }
}

/// Result alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Restriction a configured rule contributes.
///
/// Rules only ever narrow what a request may do; there is no allow variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleEffect {
    /// Contribute a deny constraint.
    Deny,
    /// Contribute a degrade constraint.
    Degrade,
    /// Contribute an escalate constraint.
    Escalate,
}

/// Serializable rule definition, as found in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Unique rule name.
    pub name: String,
    /// Restriction applied on match.
    pub effect: RuleEffect,
    /// Reason code attached to the constraint.
    pub reason: String,
    /// Scope pattern: `*`, `prefix.*`, or an exact scope. Absent means any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Exact domain to match. Absent means any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Lowest tier the rule applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_tier: Option<ConsentTier>,
    /// Tags the action context must carry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_tags: Vec<String>,
    /// Selector for degrade rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Approvers for escalate rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approvers: Vec<String>,
}

/// Matches the scope of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeMatcher {
    /// Match every scope.
    Any,
    /// Match one scope exactly.
    Exact(String),
    /// Match `prefix` itself and every scope below `prefix.`.
    Prefix(String),
}

impl ScopeMatcher {
    /// Parses `*`, `prefix.*`, or an exact scope.
    ///
    /// Returns `None` for blank patterns or wildcards outside a trailing `.*`.
    #[must_use]
    pub fn parse(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return None;
        }
        if pattern == "*" {
            return Some(Self::Any);
        }
        if let Some(prefix) = pattern.strip_suffix(".*") {
            if prefix.is_empty() || prefix.contains('*') {
                return None;
            }
            return Some(Self::Prefix(prefix.to_owned()));
        }
        if pattern.contains('*') {
            return None;
        }
        Some(Self::Exact(pattern.to_owned()))
    }

    fn matches(&self, scope: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == scope,
            Self::Prefix(prefix) => scope
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.')),
        }
    }
}

/// Matches a request on scope, domain, minimum tier, and context tags.
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    scope: ScopeMatcher,
    domain: Option<String>,
    min_tier: Option<ConsentTier>,
    required_tags: BTreeSet<String>,
}

impl RuleMatcher {
    /// Creates a matcher that accepts every request.
    #[must_use]
    pub fn any() -> Self {
        Self {
            scope: ScopeMatcher::Any,
            domain: None,
            min_tier: None,
            required_tags: BTreeSet::new(),
        }
    }

    /// Creates a matcher for a scope pattern.
    #[must_use]
    pub fn for_scope(scope: ScopeMatcher) -> Self {
        Self {
            scope,
            ..Self::any()
        }
    }

    /// Narrows the matcher to one domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Narrows the matcher to `tier` and above.
    #[must_use]
    pub fn with_min_tier(mut self, tier: ConsentTier) -> Self {
        self.min_tier = Some(tier);
        self
    }

    /// Requires that the request carries the supplied tags.
    #[must_use]
    pub fn with_required_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !tag.trim().is_empty() {
                self.required_tags.insert(tag);
            }
        }
        self
    }

    fn matches(&self, input: &DecisionTraceInput) -> bool {
        self.scope.matches(input.scope())
            && self
                .domain
                .as_ref()
                .is_none_or(|expected| expected == input.domain())
            && self.min_tier.is_none_or(|min| input.tier() >= min)
            && self
                .required_tags
                .iter()
                .all(|tag| input.context().tags().contains(tag))
    }
}

/// Rule consisting of a matcher and the constraint it contributes.
#[derive(Debug, Clone)]
pub struct ConstraintRule {
    matcher: RuleMatcher,
    constraint: CompiledConstraint,
}

impl ConstraintRule {
    /// Creates a deny rule.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidRule`] when the name or reason is empty.
    pub fn deny(
        name: impl Into<String>,
        matcher: RuleMatcher,
        reason: impl Into<String>,
    ) -> PolicyResult<Self> {
        let (name, reason) = validated(name.into(), reason.into())?;
        Ok(Self {
            matcher,
            constraint: CompiledConstraint::deny(name, reason, ConstraintOrigin::Rule),
        })
    }

    /// Creates a degrade rule.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidRule`] when the name, reason, or selector
    /// is empty.
    pub fn degrade(
        name: impl Into<String>,
        matcher: RuleMatcher,
        reason: impl Into<String>,
        selector: impl Into<String>,
    ) -> PolicyResult<Self> {
        let (name, reason) = validated(name.into(), reason.into())?;
        let selector = selector.into();
        if selector.trim().is_empty() {
            return Err(PolicyError::invalid_rule(
                &name,
                "degrade rules need a selector",
            ));
        }
        Ok(Self {
            matcher,
            constraint: CompiledConstraint::degrade(name, reason, ConstraintOrigin::Rule, selector),
        })
    }

    /// Creates an escalate rule.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidRule`] when the name or reason is empty.
    pub fn escalate(
        name: impl Into<String>,
        matcher: RuleMatcher,
        reason: impl Into<String>,
        approvers: Vec<String>,
    ) -> PolicyResult<Self> {
        let (name, reason) = validated(name.into(), reason.into())?;
        Ok(Self {
            matcher,
            constraint: CompiledConstraint::escalate(
                name,
                reason,
                ConstraintOrigin::Rule,
                approvers,
            ),
        })
    }

    /// Builds a rule from its serialized definition.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidRule`] for malformed scope patterns, blank
    /// fields, selectors on non-degrade rules, or approvers on non-escalate
    /// rules.
    pub fn from_spec(spec: &RuleSpec) -> PolicyResult<Self> {
        let scope = match spec.scope.as_deref() {
            None => ScopeMatcher::Any,
            Some(pattern) => ScopeMatcher::parse(pattern)
                .ok_or_else(|| PolicyError::invalid_rule(&spec.name, "malformed scope pattern"))?,
        };
        let mut matcher =
            RuleMatcher::for_scope(scope).with_required_tags(spec.required_tags.iter().cloned());
        if let Some(domain) = &spec.domain {
            if domain.trim().is_empty() {
                return Err(PolicyError::invalid_rule(&spec.name, "domain cannot be blank"));
            }
            matcher = matcher.with_domain(domain.clone());
        }
        if let Some(tier) = spec.min_tier {
            matcher = matcher.with_min_tier(tier);
        }

        if spec.effect != RuleEffect::Degrade && spec.selector.is_some() {
            return Err(PolicyError::invalid_rule(
                &spec.name,
                "only degrade rules take a selector",
            ));
        }
        if spec.effect != RuleEffect::Escalate && !spec.approvers.is_empty() {
            return Err(PolicyError::invalid_rule(
                &spec.name,
                "only escalate rules take approvers",
            ));
        }

        match spec.effect {
            RuleEffect::Deny => Self::deny(&spec.name, matcher, &spec.reason),
            RuleEffect::Degrade => Self::degrade(
                &spec.name,
                matcher,
                &spec.reason,
                spec.selector.clone().unwrap_or_default(),
            ),
            RuleEffect::Escalate => {
                Self::escalate(&spec.name, matcher, &spec.reason, spec.approvers.clone())
            }
        }
    }

    /// Returns the rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.constraint.name()
    }

    /// Returns the constraint contributed on match.
    #[must_use]
    pub fn constraint(&self) -> &CompiledConstraint {
        &self.constraint
    }

    fn matches(&self, input: &DecisionTraceInput) -> bool {
        self.matcher.matches(input)
    }
}

fn validated(name: String, reason: String) -> PolicyResult<(String, String)> {
    if name.trim().is_empty() {
        return Err(PolicyError::invalid_rule(&name, "rule name cannot be empty"));
    }
    if reason.trim().is_empty() {
        return Err(PolicyError::invalid_rule(&name, "rule reason cannot be empty"));
    }
    Ok((name, reason))
}

/// Deterministic compiler from request, authority, and consent to constraints.
///
/// The compiler reads no clock, holds no per-call state, and never looks at the
/// actor. Its rule set is fixed at construction.
#[derive(Debug, Clone)]
pub struct ConstraintCompiler {
    rules: Arc<[ConstraintRule]>,
    degraded_selector: String,
}

impl Default for ConstraintCompiler {
    fn default() -> Self {
        Self {
            rules: Arc::from(Vec::new()),
            degraded_selector: DEFAULT_DEGRADED_SELECTOR.to_owned(),
        }
    }
}

impl ConstraintCompiler {
    /// Creates a compiler with built-in constraints only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a compiler with the supplied rules, evaluated in order.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::DuplicateRule`] when two rules share a name.
    pub fn with_rules(rules: Vec<ConstraintRule>) -> PolicyResult<Self> {
        let mut seen = BTreeSet::new();
        for rule in &rules {
            if !seen.insert(rule.name().to_owned()) {
                return Err(PolicyError::DuplicateRule(rule.name().to_owned()));
            }
        }
        Ok(Self {
            rules: Arc::from(rules),
            ..Self::default()
        })
    }

    /// Creates a compiler from serialized rule definitions.
    ///
    /// # Errors
    ///
    /// Returns the first rule validation error.
    pub fn from_specs(specs: &[RuleSpec]) -> PolicyResult<Self> {
        let rules = specs
            .iter()
            .map(ConstraintRule::from_spec)
            .collect::<PolicyResult<Vec<_>>>()?;
        Self::with_rules(rules)
    }

    /// Sets the selector used for medium-confidence degradation.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::EmptySelector`] for blank selectors.
    pub fn with_degraded_selector(mut self, selector: impl Into<String>) -> PolicyResult<Self> {
        let selector = selector.into();
        if selector.trim().is_empty() {
            return Err(PolicyError::EmptySelector);
        }
        self.degraded_selector = selector;
        Ok(self)
    }

    /// Returns the configured rules.
    #[must_use]
    pub fn rules(&self) -> &[ConstraintRule] {
        &self.rules
    }

    /// Returns the medium-confidence degrade selector.
    #[must_use]
    pub fn degraded_selector(&self) -> &str {
        &self.degraded_selector
    }

    /// Compiles every constraint that applies to the request.
    #[must_use]
    pub fn compile(
        &self,
        input: &DecisionTraceInput,
        authority: &ResolvedAuthority,
        consent: &ConsentVerdict,
    ) -> CompiledConstraints {
        let mut constraints = Vec::new();

        if input.is_malformed() {
            constraints.push(CompiledConstraint::deny(
                "request-shape",
                reasons::MALFORMED_REQUEST,
                ConstraintOrigin::Request,
            ));
        }

        if authority.is_absent() {
            constraints.push(CompiledConstraint::deny(
                "authority-present",
                reasons::NO_AUTHORITY,
                ConstraintOrigin::Authority,
            ));
        }

        if !consent.is_allowed() {
            let reason = consent
                .reason()
                .unwrap_or(ConsentReason::ConsentQueryFailed);
            constraints.push(CompiledConstraint::deny(
                "consent-effective",
                reason.as_str(),
                ConstraintOrigin::Consent,
            ));
        }

        if !authority.is_absent() {
            self.authority_constraints(authority, &mut constraints);
        }

        let context = input.context();
        if !context.is_reversible() && !context.has_human_stop() {
            constraints.push(CompiledConstraint::escalate(
                "human-stop",
                reasons::IRREVERSIBLE_WITHOUT_HUMAN_STOP,
                ConstraintOrigin::Context,
                Vec::new(),
            ));
        }

        for rule in self.rules.iter().filter(|rule| rule.matches(input)) {
            debug!(rule = rule.name(), scope = input.scope(), "constraint rule matched");
            constraints.push(rule.constraint().clone());
        }

        CompiledConstraints::new(constraints)
    }

    fn authority_constraints(
        &self,
        authority: &ResolvedAuthority,
        constraints: &mut Vec<CompiledConstraint>,
    ) {
        let context = authority.context();
        match (context.status(), context.confidence()) {
            (AuthorityStatus::Negative, _) => constraints.push(CompiledConstraint::deny(
                "authority-standing",
                reasons::AUTHORITY_NEGATIVE,
                ConstraintOrigin::Authority,
            )),
            (AuthorityStatus::Indeterminate, _) => constraints.push(CompiledConstraint::escalate(
                "authority-standing",
                reasons::AUTHORITY_INDETERMINATE,
                ConstraintOrigin::Authority,
                Vec::new(),
            )),
            (AuthorityStatus::Positive, AuthorityConfidence::Low) => {
                constraints.push(CompiledConstraint::escalate(
                    "authority-confidence",
                    reasons::AUTHORITY_LOW_CONFIDENCE,
                    ConstraintOrigin::Authority,
                    Vec::new(),
                ));
            }
            (AuthorityStatus::Positive, AuthorityConfidence::Medium) => {
                constraints.push(CompiledConstraint::degrade(
                    "authority-confidence",
                    reasons::AUTHORITY_MEDIUM_CONFIDENCE,
                    ConstraintOrigin::Authority,
                    self.degraded_selector.clone(),
                ));
            }
            (AuthorityStatus::Positive, AuthorityConfidence::High) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::ActionContext;
    use crate::decision::{Outcome, Verdict};
    use chrono::Utc;
    use governance_authority::{AuthorityContext, AuthorityInstance};
    use governance_consent::ConsentId;
    use governance_primitives::{ActorId, UserId};

    fn input(scope: &str, tier: ConsentTier) -> DecisionTraceInput {
        DecisionTraceInput::new(
            ActorId::random(),
            UserId::new("u-1").unwrap(),
            scope,
            "external",
            tier,
            "test action",
        )
        .with_context(ActionContext::new().with_reversible(true))
    }

    fn resolved(status: AuthorityStatus, confidence: AuthorityConfidence) -> ResolvedAuthority {
        let now = Utc::now();
        ResolvedAuthority::new(
            Some(AuthorityInstance::new("USPTO", "PATENTABILITY", now)),
            AuthorityContext::new("USPTO", "PATENTABILITY", status, confidence, now),
        )
    }

    fn strong() -> ResolvedAuthority {
        resolved(AuthorityStatus::Positive, AuthorityConfidence::High)
    }

    fn consented() -> ConsentVerdict {
        ConsentVerdict::allow(ConsentId::random())
    }

    fn outcome(
        compiler: &ConstraintCompiler,
        input: &DecisionTraceInput,
        authority: &ResolvedAuthority,
        consent: &ConsentVerdict,
    ) -> Verdict {
        compiler.compile(input, authority, consent).verdict()
    }

    #[test]
    fn strong_authority_with_consent_allows() {
        let compiler = ConstraintCompiler::new();
        let constraints = compiler.compile(
            &input("export", ConsentTier::Execute),
            &strong(),
            &consented(),
        );
        assert!(constraints.is_empty());
        assert_eq!(constraints.verdict(), Verdict::Allow);
    }

    #[test]
    fn absent_authority_denies() {
        let compiler = ConstraintCompiler::new();
        let absent = ResolvedAuthority::new(
            None,
            AuthorityContext::indeterminate("", "", "no_context", Utc::now()),
        );
        let verdict = outcome(
            &compiler,
            &input("export", ConsentTier::Execute),
            &absent,
            &consented(),
        );
        assert_eq!(verdict.reason(), Some(reasons::NO_AUTHORITY));
        assert_eq!(verdict.outcome(), Outcome::Block);
    }

    #[test]
    fn consent_reason_is_surfaced() {
        let compiler = ConstraintCompiler::new();
        let verdict = outcome(
            &compiler,
            &input("export", ConsentTier::Execute),
            &strong(),
            &ConsentVerdict::deny(ConsentReason::NoMatchingConsent),
        );
        assert_eq!(verdict.reason(), Some("no_matching_consent"));
    }

    #[test]
    fn authority_standing_table() {
        let compiler = ConstraintCompiler::new();
        let request = input("export", ConsentTier::Execute);
        let cases = [
            (
                AuthorityStatus::Negative,
                AuthorityConfidence::High,
                Outcome::Block,
                Some(reasons::AUTHORITY_NEGATIVE),
            ),
            (
                AuthorityStatus::Indeterminate,
                AuthorityConfidence::Low,
                Outcome::Escalate,
                Some(reasons::AUTHORITY_INDETERMINATE),
            ),
            (
                AuthorityStatus::Positive,
                AuthorityConfidence::Low,
                Outcome::Escalate,
                Some(reasons::AUTHORITY_LOW_CONFIDENCE),
            ),
            (
                AuthorityStatus::Positive,
                AuthorityConfidence::Medium,
                Outcome::Degrade,
                None,
            ),
            (
                AuthorityStatus::Positive,
                AuthorityConfidence::High,
                Outcome::Allow,
                None,
            ),
        ];
        for (status, confidence, expected, reason) in cases {
            let verdict = outcome(
                &compiler,
                &request,
                &resolved(status, confidence),
                &consented(),
            );
            assert_eq!(verdict.outcome(), expected, "{status:?}/{confidence:?}");
            assert_eq!(verdict.reason(), reason);
        }
    }

    #[test]
    fn medium_confidence_uses_configured_selector() {
        let compiler = ConstraintCompiler::new()
            .with_degraded_selector("read_only")
            .unwrap();
        let verdict = outcome(
            &compiler,
            &input("export", ConsentTier::Execute),
            &resolved(AuthorityStatus::Positive, AuthorityConfidence::Medium),
            &consented(),
        );
        let Verdict::Degrade(degradation) = verdict else {
            panic!("expected degrade");
        };
        assert_eq!(degradation.selectors(), ["read_only"]);
        assert!(ConstraintCompiler::new().with_degraded_selector(" ").is_err());
    }

    #[test]
    fn irreversible_without_human_stop_escalates() {
        let compiler = ConstraintCompiler::new();
        let request = input("payment.send", ConsentTier::Execute)
            .with_context(ActionContext::new().with_reversible(false));
        let verdict = outcome(&compiler, &request, &strong(), &consented());
        assert_eq!(verdict.reason(), Some(reasons::IRREVERSIBLE_WITHOUT_HUMAN_STOP));

        let request = input("payment.send", ConsentTier::Execute)
            .with_context(ActionContext::new().with_human_stop(true));
        assert_eq!(
            outcome(&compiler, &request, &strong(), &consented()),
            Verdict::Allow
        );
    }

    #[test]
    fn blank_scope_is_malformed() {
        let compiler = ConstraintCompiler::new();
        let verdict = outcome(
            &compiler,
            &input(" ", ConsentTier::Execute),
            &strong(),
            &consented(),
        );
        assert_eq!(verdict.reason(), Some(reasons::MALFORMED_REQUEST));
    }

    #[test]
    fn scope_patterns() {
        assert_eq!(ScopeMatcher::parse("*"), Some(ScopeMatcher::Any));
        assert_eq!(
            ScopeMatcher::parse("payment.*"),
            Some(ScopeMatcher::Prefix("payment".into()))
        );
        assert_eq!(
            ScopeMatcher::parse("export"),
            Some(ScopeMatcher::Exact("export".into()))
        );
        assert_eq!(ScopeMatcher::parse(""), None);
        assert_eq!(ScopeMatcher::parse("pay*ment"), None);
        assert_eq!(ScopeMatcher::parse(".*"), None);

        let prefix = ScopeMatcher::Prefix("payment".into());
        assert!(prefix.matches("payment"));
        assert!(prefix.matches("payment.send"));
        assert!(!prefix.matches("payments.send"));
    }

    #[test]
    fn rules_match_scope_domain_tier_and_tags() {
        let rule = ConstraintRule::escalate(
            "payments-need-finance",
            RuleMatcher::for_scope(ScopeMatcher::Prefix("payment".into()))
                .with_domain("external")
                .with_min_tier(ConsentTier::Prepare)
                .with_required_tags(["money"]),
            "payment_review",
            vec!["finance".into()],
        )
        .unwrap();
        let compiler = ConstraintCompiler::with_rules(vec![rule]).unwrap();

        let tagged = |scope: &str, tier| {
            input(scope, tier).with_context(
                ActionContext::new().with_reversible(true).with_tags(["money"]),
            )
        };

        let verdict = outcome(
            &compiler,
            &tagged("payment.send", ConsentTier::Execute),
            &strong(),
            &consented(),
        );
        assert_eq!(
            verdict,
            Verdict::Escalate {
                reason: "payment_review".into(),
                approvers: vec!["finance".into()],
            }
        );

        // Below the minimum tier, untagged, or out of scope: no match.
        for request in [
            tagged("payment.send", ConsentTier::Suggest),
            input("payment.send", ConsentTier::Execute),
            tagged("export", ConsentTier::Execute),
        ] {
            assert_eq!(
                outcome(&compiler, &request, &strong(), &consented()),
                Verdict::Allow
            );
        }
    }

    #[test]
    fn rules_cannot_lift_built_in_denials() {
        let spec: RuleSpec = serde_json::from_value(serde_json::json!({
            "name": "everything-degrades",
            "effect": "degrade",
            "reason": "sandbox",
            "scope": "*",
            "selector": "sandbox"
        }))
        .unwrap();
        let compiler = ConstraintCompiler::from_specs(&[spec]).unwrap();
        let verdict = outcome(
            &compiler,
            &input("export", ConsentTier::Execute),
            &strong(),
            &ConsentVerdict::deny(ConsentReason::NoMatchingConsent),
        );
        assert_eq!(verdict.outcome(), Outcome::Block);
    }

    #[test]
    fn malformed_rule_specs_are_rejected() {
        let base = RuleSpec {
            name: "r".into(),
            effect: RuleEffect::Deny,
            reason: "nope".into(),
            scope: None,
            domain: None,
            min_tier: None,
            required_tags: Vec::new(),
            selector: None,
            approvers: Vec::new(),
        };

        assert!(ConstraintRule::from_spec(&base).is_ok());
        let invalid = [
            RuleSpec {
                scope: Some("a*b".into()),
                ..base.clone()
            },
            RuleSpec {
                selector: Some("x".into()),
                ..base.clone()
            },
            RuleSpec {
                effect: RuleEffect::Degrade,
                ..base.clone()
            },
            RuleSpec {
                approvers: vec!["ops".into()],
                ..base.clone()
            },
            RuleSpec {
                reason: " ".into(),
                ..base.clone()
            },
        ];
        for spec in &invalid {
            assert!(ConstraintRule::from_spec(spec).is_err(), "{spec:?}");
        }
        assert!(matches!(
            ConstraintCompiler::from_specs(&[base.clone(), base]),
            Err(PolicyError::DuplicateRule(_))
        ));
    }

    #[test]
    fn actor_identity_is_not_consulted() {
        let compiler = ConstraintCompiler::new();
        let first = input("export", ConsentTier::Execute);
        let second = DecisionTraceInput::new(
            ActorId::random(),
            first.user_id().clone(),
            first.scope(),
            first.domain(),
            first.tier(),
            first.action(),
        )
        .with_context(first.context().clone());
        let authority = resolved(AuthorityStatus::Positive, AuthorityConfidence::Low);

        assert_eq!(
            compiler.compile(&first, &authority, &consented()),
            compiler.compile(&second, &authority, &consented())
        );
    }
}
