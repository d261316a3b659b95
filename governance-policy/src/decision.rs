//! Compiled constraints and the verdict derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reason codes of the built-in constraints.
pub mod reasons {
    /// Scope or domain was blank.
    pub const MALFORMED_REQUEST: &str = "malformed_request";
    /// The caller supplied no authority instance.
    pub const NO_AUTHORITY: &str = "no_authority";
    /// The authority denied the actor's standing.
    pub const AUTHORITY_NEGATIVE: &str = "authority_negative";
    /// Standing could not be established.
    pub const AUTHORITY_INDETERMINATE: &str = "authority_indeterminate";
    /// Positive standing backed by weak evidence.
    pub const AUTHORITY_LOW_CONFIDENCE: &str = "authority_low_confidence";
    /// Positive standing backed by reasonable evidence.
    pub const AUTHORITY_MEDIUM_CONFIDENCE: &str = "authority_medium_confidence";
    /// Irreversible effect with nobody able to stop it.
    pub const IRREVERSIBLE_WITHOUT_HUMAN_STOP: &str = "irreversible_without_human_stop";
}

/// Effect a constraint has on the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    /// Refuse the action.
    Deny,
    /// Run the action in a restricted mode.
    Degrade,
    /// Hold the action for human approval.
    Escalate,
}

/// Where a constraint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintOrigin {
    /// Derived from the authority snapshot.
    Authority,
    /// Derived from the consent verdict.
    Consent,
    /// Derived from the caller-declared action context.
    Context,
    /// Derived from the request shape.
    Request,
    /// Contributed by a configured rule.
    Rule,
}

/// One constraint applicable to a proposed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledConstraint {
    name: String,
    kind: ConstraintKind,
    reason: String,
    origin: ConstraintOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    degrade_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    approvers: Vec<String>,
}

impl CompiledConstraint {
    /// Returns a deny constraint.
    #[must_use]
    pub fn deny(
        name: impl Into<String>,
        reason: impl Into<String>,
        origin: ConstraintOrigin,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::Deny,
            reason: reason.into(),
            origin,
            degrade_selector: None,
            approvers: Vec::new(),
        }
    }

    /// Returns a degrade constraint restricting the effect to `selector`.
    #[must_use]
    pub fn degrade(
        name: impl Into<String>,
        reason: impl Into<String>,
        origin: ConstraintOrigin,
        selector: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::Degrade,
            reason: reason.into(),
            origin,
            degrade_selector: Some(selector.into()),
            approvers: Vec::new(),
        }
    }

    /// Returns an escalate constraint with optional approver identifiers.
    #[must_use]
    pub fn escalate(
        name: impl Into<String>,
        reason: impl Into<String>,
        origin: ConstraintOrigin,
        approvers: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::Escalate,
            reason: reason.into(),
            origin,
            degrade_selector: None,
            approvers,
        }
    }

    /// Returns the constraint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the constraint kind.
    #[must_use]
    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    /// Returns the machine-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the origin.
    #[must_use]
    pub fn origin(&self) -> ConstraintOrigin {
        self.origin
    }

    /// Returns the degrade selector for degrade constraints.
    #[must_use]
    pub fn degrade_selector(&self) -> Option<&str> {
        self.degrade_selector.as_deref()
    }

    /// Returns the approvers for escalate constraints.
    #[must_use]
    pub fn approvers(&self) -> &[String] {
        &self.approvers
    }
}

/// Restrictions the effect must honour when running degraded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degradation {
    selectors: Vec<String>,
}

impl Degradation {
    /// Creates a degradation from selectors, dropping duplicates while keeping
    /// first-seen order.
    #[must_use]
    pub fn new<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for selector in selectors {
            let selector = selector.into();
            if !unique.contains(&selector) {
                unique.push(selector);
            }
        }
        Self { selectors: unique }
    }

    /// Returns the selectors.
    #[must_use]
    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    /// Returns true when `selector` is part of the degradation.
    #[must_use]
    pub fn contains(&self, selector: &str) -> bool {
        self.selectors.iter().any(|candidate| candidate == selector)
    }
}

/// The four outcomes of a governed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Run the effect in full.
    Allow,
    /// Run the effect under a [`Degradation`].
    Degrade,
    /// Refuse without running the effect.
    Block,
    /// Hold for human approval without running the effect.
    Escalate,
}

impl Outcome {
    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Degrade => "DEGRADE",
            Self::Block => "BLOCK",
            Self::Escalate => "ESCALATE",
        }
    }

    /// Returns true for outcomes that invoke the effect.
    #[must_use]
    pub const fn runs_effect(self) -> bool {
        matches!(self, Self::Allow | Self::Degrade)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision derived from a set of compiled constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No constraint applies.
    Allow,
    /// Only degrade constraints apply.
    Degrade(Degradation),
    /// At least one deny constraint applies.
    Block {
        /// Reason of the first deny constraint.
        reason: String,
    },
    /// No deny, at least one escalate constraint.
    Escalate {
        /// Reason of the first escalate constraint.
        reason: String,
        /// Union of approvers across escalate constraints.
        approvers: Vec<String>,
    },
}

impl Verdict {
    /// Returns the outcome of the verdict.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Allow => Outcome::Allow,
            Self::Degrade(_) => Outcome::Degrade,
            Self::Block { .. } => Outcome::Block,
            Self::Escalate { .. } => Outcome::Escalate,
        }
    }

    /// Returns the reason for block and escalate verdicts.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Block { reason } | Self::Escalate { reason, .. } => Some(reason),
            Self::Allow | Self::Degrade(_) => None,
        }
    }
}

/// Ordered constraints compiled for one evaluation.
///
/// Constraints are kept deny-first, then degrade, then escalate, stable
/// within each class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompiledConstraints {
    constraints: Vec<CompiledConstraint>,
}

impl CompiledConstraints {
    /// Orders the supplied constraints.
    #[must_use]
    pub fn new(mut constraints: Vec<CompiledConstraint>) -> Self {
        constraints.sort_by_key(CompiledConstraint::kind);
        Self { constraints }
    }

    /// Returns the ordered constraints.
    #[must_use]
    pub fn as_slice(&self) -> &[CompiledConstraint] {
        &self.constraints
    }

    /// Returns true when no constraint applies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Returns the number of constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Iterates over the constraints in order.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledConstraint> {
        self.constraints.iter()
    }

    /// Derives the verdict.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if let Some(deny) = self.of_kind(ConstraintKind::Deny).next() {
            return Verdict::Block {
                reason: deny.reason().to_owned(),
            };
        }

        let mut escalations = self.of_kind(ConstraintKind::Escalate).peekable();
        if let Some(first) = escalations.peek() {
            let reason = first.reason().to_owned();
            let mut approvers: Vec<String> = Vec::new();
            for approver in escalations.flat_map(|constraint| constraint.approvers().iter()) {
                if !approvers.contains(approver) {
                    approvers.push(approver.clone());
                }
            }
            return Verdict::Escalate { reason, approvers };
        }

        if self.of_kind(ConstraintKind::Degrade).next().is_none() {
            return Verdict::Allow;
        }
        Verdict::Degrade(Degradation::new(
            self.of_kind(ConstraintKind::Degrade)
                .filter_map(CompiledConstraint::degrade_selector),
        ))
    }

    fn of_kind(&self, kind: ConstraintKind) -> impl Iterator<Item = &CompiledConstraint> {
        self.constraints
            .iter()
            .filter(move |constraint| constraint.kind() == kind)
    }
}

impl<'a> IntoIterator for &'a CompiledConstraints {
    type Item = &'a CompiledConstraint;
    type IntoIter = std::slice::Iter<'a, CompiledConstraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escalate(reason: &str, approvers: &[&str]) -> CompiledConstraint {
        CompiledConstraint::escalate(
            reason,
            reason,
            ConstraintOrigin::Rule,
            approvers.iter().map(|a| (*a).to_owned()).collect(),
        )
    }

    #[test]
    fn ordering_is_deny_degrade_escalate_and_stable() {
        let constraints = CompiledConstraints::new(vec![
            escalate("e1", &[]),
            CompiledConstraint::degrade("d1", "d1", ConstraintOrigin::Rule, "restricted"),
            CompiledConstraint::deny("x1", "x1", ConstraintOrigin::Request),
            escalate("e2", &[]),
            CompiledConstraint::deny("x2", "x2", ConstraintOrigin::Rule),
        ]);
        let names: Vec<&str> = constraints.iter().map(CompiledConstraint::name).collect();
        assert_eq!(names, ["x1", "x2", "d1", "e1", "e2"]);
    }

    #[test]
    fn first_deny_short_circuits() {
        let constraints = CompiledConstraints::new(vec![
            escalate("needs_review", &["legal"]),
            CompiledConstraint::deny("a", "no_authority", ConstraintOrigin::Authority),
            CompiledConstraint::deny("b", "no_matching_consent", ConstraintOrigin::Consent),
        ]);
        assert_eq!(
            constraints.verdict(),
            Verdict::Block {
                reason: "no_authority".into()
            }
        );
    }

    #[test]
    fn escalate_beats_degrade_and_merges_approvers() {
        let constraints = CompiledConstraints::new(vec![
            CompiledConstraint::degrade("d", "d", ConstraintOrigin::Authority, "restricted"),
            escalate("first", &["legal", "ops"]),
            escalate("second", &["ops", "security"]),
        ]);
        let verdict = constraints.verdict();
        assert_eq!(verdict.outcome(), Outcome::Escalate);
        assert_eq!(
            verdict,
            Verdict::Escalate {
                reason: "first".into(),
                approvers: vec!["legal".into(), "ops".into(), "security".into()],
            }
        );
    }

    #[test]
    fn degrade_collects_every_selector() {
        let constraints = CompiledConstraints::new(vec![
            CompiledConstraint::degrade("a", "a", ConstraintOrigin::Authority, "restricted"),
            CompiledConstraint::degrade("b", "b", ConstraintOrigin::Rule, "read_only"),
            CompiledConstraint::degrade("c", "c", ConstraintOrigin::Rule, "restricted"),
        ]);
        let Verdict::Degrade(degradation) = constraints.verdict() else {
            panic!("expected degrade");
        };
        assert_eq!(degradation.selectors(), ["restricted", "read_only"]);
        assert!(degradation.contains("read_only"));
    }

    #[test]
    fn empty_constraints_allow() {
        assert_eq!(CompiledConstraints::default().verdict(), Verdict::Allow);
        assert!(Outcome::Allow.runs_effect());
        assert!(!Outcome::Escalate.runs_effect());
    }

    #[test]
    fn constraint_wire_format() {
        let constraint =
            CompiledConstraint::deny("authority-present", "no_authority", ConstraintOrigin::Authority);
        let value = serde_json::to_value(&constraint).unwrap();
        assert_eq!(value["kind"], "DENY");
        assert_eq!(value["origin"], "authority");
        assert!(value.get("approvers").is_none());
    }
}
