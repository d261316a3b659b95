//! Request contracts for governance evaluation.

use std::collections::BTreeSet;

use governance_consent::ConsentQuery;
use governance_primitives::{ActorId, ConsentTier, RequestId, UserId};
use serde::{Deserialize, Serialize};

/// Caller-declared shape of the effect.
///
/// Both flags default to `false`: an action that says nothing about itself is
/// treated as irreversible with no human stop and therefore escalates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionContext {
    #[serde(default)]
    has_human_stop: bool,
    #[serde(default)]
    reversible: bool,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    tags: BTreeSet<String>,
}

impl ActionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares whether a human can stop the effect before it commits.
    #[must_use]
    pub fn with_human_stop(mut self, has_human_stop: bool) -> Self {
        self.has_human_stop = has_human_stop;
        self
    }

    /// Declares whether the effect can be undone.
    #[must_use]
    pub fn with_reversible(mut self, reversible: bool) -> Self {
        self.reversible = reversible;
        self
    }

    /// Adds a tag, ignoring empty or whitespace-only strings.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !tag.trim().is_empty() {
            self.tags.insert(tag);
        }
    }

    /// Extends the context with multiple tags.
    pub fn extend_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self.add_tag(tag);
        }
    }

    /// Adds multiple tags and returns the updated instance.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extend_tags(tags);
        self
    }

    /// Returns true when a human stop exists.
    #[must_use]
    pub fn has_human_stop(&self) -> bool {
        self.has_human_stop
    }

    /// Returns true when the effect is reversible.
    #[must_use]
    pub fn is_reversible(&self) -> bool {
        self.reversible
    }

    /// Returns the tag set.
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

/// Everything the gate is told about one proposed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTraceInput {
    request_id: RequestId,
    actor: ActorId,
    user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    workspace_id: Option<String>,
    scope: String,
    domain: String,
    tier: ConsentTier,
    action: String,
    #[serde(default)]
    context: ActionContext,
}

impl DecisionTraceInput {
    /// Creates an input with a fresh request identifier and an empty context.
    #[must_use]
    pub fn new(
        actor: ActorId,
        user_id: UserId,
        scope: impl Into<String>,
        domain: impl Into<String>,
        tier: ConsentTier,
        action: impl Into<String>,
    ) -> Self {
        Self {
            request_id: RequestId::random(),
            actor,
            user_id,
            workspace_id: None,
            scope: scope.into(),
            domain: domain.into(),
            tier,
            action: action.into(),
            context: ActionContext::default(),
        }
    }

    /// Overrides the request identifier, typically to correlate retries.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Sets the originating workspace.
    #[must_use]
    pub fn with_workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    /// Replaces the action context.
    #[must_use]
    pub fn with_context(mut self, context: ActionContext) -> Self {
        self.context = context;
        self
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

    /// Returns the optional workspace.
    #[must_use]
    pub fn workspace_id(&self) -> Option<&str> {
        self.workspace_id.as_deref()
    }

    /// Returns the action scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the subject-area domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the requested consent tier.
    #[must_use]
    pub fn tier(&self) -> ConsentTier {
        self.tier
    }

    /// Returns the free-form action label.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns the action context.
    #[must_use]
    pub fn context(&self) -> &ActionContext {
        &self.context
    }

    /// Returns true when scope or domain is blank.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        self.scope.trim().is_empty() || self.domain.trim().is_empty()
    }

    /// Builds the consent query for this input.
    #[must_use]
    pub fn consent_query(&self) -> ConsentQuery {
        let query = ConsentQuery::new(
            self.user_id.clone(),
            self.scope.clone(),
            self.domain.clone(),
            self.tier,
        );
        match &self.workspace_id {
            Some(workspace_id) => query.with_workspace(workspace_id.clone()),
            None => query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> DecisionTraceInput {
        DecisionTraceInput::new(
            ActorId::random(),
            UserId::new("u-1").unwrap(),
            "reminder.create",
            "memory",
            ConsentTier::Prepare,
            "create reminder",
        )
    }

    #[test]
    fn action_context_manages_tags() {
        let mut ctx = ActionContext::new();
        ctx.add_tag("alpha");
        ctx.add_tag("alpha");
        ctx.extend_tags(["beta", " ", "gamma"]);

        assert_eq!(ctx.tags().len(), 3);
        assert!(ctx.tags().contains("beta"));
    }

    #[test]
    fn context_defaults_are_conservative() {
        let ctx = ActionContext::default();
        assert!(!ctx.is_reversible());
        assert!(!ctx.has_human_stop());

        let ctx: ActionContext = serde_json::from_str("{}").unwrap();
        assert!(!ctx.is_reversible());
    }

    #[test]
    fn context_serializes_only_declared_fields() {
        let ctx = ActionContext::new().with_reversible(true).with_tags(["pii"]);
        assert_eq!(
            serde_json::to_value(&ctx).unwrap(),
            serde_json::json!({"has_human_stop": false, "reversible": true, "tags": ["pii"]})
        );
    }

    #[test]
    fn blank_scope_or_domain_is_malformed() {
        assert!(!input().is_malformed());
        let blank = DecisionTraceInput::new(
            ActorId::random(),
            UserId::new("u-1").unwrap(),
            "  ",
            "memory",
            ConsentTier::Prepare,
            "noop",
        );
        assert!(blank.is_malformed());
    }

    #[test]
    fn consent_query_carries_workspace_and_key() {
        let query = input().with_workspace("ws-9").consent_query();
        assert_eq!(query.key().scope(), "reminder.create");
        assert_eq!(query.key().tier(), ConsentTier::Prepare);
        assert_eq!(query.workspace_id(), Some("ws-9"));
    }
}
