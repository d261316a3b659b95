//! Authority context types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standing of an actor with respect to a named authority and scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorityStatus {
    /// The authority affirms the actor's standing.
    Positive,
    /// The authority denies the actor's standing.
    Negative,
    /// Standing could not be established.
    Indeterminate,
}

/// Confidence attached to an authority answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorityConfidence {
    /// Weak or partial evidence.
    Low,
    /// Reasonable evidence.
    Medium,
    /// Strong evidence.
    High,
}

/// Opaque, versioned payload returned by an authority source.
///
/// `schema` names the document layout for the originating authority (for
/// example `uspto.search/v1`). The body is carried as data and is never
/// interpreted as policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityPayload {
    schema: String,
    body: Value,
}

impl AuthorityPayload {
    /// Wraps a payload body under the supplied schema identifier.
    #[must_use]
    pub fn new(schema: impl Into<String>, body: Value) -> Self {
        Self {
            schema: schema.into(),
            body,
        }
    }

    /// Returns the schema identifier.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Returns the raw payload body.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }
}

/// Read-only authority context produced once per evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityContext {
    authority: String,
    scope: String,
    status: AuthorityStatus,
    confidence: AuthorityConfidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<AuthorityPayload>,
    timestamp: DateTime<Utc>,
}

impl AuthorityContext {
    /// Creates a context with the supplied standing.
    #[must_use]
    pub fn new(
        authority: impl Into<String>,
        scope: impl Into<String>,
        status: AuthorityStatus,
        confidence: AuthorityConfidence,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            authority: authority.into(),
            scope: scope.into(),
            status,
            confidence,
            reason: None,
            data: None,
            timestamp,
        }
    }

    /// Creates an `INDETERMINATE`/`LOW` context carrying a reason code.
    #[must_use]
    pub fn indeterminate(
        authority: impl Into<String>,
        scope: impl Into<String>,
        reason: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            authority,
            scope,
            AuthorityStatus::Indeterminate,
            AuthorityConfidence::Low,
            timestamp,
        )
        .with_reason(reason)
    }

    /// Attaches a reason code.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an opaque payload.
    #[must_use]
    pub fn with_data(mut self, data: AuthorityPayload) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns the authority name (e.g. `USPTO`).
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Returns the authority scope (e.g. `PATENTABILITY`).
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the standing.
    #[must_use]
    pub fn status(&self) -> AuthorityStatus {
        self.status
    }

    /// Returns the confidence level.
    #[must_use]
    pub fn confidence(&self) -> AuthorityConfidence {
        self.confidence
    }

    /// Returns the optional reason code.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the optional payload.
    #[must_use]
    pub fn data(&self) -> Option<&AuthorityPayload> {
        self.data.as_ref()
    }

    /// Returns when the context was produced.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Authority the caller's session layer claims the actor currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityInstance {
    authority: String,
    scope: String,
    issued_at: DateTime<Utc>,
}

impl AuthorityInstance {
    /// Creates an authority instance.
    #[must_use]
    pub fn new(
        authority: impl Into<String>,
        scope: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            authority: authority.into(),
            scope: scope.into(),
            issued_at,
        }
    }

    /// Returns the authority name.
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Returns the authority scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns when the session layer issued the instance.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

/// Snapshot of the authority side of one evaluation.
///
/// `instance` is `None` when the caller supplied no authority; `context` is
/// always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAuthority {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    instance: Option<AuthorityInstance>,
    context: AuthorityContext,
}

impl ResolvedAuthority {
    /// Pairs an optional instance with its resolved context.
    #[must_use]
    pub fn new(instance: Option<AuthorityInstance>, context: AuthorityContext) -> Self {
        Self { instance, context }
    }

    /// Returns the instance the caller supplied, if any.
    #[must_use]
    pub fn instance(&self) -> Option<&AuthorityInstance> {
        self.instance.as_ref()
    }

    /// Returns the resolved context.
    #[must_use]
    pub fn context(&self) -> &AuthorityContext {
        &self.context
    }

    /// Returns true when the caller supplied no authority.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.instance.is_none()
    }
}
