//! Authority source trait and the in-process implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::context::{AuthorityContext, AuthorityInstance};

/// Errors surfaced by authority sources.
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// Source is misconfigured or missing credentials.
    #[error("authority source not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },
    /// Transport-level failure reaching the source.
    #[error("authority transport error: {reason}")]
    Transport {
        /// Additional context about the error.
        reason: String,
    },
    /// The source answered with something that could not be used.
    #[error("authority response error: {reason}")]
    Response {
        /// Additional context about the response failure.
        reason: String,
    },
    /// The source has no knowledge of the requested authority/scope pair.
    #[error("unknown authority `{authority}` / `{scope}`")]
    Unknown {
        /// Requested authority name.
        authority: String,
        /// Requested authority scope.
        scope: String,
    },
}

impl AuthorityError {
    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for unusable responses.
    #[must_use]
    pub fn response(reason: impl Into<String>) -> Self {
        Self::Response {
            reason: reason.into(),
        }
    }
}

/// Result alias for authority lookups.
pub type AuthorityResult<T> = Result<T, AuthorityError>;

/// External provider of authority standing.
#[async_trait]
pub trait AuthoritySource: Send + Sync {
    /// Looks up the actor's standing for the supplied instance.
    async fn lookup(&self, instance: &AuthorityInstance) -> AuthorityResult<AuthorityContext>;
}

/// Fixed table of authority answers keyed by `(authority, scope)`.
#[derive(Debug, Default, Clone)]
pub struct StaticAuthoritySource {
    entries: HashMap<(String, String), AuthorityContext>,
}

impl StaticAuthoritySource {
    /// Creates an empty source; every lookup fails with
    /// [`AuthorityError::Unknown`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the answer returned for the context's authority and scope.
    #[must_use]
    pub fn with_context(mut self, context: AuthorityContext) -> Self {
        self.entries.insert(
            (context.authority().to_owned(), context.scope().to_owned()),
            context,
        );
        self
    }
}

#[async_trait]
impl AuthoritySource for StaticAuthoritySource {
    async fn lookup(&self, instance: &AuthorityInstance) -> AuthorityResult<AuthorityContext> {
        self.entries
            .get(&(instance.authority().to_owned(), instance.scope().to_owned()))
            .cloned()
            .ok_or_else(|| AuthorityError::Unknown {
                authority: instance.authority().to_owned(),
                scope: instance.scope().to_owned(),
            })
    }
}
