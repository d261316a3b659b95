//! Fail-closed authority resolution.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::context::{AuthorityContext, AuthorityInstance, AuthorityStatus, ResolvedAuthority};
use crate::source::{AuthorityError, AuthoritySource};

/// Reason codes attached to `INDETERMINATE` contexts produced by the resolver.
pub mod reasons {
    /// No authority instance was supplied.
    pub const NO_CONTEXT: &str = "no_context";
    /// The source failed or returned an unusable answer.
    pub const QUERY_EXCEPTION: &str = "query_exception";
    /// The source did not answer within the configured timeout.
    pub const QUERY_TIMEOUT: &str = "query_timeout";
    /// The source has no record of the requested authority.
    pub const UNKNOWN_AUTHORITY: &str = "unknown_authority";
    /// The source answered for a different authority or scope.
    pub const AUTHORITY_MISMATCH: &str = "authority_mismatch";
}

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves authority instances into read-only contexts.
///
/// Resolution never fails: missing instances, source errors, timeouts, and
/// mismatched answers all become `INDETERMINATE` with `LOW` confidence.
#[derive(Clone)]
pub struct AuthorityResolver {
    source: Arc<dyn AuthoritySource>,
    lookup_timeout: Duration,
}

impl fmt::Debug for AuthorityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorityResolver")
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

impl AuthorityResolver {
    /// Creates a resolver backed by the supplied source.
    #[must_use]
    pub fn new(source: Arc<dyn AuthoritySource>) -> Self {
        Self {
            source,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Sets the maximum time spent waiting on the source.
    #[must_use]
    pub fn with_timeout(mut self, lookup_timeout: Duration) -> Self {
        self.lookup_timeout = lookup_timeout;
        self
    }

    /// Resolves the supplied instance. `now` stamps contexts synthesised by
    /// the resolver itself.
    pub async fn resolve(
        &self,
        instance: Option<&AuthorityInstance>,
        now: DateTime<Utc>,
    ) -> ResolvedAuthority {
        let Some(instance) = instance else {
            debug!("no authority instance supplied");
            return ResolvedAuthority::new(
                None,
                AuthorityContext::indeterminate("", "", reasons::NO_CONTEXT, now),
            );
        };

        let context = match timeout(self.lookup_timeout, self.source.lookup(instance)).await {
            Err(_) => {
                warn!(
                    authority = instance.authority(),
                    scope = instance.scope(),
                    timeout_ms = u64::try_from(self.lookup_timeout.as_millis()).unwrap_or(u64::MAX),
                    "authority lookup timed out"
                );
                indeterminate_for(instance, reasons::QUERY_TIMEOUT, now)
            }
            Ok(Err(err)) => {
                warn!(
                    authority = instance.authority(),
                    scope = instance.scope(),
                    error = %err,
                    "authority lookup failed"
                );
                let reason = match err {
                    AuthorityError::Unknown { .. } => reasons::UNKNOWN_AUTHORITY,
                    _ => reasons::QUERY_EXCEPTION,
                };
                indeterminate_for(instance, reason, now)
            }
            Ok(Ok(context)) => sanitize(instance, context, now),
        };

        ResolvedAuthority::new(Some(instance.clone()), context)
    }

    /// Returns true when the context records an infrastructure failure
    /// rather than an answer from the source.
    #[must_use]
    pub fn is_lookup_failure(context: &AuthorityContext) -> bool {
        context.status() == AuthorityStatus::Indeterminate
            && matches!(
                context.reason(),
                Some(reasons::QUERY_EXCEPTION | reasons::QUERY_TIMEOUT)
            )
    }
}

fn indeterminate_for(
    instance: &AuthorityInstance,
    reason: &str,
    now: DateTime<Utc>,
) -> AuthorityContext {
    AuthorityContext::indeterminate(instance.authority(), instance.scope(), reason, now)
}

fn sanitize(
    instance: &AuthorityInstance,
    context: AuthorityContext,
    now: DateTime<Utc>,
) -> AuthorityContext {
    if context.authority() != instance.authority() || context.scope() != instance.scope() {
        warn!(
            requested_authority = instance.authority(),
            requested_scope = instance.scope(),
            answered_authority = context.authority(),
            answered_scope = context.scope(),
            "authority source answered for a different authority"
        );
        return indeterminate_for(instance, reasons::AUTHORITY_MISMATCH, now);
    }
    debug!(
        authority = context.authority(),
        scope = context.scope(),
        status = ?context.status(),
        confidence = ?context.confidence(),
        "authority resolved"
    );
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AuthorityConfidence;
    use crate::source::{AuthorityResult, StaticAuthoritySource};
    use async_trait::async_trait;

    struct FailingSource;

    #[async_trait]
    impl AuthoritySource for FailingSource {
        async fn lookup(&self, _instance: &AuthorityInstance) -> AuthorityResult<AuthorityContext> {
            Err(AuthorityError::transport("connection refused"))
        }
    }

    struct SlowSource;

    #[async_trait]
    impl AuthoritySource for SlowSource {
        async fn lookup(&self, instance: &AuthorityInstance) -> AuthorityResult<AuthorityContext> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(AuthorityContext::new(
                instance.authority(),
                instance.scope(),
                AuthorityStatus::Positive,
                AuthorityConfidence::High,
                Utc::now(),
            ))
        }
    }

    struct WrongScopeSource;

    #[async_trait]
    impl AuthoritySource for WrongScopeSource {
        async fn lookup(&self, instance: &AuthorityInstance) -> AuthorityResult<AuthorityContext> {
            Ok(AuthorityContext::new(
                instance.authority(),
                "EVERYTHING",
                AuthorityStatus::Positive,
                AuthorityConfidence::High,
                Utc::now(),
            ))
        }
    }

    fn instance() -> AuthorityInstance {
        AuthorityInstance::new("USPTO", "PATENTABILITY", Utc::now())
    }

    #[tokio::test]
    async fn missing_instance_is_indeterminate_no_context() {
        let resolver = AuthorityResolver::new(Arc::new(StaticAuthoritySource::new()));
        let resolved = resolver.resolve(None, Utc::now()).await;

        assert!(resolved.is_absent());
        assert_eq!(resolved.context().status(), AuthorityStatus::Indeterminate);
        assert_eq!(resolved.context().confidence(), AuthorityConfidence::Low);
        assert_eq!(resolved.context().reason(), Some(reasons::NO_CONTEXT));
    }

    #[tokio::test]
    async fn source_errors_never_upgrade() {
        let resolver = AuthorityResolver::new(Arc::new(FailingSource));
        let resolved = resolver.resolve(Some(&instance()), Utc::now()).await;

        assert_eq!(resolved.context().status(), AuthorityStatus::Indeterminate);
        assert_eq!(resolved.context().reason(), Some(reasons::QUERY_EXCEPTION));
        assert!(AuthorityResolver::is_lookup_failure(resolved.context()));
    }

    #[tokio::test]
    async fn slow_sources_time_out() {
        let resolver =
            AuthorityResolver::new(Arc::new(SlowSource)).with_timeout(Duration::from_millis(50));
        let resolved = resolver.resolve(Some(&instance()), Utc::now()).await;

        assert_eq!(resolved.context().reason(), Some(reasons::QUERY_TIMEOUT));
    }

    #[tokio::test]
    async fn mismatched_answers_are_indeterminate() {
        let resolver = AuthorityResolver::new(Arc::new(WrongScopeSource));
        let resolved = resolver.resolve(Some(&instance()), Utc::now()).await;

        assert_eq!(resolved.context().status(), AuthorityStatus::Indeterminate);
        assert_eq!(resolved.context().scope(), "PATENTABILITY");
        assert_eq!(resolved.context().reason(), Some(reasons::AUTHORITY_MISMATCH));
    }

    #[tokio::test]
    async fn unknown_authorities_are_not_lookup_failures() {
        let resolver = AuthorityResolver::new(Arc::new(StaticAuthoritySource::new()));
        let resolved = resolver.resolve(Some(&instance()), Utc::now()).await;

        assert_eq!(resolved.context().reason(), Some(reasons::UNKNOWN_AUTHORITY));
        assert!(!AuthorityResolver::is_lookup_failure(resolved.context()));
    }
}
