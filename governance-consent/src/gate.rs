//! The consent gate.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use governance_primitives::{ConsentTier, UserId};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::record::{ConsentId, ConsentKey, ConsentRecord};
use crate::registry::ConsentRegistry;

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Parameters of a consent check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentQuery {
    #[serde(flatten)]
    key: ConsentKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    workspace_id: Option<String>,
}

impl ConsentQuery {
    /// Creates a query for `(user_id, scope, domain, tier)`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        scope: impl Into<String>,
        domain: impl Into<String>,
        tier: ConsentTier,
    ) -> Self {
        Self {
            key: ConsentKey::new(user_id, scope, domain, tier),
            workspace_id: None,
        }
    }

    /// Records the workspace the action originates from. The workspace is
    /// carried for audit only and is not part of the match key.
    #[must_use]
    pub fn with_workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    /// Returns the registry key.
    #[must_use]
    pub fn key(&self) -> &ConsentKey {
        &self.key
    }

    /// Returns the optional workspace identifier.
    #[must_use]
    pub fn workspace_id(&self) -> Option<&str> {
        self.workspace_id.as_deref()
    }
}

/// Machine-readable reason attached to a denied consent check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentReason {
    /// No effective record matched the key.
    NoMatchingConsent,
    /// The registry failed or did not answer in time.
    ConsentQueryFailed,
}

impl ConsentReason {
    /// Returns the wire label of the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoMatchingConsent => "no_matching_consent",
            Self::ConsentQueryFailed => "consent_query_failed",
        }
    }
}

impl fmt::Display for ConsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a consent check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentVerdict {
    allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<ConsentReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    consent_id: Option<ConsentId>,
}

impl ConsentVerdict {
    /// Verdict backed by the supplied effective record.
    #[must_use]
    pub fn allow(consent_id: ConsentId) -> Self {
        Self {
            allowed: true,
            reason: None,
            consent_id: Some(consent_id),
        }
    }

    /// Denying verdict with a reason.
    #[must_use]
    pub fn deny(reason: ConsentReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            consent_id: None,
        }
    }

    /// Returns true when consent was found.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Returns the denial reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<ConsentReason> {
        self.reason
    }

    /// Returns the identifier of the effective record, if any.
    #[must_use]
    pub fn consent_id(&self) -> Option<ConsentId> {
        self.consent_id
    }
}

/// Selects the effective record for `key` at `now`.
///
/// Only records whose key equals `key` are considered, whatever the store
/// returned. Among granted, non-revoked, non-expired records the most recent
/// `created_at` wins.
#[must_use]
pub fn select_effective<'a>(
    records: &'a [ConsentRecord],
    key: &ConsentKey,
    now: DateTime<Utc>,
) -> Option<&'a ConsentRecord> {
    records
        .iter()
        .filter(|record| record.key() == key && record.is_effective_at(now))
        .max_by_key(|record| record.created_at())
}

/// Fail-closed consent gate over a [`ConsentRegistry`].
#[derive(Clone)]
pub struct ConsentGate {
    registry: Arc<dyn ConsentRegistry>,
    query_timeout: Duration,
}

impl fmt::Debug for ConsentGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsentGate")
            .field("query_timeout", &self.query_timeout)
            .finish_non_exhaustive()
    }
}

impl ConsentGate {
    /// Creates a gate over the registry.
    #[must_use]
    pub fn new(registry: Arc<dyn ConsentRegistry>) -> Self {
        Self {
            registry,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Sets the maximum time spent waiting on the registry.
    #[must_use]
    pub fn with_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    /// Checks consent for the query at `now`.
    ///
    /// Never errors: registry failures and timeouts yield
    /// [`ConsentReason::ConsentQueryFailed`].
    pub async fn check(&self, query: &ConsentQuery, now: DateTime<Utc>) -> ConsentVerdict {
        let key = query.key();
        let records = match timeout(self.query_timeout, self.registry.find(key)).await {
            Ok(Ok(records)) => records,
            Ok(Err(err)) => {
                warn!(
                    user_id = %key.user_id(),
                    scope = key.scope(),
                    domain = key.domain(),
                    tier = %key.tier(),
                    error = %err,
                    "consent query failed"
                );
                return ConsentVerdict::deny(ConsentReason::ConsentQueryFailed);
            }
            Err(_) => {
                warn!(
                    user_id = %key.user_id(),
                    scope = key.scope(),
                    domain = key.domain(),
                    tier = %key.tier(),
                    "consent query timed out"
                );
                return ConsentVerdict::deny(ConsentReason::ConsentQueryFailed);
            }
        };

        match select_effective(&records, key, now) {
            Some(record) => {
                debug!(
                    user_id = %key.user_id(),
                    scope = key.scope(),
                    consent_id = %record.id(),
                    "consent matched"
                );
                ConsentVerdict::allow(record.id())
            }
            None => {
                debug!(
                    user_id = %key.user_id(),
                    scope = key.scope(),
                    domain = key.domain(),
                    tier = %key.tier(),
                    candidates = records.len(),
                    "no matching consent"
                );
                ConsentVerdict::deny(ConsentReason::NoMatchingConsent)
            }
        }
    }
}
