//! Consent registry records.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use governance_primitives::{ConsentTier, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a consent record.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsentId(Uuid);

impl ConsentId {
    /// Generates a random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl Display for ConsentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Lookup key of the consent registry.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct ConsentKey {
    user_id: UserId,
    scope: String,
    domain: String,
    tier: ConsentTier,
}

impl ConsentKey {
    /// Creates a key.
    #[must_use]
    pub fn new(
        user_id: UserId,
        scope: impl Into<String>,
        domain: impl Into<String>,
        tier: ConsentTier,
    ) -> Self {
        Self {
            user_id,
            scope: scope.into(),
            domain: domain.into(),
            tier,
        }
    }

    /// Returns the consent subject.
    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the action scope (e.g. `reminder.create`).
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns the subject-area domain (e.g. `memory`, `external`).
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the requested tier.
    #[must_use]
    pub fn tier(&self) -> ConsentTier {
        self.tier
    }
}

/// One row of the consent registry.
///
/// Records are created by an out-of-band granting flow. The only later change
/// is revocation, which stamps `revoked_at`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    id: ConsentId,
    #[serde(flatten)]
    key: ConsentKey,
    granted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revoked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl ConsentRecord {
    /// Creates a granted record.
    #[must_use]
    pub fn granted(key: ConsentKey, created_at: DateTime<Utc>) -> Self {
        Self::new(key, true, created_at)
    }

    /// Creates a record with an explicit grant flag.
    #[must_use]
    pub fn new(key: ConsentKey, granted: bool, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ConsentId::random(),
            key,
            granted,
            expires_at: None,
            revoked_at: None,
            created_at,
        }
    }

    /// Sets the expiry instant.
    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Marks the record as already revoked.
    #[must_use]
    pub fn with_revocation(mut self, revoked_at: DateTime<Utc>) -> Self {
        self.revoked_at = Some(revoked_at);
        self
    }

    pub(crate) fn revoke(&mut self, at: DateTime<Utc>) -> bool {
        if self.revoked_at.is_some() {
            return false;
        }
        self.revoked_at = Some(at);
        true
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn id(&self) -> ConsentId {
        self.id
    }

    /// Returns the registry key.
    #[must_use]
    pub fn key(&self) -> &ConsentKey {
        &self.key
    }

    /// Returns whether consent was granted.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.granted
    }

    /// Returns the optional expiry.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns the optional revocation instant.
    #[must_use]
    pub fn revoked_at(&self) -> Option<DateTime<Utc>> {
        self.revoked_at
    }

    /// Returns when the record was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true when the record grants consent at `now`: granted, not
    /// revoked, and not expired.
    #[must_use]
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.granted
            && self.revoked_at.is_none()
            && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn key() -> ConsentKey {
        ConsentKey::new(
            UserId::new("u-1").unwrap(),
            "reminder.create",
            "memory",
            ConsentTier::Prepare,
        )
    }

    #[test]
    fn effectiveness_respects_grant_revocation_and_expiry() {
        let now = Utc::now();
        assert!(ConsentRecord::granted(key(), now).is_effective_at(now));
        assert!(!ConsentRecord::new(key(), false, now).is_effective_at(now));
        assert!(
            !ConsentRecord::granted(key(), now)
                .with_revocation(now)
                .is_effective_at(now)
        );
        assert!(
            !ConsentRecord::granted(key(), now)
                .with_expiry(now - Duration::seconds(1))
                .is_effective_at(now)
        );
        // Expiry is exclusive: a record expiring exactly now no longer counts.
        assert!(
            !ConsentRecord::granted(key(), now)
                .with_expiry(now)
                .is_effective_at(now)
        );
    }

    #[test]
    fn record_serializes_registry_columns() {
        let record = ConsentRecord::granted(key(), Utc::now());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["user_id"], "u-1");
        assert_eq!(value["tier"], "prepare");
        assert_eq!(value["granted"], true);
        assert!(value.get("revoked_at").is_none());
    }
}
