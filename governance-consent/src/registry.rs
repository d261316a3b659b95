//! Consent registry trait and in-memory implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::record::{ConsentId, ConsentKey, ConsentRecord};

/// Errors emitted by consent registries.
#[derive(Debug, Error)]
pub enum ConsentError {
    /// The backing store could not be queried.
    #[error("consent store unavailable: {reason}")]
    Unavailable {
        /// Human-readable reason for operators.
        reason: String,
    },
    /// The referenced record does not exist.
    #[error("consent record {0} not found")]
    NotFound(ConsentId),
    /// The referenced record was already revoked.
    #[error("consent record {0} already revoked")]
    AlreadyRevoked(ConsentId),
}

impl ConsentError {
    /// Helper to construct availability errors.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Result alias for consent registry operations.
pub type ConsentResult<T> = Result<T, ConsentError>;

/// Read access to a `consent_registry`-shaped store.
///
/// The engine only ever reads through this trait; grants and revocations
/// happen out-of-band.
#[async_trait]
pub trait ConsentRegistry: Send + Sync {
    /// Returns every record stored under `key`, in any order.
    async fn find(&self, key: &ConsentKey) -> ConsentResult<Vec<ConsentRecord>>;
}

/// In-process registry used by embedders and tests.
#[derive(Debug, Default)]
pub struct InMemoryConsentRegistry {
    records: RwLock<Vec<ConsentRecord>>,
}

impl InMemoryConsentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new record and returns its identifier.
    pub async fn grant(&self, record: ConsentRecord) -> ConsentId {
        let id = record.id();
        self.records.write().await.push(record);
        id
    }

    /// Revokes a record.
    ///
    /// # Errors
    ///
    /// Returns [`ConsentError::NotFound`] for unknown identifiers and
    /// [`ConsentError::AlreadyRevoked`] when the record was revoked before.
    pub async fn revoke(&self, id: ConsentId, at: DateTime<Utc>) -> ConsentResult<()> {
        let mut guard = self.records.write().await;
        let record = guard
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or(ConsentError::NotFound(id))?;
        if record.revoke(at) {
            Ok(())
        } else {
            Err(ConsentError::AlreadyRevoked(id))
        }
    }

    /// Returns the number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true when no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ConsentRegistry for InMemoryConsentRegistry {
    async fn find(&self, key: &ConsentKey) -> ConsentResult<Vec<ConsentRecord>> {
        let guard = self.records.read().await;
        Ok(guard
            .iter()
            .filter(|record| record.key() == key)
            .cloned()
            .collect())
    }
}
