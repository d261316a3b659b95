//! Operational anomaly counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Infrastructure failure absorbed by a fail-closed default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// The consent registry errored or timed out.
    ConsentQueryFailed,
    /// The authority source errored or timed out.
    AuthorityLookupFailed,
    /// A decision trace could not be persisted.
    AuditWriteFailed,
    /// An observed-harm entry could not be persisted.
    HarmWriteFailed,
}

impl AnomalyKind {
    /// Every kind, in counter order.
    pub const ALL: [Self; 4] = [
        Self::ConsentQueryFailed,
        Self::AuthorityLookupFailed,
        Self::AuditWriteFailed,
        Self::HarmWriteFailed,
    ];

    /// Returns the stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConsentQueryFailed => "consent_query_failed",
            Self::AuthorityLookupFailed => "authority_lookup_failed",
            Self::AuditWriteFailed => "audit_write_failed",
            Self::HarmWriteFailed => "harm_write_failed",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::ConsentQueryFailed => 0,
            Self::AuthorityLookupFailed => 1,
            Self::AuditWriteFailed => 2,
            Self::HarmWriteFailed => 3,
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock-free counters, one per [`AnomalyKind`].
#[derive(Debug, Default)]
pub struct AnomalyCounters {
    counts: [AtomicU64; 4],
}

impl AnomalyCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for `kind`.
    pub fn record(&self, kind: AnomalyKind) {
        self.counts[kind.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Reads the counter for `kind`.
    #[must_use]
    pub fn get(&self, kind: AnomalyKind) -> u64 {
        self.counts[kind.index()].load(Ordering::Relaxed)
    }

    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> AnomalySnapshot {
        AnomalySnapshot {
            consent_query_failed: self.get(AnomalyKind::ConsentQueryFailed),
            authority_lookup_failed: self.get(AnomalyKind::AuthorityLookupFailed),
            audit_write_failed: self.get(AnomalyKind::AuditWriteFailed),
            harm_write_failed: self.get(AnomalyKind::HarmWriteFailed),
        }
    }
}

/// Point-in-time copy of [`AnomalyCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct AnomalySnapshot {
    pub consent_query_failed: u64,
    pub authority_lookup_failed: u64,
    pub audit_write_failed: u64,
    pub harm_write_failed: u64,
}

impl AnomalySnapshot {
    /// Sum of every counter.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.consent_query_failed
            + self.authority_lookup_failed
            + self.audit_write_failed
            + self.harm_write_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn counters_are_independent() {
        let counters = AnomalyCounters::new();
        counters.record(AnomalyKind::AuditWriteFailed);
        counters.record(AnomalyKind::AuditWriteFailed);
        counters.record(AnomalyKind::ConsentQueryFailed);

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.audit_write_failed, 2);
        assert_eq!(snapshot.consent_query_failed, 1);
        assert_eq!(snapshot.authority_lookup_failed, 0);
        assert_eq!(snapshot.total(), 3);
    }

    #[test]
    fn counters_are_shared_across_threads() {
        let counters = Arc::new(AnomalyCounters::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counters = Arc::clone(&counters);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        counters.record(AnomalyKind::HarmWriteFailed);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counters.get(AnomalyKind::HarmWriteFailed), 800);
    }

    #[test]
    fn labels_are_stable() {
        for kind in AnomalyKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }
}
