//! Observed-harm ledger.
//!
//! The ledger documents what occurred. It is written by the engine and by
//! reviewers, and it is never an input to compilation or resolution.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governance_canon::InvariantId;
use governance_primitives::TraceId;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AuditError, AuditResult};
use crate::sink::{append_json_line, open_append};
use crate::trace::DecisionTrace;

/// Where an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HarmSource {
    /// A live assistant interaction.
    SolaceInteraction,
    /// A stewarded-play session.
    StewardedPlay,
    /// A red-team exercise.
    RedTeamExercise,
    /// A report from outside the organisation.
    ExternalReport,
    /// A governance review, including trace audits.
    GovernanceReview,
}

/// Severity at time of observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HarmSeverity {
    /// Low.
    Low,
    /// Moderate.
    Moderate,
    /// High.
    High,
    /// Critical.
    Critical,
}

/// Category of failure or risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HarmCategory {
    /// A boundary weakened over time.
    BoundaryErosion,
    /// An action slipped past authority checks.
    AuthorityBypass,
    /// Confidence grew without new evidence.
    ConfidenceEscalation,
    /// Authority was laundered through delegation.
    DelegationLaundering,
    /// Telemetry was used against refusals.
    TelemetryMisuse,
    /// Institutional pressure bent a constraint.
    InstitutionalPressure,
    /// A user was harmed.
    UserHarm,
    /// Not yet categorised.
    Unknown,
}

/// Whether harm occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HarmClassification {
    /// An invariant was violated.
    ConfirmedViolation,
    /// A violation was narrowly avoided.
    NearMiss,
    /// A risk pattern is emerging.
    EmergentRisk,
}

/// One factual observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedHarmEntry {
    id: Uuid,
    observed_at: DateTime<Utc>,
    source: HarmSource,
    severity: HarmSeverity,
    category: HarmCategory,
    classification: HarmClassification,
    description: String,
    #[serde(default)]
    implicated_invariants: Vec<InvariantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes_for_future_invariant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<TraceId>,
}

impl ObservedHarmEntry {
    /// Creates an entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidEntry`] for a blank description.
    pub fn new(
        observed_at: DateTime<Utc>,
        source: HarmSource,
        severity: HarmSeverity,
        category: HarmCategory,
        classification: HarmClassification,
        description: impl Into<String>,
    ) -> AuditResult<Self> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(AuditError::InvalidEntry("description cannot be empty"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            observed_at,
            source,
            severity,
            category,
            classification,
            description,
            implicated_invariants: Vec::new(),
            notes_for_future_invariant: None,
            trace_id: None,
        })
    }

    /// Creates an entry anchored on a decision trace.
    ///
    /// The description records the trace's scope and outcome only.
    ///
    /// # Errors
    ///
    /// Mirrors [`ObservedHarmEntry::new`].
    pub fn from_trace(
        trace: &DecisionTrace,
        observed_at: DateTime<Utc>,
        severity: HarmSeverity,
        category: HarmCategory,
        classification: HarmClassification,
    ) -> AuditResult<Self> {
        let description = match trace.reason() {
            Some(reason) => format!(
                "{} on scope `{}` ({reason})",
                trace.outcome(),
                trace.scope()
            ),
            None => format!("{} on scope `{}`", trace.outcome(), trace.scope()),
        };
        let mut entry = Self::new(
            observed_at,
            HarmSource::GovernanceReview,
            severity,
            category,
            classification,
            description,
        )?;
        entry.trace_id = Some(trace.trace_id());
        Ok(entry)
    }

    /// Lists the implicated invariants.
    #[must_use]
    pub fn with_implicated_invariants<I>(mut self, invariants: I) -> Self
    where
        I: IntoIterator<Item = InvariantId>,
    {
        for invariant in invariants {
            if !self.implicated_invariants.contains(&invariant) {
                self.implicated_invariants.push(invariant);
            }
        }
        self
    }

    /// Attaches a note about a proposed future invariant. Notes never propose
    /// changes to existing invariants.
    #[must_use]
    pub fn with_future_invariant_note(mut self, note: impl Into<String>) -> Self {
        self.notes_for_future_invariant = Some(note.into());
        self
    }

    /// Returns the entry identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns when the harm was observed.
    #[must_use]
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Returns the source.
    #[must_use]
    pub fn source(&self) -> HarmSource {
        self.source
    }

    /// Returns the severity.
    #[must_use]
    pub fn severity(&self) -> HarmSeverity {
        self.severity
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> HarmCategory {
        self.category
    }

    /// Returns the classification.
    #[must_use]
    pub fn classification(&self) -> HarmClassification {
        self.classification
    }

    /// Returns the factual description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the implicated invariants.
    #[must_use]
    pub fn implicated_invariants(&self) -> &[InvariantId] {
        &self.implicated_invariants
    }

    /// Returns the future-invariant note.
    #[must_use]
    pub fn notes_for_future_invariant(&self) -> Option<&str> {
        self.notes_for_future_invariant.as_deref()
    }

    /// Returns the anchoring trace, if any.
    #[must_use]
    pub fn trace_id(&self) -> Option<TraceId> {
        self.trace_id
    }
}

/// Append-only store for observed harm.
#[async_trait]
pub trait HarmLedger: Send + Sync {
    /// Records an entry.
    async fn record(&self, entry: &ObservedHarmEntry) -> AuditResult<()>;
}

/// File-backed ledger writing newline-delimited JSON.
#[derive(Debug)]
pub struct FileHarmLedger {
    path: PathBuf,
    file: Mutex<fs::File>,
}

impl FileHarmLedger {
    /// Opens (or creates) the ledger file.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors encountered while preparing the file.
    pub async fn open(path: impl Into<PathBuf>) -> AuditResult<Self> {
        let path = path.into();
        let file = open_append(&path).await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Returns the ledger path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HarmLedger for FileHarmLedger {
    async fn record(&self, entry: &ObservedHarmEntry) -> AuditResult<()> {
        append_json_line(&self.file, entry).await
    }
}

/// In-process ledger.
#[derive(Debug, Default)]
pub struct InMemoryHarmLedger {
    entries: Mutex<Vec<ObservedHarmEntry>>,
}

impl InMemoryHarmLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every entry recorded so far.
    pub async fn snapshot(&self) -> Vec<ObservedHarmEntry> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl HarmLedger for InMemoryHarmLedger {
    async fn record(&self, entry: &ObservedHarmEntry) -> AuditResult<()> {
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forensics::read_harm_ledger;
    use crate::sink::tests::{blocked_trace, temp_path};
    use governance_canon::HarmLogUse;

    #[test]
    fn blank_descriptions_are_rejected() {
        let err = ObservedHarmEntry::new(
            Utc::now(),
            HarmSource::RedTeamExercise,
            HarmSeverity::Low,
            HarmCategory::Unknown,
            HarmClassification::NearMiss,
            "   ",
        )
        .unwrap_err();
        assert!(matches!(err, AuditError::InvalidEntry(_)));
    }

    #[test]
    fn entries_from_traces_reference_them() {
        let trace = blocked_trace("payment.send");
        let entry = ObservedHarmEntry::from_trace(
            &trace,
            Utc::now(),
            HarmSeverity::High,
            HarmCategory::AuthorityBypass,
            HarmClassification::NearMiss,
        )
        .unwrap()
        .with_implicated_invariants([
            InvariantId::AuthorityConservationAcrossAgents,
            InvariantId::AuthorityConservationAcrossAgents,
        ]);

        assert_eq!(entry.trace_id(), Some(trace.trace_id()));
        assert_eq!(entry.source(), HarmSource::GovernanceReview);
        assert_eq!(entry.implicated_invariants().len(), 1);
        assert!(entry.description().contains("BLOCK"));
        assert!(entry.description().contains("no_authority"));
    }

    #[tokio::test]
    async fn file_ledger_round_trips_through_forensic_reader() {
        let path = temp_path("harm-ledger");
        let ledger = FileHarmLedger::open(&path).await.unwrap();
        let entry = ObservedHarmEntry::new(
            Utc::now(),
            HarmSource::ExternalReport,
            HarmSeverity::Moderate,
            HarmCategory::DelegationLaundering,
            HarmClassification::EmergentRisk,
            "sub-agent retried a refused export",
        )
        .unwrap()
        .with_future_invariant_note("halts propagate to spawned agents");
        ledger.record(&entry).await.unwrap();

        let entries = read_harm_ledger(&path, HarmLogUse::ForensicRecord)
            .await
            .unwrap();
        assert_eq!(entries, vec![entry]);

        let err = read_harm_ledger(&path, HarmLogUse::PolicyTuning)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuditError::ProhibitedUse(HarmLogUse::PolicyTuning)
        ));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn labels_use_kebab_case() {
        let value = serde_json::to_value(HarmSource::SolaceInteraction).unwrap();
        assert_eq!(value, "solace-interaction");
        let value = serde_json::to_value(HarmClassification::ConfirmedViolation).unwrap();
        assert_eq!(value, "confirmed-violation");
    }
}
