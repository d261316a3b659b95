//! Usage rules for the observed-harm log and the capture threat surface.
//!
//! Harm entries document what occurred. They may justify a new invariant but
//! never feed tuning, scoring, or trend analysis.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Purposes a reader of the observed-harm log may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmLogUse {
    /// Keeping a forensic record of an incident.
    ForensicRecord,
    /// Disclosure to a regulator.
    RegulatoryDisclosure,
    /// Documenting a red-team exercise.
    RedTeamDocumentation,
    /// Justifying a new invariant. Existing invariants are never weakened.
    JustificationForNewInvariantOnly,
    /// Training models.
    ModelTraining,
    /// Tuning policy.
    PolicyTuning,
    /// Adjusting thresholds.
    ThresholdAdjustment,
    /// Performance metrics.
    PerformanceMetrics,
    /// Governance KPIs.
    GovernanceKpis,
    /// Analysing refusal rates.
    RefusalRateAnalysis,
    /// Calibrating confidence levels.
    ConfidenceCalibration,
}

impl HarmLogUse {
    /// Returns true for permitted uses.
    #[must_use]
    pub const fn is_permitted(self) -> bool {
        matches!(
            self,
            Self::ForensicRecord
                | Self::RegulatoryDisclosure
                | Self::RedTeamDocumentation
                | Self::JustificationForNewInvariantOnly
        )
    }

    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForensicRecord => "forensic_record",
            Self::RegulatoryDisclosure => "regulatory_disclosure",
            Self::RedTeamDocumentation => "red_team_documentation",
            Self::JustificationForNewInvariantOnly => "justification_for_new_invariant_only",
            Self::ModelTraining => "model_training",
            Self::PolicyTuning => "policy_tuning",
            Self::ThresholdAdjustment => "threshold_adjustment",
            Self::PerformanceMetrics => "performance_metrics",
            Self::GovernanceKpis => "governance_kpis",
            Self::RefusalRateAnalysis => "refusal_rate_analysis",
            Self::ConfidenceCalibration => "confidence_calibration",
        }
    }
}

impl fmt::Display for HarmLogUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uses permitted for the observed-harm log.
pub const PERMITTED_HARM_LOG_USES: [HarmLogUse; 4] = [
    HarmLogUse::ForensicRecord,
    HarmLogUse::RegulatoryDisclosure,
    HarmLogUse::RedTeamDocumentation,
    HarmLogUse::JustificationForNewInvariantOnly,
];

/// Uses prohibited for the observed-harm log.
pub const PROHIBITED_HARM_LOG_USES: [HarmLogUse; 7] = [
    HarmLogUse::ModelTraining,
    HarmLogUse::PolicyTuning,
    HarmLogUse::ThresholdAdjustment,
    HarmLogUse::PerformanceMetrics,
    HarmLogUse::GovernanceKpis,
    HarmLogUse::RefusalRateAnalysis,
    HarmLogUse::ConfidenceCalibration,
];

/// Purposes the regime-capture patterns may be cited for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureUse {
    /// Threat modelling.
    ThreatModeling,
    /// Justifying an invariant.
    InvariantJustification,
    /// Framing an audit.
    AuditFraming,
    /// Disclosing institutional risk.
    InstitutionalRiskDisclosure,
    /// Excusing weak performance.
    PerformanceExcuses,
    /// Business justification for relaxation.
    BusinessJustification,
    /// Temporary overrides.
    TemporaryOverrides,
    /// Contextual exceptions.
    ContextualExceptions,
}

impl CaptureUse {
    /// Returns true for permitted uses.
    #[must_use]
    pub const fn is_permitted(self) -> bool {
        matches!(
            self,
            Self::ThreatModeling
                | Self::InvariantJustification
                | Self::AuditFraming
                | Self::InstitutionalRiskDisclosure
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permitted_and_prohibited_lists_partition_uses() {
        assert!(PERMITTED_HARM_LOG_USES.iter().all(|u| u.is_permitted()));
        assert!(PROHIBITED_HARM_LOG_USES.iter().all(|u| !u.is_permitted()));
        assert!(!HarmLogUse::RefusalRateAnalysis.is_permitted());
    }

    #[test]
    fn capture_patterns_cannot_excuse_overrides() {
        assert!(CaptureUse::ThreatModeling.is_permitted());
        assert!(!CaptureUse::TemporaryOverrides.is_permitted());
        assert!(!CaptureUse::BusinessJustification.is_permitted());
    }

    #[test]
    fn wire_labels_match_serde() {
        for usage in PERMITTED_HARM_LOG_USES.iter().chain(&PROHIBITED_HARM_LOG_USES) {
            assert_eq!(serde_json::to_value(usage).unwrap(), usage.as_str());
        }
    }
}
