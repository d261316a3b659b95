//! Regime-capture threat surface.
//!
//! Regime capture is the erosion of authority-bearing constraints by
//! institutional incentives without any explicit policy violation. The
//! patterns below name that surface. They are not mitigations.

use serde::{Deserialize, Serialize};

use crate::invariants::InvariantId;

/// Channel through which institutional pressure erodes constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureVector {
    /// Metrics stand in for boundaries.
    MetricSubstitution,
    /// Governance work is cut for cost.
    BudgetaryPressure,
    /// Incentives reward throughput over restraint.
    PerformanceIncentives,
    /// Governance language serves external signalling.
    ReputationalManagement,
    /// Shipping speed justifies relaxation.
    VelocityOptimization,
    /// Governance functions lose funding.
    GovernanceDefunding,
    /// Refusal is recast as preference.
    AuthorityReframing,
    /// Controls exist on paper only.
    ComplianceTheater,
}

/// A named capture pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegimeCapturePattern {
    id: &'static str,
    vector: CaptureVector,
    description: &'static str,
    erosion_mechanism: &'static str,
    affected_invariants: &'static [InvariantId],
}

impl RegimeCapturePattern {
    /// Returns the pattern identifier.
    #[must_use]
    pub const fn id(&self) -> &'static str {
        self.id
    }

    /// Returns the capture vector.
    #[must_use]
    pub const fn vector(&self) -> CaptureVector {
        self.vector
    }

    /// Returns what the pattern looks like.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// Returns how the pattern erodes authority.
    #[must_use]
    pub const fn erosion_mechanism(&self) -> &'static str {
        self.erosion_mechanism
    }

    /// Returns the invariants the pattern targets.
    #[must_use]
    pub const fn affected_invariants(&self) -> &'static [InvariantId] {
        self.affected_invariants
    }
}

/// Canonical capture patterns.
pub static REGIME_CAPTURE_PATTERNS: [RegimeCapturePattern; 5] = [
    RegimeCapturePattern {
        id: "soft-refusal-drift",
        vector: CaptureVector::MetricSubstitution,
        description: "Refusal is reframed as over-conservatism or friction through the introduction of performance metrics.",
        erosion_mechanism: "Authority is treated as a tunable parameter rather than a boundary.",
        affected_invariants: &[
            InvariantId::RefusalOutsideOptimization,
            InvariantId::PostRefusalNonInstrumentality,
        ],
    },
    RegimeCapturePattern {
        id: "governance-as-cost-center",
        vector: CaptureVector::BudgetaryPressure,
        description: "Safety, red-teaming, or governance functions are defunded or deprioritized under efficiency mandates.",
        erosion_mechanism: "Constraint enforcement weakens without formal policy change.",
        affected_invariants: &[
            InvariantId::AuthorityConservationAcrossAgents,
            InvariantId::PostRefusalNonInstrumentality,
        ],
    },
    RegimeCapturePattern {
        id: "reputation-buffering",
        vector: CaptureVector::ReputationalManagement,
        description: "Responsible AI language is used primarily for external signaling rather than internal constraint enforcement.",
        erosion_mechanism: "Governance artifacts become performative rather than binding.",
        affected_invariants: &[InvariantId::RefusalOutsideOptimization],
    },
    RegimeCapturePattern {
        id: "velocity-overrides-authority",
        vector: CaptureVector::VelocityOptimization,
        description: "Deployment speed and competitive pressure justify incremental boundary relaxation.",
        erosion_mechanism: "Temporary exceptions accumulate into permanent drift.",
        affected_invariants: &[
            InvariantId::PreCommitmentDampening,
            InvariantId::RefusalOutsideOptimization,
        ],
    },
    RegimeCapturePattern {
        id: "authority-recast-as-opinion",
        vector: CaptureVector::AuthorityReframing,
        description: "Refusal is reframed as model preference or advisory guidance rather than enforced halt.",
        erosion_mechanism: "Authority loses its binary character.",
        affected_invariants: &[InvariantId::AuthorityConservationAcrossAgents],
    },
];

/// Looks up a capture pattern by identifier.
#[must_use]
pub fn capture_pattern(id: &str) -> Option<&'static RegimeCapturePattern> {
    REGIME_CAPTURE_PATTERNS.iter().find(|pattern| pattern.id == id)
}

/// Returns the patterns that target `invariant`.
pub fn patterns_targeting(
    invariant: InvariantId,
) -> impl Iterator<Item = &'static RegimeCapturePattern> {
    REGIME_CAPTURE_PATTERNS
        .iter()
        .filter(move |pattern| pattern.affected_invariants.contains(&invariant))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_invariant_is_named_by_some_pattern() {
        for invariant in InvariantId::ALL {
            assert!(
                patterns_targeting(invariant).next().is_some(),
                "{invariant} has no capture pattern"
            );
        }
    }

    #[test]
    fn lookup_by_id() {
        let pattern = capture_pattern("authority-recast-as-opinion").unwrap();
        assert_eq!(pattern.vector(), CaptureVector::AuthorityReframing);
        assert!(capture_pattern("unknown").is_none());
    }
}
