//! The canonical invariant lattice.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CanonError, CanonResult};

/// Version label stamped on every decision trace.
pub const CANON_VERSION: &str = "canon/v1";

/// Identifier of a canonical invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvariantId {
    /// Confidence and urgency are suppressed before boundary evaluation.
    PreCommitmentDampening,
    /// Refusal is never tuned or traded against performance objectives.
    RefusalOutsideOptimization,
    /// Refusal signals never feed learning, metrics, or incentives.
    PostRefusalNonInstrumentality,
    /// Authority halts propagate across agents without dilution.
    AuthorityConservationAcrossAgents,
}

impl InvariantId {
    /// Every invariant, in lattice order.
    pub const ALL: [Self; 4] = [
        Self::PreCommitmentDampening,
        Self::RefusalOutsideOptimization,
        Self::PostRefusalNonInstrumentality,
        Self::AuthorityConservationAcrossAgents,
    ];

    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreCommitmentDampening => "pre-commitment-dampening",
            Self::RefusalOutsideOptimization => "refusal-outside-optimization",
            Self::PostRefusalNonInstrumentality => "post-refusal-non-instrumentality",
            Self::AuthorityConservationAcrossAgents => "authority-conservation-across-agents",
        }
    }
}

impl fmt::Display for InvariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When an invariant applies relative to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemporalPhase {
    /// Before constraints are evaluated.
    PreDecision,
    /// While the verdict is formed.
    Decision,
    /// After the verdict is returned.
    PostDecision,
    /// Across every phase; closes bypass paths around the others.
    Structural,
}

/// Pressure an invariant protects against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThreatVector {
    /// Objectives that reward fewer refusals.
    OptimizationPressure,
    /// Accumulated confidence from earlier turns or calls.
    PersuasiveMomentum,
    /// Refusal data leaking into telemetry-driven decisions.
    TelemetryErosion,
    /// Routing an action through another agent to shed a halt.
    DelegationBypass,
    /// Slow institutional relaxation of boundaries.
    InstitutionalDrift,
}

/// One node of the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvariantNode {
    id: InvariantId,
    title: &'static str,
    phase: TemporalPhase,
    protects_against: &'static [ThreatVector],
    depends_on: &'static [InvariantId],
    enforces_authority_by: &'static str,
}

impl InvariantNode {
    /// Declares a node.
    #[must_use]
    pub const fn new(
        id: InvariantId,
        title: &'static str,
        phase: TemporalPhase,
        protects_against: &'static [ThreatVector],
        depends_on: &'static [InvariantId],
        enforces_authority_by: &'static str,
    ) -> Self {
        Self {
            id,
            title,
            phase,
            protects_against,
            depends_on,
            enforces_authority_by,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> InvariantId {
        self.id
    }

    /// Returns the human-readable title.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        self.title
    }

    /// Returns the temporal phase.
    #[must_use]
    pub const fn phase(&self) -> TemporalPhase {
        self.phase
    }

    /// Returns the threats the invariant protects against.
    #[must_use]
    pub const fn protects_against(&self) -> &'static [ThreatVector] {
        self.protects_against
    }

    /// Returns the invariants this one depends on.
    #[must_use]
    pub const fn depends_on(&self) -> &'static [InvariantId] {
        self.depends_on
    }

    /// Returns how the invariant enforces authority.
    #[must_use]
    pub const fn enforces_authority_by(&self) -> &'static str {
        self.enforces_authority_by
    }
}

const LATTICE: [InvariantNode; 4] = [
    InvariantNode::new(
        InvariantId::PreCommitmentDampening,
        "Pre-Commitment Dampening",
        TemporalPhase::PreDecision,
        &[
            ThreatVector::PersuasiveMomentum,
            ThreatVector::OptimizationPressure,
        ],
        &[],
        "Suppressing confidence, urgency, and inevitability prior to boundary evaluation.",
    ),
    InvariantNode::new(
        InvariantId::RefusalOutsideOptimization,
        "Refusal Must Remain Outside Optimization",
        TemporalPhase::Decision,
        &[
            ThreatVector::OptimizationPressure,
            ThreatVector::InstitutionalDrift,
        ],
        &[InvariantId::PreCommitmentDampening],
        "Preventing refusal from being negotiated, tuned, or traded against performance objectives.",
    ),
    InvariantNode::new(
        InvariantId::PostRefusalNonInstrumentality,
        "Post-Refusal Non-Instrumentality",
        TemporalPhase::PostDecision,
        &[
            ThreatVector::TelemetryErosion,
            ThreatVector::OptimizationPressure,
            ThreatVector::InstitutionalDrift,
        ],
        &[InvariantId::RefusalOutsideOptimization],
        "Blocking refusal signals from feeding learning, metrics, incentives, or improvement loops.",
    ),
    InvariantNode::new(
        InvariantId::AuthorityConservationAcrossAgents,
        "Authority Conservation Across Agents",
        TemporalPhase::Structural,
        &[
            ThreatVector::DelegationBypass,
            ThreatVector::PersuasiveMomentum,
            ThreatVector::InstitutionalDrift,
        ],
        &[
            InvariantId::PreCommitmentDampening,
            InvariantId::RefusalOutsideOptimization,
            InvariantId::PostRefusalNonInstrumentality,
        ],
        "Ensuring authority halts propagate across agents without dilution, reset, or laundering.",
    ),
];

/// Versioned, declarative set of invariants.
///
/// The set is data. Nothing in the decision path evaluates it; it names what
/// the engine's structure guarantees and is stamped onto traces by version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalInvariantSet {
    version: &'static str,
    nodes: Vec<InvariantNode>,
}

impl CanonicalInvariantSet {
    /// Returns the canonical `canon/v1` set.
    #[must_use]
    pub fn canonical() -> Self {
        Self {
            version: CANON_VERSION,
            nodes: LATTICE.to_vec(),
        }
    }

    /// Builds a set from explicit nodes. Mostly useful to exercise
    /// [`CanonicalInvariantSet::verify`].
    #[must_use]
    pub fn from_nodes(version: &'static str, nodes: Vec<InvariantNode>) -> Self {
        Self { version, nodes }
    }

    /// Returns the version label.
    #[must_use]
    pub fn version(&self) -> &'static str {
        self.version
    }

    /// Returns the nodes in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[InvariantNode] {
        &self.nodes
    }

    /// Looks up a node.
    #[must_use]
    pub fn get(&self, id: InvariantId) -> Option<&InvariantNode> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    /// Checks the lattice: every invariant declared once, every dependency
    /// declared, and no dependency cycles.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found.
    pub fn verify(&self) -> CanonResult<()> {
        let mut by_id = BTreeMap::new();
        for node in &self.nodes {
            if by_id.insert(node.id(), node).is_some() {
                return Err(CanonError::DuplicateInvariant(node.id()));
            }
        }
        for node in &self.nodes {
            for dependency in node.depends_on() {
                if !by_id.contains_key(dependency) {
                    return Err(CanonError::UnknownDependency {
                        node: node.id(),
                        dependency: *dependency,
                    });
                }
            }
        }
        for id in InvariantId::ALL {
            if !by_id.contains_key(&id) {
                return Err(CanonError::MissingInvariant(id));
            }
        }

        let mut done = BTreeSet::new();
        for node in &self.nodes {
            let mut path = BTreeSet::new();
            visit(node.id(), &by_id, &mut path, &mut done)?;
        }
        Ok(())
    }
}

impl Default for CanonicalInvariantSet {
    fn default() -> Self {
        Self::canonical()
    }
}

fn visit(
    id: InvariantId,
    by_id: &BTreeMap<InvariantId, &InvariantNode>,
    path: &mut BTreeSet<InvariantId>,
    done: &mut BTreeSet<InvariantId>,
) -> CanonResult<()> {
    if done.contains(&id) {
        return Ok(());
    }
    if !path.insert(id) {
        return Err(CanonError::Cycle(id));
    }
    if let Some(node) = by_id.get(&id) {
        for dependency in node.depends_on() {
            visit(*dependency, by_id, path, done)?;
        }
    }
    path.remove(&id);
    done.insert(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_lattice_verifies() {
        let canon = CanonicalInvariantSet::canonical();
        assert_eq!(canon.version(), "canon/v1");
        assert_eq!(canon.nodes().len(), 4);
        canon.verify().unwrap();
    }

    #[test]
    fn phases_and_dependencies_match_lattice() {
        let canon = CanonicalInvariantSet::canonical();
        let conservation = canon
            .get(InvariantId::AuthorityConservationAcrossAgents)
            .unwrap();
        assert_eq!(conservation.phase(), TemporalPhase::Structural);
        assert_eq!(conservation.depends_on().len(), 3);
        assert!(
            conservation
                .protects_against()
                .contains(&ThreatVector::DelegationBypass)
        );

        let dampening = canon.get(InvariantId::PreCommitmentDampening).unwrap();
        assert_eq!(dampening.phase(), TemporalPhase::PreDecision);
        assert!(dampening.depends_on().is_empty());
    }

    #[test]
    fn missing_invariants_are_reported() {
        let set = CanonicalInvariantSet::from_nodes("test", LATTICE[..3].to_vec());
        assert_eq!(
            set.verify(),
            Err(CanonError::MissingInvariant(
                InvariantId::AuthorityConservationAcrossAgents
            ))
        );
    }

    #[test]
    fn dangling_dependencies_are_reported() {
        let set = CanonicalInvariantSet::from_nodes("test", LATTICE[1..].to_vec());
        assert_eq!(
            set.verify(),
            Err(CanonError::UnknownDependency {
                node: InvariantId::RefusalOutsideOptimization,
                dependency: InvariantId::PreCommitmentDampening,
            })
        );
    }

    #[test]
    fn cycles_are_reported() {
        let mut nodes = LATTICE.to_vec();
        nodes[0] = InvariantNode::new(
            InvariantId::PreCommitmentDampening,
            "looped",
            TemporalPhase::PreDecision,
            &[],
            &[InvariantId::PostRefusalNonInstrumentality],
            "",
        );
        let set = CanonicalInvariantSet::from_nodes("test", nodes);
        assert!(matches!(set.verify(), Err(CanonError::Cycle(_))));
    }

    #[test]
    fn duplicates_are_reported() {
        let mut nodes = LATTICE.to_vec();
        nodes.push(LATTICE[0]);
        let set = CanonicalInvariantSet::from_nodes("test", nodes);
        assert_eq!(
            set.verify(),
            Err(CanonError::DuplicateInvariant(
                InvariantId::PreCommitmentDampening
            ))
        );
    }

    #[test]
    fn ids_use_kebab_case() {
        let value = serde_json::to_value(InvariantId::PostRefusalNonInstrumentality).unwrap();
        assert_eq!(value, "post-refusal-non-instrumentality");
        for id in InvariantId::ALL {
            assert_eq!(serde_json::to_value(id).unwrap(), id.as_str());
        }
    }
}
