use governance_audit::AuditError;
use governance_authority::AuthorityError;
use governance_canon::CanonError;
use governance_config::ConfigError;
use thiserror::Error;

/// Errors raised while assembling an engine. Governed actions themselves
/// never fail with these.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The canonical invariant lattice did not verify.
    #[error("canonical invariants failed verification: {0}")]
    Canon(#[from] CanonError),
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The authority source could not be built.
    #[error(transparent)]
    Authority(#[from] AuthorityError),
    /// An audit journal or harm ledger could not be opened.
    #[error(transparent)]
    Audit(#[from] AuditError),
    /// No authority source was supplied or configured.
    #[error("no authority source configured")]
    MissingAuthoritySource,
    /// No decision trace sink was supplied or configured.
    #[error("no audit sink configured: set audit_journal or supply a sink")]
    MissingAuditSink,
    /// Both an explicit source and a configured endpoint were supplied.
    #[error("authority source supplied twice: pass a source or configure an endpoint")]
    ConflictingAuthoritySource,
}

/// Result alias for engine assembly.
pub type KernelResult<T> = Result<T, KernelError>;
