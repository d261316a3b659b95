//! The governance engine.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use governance_audit::{
    AuditError, AuditResult, AuditSink, DecisionTrace, FileAuditJournal, FileHarmLedger,
    HarmLedger, ObservedHarmEntry,
};
use governance_authority::{
    AuthorityInstance, AuthorityResolver, AuthoritySource, HttpAuthorityConfig,
    HttpAuthoritySource,
};
use governance_canon::CanonicalInvariantSet;
use governance_config::GovernanceConfig;
use governance_consent::{ConsentGate, ConsentReason, ConsentRegistry};
use governance_policy::{
    ConstraintCompiler, DecisionTraceInput, ExecutionGate, ExecutionMode, GovernedActionResult,
};
use governance_telemetry::{AnomalyCounters, AnomalyKind};
use tokio::time::timeout;
use tracing::{debug, error};

use crate::error::{KernelError, KernelResult};
use crate::observer::DecisionObserver;

const DEFAULT_AUDIT_TIMEOUT: Duration = Duration::from_secs(1);

/// Mandatory gate for consequence-bearing actions.
///
/// The engine keeps no per-call state: every input to a decision arrives as an
/// argument or comes from the authority source and consent registry at call
/// time. The compiler's rule set is fixed when the engine is built.
#[derive(Clone)]
pub struct GovernanceEngine {
    resolver: AuthorityResolver,
    consent: ConsentGate,
    compiler: ConstraintCompiler,
    gate: ExecutionGate,
    audit: Arc<dyn AuditSink>,
    audit_timeout: Duration,
    harm: Option<Arc<dyn HarmLedger>>,
    observer: Option<Arc<dyn DecisionObserver>>,
    anomalies: Arc<AnomalyCounters>,
    canon_version: &'static str,
}

impl fmt::Debug for GovernanceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GovernanceEngine")
            .field("resolver", &self.resolver)
            .field("consent", &self.consent)
            .field("rules", &self.compiler.rules().len())
            .field("audit_timeout", &self.audit_timeout)
            .field("harm_ledger_configured", &self.harm.is_some())
            .field("observer_configured", &self.observer.is_some())
            .field("canon_version", &self.canon_version)
            .finish_non_exhaustive()
    }
}

impl GovernanceEngine {
    /// Starts building an engine over the supplied authority source and
    /// consent registry.
    #[must_use]
    pub fn builder(
        source: Arc<dyn AuthoritySource>,
        registry: Arc<dyn ConsentRegistry>,
    ) -> GovernanceEngineBuilder {
        GovernanceEngineBuilder::new(source, registry)
    }

    /// Returns the constraint compiler in force.
    #[must_use]
    pub fn compiler(&self) -> &ConstraintCompiler {
        &self.compiler
    }

    /// Returns the shared anomaly counters.
    #[must_use]
    pub fn anomalies(&self) -> &Arc<AnomalyCounters> {
        &self.anomalies
    }

    /// Returns the canon version stamped on every trace.
    #[must_use]
    pub fn canon_version(&self) -> &'static str {
        self.canon_version
    }

    /// Runs `effect` under governance.
    ///
    /// Authority resolution and the consent check run concurrently against a
    /// single clock reading. The compiled constraints decide whether `effect`
    /// runs at all; when it does, it runs once and receives the
    /// [`ExecutionMode`] it is permitted. One decision trace is appended
    /// before returning, whatever the outcome. A failed append is logged and
    /// counted but never changes the returned value.
    ///
    /// # Errors
    ///
    /// Returns the effect's own error unchanged. `BLOCK` and `ESCALATE` are
    /// successful results, not errors.
    pub async fn governed_action<T, E, F, Fut>(
        &self,
        input: &DecisionTraceInput,
        authority: Option<&AuthorityInstance>,
        effect: F,
    ) -> Result<GovernedActionResult<T>, E>
    where
        F: FnOnce(ExecutionMode) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let started_at = Utc::now();
        let query = input.consent_query();
        let (resolved, consent) = tokio::join!(
            self.resolver.resolve(authority, started_at),
            self.consent.check(&query, started_at),
        );

        if consent.reason() == Some(ConsentReason::ConsentQueryFailed) {
            self.anomalies.record(AnomalyKind::ConsentQueryFailed);
        }
        if AuthorityResolver::is_lookup_failure(resolved.context()) {
            self.anomalies.record(AnomalyKind::AuthorityLookupFailed);
        }

        let constraints = self.compiler.compile(input, &resolved, &consent);
        let outcome = self
            .gate
            .execute(input, &constraints, &resolved, effect)
            .await;

        let builder = DecisionTrace::builder(input, resolved, consent, constraints)
            .canon_version(self.canon_version)
            .started_at(started_at);
        let finished_at = Utc::now();
        let trace = match &outcome {
            Ok(result) => builder.finish(result, finished_at),
            Err(err) => builder.finish_failed(err.to_string(), finished_at),
        };

        self.persist(&trace).await;
        if let Some(observer) = &self.observer {
            observer.on_decision(&trace);
        }
        outcome
    }

    /// Appends an observed-harm entry to the configured ledger.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Unavailable`] when no ledger is configured or the
    /// write times out, and the ledger's own error otherwise. Failures are
    /// counted as [`AnomalyKind::HarmWriteFailed`].
    pub async fn record_harm(&self, entry: &ObservedHarmEntry) -> AuditResult<()> {
        let Some(ledger) = &self.harm else {
            return Err(AuditError::unavailable("no harm ledger configured"));
        };
        let result = match timeout(self.audit_timeout, ledger.record(entry)).await {
            Ok(result) => result,
            Err(_) => Err(AuditError::unavailable("harm ledger write timed out")),
        };
        if let Err(err) = &result {
            error!(entry_id = %entry.id(), error = %err, "failed to record observed harm");
            self.anomalies.record(AnomalyKind::HarmWriteFailed);
        }
        result
    }

    async fn persist(&self, trace: &DecisionTrace) {
        match timeout(self.audit_timeout, self.audit.append(trace)).await {
            Ok(Ok(())) => {
                debug!(trace_id = %trace.trace_id(), "decision trace persisted");
            }
            Ok(Err(err)) => {
                error!(
                    trace_id = %trace.trace_id(),
                    outcome = %trace.outcome(),
                    error = %err,
                    "failed to persist decision trace"
                );
                self.anomalies.record(AnomalyKind::AuditWriteFailed);
            }
            Err(_) => {
                error!(
                    trace_id = %trace.trace_id(),
                    outcome = %trace.outcome(),
                    timeout_ms = u64::try_from(self.audit_timeout.as_millis()).unwrap_or(u64::MAX),
                    "decision trace write timed out"
                );
                self.anomalies.record(AnomalyKind::AuditWriteFailed);
            }
        }
    }
}

/// Builder for [`GovernanceEngine`].
pub struct GovernanceEngineBuilder {
    source: Arc<dyn AuthoritySource>,
    registry: Arc<dyn ConsentRegistry>,
    compiler: ConstraintCompiler,
    audit: Option<Arc<dyn AuditSink>>,
    harm: Option<Arc<dyn HarmLedger>>,
    observer: Option<Arc<dyn DecisionObserver>>,
    anomalies: Option<Arc<AnomalyCounters>>,
    consent_timeout: Option<Duration>,
    authority_timeout: Option<Duration>,
    audit_timeout: Duration,
}

impl fmt::Debug for GovernanceEngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GovernanceEngineBuilder")
            .field("rules", &self.compiler.rules().len())
            .field("audit_configured", &self.audit.is_some())
            .field("audit_timeout", &self.audit_timeout)
            .finish_non_exhaustive()
    }
}

impl GovernanceEngineBuilder {
    fn new(source: Arc<dyn AuthoritySource>, registry: Arc<dyn ConsentRegistry>) -> Self {
        Self {
            source,
            registry,
            compiler: ConstraintCompiler::new(),
            audit: None,
            harm: None,
            observer: None,
            anomalies: None,
            consent_timeout: None,
            authority_timeout: None,
            audit_timeout: DEFAULT_AUDIT_TIMEOUT,
        }
    }

    /// Prepares a builder from configuration.
    ///
    /// When the configuration names an authority endpoint, an HTTPS source is
    /// built from it and `source` must be `None`; otherwise `source` is
    /// required. File-backed journals are opened here; without
    /// `audit_journal` the caller must add a sink before building.
    ///
    /// # Errors
    ///
    /// Fails when the configuration does not validate, the authority source
    /// cannot be determined or built, or a journal cannot be opened.
    pub async fn from_config(
        config: &GovernanceConfig,
        source: Option<Arc<dyn AuthoritySource>>,
        registry: Arc<dyn ConsentRegistry>,
    ) -> KernelResult<Self> {
        config.validate()?;
        let source = match (&config.authority, source) {
            (Some(endpoint), None) => {
                let mut http = HttpAuthorityConfig::new()
                    .with_base_url(&endpoint.base_url)?
                    .with_timeout(endpoint.request_timeout());
                if let Ok(key) = std::env::var(&endpoint.api_key_env) {
                    http = http.with_api_key(key);
                }
                Arc::new(HttpAuthoritySource::new(http)?) as Arc<dyn AuthoritySource>
            }
            (None, Some(source)) => source,
            (Some(_), Some(_)) => return Err(KernelError::ConflictingAuthoritySource),
            (None, None) => return Err(KernelError::MissingAuthoritySource),
        };

        let mut builder = Self::new(source, registry)
            .with_compiler(config.compiler()?)
            .with_consent_timeout(config.consent_timeout())
            .with_authority_timeout(config.authority_timeout())
            .with_audit_timeout(config.audit_timeout());
        if let Some(path) = &config.audit_journal {
            builder = builder.with_audit_sink(Arc::new(FileAuditJournal::open(path).await?));
        }
        if let Some(path) = &config.harm_ledger {
            builder = builder.with_harm_ledger(Arc::new(FileHarmLedger::open(path).await?));
        }
        Ok(builder)
    }

    /// Sets the constraint compiler.
    #[must_use]
    pub fn with_compiler(mut self, compiler: ConstraintCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Sets the decision trace sink. Required.
    #[must_use]
    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Sets the observed-harm ledger.
    #[must_use]
    pub fn with_harm_ledger(mut self, harm: Arc<dyn HarmLedger>) -> Self {
        self.harm = Some(harm);
        self
    }

    /// Installs a decision observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DecisionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Shares anomaly counters with other components.
    #[must_use]
    pub fn with_anomaly_counters(mut self, anomalies: Arc<AnomalyCounters>) -> Self {
        self.anomalies = Some(anomalies);
        self
    }

    /// Bounds each consent registry query.
    #[must_use]
    pub fn with_consent_timeout(mut self, consent_timeout: Duration) -> Self {
        self.consent_timeout = Some(consent_timeout);
        self
    }

    /// Bounds each authority lookup.
    #[must_use]
    pub fn with_authority_timeout(mut self, authority_timeout: Duration) -> Self {
        self.authority_timeout = Some(authority_timeout);
        self
    }

    /// Bounds each audit and harm-ledger write.
    #[must_use]
    pub fn with_audit_timeout(mut self, audit_timeout: Duration) -> Self {
        self.audit_timeout = audit_timeout;
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::MissingAuditSink`] when no sink was set and
    /// [`KernelError::Canon`] if the canonical invariant lattice does not
    /// verify.
    pub fn build(self) -> KernelResult<GovernanceEngine> {
        let audit = self.audit.ok_or(KernelError::MissingAuditSink)?;
        let canon = CanonicalInvariantSet::canonical();
        canon.verify()?;

        let mut resolver = AuthorityResolver::new(self.source);
        if let Some(lookup_timeout) = self.authority_timeout {
            resolver = resolver.with_timeout(lookup_timeout);
        }
        let mut consent = ConsentGate::new(self.registry);
        if let Some(query_timeout) = self.consent_timeout {
            consent = consent.with_timeout(query_timeout);
        }

        Ok(GovernanceEngine {
            resolver,
            consent,
            compiler: self.compiler,
            gate: ExecutionGate::new(),
            audit,
            audit_timeout: self.audit_timeout,
            harm: self.harm,
            observer: self.observer,
            anomalies: self.anomalies.unwrap_or_default(),
            canon_version: canon.version(),
        })
    }
}
