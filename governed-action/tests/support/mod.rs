#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governed_action::GovernanceEngine;
use governed_action::audit::InMemoryAuditSink;
use governed_action::authority::{
    AuthorityConfidence, AuthorityContext, AuthorityInstance, AuthorityStatus,
    StaticAuthoritySource,
};
use governed_action::consent::{
    ConsentKey, ConsentRecord, ConsentRegistry, ConsentResult, InMemoryConsentRegistry,
};
use governed_action::policy::{ActionContext, DecisionTraceInput};
use governed_action::primitives::{ActorId, ConsentTier, UserId};

pub const AUTHORITY: &str = "USPTO";
pub const AUTHORITY_SCOPE: &str = "PATENTABILITY";
pub const MEDIUM_AUTHORITY_SCOPE: &str = "TRADEMARK";
pub const SCOPE: &str = "reminder.create";
pub const DOMAIN: &str = "memory";

pub fn user() -> UserId {
    UserId::new("user-7").unwrap()
}

pub fn instance() -> AuthorityInstance {
    AuthorityInstance::new(AUTHORITY, AUTHORITY_SCOPE, Utc::now())
}

pub fn medium_instance() -> AuthorityInstance {
    AuthorityInstance::new(AUTHORITY, MEDIUM_AUTHORITY_SCOPE, Utc::now())
}

pub fn authority_source(
    status: AuthorityStatus,
    confidence: AuthorityConfidence,
) -> Arc<StaticAuthoritySource> {
    Arc::new(StaticAuthoritySource::new().with_context(AuthorityContext::new(
        AUTHORITY,
        AUTHORITY_SCOPE,
        status,
        confidence,
        Utc::now(),
    )))
}

pub fn request(actor: ActorId) -> DecisionTraceInput {
    DecisionTraceInput::new(actor, user(), SCOPE, DOMAIN, ConsentTier::Execute, "create reminder")
        .with_context(ActionContext::new().with_reversible(true))
}

pub fn consent_key() -> ConsentKey {
    ConsentKey::new(user(), SCOPE, DOMAIN, ConsentTier::Execute)
}

pub async fn registry_with_consent(created_at: DateTime<Utc>) -> Arc<InMemoryConsentRegistry> {
    let registry = Arc::new(InMemoryConsentRegistry::new());
    registry
        .grant(ConsentRecord::granted(consent_key(), created_at))
        .await;
    registry
}

/// Engine with positive, high-confidence authority and granted consent.
pub async fn permissive_engine(sink: Arc<InMemoryAuditSink>) -> GovernanceEngine {
    GovernanceEngine::builder(
        authority_source(AuthorityStatus::Positive, AuthorityConfidence::High),
        registry_with_consent(Utc::now()).await,
    )
    .with_audit_sink(sink)
    .build()
    .unwrap()
}

/// Registry that never answers.
pub struct HangingRegistry;

#[async_trait]
impl ConsentRegistry for HangingRegistry {
    async fn find(&self, _key: &ConsentKey) -> ConsentResult<Vec<ConsentRecord>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}
