//! Strongly typed configuration schema.

use std::path::PathBuf;
use std::time::Duration;

use governance_policy::{ConstraintCompiler, DEFAULT_DEGRADED_SELECTOR, RuleSpec};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Top-level gate configuration.
///
/// Every field has a default, so an empty JSON object is a valid document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GovernanceConfig {
    /// Upper bound on one consent registry query, in milliseconds.
    pub consent_timeout_ms: u64,
    /// Upper bound on one authority source lookup, in milliseconds.
    pub authority_timeout_ms: u64,
    /// Upper bound on one audit or harm-ledger write, in milliseconds.
    pub audit_timeout_ms: u64,
    /// Decision trace journal. Absent keeps traces in memory.
    pub audit_journal: Option<PathBuf>,
    /// Observed-harm ledger. Absent keeps entries in memory.
    pub harm_ledger: Option<PathBuf>,
    /// Remote authority service. Absent means a static source supplied by the
    /// embedding application.
    pub authority: Option<AuthorityEndpointConfig>,
    /// Selector handed to effects under medium-confidence degradation.
    pub degraded_selector: String,
    /// `tracing` filter directive.
    pub log_filter: Option<String>,
    /// Additional restriction rules.
    pub rules: Vec<RuleSpec>,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            consent_timeout_ms: 2_000,
            authority_timeout_ms: 5_000,
            audit_timeout_ms: 1_000,
            audit_journal: None,
            harm_ledger: None,
            authority: None,
            degraded_selector: DEFAULT_DEGRADED_SELECTOR.to_owned(),
            log_filter: None,
            rules: Vec::new(),
        }
    }
}

impl GovernanceConfig {
    /// Consent query timeout.
    #[must_use]
    pub fn consent_timeout(&self) -> Duration {
        Duration::from_millis(self.consent_timeout_ms)
    }

    /// Authority lookup timeout.
    #[must_use]
    pub fn authority_timeout(&self) -> Duration {
        Duration::from_millis(self.authority_timeout_ms)
    }

    /// Audit write timeout.
    #[must_use]
    pub fn audit_timeout(&self) -> Duration {
        Duration::from_millis(self.audit_timeout_ms)
    }

    /// Builds the constraint compiler described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Policy`] for malformed or duplicate rules and a
    /// blank degraded selector.
    pub fn compiler(&self) -> ConfigResult<ConstraintCompiler> {
        Ok(ConstraintCompiler::from_specs(&self.rules)?
            .with_degraded_selector(self.degraded_selector.clone())?)
    }

    /// Checks every value that could otherwise fail later.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("consent_timeout_ms", self.consent_timeout_ms),
            ("authority_timeout_ms", self.authority_timeout_ms),
            ("audit_timeout_ms", self.audit_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroTimeout(name));
            }
        }
        for (name, path) in [
            ("audit_journal", &self.audit_journal),
            ("harm_ledger", &self.harm_ledger),
        ] {
            if path.as_ref().is_some_and(|path| path.as_os_str().is_empty()) {
                return Err(ConfigError::EmptyPath(name));
            }
        }
        if let Some(authority) = &self.authority {
            authority.validate()?;
        }
        self.compiler().map(|_| ())
    }
}

/// Remote authority service settings.
///
/// The API key itself never appears in configuration files; only the name of
/// the environment variable holding it does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorityEndpointConfig {
    /// Base URL of the service, without the `/v1/...` suffix.
    pub base_url: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Transport timeout for one request, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_api_key_env() -> String {
    "GOVERNANCE_AUTHORITY_API_KEY".to_owned()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl AuthorityEndpointConfig {
    /// Creates settings for `base_url` with default key variable and timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key_env: default_api_key_env(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    /// Transport timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn validate(&self) -> ConfigResult<()> {
        let base = self.base_url.trim();
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(ConfigError::AuthorityEndpoint("base_url must be http(s)"));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::AuthorityEndpoint("api_key_env cannot be empty"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("authority.request_timeout_ms"));
        }
        Ok(())
    }
}
