//! Loading configuration from files and the environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{AuthorityEndpointConfig, GovernanceConfig};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "GOVERNANCE_";

const CONFIG_PATH_VAR: &str = "GOVERNANCE_CONFIG";

/// Parses a JSON document without consulting the environment.
///
/// # Errors
///
/// Fails on malformed JSON, unknown fields, or values rejected by
/// [`GovernanceConfig::validate`].
pub fn parse(document: &str) -> Result<GovernanceConfig> {
    let config: GovernanceConfig =
        serde_json::from_str(document).context("failed to parse governance configuration")?;
    config
        .validate()
        .context("invalid governance configuration")?;
    Ok(config)
}

/// Loads the file at `path`, then applies `GOVERNANCE_*` overrides.
///
/// # Errors
///
/// Fails when the file cannot be read or parsed, when an override is
/// malformed, or when the result does not validate.
pub fn load(path: impl AsRef<Path>) -> Result<GovernanceConfig> {
    let path = path.as_ref();
    let document = fs::read_to_string(path)
        .with_context(|| format!("failed to read governance configuration {}", path.display()))?;
    let mut config: GovernanceConfig = serde_json::from_str(&document)
        .with_context(|| format!("failed to parse governance configuration {}", path.display()))?;
    apply_env_overrides(&mut config, |var| env::var(var).ok())
        .context("invalid governance environment override")?;
    config
        .validate()
        .with_context(|| format!("invalid governance configuration {}", path.display()))?;
    debug!(path = %path.display(), rules = config.rules.len(), "governance configuration loaded");
    Ok(config)
}

/// Loads from `GOVERNANCE_CONFIG` when set, otherwise starts from defaults,
/// then applies `GOVERNANCE_*` overrides.
///
/// # Errors
///
/// Mirrors [`load`].
pub fn load_from_env() -> Result<GovernanceConfig> {
    if let Ok(path) = env::var(CONFIG_PATH_VAR) {
        return load(path);
    }
    let mut config = GovernanceConfig::default();
    apply_env_overrides(&mut config, |var| env::var(var).ok())
        .context("invalid governance environment override")?;
    config
        .validate()
        .context("invalid governance configuration")?;
    Ok(config)
}

/// Applies overrides obtained through `lookup`.
///
/// Recognised variables: `GOVERNANCE_CONSENT_TIMEOUT_MS`,
/// `GOVERNANCE_AUTHORITY_TIMEOUT_MS`, `GOVERNANCE_AUDIT_TIMEOUT_MS`,
/// `GOVERNANCE_AUDIT_JOURNAL`, `GOVERNANCE_HARM_LEDGER`,
/// `GOVERNANCE_AUTHORITY_URL`, `GOVERNANCE_DEGRADED_SELECTOR` and
/// `GOVERNANCE_LOG`. Rules are only read from files.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnv`] for values that do not parse.
pub fn apply_env_overrides<F>(config: &mut GovernanceConfig, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |suffix: &str| {
        let name = format!("{ENV_PREFIX}{suffix}");
        lookup(&name).map(|value| (name, value))
    };

    if let Some((name, value)) = var("CONSENT_TIMEOUT_MS") {
        config.consent_timeout_ms = parse_value(&name, &value)?;
    }
    if let Some((name, value)) = var("AUTHORITY_TIMEOUT_MS") {
        config.authority_timeout_ms = parse_value(&name, &value)?;
    }
    if let Some((name, value)) = var("AUDIT_TIMEOUT_MS") {
        config.audit_timeout_ms = parse_value(&name, &value)?;
    }
    if let Some((_, value)) = var("AUDIT_JOURNAL") {
        config.audit_journal = Some(PathBuf::from(value));
    }
    if let Some((_, value)) = var("HARM_LEDGER") {
        config.harm_ledger = Some(PathBuf::from(value));
    }
    if let Some((_, value)) = var("AUTHORITY_URL") {
        match config.authority.as_mut() {
            Some(authority) => authority.base_url = value,
            None => config.authority = Some(AuthorityEndpointConfig::new(value)),
        }
    }
    if let Some((_, value)) = var("DEGRADED_SELECTOR") {
        config.degraded_selector = value;
    }
    if let Some((_, value)) = var("LOG") {
        config.log_filter = Some(value);
    }
    Ok(())
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: name.to_owned(),
        value: value.to_owned(),
    })
}
