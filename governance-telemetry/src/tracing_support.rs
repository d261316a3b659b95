//! Structured tracing setup.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor a configured directive is present.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `configured`, which takes precedence over
/// [`DEFAULT_FILTER`].
///
/// # Errors
///
/// Fails when the directive does not parse or a global subscriber is already
/// installed.
pub fn init_tracing(configured: Option<&str>) -> Result<()> {
    let filter = build_filter(configured)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow!(err))
}

fn build_filter(configured: Option<&str>) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = configured.unwrap_or(DEFAULT_FILTER);
    EnvFilter::try_new(directive).map_err(|err| anyhow!("invalid log filter `{directive}`: {err}"))
}
