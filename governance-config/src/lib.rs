//! Configuration for the governance gate.
//!
//! A [`GovernanceConfig`] is read from a JSON document, adjusted by
//! `GOVERNANCE_*` environment variables, and validated before any engine is
//! built from it. Invalid values are rejected at load time rather than
//! discovered on the decision path.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ENV_PREFIX, apply_env_overrides, load, load_from_env, parse};
pub use schema::{AuthorityEndpointConfig, GovernanceConfig};
