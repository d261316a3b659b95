use governance_policy::PolicyError;
use thiserror::Error;

/// Validation failures for a loaded configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A timeout was configured as zero.
    #[error("`{0}` must be greater than zero")]
    ZeroTimeout(&'static str),
    /// A path setting was blank.
    #[error("`{0}` cannot be empty")]
    EmptyPath(&'static str),
    /// An environment override could not be parsed.
    #[error("environment variable `{var}` has invalid value `{value}`")]
    InvalidEnv {
        /// Variable name.
        var: String,
        /// Offending value.
        value: String,
    },
    /// The authority endpoint is incomplete.
    #[error("authority endpoint: {0}")]
    AuthorityEndpoint(&'static str),
    /// The rule list or degraded selector was rejected by the compiler.
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Result alias for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigError>;
