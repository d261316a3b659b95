//! Consent tiers.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// How far a user has authorised the system to act within a scope.
///
/// Tiers are ordered `observe < acknowledge < suggest < prepare < execute`.
/// Consent lookups match a tier exactly; the ordering is only used by rule
/// matchers that apply to "this tier or above".
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentTier {
    /// Passive observation only.
    Observe,
    /// Surface information the user must acknowledge.
    Acknowledge,
    /// Offer suggestions.
    Suggest,
    /// Prepare drafts or staged changes without committing them.
    Prepare,
    /// Act on the user's behalf.
    Execute,
}

impl ConsentTier {
    /// All tiers in ascending order.
    pub const ALL: [Self; 5] = [
        Self::Observe,
        Self::Acknowledge,
        Self::Suggest,
        Self::Prepare,
        Self::Execute,
    ];

    /// Returns the wire label of the tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Observe => "observe",
            Self::Acknowledge => "acknowledge",
            Self::Suggest => "suggest",
            Self::Prepare => "prepare",
            Self::Execute => "execute",
        }
    }
}

impl Display for ConsentTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsentTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| Error::UnknownTier(s.to_owned()))
    }
}
