//! Risk classification levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity classification of a tool operation.
///
/// The order is total: `Low < Medium < High < Critical`. The policy engine
/// uses it for role floors, the approval service for deciding whether a
/// just-in-time token is required.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Read-only or otherwise harmless operations.
    Low,
    /// Operations that mutate state but are easy to reverse.
    Medium,
    /// Destructive or privacy-affecting operations.
    High,
    /// Operations on the approval machinery itself, or equivalently grave.
    Critical,
}

impl RiskLevel {
    /// All levels, ascending.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Stable string form (matches the serde representation).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
