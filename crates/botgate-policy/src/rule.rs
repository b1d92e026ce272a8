//! Permission rules loaded from policy storage.

use botgate_core::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The operation wildcard accepted in a rule's operation set.
pub const OPERATION_WILDCARD: &str = "*";

/// Whether a matched rule allows or denies the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionEffect {
    /// The call proceeds.
    Allow,
    /// The call is rejected.
    Deny,
}

impl fmt::Display for PermissionEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
        }
    }
}

/// A configured allow/deny rule for a tool and set of operations.
///
/// Rules are held as an ordered list; the first structural match wins, so
/// list order is part of the policy, not an implementation detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPermission {
    /// Tool name the rule applies to (exact match).
    pub tool: String,
    /// Operations covered; may contain the `"*"` wildcard.
    pub operations: BTreeSet<String>,
    /// Risk level this rule was authored against (informational; the
    /// role floor is enforced before rules are consulted).
    pub risk_level: RiskLevel,
    /// Allow or deny.
    pub effect: PermissionEffect,
}

impl ToolPermission {
    /// Build a rule.
    #[must_use]
    pub fn new(
        tool: impl Into<String>,
        operations: impl IntoIterator<Item = String>,
        risk_level: RiskLevel,
        effect: PermissionEffect,
    ) -> Self {
        Self {
            tool: tool.into(),
            operations: operations.into_iter().collect(),
            risk_level,
            effect,
        }
    }

    /// Whether this rule structurally matches the given call.
    #[must_use]
    pub fn matches(&self, tool: &str, operation: &str) -> bool {
        self.tool == tool
            && (self.operations.contains(operation)
                || self.operations.contains(OPERATION_WILDCARD))
    }
}
