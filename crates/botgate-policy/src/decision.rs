//! The output of a policy evaluation.

use crate::rule::ToolPermission;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The immutable result of evaluating a call against policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Whether the call may proceed.
    pub allow: bool,
    /// Human-readable reason, suitable for direct display to the caller.
    pub reason: String,
    /// The rule that decided, when one matched.
    pub matched_rule: Option<ToolPermission>,
}

impl PolicyDecision {
    /// An allowing decision.
    #[must_use]
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allow: true,
            reason: reason.into(),
            matched_rule: None,
        }
    }

    /// A denying decision.
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allow: false,
            reason: reason.into(),
            matched_rule: None,
        }
    }

    /// Attach the rule that produced this decision.
    #[must_use]
    pub fn with_rule(mut self, rule: ToolPermission) -> Self {
        self.matched_rule = Some(rule);
        self
    }
}

impl fmt::Display for PolicyDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.allow { "allow" } else { "deny" };
        write!(f, "{verdict}: {}", self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::PermissionEffect;
    use botgate_core::RiskLevel;

    #[test]
    fn test_display() {
        assert_eq!(
            PolicyDecision::deny("explicit deny rule matched").to_string(),
            "deny: explicit deny rule matched"
        );
    }

    #[test]
    fn test_with_rule() {
        let rule = ToolPermission::new(
            "telegram.bot.members",
            ["banChatMember".to_string()],
            RiskLevel::High,
            PermissionEffect::Allow,
        );
        let decision = PolicyDecision::allow("explicit allow rule matched").with_rule(rule.clone());
        assert_eq!(decision.matched_rule, Some(rule));
    }
}
