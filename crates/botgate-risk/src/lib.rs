//! Botgate Risk - pattern-based risk classification.
//!
//! [`RiskClassifier`] maps a `(tool, operation)` pair to a [`RiskLevel`]
//! by evaluating an ordered list of regex rules against the key
//! `"{tool}.{operation}"`. The **first** matching rule wins - not the most
//! specific - so rule order is a load-bearing part of the contract.
//!
//! The classifier is pure and lock-free: build it once at startup, share
//! it behind an `Arc`, call it from any task.
//!
//! Telegram Bot API methods do not go through this classifier; they carry
//! a precomputed per-method risk from the static table in
//! `botgate-telegram`.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use botgate_core::RiskLevel;
use regex::Regex;

/// A single classification rule: pattern plus the level it assigns.
#[derive(Debug, Clone)]
pub struct RiskRule {
    /// Pattern evaluated against `"{tool}.{operation}"`.
    pattern: Regex,
    /// Level assigned when the pattern matches.
    level: RiskLevel,
}

impl RiskRule {
    /// Build a rule from a pattern string.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error for an invalid pattern.
    pub fn new(pattern: &str, level: RiskLevel) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            level,
        })
    }
}

/// Ordered-rule risk classifier.
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    rules: Vec<RiskRule>,
}

impl RiskClassifier {
    /// Build a classifier from an explicit rule list (first match wins).
    #[must_use]
    pub fn new(rules: Vec<RiskRule>) -> Self {
        Self { rules }
    }

    /// The standard rule set, in authoritative order:
    ///
    /// 1. destructive suffixes (ban/unban/promote/demote/delete/remove/
    ///    revoke) -> high
    /// 2. the approval namespace -> critical
    /// 3. the privacy namespace -> high
    /// 4. operations starting with `join` -> high
    /// 5. creation/membership suffixes (create/invite/import/export/
    ///    archive/unarchive) -> medium
    /// 6. mutation suffixes (update/edit/set/pin/unpin/forward/reply/
    ///    react) -> medium
    /// 7. media upload/download -> medium
    ///
    /// Earlier rules win: `approvals.revoke` classifies high via rule 1
    /// before the approval-namespace rule is consulted.
    ///
    /// # Panics
    ///
    /// Never panics; the built-in patterns are compile-tested.
    #[must_use]
    pub fn standard() -> Self {
        let table: &[(&str, RiskLevel)] = &[
            (
                r"(?i)(ban|unban|promote|demote|delete|remove|revoke)$",
                RiskLevel::High,
            ),
            (r"(?i)(?:^|\.)approvals?(?:\.|$)", RiskLevel::Critical),
            (r"(?i)(?:^|\.)privacy(?:\.|$)", RiskLevel::High),
            (r"(?i)(?:^|\.)join[^.]*$", RiskLevel::High),
            (
                r"(?i)(create|invite|import|export|archive|unarchive)$",
                RiskLevel::Medium,
            ),
            (
                r"(?i)(update|edit|set|pin|unpin|forward|reply|react)$",
                RiskLevel::Medium,
            ),
            (r"(?i)(upload|download)[^.]*$", RiskLevel::Medium),
        ];
        let rules = table
            .iter()
            .map(|(pattern, level)| {
                RiskRule::new(pattern, *level).expect("built-in risk pattern must compile")
            })
            .collect();
        Self { rules }
    }

    /// Classify a `(tool, operation)` pair.
    ///
    /// Returns the level of the first matching rule, `default_risk` when
    /// no rule matches and one was given, and [`RiskLevel::Low`] otherwise.
    #[must_use]
    pub fn classify(
        &self,
        tool: &str,
        operation: &str,
        default_risk: Option<RiskLevel>,
    ) -> RiskLevel {
        let key = format!("{tool}.{operation}");
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(&key))
            .map_or_else(|| default_risk.unwrap_or(RiskLevel::Low), |rule| rule.level)
    }
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::standard()
    }
}
