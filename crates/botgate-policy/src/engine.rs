//! The policy engine.

use botgate_core::{Principal, RiskLevel, Role};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use crate::decision::PolicyDecision;
use crate::rule::{PermissionEffect, ToolPermission};

/// Static configuration for the engine.
#[derive(Debug, Clone)]
pub struct PolicyEngineConfig {
    /// Name of the raw/unrestricted passthrough tool.
    pub raw_tool: String,
    /// Roles allowed to invoke the raw tool at all.
    pub raw_tool_roles: BTreeSet<Role>,
    /// Effect applied when no rule matches.
    pub default_effect: PermissionEffect,
}

impl Default for PolicyEngineConfig {
    /// Raw tool restricted to owner/admin; unmatched calls allowed (the
    /// risk/role floor has already been enforced by the time the rule
    /// list is consulted).
    fn default() -> Self {
        Self {
            raw_tool: "telegram.raw".to_string(),
            raw_tool_roles: [Role::Owner, Role::Admin].into_iter().collect(),
            default_effect: PermissionEffect::Allow,
        }
    }
}

/// Evaluates calls against role floors and the configured rule list.
///
/// The engine holds the only piece of core-owned mutable shared state:
/// the rule snapshot. Evaluation reads the snapshot without cloning rule
/// data; refresh swaps the whole snapshot atomically.
pub struct PolicyEngine {
    config: PolicyEngineConfig,
    rules: RwLock<Arc<[ToolPermission]>>,
    deny_counts: DashMap<String, u64>,
}

impl PolicyEngine {
    /// Create an engine with an initial rule list.
    #[must_use]
    pub fn new(config: PolicyEngineConfig, rules: Vec<ToolPermission>) -> Self {
        Self {
            config,
            rules: RwLock::new(rules.into()),
            deny_counts: DashMap::new(),
        }
    }

    /// Evaluate a call. Never fails; every path returns a decision.
    #[must_use]
    pub fn evaluate(
        &self,
        principal: &Principal,
        tool: &str,
        operation: &str,
        risk: RiskLevel,
    ) -> PolicyDecision {
        let decision = self.evaluate_inner(principal, tool, operation, risk);
        if !decision.allow {
            self.count_denial(tool);
            tracing::debug!(
                subject = %principal.subject,
                tool,
                operation,
                risk = %risk,
                reason = %decision.reason,
                "policy denied call"
            );
        }
        decision
    }

    fn evaluate_inner(
        &self,
        principal: &Principal,
        tool: &str,
        operation: &str,
        risk: RiskLevel,
    ) -> PolicyDecision {
        // 1. Raw passthrough tool is gated on role membership alone.
        if tool == self.config.raw_tool {
            let permitted = principal
                .roles
                .iter()
                .any(|r| self.config.raw_tool_roles.contains(r));
            if !permitted {
                return PolicyDecision::deny("raw tool denied by role policy");
            }
        }

        // 2. Risk/role floor.
        if !principal.covers_risk(risk) {
            return PolicyDecision::deny(format!(
                "risk level {risk} exceeds the ceiling of roles held by {}",
                principal.subject
            ));
        }

        // 3. First structurally matching rule decides.
        let rules = self.snapshot();
        match rules.iter().find(|r| r.matches(tool, operation)) {
            Some(rule) => match rule.effect {
                PermissionEffect::Deny => {
                    PolicyDecision::deny("explicit deny rule matched").with_rule(rule.clone())
                }
                PermissionEffect::Allow => {
                    PolicyDecision::allow("explicit allow rule matched").with_rule(rule.clone())
                }
            },
            None => match self.config.default_effect {
                PermissionEffect::Allow => {
                    PolicyDecision::allow("no rule matched; default effect allow")
                }
                PermissionEffect::Deny => {
                    PolicyDecision::deny("no rule matched; default effect deny")
                }
            },
        }
    }

    /// Replace the rule list wholesale (after a policy refresh from
    /// storage). In-flight evaluations keep the snapshot they already
    /// took; later ones see the new list.
    pub fn update_permissions(&self, rules: Vec<ToolPermission>) {
        let count = rules.len();
        let mut guard = self.rules.write().unwrap_or_else(|e| {
            tracing::warn!("policy rule lock poisoned, recovering");
            e.into_inner()
        });
        *guard = rules.into();
        tracing::info!(rule_count = count, "policy rules replaced");
    }

    /// The current rule snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<[ToolPermission]> {
        Arc::clone(&self.rules.read().unwrap_or_else(|e| {
            tracing::warn!("policy rule lock poisoned, recovering");
            e.into_inner()
        }))
    }

    /// Denials recorded for a tool since startup. Observability only; a
    /// counter bump never changes a decision.
    #[must_use]
    pub fn deny_count(&self, tool: &str) -> u64 {
        self.deny_counts.get(tool).map_or(0, |c| *c)
    }

    fn count_denial(&self, tool: &str) {
        *self.deny_counts.entry(tool.to_string()).or_insert(0) += 1;
    }
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("config", &self.config)
            .field("rule_count", &self.snapshot().len())
            .finish_non_exhaustive()
    }
}
