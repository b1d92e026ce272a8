//! Conversion from configuration mirrors to wired components.
//!
//! `botgate-config` is deliberately dependency-free; the domain types it
//! mirrors are converted here, at the gateway boundary.

use botgate_approval::{ApprovalConfig, ApprovalService, ApprovalStore};
use botgate_audit::AuditSink;
use botgate_config::{Config, EffectName, RiskName, RoleName, SealingSection};
use botgate_core::{RiskLevel, Role};
use botgate_crypto::{CredentialSealer, CryptoError, SealKey};
use botgate_idempotency::{IdempotencyCache, IdempotencyStore};
use botgate_policy::{PermissionEffect, PolicyEngine, PolicyEngineConfig, ToolPermission};
use botgate_risk::RiskClassifier;
use botgate_telegram::{Invoker, MethodRegistry, RetryPolicy};
use chrono::Duration;
use std::sync::Arc;

use crate::pipeline::ExecutionPipeline;

/// Convert a configured role name.
#[must_use]
pub fn role(name: RoleName) -> Role {
    match name {
        RoleName::Owner => Role::Owner,
        RoleName::Admin => Role::Admin,
        RoleName::Operator => Role::Operator,
        RoleName::Readonly => Role::ReadOnly,
    }
}

/// Convert a configured risk name.
#[must_use]
pub fn risk(name: RiskName) -> RiskLevel {
    match name {
        RiskName::Low => RiskLevel::Low,
        RiskName::Medium => RiskLevel::Medium,
        RiskName::High => RiskLevel::High,
        RiskName::Critical => RiskLevel::Critical,
    }
}

/// Convert a configured effect name.
#[must_use]
pub fn effect(name: EffectName) -> PermissionEffect {
    match name {
        EffectName::Allow => PermissionEffect::Allow,
        EffectName::Deny => PermissionEffect::Deny,
    }
}

/// Build the policy engine from configuration.
#[must_use]
pub fn policy_engine(config: &Config) -> PolicyEngine {
    let engine_config = PolicyEngineConfig {
        raw_tool: config.policy.raw_tool.clone(),
        raw_tool_roles: config.policy.raw_tool_roles.iter().map(|r| role(*r)).collect(),
        default_effect: effect(config.policy.default_effect),
    };
    let rules = config
        .policy
        .rules
        .iter()
        .map(|r| {
            ToolPermission::new(
                r.tool.clone(),
                r.operations.iter().cloned(),
                risk(r.risk_level),
                effect(r.effect),
            )
        })
        .collect();
    PolicyEngine::new(engine_config, rules)
}

/// Build the approval service from configuration.
#[must_use]
pub fn approval_service(config: &Config, store: Arc<dyn ApprovalStore>) -> ApprovalService {
    let approval_config = ApprovalConfig {
        enabled: config.approvals.enabled,
        ttl: seconds(config.approvals.ttl_seconds),
        required_levels: config
            .approvals
            .required_levels
            .iter()
            .map(|r| risk(*r))
            .collect(),
    };
    ApprovalService::new(store, approval_config)
}

/// Build the idempotency cache from configuration.
#[must_use]
pub fn idempotency_cache(config: &Config, store: Arc<dyn IdempotencyStore>) -> IdempotencyCache {
    IdempotencyCache::new(store, seconds(config.idempotency.ttl_seconds))
}

/// Build the Bot API retry policy from configuration.
#[must_use]
pub fn retry_policy(config: &Config) -> RetryPolicy {
    RetryPolicy {
        max_attempts: config.telegram.retry.max_attempts,
        base_delay: std::time::Duration::from_millis(config.telegram.retry.base_delay_ms),
        max_delay: std::time::Duration::from_millis(config.telegram.retry.max_delay_ms),
    }
}

/// Build the credential sealer, when sealing keys are configured.
///
/// # Errors
///
/// Returns a crypto error if a configured key does not decode to 32
/// bytes.
pub fn credential_sealer(section: &SealingSection) -> Result<Option<CredentialSealer>, CryptoError> {
    let (Some(id), Some(key)) = (&section.primary_key_id, &section.primary_key) else {
        return Ok(None);
    };
    let primary = SealKey::from_base64(id.clone(), key)?;
    let sealer = match (&section.previous_key_id, &section.previous_key) {
        (Some(prev_id), Some(prev_key)) => {
            let previous = SealKey::from_base64(prev_id.clone(), prev_key)?;
            CredentialSealer::with_previous(primary, previous)
        }
        _ => CredentialSealer::new(primary),
    };
    Ok(Some(sealer))
}

/// Wire a full pipeline from configuration and the injected
/// collaborators (stores, audit sink, domain invoker).
#[must_use]
pub fn build_pipeline(
    config: &Config,
    approval_store: Arc<dyn ApprovalStore>,
    idempotency_store: Arc<dyn IdempotencyStore>,
    audit: Arc<dyn AuditSink>,
    invoker: Arc<dyn Invoker>,
) -> ExecutionPipeline {
    ExecutionPipeline::new(
        RiskClassifier::standard(),
        MethodRegistry::global(),
        Arc::new(policy_engine(config)),
        Arc::new(approval_service(config, approval_store)),
        Arc::new(idempotency_cache(config, idempotency_store)),
        audit,
        invoker,
    )
}

/// Whole seconds as a chrono duration, saturating instead of wrapping.
fn seconds(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}
