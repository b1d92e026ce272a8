//! Configuration validation with actionable messages.

use crate::loader::ConfigError;
use crate::types::Config;

/// Longest accepted sealing key, decoded (32 bytes, base64: 44 chars).
const SEAL_KEY_B64_LEN: usize = 44;

/// Validate a loaded configuration.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] naming the first offending field.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.approvals.ttl_seconds == 0 {
        return Err(ConfigError::Invalid {
            field: "approvals.ttl_seconds",
            reason: "must be at least 1 second".to_owned(),
        });
    }
    if config.idempotency.ttl_seconds == 0 {
        return Err(ConfigError::Invalid {
            field: "idempotency.ttl_seconds",
            reason: "must be at least 1 second".to_owned(),
        });
    }
    if config.telegram.retry.max_attempts == 0 {
        return Err(ConfigError::Invalid {
            field: "telegram.retry.max_attempts",
            reason: "must allow at least one attempt".to_owned(),
        });
    }
    if config.telegram.request_timeout_seconds == 0 {
        return Err(ConfigError::Invalid {
            field: "telegram.request_timeout_seconds",
            reason: "must be at least 1 second".to_owned(),
        });
    }
    if config.policy.raw_tool_roles.is_empty() {
        return Err(ConfigError::Invalid {
            field: "policy.raw_tool_roles",
            reason: "must name at least one role (otherwise remove the raw tool instead)"
                .to_owned(),
        });
    }
    for (index, rule) in config.policy.rules.iter().enumerate() {
        if rule.tool.is_empty() {
            return Err(ConfigError::Invalid {
                field: "policy.rules",
                reason: format!("rule {index} has an empty tool name"),
            });
        }
        if rule.operations.is_empty() {
            return Err(ConfigError::Invalid {
                field: "policy.rules",
                reason: format!(
                    "rule {index} ({}) lists no operations; use [\"*\"] for all",
                    rule.tool
                ),
            });
        }
    }
    if config.sealing.primary_key.is_some() && config.sealing.primary_key_id.is_none() {
        return Err(ConfigError::Invalid {
            field: "sealing.primary_key_id",
            reason: "required when sealing.primary_key is set".to_owned(),
        });
    }
    if config.sealing.previous_key.is_some() && config.sealing.previous_key_id.is_none() {
        return Err(ConfigError::Invalid {
            field: "sealing.previous_key_id",
            reason: "required when sealing.previous_key is set".to_owned(),
        });
    }
    for (field, key) in [
        ("sealing.primary_key", &config.sealing.primary_key),
        ("sealing.previous_key", &config.sealing.previous_key),
    ] {
        if let Some(key) = key {
            if key.len() != SEAL_KEY_B64_LEN {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!(
                        "expected {SEAL_KEY_B64_LEN} base64 characters (32 bytes), got {}",
                        key.len()
                    ),
                });
            }
        }
    }
    Ok(())
}
