//! Configuration loading: TOML document plus `BOTGATE_*` environment
//! overrides.

use std::path::Path;

use crate::types::{Config, EffectName};
use crate::validate;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid TOML for the config shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value the gateway cannot run with.
    #[error("invalid config: {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What was wrong and what is accepted.
        reason: String,
    },
}

/// Parse a configuration document, apply environment overrides, and
/// validate the result.
///
/// # Errors
///
/// Returns [`ConfigError`] for unparseable documents, unrecognized
/// override values, or invalid settings.
pub fn load_from_str(document: &str) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(document)?;
    apply_env_overrides(&mut config)?;
    validate::validate(&config)?;
    Ok(config)
}

/// Read and parse a configuration file.
///
/// # Errors
///
/// Returns [`ConfigError`] for I/O failures and everything
/// [`load_from_str`] rejects.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let document = std::fs::read_to_string(path.as_ref())?;
    let config = load_from_str(&document)?;
    tracing::info!(path = %path.as_ref().display(), "configuration loaded");
    Ok(config)
}

/// Apply `BOTGATE_*` environment overrides.
///
/// Recognized variables:
///
/// | Variable | Overrides |
/// |---|---|
/// | `BOTGATE_POLICY_DEFAULT_EFFECT` | `policy.default_effect` |
/// | `BOTGATE_APPROVALS_ENABLED` | `approvals.enabled` |
/// | `BOTGATE_APPROVALS_TTL_SECONDS` | `approvals.ttl_seconds` |
/// | `BOTGATE_IDEMPOTENCY_TTL_SECONDS` | `idempotency.ttl_seconds` |
/// | `BOTGATE_TELEGRAM_BASE_URL` | `telegram.base_url` |
/// | `BOTGATE_SEALING_PRIMARY_KEY_ID` | `sealing.primary_key_id` |
/// | `BOTGATE_SEALING_PRIMARY_KEY` | `sealing.primary_key` |
/// | `BOTGATE_SEALING_PREVIOUS_KEY_ID` | `sealing.previous_key_id` |
/// | `BOTGATE_SEALING_PREVIOUS_KEY` | `sealing.previous_key` |
/// | `BOTGATE_LOG_LEVEL` | `logging.level` |
fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var("BOTGATE_POLICY_DEFAULT_EFFECT") {
        config.policy.default_effect = match value.as_str() {
            "allow" => EffectName::Allow,
            "deny" => EffectName::Deny,
            other => {
                return Err(ConfigError::Invalid {
                    field: "policy.default_effect",
                    reason: format!("expected 'allow' or 'deny', got '{other}'"),
                })
            }
        };
    }
    if let Ok(value) = std::env::var("BOTGATE_APPROVALS_ENABLED") {
        config.approvals.enabled = parse_bool("approvals.enabled", &value)?;
    }
    if let Ok(value) = std::env::var("BOTGATE_APPROVALS_TTL_SECONDS") {
        config.approvals.ttl_seconds = parse_u64("approvals.ttl_seconds", &value)?;
    }
    if let Ok(value) = std::env::var("BOTGATE_IDEMPOTENCY_TTL_SECONDS") {
        config.idempotency.ttl_seconds = parse_u64("idempotency.ttl_seconds", &value)?;
    }
    if let Ok(value) = std::env::var("BOTGATE_TELEGRAM_BASE_URL") {
        config.telegram.base_url = value;
    }
    if let Ok(value) = std::env::var("BOTGATE_SEALING_PRIMARY_KEY_ID") {
        config.sealing.primary_key_id = Some(value);
    }
    if let Ok(value) = std::env::var("BOTGATE_SEALING_PRIMARY_KEY") {
        config.sealing.primary_key = Some(value);
    }
    if let Ok(value) = std::env::var("BOTGATE_SEALING_PREVIOUS_KEY_ID") {
        config.sealing.previous_key_id = Some(value);
    }
    if let Ok(value) = std::env::var("BOTGATE_SEALING_PREVIOUS_KEY") {
        config.sealing.previous_key = Some(value);
    }
    if let Ok(value) = std::env::var("BOTGATE_LOG_LEVEL") {
        config.logging.level = value;
    }
    Ok(())
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::Invalid {
            field,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn parse_u64(field: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        field,
        reason: format!("expected an integer, got '{value}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_loads_defaults() {
        let config = load_from_str("").unwrap();
        assert!(config.approvals.enabled);
        assert_eq!(config.telegram.base_url, "https://api.telegram.org");
    }

    #[test]
    fn test_unknown_toml_is_rejected_gracefully() {
        assert!(matches!(
            load_from_str("policy = 5"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_bool_accepts_common_forms() {
        assert!(parse_bool("f", "true").unwrap());
        assert!(parse_bool("f", "1").unwrap());
        assert!(!parse_bool("f", "no").unwrap());
        assert!(parse_bool("f", "maybe").is_err());
    }

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64("f", "300").unwrap(), 300);
        assert!(parse_u64("f", "soon").is_err());
    }
}
