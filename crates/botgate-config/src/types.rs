//! Configuration types.
//!
//! Mirrors of domain enums (`RoleName`, `RiskName`, `EffectName`) keep
//! this crate dependency-free; the gateway converts them when wiring the
//! engine. Secrets (sealing keys) are excluded from `Debug` and from
//! serialization.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration for the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Policy engine settings and the permission rule list.
    pub policy: PolicySection,
    /// Approval gate settings.
    pub approvals: ApprovalsSection,
    /// Idempotency cache settings.
    pub idempotency: IdempotencySection,
    /// Telegram Bot API client settings.
    pub telegram: TelegramSection,
    /// Credential sealing keys.
    pub sealing: SealingSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// Mirrored domain names
// ---------------------------------------------------------------------------

/// Role names as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    /// Full control.
    Owner,
    /// Administrative control.
    Admin,
    /// Day-to-day operation.
    Operator,
    /// Read-only access.
    Readonly,
}

/// Risk level names as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskName {
    /// Harmless operations.
    Low,
    /// Reversible mutations.
    Medium,
    /// Destructive or privacy-affecting operations.
    High,
    /// Gravest operations.
    Critical,
}

/// Rule effect names as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectName {
    /// Permit the call.
    Allow,
    /// Reject the call.
    Deny,
}

// ---------------------------------------------------------------------------
// PolicySection
// ---------------------------------------------------------------------------

/// One permission rule as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSection {
    /// Tool name (exact match).
    pub tool: String,
    /// Operations covered; `"*"` is the wildcard.
    pub operations: Vec<String>,
    /// Risk level the rule was authored against.
    pub risk_level: RiskName,
    /// Allow or deny.
    pub effect: EffectName,
}

/// Policy engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySection {
    /// Name of the raw passthrough tool.
    pub raw_tool: String,
    /// Roles allowed to invoke the raw tool.
    pub raw_tool_roles: Vec<RoleName>,
    /// Effect applied when no rule matches.
    pub default_effect: EffectName,
    /// Ordered rule list; first structural match wins.
    pub rules: Vec<RuleSection>,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            raw_tool: "telegram.raw".to_owned(),
            raw_tool_roles: vec![RoleName::Owner, RoleName::Admin],
            default_effect: EffectName::Allow,
            rules: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ApprovalsSection
// ---------------------------------------------------------------------------

/// Approval gate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalsSection {
    /// Master switch.
    pub enabled: bool,
    /// Grant lifetime in seconds.
    pub ttl_seconds: u64,
    /// Risk levels that require a token before execution.
    pub required_levels: Vec<RiskName>,
}

impl Default for ApprovalsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 300,
            required_levels: vec![RiskName::High, RiskName::Critical],
        }
    }
}

// ---------------------------------------------------------------------------
// IdempotencySection
// ---------------------------------------------------------------------------

/// Idempotency cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdempotencySection {
    /// Record lifetime in seconds.
    pub ttl_seconds: u64,
}

impl Default for IdempotencySection {
    fn default() -> Self {
        Self { ttl_seconds: 300 }
    }
}

// ---------------------------------------------------------------------------
// TelegramSection
// ---------------------------------------------------------------------------

/// Retry behaviour for transient Bot API failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Backoff ceiling, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
        }
    }
}

/// Telegram Bot API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    /// Bot API endpoint.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_seconds: u64,
    /// Retry behaviour.
    pub retry: RetrySection,
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.telegram.org".to_owned(),
            request_timeout_seconds: 30,
            retry: RetrySection::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// SealingSection
// ---------------------------------------------------------------------------

/// Credential sealing keys. Prefer environment variables over storing
/// key material in a file.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SealingSection {
    /// Id of the primary key.
    pub primary_key_id: Option<String>,
    /// Primary key material, base64 (32 bytes).
    pub primary_key: Option<String>,
    /// Id of the previous key, during rotation.
    pub previous_key_id: Option<String>,
    /// Previous key material, base64 (32 bytes).
    pub previous_key: Option<String>,
}

impl std::fmt::Debug for SealingSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealingSection")
            .field("primary_key_id", &self.primary_key_id)
            .field("has_primary_key", &self.primary_key.is_some())
            .field("previous_key_id", &self.previous_key_id)
            .field("has_previous_key", &self.previous_key.is_some())
            .finish()
    }
}

impl Serialize for SealingSection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = usize::from(self.primary_key_id.is_some())
            + usize::from(self.previous_key_id.is_some());
        let mut state = serializer.serialize_struct("SealingSection", fields)?;
        if let Some(id) = &self.primary_key_id {
            state.serialize_field("primary_key_id", id)?;
        }
        // Key material is intentionally omitted.
        if let Some(id) = &self.previous_key_id {
            state.serialize_field("previous_key_id", id)?;
        }
        state.end()
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging level, format, and per-crate directives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base level (`trace` .. `error`).
    pub level: String,
    /// Output format (`text` or `json`).
    pub format: String,
    /// Extra `env-filter` directives (e.g. `botgate_gateway=debug`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "text".to_owned(),
            directives: Vec::new(),
        }
    }
}
