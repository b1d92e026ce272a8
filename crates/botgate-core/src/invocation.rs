//! The tool invocation envelope.
//!
//! Every request that reaches the execution pipeline is a [`ToolCall`]:
//! which account to act as, which tool and operation to run, the operation
//! payload, and the optional knobs (idempotency key, dry-run, approval
//! token, client context).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Reference to a configured Telegram account (bot token or MTProto
/// session), resolved by the credential collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef(pub String);

impl AccountRef {
    /// Wrap an account name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The account name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-supplied context forwarded into audit records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientContext {
    /// Client application identifier.
    pub client_id: Option<String>,
    /// Correlation id for tracing a request across systems.
    pub request_id: Option<String>,
    /// Originating address as reported by the transport.
    pub remote_addr: Option<String>,
}

/// A single tool invocation as received by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Account to act as.
    pub account: AccountRef,
    /// Tool name, e.g. `telegram.bot.members`.
    pub tool: String,
    /// Operation name within the tool, e.g. `banChatMember`.
    pub operation: String,
    /// Operation payload, already shape-validated upstream.
    pub payload: Value,
    /// Caller-supplied idempotency key (1..=128 chars when present).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// When set, report what would execute without executing.
    #[serde(default)]
    pub dry_run: bool,
    /// Bearer secret from a prior approval grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_token: Option<String>,
    /// Context forwarded into audit records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_context: Option<ClientContext>,
    /// Set only by the trusted composition layer to bypass the approval
    /// gate (e.g. for the approval tool's own operations). Never exposed
    /// to external callers.
    #[serde(skip)]
    pub approval_exempt: bool,
}

impl ToolCall {
    /// Create a call with only the required fields set.
    #[must_use]
    pub fn new(
        account: AccountRef,
        tool: impl Into<String>,
        operation: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            account,
            tool: tool.into(),
            operation: operation.into(),
            payload,
            idempotency_key: None,
            dry_run: false,
            approval_token: None,
            client_context: None,
            approval_exempt: false,
        }
    }

    /// The classification key, `"{tool}.{operation}"`.
    #[must_use]
    pub fn action_key(&self) -> String {
        format!("{}.{}", self.tool, self.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_key() {
        let call = ToolCall::new(
            AccountRef::new("main"),
            "telegram.bot.members",
            "banChatMember",
            json!({}),
        );
        assert_eq!(call.action_key(), "telegram.bot.members.banChatMember");
    }

    #[test]
    fn test_deserialize_defaults() {
        let call: ToolCall = serde_json::from_value(json!({
            "account": "main",
            "tool": "telegram.bot.messages",
            "operation": "sendMessage",
            "payload": {"chat_id": 1, "text": "hi"},
        }))
        .unwrap();
        assert!(!call.dry_run);
        assert!(call.idempotency_key.is_none());
        assert!(!call.approval_exempt);
    }

    #[test]
    fn test_approval_exempt_never_serialized() {
        let mut call = ToolCall::new(AccountRef::new("main"), "t", "op", json!({}));
        call.approval_exempt = true;
        let value = serde_json::to_value(&call).unwrap();
        assert!(value.get("approval_exempt").is_none());
    }
}
