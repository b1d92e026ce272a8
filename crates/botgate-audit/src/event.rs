//! Audit event shape.

use botgate_core::{ApprovalId, AuditEventId, ClientContext, RiskLevel, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// What kind of outcome an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A policy decision was made for an attempted invocation.
    ToolAuthorize,
    /// The domain operation was invoked (successfully or not).
    ToolExecute,
    /// An approval grant was requested through the approval flow.
    ApprovalRequest,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolAuthorize => write!(f, "tool_authorize"),
            Self::ToolExecute => write!(f, "tool_execute"),
            Self::ApprovalRequest => write!(f, "approval_request"),
        }
    }
}

/// One immutable audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event id.
    pub id: AuditEventId,
    /// When the event was recorded.
    pub timestamp: Timestamp,
    /// Subject of the acting principal.
    pub principal_subject: String,
    /// What kind of outcome this records.
    pub action: AuditAction,
    /// Tool the invocation targeted.
    pub tool: String,
    /// Operation the invocation targeted.
    pub operation: String,
    /// Whether the recorded step succeeded (authorization granted /
    /// execution succeeded).
    pub allowed: bool,
    /// Human-readable reason or outcome description.
    pub reason: String,
    /// Risk level computed for the invocation, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    /// Approval grant involved, when one was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_id: Option<ApprovalId>,
    /// Caller-supplied context, when forwarded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_context: Option<ClientContext>,
    /// Free-form extras (serialized errors, replay markers).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl AuditEvent {
    /// Create an event with the required fields.
    #[must_use]
    pub fn new(
        principal_subject: impl Into<String>,
        action: AuditAction,
        tool: impl Into<String>,
        operation: impl Into<String>,
        allowed: bool,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: AuditEventId::new(),
            timestamp: Timestamp::now(),
            principal_subject: principal_subject.into(),
            action,
            tool: tool.into(),
            operation: operation.into(),
            allowed,
            reason: reason.into(),
            risk_level: None,
            approval_id: None,
            client_context: None,
            metadata: Map::new(),
        }
    }

    /// Attach the computed risk level.
    #[must_use]
    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk_level = Some(risk);
        self
    }

    /// Attach the approval grant id.
    #[must_use]
    pub fn with_approval(mut self, approval_id: ApprovalId) -> Self {
        self.approval_id = Some(approval_id);
        self
    }

    /// Attach caller context.
    #[must_use]
    pub fn with_client_context(mut self, context: ClientContext) -> Self {
        self.client_context = Some(context);
        self
    }

    /// Attach one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.allowed { "allowed" } else { "denied" };
        write!(
            f,
            "[{}] {} {}.{} {verdict}: {}",
            self.action, self.principal_subject, self.tool, self.operation, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_chain() {
        let event = AuditEvent::new(
            "alice",
            AuditAction::ToolAuthorize,
            "telegram.bot.members",
            "banChatMember",
            false,
            "risk level high exceeds the ceiling of roles held by alice",
        )
        .with_risk(RiskLevel::High)
        .with_metadata("matched_rule", json!(null));

        assert_eq!(event.action, AuditAction::ToolAuthorize);
        assert_eq!(event.risk_level, Some(RiskLevel::High));
        assert!(event.metadata.contains_key("matched_rule"));
    }

    #[test]
    fn test_serde_omits_empty_optionals() {
        let event = AuditEvent::new("alice", AuditAction::ToolExecute, "t", "op", true, "ok");
        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("risk_level").is_none());
        assert!(value.get("approval_id").is_none());
        assert!(value.get("metadata").is_none());
        assert_eq!(value["action"], "tool_execute");
    }

    #[test]
    fn test_display() {
        let event = AuditEvent::new("alice", AuditAction::ToolAuthorize, "t", "op", true, "ok");
        let line = event.to_string();
        assert!(line.contains("tool_authorize"));
        assert!(line.contains("allowed"));
    }
}
