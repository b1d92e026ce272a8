//! Response envelopes returned by the pipeline.

use botgate_core::{ApprovalId, RiskLevel};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The success envelope for an executed (or dry-run) invocation.
///
/// The cached idempotency record holds exactly this serialized envelope,
/// so a replay is byte-identical to the original response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Always true; failures are errors, not envelopes.
    pub ok: bool,
    /// Tool that was invoked.
    pub tool: String,
    /// Operation that was invoked.
    pub operation: String,
    /// Risk level computed for the invocation.
    pub risk_level: RiskLevel,
    /// Approval grant consumed by the invocation, when one was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_id: Option<ApprovalId>,
    /// The domain operation's result, verbatim.
    pub result: Value,
}

impl ResponseEnvelope {
    /// Serialize to the JSON value the caller receives (and the
    /// idempotency cache stores).
    ///
    /// # Panics
    ///
    /// Never panics: the envelope contains only JSON-representable data.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Null)
    }
}

/// How an invocation terminated successfully.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The domain operation ran during this invocation.
    Executed {
        /// The response envelope.
        envelope: Value,
    },
    /// A cached response was returned; the domain operation did not run.
    IdempotentReplay {
        /// The envelope exactly as first cached.
        envelope: Value,
    },
    /// Dry-run short circuit; nothing past authorization ran.
    DryRun {
        /// A synthetic would-execute envelope carrying the computed risk.
        envelope: Value,
    },
}

impl ToolOutcome {
    /// The envelope, whichever way the invocation terminated.
    #[must_use]
    pub fn envelope(&self) -> &Value {
        match self {
            Self::Executed { envelope }
            | Self::IdempotentReplay { envelope }
            | Self::DryRun { envelope } => envelope,
        }
    }

    /// Whether this outcome came from the idempotency cache.
    #[must_use]
    pub fn is_replay(&self) -> bool {
        matches!(self, Self::IdempotentReplay { .. })
    }

    /// Whether this outcome is a dry-run short circuit.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun { .. })
    }
}
