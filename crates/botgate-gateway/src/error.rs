//! Pipeline failure taxonomy.
//!
//! Every failure keeps its distinguishing kind: callers can tell a policy
//! denial from a missing approval from a failed domain call without
//! parsing messages. Nothing is swallowed; the only local handling the
//! pipeline does is making sure the audit write precedes the raise.

use botgate_core::RiskLevel;

/// Errors surfaced by the execution pipeline.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Authorization denied the call. Always audited before being raised;
    /// not retryable without a role or policy change.
    #[error("policy denied: {reason}")]
    PolicyDenied {
        /// The policy engine's reason, suitable for direct display.
        reason: String,
    },

    /// The risk level demands an approval token the caller did not
    /// supply. Obtain one through the approval-request flow and retry.
    #[error(
        "approval required for {risk}-risk operations; obtain a token via the approval-request flow"
    )]
    ApprovalRequired {
        /// The computed risk level that triggered the requirement.
        risk: RiskLevel,
    },

    /// Approval verification failed; the inner error distinguishes wrong
    /// token / stale token / mismatched binding. Not retryable with the
    /// same token.
    #[error(transparent)]
    Approval(#[from] botgate_approval::ApprovalError),

    /// The operation name is outside the known method set.
    #[error(transparent)]
    UnknownOperation(#[from] botgate_telegram::TelegramError),

    /// The underlying Telegram call failed. Propagated unchanged to
    /// preserve upstream detail; audited as an execution failure first.
    #[error(transparent)]
    DomainOperation(#[from] botgate_telegram::InvokeError),

    /// The idempotency key was malformed or the cache backend failed.
    #[error(transparent)]
    Idempotency(#[from] botgate_idempotency::IdempotencyError),

    /// The audit sink failed before the domain operation ran. The
    /// pipeline fails closed rather than executing unaudited.
    #[error(transparent)]
    Audit(#[from] botgate_audit::AuditError),
}

/// Result type for pipeline operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
