//! Approval failure kinds.
//!
//! Verification failures are deliberately fine-grained: a caller holding a
//! consumed token, a stale token, and a token issued for different
//! arguments each see a different error. None of them are retryable with
//! the same token.

use botgate_core::ApprovalId;

use crate::record::{ApprovalStatus, TokenStatus};

/// Errors raised by the approval service.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// The presented token does not resolve to any known token row.
    #[error("approval token is not recognized")]
    InvalidToken,

    /// The token row exists but is no longer active (already consumed or
    /// marked expired).
    #[error("approval token is {status}, not active")]
    TokenNotActive {
        /// Status the token was found in.
        status: TokenStatus,
    },

    /// The token's expiry time has passed.
    #[error("approval token expired")]
    TokenExpired,

    /// The token's paired approval request row is missing.
    #[error("approval request {id} missing for a known token")]
    RequestMissing {
        /// Id of the missing request.
        id: ApprovalId,
    },

    /// The paired request is not in the `approved` state.
    #[error("approval request is {status}, not approved")]
    RequestNotApproved {
        /// Status the request was found in.
        status: ApprovalStatus,
    },

    /// The executing principal is not the one the grant was issued to.
    #[error("approval was issued to a different principal")]
    PrincipalMismatch,

    /// The executing tool/operation differ from the approved ones.
    #[error("approval was issued for {approved_tool}.{approved_operation}, not this action")]
    ActionMismatch {
        /// Tool the grant was issued for.
        approved_tool: String,
        /// Operation the grant was issued for.
        approved_operation: String,
    },

    /// The risk level computed at execution differs from the approved one.
    #[error("approval was issued at risk level {approved}, not {presented}")]
    RiskMismatch {
        /// Risk level at issuance.
        approved: botgate_core::RiskLevel,
        /// Risk level at execution.
        presented: botgate_core::RiskLevel,
    },

    /// The executing payload does not hash to the approved payload hash.
    #[error("approval was issued for a different payload")]
    PayloadMismatch,

    /// The approval request's expiry time has passed.
    #[error("approval request expired")]
    RequestExpired,

    /// Payload hashing failed.
    #[error(transparent)]
    Crypto(#[from] botgate_crypto::CryptoError),

    /// Storage backend error.
    #[error("approval storage error: {0}")]
    Storage(String),
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
