//! Durable approval records.
//!
//! These are the shapes the store collaborator persists. The raw bearer
//! secret never appears here - token rows carry only its hash.

use botgate_core::{ApprovalId, RiskLevel, Timestamp, TokenId};
use botgate_crypto::{PayloadHash, TokenHash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting a decision (unused by the JIT flow; kept for store
    /// collaborators that add a review step).
    Pending,
    /// Granted; the paired token may be consumed.
    Approved,
    /// Refused by a reviewer.
    Rejected,
    /// Lapsed before consumption.
    Expired,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Lifecycle state of an approval token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// Issued and not yet consumed.
    Active,
    /// Consumed; exactly one consumer ever observes the flip.
    Used,
    /// Lapsed before consumption.
    Expired,
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Used => write!(f, "used"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// A durable approval request row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequestRecord {
    /// Request id, returned to the caller at issuance.
    pub id: ApprovalId,
    /// Subject of the principal the grant was issued to.
    pub principal_subject: String,
    /// Approved tool.
    pub tool: String,
    /// Approved operation.
    pub operation: String,
    /// Risk level computed at issuance.
    pub risk_level: RiskLevel,
    /// Hash of the canonicalized payload the grant is bound to.
    pub payload_hash: PayloadHash,
    /// Lifecycle state.
    pub status: ApprovalStatus,
    /// When the grant lapses.
    pub expires_at: Timestamp,
    /// When the grant was issued.
    pub created_at: Timestamp,
}

/// A durable approval token row, paired 1:1 with a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalTokenRecord {
    /// Token row id.
    pub id: TokenId,
    /// The paired approval request.
    pub approval_request_id: ApprovalId,
    /// SHA-256 of the bearer secret; the secret itself is never stored.
    pub token_hash: TokenHash,
    /// Lifecycle state.
    pub status: TokenStatus,
    /// When the token lapses.
    pub expires_at: Timestamp,
    /// When the token was consumed, once it has been.
    pub used_at: Option<Timestamp>,
}
