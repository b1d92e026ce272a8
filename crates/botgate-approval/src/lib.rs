//! Botgate Approval - just-in-time sign-off for risky operations.
//!
//! High-risk tool calls require a single-use bearer token obtained through
//! the approval-request flow before the pipeline will execute them. A
//! grant is bound to the full action it authorizes:
//!
//! - the requesting principal's subject,
//! - the tool and operation,
//! - the risk level computed at request time,
//! - the SHA-256 of the canonicalized payload.
//!
//! [`ApprovalService::verify_and_consume`] re-derives all of these from
//! the executing call and fails with a **distinct** error for every kind
//! of mismatch, so callers can tell a wrong token from a stale one from a
//! token issued for different arguments. Consumption is atomic at the
//! store layer: under concurrent attempts with the same token exactly one
//! caller wins.
//!
//! Requests are recorded as `approved` at issuance. The flow is JIT
//! self-sign-off by a privileged principal, not a two-party review;
//! `pending`/`rejected` remain in [`ApprovalStatus`] for store
//! collaborators that add a review step.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod record;
pub mod service;
pub mod store;

pub use error::{ApprovalError, ApprovalResult};
pub use record::{ApprovalRequestRecord, ApprovalStatus, ApprovalTokenRecord, TokenStatus};
pub use service::{ApprovalConfig, ApprovalGrant, ApprovalService};
pub use store::{ApprovalStore, ConsumeOutcome, MemoryApprovalStore};
