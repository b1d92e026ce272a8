//! Botgate Core - shared vocabulary for the gateway.
//!
//! This crate holds the types every other botgate crate speaks:
//!
//! - Newtype identifiers ([`ApprovalId`], [`TokenId`], [`AuditEventId`])
//! - [`Timestamp`] over UTC with expiry arithmetic
//! - [`RiskLevel`] - the totally ordered severity classification
//! - [`Principal`], [`Role`], [`AuthSource`] - the authenticated caller
//! - [`ToolCall`] / [`ClientContext`] - the tool invocation envelope
//!
//! Nothing here performs I/O. Principals are request-scoped and never
//! persisted by the core; durable records live behind the store traits of
//! the sibling crates.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod ids;
pub mod invocation;
pub mod prelude;
pub mod principal;
pub mod risk;
pub mod time;

pub use ids::{ApprovalId, AuditEventId, TokenId};
pub use invocation::{AccountRef, ClientContext, ToolCall};
pub use principal::{AuthSource, Principal, Role};
pub use risk::RiskLevel;
pub use time::Timestamp;
