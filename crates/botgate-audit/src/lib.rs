//! Botgate Audit - the append-only record of authorization and execution.
//!
//! Every invocation that reaches policy evaluation produces exactly one
//! `tool_authorize` event; every invocation that reaches the domain call
//! produces at most one `tool_execute` event (success or failure). Events
//! are never mutated or deleted by the core. An authorize event without a
//! matching execute event is a legal state ("request abandoned after
//! authorization") and is how operators discover abandoned approvals.
//!
//! The sink is a boundary trait; durable backends are external
//! collaborators. [`MemoryAuditSink`] is the in-process reference
//! implementation and also serves the read projections (`recent`,
//! `for_subject`).

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod event;
pub mod sink;

pub use error::{AuditError, AuditResult};
pub use event::{AuditAction, AuditEvent};
pub use sink::{AuditSink, MemoryAuditSink};
