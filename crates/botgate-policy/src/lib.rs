//! Botgate Policy - the authorization decision engine.
//!
//! [`PolicyEngine::evaluate`] turns `(principal, tool, operation, risk)`
//! into a [`PolicyDecision`]. It never fails: every path produces a
//! decision with a human-readable reason. Checks run in a fixed order:
//!
//! 1. The raw passthrough tool requires one of the configured raw-tool
//!    roles.
//! 2. At least one held role must cover the operation's risk level
//!    (readonly -> low, operator -> medium, admin/owner -> critical).
//! 3. The first rule whose tool matches exactly and whose operation set
//!    contains the operation (or the `"*"` wildcard) decides; with no
//!    match the configured default effect applies.
//!
//! The rule list is an immutable snapshot. [`PolicyEngine::update_permissions`]
//! replaces it wholesale, so concurrent readers observe either the old or
//! the new list, never a partially updated one.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod decision;
pub mod engine;
pub mod rule;
pub mod source;

pub use decision::PolicyDecision;
pub use engine::{PolicyEngine, PolicyEngineConfig};
pub use rule::{PermissionEffect, ToolPermission};
pub use source::{PermissionSource, StaticRules};
