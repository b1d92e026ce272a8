//! Botgate Gateway - the per-invocation execution pipeline.
//!
//! [`ExecutionPipeline::execute`] is the single entry point every tool
//! call flows through. The steps run in a fixed order and none is skipped
//! except where the contract says so:
//!
//! 1. Resolve risk (static method table for Bot API tools, the pattern
//!    classifier otherwise).
//! 2. Evaluate policy.
//! 3. Record a `tool_authorize` audit event - always, allowed or denied.
//! 4. Denied? Raise [`GatewayError::PolicyDenied`] and stop.
//! 5. Dry-run? Return a synthetic would-execute envelope and stop.
//! 6. Idempotency key supplied? A cache hit returns the cached envelope,
//!    annotated as a replay. The lookup happens **after** authorization,
//!    so a policy change still denies a request whose result would have
//!    come from cache.
//! 7. Risk requires approval (and the call is not exempt)? A missing
//!    token fails with [`GatewayError::ApprovalRequired`]; a present one
//!    is verified and consumed, and its distinct failures propagate.
//! 8. Invoke the domain operation.
//! 9. Success: cache under the idempotency key, record `tool_execute`
//!    (allowed), return the envelope.
//! 10. Failure: record `tool_execute` (denied, error in metadata) and
//!     re-throw the original error unchanged. The cache is never written
//!     on failure, so the same key is safe to retry.
//!
//! The sibling approval-request flow
//! ([`ExecutionPipeline::request_approval`]) is how a privileged caller
//! pre-obtains the single-use token for step 7.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod compose;
pub mod envelope;
pub mod error;
pub mod pipeline;

pub use compose::build_pipeline;
pub use envelope::{ResponseEnvelope, ToolOutcome};
pub use error::{GatewayError, GatewayResult};
pub use pipeline::{ApprovalRequestCall, ExecutionPipeline};
