//! Convenience re-exports for downstream crates.

pub use crate::ids::{ApprovalId, AuditEventId, TokenId};
pub use crate::invocation::{AccountRef, ClientContext, ToolCall};
pub use crate::principal::{AuthSource, Principal, Role};
pub use crate::risk::RiskLevel;
pub use crate::time::Timestamp;
