//! The policy storage boundary.
//!
//! Durable rule storage (versioned, most recent set wins) is an external
//! collaborator; the engine only needs a way to fetch the latest rule
//! list at startup and on refresh. The write path (validation,
//! versioning) lives with the collaborator.

use async_trait::async_trait;

use crate::engine::PolicyEngine;
use crate::rule::ToolPermission;

/// Read-only source of the latest permission rule set.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    /// Fetch the most recent rule list, in evaluation order.
    ///
    /// # Errors
    ///
    /// Returns a backend-specific message when the rules cannot be
    /// fetched; the engine keeps its current snapshot in that case.
    async fn load_rules(&self) -> Result<Vec<ToolPermission>, String>;
}

/// A fixed in-memory rule set (startup defaults, tests).
#[derive(Debug, Clone, Default)]
pub struct StaticRules(pub Vec<ToolPermission>);

#[async_trait]
impl PermissionSource for StaticRules {
    async fn load_rules(&self) -> Result<Vec<ToolPermission>, String> {
        Ok(self.0.clone())
    }
}

impl PolicyEngine {
    /// Refresh the rule snapshot from a source.
    ///
    /// On fetch failure the current snapshot stays in place and the
    /// error is returned for the caller to surface.
    ///
    /// # Errors
    ///
    /// Propagates the source's error message.
    pub async fn refresh_from(&self, source: &dyn PermissionSource) -> Result<usize, String> {
        let rules = source.load_rules().await?;
        let count = rules.len();
        self.update_permissions(rules);
        Ok(count)
    }
}
