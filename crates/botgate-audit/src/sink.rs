//! Audit sink trait and the in-memory reference backend.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::error::AuditResult;
use crate::event::AuditEvent;

/// Append-only destination for audit events.
///
/// Implementations must preserve append order per process and must never
/// mutate or delete recorded events. The read side is an observability
/// feature, not correctness-critical.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one event.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the event cannot be persisted.
    async fn record(&self, event: AuditEvent) -> AuditResult<()>;

    /// The most recent events, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    async fn recent(&self, limit: usize) -> AuditResult<Vec<AuditEvent>>;

    /// Total number of recorded events.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    async fn count(&self) -> AuditResult<usize>;
}

/// In-memory reference implementation of [`AuditSink`].
///
/// Every append also emits a `tracing` event so the trail is visible in
/// structured logs even before a durable backend is attached.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: RwLock<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded for a subject, oldest first.
    #[must_use]
    pub fn for_subject(&self, subject: &str) -> Vec<AuditEvent> {
        self.events()
            .iter()
            .filter(|e| e.principal_subject == subject)
            .cloned()
            .collect()
    }

    fn events(&self) -> std::sync::RwLockReadGuard<'_, Vec<AuditEvent>> {
        self.events.read().unwrap_or_else(|e| {
            tracing::warn!("audit sink lock poisoned, recovering");
            e.into_inner()
        })
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> AuditResult<()> {
        tracing::info!(
            event_id = %event.id,
            subject = %event.principal_subject,
            action = %event.action,
            tool = %event.tool,
            operation = %event.operation,
            allowed = event.allowed,
            reason = %event.reason,
            "audit event"
        );
        self.events
            .write()
            .unwrap_or_else(|e| {
                tracing::warn!("audit sink lock poisoned, recovering");
                e.into_inner()
            })
            .push(event);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> AuditResult<Vec<AuditEvent>> {
        Ok(self.events().iter().rev().take(limit).cloned().collect())
    }

    async fn count(&self) -> AuditResult<usize> {
        Ok(self.events().len())
    }
}

impl std::fmt::Debug for MemoryAuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAuditSink")
            .field("events", &self.events().len())
            .finish()
    }
}
