//! Error types for audit operations.

/// Errors raised by audit sinks.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The backend failed to persist or read an event.
    #[error("audit storage error: {0}")]
    Storage(String),
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
