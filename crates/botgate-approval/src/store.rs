//! Approval storage boundary.
//!
//! Durable persistence is an external collaborator; the core defines the
//! contract plus an in-memory reference implementation. The one hard
//! requirement is atomic consumption: [`ApprovalStore::consume_token`]
//! must flip `active -> used` as a single conditional update so that two
//! concurrent consumers of the same token resolve to exactly one winner.

use async_trait::async_trait;
use botgate_core::{ApprovalId, Timestamp};
use botgate_crypto::TokenHash;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{ApprovalError, ApprovalResult};
use crate::record::{ApprovalRequestRecord, ApprovalTokenRecord, TokenStatus};

/// Result of an atomic token consumption attempt.
#[derive(Debug, Clone)]
pub enum ConsumeOutcome {
    /// This caller won the flip; the returned row reflects the consumed
    /// state (`used`, `used_at` set).
    Consumed(ApprovalTokenRecord),
    /// The row exists but was not active; the returned row shows the
    /// state it was found in.
    NotActive(ApprovalTokenRecord),
    /// No row matches the presented hash.
    Unknown,
}

/// Storage contract for approval requests and tokens.
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Persist a request and its paired token in one step.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the rows cannot be persisted.
    async fn insert(
        &self,
        request: ApprovalRequestRecord,
        token: ApprovalTokenRecord,
    ) -> ApprovalResult<()>;

    /// Atomically consume the token with the given hash.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails; a missing or
    /// non-active token is an [`ConsumeOutcome`], not an error.
    async fn consume_token(&self, hash: &TokenHash) -> ApprovalResult<ConsumeOutcome>;

    /// Fetch a request row by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    async fn get_request(&self, id: &ApprovalId) -> ApprovalResult<Option<ApprovalRequestRecord>>;

    /// The most recent requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    async fn recent_requests(&self, limit: usize) -> ApprovalResult<Vec<ApprovalRequestRecord>>;
}

/// Interior state of the memory store, guarded by one lock so that
/// consumption is a single critical section.
#[derive(Default)]
struct MemoryInner {
    requests: HashMap<ApprovalId, ApprovalRequestRecord>,
    tokens: HashMap<TokenHash, ApprovalTokenRecord>,
    /// Insertion order of request ids, oldest first.
    order: Vec<ApprovalId>,
}

/// In-memory reference implementation of [`ApprovalStore`].
#[derive(Default)]
pub struct MemoryApprovalStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryApprovalStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemoryInner> {
        self.inner.write().unwrap_or_else(|e| {
            tracing::warn!("approval store lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemoryInner> {
        self.inner.read().unwrap_or_else(|e| {
            tracing::warn!("approval store lock poisoned, recovering");
            e.into_inner()
        })
    }
}

#[async_trait]
impl ApprovalStore for MemoryApprovalStore {
    async fn insert(
        &self,
        request: ApprovalRequestRecord,
        token: ApprovalTokenRecord,
    ) -> ApprovalResult<()> {
        if token.approval_request_id != request.id {
            return Err(ApprovalError::Storage(
                "token row does not reference its paired request".to_string(),
            ));
        }
        let mut inner = self.write();
        inner.order.push(request.id.clone());
        inner.tokens.insert(token.token_hash, token);
        inner.requests.insert(request.id.clone(), request);
        Ok(())
    }

    async fn consume_token(&self, hash: &TokenHash) -> ApprovalResult<ConsumeOutcome> {
        let mut inner = self.write();
        let Some(token) = inner.tokens.get_mut(hash) else {
            return Ok(ConsumeOutcome::Unknown);
        };
        if token.status != TokenStatus::Active {
            return Ok(ConsumeOutcome::NotActive(token.clone()));
        }
        token.status = TokenStatus::Used;
        token.used_at = Some(Timestamp::now());
        Ok(ConsumeOutcome::Consumed(token.clone()))
    }

    async fn get_request(&self, id: &ApprovalId) -> ApprovalResult<Option<ApprovalRequestRecord>> {
        Ok(self.read().requests.get(id).cloned())
    }

    async fn recent_requests(&self, limit: usize) -> ApprovalResult<Vec<ApprovalRequestRecord>> {
        let inner = self.read();
        Ok(inner
            .order
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| inner.requests.get(id).cloned())
            .collect())
    }
}

impl std::fmt::Debug for MemoryApprovalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.read();
        f.debug_struct("MemoryApprovalStore")
            .field("requests", &inner.requests.len())
            .field("tokens", &inner.tokens.len())
            .finish()
    }
}
