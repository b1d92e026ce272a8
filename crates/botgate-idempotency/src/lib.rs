//! Botgate Idempotency - caching executed responses by caller key.
//!
//! A caller that retries a call with the same idempotency key gets the
//! previously cached response back without re-invoking the domain
//! operation or re-consuming an approval token. Only **execution** is
//! idempotent: authorization always re-runs, so a policy change can still
//! deny a request whose result would have been served from cache.
//!
//! Records expire after a configurable TTL (300 s by default). Writing is
//! an upsert - last write wins on key collision - but callers are expected
//! to pass a fresh key per logical operation. The pipeline never writes
//! the cache for a failed call, so a failed call is safe to retry with
//! the same key.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use async_trait::async_trait;
use botgate_core::Timestamp;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Longest accepted idempotency key.
pub const MAX_KEY_LEN: usize = 128;

/// Default record lifetime in seconds.
pub const DEFAULT_TTL_SECS: i64 = 300;

/// Errors raised by the idempotency cache.
#[derive(Debug, thiserror::Error)]
pub enum IdempotencyError {
    /// The caller-supplied key is empty or longer than [`MAX_KEY_LEN`].
    #[error("idempotency key must be 1..={MAX_KEY_LEN} characters, got {len}")]
    InvalidKey {
        /// Length of the rejected key.
        len: usize,
    },

    /// The backend failed to read or write a record.
    #[error("idempotency storage error: {0}")]
    Storage(String),
}

/// Result type for idempotency operations.
pub type IdempotencyResult<T> = Result<T, IdempotencyError>;

/// A validated caller-supplied idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Validate and wrap a key.
    ///
    /// # Errors
    ///
    /// Returns [`IdempotencyError::InvalidKey`] for an empty key or one
    /// longer than [`MAX_KEY_LEN`] characters.
    pub fn new(key: impl Into<String>) -> IdempotencyResult<Self> {
        let key = key.into();
        let len = key.chars().count();
        if len == 0 || len > MAX_KEY_LEN {
            return Err(IdempotencyError::InvalidKey { len });
        }
        Ok(Self(key))
    }

    /// The key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IdempotencyKey> for String {
    fn from(key: IdempotencyKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cached response row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// The caller's key.
    pub key: IdempotencyKey,
    /// Label of the operation that produced the response (forensics only;
    /// lookups are by key alone).
    pub operation: String,
    /// The cached response envelope.
    pub response: Value,
    /// When the record was written.
    pub created_at: Timestamp,
    /// When the record lapses.
    pub expires_at: Timestamp,
}

impl IdempotencyRecord {
    /// Whether this record has lapsed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_past()
    }
}

/// Storage contract for idempotency records.
///
/// Upserts must be atomic at the row level so that two simultaneous
/// writers of the same key resolve deterministically (last write wins).
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Fetch a record if present and unexpired.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    async fn get_unexpired(&self, key: &IdempotencyKey)
        -> IdempotencyResult<Option<IdempotencyRecord>>;

    /// Upsert a record, resetting its expiry.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    async fn upsert(&self, record: IdempotencyRecord) -> IdempotencyResult<()>;
}

/// In-memory reference implementation of [`IdempotencyStore`].
///
/// Expired rows are swept lazily while the write lock is already held.
#[derive(Default)]
pub struct MemoryIdempotencyStore {
    records: RwLock<HashMap<IdempotencyKey, IdempotencyRecord>>,
}

impl MemoryIdempotencyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (possibly expired, not yet swept) rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Whether the store holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IdempotencyStore for MemoryIdempotencyStore {
    async fn get_unexpired(
        &self,
        key: &IdempotencyKey,
    ) -> IdempotencyResult<Option<IdempotencyRecord>> {
        let records = self.records.read().unwrap_or_else(|e| {
            tracing::warn!("idempotency store lock poisoned, recovering");
            e.into_inner()
        });
        Ok(records.get(key).filter(|r| !r.is_expired()).cloned())
    }

    async fn upsert(&self, record: IdempotencyRecord) -> IdempotencyResult<()> {
        let mut records = self.records.write().unwrap_or_else(|e| {
            tracing::warn!("idempotency store lock poisoned, recovering");
            e.into_inner()
        });
        // Sweep expired rows while the write lock is held.
        records.retain(|_, r| !r.is_expired());
        records.insert(record.key.clone(), record);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryIdempotencyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryIdempotencyStore")
            .field("records", &self.len())
            .finish()
    }
}

/// TTL-aware cache facade used by the execution pipeline.
pub struct IdempotencyCache {
    store: Arc<dyn IdempotencyStore>,
    ttl: Duration,
}

impl IdempotencyCache {
    /// Create a cache with the given record lifetime.
    #[must_use]
    pub fn new(store: Arc<dyn IdempotencyStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Create a cache with the default 300-second lifetime.
    #[must_use]
    pub fn with_default_ttl(store: Arc<dyn IdempotencyStore>) -> Self {
        Self::new(store, Duration::seconds(DEFAULT_TTL_SECS))
    }

    /// Look up a cached response. Expired records read as absent.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    pub async fn try_get(&self, key: &IdempotencyKey) -> IdempotencyResult<Option<Value>> {
        Ok(self.store.get_unexpired(key).await?.map(|r| r.response))
    }

    /// Cache a response under the caller's key, resetting expiry.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    pub async fn save(
        &self,
        key: &IdempotencyKey,
        operation: &str,
        response: &Value,
    ) -> IdempotencyResult<()> {
        let now = Timestamp::now();
        let record = IdempotencyRecord {
            key: key.clone(),
            operation: operation.to_string(),
            response: response.clone(),
            created_at: now,
            expires_at: now.plus(self.ttl),
        };
        tracing::debug!(key = %key, operation, "idempotency record saved");
        self.store.upsert(record).await
    }
}

impl std::fmt::Debug for IdempotencyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdempotencyCache")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}
