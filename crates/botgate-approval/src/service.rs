//! The approval service.

use botgate_core::{ApprovalId, Principal, RiskLevel, Timestamp, TokenId};
use botgate_crypto::{BearerSecret, PayloadHash, TokenHash};
use chrono::Duration;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{ApprovalError, ApprovalResult};
use crate::record::{ApprovalRequestRecord, ApprovalStatus, ApprovalTokenRecord, TokenStatus};
use crate::store::{ApprovalStore, ConsumeOutcome};

/// Configuration for the approval gate.
#[derive(Debug, Clone)]
pub struct ApprovalConfig {
    /// Master switch; when false nothing requires approval.
    pub enabled: bool,
    /// Lifetime of a grant (request and token expire together).
    pub ttl: Duration,
    /// Risk levels that require a token before execution.
    pub required_levels: BTreeSet<RiskLevel>,
}

impl Default for ApprovalConfig {
    /// Approvals on, five-minute grants, required for high and critical.
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::seconds(300),
            required_levels: [RiskLevel::High, RiskLevel::Critical].into_iter().collect(),
        }
    }
}

/// What the approving caller gets back, including the plaintext bearer
/// secret - the only time it is ever visible.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalGrant {
    /// Id of the recorded approval request.
    pub approval_id: ApprovalId,
    /// Plaintext bearer secret. Not retrievable again; storage holds only
    /// its hash.
    pub approval_token: String,
    /// When the grant lapses.
    pub expires_at: Timestamp,
}

/// Issues, verifies, and consumes approval grants.
pub struct ApprovalService {
    store: Arc<dyn ApprovalStore>,
    config: ApprovalConfig,
}

impl ApprovalService {
    /// Create a service over a store.
    #[must_use]
    pub fn new(store: Arc<dyn ApprovalStore>, config: ApprovalConfig) -> Self {
        Self { store, config }
    }

    /// Whether the given risk level requires a token before execution.
    #[must_use]
    pub fn is_approval_required(&self, risk: RiskLevel) -> bool {
        self.config.enabled && self.config.required_levels.contains(&risk)
    }

    /// Issue a grant for one specific `(principal, tool, operation, risk,
    /// payload)` action.
    ///
    /// The request row is recorded `approved` immediately: the caller of
    /// this flow is the signing authority. The bearer secret in the
    /// returned grant is shown exactly once.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be canonicalized or the
    /// store rejects the rows.
    pub async fn request_approval(
        &self,
        principal: &Principal,
        tool: &str,
        operation: &str,
        risk: RiskLevel,
        payload: &Value,
    ) -> ApprovalResult<ApprovalGrant> {
        let payload_hash = PayloadHash::of_payload(payload)?;
        let now = Timestamp::now();
        let expires_at = now.plus(self.config.ttl);

        let request = ApprovalRequestRecord {
            id: ApprovalId::new(),
            principal_subject: principal.subject.clone(),
            tool: tool.to_string(),
            operation: operation.to_string(),
            risk_level: risk,
            payload_hash,
            status: ApprovalStatus::Approved,
            expires_at,
            created_at: now,
        };

        let secret = BearerSecret::generate();
        let token = ApprovalTokenRecord {
            id: TokenId::new(),
            approval_request_id: request.id.clone(),
            token_hash: secret.hash(),
            status: TokenStatus::Active,
            expires_at,
            used_at: None,
        };

        let approval_id = request.id.clone();
        self.store.insert(request, token).await?;

        tracing::info!(
            approval_id = %approval_id,
            subject = %principal.subject,
            tool,
            operation,
            risk = %risk,
            %expires_at,
            "approval grant issued"
        );

        Ok(ApprovalGrant {
            approval_id,
            approval_token: secret.reveal(),
            expires_at,
        })
    }

    /// Verify a presented token against the executing call and consume it.
    ///
    /// Consumption happens first and is atomic: even when a later check
    /// fails, the token is burned - a grant that failed verification once
    /// must not be replayable against a different call.
    ///
    /// # Errors
    ///
    /// Each failure mode is distinct; see [`ApprovalError`]. None of them
    /// are retryable with the same token.
    pub async fn verify_and_consume(
        &self,
        presented_token: &str,
        principal: &Principal,
        tool: &str,
        operation: &str,
        risk: RiskLevel,
        payload: &Value,
    ) -> ApprovalResult<ApprovalId> {
        let hash = TokenHash::of_secret(presented_token);
        let token = match self.store.consume_token(&hash).await? {
            ConsumeOutcome::Unknown => return Err(ApprovalError::InvalidToken),
            ConsumeOutcome::NotActive(row) => {
                return Err(ApprovalError::TokenNotActive { status: row.status })
            }
            ConsumeOutcome::Consumed(row) => row,
        };

        if token.expires_at.is_past() {
            return Err(ApprovalError::TokenExpired);
        }

        let request = self
            .store
            .get_request(&token.approval_request_id)
            .await?
            .ok_or_else(|| ApprovalError::RequestMissing {
                id: token.approval_request_id.clone(),
            })?;

        if request.status != ApprovalStatus::Approved {
            return Err(ApprovalError::RequestNotApproved {
                status: request.status,
            });
        }
        if request.principal_subject != principal.subject {
            return Err(ApprovalError::PrincipalMismatch);
        }
        if request.tool != tool || request.operation != operation {
            return Err(ApprovalError::ActionMismatch {
                approved_tool: request.tool,
                approved_operation: request.operation,
            });
        }
        if request.risk_level != risk {
            return Err(ApprovalError::RiskMismatch {
                approved: request.risk_level,
                presented: risk,
            });
        }
        let presented_hash = PayloadHash::of_payload(payload)?;
        if request.payload_hash != presented_hash {
            return Err(ApprovalError::PayloadMismatch);
        }
        if request.expires_at.is_past() {
            return Err(ApprovalError::RequestExpired);
        }

        tracing::info!(
            approval_id = %request.id,
            subject = %principal.subject,
            tool,
            operation,
            "approval token consumed"
        );

        Ok(request.id)
    }

    /// Current status of a recorded approval request.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    pub async fn approval_status(&self, id: &ApprovalId) -> ApprovalResult<Option<ApprovalStatus>> {
        Ok(self.store.get_request(id).await?.map(|r| r.status))
    }

    /// The most recent approval requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend fails.
    pub async fn list_recent(&self, limit: usize) -> ApprovalResult<Vec<ApprovalRequestRecord>> {
        self.store.recent_requests(limit).await
    }
}

impl std::fmt::Debug for ApprovalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryApprovalStore;
    use botgate_core::{AuthSource, Role};
    use serde_json::json;

    fn admin() -> Principal {
        Principal::new("alice", [Role::Admin], "acme", AuthSource::Oidc)
    }

    fn service() -> ApprovalService {
        ApprovalService::new(Arc::new(MemoryApprovalStore::new()), ApprovalConfig::default())
    }

    fn short_lived_service() -> ApprovalService {
        let config = ApprovalConfig {
            ttl: Duration::seconds(-1),
            ..ApprovalConfig::default()
        };
        ApprovalService::new(Arc::new(MemoryApprovalStore::new()), config)
    }

    // -----------------------------------------------------------------------
    // is_approval_required
    // -----------------------------------------------------------------------

    #[test]
    fn test_required_levels() {
        let service = service();
        assert!(!service.is_approval_required(RiskLevel::Low));
        assert!(!service.is_approval_required(RiskLevel::Medium));
        assert!(service.is_approval_required(RiskLevel::High));
        assert!(service.is_approval_required(RiskLevel::Critical));
    }

    #[test]
    fn test_disabled_requires_nothing() {
        let config = ApprovalConfig {
            enabled: false,
            ..ApprovalConfig::default()
        };
        let service = ApprovalService::new(Arc::new(MemoryApprovalStore::new()), config);
        assert!(!service.is_approval_required(RiskLevel::Critical));
    }

    // -----------------------------------------------------------------------
    // Issuance + happy-path consumption
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_request_then_consume() {
        let service = service();
        let payload = json!({"chatId": 5, "userId": 9});
        let grant = service
            .request_approval(
                &admin(),
                "telegram.bot.members",
                "banChatMember",
                RiskLevel::High,
                &payload,
            )
            .await
            .unwrap();

        let approval_id = service
            .verify_and_consume(
                &grant.approval_token,
                &admin(),
                "telegram.bot.members",
                "banChatMember",
                RiskLevel::High,
                &payload,
            )
            .await
            .unwrap();
        assert_eq!(approval_id, grant.approval_id);
    }

    #[tokio::test]
    async fn test_key_order_does_not_break_binding() {
        let service = service();
        let grant = service
            .request_approval(
                &admin(),
                "telegram.bot.members",
                "banChatMember",
                RiskLevel::High,
                &json!({"chatId": 5, "userId": 9}),
            )
            .await
            .unwrap();

        // Same payload, keys swapped: canonical hash is order-independent.
        let result = service
            .verify_and_consume(
                &grant.approval_token,
                &admin(),
                "telegram.bot.members",
                "banChatMember",
                RiskLevel::High,
                &json!({"userId": 9, "chatId": 5}),
            )
            .await;
        assert!(result.is_ok());
    }

    // -----------------------------------------------------------------------
    // Single use
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_second_consume_fails() {
        let service = service();
        let payload = json!({"chatId": 5});
        let grant = service
            .request_approval(&admin(), "t", "op", RiskLevel::High, &payload)
            .await
            .unwrap();

        service
            .verify_and_consume(&grant.approval_token, &admin(), "t", "op", RiskLevel::High, &payload)
            .await
            .unwrap();

        let second = service
            .verify_and_consume(&grant.approval_token, &admin(), "t", "op", RiskLevel::High, &payload)
            .await;
        assert!(matches!(
            second,
            Err(ApprovalError::TokenNotActive {
                status: TokenStatus::Used
            })
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_consume_has_one_winner() {
        let service = Arc::new(service());
        let payload = json!({"chatId": 5});
        let grant = service
            .request_approval(&admin(), "t", "op", RiskLevel::High, &payload)
            .await
            .unwrap();
        let token = Arc::new(grant.approval_token);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let service = Arc::clone(&service);
            let token = Arc::clone(&token);
            let payload = payload.clone();
            handles.push(tokio::spawn(async move {
                service
                    .verify_and_consume(&token, &admin(), "t", "op", RiskLevel::High, &payload)
                    .await
                    .is_ok()
            }));
        }
        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    // -----------------------------------------------------------------------
    // Mismatches - each a distinct error
    // -----------------------------------------------------------------------

    async fn granted(service: &ApprovalService) -> ApprovalGrant {
        service
            .request_approval(
                &admin(),
                "telegram.bot.members",
                "banChatMember",
                RiskLevel::High,
                &json!({"chatId": 5}),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let service = service();
        let result = service
            .verify_and_consume(
                "not-a-real-token",
                &admin(),
                "telegram.bot.members",
                "banChatMember",
                RiskLevel::High,
                &json!({"chatId": 5}),
            )
            .await;
        assert!(matches!(result, Err(ApprovalError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_principal_mismatch() {
        let service = service();
        let grant = granted(&service).await;
        let mallory = Principal::new("mallory", [Role::Admin], "acme", AuthSource::Oidc);
        let result = service
            .verify_and_consume(
                &grant.approval_token,
                &mallory,
                "telegram.bot.members",
                "banChatMember",
                RiskLevel::High,
                &json!({"chatId": 5}),
            )
            .await;
        assert!(matches!(result, Err(ApprovalError::PrincipalMismatch)));
    }

    #[tokio::test]
    async fn test_action_mismatch() {
        let service = service();
        let grant = granted(&service).await;
        let result = service
            .verify_and_consume(
                &grant.approval_token,
                &admin(),
                "telegram.bot.members",
                "unbanChatMember",
                RiskLevel::High,
                &json!({"chatId": 5}),
            )
            .await;
        assert!(matches!(result, Err(ApprovalError::ActionMismatch { .. })));
    }

    #[tokio::test]
    async fn test_risk_mismatch() {
        let service = service();
        let grant = granted(&service).await;
        let result = service
            .verify_and_consume(
                &grant.approval_token,
                &admin(),
                "telegram.bot.members",
                "banChatMember",
                RiskLevel::Critical,
                &json!({"chatId": 5}),
            )
            .await;
        assert!(matches!(result, Err(ApprovalError::RiskMismatch { .. })));
    }

    #[tokio::test]
    async fn test_payload_mismatch() {
        let service = service();
        let grant = granted(&service).await;
        let result = service
            .verify_and_consume(
                &grant.approval_token,
                &admin(),
                "telegram.bot.members",
                "banChatMember",
                RiskLevel::High,
                &json!({"chatId": 6}),
            )
            .await;
        assert!(matches!(result, Err(ApprovalError::PayloadMismatch)));
    }

    #[tokio::test]
    async fn test_expired_token_is_distinct_from_invalid() {
        let service = short_lived_service();
        let grant = granted(&service).await;
        let result = service
            .verify_and_consume(
                &grant.approval_token,
                &admin(),
                "telegram.bot.members",
                "banChatMember",
                RiskLevel::High,
                &json!({"chatId": 5}),
            )
            .await;
        assert!(matches!(result, Err(ApprovalError::TokenExpired)));
    }

    // -----------------------------------------------------------------------
    // Projections
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_status_and_recent() {
        let service = service();
        let grant = granted(&service).await;
        assert_eq!(
            service.approval_status(&grant.approval_id).await.unwrap(),
            Some(ApprovalStatus::Approved)
        );
        assert!(service
            .approval_status(&ApprovalId::new())
            .await
            .unwrap()
            .is_none());

        let recent = service.list_recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, grant.approval_id);
    }
}
