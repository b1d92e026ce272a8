//! Approval grant lifecycle: single use, payload binding, expiry, and
//! concurrent consumption.

mod common;

use botgate_approval::{
    ApprovalConfig, ApprovalError, ApprovalService, ApprovalStatus, MemoryApprovalStore,
    TokenStatus,
};
use botgate_core::{RiskLevel, Role};
use chrono::Duration;
use common::principal;
use serde_json::json;
use std::sync::Arc;

fn service() -> ApprovalService {
    ApprovalService::new(
        Arc::new(MemoryApprovalStore::new()),
        ApprovalConfig::default(),
    )
}

// ---------------------------------------------------------------------------
// Scenario: canonical payload binding
// ---------------------------------------------------------------------------

/// requestApproval for {chatId:5,userId:9} returns token T;
/// verifyAndConsume with {userId:9,chatId:5} (key order swapped)
/// succeeds; a second verifyAndConsume with T fails.
#[tokio::test]
async fn key_order_independence_and_single_use() {
    let service = service();
    let alice = principal("alice", &[Role::Admin]);

    let grant = service
        .request_approval(
            &alice,
            "telegram.bot.members",
            "banChatMember",
            RiskLevel::High,
            &json!({"chatId": 5, "userId": 9}),
        )
        .await
        .unwrap();

    let consumed = service
        .verify_and_consume(
            &grant.approval_token,
            &alice,
            "telegram.bot.members",
            "banChatMember",
            RiskLevel::High,
            &json!({"userId": 9, "chatId": 5}),
        )
        .await;
    assert!(consumed.is_ok(), "canonical hash ignores key order");

    let again = service
        .verify_and_consume(
            &grant.approval_token,
            &alice,
            "telegram.bot.members",
            "banChatMember",
            RiskLevel::High,
            &json!({"userId": 9, "chatId": 5}),
        )
        .await;
    assert!(matches!(
        again,
        Err(ApprovalError::TokenNotActive {
            status: TokenStatus::Used
        })
    ));
}

#[tokio::test]
async fn different_payload_is_a_payload_mismatch() {
    let service = service();
    let alice = principal("alice", &[Role::Admin]);
    let grant = service
        .request_approval(
            &alice,
            "telegram.bot.members",
            "banChatMember",
            RiskLevel::High,
            &json!({"chatId": 5, "userId": 9}),
        )
        .await
        .unwrap();

    let result = service
        .verify_and_consume(
            &grant.approval_token,
            &alice,
            "telegram.bot.members",
            "banChatMember",
            RiskLevel::High,
            &json!({"chatId": 5, "userId": 10}),
        )
        .await;
    assert!(matches!(result, Err(ApprovalError::PayloadMismatch)));
}

// ---------------------------------------------------------------------------
// Expiry is distinct from invalidity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn expired_grant_yields_expiry_error_not_invalid_token() {
    let config = ApprovalConfig {
        ttl: Duration::seconds(-1),
        ..ApprovalConfig::default()
    };
    let service = ApprovalService::new(Arc::new(MemoryApprovalStore::new()), config);
    let alice = principal("alice", &[Role::Admin]);
    let grant = service
        .request_approval(&alice, "t", "op", RiskLevel::High, &json!({}))
        .await
        .unwrap();

    let result = service
        .verify_and_consume(&grant.approval_token, &alice, "t", "op", RiskLevel::High, &json!({}))
        .await;
    assert!(matches!(result, Err(ApprovalError::TokenExpired)));

    // A token that never existed reads differently.
    let unknown = service
        .verify_and_consume("made-up-token", &alice, "t", "op", RiskLevel::High, &json!({}))
        .await;
    assert!(matches!(unknown, Err(ApprovalError::InvalidToken)));
}

// ---------------------------------------------------------------------------
// Concurrent consumption
// ---------------------------------------------------------------------------

/// Sixteen tasks race to consume one token; exactly one wins.
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_consumers_have_exactly_one_winner() {
    let service = Arc::new(service());
    let alice = principal("alice", &[Role::Admin]);
    let payload = json!({"chatId": 5});
    let grant = service
        .request_approval(&alice, "t", "op", RiskLevel::High, &payload)
        .await
        .unwrap();
    let token = Arc::new(grant.approval_token);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = Arc::clone(&service);
        let token = Arc::clone(&token);
        let alice = alice.clone();
        let payload = payload.clone();
        handles.push(tokio::spawn(async move {
            service
                .verify_and_consume(&token, &alice, "t", "op", RiskLevel::High, &payload)
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

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_survives_consumption() {
    let service = service();
    let alice = principal("alice", &[Role::Admin]);
    let payload = json!({"chatId": 5});
    let grant = service
        .request_approval(&alice, "t", "op", RiskLevel::High, &payload)
        .await
        .unwrap();

    service
        .verify_and_consume(&grant.approval_token, &alice, "t", "op", RiskLevel::High, &payload)
        .await
        .unwrap();

    // The request row is unchanged by consumption; only the token row
    // flipped.
    assert_eq!(
        service.approval_status(&grant.approval_id).await.unwrap(),
        Some(ApprovalStatus::Approved)
    );
    let recent = service.list_recent(5).await.unwrap();
    assert_eq!(recent.len(), 1);
}
