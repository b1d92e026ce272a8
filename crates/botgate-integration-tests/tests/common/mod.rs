//! Shared harness for the end-to-end suites.

// Not every suite uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use botgate_approval::{ApprovalConfig, ApprovalService, MemoryApprovalStore};
use botgate_audit::{AuditSink, MemoryAuditSink};
use botgate_core::{AccountRef, AuthSource, Principal, Role, ToolCall};
use botgate_gateway::ExecutionPipeline;
use botgate_idempotency::{IdempotencyCache, MemoryIdempotencyStore};
use botgate_policy::{PolicyEngine, PolicyEngineConfig, ToolPermission};
use botgate_risk::RiskClassifier;
use botgate_telegram::{InvokeError, Invoker, MethodRegistry};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Invoker double: counts invocations, optionally fails every call.
pub struct CountingInvoker {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingInvoker {
    pub fn ok() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Invoker for CountingInvoker {
    async fn invoke(
        &self,
        _account: &AccountRef,
        _tool: &str,
        _operation: &str,
        payload: &Value,
    ) -> Result<Value, InvokeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(InvokeError::Api {
                error_code: 400,
                description: "Bad Request: chat not found".to_string(),
            })
        } else {
            Ok(json!({"echo": payload}))
        }
    }
}

/// Fully wired pipeline plus handles to its observable collaborators.
pub struct Harness {
    pub pipeline: ExecutionPipeline,
    pub audit: Arc<MemoryAuditSink>,
    pub invoker: Arc<CountingInvoker>,
    pub policy: Arc<PolicyEngine>,
}

pub fn harness_with(invoker: CountingInvoker, rules: Vec<ToolPermission>) -> Harness {
    let audit = Arc::new(MemoryAuditSink::new());
    let invoker = Arc::new(invoker);
    let policy = Arc::new(PolicyEngine::new(PolicyEngineConfig::default(), rules));
    let approvals = Arc::new(ApprovalService::new(
        Arc::new(MemoryApprovalStore::new()),
        ApprovalConfig::default(),
    ));
    let idempotency = Arc::new(IdempotencyCache::with_default_ttl(Arc::new(
        MemoryIdempotencyStore::new(),
    )));
    let pipeline = ExecutionPipeline::new(
        RiskClassifier::standard(),
        MethodRegistry::global(),
        Arc::clone(&policy),
        approvals,
        idempotency,
        Arc::clone(&audit) as Arc<dyn AuditSink>,
        Arc::clone(&invoker) as Arc<dyn Invoker>,
    );
    Harness {
        pipeline,
        audit,
        invoker,
        policy,
    }
}

pub fn harness(invoker: CountingInvoker) -> Harness {
    harness_with(invoker, vec![])
}

pub fn principal(subject: &str, roles: &[Role]) -> Principal {
    Principal::new(subject, roles.iter().copied(), "acme", AuthSource::Oidc)
}

pub fn call(tool: &str, operation: &str, payload: Value) -> ToolCall {
    ToolCall::new(AccountRef::new("main"), tool, operation, payload)
}
