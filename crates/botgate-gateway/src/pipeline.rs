//! The execution pipeline and the sibling approval-request flow.

use botgate_approval::{ApprovalGrant, ApprovalService};
use botgate_audit::{AuditAction, AuditEvent, AuditSink};
use botgate_core::{ApprovalId, Principal, RiskLevel, Role, ToolCall};
use botgate_idempotency::{IdempotencyCache, IdempotencyKey};
use botgate_policy::{PolicyDecision, PolicyEngine};
use botgate_risk::RiskClassifier;
use botgate_telegram::{Invoker, MethodRegistry};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::envelope::{ResponseEnvelope, ToolOutcome};
use crate::error::{GatewayError, GatewayResult};

/// A request for a pre-authorized approval grant: the exact future call
/// the grant will be bound to.
#[derive(Debug, Clone)]
pub struct ApprovalRequestCall {
    /// Tool the grant is for.
    pub tool: String,
    /// Operation the grant is for.
    pub operation: String,
    /// Exact payload the grant is bound to (canonical hash).
    pub payload: Value,
}

/// Composes risk, policy, audit, idempotency, approval, and the domain
/// invoker into one strictly ordered flow per invocation.
pub struct ExecutionPipeline {
    classifier: RiskClassifier,
    methods: &'static MethodRegistry,
    policy: Arc<PolicyEngine>,
    approvals: Arc<ApprovalService>,
    idempotency: Arc<IdempotencyCache>,
    audit: Arc<dyn AuditSink>,
    invoker: Arc<dyn Invoker>,
    /// Tools under this prefix resolve risk from the static method table
    /// instead of the pattern classifier.
    bot_tool_prefix: String,
}

impl ExecutionPipeline {
    /// Default prefix for Bot API tools.
    pub const BOT_TOOL_PREFIX: &'static str = "telegram.bot";

    /// Wire up a pipeline.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        classifier: RiskClassifier,
        methods: &'static MethodRegistry,
        policy: Arc<PolicyEngine>,
        approvals: Arc<ApprovalService>,
        idempotency: Arc<IdempotencyCache>,
        audit: Arc<dyn AuditSink>,
        invoker: Arc<dyn Invoker>,
    ) -> Self {
        Self {
            classifier,
            methods,
            policy,
            approvals,
            idempotency,
            audit,
            invoker,
            bot_tool_prefix: Self::BOT_TOOL_PREFIX.to_string(),
        }
    }

    /// Execute one tool call through the full pipeline.
    ///
    /// # Errors
    ///
    /// See [`GatewayError`] for the taxonomy. Every failure that reaches
    /// policy evaluation has already produced its `tool_authorize` audit
    /// event; every failure of the domain call has produced its
    /// `tool_execute` event before the error surfaces.
    pub async fn execute(
        &self,
        principal: &Principal,
        call: &ToolCall,
    ) -> GatewayResult<ToolOutcome> {
        // Step 1: risk.
        let risk = self.resolve_risk(call)?;

        // Step 2: policy.
        let decision = self
            .policy
            .evaluate(principal, &call.tool, &call.operation, risk);

        // Step 3: the authorize event is written for every attempt,
        // allowed or denied. A failing sink aborts the call rather than
        // proceeding unaudited.
        self.audit
            .record(self.authorize_event(principal, call, risk, &decision))
            .await?;

        // Step 4: denial is terminal.
        if !decision.allow {
            return Err(GatewayError::PolicyDenied {
                reason: decision.reason,
            });
        }

        // Step 5: dry-run short circuit - no idempotency, no approval,
        // no domain call.
        if call.dry_run {
            let envelope = ResponseEnvelope {
                ok: true,
                tool: call.tool.clone(),
                operation: call.operation.clone(),
                risk_level: risk,
                approval_id: None,
                result: json!({ "would_execute": true }),
            };
            return Ok(ToolOutcome::DryRun {
                envelope: envelope.to_value(),
            });
        }

        // Step 6: idempotent replay. Authorization above has already
        // re-run, so a revoked principal cannot read a cached result.
        let idempotency_key = match &call.idempotency_key {
            Some(raw) => {
                let key = IdempotencyKey::new(raw.clone())?;
                if let Some(envelope) = self.idempotency.try_get(&key).await? {
                    tracing::debug!(key = %key, "idempotent replay");
                    return Ok(ToolOutcome::IdempotentReplay { envelope });
                }
                Some(key)
            }
            None => None,
        };

        // Step 7: approval gate.
        let approval_id = if self.approvals.is_approval_required(risk) && !call.approval_exempt {
            let token = call
                .approval_token
                .as_deref()
                .ok_or(GatewayError::ApprovalRequired { risk })?;
            Some(
                self.approvals
                    .verify_and_consume(
                        token,
                        principal,
                        &call.tool,
                        &call.operation,
                        risk,
                        &call.payload,
                    )
                    .await?,
            )
        } else {
            None
        };

        // Step 8: the domain operation.
        let result = self
            .invoker
            .invoke(&call.account, &call.tool, &call.operation, &call.payload)
            .await;

        match result {
            Ok(result) => {
                // Step 9: envelope, cache, execute event, return.
                let envelope = ResponseEnvelope {
                    ok: true,
                    tool: call.tool.clone(),
                    operation: call.operation.clone(),
                    risk_level: risk,
                    approval_id: approval_id.clone(),
                    result,
                }
                .to_value();

                if let Some(key) = &idempotency_key {
                    self.idempotency
                        .save(key, &call.action_key(), &envelope)
                        .await?;
                }

                self.record_execute_event(
                    self.execute_event(principal, call, risk, true, "executed")
                        .with_approval_opt(approval_id),
                )
                .await;

                Ok(ToolOutcome::Executed { envelope })
            }
            Err(error) => {
                // Step 10: the execute event is written first, then the
                // original error is re-thrown unchanged. No cache write,
                // so the same key is safe to retry.
                self.record_execute_event(
                    self.execute_event(principal, call, risk, false, error.to_string())
                        .with_approval_opt(approval_id)
                        .with_metadata("error", json!(error.to_string())),
                )
                .await;
                Err(GatewayError::DomainOperation(error))
            }
        }
    }

    /// The sibling approval-request flow: a privileged caller pre-obtains
    /// a single-use token for one specific future call.
    ///
    /// # Errors
    ///
    /// Fails with [`GatewayError::PolicyDenied`] unless the principal
    /// holds `owner` or `admin`; otherwise propagates approval-service
    /// and audit failures.
    pub async fn request_approval(
        &self,
        principal: &Principal,
        call: &ApprovalRequestCall,
    ) -> GatewayResult<ApprovalGrant> {
        let privileged = principal.has_role(Role::Owner) || principal.has_role(Role::Admin);
        if !privileged {
            let reason = "approval requests require the owner or admin role";
            self.audit
                .record(AuditEvent::new(
                    principal.subject.clone(),
                    AuditAction::ApprovalRequest,
                    call.tool.clone(),
                    call.operation.clone(),
                    false,
                    reason,
                ))
                .await?;
            return Err(GatewayError::PolicyDenied {
                reason: reason.to_string(),
            });
        }

        let risk = self.resolve_risk_for(&call.tool, &call.operation)?;
        let grant = self
            .approvals
            .request_approval(principal, &call.tool, &call.operation, risk, &call.payload)
            .await?;

        self.audit
            .record(
                AuditEvent::new(
                    principal.subject.clone(),
                    AuditAction::ApprovalRequest,
                    call.tool.clone(),
                    call.operation.clone(),
                    true,
                    "approval grant issued",
                )
                .with_risk(risk)
                .with_approval(grant.approval_id.clone()),
            )
            .await?;

        Ok(grant)
    }

    /// Resolve the risk level for a call.
    fn resolve_risk(&self, call: &ToolCall) -> GatewayResult<RiskLevel> {
        self.resolve_risk_for(&call.tool, &call.operation)
    }

    fn resolve_risk_for(&self, tool: &str, operation: &str) -> GatewayResult<RiskLevel> {
        if tool.starts_with(&self.bot_tool_prefix) {
            // Bot API methods carry a precomputed risk; unknown names are
            // rejected instead of classified.
            Ok(self.methods.require(operation)?.risk)
        } else {
            Ok(self.classifier.classify(tool, operation, None))
        }
    }

    fn authorize_event(
        &self,
        principal: &Principal,
        call: &ToolCall,
        risk: RiskLevel,
        decision: &PolicyDecision,
    ) -> AuditEvent {
        let mut event = AuditEvent::new(
            principal.subject.clone(),
            AuditAction::ToolAuthorize,
            call.tool.clone(),
            call.operation.clone(),
            decision.allow,
            decision.reason.clone(),
        )
        .with_risk(risk);
        if let Some(context) = &call.client_context {
            event = event.with_client_context(context.clone());
        }
        if let Some(rule) = &decision.matched_rule {
            event = event.with_metadata(
                "matched_rule",
                serde_json::to_value(rule).unwrap_or(Value::Null),
            );
        }
        event
    }

    fn execute_event(
        &self,
        principal: &Principal,
        call: &ToolCall,
        risk: RiskLevel,
        allowed: bool,
        reason: impl Into<String>,
    ) -> AuditEvent {
        let mut event = AuditEvent::new(
            principal.subject.clone(),
            AuditAction::ToolExecute,
            call.tool.clone(),
            call.operation.clone(),
            allowed,
            reason,
        )
        .with_risk(risk);
        if let Some(context) = &call.client_context {
            event = event.with_client_context(context.clone());
        }
        event
    }

    /// Execute events are written best-effort: by this point the domain
    /// side effect has already happened (or failed), and the caller must
    /// get the real outcome rather than a sink error.
    async fn record_execute_event(&self, event: AuditEvent) {
        if let Err(e) = self.audit.record(event).await {
            tracing::error!(error = %e, "failed to record execute audit event");
        }
    }
}

impl std::fmt::Debug for ExecutionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionPipeline")
            .field("bot_tool_prefix", &self.bot_tool_prefix)
            .finish_non_exhaustive()
    }
}

/// Small extension to thread an optional approval id into an event.
trait WithApprovalOpt {
    fn with_approval_opt(self, approval_id: Option<ApprovalId>) -> Self;
}

impl WithApprovalOpt for AuditEvent {
    fn with_approval_opt(self, approval_id: Option<ApprovalId>) -> Self {
        match approval_id {
            Some(id) => self.with_approval(id),
            None => self,
        }
    }
}
