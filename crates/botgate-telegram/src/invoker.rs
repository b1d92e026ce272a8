//! The domain-operation boundary and its HTTP implementation.
//!
//! The pipeline sees only the [`Invoker`] trait: a resolved payload and
//! account reference go in, an opaque JSON result or an error comes out.
//! [`HttpInvoker`] is the real Bot API transport - plain HTTPS + JSON
//! with a per-request timeout and bounded, capped exponential backoff on
//! 429/5xx/transport failures, honoring Telegram's `retry_after` hint.

use async_trait::async_trait;
use botgate_core::AccountRef;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::InvokeError;

/// Executes a domain operation on behalf of an account.
///
/// One trait covers both Bot API method calls and MTProto domain
/// operations; implementations dispatch on `tool` as needed.
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Invoke `tool`/`operation` with `payload` as `account`.
    ///
    /// # Errors
    ///
    /// Any error is treated by the pipeline as an execution failure and
    /// propagated unchanged.
    async fn invoke(
        &self,
        account: &AccountRef,
        tool: &str,
        operation: &str,
        payload: &Value,
    ) -> Result<Value, InvokeError>;
}

/// Retry behaviour for transient Bot API failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Ceiling applied to the exponential backoff.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based), doubling from
    /// `base_delay` and capped at `max_delay`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let factor = 2u32.saturating_pow(shift);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    /// Three attempts, 500 ms doubling to a 10 s cap.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// How a single attempt failed.
enum AttemptError {
    /// Worth retrying (429/5xx/transport), with an optional server-provided
    /// delay hint.
    Retryable {
        error: InvokeError,
        delay_hint: Option<Duration>,
    },
    /// Not worth retrying; surface immediately.
    Fatal(InvokeError),
}

/// reqwest-backed Bot API invoker.
pub struct HttpInvoker {
    client: reqwest::Client,
    base_url: String,
    /// Bot tokens by account name, already unsealed by the credential
    /// collaborator.
    tokens: HashMap<String, String>,
    retry: RetryPolicy,
}

impl HttpInvoker {
    /// Default Bot API endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.telegram.org";

    /// Create an invoker.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the client cannot be
    /// constructed.
    pub fn new(
        base_url: impl Into<String>,
        tokens: HashMap<String, String>,
        request_timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            tokens,
            retry,
        })
    }

    async fn attempt(
        &self,
        token: &str,
        operation: &str,
        payload: &Value,
    ) -> Result<Value, AttemptError> {
        let url = format!("{}/bot{token}/{operation}", self.base_url);
        let response = match self.client.post(&url).json(payload).send().await {
            Ok(response) => response,
            Err(e) => {
                return Err(AttemptError::Retryable {
                    error: InvokeError::Transport(e),
                    delay_hint: None,
                })
            }
        };

        let status = response.status();
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) if status.is_server_error() => {
                // 5xx with an unreadable body is still worth retrying.
                return Err(AttemptError::Retryable {
                    error: InvokeError::Transport(e),
                    delay_hint: None,
                });
            }
            Err(_) => {
                return Err(AttemptError::Fatal(InvokeError::MalformedResponse {
                    reason: format!("non-JSON body with HTTP status {status}"),
                }))
            }
        };

        if body.get("ok").and_then(Value::as_bool) == Some(true) {
            return Ok(body.get("result").cloned().unwrap_or(Value::Null));
        }

        let error_code = body
            .get("error_code")
            .and_then(Value::as_i64)
            .unwrap_or_else(|| i64::from(status.as_u16()));
        let description = body
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("no description")
            .to_string();
        let api_error = InvokeError::Api {
            error_code,
            description,
        };

        if error_code == 429 {
            let delay_hint = body
                .pointer("/parameters/retry_after")
                .and_then(Value::as_u64)
                .map(Duration::from_secs);
            Err(AttemptError::Retryable {
                error: api_error,
                delay_hint,
            })
        } else if (500..600).contains(&error_code) {
            Err(AttemptError::Retryable {
                error: api_error,
                delay_hint: None,
            })
        } else {
            Err(AttemptError::Fatal(api_error))
        }
    }
}

#[async_trait]
impl Invoker for HttpInvoker {
    async fn invoke(
        &self,
        account: &AccountRef,
        _tool: &str,
        operation: &str,
        payload: &Value,
    ) -> Result<Value, InvokeError> {
        let token = self
            .tokens
            .get(account.as_str())
            .ok_or_else(|| InvokeError::UnknownAccount {
                account: account.to_string(),
            })?;

        let mut attempt = 0u32;
        loop {
            attempt = attempt.saturating_add(1);
            match self.attempt(token, operation, payload).await {
                Ok(result) => return Ok(result),
                Err(AttemptError::Fatal(error)) => return Err(error),
                Err(AttemptError::Retryable { error, delay_hint }) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(InvokeError::RetriesExhausted {
                            attempts: attempt,
                            last_error: error.to_string(),
                        });
                    }
                    let delay = delay_hint.unwrap_or_else(|| self.retry.delay_for(attempt));
                    tracing::warn!(
                        account = %account,
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "retrying Telegram call"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl std::fmt::Debug for HttpInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpInvoker")
            .field("base_url", &self.base_url)
            .field("accounts", &self.tokens.len())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Retry policy
    // -----------------------------------------------------------------------

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(2),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4), Duration::from_secs(2), "capped");
        assert_eq!(policy.delay_for(100), Duration::from_secs(2), "no overflow");
    }

    // -----------------------------------------------------------------------
    // Account resolution
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_unknown_account_fails_without_network() {
        let invoker = HttpInvoker::new(
            HttpInvoker::DEFAULT_BASE_URL,
            HashMap::new(),
            Duration::from_secs(5),
            RetryPolicy::default(),
        )
        .unwrap();
        let result = invoker
            .invoke(
                &AccountRef::new("missing"),
                "telegram.bot.queries",
                "getMe",
                &serde_json::json!({}),
            )
            .await;
        assert!(matches!(result, Err(InvokeError::UnknownAccount { .. })));
    }
}
