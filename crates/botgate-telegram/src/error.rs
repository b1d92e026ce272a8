//! Error types for the Telegram surface.

/// Errors from the method registry.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The method name is not in the known Bot API method set.
    #[error("unknown Bot API method '{method}'")]
    UnknownMethod {
        /// The rejected method name.
        method: String,
    },
}

/// Errors from invoking a domain operation.
///
/// The pipeline propagates these unchanged so the caller keeps the
/// upstream detail.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// No credentials are configured for the referenced account.
    #[error("no credentials configured for account '{account}'")]
    UnknownAccount {
        /// The unresolvable account name.
        account: String,
    },

    /// The HTTP transport failed (connect, TLS, timeout).
    #[error("transport error calling Telegram: {0}")]
    Transport(#[from] reqwest::Error),

    /// Telegram answered with a non-retryable API error.
    #[error("Telegram API error {error_code}: {description}")]
    Api {
        /// Telegram's `error_code`.
        error_code: i64,
        /// Telegram's `description`, verbatim.
        description: String,
    },

    /// The response body was not a Telegram API envelope.
    #[error("unparseable Telegram response: {reason}")]
    MalformedResponse {
        /// Why the body could not be interpreted.
        reason: String,
    },

    /// Retryable failures persisted through every allowed attempt.
    #[error("Telegram call failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// Description of the final failure.
        last_error: String,
    },
}
