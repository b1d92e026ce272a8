//! Error types for cryptographic operations.

/// Errors raised by hashing, token, and sealing operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The payload could not be canonicalized to RFC 8785 JSON.
    #[error("payload canonicalization failed: {0}")]
    Canonicalize(#[from] serde_json::Error),

    /// Encryption failed (key or RNG failure).
    #[error("encryption failed")]
    Encrypt,

    /// The ciphertext or its header was modified after sealing.
    ///
    /// Decryption fails closed: there is no plaintext to return and the
    /// envelope must be treated as hostile.
    #[error("ciphertext integrity check failed")]
    Tampered,

    /// The envelope names a key id this sealer does not hold.
    #[error("unknown sealing key id '{key_id}'")]
    UnknownKey {
        /// Key id found in the envelope.
        key_id: String,
    },

    /// The envelope does not have the expected `v1.<key>.<nonce>.<ct>` shape.
    #[error("malformed sealed envelope: {reason}")]
    MalformedEnvelope {
        /// What was wrong with the envelope.
        reason: String,
    },

    /// A hash or key string did not decode to the expected length.
    #[error("invalid {what} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// What was being decoded.
        what: &'static str,
        /// Expected byte length.
        expected: usize,
        /// Actual byte length.
        actual: usize,
    },

    /// A hex or base64 string failed to decode.
    #[error("invalid {what} encoding")]
    InvalidEncoding {
        /// What was being decoded.
        what: &'static str,
    },
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
