//! Bearer secrets for single-use approval tokens.
//!
//! The plaintext secret leaves this module exactly once, at issuance.
//! Storage only ever holds the SHA-256 of the secret; verification hashes
//! the presented secret and compares against stored hashes in constant
//! time.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// Number of random bytes in a bearer secret.
const SECRET_LEN: usize = 32;

/// A plaintext bearer secret (base64url of 32 random bytes).
///
/// Zeroed on drop. Deliberately not `Clone`, `Serialize`, or `Display`:
/// the one legitimate way out is [`BearerSecret::reveal`], called by the
/// issuance path when building the response to the approving caller.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct BearerSecret(String);

impl BearerSecret {
    /// Generate a fresh random secret.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        let encoded = {
            use base64::Engine;
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
        };
        bytes.zeroize();
        Self(encoded)
    }

    /// The hash under which this secret is stored.
    #[must_use]
    pub fn hash(&self) -> TokenHash {
        TokenHash::of_secret(&self.0)
    }

    /// Consume the secret, returning the plaintext for the issuance
    /// response.
    #[must_use]
    pub fn reveal(mut self) -> String {
        std::mem::take(&mut self.0)
    }
}

impl fmt::Debug for BearerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerSecret(..)")
    }
}

/// SHA-256 of a bearer secret's text form.
#[derive(Clone, Copy, Eq)]
pub struct TokenHash([u8; 32]);

impl TokenHash {
    /// Hash a presented secret.
    #[must_use]
    pub fn of_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        Self(digest.into())
    }

    /// Encode as lowercase hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode from hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not 64 hex characters.
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidEncoding {
            what: "token hash",
        })?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidLength {
                what: "token hash",
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

impl PartialEq for TokenHash {
    /// Constant-time comparison. Token hashes gate authorization, so the
    /// comparison must not leak a matching prefix through timing.
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl std::hash::Hash for TokenHash {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Digest prefix only; full token hashes stay out of logs.
        write!(f, "TokenHash({})", &self.to_hex()[..12])
    }
}

impl Serialize for TokenHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TokenHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        let a = BearerSecret::generate();
        let b = BearerSecret::generate();
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_hash_matches_revealed_secret() {
        let secret = BearerSecret::generate();
        let stored = secret.hash();
        let plaintext = secret.reveal();
        assert_eq!(stored, TokenHash::of_secret(&plaintext));
    }

    #[test]
    fn test_wrong_secret_does_not_match() {
        let stored = BearerSecret::generate().hash();
        assert_ne!(stored, TokenHash::of_secret("guessed"));
    }

    #[test]
    fn test_hex_roundtrip() {
        let hash = TokenHash::of_secret("abc");
        assert_eq!(hash, TokenHash::from_hex(&hash.to_hex()).unwrap());
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = BearerSecret::generate();
        assert_eq!(format!("{secret:?}"), "BearerSecret(..)");
        let hash = secret.hash();
        assert!(format!("{hash:?}").len() < 30);
    }
}
