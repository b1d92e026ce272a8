//! Canonical payload hashing.
//!
//! Approval grants are bound to the exact call arguments, not just the
//! action name. The binding is a SHA-256 over the RFC 8785 (JCS) canonical
//! serialization of the payload: object keys sorted recursively, array
//! order preserved, primitives in their literal representation. Reordering
//! object keys therefore does not change the hash; changing any value does.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{CryptoError, CryptoResult};

/// A SHA-256 payload digest (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadHash([u8; 32]);

impl PayloadHash {
    /// Hash a JSON payload in its canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Canonicalize`] if the value cannot be
    /// serialized (e.g. a non-finite float).
    pub fn of_payload(payload: &Value) -> CryptoResult<Self> {
        let canonical = serde_jcs::to_string(payload)?;
        Ok(Self::of_bytes(canonical.as_bytes()))
    }

    /// Hash raw bytes.
    #[must_use]
    pub fn of_bytes(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self(digest.into())
    }

    /// The raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
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
            what: "payload hash",
        })?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidLength {
                what: "payload hash",
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PayloadHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PayloadHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PayloadHash {
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
    use serde_json::json;

    #[test]
    fn test_key_order_independent() {
        let a = json!({"chatId": 5, "userId": 9});
        let b = json!({"userId": 9, "chatId": 5});
        assert_eq!(
            PayloadHash::of_payload(&a).unwrap(),
            PayloadHash::of_payload(&b).unwrap()
        );
    }

    #[test]
    fn test_nested_key_order_independent() {
        let a = json!({"outer": {"x": 1, "y": [1, 2, 3]}, "z": null});
        let b = json!({"z": null, "outer": {"y": [1, 2, 3], "x": 1}});
        assert_eq!(
            PayloadHash::of_payload(&a).unwrap(),
            PayloadHash::of_payload(&b).unwrap()
        );
    }

    #[test]
    fn test_array_order_preserved() {
        let a = json!({"ids": [1, 2]});
        let b = json!({"ids": [2, 1]});
        assert_ne!(
            PayloadHash::of_payload(&a).unwrap(),
            PayloadHash::of_payload(&b).unwrap()
        );
    }

    #[test]
    fn test_value_change_changes_hash() {
        let a = json!({"chatId": 5});
        let b = json!({"chatId": 6});
        assert_ne!(
            PayloadHash::of_payload(&a).unwrap(),
            PayloadHash::of_payload(&b).unwrap()
        );
    }

    #[test]
    fn test_hex_roundtrip() {
        let hash = PayloadHash::of_bytes(b"test");
        let back = PayloadHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, back);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(PayloadHash::from_hex("zz").is_err());
        assert!(PayloadHash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let hash = PayloadHash::of_bytes(b"test");
        let json = serde_json::to_value(hash).unwrap();
        assert!(json.is_string());
        let back: PayloadHash = serde_json::from_value(json).unwrap();
        assert_eq!(hash, back);
    }
}
