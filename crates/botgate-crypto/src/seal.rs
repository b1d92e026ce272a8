//! Credential sealing - AES-256-GCM with key rotation.
//!
//! Account credentials (bot tokens, MTProto session material) are sealed
//! before they reach durable storage. The envelope is
//!
//! ```text
//! v1.<key-id>.<nonce-b64>.<ciphertext-b64>
//! ```
//!
//! The header (`v1.<key-id>`) is bound into the AEAD as associated data,
//! so swapping key ids or version tags between envelopes is detected the
//! same way as ciphertext tampering. During rotation the sealer holds the
//! new primary plus the previous key; the embedded key id selects the
//! right key directly, and an id the sealer does not hold fails closed
//! with [`CryptoError::UnknownKey`] rather than falling back silently.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// Envelope format version tag.
const ENVELOPE_VERSION: &str = "v1";

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// A named 256-bit sealing key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SealKey {
    /// Identifier embedded in envelopes sealed under this key.
    #[zeroize(skip)]
    id: String,
    /// Raw key material.
    key: [u8; 32],
}

impl SealKey {
    /// Create a key from raw bytes.
    #[must_use]
    pub fn new(id: impl Into<String>, key: [u8; 32]) -> Self {
        Self { id: id.into(), key }
    }

    /// Create a key from a base64-encoded string (standard alphabet).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid base64 or does not
    /// decode to exactly 32 bytes.
    pub fn from_base64(id: impl Into<String>, encoded: &str) -> CryptoResult<Self> {
        use base64::Engine;
        let mut bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| CryptoError::InvalidEncoding { what: "seal key" })?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidLength {
                what: "seal key",
                expected: 32,
                actual: bytes.len(),
            })?;
        bytes.zeroize();
        Ok(Self::new(id, arr))
    }

    /// The key id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new((&self.key).into())
    }
}

impl std::fmt::Debug for SealKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealKey").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Seals and opens credential envelopes with rotation support.
#[derive(Debug)]
pub struct CredentialSealer {
    /// Key used for all new envelopes.
    primary: SealKey,
    /// Previous key, kept so envelopes sealed before a rotation still open.
    previous: Option<SealKey>,
}

impl CredentialSealer {
    /// Create a sealer with a single key.
    #[must_use]
    pub fn new(primary: SealKey) -> Self {
        Self {
            primary,
            previous: None,
        }
    }

    /// Create a sealer mid-rotation: new envelopes use `primary`, existing
    /// envelopes under `previous` still open.
    #[must_use]
    pub fn with_previous(primary: SealKey, previous: SealKey) -> Self {
        Self {
            primary,
            previous: Some(previous),
        }
    }

    /// Seal a plaintext under the primary key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Encrypt`] if encryption fails.
    pub fn seal(&self, plaintext: &[u8]) -> CryptoResult<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let header = format!("{ENVELOPE_VERSION}.{}", self.primary.id());
        let ciphertext = self
            .primary
            .cipher()
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: header.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::Encrypt)?;

        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD;
        Ok(format!(
            "{header}.{}.{}",
            b64.encode(nonce_bytes),
            b64.encode(ciphertext)
        ))
    }

    /// Open a sealed envelope.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::MalformedEnvelope`] if the envelope does not parse.
    /// - [`CryptoError::UnknownKey`] if the embedded key id names a key
    ///   this sealer does not hold.
    /// - [`CryptoError::Tampered`] if decryption fails the integrity check.
    pub fn open(&self, envelope: &str) -> CryptoResult<Vec<u8>> {
        let parts: Vec<&str> = envelope.split('.').collect();
        let [version, key_id, nonce_b64, ct_b64] = parts.as_slice() else {
            return Err(CryptoError::MalformedEnvelope {
                reason: format!("expected 4 dot-separated parts, got {}", parts.len()),
            });
        };
        if *version != ENVELOPE_VERSION {
            return Err(CryptoError::MalformedEnvelope {
                reason: format!("unsupported version tag '{version}'"),
            });
        }

        let key = self.select_key(key_id)?;

        use base64::Engine;
        let b64 = base64::engine::general_purpose::STANDARD;
        let nonce_bytes = b64
            .decode(nonce_b64)
            .map_err(|_| CryptoError::MalformedEnvelope {
                reason: "nonce is not valid base64".to_string(),
            })?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(CryptoError::MalformedEnvelope {
                reason: format!("nonce must be {NONCE_LEN} bytes, got {}", nonce_bytes.len()),
            });
        }
        let ciphertext = b64
            .decode(ct_b64)
            .map_err(|_| CryptoError::MalformedEnvelope {
                reason: "ciphertext is not valid base64".to_string(),
            })?;

        let header = format!("{ENVELOPE_VERSION}.{key_id}");
        key.cipher()
            .decrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: &ciphertext,
                    aad: header.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::Tampered)
    }

    /// Whether an envelope was sealed under a non-primary key and should
    /// be resealed.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedEnvelope`] if the envelope does not
    /// carry a key id.
    pub fn needs_reseal(&self, envelope: &str) -> CryptoResult<bool> {
        let key_id = envelope
            .split('.')
            .nth(1)
            .ok_or_else(|| CryptoError::MalformedEnvelope {
                reason: "missing key id".to_string(),
            })?;
        Ok(key_id != self.primary.id())
    }

    fn select_key(&self, key_id: &str) -> CryptoResult<&SealKey> {
        if key_id == self.primary.id() {
            return Ok(&self.primary);
        }
        if let Some(previous) = &self.previous {
            if key_id == previous.id() {
                return Ok(previous);
            }
        }
        Err(CryptoError::UnknownKey {
            key_id: key_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str, fill: u8) -> SealKey {
        SealKey::new(id, [fill; 32])
    }

    // -----------------------------------------------------------------------
    // Roundtrip
    // -----------------------------------------------------------------------

    #[test]
    fn test_seal_open_roundtrip() {
        let sealer = CredentialSealer::new(key("k1", 7));
        let envelope = sealer.seal(b"secret-value").unwrap();
        assert!(envelope.starts_with("v1.k1."));
        assert_eq!(sealer.open(&envelope).unwrap(), b"secret-value");
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let sealer = CredentialSealer::new(key("k1", 7));
        let a = sealer.seal(b"same").unwrap();
        let b = sealer.seal(b"same").unwrap();
        assert_ne!(a, b);
    }

    // -----------------------------------------------------------------------
    // Tampering
    // -----------------------------------------------------------------------

    #[test]
    fn test_tampered_ciphertext_fails_closed() {
        let sealer = CredentialSealer::new(key("k1", 7));
        let envelope = sealer.seal(b"secret-value").unwrap();

        // Flip one character of the ciphertext part.
        let mut parts: Vec<String> = envelope.split('.').map(String::from).collect();
        let ct = parts[3].clone();
        let flipped = if ct.starts_with('A') { "B" } else { "A" };
        parts[3] = format!("{flipped}{}", &ct[1..]);
        let tampered = parts.join(".");

        assert!(matches!(
            sealer.open(&tampered),
            Err(CryptoError::Tampered)
        ));
    }

    #[test]
    fn test_header_is_authenticated() {
        // Sealing under k1 then relabeling the envelope as k2 must fail
        // even when the sealer holds both keys with identical material.
        let sealer = CredentialSealer::with_previous(key("k1", 7), key("k2", 7));
        let envelope = sealer.seal(b"secret-value").unwrap();
        let relabeled = envelope.replacen("v1.k1.", "v1.k2.", 1);
        assert!(matches!(
            sealer.open(&relabeled),
            Err(CryptoError::Tampered)
        ));
    }

    // -----------------------------------------------------------------------
    // Rotation
    // -----------------------------------------------------------------------

    #[test]
    fn test_previous_key_still_opens() {
        let old = CredentialSealer::new(key("k1", 7));
        let envelope = old.seal(b"pre-rotation").unwrap();

        let rotated = CredentialSealer::with_previous(key("k2", 9), key("k1", 7));
        assert_eq!(rotated.open(&envelope).unwrap(), b"pre-rotation");
        assert!(rotated.needs_reseal(&envelope).unwrap());

        let fresh = rotated.seal(b"post-rotation").unwrap();
        assert!(!rotated.needs_reseal(&fresh).unwrap());
    }

    #[test]
    fn test_unknown_key_id_is_distinct_error() {
        let sealer = CredentialSealer::new(key("k2", 9));
        let other = CredentialSealer::new(key("k1", 7));
        let envelope = other.seal(b"sealed-elsewhere").unwrap();
        assert!(matches!(
            sealer.open(&envelope),
            Err(CryptoError::UnknownKey { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Envelope parsing
    // -----------------------------------------------------------------------

    #[test]
    fn test_malformed_envelopes() {
        let sealer = CredentialSealer::new(key("k1", 7));
        assert!(matches!(
            sealer.open("not-an-envelope"),
            Err(CryptoError::MalformedEnvelope { .. })
        ));
        assert!(matches!(
            sealer.open("v9.k1.AAAA.BBBB"),
            Err(CryptoError::MalformedEnvelope { .. })
        ));
        assert!(matches!(
            sealer.open("v1.k1.!!!.BBBB"),
            Err(CryptoError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn test_key_from_base64() {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode([3u8; 32]);
        let k = SealKey::from_base64("k1", &encoded).unwrap();
        assert_eq!(k.id(), "k1");
        assert!(SealKey::from_base64("k1", "short").is_err());
    }
}
