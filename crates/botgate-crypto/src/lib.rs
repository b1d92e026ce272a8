//! Botgate Crypto - hashing, bearer secrets, and credential sealing.
//!
//! Three concerns live here:
//!
//! - [`PayloadHash`]: SHA-256 over the RFC 8785 canonical JSON form of a
//!   payload. Object keys are sorted recursively and array order is
//!   preserved, so two semantically identical payloads with differently
//!   ordered keys hash identically. Approval grants are bound to this hash.
//! - [`BearerSecret`] / [`TokenHash`]: random single-use bearer secrets.
//!   The plaintext secret is handed to the caller exactly once; storage
//!   only ever sees its SHA-256 hash, compared in constant time.
//! - [`CredentialSealer`]: AES-256-GCM sealing of credentials at rest with
//!   a primary key and an optional previous key for rotation. The envelope
//!   carries a key id so decryption selects the right key directly, and
//!   tampering fails closed with a distinct error.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod hash;
pub mod seal;
pub mod token;

pub use error::{CryptoError, CryptoResult};
pub use hash::PayloadHash;
pub use seal::{CredentialSealer, SealKey};
pub use token::{BearerSecret, TokenHash};
