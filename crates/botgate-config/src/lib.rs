//! Botgate Config - gateway configuration.
//!
//! All types in this crate are self-contained with no dependencies on
//! other botgate crates. Domain types are mirrored here and converted at
//! the boundary (see `botgate-gateway`'s composition module). Every
//! section implements [`Default`] with production-safe values, so a bare
//! `[section]` header in TOML produces a working configuration.
//!
//! Loading is layered: a TOML document, then `BOTGATE_*` environment
//! overrides, then a validation pass with actionable messages.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod loader;
pub mod types;
pub mod validate;

pub use loader::{load_from_path, load_from_str, ConfigError};
pub use types::{
    ApprovalsSection, Config, EffectName, IdempotencySection, LoggingSection, PolicySection,
    RetrySection, RiskName, RoleName, RuleSection, SealingSection, TelegramSection,
};
pub use validate::validate;
