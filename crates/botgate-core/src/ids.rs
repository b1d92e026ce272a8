//! Newtype identifiers for durable records.
//!
//! Each id wraps a v4 UUID and carries a short `Display` prefix so log lines
//! stay greppable (`apr:`, `tok:`, `aud:`).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an id from its string form (with or without the prefix).
            ///
            /// # Errors
            ///
            /// Returns an error if the remainder is not a valid UUID.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                let raw = s.strip_prefix(concat!($prefix, ":")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(raw)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

define_id! {
    /// Unique identifier for an approval request.
    ApprovalId, "apr"
}

define_id! {
    /// Unique identifier for an approval token row.
    ///
    /// This identifies the stored row, not the bearer secret - the secret is
    /// returned to the caller once and only its hash is kept.
    TokenId, "tok"
}

define_id! {
    /// Unique identifier for an audit event.
    AuditEventId, "aud"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefix() {
        let id = ApprovalId::new();
        assert!(id.to_string().starts_with("apr:"));
        assert!(TokenId::new().to_string().starts_with("tok:"));
        assert!(AuditEventId::new().to_string().starts_with("aud:"));
    }

    #[test]
    fn test_parse_roundtrip() {
        let id = ApprovalId::new();
        let parsed = ApprovalId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);

        // Bare UUID without prefix also parses
        let bare = ApprovalId::parse(&id.0.to_string()).unwrap();
        assert_eq!(id, bare);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(AuditEventId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = TokenId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: TokenId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
