//! UTC timestamps with expiry arithmetic.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC timestamp.
///
/// Thin wrapper over [`chrono::DateTime<Utc>`] so expiry checks read the
/// same way everywhere (`expires_at.is_past()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// The current time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wrap an existing datetime.
    #[must_use]
    pub const fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// This timestamp plus `duration`, saturating at the representable
    /// maximum rather than overflowing.
    #[must_use]
    pub fn plus(self, duration: Duration) -> Self {
        Self(
            self.0
                .checked_add_signed(duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }

    /// Whether this timestamp is in the past.
    #[must_use]
    pub fn is_past(self) -> bool {
        self.0 < Utc::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_and_is_past() {
        let now = Timestamp::now();
        assert!(!now.plus(Duration::seconds(60)).is_past());
        assert!(now.plus(Duration::seconds(-60)).is_past());
    }

    #[test]
    fn test_plus_saturates() {
        let far = Timestamp::from_datetime(DateTime::<Utc>::MAX_UTC);
        let later = far.plus(Duration::days(1));
        assert_eq!(later.0, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_ordering() {
        let a = Timestamp::now();
        let b = a.plus(Duration::seconds(1));
        assert!(a < b);
    }
}
