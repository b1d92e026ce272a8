//! Authenticated caller identity.
//!
//! A [`Principal`] is produced per request by the transport-layer
//! authentication collaborator (OIDC/JWT verification or a trusted local
//! bypass). The core treats it as already-validated input and never
//! persists it.

use crate::risk::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A role held by a principal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full control, including the raw passthrough tool.
    Owner,
    /// Administrative control, including the raw passthrough tool.
    Admin,
    /// Day-to-day operation; may perform medium-risk actions.
    Operator,
    /// Read-only access.
    ReadOnly,
}

impl Role {
    /// The highest risk level this role qualifies for on its own.
    ///
    /// A principal qualifies for an operation when at least one of its roles
    /// covers the operation's risk level.
    #[must_use]
    pub const fn risk_ceiling(self) -> RiskLevel {
        match self {
            Self::ReadOnly => RiskLevel::Low,
            Self::Operator => RiskLevel::Medium,
            Self::Admin | Self::Owner => RiskLevel::Critical,
        }
    }

    /// Whether this role covers the given risk level.
    #[must_use]
    pub fn covers(self, risk: RiskLevel) -> bool {
        risk <= self.risk_ceiling()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Admin => write!(f, "admin"),
            Self::Operator => write!(f, "operator"),
            Self::ReadOnly => write!(f, "readonly"),
        }
    }
}

/// Where a principal's identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthSource {
    /// Verified OIDC/JWT bearer identity.
    Oidc,
    /// Trusted local bypass (single-operator deployments).
    Local,
}

/// The authenticated caller of a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable subject identifier from the identity provider.
    pub subject: String,
    /// Roles held by this principal.
    pub roles: BTreeSet<Role>,
    /// Tenant the principal belongs to.
    pub tenant_id: String,
    /// How the principal authenticated.
    pub auth_source: AuthSource,
}

impl Principal {
    /// Create a principal with the given subject and roles.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
        tenant_id: impl Into<String>,
        auth_source: AuthSource,
    ) -> Self {
        Self {
            subject: subject.into(),
            roles: roles.into_iter().collect(),
            tenant_id: tenant_id.into(),
            auth_source,
        }
    }

    /// Whether the principal holds the given role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Whether any held role covers the given risk level.
    #[must_use]
    pub fn covers_risk(&self, risk: RiskLevel) -> bool {
        self.roles.iter().any(|r| r.covers(risk))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.subject, self.tenant_id)
    }
}
