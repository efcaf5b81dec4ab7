//! Identity and privilege resolution for UI gating.
//!
//! Consumers only need to know whether to show privileged affordances, so the
//! resolved state carries the tenant role and the platform-admin flag and
//! nothing about why a lookup failed.

pub mod client;
pub mod resolver;

pub use client::{HttpIdentityClient, IdentityError};
pub use resolver::RoleResolver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Tenant roles that unlock privileged controls, compared case-insensitively.
pub const PRIVILEGED_TENANT_ROLES: [&str; 2] = ["OWNER", "ADMIN"];

/// Payload of `GET /api/auth/me`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default)]
    pub tenant_role: Option<String>,
    pub is_platform_admin: bool,
}

impl Identity {
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            tenant_role: None,
            is_platform_admin: false,
        }
    }

    #[must_use]
    pub fn is_privileged(&self) -> bool {
        self.is_platform_admin
            || self.tenant_role.as_deref().is_some_and(|role| {
                PRIVILEGED_TENANT_ROLES
                    .iter()
                    .any(|privileged| privileged.eq_ignore_ascii_case(role))
            })
    }
}

/// Source of the caller's identity.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// Fetch the current identity.
    ///
    /// # Errors
    /// Any transport, status or decoding failure. Callers may treat every error
    /// as "anonymous".
    async fn fetch_identity(&self) -> Result<Identity, IdentityError>;
}

/// Resolution state for one activation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoleState {
    Loading,
    Resolved(Identity),
    /// No identity, either because the caller is logged out or the lookup failed.
    Anonymous,
}

impl RoleState {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn snapshot(&self) -> RoleSnapshot {
        match self {
            Self::Loading => RoleSnapshot {
                loading: true,
                tenant_role: None,
                is_platform_admin: false,
            },
            Self::Resolved(identity) => RoleSnapshot {
                loading: false,
                tenant_role: identity.tenant_role.clone(),
                is_platform_admin: identity.is_platform_admin,
            },
            Self::Anonymous => RoleSnapshot {
                loading: false,
                tenant_role: None,
                is_platform_admin: false,
            },
        }
    }
}

/// What a view reads to decide on privileged rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSnapshot {
    pub loading: bool,
    pub tenant_role: Option<String>,
    pub is_platform_admin: bool,
}

impl RoleSnapshot {
    /// False while loading.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        !self.loading
            && Identity {
                tenant_role: self.tenant_role.clone(),
                is_platform_admin: self.is_platform_admin,
            }
            .is_privileged()
    }
}
