use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles are opaque strings; [`crate::policy`] maps them onto permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Club administrator: everything, including overrides and deletion.
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    /// Records borrows, payments, fines and dues.
    pub const TREASURER: Role = Role(Cow::Borrowed("treasurer"));
    /// Read-only access to every account and the activity log.
    pub const SECRETARY: Role = Role(Cow::Borrowed("secretary"));
    /// A club member; may only read their own account.
    pub const MEMBER: Role = Role(Cow::Borrowed("member"));
    /// Scheduled jobs (overdue sweep, retention purge).
    pub const SYSTEM: Role = Role(Cow::Borrowed("system"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for Role {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.trim().to_ascii_lowercase()))
    }
}
