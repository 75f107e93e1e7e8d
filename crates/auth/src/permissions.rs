use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "ledger.write"). The wildcard `"*"`
/// grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    /// Read any account, its history and stats.
    pub const LEDGER_READ: Permission = Permission(Cow::Borrowed("ledger.read"));
    /// Read the account linked to the principal's own membership.
    pub const LEDGER_READ_OWN: Permission = Permission(Cow::Borrowed("ledger.read.own"));
    /// Record borrows, payments, fines, dues; open accounts.
    pub const LEDGER_WRITE: Permission = Permission(Cow::Borrowed("ledger.write"));
    /// Status overrides and account deletion.
    pub const LEDGER_ADMIN: Permission = Permission(Cow::Borrowed("ledger.admin"));
    pub const LEDGER_SWEEP: Permission = Permission(Cow::Borrowed("ledger.sweep"));
    pub const ACTIVITY_READ: Permission = Permission(Cow::Borrowed("activity.read"));
    pub const ACTIVITY_PURGE: Permission = Permission(Cow::Borrowed("activity.purge"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
