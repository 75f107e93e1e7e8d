use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clubledger_core::MemberId;

use crate::Role;

/// Identity of an authenticated principal (club officer, member, or the
/// scheduler).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for PrincipalId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<PrincipalId> for Uuid {
    fn from(value: PrincipalId) -> Self {
        value.0
    }
}

impl FromStr for PrincipalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A fully resolved principal for authorization decisions.
///
/// Passed explicitly into every ledger operation; there is no ambient
/// "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub display_name: String,
    pub email: String,
    pub roles: Vec<Role>,

    /// Club membership this principal owns, if any. Grants own-account reads.
    pub member_id: Option<MemberId>,
}

impl Principal {
    pub fn new(display_name: impl Into<String>, email: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            id: PrincipalId::new(),
            display_name: display_name.into(),
            email: email.into(),
            roles,
            member_id: None,
        }
    }

    pub fn with_member(mut self, member_id: MemberId) -> Self {
        self.member_id = Some(member_id);
        self
    }

    /// The identity scheduled jobs run as.
    pub fn system() -> Self {
        Self {
            id: PrincipalId::from_uuid(Uuid::nil()),
            display_name: "system".to_string(),
            email: "system@localhost".to_string(),
            roles: vec![Role::SYSTEM],
            member_id: None,
        }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Whether this principal is the owner of `member_id`'s account.
    pub fn owns(&self, member_id: MemberId) -> bool {
        self.member_id == Some(member_id)
    }
}
