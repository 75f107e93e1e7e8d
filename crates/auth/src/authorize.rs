use thiserror::Error;

use clubledger_core::MemberId;

use crate::{Permission, Principal, effective_permissions};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unknown principal '{0}'")]
    UnknownPrincipal(String),

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Every ledger operation a principal can ask to perform.
///
/// Read actions carry the member they target so that own-account access can
/// be decided here instead of at each call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    OpenAccount,
    DeleteAccount,
    RecordBorrow,
    RecordPayment,
    RecordFine,
    RecordDues,
    OverrideStatus,
    SweepOverdue,
    ReadAccount { member_id: MemberId },
    /// `None` means treasury-wide aggregates.
    ReadStats { member_id: Option<MemberId> },
    /// `None` means the whole log.
    ReadActivities { member_id: Option<MemberId> },
    PurgeActivities,
}

impl Action {
    /// Permission that grants this action for any target.
    pub fn required_permission(&self) -> Permission {
        match self {
            Action::OpenAccount
            | Action::RecordBorrow
            | Action::RecordPayment
            | Action::RecordFine
            | Action::RecordDues => Permission::LEDGER_WRITE,
            Action::DeleteAccount | Action::OverrideStatus => Permission::LEDGER_ADMIN,
            Action::SweepOverdue => Permission::LEDGER_SWEEP,
            Action::ReadAccount { .. } | Action::ReadStats { .. } => Permission::LEDGER_READ,
            Action::ReadActivities { .. } => Permission::ACTIVITY_READ,
            Action::PurgeActivities => Permission::ACTIVITY_PURGE,
        }
    }

    /// Member whose own data this action reads, if it is an own-account read.
    fn own_target(&self) -> Option<MemberId> {
        match *self {
            Action::ReadAccount { member_id } => Some(member_id),
            Action::ReadStats { member_id } | Action::ReadActivities { member_id } => member_id,
            _ => None,
        }
    }
}

/// Decide whether `principal` may perform `action`.
///
/// - No IO
/// - No panics
/// - The only place access rules live
pub fn authorize(principal: &Principal, action: &Action) -> Result<(), AuthzError> {
    let perms = effective_permissions(principal);
    let required = action.required_permission();

    if perms.contains(&Permission::WILDCARD) || perms.contains(&required) {
        return Ok(());
    }

    if let Some(member_id) = action.own_target() {
        if perms.contains(&Permission::LEDGER_READ_OWN) && principal.owns(member_id) {
            return Ok(());
        }
    }

    tracing::debug!(
        principal_id = %principal.id,
        action = ?action,
        required = %required,
        "authorization denied"
    );
    Err(AuthzError::Forbidden(required.as_str().to_string()))
}
