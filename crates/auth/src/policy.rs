//! Role → permission mapping.

use std::collections::HashSet;

use crate::{Permission, Principal, Role};

/// Permissions granted by a single role. Unknown roles grant nothing.
pub fn permissions_for_role(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        "admin" => vec![Permission::WILDCARD],
        "treasurer" => vec![
            Permission::LEDGER_WRITE,
            Permission::LEDGER_READ,
            Permission::ACTIVITY_READ,
        ],
        "secretary" => vec![Permission::LEDGER_READ, Permission::ACTIVITY_READ],
        "member" => vec![Permission::LEDGER_READ_OWN],
        "system" => vec![Permission::LEDGER_SWEEP, Permission::ACTIVITY_PURGE],
        _ => Vec::new(),
    }
}

/// Union of the permissions granted by every role the principal holds.
pub fn effective_permissions(principal: &Principal) -> HashSet<Permission> {
    principal.roles.iter().flat_map(permissions_for_role).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_role_is_wildcard() {
        assert_eq!(permissions_for_role(&Role::ADMIN), vec![Permission::WILDCARD]);
    }

    #[test]
    fn unknown_role_grants_nothing() {
        assert!(permissions_for_role(&Role::new("janitor")).is_empty());
    }

    #[test]
    fn effective_permissions_union_roles() {
        let p = Principal::new("Sam", "sam@club.test", vec![Role::SECRETARY, Role::MEMBER]);
        let perms = effective_permissions(&p);

        assert!(perms.contains(&Permission::LEDGER_READ));
        assert!(perms.contains(&Permission::LEDGER_READ_OWN));
        assert!(!perms.contains(&Permission::LEDGER_WRITE));
    }
}
