use clubledger_auth::{Principal, PrincipalId, Role};

/// Authenticated caller for a request.
///
/// Inserted by the auth middleware; every ledger route requires it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal.id
    }

    pub fn roles(&self) -> &[Role] {
        &self.principal.roles
    }
}
