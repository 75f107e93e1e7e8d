//! Resolve external identities (email addresses) into principals.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::{AuthzError, Principal};

/// Lookup of principals by the identity the upstream auth provider asserts.
pub trait PrincipalDirectory: Send + Sync {
    fn resolve(&self, email: &str) -> Result<Principal, AuthzError>;
}

impl<D> PrincipalDirectory for std::sync::Arc<D>
where
    D: PrincipalDirectory + ?Sized,
{
    fn resolve(&self, email: &str) -> Result<Principal, AuthzError> {
        (**self).resolve(email)
    }
}

/// In-memory directory keyed by lower-cased email.
#[derive(Debug, Default)]
pub struct InMemoryPrincipalDirectory {
    principals: RwLock<HashMap<String, Principal>>,
}

impl InMemoryPrincipalDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_principals(principals: impl IntoIterator<Item = Principal>) -> Self {
        let dir = Self::new();
        for p in principals {
            dir.insert(p);
        }
        dir
    }

    /// Insert or replace the principal registered under its email.
    pub fn insert(&self, principal: Principal) {
        let key = normalize(&principal.email);
        let mut guard = match self.principals.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(key, principal);
    }

    pub fn len(&self) -> usize {
        self.principals.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PrincipalDirectory for InMemoryPrincipalDirectory {
    fn resolve(&self, email: &str) -> Result<Principal, AuthzError> {
        let guard = match self.principals.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard
            .get(&normalize(email))
            .cloned()
            .ok_or_else(|| AuthzError::UnknownPrincipal(email.to_string()))
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
