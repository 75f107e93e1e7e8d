//! `clubledger-auth`: principals, roles, and the ledger access policy.
//!
//! Decoupled from HTTP and storage: callers resolve a [`Principal`] (through a
//! [`PrincipalDirectory`]) and ask [`authorize`] whether it may perform an
//! [`Action`].

pub mod authorize;
pub mod directory;
pub mod permissions;
pub mod policy;
pub mod principal;
pub mod roles;

pub use authorize::{Action, AuthzError, authorize};
pub use directory::{InMemoryPrincipalDirectory, PrincipalDirectory};
pub use permissions::Permission;
pub use policy::{effective_permissions, permissions_for_role};
pub use principal::{Principal, PrincipalId};
pub use roles::Role;
