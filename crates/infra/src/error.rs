use thiserror::Error;

use clubledger_auth::AuthzError;

use crate::command_dispatcher::DispatchError;
use crate::projections::ProjectionError;

/// Error kinds surfaced by [`crate::ledger_service::LedgerService`].
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Stable machine-readable code, used in logs and HTTP bodies.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Unauthorized(AuthzError::UnknownPrincipal(_)) => "unauthenticated",
            LedgerError::Unauthorized(AuthzError::Forbidden(_)) => "forbidden",
            LedgerError::NotFound(_) => "not_found",
            LedgerError::Validation(_) => "validation_error",
            LedgerError::Conflict(_) => "conflict",
            LedgerError::Internal(_) => "internal_error",
        }
    }
}

impl From<DispatchError> for LedgerError {
    fn from(value: DispatchError) -> Self {
        match value {
            DispatchError::Validation(msg) | DispatchError::InvariantViolation(msg) => {
                LedgerError::Validation(msg)
            }
            DispatchError::NotFound(msg) => LedgerError::NotFound(msg),
            DispatchError::Conflict(msg) => LedgerError::Conflict(msg),
            DispatchError::Concurrency(msg) => {
                LedgerError::Conflict(format!("account is busy, try again ({msg})"))
            }
            DispatchError::Unauthorized(msg) => LedgerError::Unauthorized(AuthzError::Forbidden(msg)),
            other @ (DispatchError::Deserialize(_)
            | DispatchError::Store(_)
            | DispatchError::Publish { .. }) => LedgerError::Internal(other.to_string()),
        }
    }
}

impl From<ProjectionError> for LedgerError {
    fn from(value: ProjectionError) -> Self {
        LedgerError::Internal(value.to_string())
    }
}
