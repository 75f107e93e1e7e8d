use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use clubledger_auth::AuthzError;
use clubledger_infra::LedgerError;

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    let status = match &err {
        LedgerError::Unauthorized(AuthzError::UnknownPrincipal(_)) => StatusCode::UNAUTHORIZED,
        LedgerError::Unauthorized(AuthzError::Forbidden(_)) => StatusCode::FORBIDDEN,
        LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
        LedgerError::Conflict(_) => StatusCode::CONFLICT,
        LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
