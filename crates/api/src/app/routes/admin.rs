//! Maintenance routes.

use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::{dto, errors, services::AppServices};
use crate::context::PrincipalContext;

/// Run the overdue sweep now, as the caller.
pub async fn sweep_overdue(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.ledger().sweep_overdue(ctx.principal()) {
        Ok(report) => (StatusCode::OK, Json(dto::sweep_report_to_json(&report))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
