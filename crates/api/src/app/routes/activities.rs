use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};

use clubledger_infra::ActivityQuery;

use crate::app::{dto, errors, services::AppServices};
use crate::context::PrincipalContext;

pub async fn list_activities(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Query(params): Query<dto::ActivitiesParams>,
) -> axum::response::Response {
    let query = ActivityQuery::from(params);
    match services.ledger().list_activities(&query, ctx.principal()) {
        Ok(items) => {
            let items = items.iter().map(dto::activity_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn purge_activities(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Query(params): Query<dto::PurgeParams>,
) -> axum::response::Response {
    match services.ledger().purge_activities(params.older_than, ctx.principal()) {
        Ok(removed) => (StatusCode::OK, Json(serde_json::json!({ "removed": removed }))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
