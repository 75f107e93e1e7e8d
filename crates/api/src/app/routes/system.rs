use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, sse::Event as SseEvent},
};

use clubledger_auth::{Action, authorize};

use crate::app::{dto, errors, services::{self, AppServices}};
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<PrincipalContext>) -> impl IntoResponse {
    let p = ctx.principal();
    Json(serde_json::json!({
        "principal_id": ctx.principal_id().to_string(),
        "display_name": p.display_name,
        "email": p.email,
        "member_id": p.member_id,
        "roles": ctx.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
    }))
}

/// Live feed of committed ledger events.
///
/// Same access rule as the activity log: `?member_id=` narrows the feed and
/// is required for members reading their own account.
pub async fn stream(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Query(params): Query<dto::StatsParams>,
) -> Result<
    axum::response::Sse<impl tokio_stream::Stream<Item = Result<SseEvent, std::convert::Infallible>>>,
    axum::response::Response,
> {
    authorize(
        ctx.principal(),
        &Action::ReadActivities {
            member_id: params.member_id,
        },
    )
    .map_err(|e| errors::ledger_error_to_response(e.into()))?;

    Ok(services::ledger_sse_stream(services, params.member_id))
}
