use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};

use clubledger_core::{AccountId, MemberId};
use clubledger_infra::LedgerError;
use clubledger_ledger::AccountState;

use crate::app::{dto, errors, services::AppServices};
use crate::context::PrincipalContext;

fn account_response(status: StatusCode, result: Result<AccountState, LedgerError>) -> axum::response::Response {
    match result {
        Ok(state) => (status, Json(dto::account_to_json(&state))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn open_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Json(body): Json<dto::OpenAccountRequest>,
) -> axum::response::Response {
    account_response(
        StatusCode::CREATED,
        services.ledger().open_account(body.member_id, ctx.principal()),
    )
}

pub async fn get_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(member_id): Path<MemberId>,
) -> axum::response::Response {
    account_response(
        StatusCode::OK,
        services.ledger().get_account_by_member(member_id, ctx.principal()),
    )
}

pub async fn delete_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(member_id): Path<MemberId>,
) -> axum::response::Response {
    match services.ledger().delete_account(member_id, ctx.principal()) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn record_borrow(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(member_id): Path<MemberId>,
    Json(body): Json<dto::RecordBorrowRequest>,
) -> axum::response::Response {
    account_response(
        StatusCode::OK,
        services.ledger().record_borrow(
            member_id,
            dto::amount(body.amount),
            body.due_date,
            body.description,
            ctx.principal(),
        ),
    )
}

pub async fn record_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(member_id): Path<MemberId>,
    Json(body): Json<dto::RecordPaymentRequest>,
) -> axum::response::Response {
    account_response(
        StatusCode::OK,
        services.ledger().record_payment(
            member_id,
            dto::amount(body.amount),
            body.category,
            body.description,
            ctx.principal(),
        ),
    )
}

pub async fn record_fine(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(member_id): Path<MemberId>,
    Json(body): Json<dto::RecordFineRequest>,
) -> axum::response::Response {
    account_response(
        StatusCode::OK,
        services
            .ledger()
            .record_fine(member_id, dto::amount(body.amount), body.reason, ctx.principal()),
    )
}

pub async fn record_dues(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(member_id): Path<MemberId>,
    Json(body): Json<dto::RecordDuesRequest>,
) -> axum::response::Response {
    account_response(
        StatusCode::OK,
        services
            .ledger()
            .record_dues(member_id, dto::amount(body.amount), body.description, ctx.principal()),
    )
}

/// Administrative override, addressed by account id.
pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(account_id): Path<AccountId>,
    Json(body): Json<dto::SetStatusRequest>,
) -> axum::response::Response {
    account_response(
        StatusCode::OK,
        services
            .ledger()
            .set_account_status(account_id, body.status, ctx.principal()),
    )
}

pub async fn stats(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Query(params): Query<dto::StatsParams>,
) -> axum::response::Response {
    match services.ledger().get_account_stats(params.member_id, ctx.principal()) {
        Ok(stats) => (StatusCode::OK, Json(dto::stats_to_json(&stats))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
