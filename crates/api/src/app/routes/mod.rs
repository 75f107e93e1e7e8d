use axum::{
    Router,
    routing::{get, post, put},
};

pub mod accounts;
pub mod activities;
pub mod admin;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stream", get(system::stream))
        .route("/accounts", post(accounts::open_account))
        .route(
            "/accounts/:member_id",
            get(accounts::get_account).delete(accounts::delete_account),
        )
        .route("/accounts/:member_id/borrow", post(accounts::record_borrow))
        .route("/accounts/:member_id/payments", post(accounts::record_payment))
        .route("/accounts/:member_id/fines", post(accounts::record_fine))
        .route("/accounts/:member_id/dues", post(accounts::record_dues))
        .route("/admin/accounts/:account_id/status", put(accounts::set_status))
        .route("/stats", get(accounts::stats))
        .route(
            "/activities",
            get(activities::list_activities).delete(activities::purge_activities),
        )
        .route("/admin/sweep", post(admin::sweep_overdue))
}
