use chrono::{DateTime, Utc};
use serde::Deserialize;

use clubledger_core::{Amount, MemberId};
use clubledger_infra::{ActivityQuery, SweepReport};
use clubledger_ledger::{AccountState, AccountStats, AccountStatus, Activity, PaymentCategory};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct OpenAccountRequest {
    pub member_id: MemberId,
}

/// Amounts are integer minor units (e.g. cents).
#[derive(Debug, Deserialize)]
pub struct RecordBorrowRequest {
    pub amount: i64,
    pub due_date: DateTime<Utc>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: i64,
    pub category: PaymentCategory,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordFineRequest {
    pub amount: i64,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordDuesRequest {
    pub amount: i64,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: AccountStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub member_id: Option<MemberId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivitiesParams {
    pub member_id: Option<MemberId>,
    pub limit: Option<usize>,
}

impl From<ActivitiesParams> for ActivityQuery {
    fn from(p: ActivitiesParams) -> Self {
        ActivityQuery {
            member_id: p.member_id,
            limit: p.limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PurgeParams {
    pub older_than: DateTime<Utc>,
}

// -------------------------
// Response mapping
// -------------------------

pub fn amount(v: i64) -> Amount {
    Amount::from_minor(v)
}

/// Flat account view: balances are spelled out per kind.
pub fn account_to_json(a: &AccountState) -> serde_json::Value {
    serde_json::json!({
        "account_id": a.account_id,
        "member_id": a.member_id,
        "status": a.status,
        "current_borrowed": a.current.borrowed,
        "current_fine": a.current.fine,
        "current_dues": a.current.dues,
        "total_borrowed": a.total.borrowed,
        "total_fine": a.total.fine,
        "total_dues": a.total.dues,
        "balance_to_balance": a.balance_to_balance,
        "outstanding": a.outstanding(),
        "due_date": a.due_date,
        "payment_history": a.payment_history,
        "opened_at": a.opened_at,
        "updated_at": a.updated_at,
    })
}

pub fn stats_to_json(s: &AccountStats) -> serde_json::Value {
    serde_json::to_value(s).unwrap_or_default()
}

pub fn activity_to_json(a: &Activity) -> serde_json::Value {
    serde_json::json!({
        "id": a.id,
        "account_id": a.account_id,
        "member_id": a.member_id,
        "actor": a.actor,
        "action": a.action(),
        "description": a.description,
        "details": a.details,
        "timestamp": a.timestamp,
    })
}

pub fn sweep_report_to_json(r: &SweepReport) -> serde_json::Value {
    serde_json::to_value(r).unwrap_or_default()
}
