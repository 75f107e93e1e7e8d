//! Audit trail entries derived from account events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clubledger_core::{AccountId, ActivityId, Amount, MemberId};
use clubledger_events::Event;

use crate::account::{AccountEvent, Actor};
use crate::entry::PaymentCategory;
use crate::status::AccountStatus;

/// Typed payload of an activity, keyed by the action that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActivityDetails {
    AccountOpened,
    BorrowRecorded {
        amount: Amount,
        due_date: DateTime<Utc>,
        description: Option<String>,
        status: AccountStatus,
    },
    PaymentRecorded {
        category: PaymentCategory,
        amount: Amount,
        applied: Amount,
        absorbed: Amount,
        due_date_cleared: bool,
        status: AccountStatus,
    },
    FineRecorded {
        amount: Amount,
        reason: String,
    },
    DuesRecorded {
        amount: Amount,
        description: Option<String>,
        status: AccountStatus,
    },
    StatusOverridden {
        from: AccountStatus,
        to: AccountStatus,
    },
    MarkedOverdue {
        due_date: DateTime<Utc>,
        outstanding: Amount,
    },
    AccountDeleted,
}

impl ActivityDetails {
    pub fn action(&self) -> &'static str {
        match self {
            ActivityDetails::AccountOpened => "account_opened",
            ActivityDetails::BorrowRecorded { .. } => "borrow_recorded",
            ActivityDetails::PaymentRecorded { .. } => "payment_recorded",
            ActivityDetails::FineRecorded { .. } => "fine_recorded",
            ActivityDetails::DuesRecorded { .. } => "dues_recorded",
            ActivityDetails::StatusOverridden { .. } => "status_overridden",
            ActivityDetails::MarkedOverdue { .. } => "marked_overdue",
            ActivityDetails::AccountDeleted => "account_deleted",
        }
    }

    fn describe(&self) -> String {
        match self {
            ActivityDetails::AccountOpened => "Account opened".to_string(),
            ActivityDetails::BorrowRecorded { amount, due_date, .. } => {
                format!("Borrowed {amount}, due {}", due_date.format("%Y-%m-%d"))
            }
            ActivityDetails::PaymentRecorded { category, amount, absorbed, .. } => {
                let mut text = format!("Payment of {amount} ({})", category.as_str());
                if absorbed.is_positive() {
                    text.push_str(&format!(", {absorbed} absorbed as overpayment"));
                }
                text
            }
            ActivityDetails::FineRecorded { amount, reason } => format!("Fine of {amount}: {reason}"),
            ActivityDetails::DuesRecorded { amount, .. } => format!("Dues of {amount} charged"),
            ActivityDetails::StatusOverridden { from, to } => {
                format!("Status manually changed from {from} to {to}")
            }
            ActivityDetails::MarkedOverdue { due_date, outstanding } => format!(
                "Marked overdue: {outstanding} outstanding past {}",
                due_date.format("%Y-%m-%d")
            ),
            ActivityDetails::AccountDeleted => "Account deleted".to_string(),
        }
    }
}

/// One immutable audit entry, written for every account change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub account_id: AccountId,
    pub member_id: MemberId,
    pub actor: Actor,
    pub description: String,
    pub details: ActivityDetails,
    pub timestamp: DateTime<Utc>,
}

impl Activity {
    pub fn action(&self) -> &'static str {
        self.details.action()
    }

    pub fn from_event(event: &AccountEvent) -> Self {
        let details = match event {
            AccountEvent::Opened(_) => ActivityDetails::AccountOpened,
            AccountEvent::BorrowRecorded(e) => ActivityDetails::BorrowRecorded {
                amount: e.amount,
                due_date: e.due_date,
                description: e.description.clone(),
                status: e.status,
            },
            AccountEvent::PaymentRecorded(e) => ActivityDetails::PaymentRecorded {
                category: e.category,
                amount: e.amount,
                applied: e.applied,
                absorbed: Amount::from_minor(e.amount.minor() - e.applied.minor()),
                due_date_cleared: e.due_date_cleared,
                status: e.status,
            },
            AccountEvent::FineRecorded(e) => ActivityDetails::FineRecorded {
                amount: e.amount,
                reason: e.reason.clone(),
            },
            AccountEvent::DuesRecorded(e) => ActivityDetails::DuesRecorded {
                amount: e.amount,
                description: e.description.clone(),
                status: e.status,
            },
            AccountEvent::StatusOverridden(e) => ActivityDetails::StatusOverridden {
                from: e.from,
                to: e.to,
            },
            AccountEvent::MarkedOverdue(e) => ActivityDetails::MarkedOverdue {
                due_date: e.due_date,
                outstanding: e.outstanding,
            },
            AccountEvent::Deleted(_) => ActivityDetails::AccountDeleted,
        };

        Self {
            id: ActivityId::new(),
            account_id: event.account_id(),
            member_id: event.member_id(),
            actor: event.actor().clone(),
            description: details.describe(),
            details,
            timestamp: event.occurred_at(),
        }
    }
}
