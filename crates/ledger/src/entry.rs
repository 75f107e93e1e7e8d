use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clubledger_core::{Amount, DomainError};

use crate::status::BalanceKind;

/// Which balance a payment settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentCategory {
    FinePayment,
    BorrowPayment,
    DuePayment,
}

impl PaymentCategory {
    pub fn target(&self) -> BalanceKind {
        match self {
            PaymentCategory::FinePayment => BalanceKind::Fine,
            PaymentCategory::BorrowPayment => BalanceKind::Borrowed,
            PaymentCategory::DuePayment => BalanceKind::Dues,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentCategory::FinePayment => "fine_payment",
            PaymentCategory::BorrowPayment => "borrow_payment",
            PaymentCategory::DuePayment => "due_payment",
        }
    }
}

impl core::str::FromStr for PaymentCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fine_payment" => Ok(PaymentCategory::FinePayment),
            "borrow_payment" => Ok(PaymentCategory::BorrowPayment),
            "due_payment" => Ok(PaymentCategory::DuePayment),
            other => Err(DomainError::validation(format!("unknown payment category '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Borrow,
    Fine,
    Dues,
    FinePayment,
    BorrowPayment,
    DuePayment,
}

impl From<PaymentCategory> for EntryKind {
    fn from(value: PaymentCategory) -> Self {
        match value {
            PaymentCategory::FinePayment => EntryKind::FinePayment,
            PaymentCategory::BorrowPayment => EntryKind::BorrowPayment,
            PaymentCategory::DuePayment => EntryKind::DuePayment,
        }
    }
}

/// One line of an account's payment history. Never changed once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub kind: EntryKind,
    /// Amount as requested; for payments this may exceed what was applied.
    pub amount: Amount,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}
