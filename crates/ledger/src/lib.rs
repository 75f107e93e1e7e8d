//! Club member accounts: balances, payment history, status, and the audit
//! trail written for every change.

pub mod account;
pub mod activity;
pub mod entry;
pub mod stats;
pub mod status;

pub use account::{
    Account, AccountCommand, AccountEvent, AccountOpened, AccountDeleted, AccountState, Actor,
    BorrowRecorded, DeleteAccount, DuesRecorded, FineRecorded, MarkOverdue, MarkedOverdue,
    OpenAccount, OverrideStatus, PaymentRecorded, RecordBorrow, RecordDues, RecordFine,
    RecordPayment, StatusOverridden,
};
pub use activity::{Activity, ActivityDetails};
pub use entry::{EntryKind, LedgerEntry, PaymentCategory};
pub use stats::AccountStats;
pub use status::{AccountStatus, BalanceKind, Balances, classify};
