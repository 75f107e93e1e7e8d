//! Overdue sweep bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clubledger_core::{AccountId, MemberId};
use clubledger_ledger::{AccountState, AccountStatus};

use crate::error::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub account_id: AccountId,
    pub member_id: MemberId,
    pub error: String,
}

/// Outcome of one overdue sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Candidates examined.
    pub processed: usize,
    /// Accounts moved to `overdue` by this run.
    pub transitioned: usize,
    /// Candidates that no longer qualified when their command ran.
    pub skipped: usize,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Whether an account should be moved to `overdue` at `now`.
pub fn is_sweep_candidate(state: &AccountState, now: DateTime<Utc>) -> bool {
    state.status == AccountStatus::Owing
        && state.due_date.is_some_and(|due| due < now)
        && state.outstanding().is_positive()
}

/// Run `mark` over every candidate, isolating failures per account.
///
/// `mark` returns `Ok(true)` when the account transitioned and `Ok(false)`
/// when there was nothing left to do. `clock` stamps `finished_at`.
pub fn run_sweep<C, F>(
    started_at: DateTime<Utc>,
    candidates: Vec<AccountState>,
    clock: C,
    mut mark: F,
) -> SweepReport
where
    C: Fn() -> DateTime<Utc>,
    F: FnMut(&AccountState) -> Result<bool, LedgerError>,
{
    let mut report = SweepReport {
        started_at,
        finished_at: started_at,
        processed: 0,
        transitioned: 0,
        skipped: 0,
        failures: Vec::new(),
    };

    for state in &candidates {
        report.processed += 1;
        match mark(state) {
            Ok(true) => report.transitioned += 1,
            Ok(false) => report.skipped += 1,
            Err(e) => {
                tracing::warn!(
                    account_id = %state.account_id,
                    member_id = %state.member_id,
                    error = %e,
                    "overdue sweep failed for account"
                );
                report.failures.push(SweepFailure {
                    account_id: state.account_id,
                    member_id: state.member_id,
                    error: e.to_string(),
                });
            }
        }
    }

    report.finished_at = clock().max(started_at);
    report
}
