use serde::{Deserialize, Serialize};

use clubledger_core::Amount;

use crate::account::AccountState;
use crate::status::{AccountStatus, Balances};

/// Aggregate figures over one or more accounts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountStats {
    pub accounts: u64,
    pub good_standing: u64,
    pub owing: u64,
    pub overdue: u64,
    pub current: Balances,
    pub total: Balances,
    pub balance_to_balance: Balances,
    pub outstanding: Amount,
}

impl AccountStats {
    pub fn collect<'a>(states: impl IntoIterator<Item = &'a AccountState>) -> Self {
        states.into_iter().fold(Self::default(), |mut stats, s| {
            stats.accounts += 1;
            match s.status {
                AccountStatus::GoodStanding => stats.good_standing += 1,
                AccountStatus::Owing => stats.owing += 1,
                AccountStatus::Overdue => stats.overdue += 1,
            }
            stats.current = stats.current.saturating_add(&s.current);
            stats.total = stats.total.saturating_add(&s.total);
            stats.balance_to_balance = stats.balance_to_balance.saturating_add(&s.balance_to_balance);
            stats.outstanding = stats.outstanding.saturating_add(s.outstanding());
            stats
        })
    }
}
