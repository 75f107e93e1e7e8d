//! Account status and the classifier that derives it from balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clubledger_core::{Amount, DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    GoodStanding,
    Owing,
    Overdue,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::GoodStanding => "good_standing",
            AccountStatus::Owing => "owing",
            AccountStatus::Overdue => "overdue",
        }
    }
}

impl core::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AccountStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good_standing" => Ok(AccountStatus::GoodStanding),
            "owing" => Ok(AccountStatus::Owing),
            "overdue" => Ok(AccountStatus::Overdue),
            other => Err(DomainError::validation(format!("unknown account status '{other}'"))),
        }
    }
}

/// Which of the three balances an amount applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceKind {
    Borrowed,
    Fine,
    Dues,
}

/// The borrowed / fine / dues triple.
///
/// Used for current balances, lifetime totals, and the cumulative
/// `balance_to_balance` figures alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balances {
    pub borrowed: Amount,
    pub fine: Amount,
    pub dues: Amount,
}

impl Balances {
    pub fn new(borrowed: Amount, fine: Amount, dues: Amount) -> Self {
        Self { borrowed, fine, dues }
    }

    pub fn get(&self, kind: BalanceKind) -> Amount {
        match kind {
            BalanceKind::Borrowed => self.borrowed,
            BalanceKind::Fine => self.fine,
            BalanceKind::Dues => self.dues,
        }
    }

    fn slot(&mut self, kind: BalanceKind) -> &mut Amount {
        match kind {
            BalanceKind::Borrowed => &mut self.borrowed,
            BalanceKind::Fine => &mut self.fine,
            BalanceKind::Dues => &mut self.dues,
        }
    }

    /// Sum of the three balances, each counted as zero if negative.
    pub fn outstanding(&self) -> Amount {
        self.borrowed
            .clamped()
            .saturating_add(self.fine.clamped())
            .saturating_add(self.dues.clamped())
    }

    pub fn is_clear(&self) -> bool {
        self.outstanding().is_zero()
    }

    /// Add to one balance, failing on overflow.
    pub fn checked_increase(&self, kind: BalanceKind, by: Amount) -> DomainResult<Self> {
        let mut next = *self;
        let slot = next.slot(kind);
        *slot = slot.checked_add(by)?;
        Ok(next)
    }

    /// Add to one balance; for replaying amounts already validated.
    pub fn increase(&mut self, kind: BalanceKind, by: Amount) {
        let slot = self.slot(kind);
        *slot = slot.saturating_add(by);
    }

    /// Reduce one balance, flooring at zero. Returns the amount applied.
    pub fn reduce(&mut self, kind: BalanceKind, by: Amount) -> Amount {
        let slot = self.slot(kind);
        let (left, applied) = slot.reduce_clamped(by);
        *slot = left;
        applied
    }

    /// Component-wise sum, for aggregating many accounts.
    pub fn saturating_add(&self, other: &Balances) -> Balances {
        Balances {
            borrowed: self.borrowed.saturating_add(other.borrowed),
            fine: self.fine.saturating_add(other.fine),
            dues: self.dues.saturating_add(other.dues),
        }
    }
}

/// Derive an account's status from its balances and due date.
///
/// Nothing outstanding is good standing; otherwise a due date strictly before
/// `now` means overdue, and anything else (including no due date) is owing.
pub fn classify(balances: &Balances, due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> AccountStatus {
    if balances.is_clear() {
        return AccountStatus::GoodStanding;
    }
    match due_date {
        Some(due) if due < now => AccountStatus::Overdue,
        _ => AccountStatus::Owing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn borrowed(minor: i64) -> Balances {
        Balances::new(Amount::from_minor(minor), Amount::ZERO, Amount::ZERO)
    }

    #[test]
    fn clear_balances_without_due_date_are_good_standing() {
        assert_eq!(classify(&Balances::default(), None, now()), AccountStatus::GoodStanding);
    }

    #[test]
    fn clear_balances_with_past_due_date_are_still_good_standing() {
        let due = now() - Duration::days(10);
        assert_eq!(classify(&Balances::default(), Some(due), now()), AccountStatus::GoodStanding);
    }

    #[test]
    fn future_due_date_is_owing() {
        let due = now() + Duration::days(30);
        assert_eq!(classify(&borrowed(50_000), Some(due), now()), AccountStatus::Owing);
    }

    #[test]
    fn past_due_date_is_overdue() {
        let due = now() - Duration::days(1);
        assert_eq!(classify(&borrowed(50_000), Some(due), now()), AccountStatus::Overdue);
    }

    #[test]
    fn due_exactly_now_is_not_yet_overdue() {
        assert_eq!(classify(&borrowed(1), Some(now()), now()), AccountStatus::Owing);
    }

    #[test]
    fn missing_due_date_is_owing() {
        let b = Balances::new(Amount::ZERO, Amount::from_minor(5_000), Amount::ZERO);
        assert_eq!(classify(&b, None, now()), AccountStatus::Owing);
    }

    #[test]
    fn negative_balances_count_as_zero() {
        let b = Balances::new(Amount::from_minor(-100), Amount::ZERO, Amount::ZERO);
        assert_eq!(b.outstanding(), Amount::ZERO);
        assert_eq!(classify(&b, None, now()), AccountStatus::GoodStanding);
    }

    #[test]
    fn reduce_reports_applied_part() {
        let mut b = borrowed(50_000);
        let applied = b.reduce(BalanceKind::Borrowed, Amount::from_minor(60_000));
        assert_eq!(applied, Amount::from_minor(50_000));
        assert_eq!(b.borrowed, Amount::ZERO);
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in [AccountStatus::GoodStanding, AccountStatus::Owing, AccountStatus::Overdue] {
            assert_eq!(s.as_str().parse::<AccountStatus>().unwrap(), s);
        }
        assert!("closed".parse::<AccountStatus>().is_err());
    }

    proptest! {
        #[test]
        fn classify_is_deterministic(
            b in -1_000i64..1_000_000,
            f in -1_000i64..1_000_000,
            d in -1_000i64..1_000_000,
            offset_days in prop::option::of(-60i64..60),
        ) {
            let balances = Balances::new(Amount::from_minor(b), Amount::from_minor(f), Amount::from_minor(d));
            let due = offset_days.map(|o| now() + Duration::days(o));

            let first = classify(&balances, due, now());
            prop_assert_eq!(first, classify(&balances, due, now()));
            prop_assert_eq!(first == AccountStatus::GoodStanding, balances.outstanding().is_zero());
        }
    }
}
