use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clubledger_auth::{Principal, PrincipalId};
use clubledger_core::{AccountId, Aggregate, AggregateRoot, Amount, DomainError, DomainResult, MemberId};
use clubledger_events::Event;

use crate::entry::{EntryKind, LedgerEntry, PaymentCategory};
use crate::status::{AccountStatus, BalanceKind, Balances, classify};

/// Who performed a change, as recorded on events and activities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub principal_id: PrincipalId,
    pub display_name: String,
}

impl From<&Principal> for Actor {
    fn from(p: &Principal) -> Self {
        Self {
            principal_id: p.id,
            display_name: p.display_name.clone(),
        }
    }
}

/// Full ledger record of one member's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    pub account_id: AccountId,
    pub member_id: MemberId,
    pub current: Balances,
    /// Lifetime totals; never decrease.
    pub total: Balances,
    /// Cumulative amounts ever added, kept for treasury-wide aggregation.
    pub balance_to_balance: Balances,
    pub due_date: Option<DateTime<Utc>>,
    pub status: AccountStatus,
    pub payment_history: Vec<LedgerEntry>,
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountState {
    fn opened(account_id: AccountId, member_id: MemberId, at: DateTime<Utc>) -> Self {
        Self {
            account_id,
            member_id,
            current: Balances::default(),
            total: Balances::default(),
            balance_to_balance: Balances::default(),
            due_date: None,
            status: AccountStatus::GoodStanding,
            payment_history: Vec::new(),
            opened_at: at,
            updated_at: at,
        }
    }

    pub fn outstanding(&self) -> Amount {
        self.current.outstanding()
    }

    /// Add to the current balance, lifetime total and cumulative figure alike.
    fn charge(&mut self, kind: BalanceKind, amount: Amount) {
        self.current.increase(kind, amount);
        self.total.increase(kind, amount);
        self.balance_to_balance.increase(kind, amount);
    }

    fn ensure_chargeable(&self, kind: BalanceKind, amount: Amount) -> DomainResult<Balances> {
        self.total.checked_increase(kind, amount)?;
        self.balance_to_balance.checked_increase(kind, amount)?;
        self.current.checked_increase(kind, amount)
    }
}

/// Aggregate root: one member's account.
///
/// Rehydrated from its event stream; `state` is `None` until the account is
/// opened. A deleted account keeps its state but rejects every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    state: Option<AccountState>,
    version: u64,
    deleted: bool,
}

impl Account {
    /// Empty aggregate for rehydration.
    pub fn empty(id: AccountId) -> Self {
        Self {
            id,
            state: None,
            version: 0,
            deleted: false,
        }
    }

    pub fn state(&self) -> Option<&AccountState> {
        self.state.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some() && !self.deleted
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn live(&self) -> DomainResult<&AccountState> {
        match &self.state {
            Some(state) if !self.deleted => Ok(state),
            _ => Err(DomainError::not_found(format!("account {}", self.id))),
        }
    }
}

impl AggregateRoot for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAccount {
    pub account_id: AccountId,
    pub member_id: MemberId,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBorrow {
    pub account_id: AccountId,
    pub amount: Amount,
    pub due_date: DateTime<Utc>,
    pub description: Option<String>,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub account_id: AccountId,
    pub amount: Amount,
    pub category: PaymentCategory,
    pub description: Option<String>,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFine {
    pub account_id: AccountId,
    pub amount: Amount,
    pub reason: String,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDues {
    pub account_id: AccountId,
    pub amount: Amount,
    pub description: Option<String>,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideStatus {
    pub account_id: AccountId,
    pub status: AccountStatus,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

/// Sweep command; `occurred_at` doubles as "now" for the due-date check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkOverdue {
    pub account_id: AccountId,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAccount {
    pub account_id: AccountId,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountCommand {
    Open(OpenAccount),
    RecordBorrow(RecordBorrow),
    RecordPayment(RecordPayment),
    RecordFine(RecordFine),
    RecordDues(RecordDues),
    OverrideStatus(OverrideStatus),
    MarkOverdue(MarkOverdue),
    Delete(DeleteAccount),
}

impl AccountCommand {
    pub fn account_id(&self) -> AccountId {
        match self {
            AccountCommand::Open(c) => c.account_id,
            AccountCommand::RecordBorrow(c) => c.account_id,
            AccountCommand::RecordPayment(c) => c.account_id,
            AccountCommand::RecordFine(c) => c.account_id,
            AccountCommand::RecordDues(c) => c.account_id,
            AccountCommand::OverrideStatus(c) => c.account_id,
            AccountCommand::MarkOverdue(c) => c.account_id,
            AccountCommand::Delete(c) => c.account_id,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOpened {
    pub account_id: AccountId,
    pub member_id: MemberId,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRecorded {
    pub account_id: AccountId,
    pub member_id: MemberId,
    pub amount: Amount,
    pub due_date: DateTime<Utc>,
    pub description: Option<String>,
    pub status: AccountStatus,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecorded {
    pub account_id: AccountId,
    pub member_id: MemberId,
    pub category: PaymentCategory,
    pub amount: Amount,
    /// Part of `amount` that reduced the balance; the rest was absorbed.
    pub applied: Amount,
    pub due_date_cleared: bool,
    pub description: Option<String>,
    pub status: AccountStatus,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineRecorded {
    pub account_id: AccountId,
    pub member_id: MemberId,
    pub amount: Amount,
    pub reason: String,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuesRecorded {
    pub account_id: AccountId,
    pub member_id: MemberId,
    pub amount: Amount,
    pub description: Option<String>,
    pub status: AccountStatus,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOverridden {
    pub account_id: AccountId,
    pub member_id: MemberId,
    pub from: AccountStatus,
    pub to: AccountStatus,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedOverdue {
    pub account_id: AccountId,
    pub member_id: MemberId,
    pub due_date: DateTime<Utc>,
    pub outstanding: Amount,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDeleted {
    pub account_id: AccountId,
    pub member_id: MemberId,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountEvent {
    Opened(AccountOpened),
    BorrowRecorded(BorrowRecorded),
    PaymentRecorded(PaymentRecorded),
    FineRecorded(FineRecorded),
    DuesRecorded(DuesRecorded),
    StatusOverridden(StatusOverridden),
    MarkedOverdue(MarkedOverdue),
    Deleted(AccountDeleted),
}

impl AccountEvent {
    pub fn account_id(&self) -> AccountId {
        match self {
            AccountEvent::Opened(e) => e.account_id,
            AccountEvent::BorrowRecorded(e) => e.account_id,
            AccountEvent::PaymentRecorded(e) => e.account_id,
            AccountEvent::FineRecorded(e) => e.account_id,
            AccountEvent::DuesRecorded(e) => e.account_id,
            AccountEvent::StatusOverridden(e) => e.account_id,
            AccountEvent::MarkedOverdue(e) => e.account_id,
            AccountEvent::Deleted(e) => e.account_id,
        }
    }

    pub fn member_id(&self) -> MemberId {
        match self {
            AccountEvent::Opened(e) => e.member_id,
            AccountEvent::BorrowRecorded(e) => e.member_id,
            AccountEvent::PaymentRecorded(e) => e.member_id,
            AccountEvent::FineRecorded(e) => e.member_id,
            AccountEvent::DuesRecorded(e) => e.member_id,
            AccountEvent::StatusOverridden(e) => e.member_id,
            AccountEvent::MarkedOverdue(e) => e.member_id,
            AccountEvent::Deleted(e) => e.member_id,
        }
    }

    pub fn actor(&self) -> &Actor {
        match self {
            AccountEvent::Opened(e) => &e.actor,
            AccountEvent::BorrowRecorded(e) => &e.actor,
            AccountEvent::PaymentRecorded(e) => &e.actor,
            AccountEvent::FineRecorded(e) => &e.actor,
            AccountEvent::DuesRecorded(e) => &e.actor,
            AccountEvent::StatusOverridden(e) => &e.actor,
            AccountEvent::MarkedOverdue(e) => &e.actor,
            AccountEvent::Deleted(e) => &e.actor,
        }
    }
}

impl Event for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::Opened(_) => "ledger.account.opened",
            AccountEvent::BorrowRecorded(_) => "ledger.account.borrow_recorded",
            AccountEvent::PaymentRecorded(_) => "ledger.account.payment_recorded",
            AccountEvent::FineRecorded(_) => "ledger.account.fine_recorded",
            AccountEvent::DuesRecorded(_) => "ledger.account.dues_recorded",
            AccountEvent::StatusOverridden(_) => "ledger.account.status_overridden",
            AccountEvent::MarkedOverdue(_) => "ledger.account.marked_overdue",
            AccountEvent::Deleted(_) => "ledger.account.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AccountEvent::Opened(e) => e.occurred_at,
            AccountEvent::BorrowRecorded(e) => e.occurred_at,
            AccountEvent::PaymentRecorded(e) => e.occurred_at,
            AccountEvent::FineRecorded(e) => e.occurred_at,
            AccountEvent::DuesRecorded(e) => e.occurred_at,
            AccountEvent::StatusOverridden(e) => e.occurred_at,
            AccountEvent::MarkedOverdue(e) => e.occurred_at,
            AccountEvent::Deleted(e) => e.occurred_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate
// ─────────────────────────────────────────────────────────────────────────────

impl Aggregate for Account {
    type Command = AccountCommand;
    type Event = AccountEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AccountEvent::Opened(e) => {
                self.id = e.account_id;
                self.state = Some(AccountState::opened(e.account_id, e.member_id, e.occurred_at));
            }
            AccountEvent::Deleted(_) => {
                self.deleted = true;
            }
            other => {
                if let Some(state) = self.state.as_mut() {
                    apply_to_state(state, other);
                }
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AccountCommand::Open(cmd) => self.handle_open(cmd),
            AccountCommand::RecordBorrow(cmd) => self.handle_borrow(cmd),
            AccountCommand::RecordPayment(cmd) => self.handle_payment(cmd),
            AccountCommand::RecordFine(cmd) => self.handle_fine(cmd),
            AccountCommand::RecordDues(cmd) => self.handle_dues(cmd),
            AccountCommand::OverrideStatus(cmd) => self.handle_override(cmd),
            AccountCommand::MarkOverdue(cmd) => self.handle_mark_overdue(cmd),
            AccountCommand::Delete(cmd) => self.handle_delete(cmd),
        }
    }
}

fn apply_to_state(state: &mut AccountState, event: &AccountEvent) {
    match event {
        AccountEvent::BorrowRecorded(e) => {
            state.charge(BalanceKind::Borrowed, e.amount);
            state.due_date = Some(e.due_date);
            state.status = e.status;
            state.payment_history.push(LedgerEntry {
                kind: EntryKind::Borrow,
                amount: e.amount,
                date: e.occurred_at,
                description: e.description.clone(),
                due_date: Some(e.due_date),
            });
        }
        AccountEvent::PaymentRecorded(e) => {
            state.current.reduce(e.category.target(), e.applied);
            if e.due_date_cleared {
                state.due_date = None;
            }
            state.status = e.status;
            state.payment_history.push(LedgerEntry {
                kind: e.category.into(),
                amount: e.amount,
                date: e.occurred_at,
                description: e.description.clone(),
                due_date: None,
            });
        }
        AccountEvent::FineRecorded(e) => {
            state.charge(BalanceKind::Fine, e.amount);
            state.status = AccountStatus::Owing;
            state.payment_history.push(LedgerEntry {
                kind: EntryKind::Fine,
                amount: e.amount,
                date: e.occurred_at,
                description: Some(e.reason.clone()),
                due_date: None,
            });
        }
        AccountEvent::DuesRecorded(e) => {
            state.charge(BalanceKind::Dues, e.amount);
            state.status = e.status;
            state.payment_history.push(LedgerEntry {
                kind: EntryKind::Dues,
                amount: e.amount,
                date: e.occurred_at,
                description: e.description.clone(),
                due_date: None,
            });
        }
        AccountEvent::StatusOverridden(e) => state.status = e.to,
        AccountEvent::MarkedOverdue(_) => state.status = AccountStatus::Overdue,
        AccountEvent::Opened(_) | AccountEvent::Deleted(_) => return,
    }
    state.updated_at = event.occurred_at();
}

/// Trim free text; blank means absent.
fn clean(text: &Option<String>) -> Option<String> {
    text.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl Account {
    fn handle_open(&self, cmd: &OpenAccount) -> Result<Vec<AccountEvent>, DomainError> {
        if self.deleted {
            return Err(DomainError::conflict(format!("account {} was deleted", cmd.account_id)));
        }
        if self.state.is_some() {
            return Err(DomainError::conflict(format!("account {} already open", cmd.account_id)));
        }

        Ok(vec![AccountEvent::Opened(AccountOpened {
            account_id: cmd.account_id,
            member_id: cmd.member_id,
            actor: cmd.actor.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_borrow(&self, cmd: &RecordBorrow) -> Result<Vec<AccountEvent>, DomainError> {
        let state = self.live()?;
        let amount = cmd.amount.ensure_positive("amount")?;
        let current = state.ensure_chargeable(BalanceKind::Borrowed, amount)?;

        // The new due date replaces any earlier one.
        let status = classify(&current, Some(cmd.due_date), cmd.occurred_at);

        Ok(vec![AccountEvent::BorrowRecorded(BorrowRecorded {
            account_id: state.account_id,
            member_id: state.member_id,
            amount,
            due_date: cmd.due_date,
            description: clean(&cmd.description),
            status,
            actor: cmd.actor.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_payment(&self, cmd: &RecordPayment) -> Result<Vec<AccountEvent>, DomainError> {
        let state = self.live()?;
        let amount = cmd.amount.ensure_positive("amount")?;

        let mut current = state.current;
        let applied = current.reduce(cmd.category.target(), amount);

        let due_date_cleared = cmd.category == PaymentCategory::BorrowPayment
            && current.borrowed.is_zero()
            && state.due_date.is_some();
        let due_date = if due_date_cleared { None } else { state.due_date };
        let status = classify(&current, due_date, cmd.occurred_at);

        Ok(vec![AccountEvent::PaymentRecorded(PaymentRecorded {
            account_id: state.account_id,
            member_id: state.member_id,
            category: cmd.category,
            amount,
            applied,
            due_date_cleared,
            description: clean(&cmd.description),
            status,
            actor: cmd.actor.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_fine(&self, cmd: &RecordFine) -> Result<Vec<AccountEvent>, DomainError> {
        let state = self.live()?;
        let amount = cmd.amount.ensure_positive("amount")?;
        let reason = cmd.reason.trim();
        if reason.is_empty() {
            return Err(DomainError::validation("reason is required"));
        }
        state.ensure_chargeable(BalanceKind::Fine, amount)?;

        Ok(vec![AccountEvent::FineRecorded(FineRecorded {
            account_id: state.account_id,
            member_id: state.member_id,
            amount,
            reason: reason.to_string(),
            actor: cmd.actor.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_dues(&self, cmd: &RecordDues) -> Result<Vec<AccountEvent>, DomainError> {
        let state = self.live()?;
        let amount = cmd.amount.ensure_positive("amount")?;
        let current = state.ensure_chargeable(BalanceKind::Dues, amount)?;
        let status = classify(&current, state.due_date, cmd.occurred_at);

        Ok(vec![AccountEvent::DuesRecorded(DuesRecorded {
            account_id: state.account_id,
            member_id: state.member_id,
            amount,
            description: clean(&cmd.description),
            status,
            actor: cmd.actor.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_override(&self, cmd: &OverrideStatus) -> Result<Vec<AccountEvent>, DomainError> {
        let state = self.live()?;

        Ok(vec![AccountEvent::StatusOverridden(StatusOverridden {
            account_id: state.account_id,
            member_id: state.member_id,
            from: state.status,
            to: cmd.status,
            actor: cmd.actor.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_overdue(&self, cmd: &MarkOverdue) -> Result<Vec<AccountEvent>, DomainError> {
        let state = self.live()?;
        let outstanding = state.outstanding();

        let due_date = match state.due_date {
            Some(due) if state.status == AccountStatus::Owing && due < cmd.occurred_at => due,
            _ => return Ok(Vec::new()),
        };
        if !outstanding.is_positive() {
            return Ok(Vec::new());
        }

        Ok(vec![AccountEvent::MarkedOverdue(MarkedOverdue {
            account_id: state.account_id,
            member_id: state.member_id,
            due_date,
            outstanding,
            actor: cmd.actor.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteAccount) -> Result<Vec<AccountEvent>, DomainError> {
        let state = self.live()?;

        Ok(vec![AccountEvent::Deleted(AccountDeleted {
            account_id: state.account_id,
            member_id: state.member_id,
            actor: cmd.actor.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use clubledger_events::execute;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 9, 30, 0).unwrap()
    }

    fn actor() -> Actor {
        Actor::from(&Principal::new("Tess Treasurer", "tess@club.test", vec![]))
    }

    fn minor(v: i64) -> Amount {
        Amount::from_minor(v)
    }

    fn opened() -> Account {
        let id = AccountId::new();
        let mut account = Account::empty(id);
        execute(
            &mut account,
            &AccountCommand::Open(OpenAccount {
                account_id: id,
                member_id: MemberId::new(),
                actor: actor(),
                occurred_at: now(),
            }),
        )
        .unwrap();
        account
    }

    fn borrow(account: &mut Account, amount: i64, due_in_days: i64) -> DomainResult<Vec<AccountEvent>> {
        let cmd = AccountCommand::RecordBorrow(RecordBorrow {
            account_id: *account.id(),
            amount: minor(amount),
            due_date: now() + Duration::days(due_in_days),
            description: Some("club kit".into()),
            actor: actor(),
            occurred_at: now(),
        });
        execute(account, &cmd)
    }

    fn pay(account: &mut Account, amount: i64, category: PaymentCategory) -> DomainResult<Vec<AccountEvent>> {
        let cmd = AccountCommand::RecordPayment(RecordPayment {
            account_id: *account.id(),
            amount: minor(amount),
            category,
            description: None,
            actor: actor(),
            occurred_at: now(),
        });
        execute(account, &cmd)
    }

    fn fine(account: &mut Account, amount: i64, reason: &str) -> DomainResult<Vec<AccountEvent>> {
        let cmd = AccountCommand::RecordFine(RecordFine {
            account_id: *account.id(),
            amount: minor(amount),
            reason: reason.into(),
            actor: actor(),
            occurred_at: now(),
        });
        execute(account, &cmd)
    }

    fn mark_overdue(account: &mut Account, at: DateTime<Utc>) -> DomainResult<Vec<AccountEvent>> {
        let cmd = AccountCommand::MarkOverdue(MarkOverdue {
            account_id: *account.id(),
            actor: actor(),
            occurred_at: at,
        });
        execute(account, &cmd)
    }

    fn state(account: &Account) -> &AccountState {
        account.state().unwrap()
    }

    #[test]
    fn new_account_is_good_standing() {
        let account = opened();
        assert_eq!(state(&account).status, AccountStatus::GoodStanding);
        assert_eq!(account.version(), 1);
    }

    #[test]
    fn opening_twice_conflicts() {
        let mut account = opened();
        let cmd = AccountCommand::Open(OpenAccount {
            account_id: *account.id(),
            member_id: MemberId::new(),
            actor: actor(),
            occurred_at: now(),
        });
        assert!(matches!(execute(&mut account, &cmd), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn commands_on_unopened_account_are_not_found() {
        let mut account = Account::empty(AccountId::new());
        assert!(matches!(borrow(&mut account, 100, 5), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn borrow_accumulates_and_overwrites_due_date() {
        let mut account = opened();
        borrow(&mut account, 20_000, 10).unwrap();
        borrow(&mut account, 30_000, 30).unwrap();

        let s = state(&account);
        assert_eq!(s.current.borrowed, minor(50_000));
        assert_eq!(s.total.borrowed, minor(50_000));
        assert_eq!(s.balance_to_balance.borrowed, minor(50_000));
        assert_eq!(s.due_date, Some(now() + Duration::days(30)));
        assert_eq!(s.status, AccountStatus::Owing);
        assert_eq!(s.payment_history.len(), 2);
        assert_eq!(s.payment_history[1].kind, EntryKind::Borrow);
    }

    #[test]
    fn borrow_with_past_due_date_is_overdue_immediately() {
        let mut account = opened();
        borrow(&mut account, 1_000, -1).unwrap();
        assert_eq!(state(&account).status, AccountStatus::Overdue);
    }

    #[test]
    fn non_positive_amount_is_rejected_without_events() {
        let mut account = opened();
        assert!(matches!(borrow(&mut account, 0, 5), Err(DomainError::Validation(_))));
        assert!(matches!(
            pay(&mut account, -10, PaymentCategory::FinePayment),
            Err(DomainError::Validation(_))
        ));
        assert_eq!(account.version(), 1);
    }

    #[test]
    fn overpayment_clamps_to_zero() {
        let mut account = opened();
        borrow(&mut account, 50_000, 30).unwrap();
        let events = pay(&mut account, 60_000, PaymentCategory::BorrowPayment).unwrap();

        let s = state(&account);
        assert_eq!(s.current.borrowed, Amount::ZERO);
        assert_eq!(s.total.borrowed, minor(50_000));
        assert_eq!(s.status, AccountStatus::GoodStanding);
        match &events[0] {
            AccountEvent::PaymentRecorded(e) => {
                assert_eq!(e.amount, minor(60_000));
                assert_eq!(e.applied, minor(50_000));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn paying_off_borrowed_clears_due_date() {
        let mut account = opened();
        borrow(&mut account, 10_000, 30).unwrap();
        pay(&mut account, 4_000, PaymentCategory::BorrowPayment).unwrap();
        assert!(state(&account).due_date.is_some());

        pay(&mut account, 6_000, PaymentCategory::BorrowPayment).unwrap();
        assert_eq!(state(&account).due_date, None);
    }

    #[test]
    fn fine_forces_owing_from_good_standing() {
        let mut account = opened();
        fine(&mut account, 5_000, "late").unwrap();

        let s = state(&account);
        assert_eq!(s.status, AccountStatus::Owing);
        assert_eq!(s.current.fine, minor(5_000));
        assert_eq!(s.total.fine, minor(5_000));
        assert_eq!(s.current.borrowed, Amount::ZERO);
    }

    #[test]
    fn fine_forces_owing_even_when_overdue() {
        let mut account = opened();
        borrow(&mut account, 1_000, -3).unwrap();
        assert_eq!(state(&account).status, AccountStatus::Overdue);

        fine(&mut account, 500, "damaged item").unwrap();
        assert_eq!(state(&account).status, AccountStatus::Owing);
    }

    #[test]
    fn fine_requires_reason() {
        let mut account = opened();
        assert!(matches!(fine(&mut account, 500, "   "), Err(DomainError::Validation(_))));
    }

    #[test]
    fn dues_are_charged_and_reclassified() {
        let mut account = opened();
        let cmd = AccountCommand::RecordDues(RecordDues {
            account_id: *account.id(),
            amount: minor(2_500),
            description: Some("2026 season".into()),
            actor: actor(),
            occurred_at: now(),
        });
        execute(&mut account, &cmd).unwrap();

        let s = state(&account);
        assert_eq!(s.current.dues, minor(2_500));
        assert_eq!(s.balance_to_balance.dues, minor(2_500));
        assert_eq!(s.status, AccountStatus::Owing);
        assert_eq!(s.payment_history[0].kind, EntryKind::Dues);
    }

    #[test]
    fn override_records_old_and_new_status() {
        let mut account = opened();
        borrow(&mut account, 1_000, 10).unwrap();
        let cmd = AccountCommand::OverrideStatus(OverrideStatus {
            account_id: *account.id(),
            status: AccountStatus::GoodStanding,
            actor: actor(),
            occurred_at: now(),
        });
        let events = execute(&mut account, &cmd).unwrap();

        assert_eq!(
            events[0],
            AccountEvent::StatusOverridden(StatusOverridden {
                account_id: *account.id(),
                member_id: state(&account).member_id,
                from: AccountStatus::Owing,
                to: AccountStatus::GoodStanding,
                actor: actor(),
                occurred_at: now(),
            })
        );
        assert_eq!(state(&account).status, AccountStatus::GoodStanding);
        assert_eq!(state(&account).current.borrowed, minor(1_000));
    }

    #[test]
    fn mark_overdue_only_after_due_date_passes() {
        let mut account = opened();
        borrow(&mut account, 1_000, 2).unwrap();

        assert!(mark_overdue(&mut account, now()).unwrap().is_empty());

        let later = now() + Duration::days(3);
        assert_eq!(mark_overdue(&mut account, later).unwrap().len(), 1);
        assert_eq!(state(&account).status, AccountStatus::Overdue);

        // Already overdue: nothing further.
        assert!(mark_overdue(&mut account, later).unwrap().is_empty());
    }

    #[test]
    fn mark_overdue_ignores_owing_account_without_due_date() {
        let mut account = opened();
        fine(&mut account, 100, "noise").unwrap();
        pay(&mut account, 100, PaymentCategory::FinePayment).unwrap();
        assert_eq!(state(&account).status, AccountStatus::GoodStanding);

        let cmd = AccountCommand::OverrideStatus(OverrideStatus {
            account_id: *account.id(),
            status: AccountStatus::Owing,
            actor: actor(),
            occurred_at: now(),
        });
        execute(&mut account, &cmd).unwrap();

        assert!(mark_overdue(&mut account, now() + Duration::days(100)).unwrap().is_empty());
        assert_eq!(state(&account).status, AccountStatus::Owing);
    }

    #[test]
    fn deleted_account_rejects_commands() {
        let mut account = opened();
        let cmd = AccountCommand::Delete(DeleteAccount {
            account_id: *account.id(),
            actor: actor(),
            occurred_at: now(),
        });
        execute(&mut account, &cmd).unwrap();

        assert!(account.is_deleted());
        assert!(!account.is_open());
        assert!(matches!(borrow(&mut account, 100, 1), Err(DomainError::NotFound(_))));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Borrow(i64),
        Pay(i64, PaymentCategory),
        Fine(i64),
    }

    fn op() -> impl Strategy<Value = Op> {
        let category = prop_oneof![
            Just(PaymentCategory::BorrowPayment),
            Just(PaymentCategory::FinePayment),
            Just(PaymentCategory::DuePayment),
        ];
        prop_oneof![
            (1i64..100_000).prop_map(Op::Borrow),
            ((1i64..150_000), category).prop_map(|(a, c)| Op::Pay(a, c)),
            (1i64..10_000).prop_map(Op::Fine),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Balances never go negative and lifetime totals never decrease.
        #[test]
        fn balances_clamped_and_totals_monotonic(ops in prop::collection::vec(op(), 1..40)) {
            let mut account = opened();
            let mut last_total = Balances::default();

            for op in ops {
                match op {
                    Op::Borrow(a) => { borrow(&mut account, a, 10).unwrap(); }
                    Op::Pay(a, c) => { pay(&mut account, a, c).unwrap(); }
                    Op::Fine(a) => { fine(&mut account, a, "late").unwrap(); }
                }

                let s = state(&account);
                prop_assert!(s.current.borrowed >= Amount::ZERO);
                prop_assert!(s.current.fine >= Amount::ZERO);
                prop_assert!(s.current.dues >= Amount::ZERO);
                prop_assert!(s.total.borrowed >= last_total.borrowed);
                prop_assert!(s.total.fine >= last_total.fine);
                prop_assert!(s.current.borrowed <= s.total.borrowed);
                last_total = s.total;
            }
        }
    }
}
