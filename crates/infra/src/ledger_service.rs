//! Application service for the club ledger.
//!
//! Every operation takes the acting [`Principal`] explicitly and runs
//! `authorize -> resolve account -> dispatch (with retry) -> sync read models`.
//! Authorization and validation happen before any append, so a rejected
//! call never leaves a partial write behind.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use clubledger_auth::{Action, Principal, authorize};
use clubledger_core::{AccountId, Amount, MemberId};
use clubledger_events::{EventBus, EventEnvelope, InMemoryEventBus, Projection};
use clubledger_ledger::{
    Account, AccountCommand, AccountEvent, AccountState, AccountStats, AccountStatus, Activity, Actor,
    DeleteAccount, MarkOverdue, OpenAccount, OverrideStatus, PaymentCategory, RecordBorrow, RecordDues,
    RecordFine, RecordPayment,
};

use crate::activity_log::{ActivityLog, ActivityQuery, InMemoryActivityLog};
use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::error::LedgerError;
use crate::event_store::{EventStore, InMemoryEventStore, StoredEvent};
use crate::projections::{AccountsProjection, ActivityProjection, ProjectionError};
use crate::sweep::{SweepReport, is_sweep_candidate, run_sweep};

pub const ACCOUNT_AGGREGATE: &str = "ledger.account";

/// Source of "now"; swapped out in tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub type InMemoryBus = InMemoryEventBus<EventEnvelope<JsonValue>>;

pub struct LedgerService<S = Arc<InMemoryEventStore>, B = Arc<InMemoryBus>, L = InMemoryActivityLog>
where
    L: ActivityLog,
{
    dispatcher: CommandDispatcher<S, B>,
    accounts: AccountsProjection,
    activities: ActivityProjection<L>,
    /// Serializes opens so a member never ends up with two accounts.
    open_lock: Mutex<()>,
    max_attempts: u32,
    clock: Clock,
}

impl LedgerService {
    pub fn in_memory(max_attempts: u32) -> Self {
        Self::new(
            Arc::new(InMemoryEventStore::new()),
            Arc::new(InMemoryBus::new()),
            Arc::new(InMemoryActivityLog::new()),
            max_attempts,
        )
    }
}

impl<S, B, L> LedgerService<S, B, L>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
    L: ActivityLog,
{
    pub fn new(store: S, bus: B, activity_log: Arc<L>, max_attempts: u32) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(store, bus),
            accounts: AccountsProjection::in_memory(),
            activities: ActivityProjection::new(activity_log),
            open_lock: Mutex::new(()),
            max_attempts: max_attempts.max(1),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn dispatcher(&self) -> &CommandDispatcher<S, B> {
        &self.dispatcher
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    // ----- account lifecycle -------------------------------------------------

    /// Open an account for `member_id`. Conflict if one is already open.
    pub fn open_account(&self, member_id: MemberId, actor: &Principal) -> Result<AccountState, LedgerError> {
        self.traced("open_account", actor, Some(member_id), || {
            authorize(actor, &Action::OpenAccount)?;

            let _guard = self
                .open_lock
                .lock()
                .map_err(|_| LedgerError::Internal("open lock poisoned".into()))?;

            if self.accounts.account_id_for(member_id).is_some() {
                return Err(LedgerError::Conflict(format!(
                    "member {member_id} already has an account"
                )));
            }

            let account_id = AccountId::new();
            self.execute(AccountCommand::Open(OpenAccount {
                account_id,
                member_id,
                actor: Actor::from(actor),
                occurred_at: self.now(),
            }))?;
            self.current(account_id)
        })
    }

    /// Permanently remove a member's account.
    pub fn delete_account(&self, member_id: MemberId, actor: &Principal) -> Result<(), LedgerError> {
        self.traced("delete_account", actor, Some(member_id), || {
            authorize(actor, &Action::DeleteAccount)?;
            let account_id = self.resolve(member_id)?;
            self.execute(AccountCommand::Delete(DeleteAccount {
                account_id,
                actor: Actor::from(actor),
                occurred_at: self.now(),
            }))?;
            Ok(())
        })
    }

    // ----- ledger operations -------------------------------------------------

    pub fn record_borrow(
        &self,
        member_id: MemberId,
        amount: Amount,
        due_date: DateTime<Utc>,
        description: Option<String>,
        actor: &Principal,
    ) -> Result<AccountState, LedgerError> {
        self.traced("record_borrow", actor, Some(member_id), || {
            authorize(actor, &Action::RecordBorrow)?;
            let account_id = self.resolve(member_id)?;
            self.execute(AccountCommand::RecordBorrow(RecordBorrow {
                account_id,
                amount,
                due_date,
                description,
                actor: Actor::from(actor),
                occurred_at: self.now(),
            }))?;
            self.current(account_id)
        })
    }

    pub fn record_payment(
        &self,
        member_id: MemberId,
        amount: Amount,
        category: PaymentCategory,
        description: Option<String>,
        actor: &Principal,
    ) -> Result<AccountState, LedgerError> {
        self.traced("record_payment", actor, Some(member_id), || {
            authorize(actor, &Action::RecordPayment)?;
            let account_id = self.resolve(member_id)?;
            self.execute(AccountCommand::RecordPayment(RecordPayment {
                account_id,
                amount,
                category,
                description,
                actor: Actor::from(actor),
                occurred_at: self.now(),
            }))?;
            self.current(account_id)
        })
    }

    pub fn record_fine(
        &self,
        member_id: MemberId,
        amount: Amount,
        reason: impl Into<String>,
        actor: &Principal,
    ) -> Result<AccountState, LedgerError> {
        let reason = reason.into();
        self.traced("record_fine", actor, Some(member_id), || {
            authorize(actor, &Action::RecordFine)?;
            let account_id = self.resolve(member_id)?;
            self.execute(AccountCommand::RecordFine(RecordFine {
                account_id,
                amount,
                reason,
                actor: Actor::from(actor),
                occurred_at: self.now(),
            }))?;
            self.current(account_id)
        })
    }

    pub fn record_dues(
        &self,
        member_id: MemberId,
        amount: Amount,
        description: Option<String>,
        actor: &Principal,
    ) -> Result<AccountState, LedgerError> {
        self.traced("record_dues", actor, Some(member_id), || {
            authorize(actor, &Action::RecordDues)?;
            let account_id = self.resolve(member_id)?;
            self.execute(AccountCommand::RecordDues(RecordDues {
                account_id,
                amount,
                description,
                actor: Actor::from(actor),
                occurred_at: self.now(),
            }))?;
            self.current(account_id)
        })
    }

    /// Administrative override; balances are left untouched.
    pub fn set_account_status(
        &self,
        account_id: AccountId,
        status: AccountStatus,
        actor: &Principal,
    ) -> Result<AccountState, LedgerError> {
        self.traced("set_account_status", actor, None, || {
            authorize(actor, &Action::OverrideStatus)?;
            self.execute(AccountCommand::OverrideStatus(OverrideStatus {
                account_id,
                status,
                actor: Actor::from(actor),
                occurred_at: self.now(),
            }))?;
            self.current(account_id)
        })
    }

    // ----- queries -----------------------------------------------------------

    pub fn get_account_by_member(&self, member_id: MemberId, actor: &Principal) -> Result<AccountState, LedgerError> {
        authorize(actor, &Action::ReadAccount { member_id })?;
        self.accounts
            .by_member(member_id)
            .ok_or_else(|| LedgerError::not_found(format!("no account for member {member_id}")))
    }

    /// Stats for one member, or treasury-wide when `member_id` is `None`.
    pub fn get_account_stats(
        &self,
        member_id: Option<MemberId>,
        actor: &Principal,
    ) -> Result<AccountStats, LedgerError> {
        authorize(actor, &Action::ReadStats { member_id })?;
        match member_id {
            Some(member_id) => {
                let state = self
                    .accounts
                    .by_member(member_id)
                    .ok_or_else(|| LedgerError::not_found(format!("no account for member {member_id}")))?;
                Ok(AccountStats::collect([&state]))
            }
            None => Ok(AccountStats::collect(&self.accounts.list())),
        }
    }

    pub fn list_activities(&self, query: &ActivityQuery, actor: &Principal) -> Result<Vec<Activity>, LedgerError> {
        authorize(
            actor,
            &Action::ReadActivities {
                member_id: query.member_id,
            },
        )?;
        Ok(self.activities.log().list(query))
    }

    // ----- maintenance -------------------------------------------------------

    /// Move every owing account past its due date to overdue.
    ///
    /// An authorization failure aborts before any account is touched; a
    /// failing account is reported and the sweep carries on.
    pub fn sweep_overdue(&self, actor: &Principal) -> Result<SweepReport, LedgerError> {
        if let Err(e) = authorize(actor, &Action::SweepOverdue) {
            warn!(actor = %actor.email, error = %e, "overdue sweep rejected");
            return Err(e.into());
        }

        let now = self.now();
        let candidates: Vec<AccountState> = self
            .accounts
            .list()
            .into_iter()
            .filter(|s| is_sweep_candidate(s, now))
            .collect();

        let report = run_sweep(now, candidates, || self.now(), |state| {
            let committed = self.execute(AccountCommand::MarkOverdue(MarkOverdue {
                account_id: state.account_id,
                actor: Actor::from(actor),
                occurred_at: now,
            }))?;
            Ok(!committed.is_empty())
        });

        info!(
            actor = %actor.email,
            processed = report.processed,
            transitioned = report.transitioned,
            skipped = report.skipped,
            failed = report.failures.len(),
            "overdue sweep finished"
        );
        Ok(report)
    }

    /// Remove activities older than `older_than`; returns how many went.
    pub fn purge_activities(&self, older_than: DateTime<Utc>, actor: &Principal) -> Result<usize, LedgerError> {
        self.traced("purge_activities", actor, None, || {
            authorize(actor, &Action::PurgeActivities)?;
            Ok(self.activities.log().purge_older_than(older_than))
        })
    }

    /// Purge with a cutoff of `retention` before now.
    pub fn purge_expired_activities(&self, retention: Duration, actor: &Principal) -> Result<usize, LedgerError> {
        self.purge_activities(self.now() - retention, actor)
    }

    // ----- internals ---------------------------------------------------------

    fn resolve(&self, member_id: MemberId) -> Result<AccountId, LedgerError> {
        self.accounts
            .account_id_for(member_id)
            .ok_or_else(|| LedgerError::not_found(format!("no account for member {member_id}")))
    }

    fn current(&self, account_id: AccountId) -> Result<AccountState, LedgerError> {
        self.accounts
            .get(account_id)
            .ok_or_else(|| LedgerError::not_found(format!("account {account_id}")))
    }

    fn execute(&self, command: AccountCommand) -> Result<Vec<StoredEvent>, LedgerError> {
        let aggregate_id = command.account_id().aggregate_id();
        let dispatched = self.dispatcher.dispatch_with_retry(
            aggregate_id,
            ACCOUNT_AGGREGATE,
            &command,
            self.max_attempts,
            |id| Account::empty(id.into()),
        );
        let committed = match dispatched {
            Ok(committed) => committed,
            // The append stands; read models below are synced from the store.
            Err(DispatchError::Publish { reason, committed }) => {
                warn!(
                    account_id = %command.account_id(),
                    events = committed.len(),
                    error = %reason,
                    "events committed but not published"
                );
                committed
            }
            Err(e) => return Err(e.into()),
        };
        if !committed.is_empty() {
            self.sync(command.account_id())?;
        }
        Ok(committed)
    }

    /// Bring both read models up to the head of the account's stream.
    ///
    /// Replays the whole stream; cursors skip what was already applied, so
    /// concurrent callers never double-apply.
    fn sync(&self, account_id: AccountId) -> Result<(), LedgerError> {
        let stream = self
            .dispatcher
            .store()
            .load_stream(account_id.aggregate_id())
            .map_err(|e| LedgerError::Internal(e.to_string()))?;

        for stored in &stream {
            let envelope: EventEnvelope<AccountEvent> = stored
                .to_typed_envelope()
                .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;
            self.accounts.apply(&envelope)?;
            self.activities.apply(&envelope)?;
        }
        Ok(())
    }

    fn traced<T>(
        &self,
        operation: &'static str,
        actor: &Principal,
        member_id: Option<MemberId>,
        f: impl FnOnce() -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let result = f();
        let member = member_id.map(|m| m.to_string()).unwrap_or_default();
        match &result {
            Ok(_) => info!(operation, actor = %actor.email, member_id = %member, "ledger operation applied"),
            Err(e) => warn!(
                operation,
                actor = %actor.email,
                member_id = %member,
                code = e.code(),
                error = %e,
                "ledger operation rejected"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubledger_auth::{AuthzError, Role};
    use clubledger_ledger::EntryKind;

    fn admin() -> Principal {
        Principal::new("Admin", "admin@club.org", vec![Role::ADMIN])
    }

    fn treasurer() -> Principal {
        Principal::new("Tess", "tess@club.org", vec![Role::TREASURER])
    }

    fn minor(v: i64) -> Amount {
        Amount::from_minor(v)
    }

    fn fixed_clock(at: DateTime<Utc>) -> Clock {
        Arc::new(move || at)
    }

    #[test]
    fn open_then_borrow_and_pay() {
        let svc = LedgerService::in_memory(5);
        let member = MemberId::new();
        let due = Utc::now() + Duration::days(14);

        svc.open_account(member, &admin()).unwrap();
        let state = svc
            .record_borrow(member, minor(5_000), due, Some("tent".into()), &treasurer())
            .unwrap();
        assert_eq!(state.status, AccountStatus::Owing);
        assert_eq!(state.due_date, Some(due));

        let state = svc
            .record_payment(member, minor(5_000), PaymentCategory::BorrowPayment, None, &treasurer())
            .unwrap();
        assert_eq!(state.status, AccountStatus::GoodStanding);
        assert_eq!(state.current.borrowed, Amount::ZERO);
        assert_eq!(state.total.borrowed, minor(5_000));
        assert_eq!(state.due_date, None);
        assert_eq!(state.payment_history.len(), 2);
        assert_eq!(state.payment_history[1].kind, EntryKind::BorrowPayment);
    }

    #[test]
    fn opening_twice_conflicts() {
        let svc = LedgerService::in_memory(5);
        let member = MemberId::new();
        svc.open_account(member, &admin()).unwrap();

        let err = svc.open_account(member, &admin()).unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[test]
    fn unknown_member_is_not_found() {
        let svc = LedgerService::in_memory(5);
        let err = svc
            .record_fine(MemberId::new(), minor(100), "late", &treasurer())
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn authorization_runs_before_lookup() {
        let svc = LedgerService::in_memory(5);
        let secretary = Principal::new("Sec", "sec@club.org", vec![Role::SECRETARY]);

        let err = svc
            .record_fine(MemberId::new(), minor(100), "late", &secretary)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(AuthzError::Forbidden(_))));
    }

    #[test]
    fn validation_errors_do_not_write() {
        let svc = LedgerService::in_memory(5);
        let member = MemberId::new();
        svc.open_account(member, &admin()).unwrap();

        let err = svc
            .record_dues(member, minor(0), None, &treasurer())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        let err = svc.record_fine(member, minor(50), "  ", &treasurer()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        assert_eq!(svc.dispatcher().store().event_count(), 1);
    }

    #[test]
    fn members_read_only_their_own_account() {
        let svc = LedgerService::in_memory(5);
        let (mine, theirs) = (MemberId::new(), MemberId::new());
        svc.open_account(mine, &admin()).unwrap();
        svc.open_account(theirs, &admin()).unwrap();
        let me = Principal::new("Mo", "mo@club.org", vec![Role::MEMBER]).with_member(mine);

        assert!(svc.get_account_by_member(mine, &me).is_ok());
        assert!(svc.get_account_stats(Some(mine), &me).is_ok());
        assert!(matches!(
            svc.get_account_by_member(theirs, &me),
            Err(LedgerError::Unauthorized(_))
        ));
        assert!(matches!(svc.get_account_stats(None, &me), Err(LedgerError::Unauthorized(_))));
    }

    #[test]
    fn sweep_marks_only_past_due_owing_accounts() {
        let now = Utc::now();
        let svc = LedgerService::in_memory(5).with_clock(fixed_clock(now));
        let (late, on_time, clear) = (MemberId::new(), MemberId::new(), MemberId::new());
        for m in [late, on_time, clear] {
            svc.open_account(m, &admin()).unwrap();
        }
        // A past due date is already overdue on write; put it back to owing.
        let late_account = svc
            .record_borrow(late, minor(100), now - Duration::days(1), None, &treasurer())
            .unwrap();
        svc.set_account_status(late_account.account_id, AccountStatus::Owing, &admin())
            .unwrap();
        svc.record_borrow(on_time, minor(100), now + Duration::days(1), None, &treasurer())
            .unwrap();

        let report = svc.sweep_overdue(&Principal::system()).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.transitioned, 1);
        assert!(report.is_clean());
        assert_eq!(report.started_at, now);
        assert_eq!(report.finished_at, now);

        let system = Principal::system();
        let view = |m| svc.get_account_by_member(m, &admin()).unwrap().status;
        assert_eq!(view(late), AccountStatus::Overdue);
        assert_eq!(view(on_time), AccountStatus::Owing);
        assert_eq!(view(clear), AccountStatus::GoodStanding);

        // Second run has nothing to do.
        let again = svc.sweep_overdue(&system).unwrap();
        assert_eq!(again.processed, 0);
        assert_eq!(again.transitioned, 0);
    }

    /// Stores fine, refuses every publish.
    struct ClosedBus(InMemoryBus);

    impl EventBus<EventEnvelope<JsonValue>> for ClosedBus {
        type Error = &'static str;

        fn publish(&self, _message: EventEnvelope<JsonValue>) -> Result<(), Self::Error> {
            Err("bus closed")
        }

        fn subscribe(&self) -> clubledger_events::Subscription<EventEnvelope<JsonValue>> {
            self.0.subscribe()
        }
    }

    fn closed_bus_service() -> LedgerService<Arc<InMemoryEventStore>, ClosedBus> {
        LedgerService::new(
            Arc::new(InMemoryEventStore::new()),
            ClosedBus(InMemoryBus::new()),
            Arc::new(InMemoryActivityLog::new()),
            5,
        )
    }

    #[test]
    fn unpublished_commits_still_reach_the_read_models() {
        let svc = closed_bus_service();
        let member = MemberId::new();

        let opened = svc.open_account(member, &admin()).unwrap();
        assert_eq!(svc.dispatcher().store().event_count(), 1);

        // A retried open sees the committed account.
        let retry = svc.open_account(member, &admin()).unwrap_err();
        assert!(matches!(retry, LedgerError::Conflict(_)));
        assert_eq!(svc.dispatcher().store().event_count(), 1);

        let state = svc.record_fine(member, minor(250), "late", &treasurer()).unwrap();
        assert_eq!(state.account_id, opened.account_id);
        assert_eq!(state.current.fine, minor(250));
        assert_eq!(svc.get_account_by_member(member, &admin()).unwrap(), state);
        assert_eq!(
            svc.list_activities(&ActivityQuery::for_member(member), &admin())
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn sweep_rejects_unauthorized_actor() {
        let svc = LedgerService::in_memory(5);
        let err = svc.sweep_overdue(&treasurer()).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized(_)));
    }

    #[test]
    fn override_and_delete_are_admin_only() {
        let svc = LedgerService::in_memory(5);
        let member = MemberId::new();
        let account = svc.open_account(member, &admin()).unwrap();

        assert!(svc
            .set_account_status(account.account_id, AccountStatus::Overdue, &treasurer())
            .is_err());
        let state = svc
            .set_account_status(account.account_id, AccountStatus::Overdue, &admin())
            .unwrap();
        assert_eq!(state.status, AccountStatus::Overdue);

        assert!(svc.delete_account(member, &treasurer()).is_err());
        svc.delete_account(member, &admin()).unwrap();
        assert!(matches!(
            svc.get_account_by_member(member, &admin()),
            Err(LedgerError::NotFound(_))
        ));

        // The member may be given a fresh account afterwards.
        let reopened = svc.open_account(member, &admin()).unwrap();
        assert_ne!(reopened.account_id, account.account_id);
    }

    #[test]
    fn every_change_writes_an_activity() {
        let svc = LedgerService::in_memory(5);
        let member = MemberId::new();
        svc.open_account(member, &admin()).unwrap();
        svc.record_dues(member, minor(2_500), Some("2024".into()), &treasurer())
            .unwrap();
        svc.record_fine(member, minor(300), "late return", &treasurer()).unwrap();

        let log = svc
            .list_activities(&ActivityQuery::for_member(member), &admin())
            .unwrap();
        let actions: Vec<&str> = log.iter().map(|a| a.action()).collect();
        assert_eq!(log.len(), 3);
        assert!(actions.contains(&"account_opened"));
        assert!(actions.contains(&"dues_recorded"));
        assert!(actions.contains(&"fine_recorded"));
        assert!(log.iter().filter(|a| a.action() != "account_opened").all(|a| a.actor.display_name == "Tess"));
    }

    proptest::proptest! {
        #[test]
        fn payments_never_push_balances_below_zero(
            charges in proptest::collection::vec(1i64..5_000, 1..5),
            payments in proptest::collection::vec((0usize..3, 1i64..8_000), 0..12),
        ) {
            let svc = LedgerService::in_memory(5);
            let member = MemberId::new();
            svc.open_account(member, &admin()).unwrap();
            for c in &charges {
                svc.record_dues(member, minor(*c), None, &treasurer()).unwrap();
            }
            let charged: i64 = charges.iter().sum();

            let categories = [
                PaymentCategory::FinePayment,
                PaymentCategory::BorrowPayment,
                PaymentCategory::DuePayment,
            ];
            for (cat, amount) in &payments {
                let state = svc
                    .record_payment(member, minor(*amount), categories[*cat], None, &treasurer())
                    .unwrap();
                proptest::prop_assert!(state.current.dues.minor() >= 0);
                proptest::prop_assert!(state.current.fine.minor() >= 0);
                proptest::prop_assert_eq!(state.total.dues, minor(charged));
                proptest::prop_assert_eq!(
                    state.status == AccountStatus::GoodStanding,
                    state.outstanding().is_zero()
                );
            }
        }
    }
}
