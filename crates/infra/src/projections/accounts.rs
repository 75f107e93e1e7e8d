use std::collections::HashMap;
use std::sync::RwLock;

use clubledger_core::{AccountId, Aggregate, MemberId};
use clubledger_events::{EventEnvelope, Projection};
use clubledger_ledger::{Account, AccountEvent, AccountState};

use super::{ProjectionError, StreamCursors};
use crate::read_model::{InMemoryReadStore, ReadStore};

/// Read model: live accounts, keyed by account and indexed by member.
///
/// Stores the rehydrated aggregate so the same `apply` logic that decides
/// commands also builds the view. Deleted accounts are dropped.
#[derive(Debug)]
pub struct AccountsProjection<S = InMemoryReadStore<AccountId, Account>>
where
    S: ReadStore<AccountId, Account>,
{
    store: S,
    by_member: RwLock<HashMap<MemberId, AccountId>>,
    cursors: StreamCursors,
}

impl AccountsProjection {
    pub fn in_memory() -> Self {
        Self::new(InMemoryReadStore::new())
    }
}

impl<S> AccountsProjection<S>
where
    S: ReadStore<AccountId, Account>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            by_member: RwLock::new(HashMap::new()),
            cursors: StreamCursors::default(),
        }
    }

    pub fn get(&self, account_id: AccountId) -> Option<AccountState> {
        self.store.get(&account_id).and_then(|a| a.state().cloned())
    }

    pub fn account_id_for(&self, member_id: MemberId) -> Option<AccountId> {
        self.by_member.read().ok()?.get(&member_id).copied()
    }

    pub fn by_member(&self, member_id: MemberId) -> Option<AccountState> {
        self.account_id_for(member_id).and_then(|id| self.get(id))
    }

    pub fn list(&self) -> Vec<AccountState> {
        self.store
            .list()
            .into_iter()
            .filter_map(|a| a.state().cloned())
            .collect()
    }

    /// Forget everything, ready for a replay.
    pub fn clear(&self) {
        self.store.clear();
        self.cursors.reset();
        if let Ok(mut idx) = self.by_member.write() {
            idx.clear();
        }
    }

    fn fold(&self, event: &AccountEvent) -> Result<(), ProjectionError> {
        let account_id = event.account_id();
        let mut account = self
            .store
            .get(&account_id)
            .unwrap_or_else(|| Account::empty(account_id));
        account.apply(event);

        let mut idx = self
            .by_member
            .write()
            .map_err(|_| ProjectionError::Unavailable("member index lock poisoned".into()))?;

        if account.is_deleted() {
            self.store.remove(&account_id);
            if idx.get(&event.member_id()) == Some(&account_id) {
                idx.remove(&event.member_id());
            }
        } else {
            idx.insert(event.member_id(), account_id);
            self.store.upsert(account_id, account);
        }
        Ok(())
    }
}

impl<S> Projection for AccountsProjection<S>
where
    S: ReadStore<AccountId, Account>,
{
    type Ev = AccountEvent;
    type Error = ProjectionError;

    fn apply(&self, envelope: &EventEnvelope<AccountEvent>) -> Result<(), ProjectionError> {
        self.cursors
            .apply_in_order(envelope.aggregate_id(), envelope.sequence_number(), || {
                self.fold(envelope.payload())
            })
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use clubledger_auth::Principal;
    use clubledger_core::Amount;
    use clubledger_ledger::{AccountDeleted, AccountOpened, AccountStatus, Actor, BorrowRecorded};
    use uuid::Uuid;

    fn envelope(seq: u64, event: AccountEvent) -> EventEnvelope<AccountEvent> {
        use clubledger_events::Event;
        EventEnvelope::new(
            Uuid::now_v7(),
            event.account_id().aggregate_id(),
            "ledger.account",
            event.event_type(),
            seq,
            event.occurred_at(),
            event,
        )
    }

    fn opened(account_id: AccountId, member_id: MemberId) -> AccountEvent {
        AccountEvent::Opened(AccountOpened {
            account_id,
            member_id,
            actor: Actor::from(&Principal::system()),
            occurred_at: Utc::now(),
        })
    }

    fn borrowed(account_id: AccountId, member_id: MemberId) -> AccountEvent {
        AccountEvent::BorrowRecorded(BorrowRecorded {
            account_id,
            member_id,
            amount: Amount::from_minor(700),
            due_date: Utc::now() + Duration::days(14),
            description: None,
            status: AccountStatus::Owing,
            actor: Actor::from(&Principal::system()),
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn builds_view_and_member_index() {
        let projection = AccountsProjection::in_memory();
        let (account_id, member_id) = (AccountId::new(), MemberId::new());

        projection.apply(&envelope(1, opened(account_id, member_id))).unwrap();
        projection.apply(&envelope(2, borrowed(account_id, member_id))).unwrap();

        let view = projection.by_member(member_id).unwrap();
        assert_eq!(view.account_id, account_id);
        assert_eq!(view.current.borrowed, Amount::from_minor(700));
        assert_eq!(view.status, AccountStatus::Owing);
    }

    #[test]
    fn duplicate_delivery_is_ignored() {
        let projection = AccountsProjection::in_memory();
        let (account_id, member_id) = (AccountId::new(), MemberId::new());
        let borrow = envelope(2, borrowed(account_id, member_id));

        projection.apply(&envelope(1, opened(account_id, member_id))).unwrap();
        projection.apply(&borrow).unwrap();
        projection.apply(&borrow).unwrap();

        assert_eq!(projection.get(account_id).unwrap().current.borrowed, Amount::from_minor(700));
    }

    #[test]
    fn deleted_account_leaves_the_view() {
        let projection = AccountsProjection::in_memory();
        let (account_id, member_id) = (AccountId::new(), MemberId::new());

        projection.apply(&envelope(1, opened(account_id, member_id))).unwrap();
        projection
            .apply(&envelope(
                2,
                AccountEvent::Deleted(AccountDeleted {
                    account_id,
                    member_id,
                    actor: Actor::from(&Principal::system()),
                    occurred_at: Utc::now(),
                }),
            ))
            .unwrap();

        assert!(projection.by_member(member_id).is_none());
        assert!(projection.list().is_empty());
    }
}
