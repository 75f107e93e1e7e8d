use std::sync::Arc;

use clubledger_events::{EventEnvelope, Projection};
use clubledger_ledger::{Activity, AccountEvent};

use super::{ProjectionError, StreamCursors};
use crate::activity_log::{ActivityLog, InMemoryActivityLog};

/// Writes one [`Activity`] per committed account event.
#[derive(Debug)]
pub struct ActivityProjection<L = InMemoryActivityLog>
where
    L: ActivityLog,
{
    log: Arc<L>,
    cursors: StreamCursors,
}

impl<L> ActivityProjection<L>
where
    L: ActivityLog,
{
    pub fn new(log: Arc<L>) -> Self {
        Self {
            log,
            cursors: StreamCursors::default(),
        }
    }

    pub fn log(&self) -> &Arc<L> {
        &self.log
    }
}

impl<L> Projection for ActivityProjection<L>
where
    L: ActivityLog,
{
    type Ev = AccountEvent;
    type Error = ProjectionError;

    fn apply(&self, envelope: &EventEnvelope<AccountEvent>) -> Result<(), ProjectionError> {
        self.cursors
            .apply_in_order(envelope.aggregate_id(), envelope.sequence_number(), || {
                self.log.append(Activity::from_event(envelope.payload()))
            })
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clubledger_auth::Principal;
    use clubledger_core::{AccountId, MemberId};
    use clubledger_events::Event;
    use clubledger_ledger::{AccountOpened, Actor};
    use uuid::Uuid;

    use crate::activity_log::ActivityQuery;

    #[test]
    fn one_activity_per_event_even_on_redelivery() {
        let projection = ActivityProjection::new(Arc::new(InMemoryActivityLog::new()));
        let event = AccountEvent::Opened(AccountOpened {
            account_id: AccountId::new(),
            member_id: MemberId::new(),
            actor: Actor::from(&Principal::system()),
            occurred_at: Utc::now(),
        });
        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            event.account_id().aggregate_id(),
            "ledger.account",
            event.event_type(),
            1,
            event.occurred_at(),
            event,
        );

        projection.apply(&envelope).unwrap();
        projection.apply(&envelope).unwrap();

        let entries = projection.log().list(&ActivityQuery::default());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action(), "account_opened");
        assert_eq!(entries[0].actor.display_name, "system");
    }
}
