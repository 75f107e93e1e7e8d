//! Projections that fold account events into read models.
//!
//! Every projection tracks the last applied sequence number per aggregate,
//! so replaying a stream from the start only applies what is new.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use clubledger_core::AggregateId;

pub mod accounts;
pub mod activities;

pub use accounts::AccountsProjection;
pub use activities::ActivityProjection;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("failed to deserialize event: {0}")]
    Deserialize(String),

    /// An envelope arrived before its predecessor in the same stream.
    #[error("sequence gap for aggregate {aggregate_id} (last={last}, found={found})")]
    SequenceGap {
        aggregate_id: AggregateId,
        last: u64,
        found: u64,
    },

    #[error("read model unavailable: {0}")]
    Unavailable(String),
}

/// Per-aggregate "last applied sequence number" bookkeeping.
///
/// The lock is held while an envelope is applied, so two threads replaying
/// the same stream never apply one envelope twice.
#[derive(Debug, Default)]
pub(crate) struct StreamCursors {
    last: Mutex<HashMap<AggregateId, u64>>,
}

impl StreamCursors {
    /// Run `apply` if `sequence_number` is the next one for the stream.
    ///
    /// Returns `Ok(false)` for envelopes already applied.
    pub(crate) fn apply_in_order<F>(
        &self,
        aggregate_id: AggregateId,
        sequence_number: u64,
        apply: F,
    ) -> Result<bool, ProjectionError>
    where
        F: FnOnce() -> Result<(), ProjectionError>,
    {
        let mut map = self
            .last
            .lock()
            .map_err(|_| ProjectionError::Unavailable("cursor lock poisoned".into()))?;
        let last = map.get(&aggregate_id).copied().unwrap_or(0);

        if sequence_number <= last {
            return Ok(false);
        }
        if sequence_number != last + 1 {
            return Err(ProjectionError::SequenceGap {
                aggregate_id,
                last,
                found: sequence_number,
            });
        }

        apply()?;
        map.insert(aggregate_id, sequence_number);
        Ok(true)
    }

    pub(crate) fn reset(&self) {
        if let Ok(mut map) = self.last.lock() {
            map.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_next_and_skips_seen() {
        let cursors = StreamCursors::default();
        let id = AggregateId::new();
        let mut applied = 0;

        assert!(cursors.apply_in_order(id, 1, || { applied += 1; Ok(()) }).unwrap());
        assert!(!cursors.apply_in_order(id, 1, || { applied += 1; Ok(()) }).unwrap());
        assert!(cursors.apply_in_order(id, 2, || { applied += 1; Ok(()) }).unwrap());
        assert_eq!(applied, 2);
    }

    #[test]
    fn rejects_gaps() {
        let cursors = StreamCursors::default();
        let id = AggregateId::new();

        assert!(matches!(
            cursors.apply_in_order(id, 3, || Ok(())),
            Err(ProjectionError::SequenceGap { last: 0, found: 3, .. })
        ));
    }

    #[test]
    fn failed_apply_does_not_advance() {
        let cursors = StreamCursors::default();
        let id = AggregateId::new();

        let err = cursors.apply_in_order(id, 1, || Err(ProjectionError::Deserialize("bad".into())));
        assert!(err.is_err());
        assert!(cursors.apply_in_order(id, 1, || Ok(())).unwrap());
    }
}
