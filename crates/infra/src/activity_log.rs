//! Append-only activity log storage.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use clubledger_core::MemberId;
use clubledger_ledger::Activity;

use crate::projections::ProjectionError;

/// Filter for listing activities. Results are newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityQuery {
    pub member_id: Option<MemberId>,
    pub limit: Option<usize>,
}

impl ActivityQuery {
    pub fn for_member(member_id: MemberId) -> Self {
        Self {
            member_id: Some(member_id),
            limit: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

pub trait ActivityLog: Send + Sync {
    fn append(&self, activity: Activity) -> Result<(), ProjectionError>;

    fn list(&self, query: &ActivityQuery) -> Vec<Activity>;

    /// Remove activities with a timestamp strictly before `cutoff`.
    /// Returns how many were removed.
    fn purge_older_than(&self, cutoff: DateTime<Utc>) -> usize;
}

impl<L> ActivityLog for Arc<L>
where
    L: ActivityLog + ?Sized,
{
    fn append(&self, activity: Activity) -> Result<(), ProjectionError> {
        (**self).append(activity)
    }

    fn list(&self, query: &ActivityQuery) -> Vec<Activity> {
        (**self).list(query)
    }

    fn purge_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        (**self).purge_older_than(cutoff)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    entries: RwLock<Vec<Activity>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActivityLog for InMemoryActivityLog {
    fn append(&self, activity: Activity) -> Result<(), ProjectionError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ProjectionError::Unavailable("activity log lock poisoned".into()))?;
        entries.push(activity);
        Ok(())
    }

    fn list(&self, query: &ActivityQuery) -> Vec<Activity> {
        let entries = match self.entries.read() {
            Ok(e) => e,
            Err(_) => return vec![],
        };

        let mut out: Vec<Activity> = entries
            .iter()
            .rev()
            .filter(|a| query.member_id.is_none_or(|m| a.member_id == m))
            .cloned()
            .collect();
        // Appends arrive in commit order per stream; sort for a global view.
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = query.limit {
            out.truncate(limit);
        }
        out
    }

    fn purge_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut entries = match self.entries.write() {
            Ok(e) => e,
            Err(_) => return 0,
        };
        let before = entries.len();
        entries.retain(|a| a.timestamp >= cutoff);
        before - entries.len()
    }
}
