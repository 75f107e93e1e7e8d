//! Core job types and schedules.

use std::fmt;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recurring job kinds the scheduler knows how to route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Move owing accounts past their due date to overdue.
    OverdueSweep,
    /// Drop activities older than the retention period.
    ActivityRetention,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::OverdueSweep => "overdue_sweep",
            JobKind::ActivityRetention => "activity_retention",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("schedule has no times")]
    Empty,

    #[error("invalid time of day '{0}' (expected HH:MM)")]
    InvalidTime(String),
}

/// Fixed times of day (UTC) at which a job fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySchedule {
    times: Vec<NaiveTime>,
}

impl DailySchedule {
    pub fn new(mut times: Vec<NaiveTime>) -> Result<Self, ScheduleError> {
        if times.is_empty() {
            return Err(ScheduleError::Empty);
        }
        times.sort();
        times.dedup();
        Ok(Self { times })
    }

    /// Parse a comma separated list such as `"22:00,23:00"`.
    pub fn parse(raw: &str) -> Result<Self, ScheduleError> {
        let times = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                NaiveTime::parse_from_str(s, "%H:%M")
                    .map_err(|_| ScheduleError::InvalidTime(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(times)
    }

    pub fn times(&self) -> &[NaiveTime] {
        &self.times
    }

    /// First firing time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        let today = after.date_naive();
        for day in [today, today + Duration::days(1)] {
            for t in &self.times {
                let at = day.and_time(*t).and_utc();
                if at > after {
                    return at;
                }
            }
        }
        // `times` is never empty, so tomorrow always has a slot.
        (today + Duration::days(1)).and_time(self.times[0]).and_utc()
    }
}

impl fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.times.iter().map(|t| t.format("%H:%M").to_string()).collect();
        f.write_str(&parts.join(","))
    }
}

/// A job registered with the scheduler, with its next due time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub kind: JobKind,
    pub schedule: DailySchedule,
    pub next_run: DateTime<Utc>,
}

impl ScheduledJob {
    pub fn new(kind: JobKind, schedule: DailySchedule, now: DateTime<Utc>) -> Self {
        let next_run = schedule.next_after(now);
        Self {
            kind,
            schedule,
            next_run,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_run
    }

    /// Move to the next slot after `now`; missed slots collapse into one run.
    pub fn advance(&mut self, now: DateTime<Utc>) {
        self.next_run = self.schedule.next_after(now);
    }
}

/// Result of one job execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum JobResult {
    Success(String),
    Failure(String),
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        matches!(self, JobResult::Success(_))
    }
}

/// Record of a job execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRunRecord {
    pub kind: JobKind,
    pub scheduled_for: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub result: JobResult,
}

impl JobRunRecord {
    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at).num_milliseconds().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, 0).unwrap()
    }

    #[test]
    fn parses_and_sorts_times() {
        let s = DailySchedule::parse("23:00, 22:00,22:00").unwrap();
        assert_eq!(s.times().len(), 2);
        assert_eq!(s.to_string(), "22:00,23:00");
    }

    #[test]
    fn rejects_bad_schedules() {
        assert_eq!(DailySchedule::parse(""), Err(ScheduleError::Empty));
        assert!(matches!(DailySchedule::parse("25:00"), Err(ScheduleError::InvalidTime(_))));
        assert!(matches!(DailySchedule::parse("noon"), Err(ScheduleError::InvalidTime(_))));
    }

    #[test]
    fn next_run_rolls_over_midnight() {
        let s = DailySchedule::parse("22:00,23:00").unwrap();

        assert_eq!(s.next_after(at(12, 0)), at(22, 0));
        assert_eq!(s.next_after(at(22, 0)), at(23, 0));
        assert_eq!(
            s.next_after(at(23, 30)),
            Utc.with_ymd_and_hms(2024, 3, 11, 22, 0, 0).unwrap()
        );
    }

    #[test]
    fn missed_slots_collapse_into_one_run() {
        let s = DailySchedule::parse("22:00,23:00").unwrap();
        let mut job = ScheduledJob::new(JobKind::OverdueSweep, s, at(12, 0));
        assert!(!job.is_due(at(21, 59)));

        // Woke up late, after both slots.
        let late = at(23, 45);
        assert!(job.is_due(late));
        job.advance(late);
        assert_eq!(job.next_run, Utc.with_ymd_and_hms(2024, 3, 11, 22, 0, 0).unwrap());
    }
}
