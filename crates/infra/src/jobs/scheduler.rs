//! Time-of-day job scheduler running on a background thread.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::types::{DailySchedule, JobKind, JobResult, JobRunRecord, ScheduledJob};

/// Job handler function type.
pub type JobHandler = Box<dyn Fn() -> JobResult + Send + Sync>;

const HISTORY_LIMIT: usize = 64;

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// How often to check for due jobs
    pub poll_interval: Duration,
    /// Thread name, also used in logs
    pub name: String,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            name: "ledger-scheduler".to_string(),
        }
    }
}

impl JobSchedulerConfig {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

struct Entry {
    job: ScheduledJob,
    handler: JobHandler,
}

/// Runs registered jobs at fixed daily times.
pub struct JobScheduler {
    entries: Vec<Entry>,
    history: Arc<Mutex<VecDeque<JobRunRecord>>>,
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl JobScheduler {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            history: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Register a handler; its first run is the next slot after `now`.
    pub fn register<F>(&mut self, kind: JobKind, schedule: DailySchedule, now: DateTime<Utc>, handler: F)
    where
        F: Fn() -> JobResult + Send + Sync + 'static,
    {
        let job = ScheduledJob::new(kind, schedule, now);
        info!(job = %kind, schedule = %job.schedule, next_run = %job.next_run, "job registered");
        self.entries.push(Entry {
            job,
            handler: Box::new(handler),
        });
    }

    pub fn jobs(&self) -> Vec<ScheduledJob> {
        self.entries.iter().map(|e| e.job.clone()).collect()
    }

    /// Execute every job due at `now` and advance it to its next slot.
    pub fn run_due(&mut self, now: DateTime<Utc>) -> Vec<JobRunRecord> {
        let mut records = Vec::new();

        for entry in self.entries.iter_mut().filter(|e| e.job.is_due(now)) {
            let scheduled_for = entry.job.next_run;
            let started_at = Utc::now();
            let result = (entry.handler)();
            let record = JobRunRecord {
                kind: entry.job.kind,
                scheduled_for,
                started_at,
                finished_at: Utc::now(),
                result,
            };

            match &record.result {
                JobResult::Success(detail) => info!(
                    job = %record.kind,
                    duration_ms = record.duration_ms(),
                    detail = %detail,
                    "job completed"
                ),
                JobResult::Failure(error) => warn!(
                    job = %record.kind,
                    duration_ms = record.duration_ms(),
                    error = %error,
                    "job failed"
                ),
            }

            entry.job.advance(now);
            records.push(record);
        }

        if let Ok(mut history) = self.history.lock() {
            for r in &records {
                if history.len() == HISTORY_LIMIT {
                    history.pop_front();
                }
                history.push_back(r.clone());
            }
        }
        records
    }

    /// Spawn the scheduler in a background thread.
    pub fn spawn(self, config: JobSchedulerConfig) -> std::io::Result<JobSchedulerHandle> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let history = self.history.clone();

        let join = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || scheduler_loop(self, config, shutdown_rx))?;

        Ok(JobSchedulerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            history,
        })
    }
}

/// Handle to control a running scheduler.
#[derive(Debug)]
pub struct JobSchedulerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    history: Arc<Mutex<VecDeque<JobRunRecord>>>,
}

impl JobSchedulerHandle {
    /// Request shutdown and wait for the thread to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }

    /// Most recent runs, oldest first.
    pub fn history(&self) -> Vec<JobRunRecord> {
        self.history
            .lock()
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }
}

fn scheduler_loop(mut scheduler: JobScheduler, config: JobSchedulerConfig, shutdown_rx: mpsc::Receiver<()>) {
    info!(scheduler = %config.name, jobs = scheduler.entries.len(), "job scheduler started");

    loop {
        let now = Utc::now();
        let ran = scheduler.run_due(now);
        debug!(scheduler = %config.name, ran = ran.len(), "scheduler tick");

        match shutdown_rx.recv_timeout(config.poll_interval) {
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    info!(scheduler = %config.name, "job scheduler stopped");
}
