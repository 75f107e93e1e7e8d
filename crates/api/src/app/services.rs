use std::{convert::Infallible, sync::Arc, thread, time::Duration};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use chrono::Utc;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use clubledger_auth::Principal;
use clubledger_core::MemberId;
use clubledger_events::{EventBus, EventEnvelope};
use clubledger_infra::{
    LedgerConfig, LedgerService,
    activity_log::InMemoryActivityLog,
    event_store::InMemoryEventStore,
    jobs::{JobKind, JobResult, JobScheduler},
    ledger_service::InMemoryBus,
};
use clubledger_ledger::AccountEvent;

/// Committed ledger event pushed to SSE clients.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RealtimeMessage {
    pub member_id: MemberId,
    pub topic: String,
    pub payload: serde_json::Value,
}

pub struct AppServices {
    ledger: LedgerService,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
}

impl AppServices {
    pub fn ledger(&self) -> &LedgerService {
        &self.ledger
    }

    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }
}

/// In-memory wiring: store, bus, activity log, and the bus → SSE bridge.
pub fn build_services(config: &LedgerConfig) -> AppServices {
    let store = Arc::new(InMemoryEventStore::new());
    let bus = Arc::new(InMemoryBus::new());
    let ledger = LedgerService::new(
        store,
        bus.clone(),
        Arc::new(InMemoryActivityLog::new()),
        config.conflict_retries,
    );

    let (realtime_tx, _) = broadcast::channel(1024);
    spawn_realtime_bridge(&bus, realtime_tx.clone());

    AppServices { ledger, realtime_tx }
}

/// Forward committed events from the in-process bus to the SSE broadcast.
///
/// Lossy: with no SSE clients connected, messages are dropped.
fn spawn_realtime_bridge(bus: &Arc<InMemoryBus>, tx: broadcast::Sender<RealtimeMessage>) {
    let sub = bus.subscribe();
    let spawned = thread::Builder::new()
        .name("ledger-realtime".to_string())
        .spawn(move || {
            while let Ok(env) = sub.recv() {
                let env: EventEnvelope<serde_json::Value> = env;
                let member_id = match serde_json::from_value::<AccountEvent>(env.payload().clone()) {
                    Ok(ev) => ev.member_id(),
                    Err(e) => {
                        tracing::warn!(event_type = env.event_type(), error = %e, "undecodable event on bus");
                        continue;
                    }
                };
                let _ = tx.send(RealtimeMessage {
                    member_id,
                    topic: env.event_type().to_string(),
                    payload: env.into_payload(),
                });
            }
        });
    if let Err(e) = spawned {
        tracing::error!(error = %e, "failed to start realtime bridge; live stream disabled");
    }
}

/// SSE stream of committed events, optionally limited to one member.
pub fn ledger_sse_stream(
    services: Arc<AppServices>,
    member_id: Option<MemberId>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(m) if member_id.is_none_or(|id| id == m.member_id) => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

/// Register the overdue sweep and activity retention jobs, run as the
/// system principal.
pub fn build_scheduler(services: Arc<AppServices>, config: &LedgerConfig) -> JobScheduler {
    let mut scheduler = JobScheduler::new();
    let now = Utc::now();

    let sweep_services = services.clone();
    scheduler.register(JobKind::OverdueSweep, config.sweep_schedule.clone(), now, move || {
        match sweep_services.ledger().sweep_overdue(&Principal::system()) {
            Ok(report) if report.is_clean() => JobResult::Success(format!(
                "{} of {} accounts marked overdue",
                report.transitioned, report.processed
            )),
            Ok(report) => JobResult::Failure(format!(
                "{} of {} accounts failed",
                report.failures.len(),
                report.processed
            )),
            Err(e) => JobResult::Failure(e.to_string()),
        }
    });

    let retention = config.retention;
    scheduler.register(
        JobKind::ActivityRetention,
        config.retention_schedule.clone(),
        now,
        move || match services
            .ledger()
            .purge_expired_activities(retention, &Principal::system())
        {
            Ok(removed) => JobResult::Success(format!("{removed} activities purged")),
            Err(e) => JobResult::Failure(e.to_string()),
        },
    );

    scheduler
}
