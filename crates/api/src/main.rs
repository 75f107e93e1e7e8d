use std::sync::Arc;

use anyhow::Context;

use clubledger_api::app::{build_app, services};
use clubledger_auth::InMemoryPrincipalDirectory;
use clubledger_infra::LedgerConfig;
use clubledger_infra::jobs::JobSchedulerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    clubledger_observability::init();

    let config = LedgerConfig::from_env().context("invalid configuration")?;
    if config.principals.is_empty() {
        tracing::warn!("CLUBLEDGER_PRINCIPALS is empty; every request will be rejected");
    }

    let directory = Arc::new(InMemoryPrincipalDirectory::from_principals(config.principals.clone()));
    let services = Arc::new(services::build_services(&config));

    let scheduler = services::build_scheduler(services.clone(), &config)
        .spawn(JobSchedulerConfig::default().with_poll_interval(config.scheduler_poll))
        .context("failed to start job scheduler")?;

    let app = build_app(services, directory);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        sweep = %config.sweep_schedule,
        retention_days = config.retention.num_days(),
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    scheduler.shutdown();
    tracing::info!("shut down");
    Ok(())
}
