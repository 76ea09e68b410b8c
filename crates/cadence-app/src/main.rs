use std::time::Duration;

use cadence_core::cancel::CancelSignal;
use cadence_core::config::load_config;
use cadence_core::types::EventKindFilter;
use cadence_db::db::connection::create_pool;
use cadence_db::db::migrate::run_migrations;
use cadence_db::db::postgres::PgStore;
use cadence_service::event::{EventService, ListEventsRequest};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

/// Upper bound for the startup readiness probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Cadence recurrence engine");

    let config = load_config()?;

    tracing::info!(recurrence = ?config.recurrence, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    run_migrations(&config.database.url).await?;

    let pool = create_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
    )
    .await?;

    let service = EventService::new(PgStore::new(pool), config.recurrence)
        .with_span(tracing::info_span!("engine", pid = std::process::id()));

    probe(&service).await?;

    tracing::info!("Engine ready");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down");

    Ok(())
}

/// ## Summary
/// Runs one windowed listing through the whole stack to prove the store is reachable.
///
/// ## Errors
/// Returns an error if the listing fails or does not finish within [`PROBE_TIMEOUT`].
async fn probe(service: &EventService<PgStore>) -> anyhow::Result<()> {
    let now = chrono::Utc::now();
    let page = service
        .list_events(
            ListEventsRequest {
                owner_id: uuid::Uuid::nil(),
                window_start: now,
                window_end: now,
                kind: EventKindFilter::Any,
                page: 1,
                page_size: 1,
            },
            &CancelSignal::never().with_timeout(PROBE_TIMEOUT),
        )
        .await?;

    tracing::debug!(total = page.total, "Readiness probe succeeded");

    Ok(())
}
