use std::sync::Arc;

use event_core::config::{ServiceConfig, StoreKind};
use event_core::http::{create_router, AppState};
use event_core::store::{EventStore, InMemoryEventStore, JournalEventStore};
use event_core::telemetry::init_telemetry;
use event_core::transforms::TransformPipeline;
use event_core::EventService;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file found or error loading it: {}", e);
    }

    let config = ServiceConfig::from_env()?;
    init_telemetry(config.log_format);

    info!(store = ?config.store, addr = %config.http_addr, "Starting event core service");

    let store: Arc<dyn EventStore> = match config.store {
        StoreKind::Memory => Arc::new(InMemoryEventStore::new()),
        StoreKind::Journal => {
            let dir = config.journal_dir.clone();
            Arc::new(tokio::task::spawn_blocking(move || JournalEventStore::open(dir)).await??)
        }
    };

    let service = EventService::new(store, TransformPipeline::standard(), config.store_timeout);
    info!(transforms = ?service.transform_names(), "Transform pipeline ready");

    let app = create_router(AppState::new(service));

    let listener = TcpListener::bind(config.http_addr).await?;
    info!("Listening on {}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Event core service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
