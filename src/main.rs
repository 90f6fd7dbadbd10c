// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::application::dashboard_repository::DashboardRepository;
use crate::application::dashboard_service::DashboardService;
use crate::application::refresh_scheduler::RefreshScheduler;
use crate::application::saved_views::SavedViewStore;
use crate::application::series_store::SeriesStore;
use crate::application::style_service::StyleService;
use crate::application::telemetry_source::TelemetrySource;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::http_gateway::HttpGateway;
use crate::infrastructure::memory_store::MemoryStore;
use crate::infrastructure::synthetic_source::SyntheticSource;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let app_config = load_app_config()?;

    // Wire the persistence gateway and telemetry source (infrastructure
    // layer). Without a configured gateway the service runs in demo mode:
    // in-memory documents and a synthetic random-walk source.
    let memory = Arc::new(MemoryStore::new());
    let (repository, telemetry): (Arc<dyn DashboardRepository>, Arc<dyn TelemetrySource>) =
        match &app_config.gateway {
            Some(settings) => {
                let gateway = Arc::new(HttpGateway::new(
                    settings.base_url.clone(),
                    settings.token.clone(),
                ));
                (gateway.clone(), gateway)
            }
            None => {
                tracing::info!("no gateway configured, running in demo mode");
                (memory.clone(), Arc::new(SyntheticSource::demo()))
            }
        };
    let saved_views: Arc<dyn SavedViewStore> = memory;

    // Create services (application layer)
    let series_store = SeriesStore::new();
    let scheduler = RefreshScheduler::new(telemetry.clone(), series_store.clone());
    let dashboard_service = DashboardService::new(repository.clone());
    let style_service = StyleService::new(repository);

    // Create application state
    let state = Arc::new(AppState {
        dashboard_service,
        style_service,
        scheduler,
        series_store,
        telemetry,
        saved_views,
        refresh: app_config.refresh.clone(),
        current: RwLock::new(None),
    });

    // Build router (presentation layer)
    let router = build_router(state.clone()).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr =
        format!("{}:{}", app_config.server.host, app_config.server.port).parse()?;
    tracing::info!("starting plant-dashboard service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Teardown mirrors setup: every widget timer is cancelled.
    state.scheduler.stop_all().await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
