// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::refresh_scheduler::RefreshScheduler;
use crate::application::saved_views::SavedViewStore;
use crate::application::series_store::SeriesStore;
use crate::application::style_service::StyleService;
use crate::application::telemetry_source::TelemetrySource;
use crate::domain::dashboard::Dashboard;
use crate::infrastructure::config::RefreshSettings;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct AppState {
    pub dashboard_service: DashboardService,
    pub style_service: StyleService,
    pub scheduler: RefreshScheduler,
    pub series_store: SeriesStore,
    pub telemetry: Arc<dyn TelemetrySource>,
    pub saved_views: Arc<dyn SavedViewStore>,
    pub refresh: RefreshSettings,
    /// The dashboard currently loaded in the live view, if any.
    pub current: RwLock<Option<Dashboard>>,
}
