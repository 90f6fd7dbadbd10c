// Dashboard service - save, publish, load-published, delete use cases
use crate::application::dashboard_repository::{
    DashboardRecord, DashboardRepository, DashboardSummary,
};
use crate::domain::dashboard::Dashboard;
use crate::domain::error::EngineError;
use std::sync::Arc;

/// Orchestrates the dashboard lifecycle against the persistence gateway.
/// Holds no state of its own; the caller owns the aggregate.
#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn DashboardRepository>,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn DashboardRepository>) -> Self {
        Self { repository }
    }

    /// Persist the dashboard: a Draft is created (the gateway assigns the
    /// id), anything already saved is updated under its id. Returns the
    /// persisted id. Name validation happens before any gateway call.
    pub async fn save(&self, dashboard: &mut Dashboard) -> Result<String, EngineError> {
        Dashboard::validate_name(&dashboard.name)?;

        let record = DashboardRecord::from_dashboard(dashboard);
        match dashboard.id.clone() {
            None => {
                let id = self
                    .repository
                    .create_dashboard(record)
                    .await
                    .map_err(EngineError::network)?;
                dashboard.id = Some(id.clone());
                Ok(id)
            }
            Some(id) => {
                self.repository
                    .update_dashboard(&id, record)
                    .await
                    .map_err(EngineError::network)?;
                Ok(id)
            }
        }
    }

    /// Publish this dashboard as the single default: unpublish every other
    /// published record, then save this one with the flag set. The two
    /// phases are not atomic; a concurrent publish from another session can
    /// leave zero or two published records until the next list read
    /// reconciles it.
    pub async fn publish(&self, dashboard: &mut Dashboard) -> Result<String, EngineError> {
        Dashboard::validate_name(&dashboard.name)?;

        let summaries = self
            .repository
            .list_dashboards()
            .await
            .map_err(EngineError::network)?;

        for summary in summaries {
            if !summary.is_published || dashboard.id.as_deref() == Some(summary.id.as_str()) {
                continue;
            }
            let Some(mut record) = self
                .repository
                .get_dashboard(&summary.id)
                .await
                .map_err(EngineError::network)?
            else {
                continue;
            };
            record.is_published = false;
            self.repository
                .update_dashboard(&summary.id, record)
                .await
                .map_err(EngineError::network)?;
            tracing::debug!("unpublished dashboard {}", summary.id);
        }

        let was_published = dashboard.is_published;
        dashboard.is_published = true;
        match self.save(dashboard).await {
            Ok(id) => Ok(id),
            Err(e) => {
                dashboard.is_published = was_published;
                Err(e)
            }
        }
    }

    /// Find and hydrate the published dashboard, if any. Used on entry to
    /// the default view.
    pub async fn load_published(&self) -> Result<Option<Dashboard>, EngineError> {
        let summaries = self
            .repository
            .list_dashboards()
            .await
            .map_err(EngineError::network)?;

        let Some(summary) = summaries.into_iter().find(|s| s.is_published) else {
            return Ok(None);
        };

        let record = self
            .repository
            .get_dashboard(&summary.id)
            .await
            .map_err(EngineError::network)?;
        Ok(record.map(DashboardRecord::into_dashboard))
    }

    /// Load one dashboard by id.
    pub async fn load(&self, id: &str) -> Result<Dashboard, EngineError> {
        let record = self
            .repository
            .get_dashboard(id)
            .await
            .map_err(EngineError::network)?;
        record
            .map(DashboardRecord::into_dashboard)
            .ok_or_else(|| EngineError::NotFound(format!("dashboard {id}")))
    }

    pub async fn list(&self) -> Result<Vec<DashboardSummary>, EngineError> {
        self.repository
            .list_dashboards()
            .await
            .map_err(EngineError::network)
    }

    /// Delete a stored dashboard. The caller resets its local aggregate to
    /// Draft when it deleted the one currently loaded.
    pub async fn delete(&self, id: &str) -> Result<(), EngineError> {
        self.repository
            .delete_dashboard(id)
            .await
            .map_err(EngineError::network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_repository::TemplateRecord;
    use crate::domain::grid::GridCell;
    use crate::domain::widget::{
        ChartType, GraphConfig, Ranges, ScalarConfig, ValueRange, Widget, WidgetConfig,
    };
    use crate::infrastructure::memory_store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Gateway double that counts writes, for call-shape assertions.
    struct CountingStore {
        inner: MemoryStore,
        creates: AtomicUsize,
        updates: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                creates: AtomicUsize::new(0),
                updates: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DashboardRepository for CountingStore {
        async fn create_dashboard(&self, record: DashboardRecord) -> anyhow::Result<String> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            self.inner.create_dashboard(record).await
        }

        async fn update_dashboard(&self, id: &str, record: DashboardRecord) -> anyhow::Result<()> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.inner.update_dashboard(id, record).await
        }

        async fn get_dashboard(&self, id: &str) -> anyhow::Result<Option<DashboardRecord>> {
            self.inner.get_dashboard(id).await
        }

        async fn list_dashboards(&self) -> anyhow::Result<Vec<DashboardSummary>> {
            self.inner.list_dashboards().await
        }

        async fn delete_dashboard(&self, id: &str) -> anyhow::Result<()> {
            self.inner.delete_dashboard(id).await
        }

        async fn create_template(&self, record: TemplateRecord) -> anyhow::Result<String> {
            self.inner.create_template(record).await
        }

        async fn list_templates(&self) -> anyhow::Result<Vec<TemplateRecord>> {
            self.inner.list_templates().await
        }

        async fn update_template(&self, id: &str, record: TemplateRecord) -> anyhow::Result<()> {
            self.inner.update_template(id, record).await
        }

        async fn delete_template(&self, id: &str) -> anyhow::Result<()> {
            self.inner.delete_template(id).await
        }
    }

    fn sample_dashboard() -> Dashboard {
        let mut dashboard = Dashboard::new("Line 3 Overview", "operator");
        let number = Widget::create(
            "Busbar voltage",
            WidgetConfig::Number(ScalarConfig {
                terminal_id: "t-1".to_string(),
                measurand_id: "m-volt".to_string(),
                unit: Some("V".to_string()),
                precision: 1,
                ranges: Ranges(vec![ValueRange {
                    min: 0.0,
                    max: 500.0,
                    color: "#2ca02c".to_string(),
                }]),
                reset_interval_ms: 5000,
            }),
        )
        .unwrap();
        let graph = Widget::create(
            "Voltage trend",
            WidgetConfig::Graph(GraphConfig {
                chart_type: ChartType::Line,
                terminal_id: "t-1".to_string(),
                measurand_id: "m-volt".to_string(),
                color: "#1f77b4".to_string(),
                window: 10,
                threshold_pct: 5.0,
                comparisons: Vec::new(),
                ranges: Ranges::default(),
                reset_interval_ms: 5000,
            }),
        )
        .unwrap();
        dashboard.add_widget(number, GridCell::new("", 0, 0, 4, 2));
        dashboard.add_widget(graph, GridCell::new("", 4, 0, 8, 4));
        dashboard
    }

    #[tokio::test]
    async fn test_save_twice_is_one_create_then_one_update() {
        let store = Arc::new(CountingStore::new());
        let service = DashboardService::new(store.clone());
        let mut dashboard = sample_dashboard();

        let first_id = service.save(&mut dashboard).await.unwrap();
        let second_id = service.save(&mut dashboard).await.unwrap();

        assert_eq!(first_id, second_id);
        assert_eq!(store.creates.load(Ordering::SeqCst), 1);
        assert_eq!(store.updates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_name_never_reaches_gateway() {
        let store = Arc::new(CountingStore::new());
        let service = DashboardService::new(store.clone());
        let mut dashboard = sample_dashboard();
        dashboard.name = "Bad/Name!".to_string();

        let err = service.save(&mut dashboard).await.unwrap_err();

        assert!(matches!(err, EngineError::Validation(_)));
        assert!(dashboard.id.is_none());
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_saved_dashboard_round_trips() {
        let store = Arc::new(MemoryStore::new());
        let service = DashboardService::new(store);
        let mut dashboard = sample_dashboard();

        let id = service.save(&mut dashboard).await.unwrap();
        let loaded = service.load(&id).await.unwrap();

        assert_eq!(loaded.name, dashboard.name);
        assert_eq!(loaded.widgets.len(), 2);
        for widget in &dashboard.widgets {
            let restored = loaded.widget(&widget.id).unwrap();
            assert_eq!(restored.config, widget.config);
            assert_eq!(
                loaded.layout.cell(&widget.id),
                dashboard.layout.cell(&widget.id)
            );
        }
    }

    #[tokio::test]
    async fn test_publish_leaves_exactly_one_published() {
        let store = Arc::new(MemoryStore::new());
        let service = DashboardService::new(store);

        let mut first = sample_dashboard();
        service.save(&mut first).await.unwrap();
        service.publish(&mut first).await.unwrap();

        let mut second = sample_dashboard();
        second.name = "Line 4 Overview".to_string();
        service.save(&mut second).await.unwrap();
        service.publish(&mut second).await.unwrap();

        let published: Vec<_> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|s| s.is_published)
            .collect();
        assert_eq!(published.len(), 1);
        assert_eq!(Some(published[0].id.as_str()), second.id.as_deref());
    }

    #[tokio::test]
    async fn test_load_published_finds_the_flagged_dashboard() {
        let store = Arc::new(MemoryStore::new());
        let service = DashboardService::new(store);

        assert!(service.load_published().await.unwrap().is_none());

        let mut dashboard = sample_dashboard();
        service.save(&mut dashboard).await.unwrap();
        service.publish(&mut dashboard).await.unwrap();

        let loaded = service.load_published().await.unwrap().unwrap();
        assert_eq!(loaded.id, dashboard.id);
        assert!(loaded.is_published);
    }

    #[tokio::test]
    async fn test_delete_removes_the_record() {
        let store = Arc::new(MemoryStore::new());
        let service = DashboardService::new(store);
        let mut dashboard = sample_dashboard();

        let id = service.save(&mut dashboard).await.unwrap();
        service.delete(&id).await.unwrap();

        assert!(service.list().await.unwrap().is_empty());
        assert!(matches!(
            service.load(&id).await.unwrap_err(),
            EngineError::NotFound(_)
        ));
    }
}
